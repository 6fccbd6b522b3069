//! Location lookup: a compiled-in city table or the remote `cities` registry.

use tracing::debug;

use crate::{
    Config, Location, StoreError, UvError,
    config::{RegistryConfig, RegistrySource, RemoteConfig},
    postgrest::RestClient,
};

/// Built-in cities (name, latitude, longitude).
const CITIES: &[(&str, f64, f64)] = &[
    ("Delhi", 28.6139, 77.2090),
    ("Mumbai", 19.0760, 72.8777),
    ("Bangalore", 12.9716, 77.5946),
    ("Hyderabad", 17.3850, 78.4867),
    ("Chennai", 13.0827, 80.2707),
    ("Kolkata", 22.5726, 88.3639),
    ("Pune", 18.5204, 73.8567),
    ("Ahmedabad", 23.0225, 72.5714),
    ("Jaipur", 26.9124, 75.7873),
    ("Goa", 15.2993, 74.1240),
    ("Lucknow", 26.8467, 80.9462),
    ("Chandigarh", 30.7333, 76.7794),
    ("Kochi", 9.9312, 76.2673),
    ("Varanasi", 25.3176, 82.9739),
    ("Agra", 27.1767, 78.0081),
    ("Surat", 21.1702, 72.8311),
    ("Indore", 22.7196, 75.8577),
];

/// Trim and title-case a user supplied name: `"  new DELHI "` → `"New Delhi"`.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_alpha = false;

    for ch in name.trim().chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }

    out
}

#[derive(Debug, Clone)]
pub enum LocationRegistry {
    Static(StaticRegistry),
    Remote(RemoteRegistry),
}

impl LocationRegistry {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        match config.registry.source {
            RegistrySource::Static => Ok(Self::Static(StaticRegistry::from_config(&config.registry))),
            RegistrySource::Remote => {
                let remote = config.remote().ok_or_else(|| {
                    anyhow::anyhow!(
                        "Remote registry selected but no remote backend configured.\n\
                         Hint: set SUPABASE_URL and SUPABASE_KEY or add a [remote] section."
                    )
                })?;
                Ok(Self::Remote(RemoteRegistry::new(remote)?))
            }
        }
    }

    pub async fn resolve(&self, name: &str) -> Result<Location, UvError> {
        match self {
            Self::Static(registry) => registry.resolve(name),
            Self::Remote(registry) => registry.resolve(name).await,
        }
    }

    /// Active locations sorted by name.
    pub async fn list_active(&self) -> Result<Vec<Location>, UvError> {
        match self {
            Self::Static(registry) => Ok(registry.list_active()),
            Self::Remote(registry) => registry.list_active().await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StaticRegistry {
    locations: Vec<Location>,
}

impl Default for StaticRegistry {
    fn default() -> Self {
        Self::new(CITIES.iter().map(|(name, lat, lon)| Location::new(*name, *lat, *lon)).collect())
    }
}

impl StaticRegistry {
    pub fn new(mut locations: Vec<Location>) -> Self {
        for loc in &mut locations {
            loc.name = canonical_name(&loc.name);
        }
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        locations.dedup_by(|a, b| a.name == b.name);
        Self { locations }
    }

    /// Built-in table plus `extra_cities`; an extra entry replaces a built-in one of the same name.
    pub fn from_config(config: &RegistryConfig) -> Self {
        let mut locations: Vec<Location> = config
            .extra_cities
            .iter()
            .map(|c| Location::new(c.name.as_str(), c.lat, c.lon))
            .collect();
        locations.extend(CITIES.iter().map(|(name, lat, lon)| Location::new(*name, *lat, *lon)));
        Self::new(locations)
    }

    pub fn names(&self) -> Vec<String> {
        self.locations.iter().map(|l| l.name.clone()).collect()
    }

    pub fn resolve(&self, name: &str) -> Result<Location, UvError> {
        let wanted = canonical_name(name);
        self.locations.iter().find(|l| l.name == wanted).cloned().ok_or_else(|| {
            UvError::UnknownLocation { name: name.trim().to_string(), available: self.names() }
        })
    }

    pub fn list_active(&self) -> Vec<Location> {
        self.locations.iter().filter(|l| l.active).cloned().collect()
    }
}

/// `cities` table behind the PostgREST API (`name, lat, lon, active`).
#[derive(Debug, Clone)]
pub struct RemoteRegistry {
    client: RestClient,
    table: String,
}

impl RemoteRegistry {
    pub fn new(config: &RemoteConfig) -> Result<Self, StoreError> {
        Ok(Self { client: RestClient::new(config)?, table: config.cities_table.clone() })
    }

    async fn query(&self, params: &[(&str, String)]) -> Result<Vec<Location>, StoreError> {
        let res = RestClient::send(self.client.get(&self.table).query(params)).await?;
        let body = res.text().await?;
        serde_json::from_str(&body).map_err(|e| StoreError::Decode(format!("city row: {e}")))
    }

    pub async fn resolve(&self, name: &str) -> Result<Location, UvError> {
        let wanted = canonical_name(name);
        let rows = self
            .query(&[
                ("select", "name,lat,lon,active".to_string()),
                ("name", format!("ilike.{wanted}")),
                ("limit", "1".to_string()),
            ])
            .await?;

        let mut location = rows.into_iter().next().ok_or_else(|| UvError::UnknownLocation {
            name: name.trim().to_string(),
            available: Vec::new(),
        })?;
        location.name = canonical_name(&location.name);
        debug!(city = %location.name, active = location.active, "resolved remote location");
        Ok(location)
    }

    pub async fn list_active(&self) -> Result<Vec<Location>, UvError> {
        let rows = self
            .query(&[
                ("select", "name,lat,lon,active".to_string()),
                ("active", "eq.true".to_string()),
                ("order", "name.asc".to_string()),
            ])
            .await?;

        Ok(rows
            .into_iter()
            .map(|mut loc| {
                loc.name = canonical_name(&loc.name);
                loc
            })
            .collect())
    }
}
