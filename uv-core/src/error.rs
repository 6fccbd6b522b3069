use thiserror::Error;

/// Errors surfaced by the fetch → store → serve pipeline.
#[derive(Debug, Error)]
pub enum UvError {
    /// The forecast provider could not deliver a usable reading.
    #[error("Upstream fetch failed after {attempts} attempt(s): {source:#}")]
    Upstream {
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("{}", unknown_location_message(.name, .available))]
    UnknownLocation { name: String, available: Vec<String> },

    /// Client supplied an invalid comparator or threshold.
    #[error("{0}")]
    BadRequest(String),

    /// Only the mandatory (local) store raises this.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl UvError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, UvError::BadRequest(_) | UvError::UnknownLocation { .. })
    }
}

fn unknown_location_message(name: &str, available: &[String]) -> String {
    if available.is_empty() {
        format!("Location '{name}' not found.")
    } else {
        format!("Location '{name}' not found. Available: {}", available.join(", "))
    }
}

/// Backend-level failures of a reading store or the remote registry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid stored data: {0}")]
    Decode(String),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_location_lists_available_names() {
        let err = UvError::UnknownLocation {
            name: "Atlantis".into(),
            available: vec!["Delhi".into(), "Goa".into()],
        };
        assert_eq!(err.to_string(), "Location 'Atlantis' not found. Available: Delhi, Goa");
        assert!(err.is_client_error());
    }

    #[test]
    fn unknown_location_without_list() {
        let err = UvError::UnknownLocation { name: "Atlantis".into(), available: vec![] };
        assert_eq!(err.to_string(), "Location 'Atlantis' not found.");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "ж".repeat(150);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
    }
}
