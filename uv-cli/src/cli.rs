use anyhow::Context;
use clap::Parser;
use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};
use uv_core::{BatchRefresher, BatchReport, Config, Outcome, Pipeline, Reading};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "uv-refresh", version, about = "Fetch and store current UV readings")]
pub struct Cli {
    /// Refresh only this location; all active locations when omitted.
    pub city: Option<String>,

    /// Path to config.toml (defaults to the platform config directory).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let config = Config::load(self.config.as_deref())?;
        let pipeline = Pipeline::from_config(&config).context("Failed to initialise pipeline")?;
        let batch =
            BatchRefresher::new(Arc::new(pipeline), Duration::from_secs(config.batch.delay_secs));

        let report = batch.run(self.city.as_deref()).await?;
        print!("{}", render_report(&report));

        if self.city.is_some() {
            if let Some(Outcome::Refreshed(reading)) = report.outcomes.first() {
                print!("{}", render_reading(reading));
            }
        }

        Ok(if report.all_failed() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
    }
}

fn render_report(report: &BatchReport) -> String {
    let mut out = String::new();

    for outcome in &report.outcomes {
        match outcome {
            Outcome::Refreshed(r) => out.push_str(&format!(
                "  ✅ {:<20} UV {:>5.2} ({})\n",
                r.city, r.uv_index, r.uv_band
            )),
            Outcome::Failed { city, error } => {
                out.push_str(&format!("  ❌ {city:<20} {error}\n"));
            }
        }
    }

    if report.outcomes.is_empty() {
        out.push_str("No active locations to refresh.\n");
    }

    let failed = report.failed();
    out.push_str(&format!(
        "Done: {} refreshed, {} failed{}\n",
        report.success_count(),
        failed.len(),
        if failed.is_empty() { String::new() } else { format!(" ({})", failed.join(", ")) }
    ));
    out
}

fn render_reading(r: &Reading) -> String {
    let rule = "─".repeat(35);
    format!(
        "\n☀️  UV Index — {city}\n{rule}\n  \
         UV Index:     {uv} ({band})\n  \
         Temperature:  {temp}°C (feels {feels}°C)\n  \
         Humidity:     {hum}%\n  \
         Wind:         {wind} km/h\n  \
         Weather:      {desc}\n  \
         Time:         {time}\n{rule}\n",
        city = r.city,
        uv = r.uv_index,
        band = r.uv_band,
        temp = r.temperature,
        feels = r.feels_like,
        hum = r.humidity,
        wind = r.wind_speed,
        desc = r.weather_desc,
        time = r.timestamp.to_rfc3339(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use uv_core::{UvBand, UvError};

    fn sample(city: &str, uv_index: f64) -> Reading {
        Reading {
            city: city.to_string(),
            timestamp: "2025-05-01T06:30:00Z".parse().unwrap(),
            uv_index,
            uv_band: UvBand::classify(uv_index),
            temperature: 36.0,
            feels_like: 38.5,
            humidity: 30,
            wind_speed: 6.1,
            weather_desc: "Clear sky".to_string(),
        }
    }

    #[test]
    fn parses_optional_city() {
        let cli = Cli::try_parse_from(["uv-refresh"]).unwrap();
        assert!(cli.city.is_none());

        let cli = Cli::try_parse_from(["uv-refresh", "Mumbai", "--config", "/tmp/uv.toml"]).unwrap();
        assert_eq!(cli.city.as_deref(), Some("Mumbai"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/uv.toml")));
    }

    #[test]
    fn rejects_more_than_one_city() {
        assert!(Cli::try_parse_from(["uv-refresh", "Delhi", "Goa"]).is_err());
    }

    #[test]
    fn report_marks_each_location_and_tallies() {
        let report = BatchReport {
            outcomes: vec![
                Outcome::Refreshed(sample("Agra", 6.0)),
                Outcome::Failed {
                    city: "Bangalore".into(),
                    error: UvError::BadRequest("boom".into()),
                },
                Outcome::Refreshed(sample("Chennai", 11.0)),
            ],
        };

        let text = render_report(&report);
        assert!(text.contains("✅ Agra"));
        assert!(text.contains("❌ Bangalore"));
        assert!(text.contains("(Extreme)"));
        assert!(text.ends_with("Done: 2 refreshed, 1 failed (Bangalore)\n"));
    }

    #[test]
    fn reading_block_shows_band_and_weather() {
        let text = render_reading(&sample("Delhi", 7.0));
        assert!(text.contains("UV Index — Delhi"));
        assert!(text.contains("7 (High)"));
        assert!(text.contains("Clear sky"));
    }
}
