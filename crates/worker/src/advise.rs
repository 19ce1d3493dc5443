use anyhow::Context;
use std::path::Path;

use wayfarer_core::advisory;
use wayfarer_core::config::Settings;
use wayfarer_core::domain::itinerary::Itinerary;
use wayfarer_core::weather::openweather::OpenWeatherClient;

pub async fn run(settings: &Settings, itinerary_path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(itinerary_path)
        .with_context(|| format!("failed to read itinerary {}", itinerary_path.display()))?;
    let itinerary: Itinerary =
        serde_json::from_str(&text).context("itinerary file is not a stored itinerary document")?;

    let weather = OpenWeatherClient::from_settings(settings)?;
    let report = advisory::check_itinerary(&itinerary, &weather).await?;

    if !report.uncovered_days.is_empty() {
        tracing::info!(
            days = ?report.uncovered_days,
            "some days are outside the forecast window"
        );
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
