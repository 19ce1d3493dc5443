use crate::config::{env_or, Settings};
use crate::weather::{ForecastSlot, WeatherProvider};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// OpenWeather 5-day / 3-hour forecast.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_weather_api_key()?.to_string();
        let base_url =
            std::env::var("WEATHER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = env_or("WEATHER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        Self::new(api_key, base_url, timeout_secs)
    }

    pub fn new(api_key: String, base_url: String, timeout_secs: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn forecast(&self, location: &str) -> anyhow::Result<Vec<ForecastSlot>> {
        let url = format!("{}/data/2.5/forecast", self.base_url);
        let res = self
            .http
            .get(url)
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("OpenWeather request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("failed to read OpenWeather response body")?;
        if !status.is_success() {
            anyhow::bail!("OpenWeather HTTP error: location={location} status={status} body={text}");
        }

        let parsed = serde_json::from_str::<ForecastResponse>(&text)
            .context("failed to decode OpenWeather forecast")?;

        let utc_offset_s = parsed.city.map_or(0, |c| c.timezone);
        let mut slots = Vec::with_capacity(parsed.list.len());
        for item in parsed.list {
            let Some(at) = DateTime::<Utc>::from_timestamp(item.dt, 0) else {
                tracing::warn!(dt = item.dt, "skipping forecast slot with invalid timestamp");
                continue;
            };
            slots.push(ForecastSlot {
                at,
                condition: item
                    .weather
                    .into_iter()
                    .next()
                    .map(|w| w.main)
                    .unwrap_or_default(),
                temp_min_c: item.main.temp_min,
                temp_max_c: item.main.temp_max,
                humidity_pct: item.main.humidity,
                wind_speed_ms: item.wind.map_or(0.0, |w| w.speed),
                rain_mm: item.rain.and_then(|r| r.three_hours).unwrap_or(0.0),
                utc_offset_s,
            });
        }
        slots.sort_by_key(|s| s.at);
        Ok(slots)
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastItem>,
    #[serde(default)]
    city: Option<CityBlock>,
}

#[derive(Debug, Deserialize)]
struct CityBlock {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt: i64,
    main: MainBlock,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
    #[serde(default)]
    wind: Option<WindBlock>,
    #[serde(default)]
    rain: Option<RainBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp_min: f64,
    temp_max: f64,
    #[serde(default)]
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    main: String,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct RainBlock {
    #[serde(rename = "3h", default)]
    three_hours: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn parses_forecast_slots_in_metric() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data/2.5/forecast")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "Munnar".into()),
                Matcher::UrlEncoded("units".into(), "metric".into()),
                Matcher::UrlEncoded("appid".into(), "w-key".into()),
            ]))
            .with_body(
                json!({
                    "list": [
                        {
                            "dt": 1_782_921_600i64,
                            "main": {"temp_min": 17.0, "temp_max": 19.5, "humidity": 90},
                            "weather": [{"main": "Rain"}],
                            "wind": {"speed": 4.1},
                            "rain": {"3h": 6.2}
                        },
                        {
                            "dt": 1_782_910_800i64,
                            "main": {"temp_min": 18.0, "temp_max": 20.0, "humidity": 80},
                            "weather": [{"main": "Clouds"}]
                        }
                    ],
                    "city": {"name": "Munnar", "timezone": 19800}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = OpenWeatherClient::new("w-key".to_string(), server.url(), 5).unwrap();
        let slots = client.forecast("Munnar").await.unwrap();
        mock.assert_async().await;

        assert_eq!(slots.len(), 2);
        assert!(slots[0].at < slots[1].at);
        assert_eq!(slots[0].condition, "Clouds");
        assert_eq!(slots[0].rain_mm, 0.0);
        assert_eq!(slots[0].wind_speed_ms, 0.0);
        assert_eq!(slots[1].rain_mm, 6.2);
        assert_eq!(slots[1].humidity_pct, 90.0);
        assert!(slots.iter().all(|s| s.utc_offset_s == 19_800));
    }

    #[tokio::test]
    async fn transport_errors_do_not_expose_the_api_key() {
        // Nothing listens on the discard port.
        let client =
            OpenWeatherClient::new("w-secret-456".to_string(), "http://127.0.0.1:9".to_string(), 5)
                .unwrap();
        let err = client.forecast("Jaipur").await.unwrap_err();
        let text = format!("{err:#} {err:?}");
        assert!(text.contains("OpenWeather request failed"));
        assert!(!text.contains("w-secret-456"), "api key leaked: {text}");
    }

    #[tokio::test]
    async fn http_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/data/2.5/forecast")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"cod":"404","message":"city not found"}"#)
            .create_async()
            .await;

        let client = OpenWeatherClient::new("w-key".to_string(), server.url(), 5).unwrap();
        let err = client.forecast("Nowhere").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
