pub mod advisory;
pub mod domain;
pub mod llm;
pub mod pipeline;
pub mod places;
pub mod storage;
pub mod time;
pub mod weather;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub gemini_api_key: Option<String>,
        pub google_maps_api_key: Option<String>,
        pub weather_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: non_empty_var("DATABASE_URL"),
                gemini_api_key: non_empty_var("GEMINI_API_KEY"),
                google_maps_api_key: non_empty_var("GOOGLE_MAPS_API_KEY"),
                weather_api_key: non_empty_var("WEATHER_API_KEY"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_gemini_api_key(&self) -> anyhow::Result<&str> {
            self.gemini_api_key
                .as_deref()
                .context("GEMINI_API_KEY is required")
        }

        pub fn require_google_maps_api_key(&self) -> anyhow::Result<&str> {
            self.google_maps_api_key
                .as_deref()
                .context("GOOGLE_MAPS_API_KEY is required")
        }

        pub fn require_weather_api_key(&self) -> anyhow::Result<&str> {
            self.weather_api_key
                .as_deref()
                .context("WEATHER_API_KEY is required")
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    /// Reads a numeric tuning variable, falling back to `default` when unset or unparsable.
    pub fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
        std::env::var(key)
            .ok()
            .and_then(|s| s.trim().parse::<T>().ok())
            .unwrap_or(default)
    }
}
