//! Best-effort geolocation lookup for client IPs.
//!
//! The lookup is display metadata only: a network failure, an unexpected
//! response shape, or the feature being disabled all yield an empty
//! location string and never block login or registration.

use std::time::Duration;

use serde::Deserialize;

/// Geolocation lookup configuration.
#[derive(Debug, Clone)]
pub struct GeoConfig {
    /// Feature toggle (default: off). When off, lookups return `""`.
    pub enabled: bool,
    /// Lookup service base URL.
    pub endpoint: String,
    /// API access key passed as a query parameter.
    pub api_key: String,
}

/// Default lookup service base URL.
const DEFAULT_ENDPOINT: &str = "https://api.ipinfo.info";

/// Per-lookup timeout. Short on purpose: location is cosmetic and must
/// not hold up a login round-trip.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

impl GeoConfig {
    /// Load geolocation configuration from environment variables.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `USE_GEOLOCATION`      | `false`                  |
    /// | `GEOLOCATION_ENDPOINT` | `https://api.ipinfo.info`|
    /// | `GEOLOCATION_API_KEY`  | `` (empty)               |
    pub fn from_env() -> Self {
        let enabled = std::env::var("USE_GEOLOCATION")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let endpoint =
            std::env::var("GEOLOCATION_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.into());

        let api_key = std::env::var("GEOLOCATION_API_KEY").unwrap_or_default();

        Self {
            enabled,
            endpoint,
            api_key,
        }
    }

    /// A disabled config for tests and minimal deployments.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_ENDPOINT.into(),
            api_key: String::new(),
        }
    }
}

/// Response shape returned by the lookup service.
#[derive(Debug, Deserialize)]
struct GeoResponse {
    continent_name: String,
    country_name: String,
    city: String,
}

/// Thin reqwest wrapper around the lookup service.
#[derive(Debug, Clone)]
pub struct GeoClient {
    client: reqwest::Client,
    config: GeoConfig,
}

impl GeoClient {
    pub fn new(config: GeoConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self { client, config }
    }

    /// Resolve an IP to a `"continent, country, city"` string.
    ///
    /// Returns `""` when the feature is disabled or when anything about
    /// the lookup fails.
    pub async fn lookup(&self, ip: &str) -> String {
        if !self.config.enabled {
            return String::new();
        }

        let url = format!(
            "{}/{}/?access_key={}&output=json",
            self.config.endpoint, ip, self.config.api_key
        );

        match self.fetch(&url).await {
            Ok(geo) => format!("{}, {}, {}", geo.continent_name, geo.country_name, geo.city),
            Err(e) => {
                tracing::warn!(ip, error = %e, "Geolocation lookup failed");
                String::new()
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<GeoResponse, reqwest::Error> {
        self.client.get(url).send().await?.json().await
    }
}
