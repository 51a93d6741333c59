use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header::RETRY_AFTER};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{error::ForecastError, model::LocationRecord, provider::truncate_body};

use super::CityDirectory;

pub const DEFAULT_BASE_URL: &str = "https://wft-geo-db.p.rapidapi.com/v1/geo";
pub const DEFAULT_API_HOST: &str = "wft-geo-db.p.rapidapi.com";

const KEY_HEADER: &str = "X-RapidAPI-Key";
const HOST_HEADER: &str = "X-RapidAPI-Host";

/// GeoDB Cities lookup over RapidAPI.
#[derive(Clone)]
pub struct GeoDbDirectory {
    base_url: String,
    api_key: String,
    api_host: String,
    http: Client,
}

// Keeps the key out of logs.
impl std::fmt::Debug for GeoDbDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoDbDirectory")
            .field("base_url", &self.base_url)
            .field("api_host", &self.api_host)
            .finish_non_exhaustive()
    }
}

impl GeoDbDirectory {
    pub fn new(base_url: String, api_key: String, api_host: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_host,
            http: Client::new(),
        }
    }

    /// `{base}/cities/{id}` with the id as one escaped path segment.
    fn city_url(&self, city_id: &str) -> Result<Url, ForecastError> {
        let invalid = || {
            ForecastError::Network(format!("Invalid city directory URL: {}", self.base_url))
        };
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("cities")
            .push(city_id);
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct GeoDbCityResponse {
    data: LocationRecord,
}

#[async_trait]
impl CityDirectory for GeoDbDirectory {
    #[instrument(skip(self), level = "debug")]
    async fn lookup(&self, city_id: &str) -> Result<LocationRecord, ForecastError> {
        let url = self.city_url(city_id)?;

        let res = self
            .http
            .get(url)
            .header(KEY_HEADER, &self.api_key)
            .header(HOST_HEADER, &self.api_host)
            .send()
            .await
            .map_err(|e| ForecastError::Network(format!("City directory request failed: {e}")))?;

        let status = res.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ForecastError::NotFound(city_id.to_string()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = res
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return Err(ForecastError::RateLimited { retry_after });
        }

        let body = res.text().await.map_err(|e| {
            ForecastError::Network(format!("Failed to read city directory response body: {e}"))
        })?;

        if !status.is_success() {
            return Err(ForecastError::Network(format!(
                "City directory request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: GeoDbCityResponse = serde_json::from_str(&body).map_err(|e| {
            ForecastError::Network(format!("Failed to parse city directory JSON: {e}"))
        })?;

        debug!(name = %parsed.data.name, "Resolved city from directory");
        Ok(parsed.data)
    }
}
