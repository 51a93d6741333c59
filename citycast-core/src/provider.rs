use crate::{
    Config,
    error::ForecastError,
    model::{DateWindow, ForecastPayload, LocationRecord},
    provider::{geodb::GeoDbDirectory, openmeteo::OpenMeteoClient},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod geodb;
pub mod openmeteo;

/// Remote city directory: city id to location record.
#[async_trait]
pub trait CityDirectory: Send + Sync + Debug {
    async fn lookup(&self, city_id: &str) -> Result<LocationRecord, ForecastError>;
}

/// Remote forecast service. One request per call, no retries.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch(
        &self,
        location: &LocationRecord,
        window: Option<&DateWindow>,
    ) -> Result<ForecastPayload, ForecastError>;
}

/// Build the directory client from config. Fails when no API key is available.
pub fn directory_from_config(config: &Config) -> anyhow::Result<Arc<dyn CityDirectory>> {
    let api_key = config.directory_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for the city directory.\n\
                 Hint: run `citycast configure` or set {}.",
            crate::config::API_KEY_ENV
        )
    })?;

    Ok(Arc::new(GeoDbDirectory::new(
        config.directory.base_url.clone(),
        api_key,
        config.directory.api_host.clone(),
    )))
}

pub fn forecast_from_config(config: &Config) -> Arc<dyn ForecastProvider> {
    Arc::new(
        OpenMeteoClient::new(config.forecast.base_url.clone())
            .with_extended_hourly(config.forecast.extended_hourly),
    )
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|&i| body.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
