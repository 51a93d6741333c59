use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    Config,
    cache::{FileStore, LocationCache},
    error::ForecastError,
    invocation::InvocationToken,
    model::{ForecastPayload, LocationRecord, ViewMode},
    projector::{Projections, project},
    provider::{ForecastProvider, directory_from_config, forecast_from_config},
    resolver::LocationResolver,
};

/// Everything one successful run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub location: LocationRecord,
    pub forecast: ForecastPayload,
    pub projections: Projections,
}

/// Resolve, then fetch, then project.
#[derive(Clone)]
pub struct Pipeline {
    resolver: LocationResolver,
    forecast: Arc<dyn ForecastProvider>,
}

impl Pipeline {
    pub fn new(resolver: LocationResolver, forecast: Arc<dyn ForecastProvider>) -> Self {
        Self { resolver, forecast }
    }

    /// Production wiring: GeoDB directory, Open-Meteo forecasts, on-disk cache.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let directory = directory_from_config(config)?;
        let cache = LocationCache::new(Arc::new(FileStore::new(config.cache_dir()?)));

        Ok(Self::new(
            LocationResolver::new(cache, directory),
            forecast_from_config(config),
        ))
    }

    /// Run once for `city_id`.
    ///
    /// `Ok(None)` means `token` went stale while a call was suspended and the
    /// result, success or failure, was dropped. The forecast is never fetched
    /// unless resolution succeeded for a still-current token.
    pub async fn run(
        &self,
        city_id: &str,
        mode: &ViewMode,
        token: &InvocationToken,
    ) -> Result<Option<PipelineOutput>, ForecastError> {
        let location = self.resolver.resolve(city_id).await;
        if !token.is_current() {
            debug!(city_id, generation = token.generation(), "Discarding stale resolution");
            return Ok(None);
        }
        let location = location?;

        let forecast = self.forecast.fetch(&location, mode.window()).await;
        if !token.is_current() {
            debug!(city_id, generation = token.generation(), "Discarding stale forecast");
            return Ok(None);
        }
        let forecast = forecast?;

        let projections = project(&forecast, mode);
        info!(
            city = %location.name,
            %mode,
            chart_points = projections.chart.len(),
            daily_cards = projections.daily.len(),
            "Forecast ready"
        );

        Ok(Some(PipelineOutput {
            location,
            forecast,
            projections,
        }))
    }
}
