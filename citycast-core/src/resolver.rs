use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    cache::LocationCache, error::ForecastError, model::LocationRecord, provider::CityDirectory,
};

/// Cache-first city lookup.
///
/// Cached records are trusted for as long as they exist. A miss costs exactly
/// one directory call, and only successful lookups are written back.
#[derive(Clone)]
pub struct LocationResolver {
    cache: LocationCache,
    directory: Arc<dyn CityDirectory>,
}

impl LocationResolver {
    pub fn new(cache: LocationCache, directory: Arc<dyn CityDirectory>) -> Self {
        Self { cache, directory }
    }

    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    pub async fn resolve(&self, city_id: &str) -> Result<LocationRecord, ForecastError> {
        if let Some(record) = self.cache.get(city_id) {
            debug!(city_id, "Location cache hit");
            return Ok(record);
        }

        debug!(city_id, "Location cache miss");
        let record = self.directory.lookup(city_id).await?;

        if let Err(e) = self.cache.put(city_id, &record) {
            warn!(city_id, error = %e, "Failed to persist location record");
        }

        Ok(record)
    }
}
