use thiserror::Error;

/// Failures of the forecast pipeline.
///
/// `MalformedCache` never leaves the cache layer; it is built so the fault can
/// be logged with its source before the entry is treated as a miss.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("City not found: {0}")]
    NotFound(String),

    #[error("Rate limited by remote service{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<u64> },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed cache entry '{key}'")]
    MalformedCache {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

fn retry_hint(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!(", retry after {secs} seconds"),
        None => String::new(),
    }
}

impl ForecastError {
    /// Single line shown in place of the loading indicator.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(id) => format!("No city found for id '{id}'."),
            Self::RateLimited { retry_after: Some(secs) } => {
                format!("Too many requests. Please wait {secs} seconds.")
            }
            Self::RateLimited { retry_after: None } => {
                "Too many requests. Please try again later.".to_string()
            }
            Self::Network(_) => "Could not load weather data. Check your connection.".to_string(),
            Self::MalformedCache { .. } => "Local cache error".to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network(_))
    }
}
