use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::{
    error::ForecastError,
    model::{DateWindow, ForecastPayload, LocationRecord},
    provider::truncate_body,
};

use super::ForecastProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1";

const HOURLY: &str = "temperature_2m,weathercode";
const HOURLY_EXTENDED: &str = "temperature_2m,weathercode,relativehumidity_2m,windspeed_10m";
const DAILY: &str = "weathercode,temperature_2m_max,temperature_2m_min";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    base_url: String,
    extended_hourly: bool,
    http: Client,
}

impl OpenMeteoClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            extended_hourly: false,
            http: Client::new(),
        }
    }

    /// Also request relative humidity and 10m wind speed per hour.
    pub fn with_extended_hourly(mut self, extended: bool) -> Self {
        self.extended_hourly = extended;
        self
    }

    fn query(&self, location: &LocationRecord, window: Option<&DateWindow>) -> Vec<(&'static str, String)> {
        let hourly = if self.extended_hourly { HOURLY_EXTENDED } else { HOURLY };

        let mut query = vec![
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("current_weather", "true".to_string()),
            ("hourly", hourly.to_string()),
            ("daily", DAILY.to_string()),
            ("timezone", "auto".to_string()),
        ];

        if let Some(window) = window {
            query.push(("start_date", window.start.format(DATE_FORMAT).to_string()));
            query.push(("end_date", window.end.format(DATE_FORMAT).to_string()));
        }

        query
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoClient {
    #[instrument(skip(self, location), fields(city = %location.name), level = "debug")]
    async fn fetch(
        &self,
        location: &LocationRecord,
        window: Option<&DateWindow>,
    ) -> Result<ForecastPayload, ForecastError> {
        let url = format!("{}/forecast", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&self.query(location, window))
            .send()
            .await
            .map_err(|e| ForecastError::Network(format!("Forecast request failed: {e}")))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            ForecastError::Network(format!("Failed to read forecast response body: {e}"))
        })?;

        if !status.is_success() {
            return Err(ForecastError::Network(format!(
                "Forecast request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let payload: ForecastPayload = serde_json::from_str(&body)
            .map_err(|e| ForecastError::Network(format!("Failed to parse forecast JSON: {e}")))?;

        debug!(
            hourly = payload.hourly.time.len(),
            daily = payload.daily.time.len(),
            "Fetched forecast"
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn paris() -> LocationRecord {
        LocationRecord {
            id: 3453,
            name: "Paris".into(),
            country: "France".into(),
            country_code: "FR".into(),
            region: "Île-de-France".into(),
            latitude: 48.8566,
            longitude: 2.3522,
        }
    }

    fn body() -> serde_json::Value {
        serde_json::json!({
            "latitude": 48.86,
            "longitude": 2.35,
            "timezone": "Europe/Paris",
            "current_weather": {
                "temperature": 11.2, "windspeed": 14.0, "weathercode": 61,
                "winddirection": 210, "time": "2024-03-01T14:00"
            },
            "hourly": {
                "time": ["2024-03-01T00:00", "2024-03-01T01:00"],
                "temperature_2m": [8.0, 7.5],
                "weathercode": [61, 63]
            },
            "daily": {
                "time": ["2024-03-01"],
                "weathercode": [63],
                "temperature_2m_max": [12.0],
                "temperature_2m_min": [6.0]
            }
        })
    }

    #[tokio::test]
    async fn windowed_fetch_sends_date_bounds() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("latitude", "48.8566"))
            .and(query_param("longitude", "2.3522"))
            .and(query_param("current_weather", "true"))
            .and(query_param("hourly", "temperature_2m,weathercode"))
            .and(query_param("daily", "weathercode,temperature_2m_max,temperature_2m_min"))
            .and(query_param("timezone", "auto"))
            .and(query_param("start_date", "2024-03-01"))
            .and(query_param("end_date", "2024-03-08"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body()))
            .expect(1)
            .mount(&server)
            .await;

        let window = DateWindow::default_from(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let payload = OpenMeteoClient::new(server.uri())
            .fetch(&paris(), Some(&window))
            .await
            .unwrap();

        assert_eq!(payload.current_weather.weathercode, 61);
        assert_eq!(payload.hourly.temperature_2m, vec![Some(8.0), Some(7.5)]);
    }

    #[tokio::test]
    async fn unwindowed_fetch_omits_date_bounds() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param_is_missing("start_date"))
            .and(query_param_is_missing("end_date"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body()))
            .expect(1)
            .mount(&server)
            .await;

        let payload = OpenMeteoClient::new(server.uri()).fetch(&paris(), None).await;
        assert!(payload.is_ok());
    }

    #[tokio::test]
    async fn extended_hourly_requests_humidity_and_wind() {
        let server = MockServer::start().await;

        let mut extended = body();
        extended["hourly"]["relativehumidity_2m"] = serde_json::json!([80.0, 82.0]);
        extended["hourly"]["windspeed_10m"] = serde_json::json!([12.0, 13.5]);

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("hourly", HOURLY_EXTENDED))
            .respond_with(ResponseTemplate::new(200).set_body_json(extended))
            .mount(&server)
            .await;

        let payload = OpenMeteoClient::new(server.uri())
            .with_extended_hourly(true)
            .fetch(&paris(), None)
            .await
            .unwrap();

        assert_eq!(payload.hourly.relativehumidity_2m, Some(vec![Some(80.0), Some(82.0)]));
        assert_eq!(payload.hourly.windspeed_10m, Some(vec![Some(12.0), Some(13.5)]));
    }

    #[tokio::test]
    async fn non_success_maps_to_network() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": true,
                "reason": "Parameter 'start_date' is out of allowed range"
            })))
            .mount(&server)
            .await;

        let err = OpenMeteoClient::new(server.uri())
            .fetch(&paris(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ForecastError::Network(ref msg) if msg.contains("400")));
    }

    #[tokio::test]
    async fn transport_failure_maps_to_network() {
        // Nothing listens on port 9 of localhost.
        let err = OpenMeteoClient::new("http://127.0.0.1:9".into())
            .fetch(&paris(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ForecastError::Network(_)));
    }
}
