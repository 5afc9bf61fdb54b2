//! Current-weather lookups against an OpenWeatherMap-compatible API.

use crate::error::ConnectorError;
use reqwest::Client;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use toolchat_core::ApiKey;
use tracing::{debug, instrument};

/// Weather service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL of the API, without the `/weather` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Unit system passed to the service. Replies are rendered in °C, so
    /// this should stay `metric`.
    #[serde(default = "default_units")]
    pub units: String,
    /// Bound on a single request, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://api.openweathermap.org/data/2.5".to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            units: default_units(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl WeatherConfig {
    /// Points the configuration at another base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Current conditions for a city.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentWeather {
    /// Temperature exactly as the service reported it.
    pub temperature: serde_json::Number,
    /// Description of the first reported condition, e.g. `clear sky`.
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainReadings,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: serde_json::Number,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

/// HTTP client for the weather service.
#[derive(Debug, Clone)]
pub struct WeatherConnector {
    client: Client,
    config: WeatherConfig,
    api_key: ApiKey,
}

impl WeatherConnector {
    /// Creates a connector. The key is not checked here; a missing key
    /// shows up as a rejected request.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidConfig`] if the HTTP client cannot
    /// be built.
    pub fn new(config: WeatherConfig, api_key: ApiKey) -> Result<Self, Report<ConnectorError>> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ConnectorError::InvalidConfig {
                reason: format!("HTTP client error: {e}"),
            })?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/weather", self.config.base_url.trim_end_matches('/'))
    }

    /// Fetches the current weather for `city`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unreachable, answers with anything
    /// but 200, or sends a body without a temperature and a description.
    #[instrument(skip(self), fields(units = %self.config.units))]
    pub async fn current(&self, city: &str) -> Result<CurrentWeather, Report<ConnectorError>> {
        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("q", city),
                ("appid", self.api_key.expose()),
                ("units", self.config.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ConnectorError::Timeout
                } else {
                    ConnectorError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ConnectorError::UnexpectedStatus {
                status: status.as_u16(),
            }
            .into());
        }

        let body: WeatherResponse =
            response
                .json()
                .await
                .map_err(|e| ConnectorError::ProtocolError {
                    reason: e.to_string(),
                })?;
        let condition = body
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| ConnectorError::ProtocolError {
                reason: "no weather conditions in response".to_string(),
            })?;

        debug!(temperature = %body.main.temp, "weather received");
        Ok(CurrentWeather {
            temperature: body.main.temp,
            description: condition.description,
        })
    }
}

/// Title-cases `text`: a letter is upper-cased when it does not follow
/// another letter and lower-cased otherwise.
///
/// ```
/// use toolchat_integration::title_case;
///
/// assert_eq!(title_case("new york"), "New York");
/// assert_eq!(title_case("o'neil"), "O'Neil");
/// ```
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = true;
        } else {
            out.push(c);
            after_letter = false;
        }
    }
    out
}
