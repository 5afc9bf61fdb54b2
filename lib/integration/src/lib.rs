//! Connectors to the external services toolchat's tools rely on.
//!
//! - **Weather**: current conditions from an OpenWeatherMap-compatible API

pub mod error;
pub mod weather;

pub use error::ConnectorError;
pub use weather::{CurrentWeather, WeatherConfig, WeatherConnector, title_case};
