//! The tools the model may call.

use async_trait::async_trait;
use toolchat_conversation::{ParamType, ToolArguments, ToolDescriptor, ToolError, ToolExecutor, ToolRegistry};
use toolchat_integration::{WeatherConnector, title_case};
use tracing::warn;

/// Builds the dispatch table advertised to the model.
#[must_use]
pub fn registry(weather: WeatherConnector) -> ToolRegistry {
    ToolRegistry::new()
        .with(GetWeatherTool::new(weather))
        .with(MultiplyTool::new())
}

/// Multiplies two integers exactly.
///
/// Widened to 128 bits, so every pair of 64-bit inputs has an exact product.
#[must_use]
pub fn multiply(a: i64, b: i64) -> i128 {
    i128::from(a) * i128::from(b)
}

/// Looks up the current weather for a city.
#[derive(Debug)]
pub struct GetWeatherTool {
    descriptor: ToolDescriptor,
    connector: WeatherConnector,
}

impl GetWeatherTool {
    /// Name the tool is advertised under.
    pub const NAME: &'static str = "get_weather";

    /// Creates the tool on top of a weather connector.
    #[must_use]
    pub fn new(connector: WeatherConnector) -> Self {
        Self {
            descriptor: ToolDescriptor::new(
                Self::NAME,
                "Get the current weather for a given city using OpenWeatherMap API.",
            )
            .with_parameter("city", ParamType::String),
            connector,
        }
    }

    /// Returns a sentence describing the weather in `city`.
    ///
    /// Every failure, from an unknown city to an unreachable service, reads
    /// as "Weather data not found".
    pub async fn get_weather(&self, city: &str) -> String {
        match self.connector.current(city).await {
            Ok(weather) => format!(
                "The weather in {} is {} with a temperature of {}°C.",
                title_case(city),
                weather.description,
                weather.temperature
            ),
            Err(e) => {
                warn!(city, error = %e, "weather lookup failed");
                format!("Weather data not found for {}.", title_case(city))
            }
        }
    }
}

#[async_trait]
impl ToolExecutor for GetWeatherTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError> {
        let city = arguments.string("city")?;
        Ok(self.get_weather(city).await)
    }
}

/// Multiplies two integers.
#[derive(Debug)]
pub struct MultiplyTool {
    descriptor: ToolDescriptor,
}

impl MultiplyTool {
    /// Name the tool is advertised under.
    pub const NAME: &'static str = "mul";

    /// Creates the tool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::new(Self::NAME, "Multiply two numbers.")
                .with_parameter("a", ParamType::Integer)
                .with_parameter("b", ParamType::Integer),
        }
    }
}

impl Default for MultiplyTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for MultiplyTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError> {
        let a = arguments.integer("a")?;
        let b = arguments.integer("b")?;
        Ok(multiply(a, b).to_string())
    }
}
