use rootcause::prelude::ResultExt;
use toolchat::{ChatConfig, ChatError, ChatLoop, tools};
use toolchat_ai::OpenAiGateway;
use toolchat_integration::WeatherConnector;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Stdout carries the conversation, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(report) = run().await {
        tracing::error!("{report}");
        std::process::exit(1);
    }
}

async fn run() -> toolchat_core::Result<(), ChatError> {
    let config = ChatConfig::load().map_err(|e| ChatError::Configuration {
        reason: e.to_string(),
    })?;
    tracing::debug!(model = %config.model.name, "loaded configuration");

    let weather = WeatherConnector::new(config.weather, config.openweather_api_key).context(
        ChatError::Startup {
            component: "weather connector",
        },
    )?;
    let gateway = OpenAiGateway::new(config.model, config.groq_api_key).context(
        ChatError::Startup {
            component: "model gateway",
        },
    )?;

    let mut chat = ChatLoop::new(gateway, tools::registry(weather), config.system_prompt);
    chat.run(std::io::stdin().lock(), std::io::stdout()).await
}
