//! Application entry point.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::SecretString;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use sweeps_compliance::api::create_router;
use sweeps_compliance::app::AppState;
use sweeps_compliance::domain::{
    ConfigError, DEFAULT_EXCHANGE_RATE_THRESHOLD, DEFAULT_LARGE_TRANSACTION_THRESHOLD,
    ScreeningConfig,
};
use sweeps_compliance::infra::reasoning::gemini::DEFAULT_TIMEOUT_SECS;
use sweeps_compliance::infra::reasoning::{DEFAULT_GEMINI_API_URL, DEFAULT_GEMINI_MODEL};
use sweeps_compliance::infra::{GeminiConfig, GeminiReasoningClient, InMemoryLedger};

/// Behaviour hint sent with every screening unless overridden
const DEFAULT_BEHAVIOR_HINT: &str =
    "Flag users making multiple large withdrawals in a short period.";

/// Application configuration
struct Config {
    host: String,
    port: u16,
    /// Gemini API key (optional - offline screening if not set)
    gemini_api_key: Option<SecretString>,
    gemini_api_url: String,
    gemini_model: String,
    /// Transport timeout for reasoning calls in seconds (default: 60)
    reasoning_timeout_secs: u64,
    screening: ScreeningConfig,
    /// JSON file used to seed the in-memory ledger (optional)
    ledger_seed_path: Option<String>,
    json_logs: bool,
}

impl Config {
    fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("PORT", 3000)?;

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(SecretString::from);
        let gemini_api_url = env::var("GEMINI_API_URL")
            .ok()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string());
        let gemini_model = env::var("GEMINI_MODEL")
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let reasoning_timeout_secs = parse_var("REASONING_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        let large_transaction_threshold = parse_var(
            "SCREENING_LARGE_TRANSACTION_THRESHOLD",
            DEFAULT_LARGE_TRANSACTION_THRESHOLD,
        )?;
        let exchange_rate_threshold = parse_var(
            "SCREENING_EXCHANGE_RATE_THRESHOLD",
            DEFAULT_EXCHANGE_RATE_THRESHOLD,
        )?;
        for (name, value) in [
            ("SCREENING_LARGE_TRANSACTION_THRESHOLD", large_transaction_threshold),
            ("SCREENING_EXCHANGE_RATE_THRESHOLD", exchange_rate_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: "must be a non-negative number".to_string(),
                });
            }
        }

        // Empty string disables the hint entirely
        let unusual_behavior_description = match env::var("SCREENING_BEHAVIOR_HINT") {
            Ok(hint) if hint.is_empty() => None,
            Ok(hint) => Some(hint),
            Err(_) => Some(DEFAULT_BEHAVIOR_HINT.to_string()),
        };

        let ledger_seed_path = env::var("LEDGER_SEED_PATH").ok().filter(|p| !p.is_empty());
        let json_logs = env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            gemini_api_key,
            gemini_api_url,
            gemini_model,
            reasoning_timeout_secs,
            screening: ScreeningConfig {
                large_transaction_threshold,
                exchange_rate_threshold,
                unusual_behavior_description,
            },
            ledger_seed_path,
            json_logs,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.is_empty() => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name: name.to_string(),
            message: e.to_string(),
        }),
        _ => Ok(default),
    }
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let config = Config::from_env().context("Invalid configuration")?;
    init_tracing(config.json_logs);

    info!("Sweeps Compliance v{}", env!("CARGO_PKG_VERSION"));
    info!("Initializing infrastructure...");

    let ledger = match &config.ledger_seed_path {
        Some(path) => InMemoryLedger::from_seed_file(path)
            .await
            .with_context(|| format!("Failed to seed ledger from {}", path))?,
        None => {
            info!("   ○ No LEDGER_SEED_PATH set, starting with an empty ledger");
            InMemoryLedger::new()
        }
    };
    let ledger = Arc::new(ledger);
    info!("   ✓ Ledger ready");

    let offline = config.gemini_api_key.is_none();
    let reasoning_client = GeminiReasoningClient::new(GeminiConfig {
        api_key: config.gemini_api_key,
        base_url: config.gemini_api_url,
        model: config.gemini_model.clone(),
        timeout: Duration::from_secs(config.reasoning_timeout_secs),
    })
    .context("Failed to create reasoning client")?;
    if offline {
        warn!("   ⚠ Reasoning client created (OFFLINE MODE - no GEMINI_API_KEY)");
    } else {
        info!("   ✓ Reasoning client created (model: {})", config.gemini_model);
    }

    info!(
        large_transaction_threshold = config.screening.large_transaction_threshold,
        exchange_rate_threshold = config.screening.exchange_rate_threshold,
        "   ✓ Screening defaults configured"
    );

    let app_state = Arc::new(AppState::with_screening_config(
        ledger.clone(),
        ledger,
        Arc::new(reasoning_client),
        config.screening,
    ));

    let router = create_router(app_state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server starting on http://{}", addr);
    info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
