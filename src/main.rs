use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use impf_core::CoreConfig;
use impf_core::config::{
    byte_limit_from_env_value, date_key_suffixes_from_env_value, timezone_policy_from_env_value,
    timezone_source_from_env_value,
};
use impf_core::constants::{DEFAULT_MAX_BODY_BYTES, DEFAULT_REST_ADDR};

/// Main entry point for the Impf application
///
/// Resolves configuration once, then serves the REST API (including the JSON date
/// normalisation layer and Swagger UI).
///
/// # Environment Variables
/// - `IMPF_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `IMPF_TIMEZONE_POLICY`: `local` or `utc` (default: `local`)
/// - `IMPF_TIMEZONE_OFFSET`: `system` or an offset such as `+01:00` (default: `system`)
/// - `IMPF_DATE_KEY_SUFFIXES`: comma-separated override of the date key suffixes
/// - `IMPF_MAX_BODY_BYTES`: largest JSON body the normalisation layer buffers (default: 2 MiB)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("impf_run=info".parse()?)
                .add_directive("impf_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = CoreConfig::new(
        timezone_policy_from_env_value(std::env::var("IMPF_TIMEZONE_POLICY").ok())?,
        timezone_source_from_env_value(std::env::var("IMPF_TIMEZONE_OFFSET").ok())?,
        date_key_suffixes_from_env_value(std::env::var("IMPF_DATE_KEY_SUFFIXES").ok())?,
    )?;
    let max_body_bytes = byte_limit_from_env_value(
        std::env::var("IMPF_MAX_BODY_BYTES").ok(),
        DEFAULT_MAX_BODY_BYTES,
    )?;
    let rest_addr = std::env::var("IMPF_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    tracing::info!(
        policy = %cfg.timezone_policy(),
        timezone = %cfg.timezone_source(),
        date_keys = ?cfg.date_key_suffixes(),
        "++ Starting Impf REST on {}",
        rest_addr
    );

    let app = api_rest::router(AppState::new(cfg.codec(), max_body_bytes));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
