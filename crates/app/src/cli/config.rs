//! Client Config

use std::{path::PathBuf, time::Duration};

use clap::Args;

use apotheca_app::{
    api::ApiConfig,
    context::{AppConfig, AppContext},
};

/// Apotheca storefront client settings.
#[derive(Debug, Args)]
pub(crate) struct ClientConfig {
    /// Backend app API base URL
    #[arg(
        long,
        env = "APOTHECA_API_URL",
        default_value = "http://localhost:1212/api/v1/app"
    )]
    api_url: String,

    /// Directory for durable client state (session, carts)
    #[arg(long, env = "APOTHECA_DATA_DIR", default_value = ".apotheca")]
    data_dir: PathBuf,

    /// HTTP request timeout in seconds
    #[arg(long, env = "APOTHECA_HTTP_TIMEOUT_SECONDS", default_value_t = 30)]
    http_timeout_seconds: u64,

    /// Seconds between order status poll ticks
    #[arg(long, env = "APOTHECA_POLL_INTERVAL_SECONDS", default_value_t = 10)]
    poll_interval_seconds: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    log_level: String,
}

impl ClientConfig {
    pub(crate) fn log_level(&self) -> &str {
        &self.log_level
    }

    pub(crate) fn build_context(&self) -> Result<AppContext, String> {
        AppContext::init(AppConfig {
            api: ApiConfig {
                base_url: self.api_url.clone(),
                timeout: Duration::from_secs(self.http_timeout_seconds),
            },
            data_dir: self.data_dir.clone(),
            poll_interval: Duration::from_secs(self.poll_interval_seconds),
        })
        .map_err(|error| format!("failed to initialize client: {error}"))
    }
}
