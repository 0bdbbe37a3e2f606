//! Incidentscope configuration
use clap::Parser;
use url::Url;

/// Backend API configuration options
#[derive(Debug, Clone, Parser)]
pub struct ApiOpts {
    /// Base URL of the incident management API
    #[clap(long, env = "API_BASE_URL")]
    pub base_url: Url,
    /// API key used as the bearer token
    #[clap(long, env = "API_KEY")]
    pub api_key: String,
    /// Request timeout in seconds
    #[clap(long, env = "API_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,
}

/// Push channel configuration options
#[derive(Debug, Clone, Parser)]
pub struct PushOpts {
    /// WebSocket URL of the push notification channel
    #[clap(long, env = "PUSH_WS_URL")]
    pub ws_url: Url,
    /// Delay in seconds before the first push reconnect attempt
    #[clap(long, env = "PUSH_RECONNECT_DELAY_SECS", default_value = "1")]
    pub reconnect_delay_secs: u64,
}

/// Incident watcher configuration options
#[derive(Debug, Clone, Parser)]
pub struct WatchOpts {
    /// Page size for the watched incident list
    #[clap(long, env = "WATCH_PAGE_SIZE", default_value = "20")]
    pub page_size: u64,
    /// Also watch candidate incidents
    #[clap(long, env = "WATCH_CANDIDATES")]
    pub candidates: bool,
    /// CEL filter expression applied to the watched incident list
    #[clap(long, env = "WATCH_CEL", default_value = "")]
    pub cel: String,
}

/// CLI options for incidentscope
#[derive(Debug, Clone, Parser)]
pub struct Opts {
    /// Backend API configuration
    #[clap(flatten)]
    pub api: ApiOpts,

    /// Push channel configuration
    #[clap(flatten)]
    pub push: PushOpts,

    /// Incident watcher configuration
    #[clap(flatten)]
    pub watch: WatchOpts,
}
