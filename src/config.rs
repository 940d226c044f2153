use anyhow::{ensure, Context, Result};

// ---------------------------------------------------------------------------
// PollConfig
// ---------------------------------------------------------------------------

/// Per-run polling parameters. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub channel_id: String,
    /// Empty for public channels.
    pub read_api_key: String,
    pub poll_interval_secs: u64,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub channel_id: String,
    pub read_api_key: String,
    /// Polling interval in seconds.
    pub poll_interval_secs: u64,
    pub thingspeak_base_url: String,
    /// Upper bound for a single upstream request, in seconds.
    pub request_timeout_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    /// Directory with the prebuilt UI. `None` disables static file serving.
    pub static_dir: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, so parsing can be
    /// exercised without touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("missing required env var: {key}"))
        };
        let optional =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let poll_interval_secs = parse_positive(
            "POLL_INTERVAL_SECS",
            &optional("POLL_INTERVAL_SECS", "30"),
        )?;
        let request_timeout_secs = parse_positive(
            "REQUEST_TIMEOUT_SECS",
            &optional("REQUEST_TIMEOUT_SECS", "10"),
        )?;
        let static_dir = optional("STATIC_DIR", "wwwroot");

        Ok(Self {
            channel_id: required("THINGSPEAK_CHANNEL_ID")?.trim().to_owned(),
            read_api_key: optional("THINGSPEAK_READ_API_KEY", "").trim().to_owned(),
            poll_interval_secs,
            thingspeak_base_url: optional("THINGSPEAK_BASE_URL", "https://api.thingspeak.com"),
            request_timeout_secs,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            static_dir: (!static_dir.trim().is_empty()).then(|| static_dir.trim().to_owned()),
        })
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            channel_id: self.channel_id.clone(),
            read_api_key: self.read_api_key.clone(),
            poll_interval_secs: self.poll_interval_secs,
        }
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64> {
    let value: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a positive integer, got: {raw:?}"))?;
    ensure!(value > 0, "{key} must be a positive integer, got: 0");
    Ok(value)
}
