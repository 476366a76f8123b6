//! Config for the bridge behaviors
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`]. Once built, it is handed to the
//! [`Client`](crate::client::Client) and [`ServerApi`](crate::api::ServerApi) at construction;
//! nothing else reads the environment.
//!
//! # Environment Variables
//!
//! All values are optional.
//!
//! - `GAME_SERVER` — Base URL of the game server (default: `https://gbc2023.tenka1.klab.jp`)
//! - `TOKEN` — Credential used in every API path (default: `YOUR_TOKEN`)
//! - `GAME_ID` — Play this game instead of starting a practice match (must be an integer)
//! - `PRACTICE_MODE` — Mode used when a practice match is started (default: `0`)
//! - `PRACTICE_DELAY` — Start delay used when a practice match is started (default: `0`)
//! - `HTTP_TIMEOUT_MS` — Per-request transport timeout in milliseconds (default: `10000`)
//! - `BRIDGE_LOG` — Set to `"true"` to log to a file instead of stderr (default: `false`)

use std::{env, time::Duration};

use anyhow::Context;

/// Server used when `GAME_SERVER` is not set.
pub const DEFAULT_GAME_SERVER: &str = "https://gbc2023.tenka1.klab.jp";
/// Token used when `TOKEN` is not set.
pub const DEFAULT_TOKEN: &str = "YOUR_TOKEN";

/// Configuration for bridge behaviors.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub(crate) game_server: String,
    pub(crate) token: String,
    pub(crate) game_id: Option<i64>,
    pub(crate) practice_mode: i32,
    pub(crate) practice_delay: i32,
    pub(crate) http_timeout: Duration,
    pub(crate) log_to_file: bool,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - The public contest server is polled with the placeholder token.
    /// - No game id is given, so a practice match (mode 0, delay 0) is started.
    /// - Requests time out after 10 seconds.
    /// - Logs go to stderr.
    pub fn new() -> Self {
        Self {
            game_server: DEFAULT_GAME_SERVER.to_string(),
            token: DEFAULT_TOKEN.to_string(),
            game_id: None,
            practice_mode: 0,
            practice_delay: 0,
            http_timeout: Duration::from_secs(10),
            log_to_file: false,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Unset or empty variables keep their default value.
    ///
    /// # Errors
    /// Returned when a numeric variable (`GAME_ID`, `PRACTICE_MODE`, `PRACTICE_DELAY`,
    /// `HTTP_TIMEOUT_MS`) is set but does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        fn get_env(var: &str) -> Option<String> {
            env::var(var).ok().filter(|v| !v.trim().is_empty())
        }

        fn parse_env<T: std::str::FromStr>(var: &str) -> anyhow::Result<Option<T>>
        where
            T::Err: std::error::Error + Send + Sync + 'static,
        {
            match get_env(var) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map(Some)
                    .with_context(|| format!("invalid {var}: '{raw}'")),
                None => Ok(None),
            }
        }

        let mut config = Self::new();
        if let Some(server) = get_env("GAME_SERVER") {
            config = config.with_game_server(server);
        }
        if let Some(token) = get_env("TOKEN") {
            config.token = token;
        }
        config.game_id = parse_env("GAME_ID")?;
        if let Some(mode) = parse_env("PRACTICE_MODE")? {
            config.practice_mode = mode;
        }
        if let Some(delay) = parse_env("PRACTICE_DELAY")? {
            config.practice_delay = delay;
        }
        if let Some(ms) = parse_env::<u64>("HTTP_TIMEOUT_MS")? {
            config = config.with_http_timeout(Duration::from_millis(ms));
        }
        config.log_to_file = get_env("BRIDGE_LOG").is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Ok(config)
    }

    /// Set the base URL requests are sent to. A trailing `/` is dropped.
    pub fn with_game_server(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        while url.ends_with('/') {
            url.pop();
        }
        self.game_server = url;
        self
    }

    /// Set the credential token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Play an existing game instead of starting a practice match.
    pub fn with_game_id(mut self, game_id: Option<i64>) -> Self {
        self.game_id = game_id;
        self
    }

    /// Set the mode and start delay of the practice match.
    pub fn with_practice(mut self, mode: i32, delay: i32) -> Self {
        self.practice_mode = mode;
        self.practice_delay = delay;
        self
    }

    /// Set the per-request transport timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log_to_file(mut self, value: bool) -> Self {
        self.log_to_file = value;
        self
    }

    /// Base URL of the game server.
    pub fn game_server(&self) -> &str {
        &self.game_server
    }

    /// Explicit game id, if any.
    pub fn game_id(&self) -> Option<i64> {
        self.game_id
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}
