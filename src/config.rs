//! Chat client configuration.
//!
//! Use the builder methods to customize, or [`ChatConfig::from_env`] to
//! read overrides from `CHATSTREAM_*` environment variables.

use std::time::Duration;

/// Default backend base URL (local Supabase functions host).
pub const DEFAULT_BASE_URL: &str = "http://localhost:54321";

/// Default path of the streaming chat function.
pub const DEFAULT_CHAT_PATH: &str = "/functions/v1/chat";

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Assistant message a new transcript opens with.
pub const DEFAULT_GREETING: &str = "Hi! I'm your AI coding assistant. Paste any code and ask me to explain it, find bugs, or suggest improvements. How can I help?";

/// Configuration for a chat session.
///
/// # Example
///
/// ```ignore
/// use chatstream::config::ChatConfig;
///
/// let config = ChatConfig::default()
///     .with_base_url("https://project.supabase.co")
///     .with_api_key("anon-key")
///     .with_discard_partial_on_abort(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Scheme and host of the backend (default: http://localhost:54321)
    pub base_url: String,
    /// Path of the chat endpoint (default: /functions/v1/chat)
    pub chat_path: String,
    /// Bearer token sent with each request
    pub api_key: Option<String>,
    /// Connect timeout; streams themselves have no total timeout
    pub connect_timeout_secs: u64,
    /// Assistant greeting seeded into new transcripts, `None` for none
    pub greeting: Option<String>,
    /// Drop the partial reply when a turn is cancelled
    pub discard_partial_on_abort: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            api_key: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            greeting: Some(DEFAULT_GREETING.to_string()),
            discard_partial_on_abort: false,
        }
    }
}

impl ChatConfig {
    /// Create a new ChatConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the chat endpoint path.
    pub fn with_chat_path(mut self, path: impl Into<String>) -> Self {
        self.chat_path = path.into();
        self
    }

    /// Set the bearer key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the connect timeout in seconds.
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Set the greeting, or `None` to start transcripts empty.
    pub fn with_greeting(mut self, greeting: Option<String>) -> Self {
        self.greeting = greeting;
        self
    }

    /// Set whether cancelled turns drop their partial reply.
    pub fn with_discard_partial_on_abort(mut self, discard: bool) -> Self {
        self.discard_partial_on_abort = discard;
        self
    }

    /// Full URL of the chat endpoint.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.chat_path.starts_with('/') {
            format!("{}{}", base, self.chat_path)
        } else {
            format!("{}/{}", base, self.chat_path)
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Create config from `CHATSTREAM_*` environment variables.
    ///
    /// Unset variables keep their defaults. An unparseable timeout is
    /// logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = env_value("CHATSTREAM_URL") {
            config = config.with_base_url(url);
        }
        if let Some(path) = env_value("CHATSTREAM_CHAT_PATH") {
            config = config.with_chat_path(path);
        }
        if let Some(key) = env_value("CHATSTREAM_API_KEY") {
            config = config.with_api_key(key);
        }
        if let Some(raw) = env_value("CHATSTREAM_CONNECT_TIMEOUT") {
            match raw.parse::<u64>() {
                Ok(secs) => config = config.with_connect_timeout_secs(secs),
                Err(_) => tracing::warn!(
                    "Ignoring CHATSTREAM_CONNECT_TIMEOUT={:?}: not a whole number of seconds",
                    raw
                ),
            }
        }
        if env_flag("CHATSTREAM_NO_GREETING") {
            config = config.with_greeting(None);
        }
        if env_flag("CHATSTREAM_DISCARD_ON_ABORT") {
            config = config.with_discard_partial_on_abort(true);
        }

        config
    }
}

/// Non-empty value of an environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// True when the variable is set to anything other than `0`/`false`.
fn env_flag(name: &str) -> bool {
    env_value(name).is_some_and(|value| !matches!(value.to_ascii_lowercase().as_str(), "0" | "false"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "CHATSTREAM_URL",
        "CHATSTREAM_CHAT_PATH",
        "CHATSTREAM_API_KEY",
        "CHATSTREAM_CONNECT_TIMEOUT",
        "CHATSTREAM_NO_GREETING",
        "CHATSTREAM_DISCARD_ON_ABORT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_chat_config_default() {
        let config = ChatConfig::default();
        assert_eq!(config.base_url, "http://localhost:54321");
        assert_eq!(config.chat_path, "/functions/v1/chat");
        assert!(config.api_key.is_none());
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.greeting.as_deref(), Some(DEFAULT_GREETING));
        assert!(!config.discard_partial_on_abort);
    }

    #[test]
    fn test_chat_config_builder() {
        let config = ChatConfig::new()
            .with_base_url("https://example.com")
            .with_chat_path("/chat")
            .with_api_key("secret")
            .with_connect_timeout_secs(3)
            .with_greeting(None)
            .with_discard_partial_on_abort(true);

        assert_eq!(config.endpoint(), "https://example.com/chat");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
        assert!(config.greeting.is_none());
        assert!(config.discard_partial_on_abort);
    }

    #[test]
    fn test_endpoint_joins_slashes() {
        let config = ChatConfig::new().with_base_url("http://host:1/");
        assert_eq!(config.endpoint(), "http://host:1/functions/v1/chat");

        let config = ChatConfig::new()
            .with_base_url("http://host:1")
            .with_chat_path("chat");
        assert_eq!(config.endpoint(), "http://host:1/chat");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        assert_eq!(ChatConfig::from_env(), ChatConfig::default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("CHATSTREAM_URL", "https://abc.supabase.co");
        std::env::set_var("CHATSTREAM_API_KEY", "anon");
        std::env::set_var("CHATSTREAM_CONNECT_TIMEOUT", "30");
        std::env::set_var("CHATSTREAM_NO_GREETING", "1");
        std::env::set_var("CHATSTREAM_DISCARD_ON_ABORT", "true");

        let config = ChatConfig::from_env();
        clear_env();

        assert_eq!(config.endpoint(), "https://abc.supabase.co/functions/v1/chat");
        assert_eq!(config.api_key.as_deref(), Some("anon"));
        assert_eq!(config.connect_timeout_secs, 30);
        assert!(config.greeting.is_none());
        assert!(config.discard_partial_on_abort);
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_bad_values() {
        clear_env();
        std::env::set_var("CHATSTREAM_CONNECT_TIMEOUT", "soon");
        std::env::set_var("CHATSTREAM_NO_GREETING", "0");
        std::env::set_var("CHATSTREAM_API_KEY", "   ");

        let config = ChatConfig::from_env();
        clear_env();

        assert_eq!(config.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
        assert!(config.greeting.is_some());
        assert!(config.api_key.is_none());
    }
}
