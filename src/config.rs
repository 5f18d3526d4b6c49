use std::time::Duration;

/// Default listening port
pub const DEFAULT_PORT: u16 = 9999;

/// Default listening host, all interfaces
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// ServerConfig holds the settings shared read-only by every connection
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    account: Option<String>,
    pub handshake_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            account: None,
            handshake_timeout: None,
        }
    }
}

impl ServerConfig {
    /// new builds a configuration listening on `host:port` with no
    /// authentication and no handshake deadline
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// with_credentials sets the `username:password` account. An empty
    /// string disables authentication
    pub fn with_credentials(mut self, account: Option<String>) -> Self {
        self.account = account.filter(|a| !a.is_empty());
        self
    }

    /// with_handshake_timeout bounds the time from the first byte to the
    /// start of the relay
    pub fn with_handshake_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// credentials returns the configured `username:password` account
    pub fn credentials(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// listen_addr is the `host:port` string handed to the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
