use std::time::Duration;

use url::Url;

use super::reconnect::ExponentialBackoffReconnect;
use super::types::{WebSocketBufferConfig, WebSocketError, WebSocketResult};

/// Page/host origin used to derive the endpoint when no explicit URL is configured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WsClientOrigin {
    pub secure: bool,
    pub host: String,
    pub port: u16,
    /// Ports served by a local dev proxy that forwards the websocket path.
    pub dev_proxy_ports: Vec<u16>,
    pub backend_port: u16,
    pub path: String,
}

impl WsClientOrigin {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            secure: false,
            host: host.into(),
            port,
            dev_proxy_ports: vec![5173, 3000],
            backend_port: 8080,
            path: "/ws".to_string(),
        }
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_dev_proxy_ports(mut self, ports: impl Into<Vec<u16>>) -> Self {
        self.dev_proxy_ports = ports.into();
        self
    }

    pub fn with_backend_port(mut self, port: u16) -> Self {
        self.backend_port = port;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Same origin when behind the dev proxy, otherwise the backend port on the same host.
    pub fn endpoint(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        let port = if self.dev_proxy_ports.contains(&self.port) {
            self.port
        } else {
            self.backend_port
        };
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!("{scheme}://{}:{port}{path}", self.host)
    }
}

/// Connection settings. Every field has a default; see [`WsClientConfig::default`].
#[derive(Clone, Debug)]
pub struct WsClientConfig {
    pub url: Option<String>,
    pub origin: Option<WsClientOrigin>,
    /// Forwarded verbatim as the `token` query parameter.
    pub auth_token: Option<String>,
    pub max_reconnect_attempts: u32,
    pub reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
    pub reconnect_delay_multiplier: f64,
    pub connection_timeout: Duration,
    /// Zero disables the heartbeat.
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub auto_reconnect: bool,
    pub max_queue_size: usize,
    /// Log every inbound and outbound frame at debug level.
    pub debug: bool,
    pub buffers: WebSocketBufferConfig,
}

impl Default for WsClientConfig {
    fn default() -> Self {
        Self {
            url: None,
            origin: None,
            auth_token: None,
            max_reconnect_attempts: 10,
            reconnect_delay: Duration::from_millis(1000),
            max_reconnect_delay: Duration::from_millis(30_000),
            reconnect_delay_multiplier: 1.5,
            connection_timeout: Duration::from_millis(10_000),
            heartbeat_interval: Duration::ZERO,
            heartbeat_timeout: Duration::from_millis(5000),
            auto_reconnect: true,
            max_queue_size: 100,
            debug: false,
            buffers: WebSocketBufferConfig::default(),
        }
    }
}

impl WsClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn from_origin(origin: WsClientOrigin) -> Self {
        Self {
            origin: Some(origin),
            ..Self::default()
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn with_reconnect_backoff(mut self, initial: Duration, max: Duration, multiplier: f64) -> Self {
        self.reconnect_delay = initial;
        self.max_reconnect_delay = max;
        self.reconnect_delay_multiplier = multiplier;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_heartbeat(mut self, interval: Duration, timeout: Duration) -> Self {
        self.heartbeat_interval = interval;
        self.heartbeat_timeout = timeout;
        self
    }

    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    pub fn with_max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_buffers(mut self, buffers: WebSocketBufferConfig) -> Self {
        self.buffers = buffers;
        self
    }

    pub fn backoff(&self) -> ExponentialBackoffReconnect {
        ExponentialBackoffReconnect::new(
            self.reconnect_delay,
            self.max_reconnect_delay,
            self.reconnect_delay_multiplier,
        )
    }

    /// Endpoint to dial: the explicit URL, else the origin-derived one, plus the auth token.
    pub fn resolve_url(&self) -> WebSocketResult<String> {
        let base = match (&self.url, &self.origin) {
            (Some(url), _) => url.clone(),
            (None, Some(origin)) => origin.endpoint(),
            (None, None) => {
                return Err(WebSocketError::InvalidConfig(
                    "no url or origin configured".to_string(),
                ));
            }
        };

        let mut url = Url::parse(&base)
            .map_err(|err| WebSocketError::InvalidConfig(format!("invalid url {base}: {err}")))?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(WebSocketError::InvalidConfig(format!(
                    "unsupported scheme {other}"
                )));
            }
        }
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = WsClientConfig::default();
        assert_eq!(cfg.max_reconnect_attempts, 10);
        assert_eq!(cfg.reconnect_delay, Duration::from_millis(1000));
        assert_eq!(cfg.max_reconnect_delay, Duration::from_millis(30_000));
        assert_eq!(cfg.reconnect_delay_multiplier, 1.5);
        assert_eq!(cfg.connection_timeout, Duration::from_millis(10_000));
        assert!(cfg.heartbeat_interval.is_zero());
        assert!(cfg.auto_reconnect);
        assert_eq!(cfg.max_queue_size, 100);
        assert!(!cfg.debug);
    }

    #[test]
    fn explicit_url_wins_and_carries_token() {
        let cfg = WsClientConfig::new("ws://game.local:9000/ws")
            .with_auth_token("a b&c")
            .with_max_queue_size(5);
        assert_eq!(
            cfg.resolve_url().unwrap(),
            "ws://game.local:9000/ws?token=a+b%26c"
        );
    }

    #[test]
    fn origin_uses_dev_proxy_or_backend_port() {
        let proxied = WsClientConfig::from_origin(WsClientOrigin::new("localhost", 5173));
        assert_eq!(proxied.resolve_url().unwrap(), "ws://localhost:5173/ws");

        let direct = WsClientConfig::from_origin(
            WsClientOrigin::new("play.example.com", 443)
                .secure(true)
                .with_backend_port(9443)
                .with_path("socket"),
        );
        assert_eq!(
            direct.resolve_url().unwrap(),
            "wss://play.example.com:9443/socket"
        );
    }

    #[test]
    fn missing_or_bad_url_is_invalid_config() {
        assert!(matches!(
            WsClientConfig::default().resolve_url(),
            Err(WebSocketError::InvalidConfig(_))
        ));
        assert!(matches!(
            WsClientConfig::new("http://example.com").resolve_url(),
            Err(WebSocketError::InvalidConfig(_))
        ));
        assert!(matches!(
            WsClientConfig::new("not a url").resolve_url(),
            Err(WebSocketError::InvalidConfig(_))
        ));
    }
}
