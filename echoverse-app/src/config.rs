use serde::Deserialize;
use std::{net::IpAddr, time::Duration};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Settings read from the environment, optionally seeded from a `.env` file.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct Env {
    pub server_address: IpAddr,
    pub server_port: u16,
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_notification_ttl_secs")]
    pub notification_ttl_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// A visitor's screen is dropped after this long without a request.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_owned()
}

fn default_notification_ttl_secs() -> u64 {
    4
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_session_idle_secs() -> u64 {
    30 * 60
}

impl Env {
    #[must_use]
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_ttl_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{DEFAULT_BACKEND_URL, Env};
    use std::{
        net::{IpAddr, Ipv4Addr},
        time::Duration,
    };

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn defaults() {
        let env: Env =
            envy::from_iter(vars(&[("SERVER_ADDRESS", "127.0.0.1"), ("SERVER_PORT", "3000")]))
                .unwrap();

        assert_eq!(env.server_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(env.server_port, 3000);
        assert_eq!(env.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(env.notification_ttl(), Duration::from_secs(4));
        assert_eq!(env.request_timeout(), Duration::from_secs(10));
        assert_eq!(env.session_idle(), Duration::from_secs(1800));
    }

    #[test]
    fn overrides() {
        let env: Env = envy::from_iter(vars(&[
            ("SERVER_ADDRESS", "0.0.0.0"),
            ("SERVER_PORT", "8080"),
            ("BACKEND_URL", "http://posts.internal:5000/api"),
            ("NOTIFICATION_TTL_SECS", "10"),
            ("REQUEST_TIMEOUT_SECS", "2"),
            ("SESSION_IDLE_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(env.backend_url, "http://posts.internal:5000/api");
        assert_eq!(env.notification_ttl(), Duration::from_secs(10));
        assert_eq!(env.request_timeout(), Duration::from_secs(2));
        assert_eq!(env.session_idle(), Duration::from_secs(60));
    }

    #[test]
    fn missing_server_address() {
        assert!(envy::from_iter::<_, Env>(vars(&[("SERVER_PORT", "8080")])).is_err());
    }
}
