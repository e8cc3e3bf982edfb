use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::DeploymentError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://dirstack-admin.db?mode=rwc";
pub const DEFAULT_PORT: u16 = 3001;

/// Process-level settings, read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// `DATABASE_URL`, `HOST`, and `BACKEND_PORT` (or `PORT`) from the environment
    pub fn from_env() -> Result<Self, DeploymentError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DeploymentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let database_url = get("DATABASE_URL").unwrap_or(defaults.database_url);

        let host = match get("HOST") {
            Some(host) => host
                .trim()
                .parse()
                .map_err(|_| DeploymentError::Config(format!("HOST is not an IP address: {host}")))?,
            None => defaults.host,
        };

        let port = match get("BACKEND_PORT").or_else(|| get("PORT")) {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| DeploymentError::Config(format!("port is not a number: {port}")))?,
            None => defaults.port,
        };

        Ok(Self {
            database_url,
            host,
            port,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, DeploymentError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
    }

    #[test]
    fn test_backend_port_wins_over_port() {
        let config = config(&[("BACKEND_PORT", "4000"), ("PORT", "5000"), ("HOST", "0.0.0.0")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:4000");

        let config = self::config(&[("PORT", "5000"), ("BACKEND_PORT", " ")]).unwrap();
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(config(&[("PORT", "http")]), Err(DeploymentError::Config(_))));
        assert!(matches!(config(&[("HOST", "localhost")]), Err(DeploymentError::Config(_))));
    }
}
