//! Configuration for the mogilefs client
//!
//! Settings are layered: serde defaults, then an optional TOML file, then
//! `MOGILEFS_*` environment variables.

use crate::common::{secs_to_duration, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default tracker port
pub const DEFAULT_TRACKER_PORT: u16 = 7001;

/// Environment variable naming a config file when no path is given
pub const CONFIG_ENV: &str = "MOGILEFS_CONFIG";

const ENV_PREFIX: &str = "MOGILEFS";

/// `MOGILEFS_*` variables; `MOGILEFS_TRACKERS` is a comma-separated list
fn environment() -> ::config::Environment {
    ::config::Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("trackers")
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Tracker addresses, in failover priority order
    #[serde(default = "default_trackers")]
    pub trackers: Vec<String>,

    /// Domain all keys live in
    #[serde(default)]
    pub domain: String,

    /// Storage class used when a store call does not name one
    #[serde(default = "default_class")]
    pub default_class: String,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: f64,

    /// Read/write timeout on the tracker socket in seconds
    #[serde(default = "default_tracker_timeout")]
    pub tracker_timeout: f64,
}

fn default_trackers() -> Vec<String> {
    vec![format!("127.0.0.1:{}", DEFAULT_TRACKER_PORT)]
}
fn default_class() -> String {
    "default".to_string()
}
fn default_connect_timeout() -> f64 {
    3.0
}
fn default_tracker_timeout() -> f64 {
    3.0
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            trackers: default_trackers(),
            domain: String::new(),
            default_class: default_class(),
            connect_timeout: default_connect_timeout(),
            tracker_timeout: default_tracker_timeout(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from `path` (or `$MOGILEFS_CONFIG`) and the environment.
    ///
    /// The result is not validated; call [`ClientConfig::validate`] once any
    /// command-line overrides have been applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        Self::load_layers(path, environment())
    }

    fn load_layers(path: Option<PathBuf>, env: ::config::Environment) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            tracing::debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }
        builder = builder.add_source(env);

        let config = builder.build()?.try_deserialize::<ClientConfig>()?;
        Ok(config)
    }

    /// Check that the configuration can drive a client
    pub fn validate(&self) -> Result<()> {
        if self.trackers.is_empty() {
            return Err(Error::InvalidConfig("no trackers configured".into()));
        }
        if self.domain.is_empty() {
            return Err(Error::InvalidConfig("domain must not be empty".into()));
        }
        self.endpoints()?;
        self.connection_settings()?;
        Ok(())
    }

    /// Tracker endpoints in configured order
    pub fn endpoints(&self) -> Result<Vec<TrackerEndpoint>> {
        self.trackers.iter().map(|t| t.parse()).collect()
    }

    pub fn connection_settings(&self) -> Result<ConnectionSettings> {
        Ok(ConnectionSettings {
            connect_timeout: secs_to_duration(self.connect_timeout)?,
            io_timeout: secs_to_duration(self.tracker_timeout)?,
        })
    }

    pub fn domain_config(&self) -> DomainConfig {
        DomainConfig {
            domain: self.domain.clone(),
            default_class: self.default_class.clone(),
        }
    }
}

/// One tracker address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackerEndpoint {
    pub host: String,
    pub port: u16,
}

impl TrackerEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl FromStr for TrackerEndpoint {
    type Err = Error;

    /// Accepts `host`, `host:port`, `[v6]:port` and an optional `scheme://` prefix
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidConfig(format!("invalid tracker address: '{}'", s));

        let trimmed = s.trim();
        let rest = match trimmed.find("://") {
            Some(idx) => &trimmed[idx + 3..],
            None => trimmed,
        };
        let rest = rest.trim_end_matches('/');
        if rest.is_empty() {
            return Err(invalid());
        }

        let parse_port = |p: &str| p.parse::<u16>().map_err(|_| invalid());

        if let Some(bracketed) = rest.strip_prefix('[') {
            let (host, after) = bracketed.split_once(']').ok_or_else(invalid)?;
            let port = match after {
                "" => DEFAULT_TRACKER_PORT,
                p => parse_port(p.strip_prefix(':').ok_or_else(invalid)?)?,
            };
            if host.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::new(host, port));
        }

        match rest.rsplit_once(':') {
            // Bare IPv6 literal without a port
            Some((host, _)) if host.contains(':') => Ok(Self::new(rest, DEFAULT_TRACKER_PORT)),
            Some((host, port)) if !host.is_empty() => Ok(Self::new(host, parse_port(port)?)),
            Some(_) => Err(invalid()),
            None => Ok(Self::new(rest, DEFAULT_TRACKER_PORT)),
        }
    }
}

impl fmt::Display for TrackerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Timeouts shared by every tracker connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            io_timeout: Duration::from_secs(3),
        }
    }
}

/// Domain and default storage class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainConfig {
    pub domain: String,
    pub default_class: String,
}

impl DomainConfig {
    pub fn new(domain: impl Into<String>, default_class: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            default_class: default_class.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_endpoint() {
        let ep: TrackerEndpoint = "tracker1:7002".parse().unwrap();
        assert_eq!(ep, TrackerEndpoint::new("tracker1", 7002));

        let ep: TrackerEndpoint = "tracker1".parse().unwrap();
        assert_eq!(ep.port, DEFAULT_TRACKER_PORT);

        let ep: TrackerEndpoint = "tcp://10.0.0.5:7001/".parse().unwrap();
        assert_eq!(ep, TrackerEndpoint::new("10.0.0.5", 7001));

        let ep: TrackerEndpoint = "[::1]:7005".parse().unwrap();
        assert_eq!(ep, TrackerEndpoint::new("::1", 7005));
        assert_eq!(ep.to_string(), "[::1]:7005");

        let ep: TrackerEndpoint = "::1".parse().unwrap();
        assert_eq!(ep, TrackerEndpoint::new("::1", DEFAULT_TRACKER_PORT));
    }

    #[test]
    fn test_parse_endpoint_invalid() {
        assert!("".parse::<TrackerEndpoint>().is_err());
        assert!("host:notaport".parse::<TrackerEndpoint>().is_err());
        assert!("host:99999".parse::<TrackerEndpoint>().is_err());
        assert!(":7001".parse::<TrackerEndpoint>().is_err());
        assert!("[::1".parse::<TrackerEndpoint>().is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = ClientConfig {
            domain: "photos".into(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.tracker_timeout = -1.0;
        assert!(config.validate().is_err());

        config.tracker_timeout = 0.5;
        config.trackers.clear();
        assert!(config.validate().is_err());

        config.trackers = vec!["a:1".into()];
        config.domain.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_settings_sub_second() {
        let config = ClientConfig {
            domain: "photos".into(),
            connect_timeout: 1.5,
            tracker_timeout: 0.25,
            ..Default::default()
        };
        let settings = config.connection_settings().unwrap();
        assert_eq!(settings.connect_timeout, Duration::from_millis(1500));
        assert_eq!(settings.io_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "trackers = ['tracker1:7001', 'tracker2']\ndomain = 'photos'\ntracker_timeout = 0.5"
        )
        .unwrap();

        let config = ClientConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.domain, "photos");
        assert_eq!(config.default_class, "default");
        assert_eq!(config.tracker_timeout, 0.5);

        let endpoints = config.endpoints().unwrap();
        assert_eq!(
            endpoints,
            vec![
                TrackerEndpoint::new("tracker1", 7001),
                TrackerEndpoint::new("tracker2", DEFAULT_TRACKER_PORT),
            ]
        );
    }

    fn fake_env(vars: &[(&str, &str)]) -> ::config::Environment {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        environment().source(Some(vars))
    }

    #[test]
    fn test_load_from_env() {
        let env = fake_env(&[
            ("MOGILEFS_TRACKERS", "a:1,b:2"),
            ("MOGILEFS_DOMAIN", "photos"),
            ("MOGILEFS_TRACKER_TIMEOUT", "0.25"),
        ]);

        let config = ClientConfig::load_layers(None, env).unwrap();
        assert_eq!(config.trackers, vec!["a:1", "b:2"]);
        assert_eq!(config.domain, "photos");
        assert_eq!(config.tracker_timeout, 0.25);
        assert_eq!(config.connect_timeout, 3.0);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "trackers = ['tracker1:7001']\ndomain = 'photos'\ndefault_class = 'thumbs'"
        )
        .unwrap();
        let env = fake_env(&[
            ("MOGILEFS_TRACKERS", "tracker9:7009,tracker8"),
            ("MOGILEFS_DOMAIN", "videos"),
        ]);

        let config = ClientConfig::load_layers(Some(file.path().to_path_buf()), env).unwrap();
        assert_eq!(config.trackers, vec!["tracker9:7009", "tracker8"]);
        assert_eq!(config.domain, "videos");
        assert_eq!(config.default_class, "thumbs");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = ClientConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
