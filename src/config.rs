//! Pipeline configuration. Every section has working defaults so an empty
//! file (or no file at all) yields a runnable processor; `validate` is
//! called once at startup and any error there is fatal.

use crate::filtering::parse_cidrs;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    /// Apply ASCII lowercasing to the decoded qname.
    pub qname_lowercase: bool,
    pub quiet_text: QuietTextConfig,
    pub filtering: FilteringConfig,
    pub geoip: GeoIpConfig,
    pub user_privacy: UserPrivacyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Toggle query/response latency correlation.
    pub enable: bool,
    /// Correlation window in seconds; also the sweep interval.
    pub query_timeout: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enable: true,
            query_timeout: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuietTextConfig {
    /// Replace tap operation names with their two-letter codes.
    pub dnstap: bool,
    /// Replace the direction with Q/R.
    pub dns: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilteringConfig {
    pub drop_qnames: Vec<String>,
    pub keep_qnames: Vec<String>,
    pub drop_cidrs: Vec<String>,
    pub keep_cidrs: Vec<String>,
    pub drop_rcodes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoIpConfig {
    /// Path to a GeoLite2/GeoIP2 city database; empty disables it.
    pub db_city: String,
    /// Path to an ASN database; empty disables it.
    pub db_asn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPrivacyConfig {
    pub anonymize_ip: bool,
    pub minimize_qname: bool,
    /// Labels kept (from the right) when qname minimization is on.
    pub minimize_qname_depth: usize,
}

impl Default for UserPrivacyConfig {
    fn default() -> Self {
        Self {
            anonymize_ip: false,
            minimize_qname: false,
            minimize_qname_depth: 2,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, String> {
        let data =
            fs::read_to_string(path).map_err(|e| format!("cannot read {:?}: {}", path, e))?;
        serde_json::from_str(&data).map_err(|e| format!("cannot parse {:?}: {}", path, e))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cache.query_timeout == 0 {
            return Err("cache.query_timeout must be at least 1 second".to_string());
        }
        if self.user_privacy.minimize_qname_depth == 0 {
            return Err("user_privacy.minimize_qname_depth must be at least 1".to_string());
        }
        parse_cidrs(&self.filtering.drop_cidrs)?;
        parse_cidrs(&self.filtering.keep_cidrs)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.cache.enable);
        assert_eq!(config.cache.query_timeout, 10);
        assert_eq!(config.user_privacy.minimize_qname_depth, 2);
    }

    #[test]
    fn empty_json_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert!(config.cache.enable);
        assert!(!config.quiet_text.dnstap);
    }

    #[test]
    fn partial_json_overrides() {
        let config: Config = serde_json::from_str(
            r#"{"cache":{"query_timeout":3},"quiet_text":{"dnstap":true}}"#,
        )
        .unwrap();
        assert_eq!(config.cache.query_timeout, 3);
        assert!(config.cache.enable);
        assert!(config.quiet_text.dnstap);
        assert!(!config.quiet_text.dns);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = Config::default();
        config.cache.query_timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_cidr_is_rejected() {
        let mut config = Config::default();
        config.filtering.keep_cidrs = vec!["nope".to_string()];
        assert!(config.validate().is_err());
    }
}
