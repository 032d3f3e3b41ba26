//! User-privacy transforms: client address masking and qname reduction.
//! Both operate on the textual form and are idempotent, so records that
//! loop through several pipelines are not degraded twice.

use crate::config::Config;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub struct IpAnonymizer {
    enabled: bool,
}

impl IpAnonymizer {
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.user_privacy.anonymize_ip,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Masks an IPv4 address to /24, an IPv6 address to /64. Anything that
    /// does not parse as an address passes through untouched.
    pub fn anonymize(&self, ip: &str) -> String {
        match ip.parse::<IpAddr>() {
            Ok(IpAddr::V4(v4)) => {
                let o = v4.octets();
                Ipv4Addr::new(o[0], o[1], o[2], 0).to_string()
            }
            Ok(IpAddr::V6(v6)) => {
                let s = v6.segments();
                Ipv6Addr::new(s[0], s[1], s[2], s[3], 0, 0, 0, 0).to_string()
            }
            Err(_) => ip.to_string(),
        }
    }
}

pub struct QnameReducer {
    enabled: bool,
    depth: usize,
}

impl QnameReducer {
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.user_privacy.minimize_qname,
            depth: config.user_privacy.minimize_qname_depth,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Keeps the rightmost `depth` labels and collapses everything removed
    /// into a single `-` label.
    pub fn minimize(&self, qname: &str) -> String {
        let labels: Vec<&str> = qname.split('.').collect();
        if labels.len() <= self.depth {
            return qname.to_string();
        }
        let kept = &labels[labels.len() - self.depth..];
        format!("-.{}", kept.join("."))
    }
}
