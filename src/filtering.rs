//! Drop/allow predicate applied before records reach the sinks. A record is
//! dropped when any drop list matches its qname, client address or rcode,
//! unless an allow list also matches (allow wins).

use crate::config::Config;
use crate::message::DnsMessage;
use ipnet::IpNet;
use std::net::IpAddr;

#[derive(Default)]
pub struct FilteringProcessor {
    drop_qnames: Vec<String>,
    keep_qnames: Vec<String>,
    drop_cidrs: Vec<IpNet>,
    keep_cidrs: Vec<IpNet>,
    drop_rcodes: Vec<String>,
}

impl FilteringProcessor {
    /// Builds the predicate from the configured lists. An unparseable CIDR
    /// is a configuration error and surfaces here, before the pipeline runs.
    pub fn new(config: &Config) -> Result<Self, String> {
        Ok(Self {
            drop_qnames: config.filtering.drop_qnames.clone(),
            keep_qnames: config.filtering.keep_qnames.clone(),
            drop_cidrs: parse_cidrs(&config.filtering.drop_cidrs)?,
            keep_cidrs: parse_cidrs(&config.filtering.keep_cidrs)?,
            drop_rcodes: config.filtering.drop_rcodes.clone(),
        })
    }

    pub fn check_if_drop(&self, dm: &DnsMessage) -> bool {
        let dropped = qname_matches(&self.drop_qnames, &dm.dns.qname)
            || ip_matches(&self.drop_cidrs, &dm.network.query_ip)
            || self.drop_rcodes.iter().any(|r| *r == dm.dns.rcode);
        if !dropped {
            return false;
        }

        let allowed = qname_matches(&self.keep_qnames, &dm.dns.qname)
            || ip_matches(&self.keep_cidrs, &dm.network.query_ip);
        !allowed
    }
}

pub fn parse_cidrs(cidrs: &[String]) -> Result<Vec<IpNet>, String> {
    cidrs
        .iter()
        .map(|c| {
            c.parse::<IpNet>()
                .map_err(|e| format!("invalid network {:?}: {}", c, e))
        })
        .collect()
}

// A pattern is an exact name, or "*.suffix" matching the suffix itself and
// anything below it. Comparison ignores ASCII case.
fn qname_matches(patterns: &[String], qname: &str) -> bool {
    patterns.iter().any(|pattern| {
        if let Some(suffix) = pattern.strip_prefix("*.") {
            qname.eq_ignore_ascii_case(suffix)
                || (qname.len() > suffix.len() + 1
                    && qname
                        .get(qname.len() - suffix.len()..)
                        .map(|tail| tail.eq_ignore_ascii_case(suffix))
                        .unwrap_or(false)
                    && qname.as_bytes()[qname.len() - suffix.len() - 1] == b'.')
        } else {
            qname.eq_ignore_ascii_case(pattern)
        }
    })
}

fn ip_matches(cidrs: &[IpNet], ip: &str) -> bool {
    match ip.parse::<IpAddr>() {
        Ok(addr) => cidrs.iter().any(|net| net.contains(&addr)),
        Err(_) => false,
    }
}
