//! Geolocation enrichment backed by MaxMind databases. Everything here is
//! optional: a missing database path disables the lookup, a miss yields
//! empty fields, and a reader error is logged without touching the record.

use crate::config::Config;
use log::error;
use maxminddb::{geoip2, MaxMindDBError, Reader};
use std::net::IpAddr;

#[derive(Debug, Clone, Default)]
pub struct GeoRecord {
    pub continent: String,
    pub country_iso: String,
    pub city: String,
    pub asn: String,
    pub aso: String,
}

pub struct GeoIpProcessor {
    city: Option<Reader<Vec<u8>>>,
    asn: Option<Reader<Vec<u8>>>,
}

impl GeoIpProcessor {
    /// Opens the configured databases. Open failures are logged and leave
    /// the corresponding lookup disabled; enrichment is never fatal.
    pub fn open(config: &Config) -> Self {
        let city = open_reader(&config.geoip.db_city, "city");
        let asn = open_reader(&config.geoip.db_asn, "asn");
        Self { city, asn }
    }

    pub fn disabled() -> Self {
        Self {
            city: None,
            asn: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.city.is_some() || self.asn.is_some()
    }

    /// Looks up `ip` in whichever databases are open. Misses and
    /// unparseable input return empty fields.
    pub fn lookup(&self, ip: &str) -> GeoRecord {
        let mut record = GeoRecord::default();
        let addr: IpAddr = match ip.parse() {
            Ok(addr) => addr,
            Err(_) => return record,
        };

        if let Some(reader) = &self.city {
            match reader.lookup::<geoip2::City>(addr) {
                Ok(city) => {
                    record.continent = city
                        .continent
                        .as_ref()
                        .and_then(|c| c.code)
                        .unwrap_or_default()
                        .to_string();
                    record.country_iso = city
                        .country
                        .as_ref()
                        .and_then(|c| c.iso_code)
                        .unwrap_or_default()
                        .to_string();
                    record.city = city
                        .city
                        .as_ref()
                        .and_then(|c| c.names.as_ref())
                        .and_then(|names| names.get("en"))
                        .copied()
                        .unwrap_or_default()
                        .to_string();
                }
                Err(MaxMindDBError::AddressNotFoundError(_)) => {}
                Err(e) => error!("geoip city lookup failed: {}", e),
            }
        }

        if let Some(reader) = &self.asn {
            match reader.lookup::<geoip2::Asn>(addr) {
                Ok(asn) => {
                    record.asn = asn
                        .autonomous_system_number
                        .map(|n| n.to_string())
                        .unwrap_or_default();
                    record.aso = asn
                        .autonomous_system_organization
                        .unwrap_or_default()
                        .to_string();
                }
                Err(MaxMindDBError::AddressNotFoundError(_)) => {}
                Err(e) => error!("geoip asn lookup failed: {}", e),
            }
        }

        record
    }
}

fn open_reader(path: &str, kind: &str) -> Option<Reader<Vec<u8>>> {
    if path.is_empty() {
        return None;
    }
    match Reader::open_readfile(path) {
        Ok(reader) => Some(reader),
        Err(e) => {
            error!("geoip {} database open failed ({}): {}", kind, path, e);
            None
        }
    }
}
