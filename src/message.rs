use serde::Serialize;

/// Socket-level metadata of the captured transaction. Ports are kept as
/// decimal strings; empty fields are left out of the JSON rendering.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkInfo {
    pub family: String,
    pub protocol: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub query_ip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub query_port: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub response_ip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub response_port: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub asn: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub aso: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DnsFlags {
    pub qr: bool,
    pub tc: bool,
    pub aa: bool,
    pub ra: bool,
    pub ad: bool,
}

/// One decoded resource record with its rdata already rendered to text.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DnsAnswer {
    pub name: String,
    pub rdatatype: String,
    pub class: u16,
    pub ttl: u32,
    pub rdata: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DnsRRs {
    pub answers: Vec<DnsAnswer>,
    pub nameservers: Vec<DnsAnswer>,
    pub records: Vec<DnsAnswer>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DnsOption {
    pub code: u16,
    pub name: String,
    pub data: String,
}

/// EDNS(0) data from the OPT pseudo-record, when one is present.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DnsExtended {
    pub udp_size: u16,
    pub extended_rcode: u8,
    pub version: u8,
    #[serde(rename = "do")]
    pub do_flag: u8,
    pub options: Vec<DnsOption>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DnsPayload {
    pub operation: String,
    /// "query" or "reply", selected by the parity of the tap operation code.
    #[serde(rename = "type")]
    pub kind: String,
    pub id: u16,
    pub rcode: String,
    pub qname: String,
    pub qtype: String,
    #[serde(skip)]
    pub payload: Vec<u8>,
    pub length: usize,
    pub flags: DnsFlags,
    pub rrs: DnsRRs,
    pub extended: DnsExtended,
    /// Sticky: set on the first wire-parse failure, never cleared.
    pub malformed_packet: u8,
    pub latency: f64,
    pub latency_str: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GeoInfo {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub continent: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country_iso: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,
}

impl GeoInfo {
    pub fn is_empty(&self) -> bool {
        self.continent.is_empty() && self.country_iso.is_empty() && self.city.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeInfo {
    pub sec: i64,
    pub nsec: u32,
    pub timestamp: f64,
    pub rfc3339: String,
}

/// The normalized record handed to every sink. Built once per envelope by
/// the processor; sinks receive their own copy and never mutate it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DnsMessage {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub identity: String,
    pub network: NetworkInfo,
    pub dns: DnsPayload,
    #[serde(skip_serializing_if = "GeoInfo::is_empty")]
    pub geo: GeoInfo,
    pub time: TimeInfo,
}
