//! Wire schema of the framed tap envelope, written against the standard
//! dnstap protobuf. Field tags and enum values must stay in sync with the
//! published `dnstap.proto`; collectors on the other side of the ingress
//! channel encode with it.

use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Dnstap {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub identity: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub version: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub extra: Option<Vec<u8>>,
    #[prost(message, optional, tag = "14")]
    pub message: Option<Message>,
    #[prost(enumeration = "DnstapType", optional, tag = "15")]
    pub r#type: Option<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Message {
    #[prost(enumeration = "MessageType", optional, tag = "1")]
    pub r#type: Option<i32>,
    #[prost(enumeration = "SocketFamily", optional, tag = "2")]
    pub socket_family: Option<i32>,
    #[prost(enumeration = "SocketProtocol", optional, tag = "3")]
    pub socket_protocol: Option<i32>,
    #[prost(bytes = "vec", optional, tag = "4")]
    pub query_address: Option<Vec<u8>>,
    #[prost(uint32, optional, tag = "5")]
    pub query_port: Option<u32>,
    #[prost(uint64, optional, tag = "6")]
    pub query_time_sec: Option<u64>,
    #[prost(fixed32, optional, tag = "7")]
    pub query_time_nsec: Option<u32>,
    #[prost(bytes = "vec", optional, tag = "8")]
    pub query_message: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "9")]
    pub query_zone: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "10")]
    pub response_address: Option<Vec<u8>>,
    #[prost(uint32, optional, tag = "11")]
    pub response_port: Option<u32>,
    #[prost(uint64, optional, tag = "12")]
    pub response_time_sec: Option<u64>,
    #[prost(fixed32, optional, tag = "13")]
    pub response_time_nsec: Option<u32>,
    #[prost(bytes = "vec", optional, tag = "14")]
    pub response_message: Option<Vec<u8>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum DnstapType {
    Message = 1,
}

/// Tap operation. Odd codes are the query side of a transaction, even codes
/// the response side; direction is always derived from this parity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum MessageType {
    AuthQuery = 1,
    AuthResponse = 2,
    ResolverQuery = 3,
    ResolverResponse = 4,
    ClientQuery = 5,
    ClientResponse = 6,
    ForwarderQuery = 7,
    ForwarderResponse = 8,
    StubQuery = 9,
    StubResponse = 10,
    ToolQuery = 11,
    ToolResponse = 12,
    UpdateQuery = 13,
    UpdateResponse = 14,
}

impl MessageType {
    pub fn label(self) -> &'static str {
        match self {
            MessageType::AuthQuery => "AUTH_QUERY",
            MessageType::AuthResponse => "AUTH_RESPONSE",
            MessageType::ResolverQuery => "RESOLVER_QUERY",
            MessageType::ResolverResponse => "RESOLVER_RESPONSE",
            MessageType::ClientQuery => "CLIENT_QUERY",
            MessageType::ClientResponse => "CLIENT_RESPONSE",
            MessageType::ForwarderQuery => "FORWARDER_QUERY",
            MessageType::ForwarderResponse => "FORWARDER_RESPONSE",
            MessageType::StubQuery => "STUB_QUERY",
            MessageType::StubResponse => "STUB_RESPONSE",
            MessageType::ToolQuery => "TOOL_QUERY",
            MessageType::ToolResponse => "TOOL_RESPONSE",
            MessageType::UpdateQuery => "UPDATE_QUERY",
            MessageType::UpdateResponse => "UPDATE_RESPONSE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum SocketFamily {
    Inet = 1,
    Inet6 = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ::prost::Enumeration)]
#[repr(i32)]
pub enum SocketProtocol {
    Udp = 1,
    Tcp = 2,
    Dot = 3,
    Doh = 4,
    DnscryptUdp = 5,
    DnscryptTcp = 6,
    Doq = 7,
}

pub fn operation_label(code: i32) -> &'static str {
    MessageType::try_from(code)
        .map(MessageType::label)
        .unwrap_or("UNKNOWN")
}

pub fn family_label(code: i32) -> &'static str {
    match SocketFamily::try_from(code) {
        Ok(SocketFamily::Inet6) => "INET6",
        _ => "INET",
    }
}

pub fn protocol_label(code: i32) -> &'static str {
    match SocketProtocol::try_from(code) {
        Ok(SocketProtocol::Tcp) => "TCP",
        Ok(SocketProtocol::Dot) => "DOT",
        Ok(SocketProtocol::Doh) => "DOH",
        Ok(SocketProtocol::DnscryptUdp) => "DNSCRYPT_UDP",
        Ok(SocketProtocol::DnscryptTcp) => "DNSCRYPT_TCP",
        Ok(SocketProtocol::Doq) => "DOQ",
        _ => "UDP",
    }
}

/// Two-letter code for a tap operation, used when quiet text is on.
pub fn quiet_operation(operation: &str) -> Option<&'static str> {
    match operation {
        "AUTH_QUERY" => Some("AQ"),
        "AUTH_RESPONSE" => Some("AR"),
        "RESOLVER_QUERY" => Some("RQ"),
        "RESOLVER_RESPONSE" => Some("RR"),
        "CLIENT_QUERY" => Some("CQ"),
        "CLIENT_RESPONSE" => Some("CR"),
        "FORWARDER_QUERY" => Some("FQ"),
        "FORWARDER_RESPONSE" => Some("FR"),
        "STUB_QUERY" => Some("SQ"),
        "STUB_RESPONSE" => Some("SR"),
        "TOOL_QUERY" => Some("TQ"),
        "TOOL_RESPONSE" => Some("TR"),
        "UPDATE_QUERY" => Some("UQ"),
        "UPDATE_RESPONSE" => Some("UR"),
        _ => None,
    }
}

pub fn quiet_kind(kind: &str) -> Option<&'static str> {
    match kind {
        "query" => Some("Q"),
        "reply" => Some("R"),
        _ => None,
    }
}

/// Builds a CLIENT_QUERY envelope around the given DNS payload, stamped with
/// the current wall clock. Used by the selftest path and by tests.
pub fn build_test_envelope(dns_query: Vec<u8>) -> Dnstap {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    let msg = Message {
        r#type: Some(MessageType::ClientQuery as i32),
        socket_family: Some(SocketFamily::Inet as i32),
        socket_protocol: Some(SocketProtocol::Udp as i32),
        query_address: Some(vec![127, 0, 0, 1]),
        query_port: Some(5300),
        query_time_sec: Some(now.as_secs()),
        query_time_nsec: Some(now.subsec_nanos()),
        query_message: Some(dns_query),
        query_zone: None,
        response_address: Some(vec![127, 0, 0, 2]),
        response_port: Some(53),
        response_time_sec: None,
        response_time_nsec: None,
        response_message: None,
    };

    Dnstap {
        identity: Some(b"tapflow-generator".to_vec()),
        version: Some(b"-".to_vec()),
        extra: None,
        message: Some(msg),
        r#type: Some(DnstapType::Message as i32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message as _;

    #[test]
    fn envelope_round_trip() {
        let dt = build_test_envelope(vec![0xab, 0xcd]);
        let encoded = dt.encode_to_vec();
        let decoded = Dnstap::decode(encoded.as_slice()).unwrap();

        assert_eq!(decoded.identity.as_deref(), Some(&b"tapflow-generator"[..]));
        let msg = decoded.message.unwrap();
        assert_eq!(msg.r#type, Some(MessageType::ClientQuery as i32));
        assert_eq!(msg.query_port, Some(5300));
        assert_eq!(msg.query_message.as_deref(), Some(&[0xab, 0xcd][..]));
        assert_eq!(msg.response_message, None);
    }

    #[test]
    fn query_codes_are_odd() {
        for op in [
            MessageType::AuthQuery,
            MessageType::ResolverQuery,
            MessageType::ClientQuery,
            MessageType::ForwarderQuery,
            MessageType::StubQuery,
            MessageType::ToolQuery,
            MessageType::UpdateQuery,
        ] {
            assert_eq!((op as i32) % 2, 1, "{}", op.label());
            assert!(op.label().ends_with("_QUERY"));
        }
        for op in [
            MessageType::AuthResponse,
            MessageType::ClientResponse,
            MessageType::UpdateResponse,
        ] {
            assert_eq!((op as i32) % 2, 0, "{}", op.label());
        }
    }

    #[test]
    fn quiet_text_tables() {
        assert_eq!(quiet_operation("CLIENT_QUERY"), Some("CQ"));
        assert_eq!(quiet_operation("FORWARDER_RESPONSE"), Some("FR"));
        assert_eq!(quiet_operation("UNKNOWN"), None);
        assert_eq!(quiet_kind("query"), Some("Q"));
        assert_eq!(quiet_kind("reply"), Some("R"));
        assert_eq!(quiet_kind("Q"), None);
    }

    #[test]
    fn unknown_labels_fall_back() {
        assert_eq!(operation_label(99), "UNKNOWN");
        assert_eq!(family_label(0), "INET");
        assert_eq!(protocol_label(0), "UDP");
        assert_eq!(protocol_label(SocketProtocol::Doq as i32), "DOQ");
    }
}
