//! The pipeline worker: one bounded ingress channel of framed envelopes in,
//! normalized records fanned out to every sink channel.
//!
//! ```text
//!                                                  |---> sink channel 1
//! envelope bytes --> ingress(512) --- (worker) ----|---> sink channel 2
//!                                                  |---> sink channel n
//! ```
//!
//! Sends to sinks block when a sink is full, so backpressure reaches the
//! ingress queue; nothing is dropped to keep up.

use crate::cache::CacheDns;
use crate::config::Config;
use crate::dnstap;
use crate::filtering::FilteringProcessor;
use crate::geoip::GeoIpProcessor;
use crate::message::DnsMessage;
use crate::parser;
use crate::privacy::{IpAnonymizer, QnameReducer};
use chrono::{DateTime, SecondsFormat};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::info;
use prost::Message as _;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const INGRESS_CAPACITY: usize = 512;

/// Handle to one running pipeline worker. Collectors feed it through cloned
/// `ingress()` senders; the worker exits once every sender is gone.
pub struct DnstapProcessor {
    ingress_tx: Sender<Vec<u8>>,
    done_rx: Receiver<()>,
}

impl DnstapProcessor {
    /// Builds the enrichment stack and spawns the worker thread. The sink
    /// set is fixed for the lifetime of the worker. Fails on configuration
    /// the enrichers cannot apply, before any envelope is read.
    pub fn spawn(
        config: Arc<Config>,
        send_to: Vec<Sender<DnsMessage>>,
    ) -> Result<Self, String> {
        info!("dnstap processor - initialization...");
        let worker = Worker::new(config)?;

        let (ingress_tx, ingress_rx) = bounded(INGRESS_CAPACITY);
        let (done_tx, done_rx) = bounded(1);

        thread::spawn(move || {
            worker.run(&ingress_rx, &send_to);
            let _ = done_tx.send(());
        });

        Ok(Self {
            ingress_tx,
            done_rx,
        })
    }

    /// A sender feeding this worker's ingress queue.
    pub fn ingress(&self) -> Sender<Vec<u8>> {
        self.ingress_tx.clone()
    }

    /// Closes this handle's ingress sender and blocks until the worker has
    /// drained. Collectors still holding cloned senders keep the queue open
    /// until they drop them.
    pub fn stop(self) {
        let DnstapProcessor {
            ingress_tx,
            done_rx,
        } = self;
        drop(ingress_tx);
        let _ = done_rx.recv();
    }
}

struct Worker {
    config: Arc<Config>,
    cache: CacheDns,
    geoip: GeoIpProcessor,
    filtering: FilteringProcessor,
    anonymizer: IpAnonymizer,
    reducer: QnameReducer,
}

impl Worker {
    fn new(config: Arc<Config>) -> Result<Self, String> {
        let cache = CacheDns::new(Duration::from_secs(config.cache.query_timeout));
        let geoip = GeoIpProcessor::open(&config);
        if geoip.is_enabled() {
            info!("dnstap processor - geoip is enabled");
        }
        let filtering = FilteringProcessor::new(&config)?;
        let anonymizer = IpAnonymizer::new(&config);
        let reducer = QnameReducer::new(&config);

        Ok(Self {
            config,
            cache,
            geoip,
            filtering,
            anonymizer,
            reducer,
        })
    }

    fn run(&self, ingress: &Receiver<Vec<u8>>, send_to: &[Sender<DnsMessage>]) {
        info!("dnstap processor - running... waiting for incoming messages");
        for frame in ingress.iter() {
            let dm = match self.transform(&frame) {
                Some(dm) => dm,
                None => continue,
            };
            for tx in send_to {
                // blocking send: a full sink stalls the whole worker
                let _ = tx.send(dm.clone());
            }
        }
        self.cache.expire();
        self.cache.stop();
        info!("dnstap processor - ingress closed, terminated");
    }

    /// Turns one framed envelope into a normalized record. `None` means the
    /// record produces no output: either the envelope did not decode or a
    /// filter dropped it.
    fn transform(&self, frame: &[u8]) -> Option<DnsMessage> {
        let dt = match dnstap::Dnstap::decode(frame) {
            Ok(dt) => dt,
            // unreadable envelope: drop silently
            Err(_) => return None,
        };
        let msg = dt.message.unwrap_or_default();

        let mut dm = DnsMessage::default();

        if let Some(identity) = &dt.identity {
            if !identity.is_empty() {
                dm.identity = String::from_utf8_lossy(identity).to_string();
            }
        }

        let op_code = msg
            .r#type
            .unwrap_or(dnstap::MessageType::AuthQuery as i32);
        dm.dns.operation = dnstap::operation_label(op_code).to_string();
        dm.network.family = dnstap::family_label(msg.socket_family.unwrap_or(0)).to_string();
        dm.network.protocol =
            dnstap::protocol_label(msg.socket_protocol.unwrap_or(0)).to_string();

        if let Some(ip) = &msg.query_address {
            if !ip.is_empty() {
                dm.network.query_ip = format_address(ip);
            }
        }
        let query_port = msg.query_port.unwrap_or(0);
        if query_port > 0 {
            dm.network.query_port = query_port.to_string();
        }
        if let Some(ip) = &msg.response_address {
            if !ip.is_empty() {
                dm.network.response_ip = format_address(ip);
            }
        }
        let response_port = msg.response_port.unwrap_or(0);
        if response_port > 0 {
            dm.network.response_port = response_port.to_string();
        }

        // odd operation codes are the query side, even codes the response
        // side; payload and timestamp follow the direction
        if op_code % 2 == 1 {
            dm.dns.kind = "query".to_string();
            dm.dns.payload = msg.query_message.unwrap_or_default();
            dm.time.sec = msg.query_time_sec.unwrap_or(0) as i64;
            dm.time.nsec = msg.query_time_nsec.unwrap_or(0);
        } else {
            dm.dns.kind = "reply".to_string();
            dm.dns.payload = msg.response_message.unwrap_or_default();
            dm.time.sec = msg.response_time_sec.unwrap_or(0) as i64;
            dm.time.nsec = msg.response_time_nsec.unwrap_or(0);
        }
        dm.dns.length = dm.dns.payload.len();

        dm.time.timestamp = dm.time.sec as f64 + dm.time.nsec as f64 / 1e9;
        dm.time.rfc3339 = DateTime::from_timestamp(dm.time.sec, dm.time.nsec)
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
            .unwrap_or_default();

        let mut header_ok = true;
        let header = match parser::decode_header(&dm.dns.payload) {
            Ok(header) => header,
            Err(e) => {
                dm.dns.malformed_packet = 1;
                header_ok = false;
                info!("dns parser malformed packet: {}", e);
                parser::DnsHeader::default()
            }
        };

        dm.dns.id = header.id;
        dm.dns.rcode = parser::rcode_to_string(header.rcode);
        dm.dns.flags.qr = header.qr == 1;
        dm.dns.flags.tc = header.tc == 1;
        dm.dns.flags.aa = header.aa == 1;
        dm.dns.flags.ra = header.ra == 1;
        dm.dns.flags.ad = header.ad == 1;

        if header_ok {
            self.decode_sections(&header, &mut dm);
            self.correlate(query_port, &mut dm);
        }
        dm.dns.latency_str = format!("{:.6}", dm.dns.latency);

        if header_ok {
            // enrichment order is part of the contract: minimization before
            // filtering, geo before anonymization
            if self.reducer.is_enabled() {
                dm.dns.qname = self.reducer.minimize(&dm.dns.qname);
            }

            if self.filtering.check_if_drop(&dm) {
                return None;
            }

            if self.geoip.is_enabled() {
                let geo = self.geoip.lookup(&dm.network.query_ip);
                dm.geo.continent = geo.continent;
                dm.geo.country_iso = geo.country_iso;
                dm.geo.city = geo.city;
                dm.network.asn = geo.asn;
                dm.network.aso = geo.aso;
            }

            if self.anonymizer.is_enabled() {
                dm.network.query_ip = self.anonymizer.anonymize(&dm.network.query_ip);
            }

            if self.config.quiet_text.dnstap {
                if let Some(code) = dnstap::quiet_operation(&dm.dns.operation) {
                    dm.dns.operation = code.to_string();
                }
            }
            if self.config.quiet_text.dns {
                if let Some(code) = dnstap::quiet_kind(&dm.dns.kind) {
                    dm.dns.kind = code.to_string();
                }
            }
        }

        Some(dm)
    }

    // Question, answer, authority and additional sections plus EDNS, in
    // order. The malformed flag is sticky: the first failure flags the
    // record and later payload-dependent stages are skipped.
    fn decode_sections(&self, header: &parser::DnsHeader, dm: &mut DnsMessage) {
        let mut offset = 0usize;

        if header.qdcount > 0 && dm.dns.malformed_packet == 0 {
            match parser::decode_question(&dm.dns.payload) {
                Ok((qname, qtype, next)) => {
                    dm.dns.qname = if self.config.qname_lowercase {
                        qname.to_lowercase()
                    } else {
                        qname
                    };
                    dm.dns.qtype = parser::rdatatype_to_string(qtype);
                    offset = next;
                }
                Err(e) => {
                    dm.dns.malformed_packet = 1;
                    info!("dns parser malformed question: {}", e);
                }
            }
        }

        if header.ancount > 0 && dm.dns.malformed_packet == 0 {
            match parser::decode_answer(header.ancount, offset, &dm.dns.payload) {
                Ok((answers, next)) => {
                    dm.dns.rrs.answers = answers;
                    offset = next;
                }
                Err(e) => {
                    dm.dns.malformed_packet = 1;
                    info!("dns parser malformed answers: {}", e);
                }
            }
        }

        if header.nscount > 0 && dm.dns.malformed_packet == 0 {
            match parser::decode_answer(header.nscount, offset, &dm.dns.payload) {
                Ok((nameservers, next)) => {
                    dm.dns.rrs.nameservers = nameservers;
                    offset = next;
                }
                Err(e) => {
                    dm.dns.malformed_packet = 1;
                    info!("dns parser malformed nameservers: {}", e);
                }
            }
        }

        // the additional section is walked twice on purpose: once for the
        // record list, once for the OPT extraction
        if header.arcount > 0 && dm.dns.malformed_packet == 0 {
            match parser::decode_answer(header.arcount, offset, &dm.dns.payload) {
                Ok((records, _)) => dm.dns.rrs.records = records,
                Err(e) => {
                    dm.dns.malformed_packet = 1;
                    info!("dns parser malformed additional records: {}", e);
                }
            }
        }
        if header.arcount > 0 && dm.dns.malformed_packet == 0 {
            match parser::decode_edns(header.arcount, offset, &dm.dns.payload) {
                Ok((extended, _)) => dm.dns.extended = extended,
                Err(e) => {
                    dm.dns.malformed_packet = 1;
                    info!("dns parser malformed edns: {}", e);
                }
            }
        }
    }

    // Queries deposit their timestamp under the transaction fingerprint;
    // responses read it back and keep it, so retransmits still match.
    fn correlate(&self, query_port: u32, dm: &mut DnsMessage) {
        if !self.config.cache.enable
            || dm.network.query_ip.is_empty()
            || query_port == 0
            || dm.dns.malformed_packet != 0
        {
            return;
        }

        let key = fingerprint(&dm.network.query_ip, &dm.network.query_port, dm.dns.id);
        if dm.dns.kind == "query" {
            self.cache.set(key, dm.time.timestamp);
        } else if let Some(query_ts) = self.cache.get(key) {
            let latency = dm.time.timestamp - query_ts;
            // a negative delta means the key collided; suppress it
            dm.dns.latency = if latency < 0.0 { 0.0 } else { latency };
        }
    }
}

fn format_address(raw: &[u8]) -> String {
    match raw.len() {
        4 => Ipv4Addr::new(raw[0], raw[1], raw[2], raw[3]).to_string(),
        16 => {
            let mut buf = [0u8; 16];
            buf.copy_from_slice(raw);
            Ipv6Addr::from(buf).to_string()
        }
        _ => hex::encode(raw),
    }
}

/// Transaction fingerprint: FNV-1a over the client endpoint and DNS id,
/// rendered the same way on the query and the response side.
fn fingerprint(query_ip: &str, query_port: &str, dns_id: u16) -> u64 {
    let mut data = Vec::with_capacity(query_ip.len() + query_port.len() + 7);
    data.extend_from_slice(query_ip.as_bytes());
    data.push(b'+');
    data.extend_from_slice(query_port.as_bytes());
    data.push(b'+');
    data.extend_from_slice(dns_id.to_string().as_bytes());
    fnv1a_hash64(&data)
}

fn fnv1a_hash64(data: &[u8]) -> u64 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET_BASIS;
    for byte in data {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_reference_vectors() {
        assert_eq!(fnv1a_hash64(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a_hash64(b"a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(fnv1a_hash64(b"foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn fingerprint_matches_across_directions() {
        let query = fingerprint("10.0.0.1", "54321", 0x1234);
        let response = fingerprint("10.0.0.1", "54321", 0x1234);
        assert_eq!(query, response);
        assert_ne!(query, fingerprint("10.0.0.1", "54321", 0x1235));
        assert_ne!(query, fingerprint("10.0.0.2", "54321", 0x1234));
    }

    #[test]
    fn address_rendering() {
        assert_eq!(format_address(&[10, 0, 0, 1]), "10.0.0.1");
        let mut v6 = [0u8; 16];
        v6[15] = 1;
        assert_eq!(format_address(&v6), "::1");
        assert_eq!(format_address(&[1, 2, 3]), "010203");
    }
}
