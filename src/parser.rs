//! DNS wire-format decoding. Every function here is tolerant by contract:
//! a failure is reported to the caller, which flags the record and keeps it
//! flowing instead of dropping it.

use crate::message::{DnsAnswer, DnsExtended, DnsOption};
use std::net::{Ipv4Addr, Ipv6Addr};
use thiserror::Error;

pub const DNS_HEADER_LEN: usize = 12;

const TYPE_OPT: u16 = 41;

// RFC 1035 section 2.3.4 limits, plus a pointer-chase bound for packets
// crafted to loop the decompressor.
const MAX_NAME_LEN: usize = 255;
const MAX_LABEL_LEN: usize = 63;
const MAX_POINTER_HOPS: usize = 128;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsParseError {
    #[error("short packet")]
    ShortPacket,
    #[error("invalid label")]
    BadLabel,
    #[error("compression loop")]
    CompressionLoop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DnsHeader {
    pub id: u16,
    pub qr: u8,
    pub opcode: u8,
    pub aa: u8,
    pub tc: u8,
    pub rd: u8,
    pub ra: u8,
    pub ad: u8,
    pub cd: u8,
    pub rcode: u8,
    pub qdcount: u16,
    pub ancount: u16,
    pub nscount: u16,
    pub arcount: u16,
}

// Callers bounds-check before reading.
fn read_u16(payload: &[u8], pos: usize) -> u16 {
    u16::from_be_bytes([payload[pos], payload[pos + 1]])
}

fn read_u32(payload: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([
        payload[pos],
        payload[pos + 1],
        payload[pos + 2],
        payload[pos + 3],
    ])
}

/// Decodes the fixed 12-byte header. Counts are taken as-is; they are only
/// trusted as far as the section decoders can follow them.
pub fn decode_header(payload: &[u8]) -> Result<DnsHeader, DnsParseError> {
    if payload.len() < DNS_HEADER_LEN {
        return Err(DnsParseError::ShortPacket);
    }

    let flags = read_u16(payload, 2);
    Ok(DnsHeader {
        id: read_u16(payload, 0),
        qr: ((flags >> 15) & 1) as u8,
        opcode: ((flags >> 11) & 0xF) as u8,
        aa: ((flags >> 10) & 1) as u8,
        tc: ((flags >> 9) & 1) as u8,
        rd: ((flags >> 8) & 1) as u8,
        ra: ((flags >> 7) & 1) as u8,
        ad: ((flags >> 5) & 1) as u8,
        cd: ((flags >> 4) & 1) as u8,
        rcode: (flags & 0xF) as u8,
        qdcount: read_u16(payload, 4),
        ancount: read_u16(payload, 6),
        nscount: read_u16(payload, 8),
        arcount: read_u16(payload, 10),
    })
}

/// Reads one domain name starting at `start`. Returns the dotted name and
/// the offset just past the name at its original position (a compression
/// pointer occupies two bytes there, wherever it leads).
///
/// Pointers may only reach backwards, chase at most `MAX_POINTER_HOPS`
/// targets, and the decoded name must respect the RFC 1035 length limits.
fn decode_name(payload: &[u8], start: usize) -> Result<(String, usize), DnsParseError> {
    let mut name = String::new();
    let mut pos = start;
    let mut next = 0usize;
    let mut jumped = false;
    let mut hops = 0usize;

    loop {
        if pos >= payload.len() {
            return Err(DnsParseError::ShortPacket);
        }
        let len = payload[pos] as usize;

        if len == 0 {
            if !jumped {
                next = pos + 1;
            }
            break;
        }

        match len & 0xC0 {
            0xC0 => {
                // 14-bit pointer back into the packet
                if pos + 1 >= payload.len() {
                    return Err(DnsParseError::ShortPacket);
                }
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(DnsParseError::CompressionLoop);
                }
                let target = ((len & 0x3F) << 8) | payload[pos + 1] as usize;
                if target >= pos {
                    // forward or self-referential pointer
                    return Err(DnsParseError::CompressionLoop);
                }
                if !jumped {
                    next = pos + 2;
                    jumped = true;
                }
                pos = target;
            }
            0x00 => {
                // literal label, len is at most MAX_LABEL_LEN here
                debug_assert!(len <= MAX_LABEL_LEN);
                if pos + 1 + len > payload.len() {
                    return Err(DnsParseError::ShortPacket);
                }
                if !name.is_empty() {
                    name.push('.');
                }
                name.push_str(&String::from_utf8_lossy(&payload[pos + 1..pos + 1 + len]));
                if name.len() > MAX_NAME_LEN {
                    return Err(DnsParseError::BadLabel);
                }
                pos += 1 + len;
            }
            // 0x40 and 0x80 prefixes are reserved
            _ => return Err(DnsParseError::BadLabel),
        }
    }

    Ok((name, next))
}

/// Decodes the first question. Returns `(qname, qtype, offset)` where
/// `offset` points at the first resource record.
pub fn decode_question(payload: &[u8]) -> Result<(String, u16, usize), DnsParseError> {
    if payload.len() < DNS_HEADER_LEN {
        return Err(DnsParseError::ShortPacket);
    }

    let (qname, offset) = decode_name(payload, DNS_HEADER_LEN)?;
    // qtype + qclass
    if offset + 4 > payload.len() {
        return Err(DnsParseError::ShortPacket);
    }
    let qtype = read_u16(payload, offset);

    Ok((qname, qtype, offset + 4))
}

/// Decodes `count` resource records starting at `offset`. Returns the
/// records and the offset of the next section.
pub fn decode_answer(
    count: u16,
    offset: usize,
    payload: &[u8],
) -> Result<(Vec<DnsAnswer>, usize), DnsParseError> {
    let mut answers = Vec::with_capacity(count as usize);
    let mut offset = offset;

    for _ in 0..count {
        let (name, next) = decode_name(payload, offset)?;
        offset = next;

        // type(2) + class(2) + ttl(4) + rdlength(2)
        if offset + 10 > payload.len() {
            return Err(DnsParseError::ShortPacket);
        }
        let rdatatype = read_u16(payload, offset);
        let class = read_u16(payload, offset + 2);
        let ttl = read_u32(payload, offset + 4);
        let rdlength = read_u16(payload, offset + 8) as usize;
        offset += 10;

        if offset + rdlength > payload.len() {
            return Err(DnsParseError::ShortPacket);
        }
        let rdata = parse_rdata(rdatatype, offset, rdlength, payload)?;

        answers.push(DnsAnswer {
            name,
            rdatatype: rdatatype_to_string(rdatatype),
            class,
            ttl,
            rdata,
        });
        offset += rdlength;
    }

    Ok((answers, offset))
}

/// Renders rdata to text, best-effort per type. Anything unrecognized, and
/// any known type with an impossible length, becomes uppercase hex.
fn parse_rdata(
    rdatatype: u16,
    offset: usize,
    rdlength: usize,
    payload: &[u8],
) -> Result<String, DnsParseError> {
    let rdata = &payload[offset..offset + rdlength];

    let rendered = match rdatatype {
        // A
        1 if rdlength == 4 => Ipv4Addr::new(rdata[0], rdata[1], rdata[2], rdata[3]).to_string(),
        // AAAA
        28 if rdlength == 16 => {
            let mut buf = [0u8; 16];
            buf.copy_from_slice(rdata);
            Ipv6Addr::from(buf).to_string()
        }
        // NS, CNAME, PTR, DNAME: a possibly compressed domain name
        2 | 5 | 12 | 39 => decode_name(payload, offset)?.0,
        // MX: preference + exchange
        15 if rdlength >= 3 => {
            let preference = read_u16(payload, offset);
            let (exchange, _) = decode_name(payload, offset + 2)?;
            format!("{} {}", preference, exchange)
        }
        // SRV: priority, weight, port, target
        33 if rdlength >= 7 => {
            let priority = read_u16(payload, offset);
            let weight = read_u16(payload, offset + 2);
            let port = read_u16(payload, offset + 4);
            let (target, _) = decode_name(payload, offset + 6)?;
            format!("{} {} {} {}", priority, weight, port, target)
        }
        // SOA: two names then five 32-bit counters
        6 => {
            let (mname, next) = decode_name(payload, offset)?;
            let (rname, next) = decode_name(payload, next)?;
            if next + 20 > payload.len() {
                return Err(DnsParseError::ShortPacket);
            }
            format!(
                "{} {} {} {} {} {} {}",
                mname,
                rname,
                read_u32(payload, next),
                read_u32(payload, next + 4),
                read_u32(payload, next + 8),
                read_u32(payload, next + 12),
                read_u32(payload, next + 16),
            )
        }
        // TXT: concatenated character-strings
        16 => {
            let mut text = String::new();
            let mut pos = 0usize;
            while pos < rdata.len() {
                let len = rdata[pos] as usize;
                pos += 1;
                if pos + len > rdata.len() {
                    break;
                }
                text.push_str(&String::from_utf8_lossy(&rdata[pos..pos + len]));
                pos += len;
            }
            format!("\"{}\"", text)
        }
        // OPT is extracted separately; everything else is opaque
        _ => hex::encode_upper(rdata),
    };

    Ok(rendered)
}

/// Scans the additional section for an OPT pseudo-record and extracts the
/// EDNS(0) payload. A zero-valued `DnsExtended` is returned when none of the
/// `arcount` records is an OPT.
pub fn decode_edns(
    arcount: u16,
    offset: usize,
    payload: &[u8],
) -> Result<(DnsExtended, usize), DnsParseError> {
    let mut offset = offset;

    for _ in 0..arcount {
        let (_, next) = decode_name(payload, offset)?;
        offset = next;

        if offset + 10 > payload.len() {
            return Err(DnsParseError::ShortPacket);
        }
        let rdatatype = read_u16(payload, offset);
        let class = read_u16(payload, offset + 2);
        let ttl = read_u32(payload, offset + 4);
        let rdlength = read_u16(payload, offset + 8) as usize;
        offset += 10;

        if offset + rdlength > payload.len() {
            return Err(DnsParseError::ShortPacket);
        }

        if rdatatype == TYPE_OPT {
            let mut extended = DnsExtended {
                udp_size: class,
                extended_rcode: ((ttl >> 24) & 0xFF) as u8,
                version: ((ttl >> 16) & 0xFF) as u8,
                do_flag: ((ttl >> 15) & 1) as u8,
                options: Vec::new(),
            };

            let end = offset + rdlength;
            let mut pos = offset;
            while pos + 4 <= end {
                let code = read_u16(payload, pos);
                let optlen = read_u16(payload, pos + 2) as usize;
                pos += 4;
                if pos + optlen > end {
                    return Err(DnsParseError::ShortPacket);
                }
                extended.options.push(DnsOption {
                    code,
                    name: edns_option_to_string(code),
                    data: hex::encode_upper(&payload[pos..pos + optlen]),
                });
                pos += optlen;
            }

            return Ok((extended, end));
        }

        offset += rdlength;
    }

    Ok((DnsExtended::default(), offset))
}

pub fn rcode_to_string(rcode: u8) -> String {
    let name = match rcode {
        0 => "NOERROR",
        1 => "FORMERR",
        2 => "SERVFAIL",
        3 => "NXDOMAIN",
        4 => "NOTIMP",
        5 => "REFUSED",
        6 => "YXDOMAIN",
        7 => "YXRRSET",
        8 => "NXRRSET",
        9 => "NOTAUTH",
        10 => "NOTZONE",
        _ => "UNKNOWN",
    };
    name.to_string()
}

pub fn rdatatype_to_string(rdatatype: u16) -> String {
    match rdatatype {
        1 => "A".to_string(),
        2 => "NS".to_string(),
        5 => "CNAME".to_string(),
        6 => "SOA".to_string(),
        12 => "PTR".to_string(),
        15 => "MX".to_string(),
        16 => "TXT".to_string(),
        28 => "AAAA".to_string(),
        33 => "SRV".to_string(),
        39 => "DNAME".to_string(),
        41 => "OPT".to_string(),
        43 => "DS".to_string(),
        46 => "RRSIG".to_string(),
        47 => "NSEC".to_string(),
        48 => "DNSKEY".to_string(),
        50 => "NSEC3".to_string(),
        51 => "NSEC3PARAM".to_string(),
        52 => "TLSA".to_string(),
        64 => "SVCB".to_string(),
        65 => "HTTPS".to_string(),
        255 => "ANY".to_string(),
        257 => "CAA".to_string(),
        n => format!("TYPE{}", n),
    }
}

fn edns_option_to_string(code: u16) -> String {
    match code {
        3 => "NSID".to_string(),
        8 => "ECS".to_string(),
        10 => "COOKIE".to_string(),
        11 => "KEEPALIVE".to_string(),
        12 => "PADDING".to_string(),
        15 => "EDE".to_string(),
        n => format!("{:04X}", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // id 0x1234, flags 0, one question: example.com A IN
    fn query_packet() -> Vec<u8> {
        let mut p = vec![
            0x12, 0x34, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        p.extend_from_slice(b"\x07example\x03com\x00");
        p.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        p
    }

    fn rr_fixed(rdatatype: u16, ttl: u32, rdata: &[u8]) -> Vec<u8> {
        let mut rr = vec![0xC0, 0x0C]; // name: pointer to the question
        rr.extend_from_slice(&rdatatype.to_be_bytes());
        rr.extend_from_slice(&1u16.to_be_bytes());
        rr.extend_from_slice(&ttl.to_be_bytes());
        rr.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        rr.extend_from_slice(rdata);
        rr
    }

    #[test]
    fn header_fields() {
        let mut p = query_packet();
        // QR + AA + RCODE=3
        p[2] = 0x84;
        p[3] = 0x03;
        let h = decode_header(&p).unwrap();
        assert_eq!(h.id, 0x1234);
        assert_eq!(h.qr, 1);
        assert_eq!(h.aa, 1);
        assert_eq!(h.tc, 0);
        assert_eq!(h.rcode, 3);
        assert_eq!(h.qdcount, 1);
    }

    #[test]
    fn header_too_short() {
        assert_eq!(decode_header(&[]), Err(DnsParseError::ShortPacket));
        assert_eq!(decode_header(&[0u8; 11]), Err(DnsParseError::ShortPacket));
    }

    #[test]
    fn question_decodes() {
        let (qname, qtype, offset) = decode_question(&query_packet()).unwrap();
        assert_eq!(qname, "example.com");
        assert_eq!(qtype, 1);
        assert_eq!(offset, 12 + 13 + 4);
    }

    #[test]
    fn question_with_truncated_label() {
        let mut p = vec![
            0x12, 0x34, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        p.extend_from_slice(b"\x07exam"); // label claims 7, packet ends early
        assert_eq!(decode_question(&p), Err(DnsParseError::ShortPacket));
    }

    #[test]
    fn question_missing_qtype() {
        let mut p = vec![
            0x12, 0x34, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        p.extend_from_slice(b"\x01a\x00\x00");
        assert_eq!(decode_question(&p), Err(DnsParseError::ShortPacket));
    }

    #[test]
    fn pointer_to_self_is_rejected() {
        let mut p = vec![
            0x12, 0x34, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        // pointer at offset 12 targeting offset 12
        p.extend_from_slice(&[0xC0, 0x0C]);
        p.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        assert_eq!(decode_question(&p), Err(DnsParseError::CompressionLoop));
    }

    #[test]
    fn forward_pointer_is_rejected() {
        let mut p = vec![
            0x12, 0x34, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        p.extend_from_slice(&[0xC0, 0x20]); // points past itself
        p.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        assert_eq!(decode_question(&p), Err(DnsParseError::CompressionLoop));
    }

    #[test]
    fn long_pointer_chain_is_bounded() {
        // 130 pointers, each hopping one step backwards to the previous one,
        // ending on a terminating zero at offset 12.
        let mut p = vec![
            0x12, 0x34, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        p.push(0x00);
        let mut target = 12u16;
        for _ in 0..130 {
            let here = p.len() as u16;
            p.extend_from_slice(&(0xC000 | target).to_be_bytes());
            target = here;
        }
        // name starts at the last pointer written
        let start = p.len() - 2;
        assert_eq!(decode_name(&p, start), Err(DnsParseError::CompressionLoop));
    }

    #[test]
    fn reserved_label_prefix_is_rejected() {
        let mut p = vec![
            0x12, 0x34, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        p.push(0x40);
        p.extend_from_slice(&[0x00; 8]);
        assert_eq!(decode_question(&p), Err(DnsParseError::BadLabel));
    }

    #[test]
    fn name_over_255_is_rejected() {
        let mut p = vec![
            0x12, 0x34, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        for _ in 0..6 {
            p.push(50);
            p.extend_from_slice(&[b'a'; 50]);
        }
        p.push(0x00);
        p.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        assert_eq!(decode_question(&p), Err(DnsParseError::BadLabel));
    }

    #[test]
    fn answer_a_record() {
        let mut p = query_packet();
        p[7] = 0x01; // ancount = 1
        let offset = p.len();
        p.extend_from_slice(&rr_fixed(1, 300, &[93, 184, 216, 34]));

        let (answers, next) = decode_answer(1, offset, &p).unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].name, "example.com");
        assert_eq!(answers[0].rdatatype, "A");
        assert_eq!(answers[0].class, 1);
        assert_eq!(answers[0].ttl, 300);
        assert_eq!(answers[0].rdata, "93.184.216.34");
        assert_eq!(next, p.len());
    }

    #[test]
    fn answer_aaaa_record() {
        let mut p = query_packet();
        let offset = p.len();
        let mut v6 = [0u8; 16];
        v6[0] = 0x20;
        v6[1] = 0x01;
        v6[15] = 0x01;
        p.extend_from_slice(&rr_fixed(28, 60, &v6));

        let (answers, _) = decode_answer(1, offset, &p).unwrap();
        assert_eq!(answers[0].rdatatype, "AAAA");
        assert_eq!(answers[0].rdata, "2001::1");
    }

    #[test]
    fn answer_cname_with_compression() {
        let mut p = query_packet();
        let offset = p.len();
        // cname rdata: "www" + pointer back to example.com at offset 12
        p.extend_from_slice(&rr_fixed(5, 60, b"\x03www\xC0\x0C"));

        let (answers, _) = decode_answer(1, offset, &p).unwrap();
        assert_eq!(answers[0].rdatatype, "CNAME");
        assert_eq!(answers[0].rdata, "www.example.com");
    }

    #[test]
    fn answer_mx_record() {
        let mut p = query_packet();
        let offset = p.len();
        let mut rdata = vec![0x00, 0x0A]; // preference 10
        rdata.extend_from_slice(b"\x04mail\xC0\x0C");
        p.extend_from_slice(&rr_fixed(15, 60, &rdata));

        let (answers, _) = decode_answer(1, offset, &p).unwrap();
        assert_eq!(answers[0].rdata, "10 mail.example.com");
    }

    #[test]
    fn answer_srv_record() {
        let mut p = query_packet();
        let offset = p.len();
        let mut rdata = Vec::new();
        rdata.extend_from_slice(&10u16.to_be_bytes());
        rdata.extend_from_slice(&20u16.to_be_bytes());
        rdata.extend_from_slice(&443u16.to_be_bytes());
        rdata.extend_from_slice(b"\x03srv\xC0\x0C");
        p.extend_from_slice(&rr_fixed(33, 60, &rdata));

        let (answers, _) = decode_answer(1, offset, &p).unwrap();
        assert_eq!(answers[0].rdata, "10 20 443 srv.example.com");
    }

    #[test]
    fn answer_soa_record() {
        let mut p = query_packet();
        let offset = p.len();
        let mut rdata = Vec::new();
        rdata.extend_from_slice(b"\x02ns\xC0\x0C");
        rdata.extend_from_slice(b"\x05admin\xC0\x0C");
        for v in [2023u32, 7200, 3600, 1209600, 300] {
            rdata.extend_from_slice(&v.to_be_bytes());
        }
        p.extend_from_slice(&rr_fixed(6, 60, &rdata));

        let (answers, _) = decode_answer(1, offset, &p).unwrap();
        assert_eq!(
            answers[0].rdata,
            "ns.example.com admin.example.com 2023 7200 3600 1209600 300"
        );
    }

    #[test]
    fn answer_txt_record() {
        let mut p = query_packet();
        let offset = p.len();
        p.extend_from_slice(&rr_fixed(16, 60, b"\x05hello\x06 world"));

        let (answers, _) = decode_answer(1, offset, &p).unwrap();
        assert_eq!(answers[0].rdata, "\"hello world\"");
    }

    #[test]
    fn answer_unknown_type_is_hex() {
        let mut p = query_packet();
        let offset = p.len();
        p.extend_from_slice(&rr_fixed(99, 60, &[0xDE, 0xAD, 0xBE, 0xEF]));

        let (answers, _) = decode_answer(1, offset, &p).unwrap();
        assert_eq!(answers[0].rdatatype, "TYPE99");
        assert_eq!(answers[0].rdata, "DEADBEEF");
    }

    #[test]
    fn answer_a_with_bad_length_is_hex() {
        let mut p = query_packet();
        let offset = p.len();
        p.extend_from_slice(&rr_fixed(1, 60, &[1, 2, 3]));

        let (answers, _) = decode_answer(1, offset, &p).unwrap();
        assert_eq!(answers[0].rdata, "010203");
    }

    #[test]
    fn answer_truncated_rdata() {
        let mut p = query_packet();
        let offset = p.len();
        let mut rr = rr_fixed(1, 60, &[93, 184, 216, 34]);
        rr.truncate(rr.len() - 2);
        p.extend_from_slice(&rr);

        assert_eq!(decode_answer(1, offset, &p), Err(DnsParseError::ShortPacket));
    }

    fn opt_rr(options: &[u8]) -> Vec<u8> {
        let mut rr = vec![0x00]; // root name
        rr.extend_from_slice(&TYPE_OPT.to_be_bytes());
        rr.extend_from_slice(&4096u16.to_be_bytes()); // requestor payload size
        rr.extend_from_slice(&0x0000_8000u32.to_be_bytes()); // DO set
        rr.extend_from_slice(&(options.len() as u16).to_be_bytes());
        rr.extend_from_slice(options);
        rr
    }

    #[test]
    fn edns_with_no_options() {
        let mut p = query_packet();
        let offset = p.len();
        p.extend_from_slice(&opt_rr(&[]));

        let (extended, _) = decode_edns(1, offset, &p).unwrap();
        assert_eq!(extended.udp_size, 4096);
        assert_eq!(extended.version, 0);
        assert_eq!(extended.do_flag, 1);
        assert!(extended.options.is_empty());
    }

    #[test]
    fn edns_options_known_and_unknown() {
        let mut opts = Vec::new();
        opts.extend_from_slice(&10u16.to_be_bytes()); // COOKIE
        opts.extend_from_slice(&2u16.to_be_bytes());
        opts.extend_from_slice(&[0xAA, 0xBB]);
        opts.extend_from_slice(&99u16.to_be_bytes()); // unknown
        opts.extend_from_slice(&1u16.to_be_bytes());
        opts.push(0x01);

        let mut p = query_packet();
        let offset = p.len();
        p.extend_from_slice(&opt_rr(&opts));

        let (extended, _) = decode_edns(1, offset, &p).unwrap();
        assert_eq!(extended.options.len(), 2);
        assert_eq!(extended.options[0].name, "COOKIE");
        assert_eq!(extended.options[0].data, "AABB");
        assert_eq!(extended.options[1].name, "0063");
    }

    #[test]
    fn edns_skips_non_opt_records() {
        let mut p = query_packet();
        let offset = p.len();
        p.extend_from_slice(&rr_fixed(1, 60, &[1, 2, 3, 4]));
        p.extend_from_slice(&opt_rr(&[]));

        let (extended, _) = decode_edns(2, offset, &p).unwrap();
        assert_eq!(extended.udp_size, 4096);
    }

    #[test]
    fn edns_absent_yields_zero_values() {
        let mut p = query_packet();
        let offset = p.len();
        p.extend_from_slice(&rr_fixed(1, 60, &[1, 2, 3, 4]));

        let (extended, _) = decode_edns(1, offset, &p).unwrap();
        assert_eq!(extended.udp_size, 0);
        assert!(extended.options.is_empty());
    }

    #[test]
    fn edns_truncated_option_errors() {
        let mut opts = Vec::new();
        opts.extend_from_slice(&3u16.to_be_bytes());
        opts.extend_from_slice(&200u16.to_be_bytes()); // claims more than present
        opts.push(0x00);

        let mut p = query_packet();
        let offset = p.len();
        p.extend_from_slice(&opt_rr(&opts));

        assert_eq!(decode_edns(1, offset, &p), Err(DnsParseError::ShortPacket));
    }

    #[test]
    fn rcode_names() {
        assert_eq!(rcode_to_string(0), "NOERROR");
        assert_eq!(rcode_to_string(3), "NXDOMAIN");
        assert_eq!(rcode_to_string(10), "NOTZONE");
        assert_eq!(rcode_to_string(15), "UNKNOWN");
    }

    #[test]
    fn rdatatype_names() {
        assert_eq!(rdatatype_to_string(1), "A");
        assert_eq!(rdatatype_to_string(65), "HTTPS");
        assert_eq!(rdatatype_to_string(1234), "TYPE1234");
    }
}
