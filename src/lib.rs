//! Passive dnstap telemetry pipeline. Framed tap envelopes come in over a
//! bounded channel, are decoded, parsed, correlated and enriched, and the
//! resulting normalized records fan out to every registered sink.

pub mod cache;
pub mod config;
pub mod dnstap;
pub mod filtering;
pub mod geoip;
pub mod message;
pub mod parser;
pub mod privacy;
pub mod processor;

pub use config::Config;
pub use message::DnsMessage;
pub use processor::DnstapProcessor;
