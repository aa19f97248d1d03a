use std::net::SocketAddrV4;
use std::time::Duration;

use thiserror::Error;

use crate::RecordType;

/// Failures while encoding or decoding DNS wire data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DnsError {
    #[error("truncated message: needed {needed} bytes at offset {offset}, {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("malformed name {0:?}: empty label")]
    EmptyLabel(String),

    #[error("label {label:?} is {len} octets, the limit is 63")]
    LabelTooLong { label: String, len: usize },

    #[error("name is {0} octets on the wire, the limit is 255")]
    NameTooLong(usize),

    #[error("compression pointer at {at} targets {target}, which does not precede it")]
    BadPointer { at: usize, target: usize },

    #[error("compression pointer at {at} targets {target}, outside the {limit} byte message")]
    PointerOutOfBounds {
        at: usize,
        target: usize,
        limit: usize,
    },

    #[error("reserved label type {octet:#04x} at offset {at}")]
    ReservedLabelType { at: usize, octet: u8 },

    #[error("invalid label at offset {at}")]
    InvalidLabel { at: usize },

    #[error("rdlength {rdlength} exceeds the {remaining} bytes remaining")]
    RdataOverrun { rdlength: usize, remaining: usize },

    #[error("rdlength {rdlength} is invalid for a {type_} record")]
    BadRdataLength { type_: RecordType, rdlength: usize },

    #[error("{count} {section} records do not fit a 16-bit section count")]
    SectionTooLarge { section: &'static str, count: usize },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("could not bind a local socket: {0}")]
    Bind(#[source] std::io::Error),

    #[error("could not connect to {server}: {source}")]
    Connect {
        server: SocketAddrV4,
        #[source]
        source: std::io::Error,
    },

    #[error("could not send query to {server}: {source}")]
    Send {
        server: SocketAddrV4,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read reply from {server}: {source}")]
    Recv {
        server: SocketAddrV4,
        #[source]
        source: std::io::Error,
    },

    #[error("no reply from {server} within {after:?}")]
    Timeout { server: SocketAddrV4, after: Duration },

    #[error("nameserver {0} is unreachable")]
    Unreachable(SocketAddrV4),
}

impl TransportError {
    /// Whether another attempt against the same server could succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Bind(_))
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("could not open the cache database: {0}")]
    Open(#[source] sled::Error),

    #[error("cache storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("cache transaction aborted")]
    Aborted,

    #[error("cached value for {key:?} is {len} bytes, expected 12")]
    Corrupt { key: String, len: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(#[from] DnsError),

    #[error("too many referrals: gave up after {0} hops")]
    TooManyReferrals(usize),

    #[error("resolution deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
}
