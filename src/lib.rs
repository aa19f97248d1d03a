mod error;
pub use error::{CacheError, ConfigError, DnsError, ResolveError, TransportError};

mod cursor;
pub use cursor::WireCursor;

mod header;
pub use header::{Flags, Header, HEADER_LEN};

mod name;
pub use name::Name;

mod message;
pub use message::Message;

mod question;
pub use question::Question;

mod resource_record;
pub use resource_record::{RecordData, ResourceRecord};

mod record_type;
pub use record_type::{RecordType, CLASS_IN};

pub mod cache;
pub use cache::{Cache, CachedRecord};

mod config;
pub use config::{ResolverConfig, DEFAULT_ROOT_SERVER, DEFAULT_UPSTREAM};

pub mod resolver;
pub use resolver::{Resolution, Resolver};

use bytes::Bytes;

pub trait Networkable: Sized {
    fn to_bytes(&self) -> Result<Bytes, DnsError>;

    fn from_bytes(bytes: &mut WireCursor<'_>) -> Result<Self, DnsError>;
}
