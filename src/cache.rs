//! Persistent address cache.
//!
//! Entries live in the `record` tree of a sled database, keyed by the
//! lowercase domain name. Each value is a 12 byte [`CachedRecord`]. Entries are
//! never evicted; callers decide freshness with [`CachedRecord::is_fresh`].

use std::net::Ipv4Addr;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use byteorder::{BigEndian, ByteOrder};
use sled::transaction::{TransactionError, TransactionResult};
use tracing::{debug, info, trace};

use crate::{CacheError, Name, ResourceRecord};

const RECORD_TREE: &str = "record";
pub const CACHED_RECORD_LEN: usize = 12;

/// Current unix time in seconds, as stored in [`CachedRecord::timestamp`].
pub fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedRecord {
    /// Unix seconds when the record was stored.
    pub timestamp: u32,
    pub ttl: u32,
    pub addr: Ipv4Addr,
}

impl CachedRecord {
    /// Builds an entry from an A record. Other record types carry no address.
    pub fn from_record(record: &ResourceRecord, now: u32) -> Option<Self> {
        Some(Self {
            timestamp: now,
            ttl: record.ttl,
            addr: record.address()?,
        })
    }

    pub fn expires_at(&self) -> u64 {
        u64::from(self.timestamp) + u64::from(self.ttl)
    }

    /// Fresh for `now` in `[timestamp, timestamp + ttl)`.
    pub fn is_fresh(&self, now: u32) -> bool {
        now >= self.timestamp && u64::from(now) < self.expires_at()
    }

    pub fn to_bytes(&self) -> [u8; CACHED_RECORD_LEN] {
        let mut buf = [0; CACHED_RECORD_LEN];
        BigEndian::write_u32(&mut buf[0..4], self.timestamp);
        BigEndian::write_u32(&mut buf[4..8], self.ttl);
        buf[8..12].copy_from_slice(&self.addr.octets());
        buf
    }

    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() != CACHED_RECORD_LEN {
            return None;
        }

        Some(Self {
            timestamp: BigEndian::read_u32(&buf[0..4]),
            ttl: BigEndian::read_u32(&buf[4..8]),
            addr: Ipv4Addr::new(buf[8], buf[9], buf[10], buf[11]),
        })
    }
}

/// Handle to the cache database, opened once and held for the process lifetime.
#[derive(Clone)]
pub struct Cache {
    db: sled::Db,
    tree: sled::Tree,
}

impl Cache {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let db = sled::Config::default()
            .path(path.as_ref())
            .open()
            .map_err(CacheError::Open)?;

        info!(path = ?path.as_ref(), "opened cache database");
        Self::from_db(db)
    }

    /// A database that is deleted when the last handle is dropped.
    pub fn temporary() -> Result<Self, CacheError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(CacheError::Open)?;

        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, CacheError> {
        let tree = db.open_tree(RECORD_TREE).map_err(CacheError::Open)?;
        Ok(Self { db, tree })
    }

    /// Writes `record` under `name` in one transaction, replacing any previous entry.
    pub fn store(&self, name: &Name, record: &CachedRecord) -> Result<(), CacheError> {
        let key = name.cache_key();
        let value = record.to_bytes();

        let result: TransactionResult<()> = self.tree.transaction(|tx| {
            tx.insert(key.as_bytes(), &value[..])?;
            Ok(())
        });

        result.map_err(|e| match e {
            TransactionError::Abort(()) => CacheError::Aborted,
            TransactionError::Storage(e) => CacheError::Storage(e),
        })?;

        trace!(%key, addr = %record.addr, ttl = record.ttl, "cached record");
        Ok(())
    }

    /// Reads the entry for `name` from a consistent snapshot, without taking
    /// any write lock. Stale entries are returned as-is.
    pub fn get(&self, name: &Name) -> Result<Option<CachedRecord>, CacheError> {
        let key = name.cache_key();
        let Some(value) = self.tree.get(key.as_bytes())? else {
            return Ok(None);
        };

        CachedRecord::from_bytes(&value)
            .map(Some)
            .ok_or(CacheError::Corrupt {
                key,
                len: value.len(),
            })
    }

    /// Flushes pending writes and releases this handle.
    pub fn close(self) -> Result<(), CacheError> {
        let flushed = self.db.flush()?;
        debug!(bytes = flushed, "flushed cache database");
        Ok(())
    }
}
