use std::fmt::Display;
use std::hash::{Hash, Hasher};

use bytes::{BufMut, Bytes, BytesMut};
use itertools::Itertools;
use tracing::instrument;

use super::Networkable;
use crate::{DnsError, WireCursor};

const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 255;
const POINTER_MASK: u8 = 0b1100_0000;

/// A domain name, held in its dot-joined form.
///
/// Comparison and hashing ignore ASCII case.
#[derive(Debug, Clone)]
pub struct Name {
    /// This is the domain name
    /// E.g. www.google.com
    name: String,

    /// This is a vector of all the indices where a label starts
    /// E.g. www.google.com would have a split_indices of [0, 4, 11]
    split_indices: Vec<usize>,
}

impl Name {
    /// Builds a name without validating it. Empty or oversized labels are
    /// reported when the name is encoded.
    pub fn new(name: &str) -> Self {
        let mut split_indices = vec![0];
        split_indices.extend(name.match_indices('.').map(|(i, _)| i + 1));

        Self {
            name: name.to_owned(),
            split_indices,
        }
    }

    /// The root name, which has no labels.
    pub fn root() -> Self {
        Self {
            name: String::new(),
            split_indices: Vec::new(),
        }
    }

    fn from_labels(labels: &[&str]) -> Self {
        if labels.is_empty() {
            Self::root()
        } else {
            Self::new(&labels.iter().join("."))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.split_indices.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.split_indices.iter().enumerate().map(|(i, start)| {
            let end = self
                .split_indices
                .get(i + 1)
                .map(|next| next - 1)
                .unwrap_or(self.name.len());
            &self.name[*start..end]
        })
    }

    /// Get smaller and smaller suffixes, most specific first
    /// Eg www.google.com -> [www.google.com, google.com, com]
    pub fn suffixes(&self) -> impl Iterator<Item = Name> + '_ {
        self.split_indices.iter().map(|i| Name::new(&self.name[*i..]))
    }

    /// Key used for this name in the cache.
    pub fn cache_key(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// Checks every label is 1-63 octets and the encoded name fits in 255.
    pub fn validate(&self) -> Result<(), DnsError> {
        let mut wire_len = 1;
        for label in self.labels() {
            if label.is_empty() {
                return Err(DnsError::EmptyLabel(self.name.clone()));
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(DnsError::LabelTooLong {
                    label: label.to_owned(),
                    len: label.len(),
                });
            }
            wire_len += label.len() + 1;
        }

        if wire_len > MAX_NAME_LEN {
            return Err(DnsError::NameTooLong(wire_len));
        }

        Ok(())
    }

    /// Decodes a possibly compressed name starting at `offset`, reading no
    /// further than `limit`.
    ///
    /// Returns the name and the number of bytes it occupies at `offset`; when
    /// the name ends in a pointer that count stops after the two pointer bytes.
    /// Every pointer must target an offset strictly before the previous jump
    /// point (the start of the name for the first pointer), so decoding always
    /// terminates.
    pub fn decode(buffer: &[u8], offset: usize, limit: usize) -> Result<(Self, usize), DnsError> {
        let buffer = &buffer[..limit.min(buffer.len())];
        let mut cursor = WireCursor::new(buffer);
        cursor.set_position(offset);

        let mut labels: Vec<&str> = Vec::new();
        let mut wire_len = 1;
        let mut floor = offset;
        let mut consumed = None;

        loop {
            let at = cursor.position();
            let len = cursor.get_u8()?;

            if len & POINTER_MASK == POINTER_MASK {
                let low = cursor.get_u8()?;
                let target = (usize::from(len & !POINTER_MASK) << 8) | usize::from(low);

                if target >= buffer.len() {
                    return Err(DnsError::PointerOutOfBounds {
                        at,
                        target,
                        limit: buffer.len(),
                    });
                }
                if target >= floor {
                    return Err(DnsError::BadPointer { at, target });
                }

                if consumed.is_none() {
                    consumed = Some(cursor.position() - offset);
                }
                floor = target;
                cursor.set_position(target);
                continue;
            }

            if len & POINTER_MASK != 0 {
                return Err(DnsError::ReservedLabelType { at, octet: len });
            }

            if len == 0 {
                break;
            }

            let raw = cursor.take(usize::from(len))?;
            let label = std::str::from_utf8(raw).map_err(|_| DnsError::InvalidLabel { at })?;
            if label.contains('.') {
                return Err(DnsError::InvalidLabel { at });
            }

            wire_len += raw.len() + 1;
            if wire_len > MAX_NAME_LEN {
                return Err(DnsError::NameTooLong(wire_len));
            }

            labels.push(label);
        }

        let consumed = consumed.unwrap_or_else(|| cursor.position() - offset);

        Ok((Self::from_labels(&labels), consumed))
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.name.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            f.write_str(".")
        } else {
            f.write_str(&self.name)
        }
    }
}

impl Networkable for Name {
    #[instrument(level = "trace", skip_all)]
    fn to_bytes(&self) -> Result<Bytes, DnsError> {
        self.validate()?;

        let mut ret = BytesMut::with_capacity(self.name.len() + 2);

        for label in self.labels() {
            ret.put_u8(label.len() as u8);
            ret.extend_from_slice(label.as_bytes());
        }

        ret.put_u8(0);

        Ok(ret.into())
    }

    #[instrument(level = "trace", skip_all)]
    fn from_bytes(bytes: &mut WireCursor<'_>) -> Result<Self, DnsError> {
        let start = bytes.position();
        let (name, consumed) = Self::decode(bytes.buffer(), start, bytes.buffer().len())?;
        bytes.set_position(start + consumed);

        Ok(name)
    }
}
