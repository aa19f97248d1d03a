use std::net::Ipv4Addr;

use bytes::Bytes;

use crate::{DnsError, Name, Networkable, RecordType, WireCursor};

/// Interpreted rdata. Types this resolver does not act on stay opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Ns(Name),
    Cname(Name),
    Other(Bytes),
}

impl RecordData {
    /// Reads `rd_length` bytes of rdata at the cursor. Names inside the rdata
    /// may point anywhere earlier in the message but must end within it.
    pub fn from_bytes(
        type_: RecordType,
        rd_length: u16,
        bytes: &mut WireCursor<'_>,
    ) -> Result<Self, DnsError> {
        let rd_length = usize::from(rd_length);
        if bytes.remaining() < rd_length {
            return Err(DnsError::RdataOverrun {
                rdlength: rd_length,
                remaining: bytes.remaining(),
            });
        }

        let start = bytes.position();
        let end = start + rd_length;

        let data = match type_ {
            RecordType::A => {
                if rd_length != 4 {
                    return Err(DnsError::BadRdataLength {
                        type_,
                        rdlength: rd_length,
                    });
                }
                let raw = bytes.take(4)?;
                Self::A(Ipv4Addr::new(raw[0], raw[1], raw[2], raw[3]))
            }
            RecordType::Ns | RecordType::Cname => {
                let (name, consumed) = Name::decode(bytes.buffer(), start, end)?;
                if consumed != rd_length {
                    return Err(DnsError::BadRdataLength {
                        type_,
                        rdlength: rd_length,
                    });
                }
                if type_ == RecordType::Ns {
                    Self::Ns(name)
                } else {
                    Self::Cname(name)
                }
            }
            _ => Self::Other(Bytes::copy_from_slice(bytes.take(rd_length)?)),
        };

        bytes.set_position(end);

        Ok(data)
    }

    pub fn to_bytes(&self) -> Result<Bytes, DnsError> {
        match self {
            Self::A(addr) => Ok(Bytes::copy_from_slice(&addr.octets())),
            Self::Ns(name) | Self::Cname(name) => name.to_bytes(),
            Self::Other(raw) => Ok(raw.clone()),
        }
    }
}
