use bitfield::bitfield;
use bytes::{BufMut, Bytes, BytesMut};
use tracing::{instrument, warn};

use super::Networkable;
use crate::{DnsError, WireCursor};

pub const HEADER_LEN: usize = 12;

bitfield! {
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct Flags(u16);
    impl Debug;
    u8;
    // query or response
    pub qr, set_qr: 15;
    // query type
    pub opcode, set_opcode: 14, 11;
    // authoritative answerer
    pub aa, set_aa: 10;
    // truncation
    pub tc, set_tc: 9;
    // recursion desired
    pub rd, set_rd: 8;
    // recursion available
    pub ra, set_ra: 7;
    // reserved
    pub z, set_z: 6, 4;
    // response code
    pub rcode, set_rcode: 3, 0;
}

impl Flags {
    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn from_bits(bits: u16) -> Self {
        Self(bits)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub flags: Flags,
    pub num_questions: u16,
    pub num_answers: u16,
    pub num_authorities: u16,
    pub num_additionals: u16,
}

impl Header {
    pub fn new(id: u16, flags: Flags) -> Self {
        Self {
            id,
            flags,
            ..Default::default()
        }
    }
}

impl Networkable for Header {
    #[instrument(level = "trace", skip_all)]
    fn to_bytes(&self) -> Result<Bytes, DnsError> {
        let mut ret = BytesMut::with_capacity(HEADER_LEN);
        ret.put_u16(self.id);
        ret.put_u16(self.flags.bits());
        ret.put_u16(self.num_questions);
        ret.put_u16(self.num_answers);
        ret.put_u16(self.num_authorities);
        ret.put_u16(self.num_additionals);

        Ok(ret.into())
    }

    #[instrument(level = "trace", skip_all)]
    fn from_bytes(bytes: &mut WireCursor<'_>) -> Result<Self, DnsError> {
        if bytes.remaining() < HEADER_LEN {
            warn!(remaining = bytes.remaining(), "insufficient bytes for header");
            return Err(DnsError::Truncated {
                offset: bytes.position(),
                needed: HEADER_LEN,
                remaining: bytes.remaining(),
            });
        }

        Ok(Self {
            id: bytes.get_u16()?,
            flags: Flags::from_bits(bytes.get_u16()?),
            num_questions: bytes.get_u16()?,
            num_answers: bytes.get_u16()?,
            num_authorities: bytes.get_u16()?,
            num_additionals: bytes.get_u16()?,
        })
    }
}
