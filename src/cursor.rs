use bytes::Buf;

use crate::DnsError;

/// Read position over a received message.
///
/// Every read is bounds-checked against the end of the message and fails with
/// [`DnsError::Truncated`] instead of panicking. The whole message stays
/// reachable through [`WireCursor::buffer`] so compressed names can follow
/// pointers back to earlier offsets.
#[derive(Debug, Clone)]
pub struct WireCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn ensure(&self, needed: usize) -> Result<(), DnsError> {
        if self.remaining() < needed {
            return Err(DnsError::Truncated {
                offset: self.pos,
                needed,
                remaining: self.remaining(),
            });
        }

        Ok(())
    }

    pub fn get_u8(&mut self) -> Result<u8, DnsError> {
        self.ensure(1)?;
        let value = self.buf[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub fn get_u16(&mut self) -> Result<u16, DnsError> {
        self.ensure(2)?;
        let value = (&self.buf[self.pos..]).get_u16();
        self.pos += 2;
        Ok(value)
    }

    pub fn get_u32(&mut self) -> Result<u32, DnsError> {
        self.ensure(4)?;
        let value = (&self.buf[self.pos..]).get_u32();
        self.pos += 4;
        Ok(value)
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], DnsError> {
        self.ensure(len)?;
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}
