use std::net::Ipv4Addr;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::instrument;

use super::{Name, Networkable};
use crate::{DnsError, RecordType, WireCursor, CLASS_IN};

mod record_data;
pub use record_data::RecordData;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: Name,
    pub type_: RecordType,
    pub class: u16,
    pub ttl: u32,
    pub data: RecordData,
}

impl ResourceRecord {
    pub fn a(name: Name, ttl: u32, addr: Ipv4Addr) -> Self {
        Self::new(name, RecordType::A, ttl, RecordData::A(addr))
    }

    pub fn ns(zone: Name, ttl: u32, server: Name) -> Self {
        Self::new(zone, RecordType::Ns, ttl, RecordData::Ns(server))
    }

    pub fn cname(name: Name, ttl: u32, target: Name) -> Self {
        Self::new(name, RecordType::Cname, ttl, RecordData::Cname(target))
    }

    fn new(name: Name, type_: RecordType, ttl: u32, data: RecordData) -> Self {
        Self {
            name,
            type_,
            class: CLASS_IN,
            ttl,
            data,
        }
    }

    pub fn address(&self) -> Option<Ipv4Addr> {
        match self.data {
            RecordData::A(addr) => Some(addr),
            _ => None,
        }
    }
}

impl Networkable for ResourceRecord {
    #[instrument(level = "trace", skip_all)]
    fn to_bytes(&self) -> Result<Bytes, DnsError> {
        let name = self.name.to_bytes()?;
        let data = self.data.to_bytes()?;

        let mut ret = BytesMut::with_capacity(name.len() + 10 + data.len());
        ret.extend_from_slice(&name);
        ret.put_u16(self.type_.into());
        ret.put_u16(self.class);
        ret.put_u32(self.ttl);
        ret.put_u16(data.len() as u16);
        ret.extend_from_slice(&data);

        Ok(ret.into())
    }

    #[instrument(level = "trace", skip_all)]
    fn from_bytes(bytes: &mut WireCursor<'_>) -> Result<Self, DnsError> {
        let name = Name::from_bytes(bytes)?;
        let type_ = RecordType::from(bytes.get_u16()?);
        let class = bytes.get_u16()?;
        let ttl = bytes.get_u32()?;
        let data_length = bytes.get_u16()?;

        let data = RecordData::from_bytes(type_, data_length, bytes)?;

        Ok(Self {
            name,
            type_,
            class,
            ttl,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(name: &[u8], type_: u16, ttl: u32, rd_length: u16) -> Vec<u8> {
        let mut raw = name.to_vec();
        raw.extend_from_slice(&type_.to_be_bytes());
        raw.extend_from_slice(&CLASS_IN.to_be_bytes());
        raw.extend_from_slice(&ttl.to_be_bytes());
        raw.extend_from_slice(&rd_length.to_be_bytes());
        raw
    }

    #[test]
    fn decodes_a_record() {
        let mut raw = header_bytes(b"\x07example\x03com\x00", 1, 300, 4);
        raw.extend_from_slice(&[93, 184, 216, 34]);

        let mut cursor = WireCursor::new(&raw);
        let record = ResourceRecord::from_bytes(&mut cursor).unwrap();

        assert_eq!(record.name.as_str(), "example.com");
        assert_eq!(record.type_, RecordType::A);
        assert_eq!(record.ttl, 300);
        assert_eq!(record.address(), Some(Ipv4Addr::new(93, 184, 216, 34)));
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn decodes_compressed_cname_target() {
        // "cdn.net" at offset 0, record owned by "www" + pointer, rdata "edge" + pointer
        let mut raw = b"\x03cdn\x03net\x00".to_vec();
        let start = raw.len();
        raw.extend(header_bytes(b"\x03www\xc0\x00", 5, 60, 7));
        raw.extend_from_slice(b"\x04edge\xc0\x00");

        let mut cursor = WireCursor::new(&raw);
        cursor.set_position(start);
        let record = ResourceRecord::from_bytes(&mut cursor).unwrap();

        assert_eq!(record.name.as_str(), "www.cdn.net");
        assert_eq!(record.data, RecordData::Cname(Name::new("edge.cdn.net")));
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn rejects_rdlength_past_end() {
        let mut raw = header_bytes(b"\x03com\x00", 1, 60, 40);
        raw.extend_from_slice(&[1, 2, 3, 4]);

        assert_eq!(
            ResourceRecord::from_bytes(&mut WireCursor::new(&raw)),
            Err(DnsError::RdataOverrun {
                rdlength: 40,
                remaining: 4
            })
        );
    }

    #[test]
    fn rejects_short_a_rdata() {
        let mut raw = header_bytes(b"\x03com\x00", 1, 60, 3);
        raw.extend_from_slice(&[1, 2, 3]);

        assert!(matches!(
            ResourceRecord::from_bytes(&mut WireCursor::new(&raw)),
            Err(DnsError::BadRdataLength { .. })
        ));
    }

    #[test]
    fn ns_rdata_must_end_inside_rdlength() {
        let mut raw = header_bytes(b"\x03com\x00", 2, 60, 2);
        raw.extend_from_slice(b"\x02ns\x00");

        assert!(ResourceRecord::from_bytes(&mut WireCursor::new(&raw)).is_err());
    }

    #[test]
    fn keeps_unknown_rdata_opaque() {
        let mut raw = header_bytes(b"\x03com\x00", 99, 60, 3);
        raw.extend_from_slice(&[7, 8, 9, 0xff]);

        let mut cursor = WireCursor::new(&raw);
        let record = ResourceRecord::from_bytes(&mut cursor).unwrap();

        assert_eq!(record.type_, RecordType::Unknown(99));
        assert_eq!(record.data, RecordData::Other(Bytes::from_static(&[7, 8, 9])));
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn encodes_rdlength_from_data() {
        let record = ResourceRecord::ns(Name::new("com"), 172800, Name::new("a.gtld-servers.net"));
        let encoded = record.to_bytes().unwrap();

        let decoded = ResourceRecord::from_bytes(&mut WireCursor::new(&encoded)).unwrap();
        assert_eq!(decoded, record);
    }
}
