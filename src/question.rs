use bytes::{BufMut, Bytes, BytesMut};
use tracing::instrument;

use super::{Name, Networkable};
use crate::{DnsError, RecordType, WireCursor, CLASS_IN};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: Name,
    pub type_: RecordType,
    pub class: u16,
}

impl Question {
    pub fn new(name: Name, type_: RecordType) -> Self {
        Self {
            name,
            type_,
            class: CLASS_IN,
        }
    }
}

impl Networkable for Question {
    #[instrument(level = "trace", skip_all)]
    fn to_bytes(&self) -> Result<Bytes, DnsError> {
        let name = self.name.to_bytes()?;
        let mut ret = BytesMut::with_capacity(name.len() + 4);

        ret.extend_from_slice(&name);
        ret.put_u16(self.type_.into());
        ret.put_u16(self.class);

        Ok(ret.into())
    }

    #[instrument(level = "trace", skip_all)]
    fn from_bytes(bytes: &mut WireCursor<'_>) -> Result<Self, DnsError> {
        let name = Name::from_bytes(bytes)?;
        let type_ = RecordType::from(bytes.get_u16()?);
        let class = bytes.get_u16()?;

        Ok(Self { name, type_, class })
    }
}
