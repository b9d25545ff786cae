// Minimal stand-in for the external `protocol::Block` the timechain core
// consumes only through `Read`/`Write` (see the block file format). The
// core does not interpret a block's body; it only appends and retrieves
// whatever bytes this type serializes.

use crate::header::BlockHeader;
use crate::serializer::{Reader, ReaderError, Serializer, Writer};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub body: Vec<u8>,
}

impl Block {
    pub fn new(header: BlockHeader, body: Vec<u8>) -> Self {
        Self { header, body }
    }
}

impl Serializer for Block {
    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let header = BlockHeader::read(reader)?;
        let body_len = reader.read_u64_as_usize()?;
        let body = reader.read_bytes(body_len)?;
        Ok(Self { header, body })
    }

    fn write(&self, writer: &mut Writer) {
        self.header.write(writer);
        writer.write_u64(self.body.len() as u64);
        writer.write_bytes(&self.body);
    }

    fn size(&self) -> usize {
        self.header.size() + 8 + self.body.len()
    }
}
