// Fixed-size block header: the unit the timechain stores and chains on.
//
// The 80-byte wire layout (version, previous, merkle_root, timestamp,
// compact_target, nonce) mirrors the classic single-parent header shape;
// its self-hash is the double-SHA256 of exactly those 80 bytes.

use serde::{Deserialize, Serialize};

use crate::crypto::{double_sha256, Hash, Hashable};
use crate::serializer::{Reader, ReaderError, Serializer, Writer};

pub const HEADER_SIZE: usize = 4 + 32 + 32 + 4 + 4 + 4;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    pub previous: Hash,
    pub merkle_root: Hash,
    pub timestamp: u32,
    pub compact_target: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub fn new(
        version: i32,
        previous: Hash,
        merkle_root: Hash,
        timestamp: u32,
        compact_target: u32,
        nonce: u32,
    ) -> Self {
        Self {
            version,
            previous,
            merkle_root,
            timestamp,
            compact_target,
            nonce,
        }
    }

    /// Deterministic self-hash: double-SHA256 of the 80-byte serialized form.
    pub fn compute_hash(&self) -> Hash {
        self.hash()
    }
}

impl Serializer for BlockHeader {
    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        let version = reader.read_i32()?;
        let previous = reader.read_hash()?;
        let merkle_root = reader.read_hash()?;
        let timestamp = reader.read_u32()?;
        let compact_target = reader.read_u32()?;
        let nonce = reader.read_u32()?;

        Ok(Self {
            version,
            previous,
            merkle_root,
            timestamp,
            compact_target,
            nonce,
        })
    }

    fn write(&self, writer: &mut Writer) {
        writer.write_i32(self.version);
        writer.write_hash(&self.previous);
        writer.write_hash(&self.merkle_root);
        writer.write_u32(self.timestamp);
        writer.write_u32(self.compact_target);
        writer.write_u32(self.nonce);
    }

    fn size(&self) -> usize {
        HEADER_SIZE
    }
}

impl Hashable for BlockHeader {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(nonce: u32, previous: Hash) -> BlockHeader {
        BlockHeader::new(1, previous, Hash::zero(), 0, 0x1d00ffff, nonce)
    }

    #[test]
    fn serialized_form_is_exactly_80_bytes() {
        let header = sample(1, Hash::zero());
        assert_eq!(header.to_bytes().len(), HEADER_SIZE);
        assert_eq!(header.size(), HEADER_SIZE);
    }

    #[test]
    fn round_trips_through_wire_codec() {
        let header = sample(42, double_sha256(b"parent"));
        let bytes = header.to_bytes();
        let decoded = BlockHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn self_hash_changes_with_nonce() {
        let a = sample(1, Hash::zero());
        let b = sample(2, Hash::zero());
        assert_ne!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn self_hash_is_deterministic() {
        let header = sample(7, Hash::zero());
        assert_eq!(header.compute_hash(), header.compute_hash());
    }
}
