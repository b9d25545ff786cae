use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    borrow::Cow,
    convert::TryInto,
    fmt::{Display, Error, Formatter},
    hash::Hasher,
    str::FromStr,
};

use crate::serializer::{Reader, ReaderError, Serializer, Writer};

pub const HASH_SIZE: usize = 32; // 32 bytes / 256 bits

#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Copy, Debug, Default)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    pub const fn zero() -> Self {
        Hash::new([0; HASH_SIZE])
    }

    pub const fn max() -> Self {
        Hash::new([u8::MAX; HASH_SIZE])
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; HASH_SIZE] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for Hash {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| "Invalid hex string")?;
        let bytes: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| "Invalid hash")?;
        Ok(Hash::new(bytes))
    }
}

/// Double-SHA256 of an arbitrary byte slice. This is the only hash primitive
/// the core and its collaborators use: header self-hashes, and anything that
/// derives a Hash from serialized bytes.
#[inline(always)]
pub fn double_sha256(value: &[u8]) -> Hash {
    let first = Sha256::digest(value);
    let second = Sha256::digest(first);
    Hash(second.into())
}

impl Serializer for Hash {
    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        reader.read_hash()
    }

    fn write(&self, writer: &mut Writer) {
        writer.write_hash(self);
    }

    fn size(&self) -> usize {
        HASH_SIZE
    }
}

impl std::hash::Hash for Hash {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl AsRef<Hash> for Hash {
    fn as_ref(&self) -> &Hash {
        self
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", &self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let hex = String::deserialize(deserializer)?;
        if hex.len() != HASH_SIZE * 2 {
            return Err(SerdeError::custom("Invalid hex length"));
        }

        let decoded_hex = hex::decode(hex).map_err(SerdeError::custom)?;
        let bytes: [u8; HASH_SIZE] = decoded_hex
            .try_into()
            .map_err(|_| SerdeError::custom("Could not transform hex to bytes array for Hash"))?;
        Ok(Hash::new(bytes))
    }
}

/// Implemented by any serializable value that derives its identity from the
/// double-SHA256 of its own wire encoding.
pub trait Hashable: Serializer {
    #[inline(always)]
    fn hash(&self) -> Hash {
        let bytes = self.to_bytes();
        double_sha256(&bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<'a> From<Hash> for Cow<'a, Hash> {
    fn from(hash: Hash) -> Self {
        Cow::Owned(hash)
    }
}

impl<'a> From<&'a Hash> for Cow<'a, Hash> {
    fn from(hash: &'a Hash) -> Self {
        Cow::Borrowed(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_sha256_is_deterministic() {
        let a = double_sha256(b"block header bytes");
        let b = double_sha256(b"block header bytes");
        assert_eq!(a, b);
    }

    #[test]
    fn double_sha256_differs_from_single_sha256() {
        let doubled = double_sha256(b"abc");
        let single: [u8; 32] = Sha256::digest(b"abc").into();
        assert_ne!(doubled.to_bytes(), single);
    }

    #[test]
    fn hash_round_trips_through_hex() {
        let hash = double_sha256(b"genesis");
        let hex = hash.to_hex();
        let parsed: Hash = hex.parse().unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn hash_round_trips_through_wire_codec() {
        let hash = double_sha256(b"round trip");
        let bytes = hash.to_bytes();
        let decoded = Hash::from_bytes(&bytes).unwrap();
        assert_eq!(hash, decoded);
    }

    #[test]
    fn hash_round_trips_through_json() {
        let hash = double_sha256(b"rpc response");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
        let decoded: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, decoded);
    }
}
