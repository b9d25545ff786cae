// 256-bit proof-of-work accumulator.
//
// Work is stored big-endian on the wire (matching the teacher's blue-work
// convention) even though primitive_types::U256 itself is little-endian
// limb order internally.

use primitive_types::U256;

use crate::serializer::{Reader, ReaderError, Serializer, Writer};

pub type Work = U256;

pub trait WorkWriter {
    fn write_work(&mut self, value: &Work);
}

pub trait WorkReader {
    fn read_work(&mut self) -> Result<Work, ReaderError>;
}

impl WorkWriter for Writer {
    fn write_work(&mut self, value: &Work) {
        let limbs = value.0;
        for limb in limbs.iter().rev() {
            self.write_u64(*limb);
        }
    }
}

impl<'a> WorkReader for Reader<'a> {
    fn read_work(&mut self) -> Result<Work, ReaderError> {
        let mut limbs = [0u64; 4];
        for limb in limbs.iter_mut().rev() {
            *limb = self.read_u64()?;
        }
        Ok(U256(limbs))
    }
}

pub struct WorkCodec(pub Work);

impl Serializer for WorkCodec {
    fn read(reader: &mut Reader) -> Result<Self, ReaderError> {
        Ok(WorkCodec(reader.read_work()?))
    }

    fn write(&self, writer: &mut Writer) {
        writer.write_work(&self.0);
    }

    fn size(&self) -> usize {
        32
    }
}

/// Convert a compact target (`bits` field of a header) into a 256-bit work
/// value, following the Bitcoin-style convention: work = (2^256 - target) /
/// (target + 1), approximated here as floor((2^256 - 1) / (target + 1)).
///
/// `bits` packs `(exponent << 24) | mantissa`, where the target equals
/// `mantissa * 256^(exponent - 3)`. A zero mantissa yields zero work.
pub fn work_from_compact_target(bits: u32) -> Work {
    let target = compact_to_target(bits);
    if target.is_zero() {
        return Work::zero();
    }

    let target_plus_one = target.saturating_add(Work::one());
    Work::max_value() / target_plus_one
}

/// Expand a compact target encoding into the full 256-bit target it denotes.
pub fn compact_to_target(bits: u32) -> U256 {
    let exponent = (bits >> 24) as usize;
    let mantissa = bits & 0x00FF_FFFF;

    if mantissa == 0 {
        return U256::zero();
    }

    if exponent <= 3 {
        U256::from(mantissa >> (8 * (3 - exponent)))
    } else {
        U256::from(mantissa) << (8 * (exponent - 3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_mantissa_has_zero_work() {
        assert_eq!(work_from_compact_target(0x00000000), Work::zero());
        assert_eq!(work_from_compact_target(0x03000000), Work::zero());
    }

    #[test]
    fn higher_target_is_less_work() {
        let easy = work_from_compact_target(0x1d00ffff);
        let hard = work_from_compact_target(0x1900ffff);
        assert!(hard > easy);
    }

    #[test]
    fn work_round_trips_through_wire_codec() {
        let work = Work::from(0x0102_0304_0506_0708u64) << 64 | Work::from(0xAABBu64);
        let bytes = WorkCodec(work).to_bytes();
        assert_eq!(bytes.len(), 32);
        let decoded = WorkCodec::from_bytes(&bytes).unwrap().0;
        assert_eq!(decoded, work);
    }

    #[test]
    fn work_addition_and_ordering() {
        let a = Work::from(1_000u64);
        let b = Work::from(2_000u64);
        assert_eq!(a + b, Work::from(3_000u64));
        assert!(a < b);
    }
}
