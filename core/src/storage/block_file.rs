// Bit-exact append-writer and random-access reader for a file of serialized
// blocks with an index footer:
//
//   offset 0:   i32   version        (== 1)
//   offset 4:   i64   index_offset   (byte offset of the footer)
//   offset 12:  block_0 .. block_{N-1}, back to back
//   offset I:   u32   count          (== N)
//   offset I+4: i64   offset_0 .. offset_{N-1}
//
// The writer reserves the 12-byte prefix as zeros at construction and
// rewrites it once the footer has been appended, on an explicit `close()`
// or best-effort in `Drop`. The reader validates the prefix up front and
// loads the offset table (plus one sentinel equal to `index_offset`, used
// to verify each read lands exactly on the next block's start).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use timechain_common::block::Block;
use timechain_common::serializer::{Reader, Serializer, Writer};

use super::error::BlockFileError;

const PREFIX_SIZE: u64 = 12;
const FORMAT_VERSION: i32 = 1;

pub struct BlockFileWriter {
    file: File,
    offsets: Vec<i64>,
    closed: bool,
}

impl BlockFileWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, BlockFileError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(BlockFileError::FileOpenError)?;

        file.write_all(&[0u8; PREFIX_SIZE as usize])?;

        Ok(Self {
            file,
            offsets: Vec::new(),
            closed: false,
        })
    }

    /// Appends a block, recording its start offset for the footer.
    pub fn append(&mut self, block: &Block) -> Result<(), BlockFileError> {
        let offset = self.file.stream_position()? as i64;
        let bytes = block.to_bytes();
        self.file.write_all(&bytes)?;
        self.offsets.push(offset);
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.offsets.len()
    }

    /// Emits the footer and rewrites the prefix. Explicit and checked,
    /// unlike the destructor's best-effort finalization.
    pub fn close(mut self) -> Result<(), BlockFileError> {
        self.finalize()
    }

    fn finalize(&mut self) -> Result<(), BlockFileError> {
        if self.closed {
            return Ok(());
        }

        let index_offset = self.file.stream_position()? as i64;

        let mut footer = Writer::with_capacity(4 + 8 * self.offsets.len());
        footer.write_u32(self.offsets.len() as u32);
        for offset in &self.offsets {
            footer.write_i64(*offset);
        }
        self.file.write_all(footer.bytes())?;

        let mut prefix = Writer::with_capacity(PREFIX_SIZE as usize);
        prefix.write_i32(FORMAT_VERSION);
        prefix.write_i64(index_offset);
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(prefix.bytes())?;
        self.file.flush()?;

        self.closed = true;
        Ok(())
    }
}

impl Drop for BlockFileWriter {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.finalize() {
                log::error!("block file destructor failed to finalize footer: {err}");
            }
        }
    }
}

pub struct BlockFileReader {
    file: File,
    // offsets[0..N) are block start offsets; offsets[N] is the sentinel,
    // equal to index_offset, so reading block N-1 can be bounds-checked the
    // same way as every other block.
    offsets: Vec<i64>,
}

impl BlockFileReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BlockFileError> {
        let mut file = File::open(path).map_err(BlockFileError::FileOpenError)?;

        let mut prefix_bytes = [0u8; PREFIX_SIZE as usize];
        file.read_exact(&mut prefix_bytes)?;
        let mut reader = Reader::new(&prefix_bytes);
        let version = reader.read_i32()?;
        let index_offset = reader.read_i64()?;

        if version != FORMAT_VERSION {
            return Err(BlockFileError::UnsupportedVersionError(version));
        }

        let file_len = file.metadata()?.len();
        file.seek(SeekFrom::Start(index_offset as u64))?;
        let mut count_bytes = [0u8; 4];
        file.read_exact(&mut count_bytes)?;

        // A corrupt or truncated footer can claim a count the rest of the
        // file has no room for; narrow it down to what the remaining bytes
        // could actually hold before trusting it as an allocation size.
        let remaining_after_count = file_len.saturating_sub(index_offset as u64 + 4);
        let max_count = (remaining_after_count / 8) as i128;
        let count =
            Reader::new(&count_bytes).read_u32_checked(0, max_count)? as usize;

        let mut offsets = Vec::with_capacity(count + 1);
        let mut offset_bytes = vec![0u8; count * 8];
        file.read_exact(&mut offset_bytes)?;
        let mut offset_reader = Reader::new(&offset_bytes);
        for _ in 0..count {
            offsets.push(offset_reader.read_i64()?);
        }
        offsets.push(index_offset);

        Ok(Self { file, offsets })
    }

    pub fn size(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Parses the block at ordinal `index`, restoring the stream position
    /// before returning. Fails if the block's bytes don't end exactly at
    /// the next recorded offset.
    pub fn get(&mut self, index: usize) -> Result<Block, BlockFileError> {
        if index >= self.size() {
            return Err(BlockFileError::IndexOutOfRangeError {
                index,
                size: self.size(),
            });
        }

        let saved_position = self.file.stream_position()?;

        let start = self.offsets[index];
        let end = self.offsets[index + 1];
        if end < start {
            return Err(BlockFileError::CorruptFormatError(format!(
                "offset table is not monotonic at index {index}: {start} then {end}"
            )));
        }
        let len = (end - start) as usize;

        self.file.seek(SeekFrom::Start(start as u64))?;
        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf)?;

        let block = Block::from_bytes(&buf)?;

        self.file.seek(SeekFrom::Start(saved_position))?;
        Ok(block)
    }

    /// All blocks, in stored order.
    pub fn blocks(&mut self) -> Result<Vec<Block>, BlockFileError> {
        (0..self.size()).map(|i| self.get(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timechain_common::crypto::Hash;
    use timechain_common::header::BlockHeader;

    fn block(nonce: u32, body: Vec<u8>) -> Block {
        let header = BlockHeader::new(1, Hash::zero(), Hash::zero(), 0, 0x1d00ffff, nonce);
        Block::new(header, body)
    }

    #[test]
    fn round_trips_three_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.dat");

        let blocks = vec![
            block(1, vec![0xAA]),
            block(2, vec![0xBB, 0xBB]),
            block(3, vec![]),
        ];

        let mut writer = BlockFileWriter::create(&path).unwrap();
        for b in &blocks {
            writer.append(b).unwrap();
        }
        writer.close().unwrap();

        let mut reader = BlockFileReader::open(&path).unwrap();
        assert_eq!(reader.size(), 3);
        assert_eq!(reader.get(1).unwrap(), blocks[1]);
        assert_eq!(reader.blocks().unwrap(), blocks);
    }

    #[test]
    fn empty_file_round_trips_to_zero_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.dat");

        let writer = BlockFileWriter::create(&path).unwrap();
        writer.close().unwrap();

        let mut reader = BlockFileReader::open(&path).unwrap();
        assert_eq!(reader.size(), 0);
        assert_eq!(reader.blocks().unwrap(), Vec::new());
    }

    #[test]
    fn destructor_finalizes_footer_without_explicit_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dropped.dat");

        {
            let mut writer = BlockFileWriter::create(&path).unwrap();
            writer.append(&block(1, vec![1, 2, 3])).unwrap();
        }

        let mut reader = BlockFileReader::open(&path).unwrap();
        assert_eq!(reader.size(), 1);
        assert_eq!(reader.get(0).unwrap(), block(1, vec![1, 2, 3]));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oor.dat");

        let mut writer = BlockFileWriter::create(&path).unwrap();
        writer.append(&block(1, vec![])).unwrap();
        writer.close().unwrap();

        let mut reader = BlockFileReader::open(&path).unwrap();
        assert!(matches!(
            reader.get(5),
            Err(BlockFileError::IndexOutOfRangeError { index: 5, size: 1 })
        ));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("badversion.dat");

        {
            let mut writer = BlockFileWriter::create(&path).unwrap();
            writer.append(&block(1, vec![])).unwrap();
            writer.close().unwrap();
        }

        // Corrupt the version field in place.
        let mut file = OpenOptions::new().write(true).open(&path).unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        file.write_all(&2i32.to_le_bytes()).unwrap();
        drop(file);

        let err = BlockFileReader::open(&path).unwrap_err();
        assert!(matches!(err, BlockFileError::UnsupportedVersionError(2)));
    }

    #[test]
    fn footer_count_overstating_the_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truncated_footer.dat");

        {
            let mut writer = BlockFileWriter::create(&path).unwrap();
            writer.append(&block(1, vec![])).unwrap();
            writer.append(&block(2, vec![])).unwrap();
            writer.close().unwrap();
        }

        // Claim 1000 offsets while leaving only two recorded in the file;
        // the narrowing count read should reject it before it turns into a
        // giant allocation or an out-of-bounds offset read.
        let mut file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let mut prefix_bytes = [0u8; PREFIX_SIZE as usize];
        file.seek(SeekFrom::Start(0)).unwrap();
        file.read_exact(&mut prefix_bytes).unwrap();
        let mut reader = Reader::new(&prefix_bytes);
        reader.read_i32().unwrap();
        let index_offset = reader.read_i64().unwrap();
        file.seek(SeekFrom::Start(index_offset as u64)).unwrap();
        file.write_all(&1000u32.to_le_bytes()).unwrap();
        drop(file);

        let err = BlockFileReader::open(&path).unwrap_err();
        assert!(matches!(err, BlockFileError::CorruptFormatError(_)));
    }
}
