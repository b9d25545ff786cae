use std::sync::Arc;
use std::thread;

use timechain_common::crypto::Hash;
use timechain_common::header::BlockHeader;
use timechain_common::sync::PrioritySharedMutex;
use timechain_common::work::Work;

use timechain_core::chain::{HeaderTimechain, PendingHeader};
use timechain_core::storage::{BlockFileReader, BlockFileWriter};

fn header(previous: Hash, ts: u32, nonce: u32) -> BlockHeader {
    BlockHeader::new(1, previous, Hash::zero(), ts, 0x1d00ffff, nonce)
}

fn pending(previous: Hash, work: u64, total_work: u64, height: u64, nonce: u32) -> PendingHeader {
    PendingHeader::new(
        header(previous, height as u32, nonce),
        Work::from(work),
        Work::from(total_work),
        height,
    )
}

#[test]
fn ancestry_view_reflects_heaviest_chain_after_reorg() {
    let mut chain = HeaderTimechain::new();
    let genesis = chain
        .add_genesis(pending(Hash::zero(), 1, 1, 0, 1))
        .unwrap();
    let c1 = chain
        .add(pending(*genesis.hash(), 1, 2, 1, 2), &genesis)
        .unwrap();
    let _c2 = chain.add(pending(*c1.hash(), 1, 3, 2, 3), &c1).unwrap();

    let heavy = chain
        .add(pending(*genesis.hash(), 5, 6, 1, 20), &genesis)
        .unwrap();

    let view = chain.get_validation_view(&heavy).unwrap();
    assert_eq!(view.tip_height(), 1);
    assert_eq!(view.hash_at(0), Some(*genesis.hash()));
    assert_eq!(view.hash_at(1), Some(*heavy.hash()));

    let heaviest_view = chain.heaviest_validation_view().unwrap();
    assert_eq!(heaviest_view.hash_at(1), Some(*heavy.hash()));
}

#[test]
fn shared_timechain_under_priority_mutex_serves_concurrent_readers_and_a_writer() {
    let _ = env_logger::try_init();

    let mutex = Arc::new(PrioritySharedMutex::new(HeaderTimechain::new()));
    {
        let mut guard = mutex.write();
        guard
            .add_genesis(pending(Hash::zero(), 1, 1, 0, 1))
            .unwrap();
    }

    let mut writer_handles = Vec::new();
    for i in 1..=5u32 {
        let mutex = Arc::clone(&mutex);
        writer_handles.push(thread::spawn(move || {
            let parent_hash = {
                let guard = mutex.read();
                *guard.heaviest_tip().unwrap().hash()
            };
            loop {
                let mut guard = mutex.write();
                let (parent_handle, _) = guard.find(&parent_hash);
                if !parent_handle.is_valid() {
                    continue;
                }
                let height = parent_handle.get_height().unwrap() + 1;
                let total_work = parent_handle.context().unwrap().total_work() + Work::from(1u64);
                guard
                    .add(
                        pending(parent_hash, 1, total_work.as_u64(), height, 100 + i),
                        &parent_handle,
                    )
                    .unwrap();
                break;
            }
        }));
    }

    for handle in writer_handles {
        handle.join().unwrap();
    }

    let guard = mutex.read();
    assert_eq!(guard.get_heaviest_length(), 2);
}

#[test]
fn block_file_persists_blocks_for_headers_accepted_into_the_timechain() {
    use timechain_common::block::Block;
    use timechain_common::serializer::Serializer;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accepted.blk");

    let mut chain = HeaderTimechain::new();
    let genesis_header = header(Hash::zero(), 0, 1);
    let genesis = chain
        .add_genesis(PendingHeader::new(
            genesis_header.clone(),
            Work::from(1u64),
            Work::from(1u64),
            0,
        ))
        .unwrap();

    let mut writer = BlockFileWriter::create(&path).unwrap();
    writer
        .append(&Block::new(genesis_header.clone(), vec![0xEE]))
        .unwrap();
    writer.close().unwrap();

    assert!(chain.find(genesis.hash()).0.is_valid());

    let mut reader = BlockFileReader::open(&path).unwrap();
    assert_eq!(reader.size(), 1);
    let stored = reader.get(0).unwrap();
    assert_eq!(stored.header.to_bytes(), genesis_header.to_bytes());
}
