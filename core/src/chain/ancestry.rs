// HeaderAncestryView: an immutable, height-indexed snapshot of one branch of
// the timechain, rooted at a tip handle. Consensus rule predicates use it to
// look up ancestor timestamps (and any other height-indexed ancestor
// attribute) without holding a reference into the live timechain.

use timechain_common::crypto::Hash;
use timechain_common::work::Work;

use super::context::HeaderContext;

#[derive(Clone, Debug)]
struct AncestorRecord {
    hash: Hash,
    timestamp: u32,
    work: Work,
    total_work: Work,
}

/// A snapshot of ancestor attributes by height, from the root (height 0) to
/// a specific tip (height `H`). Constructing a view walks the parent chain
/// once; every lookup after that is O(1).
#[derive(Clone, Debug)]
pub struct HeaderAncestryView {
    // Indexed by height: by_height[h] is the ancestor at height h.
    by_height: Vec<AncestorRecord>,
}

impl HeaderAncestryView {
    pub(crate) fn from_tip(tip: &HeaderContext) -> Self {
        let mut records = Vec::with_capacity(tip.height() as usize + 1);
        records.push(AncestorRecord {
            hash: *tip.hash(),
            timestamp: tip.header().timestamp,
            work: tip.work(),
            total_work: tip.total_work(),
        });

        let mut current = tip.parent();
        while let Some(ctx) = current {
            records.push(AncestorRecord {
                hash: *ctx.hash(),
                timestamp: ctx.header().timestamp,
                work: ctx.work(),
                total_work: ctx.total_work(),
            });
            current = ctx.parent();
        }

        records.reverse(); // now indexed by height, root first
        Self { by_height: records }
    }

    /// The height of the tip this view is rooted at.
    pub fn tip_height(&self) -> u64 {
        (self.by_height.len() - 1) as u64
    }

    pub fn timestamp_at(&self, height: u64) -> Option<u32> {
        self.by_height.get(height as usize).map(|r| r.timestamp)
    }

    pub fn hash_at(&self, height: u64) -> Option<Hash> {
        self.by_height.get(height as usize).map(|r| r.hash)
    }

    pub fn work_at(&self, height: u64) -> Option<Work> {
        self.by_height.get(height as usize).map(|r| r.work)
    }

    pub fn total_work_at(&self, height: u64) -> Option<Work> {
        self.by_height.get(height as usize).map(|r| r.total_work)
    }

    /// The `n-1` most recent timestamps ending at (and including) the tip,
    /// i.e. heights `[H-n+2 .. H]`. For `n=2` this returns a single entry:
    /// the tip's own timestamp. See DESIGN.md for why this particular
    /// reading of the ambiguous "last N timestamps" contract was chosen.
    pub fn last_n_timestamps(&self, n: u64) -> Vec<u32> {
        let window_len = n.saturating_sub(1);
        if window_len == 0 {
            return Vec::new();
        }

        let tip_height = self.tip_height();
        let lo = tip_height.saturating_sub(window_len - 1);
        (lo..=tip_height)
            .filter_map(|h| self.timestamp_at(h))
            .collect()
    }
}
