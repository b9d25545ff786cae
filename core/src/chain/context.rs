// HeaderContext: the immutable per-header record the timechain stores, and
// HeaderHandle: a stable, cheap-to-clone reference into the timechain.
//
// Contexts are arranged as a tree of `Arc`s, each one holding a strong
// reference to its parent. That gives two things for free: stable
// addresses (an Arc's allocation never moves, so a handle stays valid for
// the life of the timechain even as siblings are inserted around it) and an
// O(depth) parent-walk for lowest-common-ancestor reorg logic without a
// separate arena/index table.

use std::ops::Deref;
use std::sync::Arc;

use timechain_common::crypto::Hash;
use timechain_common::header::BlockHeader;
use timechain_common::work::Work;

use super::error::PreconditionError;

/// Caller-supplied description of a header to insert. The timechain fills
/// in the cached hash and, for non-genesis headers, the parent link; the
/// caller is responsible for `work`/`total_work`/`height` being consistent
/// with the rest of the chain (violations surface as `PreconditionError`).
#[derive(Clone, Debug)]
pub struct PendingHeader {
    pub header: BlockHeader,
    pub work: Work,
    pub total_work: Work,
    pub height: u64,
}

impl PendingHeader {
    pub fn new(header: BlockHeader, work: Work, total_work: Work, height: u64) -> Self {
        Self {
            header,
            work,
            total_work,
            height,
        }
    }
}

/// Immutable bundle stored in the timechain for each header. Born by `Add`,
/// never mutated, destroyed only with the timechain itself.
#[derive(Clone, Debug)]
pub struct HeaderContext {
    pub(crate) header: BlockHeader,
    pub(crate) hash: Hash,
    pub(crate) work: Work,
    pub(crate) total_work: Work,
    pub(crate) height: u64,
    pub(crate) parent: Option<Arc<HeaderContext>>,
}

impl HeaderContext {
    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    pub fn work(&self) -> Work {
        self.work
    }

    pub fn total_work(&self) -> Work {
        self.total_work
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn parent(&self) -> Option<&Arc<HeaderContext>> {
        self.parent.as_ref()
    }

    pub(crate) fn genesis(pending: PendingHeader) -> Result<Arc<Self>, PreconditionError> {
        if pending.height != 0 {
            return Err(PreconditionError::HeightMismatch {
                given: pending.height,
                expected: 0,
            });
        }
        let hash = pending.header.compute_hash();
        Ok(Arc::new(Self {
            header: pending.header,
            hash,
            work: pending.work,
            total_work: pending.total_work,
            height: pending.height,
            parent: None,
        }))
    }

    pub(crate) fn child(
        pending: PendingHeader,
        parent: &Arc<HeaderContext>,
    ) -> Result<Arc<Self>, PreconditionError> {
        let hash = pending.header.compute_hash();

        if pending.header.previous != parent.hash {
            return Err(PreconditionError::ParentHashMismatch {
                previous: pending.header.previous,
                parent: parent.hash,
            });
        }

        let expected_total_work = parent.total_work + pending.work;
        if pending.total_work != expected_total_work {
            return Err(PreconditionError::TotalWorkMismatch {
                given: format!("{}", pending.total_work),
                expected: format!("{}", expected_total_work),
            });
        }

        let expected_height = parent.height + 1;
        if pending.height != expected_height {
            return Err(PreconditionError::HeightMismatch {
                given: pending.height,
                expected: expected_height,
            });
        }

        Ok(Arc::new(Self {
            header: pending.header,
            hash,
            work: pending.work,
            total_work: pending.total_work,
            height: pending.height,
            parent: Some(Arc::clone(parent)),
        }))
    }
}

/// A stable, opaque reference to a `HeaderContext`. Remains valid for the
/// lifetime of the timechain; headers are never removed, so a handle
/// obtained from `Find` or `Add` never dangles.
#[derive(Clone, Debug, Default)]
pub struct HeaderHandle(Option<Arc<HeaderContext>>);

impl HeaderHandle {
    pub(crate) fn new(ctx: Arc<HeaderContext>) -> Self {
        Self(Some(ctx))
    }

    pub fn invalid() -> Self {
        Self(None)
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    pub fn get_height(&self) -> Option<u64> {
        self.0.as_ref().map(|ctx| ctx.height)
    }

    pub fn context(&self) -> Option<&HeaderContext> {
        self.0.as_deref()
    }

    pub(crate) fn arc(&self) -> Option<&Arc<HeaderContext>> {
        self.0.as_ref()
    }
}

impl Deref for HeaderHandle {
    type Target = HeaderContext;

    /// Panics if the handle is invalid. Callers that cannot guarantee
    /// validity should check `is_valid()` (or use `context()`) first.
    fn deref(&self) -> &HeaderContext {
        self.0
            .as_deref()
            .expect("dereferenced an invalid HeaderHandle")
    }
}
