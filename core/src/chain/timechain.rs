// HeaderTimechain: branching header store with heaviest-chain tracking.
//
// Headers form a forest of Arc-linked HeaderContexts rooted at genesis.
// `active_chain` materializes the path from root to the current heaviest
// tip as a height-indexed vector so ancestry lookups and length queries are
// O(1); it is the only piece of state a reorg touches besides the tip
// pointer itself; every other HeaderContext, once inserted, never changes.

use std::collections::HashMap;
use std::sync::Arc;

use timechain_common::crypto::Hash;

use super::ancestry::HeaderAncestryView;
use super::context::{HeaderContext, HeaderHandle, PendingHeader};
use super::error::{PreconditionError, TimechainError};

pub struct HeaderTimechain {
    by_hash: HashMap<Hash, Arc<HeaderContext>>,
    root: Option<Arc<HeaderContext>>,
    heaviest_tip: Option<Arc<HeaderContext>>,
    active_chain: Vec<Arc<HeaderContext>>,
}

impl Default for HeaderTimechain {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderTimechain {
    pub fn new() -> Self {
        Self {
            by_hash: HashMap::new(),
            root: None,
            heaviest_tip: None,
            active_chain: Vec::new(),
        }
    }

    /// Insert the genesis header. May be called at most once; the first
    /// call establishes the root and the initial heaviest tip.
    pub fn add_genesis(&mut self, pending: PendingHeader) -> Result<HeaderHandle, TimechainError> {
        if self.root.is_some() {
            return Err(PreconditionError::GenesisAlreadyPresent.into());
        }

        let ctx = HeaderContext::genesis(pending)?;
        self.by_hash.insert(*ctx.hash(), Arc::clone(&ctx));
        self.root = Some(Arc::clone(&ctx));
        self.heaviest_tip = Some(Arc::clone(&ctx));
        self.active_chain = vec![Arc::clone(&ctx)];

        log::debug!("inserted genesis header {}", ctx.hash());
        Ok(HeaderHandle::new(ctx))
    }

    /// Insert a non-genesis header whose parent is already in the chain.
    /// Marks the new header as the heaviest tip iff its total_work is
    /// strictly greater than the incumbent's (ties retain the incumbent).
    pub fn add(
        &mut self,
        pending: PendingHeader,
        parent_handle: &HeaderHandle,
    ) -> Result<HeaderHandle, TimechainError> {
        let parent = parent_handle
            .arc()
            .filter(|p| self.by_hash.contains_key(p.hash()))
            .ok_or(PreconditionError::UnknownParent)?;
        let parent = Arc::clone(parent);

        let ctx = HeaderContext::child(pending, &parent)?;

        self.by_hash.insert(*ctx.hash(), Arc::clone(&ctx));

        let current_tip_work = self
            .heaviest_tip
            .as_ref()
            .map(|t| t.total_work())
            .expect("genesis must be inserted before any child header");

        if ctx.total_work() > current_tip_work {
            log::debug!(
                "reorg: new tip {} (total_work {}) supersedes previous tip",
                ctx.hash(),
                ctx.total_work()
            );
            self.active_chain = self.rebuild_active_chain(&ctx);
            self.heaviest_tip = Some(Arc::clone(&ctx));
        }

        Ok(HeaderHandle::new(ctx))
    }

    fn rebuild_active_chain(&self, new_tip: &Arc<HeaderContext>) -> Vec<Arc<HeaderContext>> {
        let mut climbed = Vec::new();
        let mut current = Arc::clone(new_tip);

        loop {
            let height = current.height() as usize;
            if height < self.active_chain.len() && self.active_chain[height].hash() == current.hash()
            {
                break;
            }

            climbed.push(Arc::clone(&current));
            match current.parent() {
                Some(parent) => current = Arc::clone(parent),
                None => break,
            }
        }

        let lca_height = current.height() as usize;
        let mut chain: Vec<Arc<HeaderContext>> = self.active_chain[..=lca_height].to_vec();
        climbed.reverse();
        chain.extend(climbed);
        chain
    }

    /// Returns a handle (valid iff `hash` is stored) and, when valid, a
    /// clone of the stored context.
    pub fn find(&self, hash: &Hash) -> (HeaderHandle, Option<HeaderContext>) {
        match self.by_hash.get(hash) {
            Some(ctx) => (HeaderHandle::new(Arc::clone(ctx)), Some((**ctx).clone())),
            None => (HeaderHandle::invalid(), None),
        }
    }

    pub fn heaviest_tip(&self) -> Option<&HeaderContext> {
        self.heaviest_tip.as_deref()
    }

    pub fn get_heaviest_tip_height(&self) -> Option<u64> {
        self.heaviest_tip.as_ref().map(|t| t.height())
    }

    pub fn get_heaviest_length(&self) -> u64 {
        self.get_heaviest_tip_height().map(|h| h + 1).unwrap_or(0)
    }

    pub fn get_validation_view(
        &self,
        tip_handle: &HeaderHandle,
    ) -> Result<HeaderAncestryView, TimechainError> {
        let ctx = tip_handle.context().ok_or(TimechainError::InvalidHandle)?;
        Ok(HeaderAncestryView::from_tip(ctx))
    }

    /// The heaviest tip's own ancestry view; a convenience for callers that
    /// always validate against the current head of the active chain.
    pub fn heaviest_validation_view(&self) -> Option<HeaderAncestryView> {
        self.heaviest_tip.as_deref().map(HeaderAncestryView::from_tip)
    }

    /// Ancestor at `height` on the active chain, or `None` if out of range.
    pub fn active_chain_at(&self, height: u64) -> Option<&HeaderContext> {
        self.active_chain.get(height as usize).map(|a| a.as_ref())
    }
}
