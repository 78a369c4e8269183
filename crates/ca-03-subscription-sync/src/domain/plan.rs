//! # Sync Planning
//!
//! Range arithmetic for one catch-up run.
//!
//! ```text
//!   resume_from        cache_height          head
//!       |-------- A --------|-------- B --------|---- C (live) ---->
//!             cached             recent
//! ```

use shared_types::BlockNumber;

use crate::config::SyncConfig;

/// Inclusive block range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from: BlockNumber,
    pub to: BlockNumber,
}

impl BlockRange {
    /// `None` when `from > to`.
    #[must_use]
    pub fn new(from: BlockNumber, to: BlockNumber) -> Option<Self> {
        (from <= to).then_some(Self { from, to })
    }

    /// Number of blocks covered.
    #[must_use]
    pub fn block_count(&self) -> u64 {
        self.to - self.from + 1
    }

    /// Split into consecutive sub-ranges of at most `size` blocks.
    #[must_use]
    pub fn chunks(&self, size: u64) -> Vec<BlockRange> {
        let size = size.max(1);
        let mut chunks = Vec::new();
        let mut from = self.from;
        loop {
            let to = from.saturating_add(size - 1).min(self.to);
            chunks.push(BlockRange { from, to });
            if to == self.to {
                return chunks;
            }
            from = to + 1;
        }
    }
}

/// What one catch-up run fetches and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPlan {
    /// Chain head observed at the start of the run.
    pub head: BlockNumber,
    /// Height reported by the CACHED marker. Never below the prior record.
    pub cache_height: BlockNumber,
    /// Phase A: settled history not yet folded.
    pub cached_range: Option<BlockRange>,
    /// Phase B: recent history above the cache height.
    pub recent_range: Option<BlockRange>,
    /// First block the live subscription delivers.
    pub live_from: BlockNumber,
}

/// Plan a catch-up run.
///
/// `cached` is the height of a previously persisted record for the address.
#[must_use]
pub fn plan_sync(head: BlockNumber, cached: Option<BlockNumber>, config: &SyncConfig) -> SyncPlan {
    let safe_height = head.saturating_sub(config.reorg_safety_margin);
    let resume_from = cached.map_or(config.genesis_block, |c| c.saturating_add(1));
    let cached_range = BlockRange::new(resume_from, safe_height);

    let cache_height = cached.map_or(safe_height, |c| c.max(safe_height));
    let recent_from = cache_height.saturating_add(1).max(config.genesis_block);
    let recent_range = BlockRange::new(recent_from, head);

    SyncPlan {
        head,
        cache_height,
        cached_range,
        recent_range,
        live_from: head.max(cache_height).saturating_add(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(margin: u64, genesis: u64) -> SyncConfig {
        SyncConfig {
            reorg_safety_margin: margin,
            genesis_block: genesis,
            ..Default::default()
        }
    }

    #[test]
    fn test_fresh_start() {
        let plan = plan_sync(1000, None, &config(100, 0));
        assert_eq!(plan.cache_height, 900);
        assert_eq!(plan.cached_range, BlockRange::new(0, 900));
        assert_eq!(plan.recent_range, BlockRange::new(901, 1000));
        assert_eq!(plan.live_from, 1001);
    }

    #[test]
    fn test_resume_from_cached_height() {
        let plan = plan_sync(1000, Some(850), &config(100, 0));
        assert_eq!(plan.cached_range, BlockRange::new(851, 900));
        assert_eq!(plan.cache_height, 900);
    }

    #[test]
    fn test_short_chain_has_no_settled_history() {
        let plan = plan_sync(40, None, &config(100, 0));
        assert_eq!(plan.cache_height, 0);
        assert_eq!(plan.cached_range, BlockRange::new(0, 0));
        assert_eq!(plan.recent_range, BlockRange::new(1, 40));
    }

    #[test]
    fn test_cached_height_never_regresses() {
        // Restarted against a node whose head moved backwards.
        let plan = plan_sync(950, Some(900), &config(100, 0));
        assert_eq!(plan.cached_range, None);
        assert_eq!(plan.cache_height, 900);
        assert_eq!(plan.recent_range, BlockRange::new(901, 950));
        assert_eq!(plan.live_from, 951);
    }

    #[test]
    fn test_cached_above_head_skips_both_phases() {
        let plan = plan_sync(500, Some(700), &config(100, 0));
        assert_eq!(plan.cached_range, None);
        assert_eq!(plan.recent_range, None);
        assert_eq!(plan.cache_height, 700);
        assert_eq!(plan.live_from, 701);
    }

    #[test]
    fn test_genesis_above_cache_height() {
        let plan = plan_sync(1000, None, &config(100, 950));
        assert_eq!(plan.cached_range, None);
        assert_eq!(plan.recent_range, BlockRange::new(950, 1000));
    }

    #[test]
    fn test_chunks_cover_range_in_order() {
        let range = BlockRange::new(10, 34).unwrap();
        assert_eq!(
            range.chunks(10),
            vec![
                BlockRange { from: 10, to: 19 },
                BlockRange { from: 20, to: 29 },
                BlockRange { from: 30, to: 34 },
            ]
        );
        assert_eq!(range.block_count(), 25);
        assert_eq!(range.chunks(100).len(), 1);
    }
}
