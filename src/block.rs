use std::collections::HashMap;

/// Number of items covered by one cached block.
pub const DEFAULT_BLOCK_SIZE: usize = 1000;

/// Fallback-height drift beyond which every cached entry is discarded.
///
/// Unmeasured items contribute the current average height to every block, so
/// a drifting average silently staleness-poisons the whole prefix, not just
/// the blocks behind the lowest touched index.
pub const AVERAGE_EPSILON: f64 = 1e-3;

/// A read-only view of a ledger's height data, as the block cache consumes it.
///
/// `height_or_fallback` is the single lookup rule shared by every offset
/// computation: a measured height when one exists, the fallback otherwise.
#[derive(Clone, Copy, Debug)]
pub struct HeightsView<'a> {
    heights: &'a HashMap<usize, f64>,
    item_len: usize,
    fallback: f64,
}

impl<'a> HeightsView<'a> {
    pub fn new(heights: &'a HashMap<usize, f64>, item_len: usize, fallback: f64) -> Self {
        Self {
            heights,
            item_len,
            fallback,
        }
    }

    pub fn item_len(&self) -> usize {
        self.item_len
    }

    pub fn fallback(&self) -> f64 {
        self.fallback
    }

    pub fn height_or_fallback(&self, index: usize) -> f64 {
        self.heights.get(&index).copied().unwrap_or(self.fallback)
    }
}

/// Truncate-on-invalidate prefix sums over fixed-size index blocks.
///
/// Entry `b` holds the total height of items `[0, (b + 1) * block_size)`, so a
/// full cache carries `ceil(item_len / block_size) - 1` entries (the final,
/// possibly partial, block is never cached). Offset queries take the previous
/// block's entry as a base and walk at most `block_size` items linearly, which
/// bounds both query cost and per-mutation maintenance independently of list
/// size.
///
/// The cache rebuilds lazily on the first query after an invalidation, and
/// only the discarded tail: unaffected prefix entries are reused as-is.
/// [`version`](Self::version) changes exactly when the cached entries change,
/// which lets callers detect "nothing moved" without comparing contents.
#[derive(Clone, Debug)]
pub struct BlockSumCache {
    sums: Vec<f64>,
    block_size: usize,
    /// The fallback height the current entries were built with.
    built_fallback: f64,
    version: u64,
}

impl Default for BlockSumCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockSumCache {
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// A cache with a custom block size. Sizes below 1 are clamped to 1.
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            sums: Vec::new(),
            block_size: block_size.max(1),
            built_fallback: 0.0,
            version: 0,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Changes whenever the cached entries change; stable across no-op queries.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Discards every cached entry at or after `index`'s owning block.
    ///
    /// Truncates rather than clears, so queries after a localized mutation
    /// reuse the untouched prefix.
    pub fn invalidate_from(&mut self, index: usize) {
        let block = index / self.block_size;
        if block < self.sums.len() {
            ltrace!(index, block, "BlockSumCache::invalidate_from");
            self.sums.truncate(block);
            self.version = self.version.wrapping_add(1);
        }
    }

    /// Returns the current prefix sums, rebuilding only the discarded tail.
    pub fn sums(&mut self, view: &HeightsView<'_>) -> &[f64] {
        let max = self.max_entries(view.item_len());
        self.ensure_through(max, view);
        &self.sums
    }

    /// Offset of `index`'s leading edge from the start of the content.
    ///
    /// Returns 0 for index 0; `index >= item_len` yields the total height.
    /// O(block_size) per call once the needed prefix entries exist.
    pub fn offset_of(&mut self, index: usize, view: &HeightsView<'_>) -> f64 {
        if index == 0 || view.item_len() == 0 {
            return 0.0;
        }
        let index = index.min(view.item_len());
        // The final (possibly partial) block is never cached, so clamp the
        // owning block to the cacheable range and walk the rest linearly.
        let block = (index / self.block_size).min(self.max_entries(view.item_len()));
        self.ensure_through(block, view);

        let mut offset = if block == 0 {
            0.0
        } else {
            self.sums[block - 1]
        };
        for i in (block * self.block_size)..index {
            offset += view.height_or_fallback(i);
        }
        offset
    }

    /// Number of complete-block entries a full cache holds for `item_len`.
    fn max_entries(&self, item_len: usize) -> usize {
        if item_len == 0 {
            return 0;
        }
        item_len.div_ceil(self.block_size) - 1
    }

    /// Makes the first `needed` entries valid, truncating or extending the
    /// cached tail as required.
    fn ensure_through(&mut self, needed: usize, view: &HeightsView<'_>) {
        // A drifted fallback invalidates even the untouched prefix.
        if (view.fallback() - self.built_fallback).abs() > AVERAGE_EPSILON {
            if !self.sums.is_empty() {
                ldebug!(
                    fallback = view.fallback(),
                    built = self.built_fallback,
                    "BlockSumCache: fallback drift, full rebuild"
                );
                self.sums.clear();
                self.version = self.version.wrapping_add(1);
            }
            self.built_fallback = view.fallback();
        }

        let max = self.max_entries(view.item_len());
        if self.sums.len() > max {
            self.sums.truncate(max);
            self.version = self.version.wrapping_add(1);
        }

        let target = needed.min(max);
        if self.sums.len() >= target {
            return;
        }

        let mut running = self.sums.last().copied().unwrap_or(0.0);
        while self.sums.len() < target {
            let block = self.sums.len();
            let start = block * self.block_size;
            let end = start + self.block_size;
            for i in start..end {
                running += view.height_or_fallback(i);
            }
            self.sums.push(running);
        }
        self.version = self.version.wrapping_add(1);
    }
}
