use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::block::{BlockSumCache, HeightsView};
use crate::scheduler::{RecomputeMode, RecomputeScheduler};
use crate::{HeightChange, LedgerStats};

/// Fired after derived aggregates have been recomputed.
pub type OnRecomputeCallback = Arc<dyn Fn(LedgerStats) + Send + Sync>;

/// Authoritative store of per-index measured heights plus running aggregates.
///
/// The ledger never rescans the list: every mutation is a delta against the
/// running sum and count, so cost is O(changed items) regardless of list
/// size. Derived values (`average_height`, `total_height`) are recomputed in
/// one pass per mutation batch, either synchronously or deferred depending on
/// the configured [`RecomputeMode`].
///
/// Heights are pixel sizes: finite and strictly positive. Anything else is
/// silently discarded (transient invalid measurements are expected during
/// layout thrashing and must not poison the aggregates).
#[derive(Clone)]
pub struct HeightLedger {
    /// Sparse measured heights. Absent entry = use `average_height`.
    heights: HashMap<usize, f64>,
    /// Per-index "measured since the last length change" flags.
    seen: Vec<bool>,
    item_len: usize,
    estimated_height: f64,

    total_measured: f64,
    measured_count: usize,
    average_height: f64,
    total_height: f64,

    blocks: RefCell<BlockSumCache>,
    scheduler: RecomputeScheduler,
    on_recompute: Option<OnRecomputeCallback>,
}

impl HeightLedger {
    /// Creates a ledger for `item_len` items with the given fallback height.
    ///
    /// A non-finite or non-positive `estimated_height` falls back to `1.0`.
    pub fn new(item_len: usize, estimated_height: f64, mode: RecomputeMode) -> Self {
        Self::with_block_size(item_len, estimated_height, mode, crate::DEFAULT_BLOCK_SIZE)
    }

    pub fn with_block_size(
        item_len: usize,
        estimated_height: f64,
        mode: RecomputeMode,
        block_size: usize,
    ) -> Self {
        let estimated_height = sanitize_height(estimated_height).unwrap_or(1.0);
        ldebug!(item_len, estimated_height, "HeightLedger::new");
        let mut ledger = Self {
            heights: HashMap::new(),
            seen: vec![false; item_len],
            item_len,
            estimated_height,
            total_measured: 0.0,
            measured_count: 0,
            average_height: estimated_height,
            total_height: 0.0,
            blocks: RefCell::new(BlockSumCache::with_block_size(block_size)),
            scheduler: RecomputeScheduler::new(mode),
            on_recompute: None,
        };
        ledger.recompute_now();
        ledger
    }

    /// Subscribes to "recompute finished" notifications.
    pub fn set_on_recompute(&mut self, on_recompute: Option<OnRecomputeCallback>) {
        self.on_recompute = on_recompute;
    }

    pub fn recompute_mode(&self) -> RecomputeMode {
        self.scheduler.mode()
    }

    pub fn item_len(&self) -> usize {
        self.item_len
    }

    pub fn estimated_height(&self) -> f64 {
        self.estimated_height
    }

    /// Measured average when anything is measured, else the estimated height.
    pub fn average_height(&self) -> f64 {
        self.average_height
    }

    /// Measured total plus `average_height` for every unmeasured item.
    pub fn total_height(&self) -> f64 {
        self.total_height
    }

    pub fn measured_count(&self) -> usize {
        self.measured_count
    }

    pub fn total_measured_height(&self) -> f64 {
        self.total_measured
    }

    /// Whether `index` has been measured since the last length change.
    pub fn is_measured(&self, index: usize) -> bool {
        self.seen.get(index).copied().unwrap_or(false)
    }

    /// Measured height of `index`, or the current average fallback.
    pub fn height_or_average(&self, index: usize) -> f64 {
        self.heights.get(&index).copied().unwrap_or(self.average_height)
    }

    /// A defensive copy of the measured heights.
    ///
    /// Mutating the returned map never affects the ledger.
    pub fn heights_snapshot(&self) -> HashMap<usize, f64> {
        self.heights.clone()
    }

    /// Read-only diagnostics snapshot of the aggregates.
    pub fn stats(&self) -> LedgerStats {
        let coverage_percent = if self.item_len > 0 {
            self.measured_count as f64 / self.item_len as f64 * 100.0
        } else {
            0.0
        };
        LedgerStats {
            total_measured_height: self.total_measured,
            measured_count: self.measured_count,
            item_len: self.item_len,
            coverage_percent,
            estimated_height: self.estimated_height,
            average_height: self.average_height,
            total_height: self.total_height,
        }
    }

    /// Applies a batch of height deltas.
    ///
    /// All changes are applied before derived values are recomputed, and the
    /// recompute is requested exactly once per call. Entries with an invalid
    /// `new_height` (non-finite or <= 0) are skipped individually; the rest
    /// of the batch still applies. The lowest touched index invalidates the
    /// block-sum cache minimally.
    pub fn apply_changes(&mut self, changes: &[HeightChange]) {
        let mut net_height = 0.0_f64;
        let mut net_count = 0_i64;
        let mut lowest: Option<usize> = None;

        for change in changes {
            if let Some(new_height) = change.new_height {
                if sanitize_height(new_height).is_none() {
                    lwarn!(
                        index = change.index,
                        new_height,
                        "discarding invalid measurement"
                    );
                    continue;
                }
            }

            if let Some(old_height) = change.old_height {
                self.total_measured -= old_height;
                self.measured_count = self.measured_count.saturating_sub(1);
                net_height -= old_height;
                net_count -= 1;
            }

            match change.new_height {
                Some(new_height) => {
                    self.heights.insert(change.index, new_height);
                    if let Some(flag) = self.seen.get_mut(change.index) {
                        *flag = true;
                    }
                    self.total_measured += new_height;
                    self.measured_count += 1;
                    net_height += new_height;
                    net_count += 1;
                }
                None => {
                    self.heights.remove(&change.index);
                    if let Some(flag) = self.seen.get_mut(change.index) {
                        *flag = false;
                    }
                }
            }

            lowest = Some(lowest.map_or(change.index, |l| l.min(change.index)));
        }

        let Some(lowest) = lowest else {
            return; // nothing applied
        };
        self.blocks.borrow_mut().invalidate_from(lowest);
        ltrace!(
            changes = changes.len(),
            lowest,
            net_height,
            net_count,
            "apply_changes"
        );

        // A batch whose heights cancel out leaves the totals untouched, so
        // immediate mode skips the recompute outright. Deferred mode still
        // recomputes when the measured count moved; unclear why the count
        // check only matters there, kept until proven otherwise.
        let skip = net_height == 0.0
            && match self.scheduler.mode() {
                RecomputeMode::Immediate => true,
                RecomputeMode::Deferred => net_count == 0,
            };
        if skip {
            return;
        }
        self.request_recompute();
    }

    /// Convenience path for one measurement with bounds checking.
    ///
    /// An index outside `[0, item_len)` or an invalid height is a silent
    /// no-op. The previous measurement, if any, is used as the old height.
    pub fn set_single_height(&mut self, index: usize, height: f64) {
        if index >= self.item_len {
            lwarn!(index, item_len = self.item_len, "set_single_height out of range");
            return;
        }
        if sanitize_height(height).is_none() {
            return;
        }
        let old_height = self.heights.get(&index).copied();
        self.apply_changes(&[HeightChange {
            index,
            old_height,
            new_height: Some(height),
        }]);
    }

    /// Resizes the list to `item_len` items.
    ///
    /// Shrinking drops measurements at indices past the new length, so the
    /// aggregates never carry a phantom tail. Resets the per-index seen flags
    /// and recomputes immediately, bypassing any deferral: consumers must see
    /// updated totals before the next paint when the list grows or shrinks.
    pub fn update_item_length(&mut self, item_len: usize) {
        let prev = self.item_len;
        ldebug!(prev, item_len, "update_item_length");
        self.item_len = item_len;
        if item_len < prev {
            let mut dropped_height = 0.0;
            let mut dropped = 0_usize;
            self.heights.retain(|&index, &mut height| {
                if index < item_len {
                    true
                } else {
                    dropped_height += height;
                    dropped += 1;
                    false
                }
            });
            self.total_measured -= dropped_height;
            self.measured_count -= dropped;
        }
        self.seen.clear();
        self.seen.resize(item_len, false);
        self.blocks.borrow_mut().invalidate_from(prev.min(item_len));
        let _ = self.scheduler.drain();
        self.recompute_now();
    }

    /// Changes the fallback height for unmeasured items.
    ///
    /// Invalid heights are ignored. The recompute goes through the scheduler.
    pub fn update_estimated_height(&mut self, estimated_height: f64) {
        let Some(estimated_height) = sanitize_height(estimated_height) else {
            return;
        };
        if estimated_height == self.estimated_height {
            return;
        }
        ldebug!(estimated_height, "update_estimated_height");
        self.estimated_height = estimated_height;
        self.request_recompute();
    }

    /// Discards all measured state but keeps `item_len` and the estimate.
    pub fn reset(&mut self) {
        ldebug!(
            measured = self.measured_count,
            "HeightLedger::reset"
        );
        self.heights.clear();
        self.seen.fill(false);
        self.total_measured = 0.0;
        self.measured_count = 0;
        self.blocks.borrow_mut().invalidate_from(0);
        self.request_recompute();
    }

    /// Enters a dynamic-update window: recomputes are held until the matching
    /// [`end_update`](Self::end_update). Reentrant.
    pub fn begin_update(&mut self) {
        self.scheduler.block();
    }

    /// Leaves a dynamic-update window, firing the one held recompute, if any.
    ///
    /// Unbalanced calls are safe no-ops.
    pub fn end_update(&mut self) {
        if self.scheduler.unblock() {
            self.recompute_now();
        }
    }

    /// Runs a deferred recompute, if one is armed. Returns whether it ran.
    ///
    /// Deferred-mode hosts call this once per frame; callers that need
    /// authoritative aggregates right after a mutation call it explicitly.
    pub fn flush(&mut self) -> bool {
        if self.scheduler.drain() {
            self.recompute_now();
            true
        } else {
            false
        }
    }

    /// Discards any held or armed recompute without running it. For teardown.
    pub fn cancel_recompute(&mut self) {
        self.scheduler.cancel();
    }

    /// Offset of `index`'s leading edge, in forward coordinates.
    ///
    /// Backed by the block-sum cache: O(block size) per query.
    pub fn offset_of(&self, index: usize) -> f64 {
        self.blocks
            .borrow_mut()
            .offset_of(index, &self.heights_view())
    }

    /// Version of the block-sum cache; stable while nothing changed.
    pub fn sums_version(&self) -> u64 {
        self.blocks.borrow().version()
    }

    fn heights_view(&self) -> HeightsView<'_> {
        HeightsView::new(&self.heights, self.item_len, self.average_height)
    }

    fn request_recompute(&mut self) {
        if self.scheduler.schedule() {
            self.recompute_now();
        }
    }

    fn recompute_now(&mut self) {
        self.average_height = if self.measured_count > 0 {
            self.total_measured / self.measured_count as f64
        } else {
            self.estimated_height
        };
        let unmeasured = self.item_len.saturating_sub(self.measured_count) as f64;
        self.total_height = self.total_measured + unmeasured * self.average_height;
        ltrace!(
            average = self.average_height,
            total = self.total_height,
            "recompute"
        );
        self.notify();
    }

    fn notify(&self) {
        if let Some(cb) = &self.on_recompute {
            cb(self.stats());
        }
    }
}

impl core::fmt::Debug for HeightLedger {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HeightLedger")
            .field("item_len", &self.item_len)
            .field("estimated_height", &self.estimated_height)
            .field("measured_count", &self.measured_count)
            .field("total_measured", &self.total_measured)
            .field("average_height", &self.average_height)
            .field("total_height", &self.total_height)
            .finish_non_exhaustive()
    }
}

/// `Some(height)` for finite, strictly positive heights.
fn sanitize_height(height: f64) -> Option<f64> {
    (height.is_finite() && height > 0.0).then_some(height)
}
