use crate::ledger::OnRecomputeCallback;
use crate::range::{self, RangeMemo};
use crate::scheduler::RecomputeMode;
use crate::scroll_target;
use crate::{Align, HeightChange, HeightLedger, LedgerStats, RenderMode, VisibleRange};

/// Configuration for [`ListGeometry`].
#[derive(Clone)]
pub struct GeometryOptions {
    pub item_len: usize,
    /// Fallback height for items that have never been measured.
    pub estimated_height: f64,
    /// Extra items rendered on each side of the visible window.
    pub buffer: usize,
    /// Fixed for the lifetime of the instance.
    pub mode: RenderMode,
    /// `Immediate` recomputes are deterministic; interactive hosts pick
    /// `Deferred` and drain via [`ListGeometry::flush`] once per frame.
    pub recompute_mode: RecomputeMode,
    pub block_size: usize,
    pub on_recompute: Option<OnRecomputeCallback>,
}

impl GeometryOptions {
    pub fn new(item_len: usize, estimated_height: f64) -> Self {
        Self {
            item_len,
            estimated_height,
            buffer: 1,
            mode: RenderMode::Forward,
            recompute_mode: RecomputeMode::Immediate,
            block_size: crate::DEFAULT_BLOCK_SIZE,
            on_recompute: None,
        }
    }

    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_recompute_mode(mut self, recompute_mode: RecomputeMode) -> Self {
        self.recompute_mode = recompute_mode;
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_on_recompute(
        mut self,
        on_recompute: impl Fn(LedgerStats) + Send + Sync + 'static,
    ) -> Self {
        self.on_recompute = Some(std::sync::Arc::new(on_recompute));
        self
    }
}

impl core::fmt::Debug for GeometryOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GeometryOptions")
            .field("item_len", &self.item_len)
            .field("estimated_height", &self.estimated_height)
            .field("buffer", &self.buffer)
            .field("mode", &self.mode)
            .field("recompute_mode", &self.recompute_mode)
            .field("block_size", &self.block_size)
            .finish_non_exhaustive()
    }
}

/// Per-list orchestration over one [`HeightLedger`].
///
/// Owns the rendering mode, current scroll offset and viewport size, the
/// range memo, and the container generation. This is the type a UI adapter
/// drives: feed it measurement batches and scroll/resize events, ask it for
/// the visible range, a positioning offset, or a scroll target.
///
/// Each list instance owns its ledger and caches exclusively; nothing here is
/// process-global.
#[derive(Clone, Debug)]
pub struct ListGeometry {
    ledger: HeightLedger,
    mode: RenderMode,
    buffer: usize,
    viewport_size: f64,
    scroll_offset: f64,
    memo: RangeMemo,
    generation: u64,
    attached: bool,
}

impl ListGeometry {
    pub fn new(options: GeometryOptions) -> Self {
        let GeometryOptions {
            item_len,
            estimated_height,
            buffer,
            mode,
            recompute_mode,
            block_size,
            on_recompute,
        } = options;
        let mut ledger =
            HeightLedger::with_block_size(item_len, estimated_height, recompute_mode, block_size);
        ledger.set_on_recompute(on_recompute);
        Self {
            ledger,
            mode,
            buffer,
            viewport_size: 0.0,
            scroll_offset: 0.0,
            memo: RangeMemo::new(),
            generation: 0,
            attached: false,
        }
    }

    pub fn ledger(&self) -> &HeightLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut HeightLedger {
        &mut self.ledger
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn buffer(&self) -> usize {
        self.buffer
    }

    pub fn set_buffer(&mut self, buffer: usize) {
        self.buffer = buffer;
        self.memo.clear();
    }

    /// Marks the host's scroll container as bound. Write-once.
    ///
    /// # Panics
    ///
    /// Panics when called a second time: re-binding without
    /// [`container_replaced`](Self::container_replaced) is a lifecycle
    /// contract violation in the host, not a runtime condition.
    pub fn attach(&mut self) {
        assert!(
            !self.attached,
            "ListGeometry::attach called twice; use container_replaced() when the scroll element is swapped"
        );
        self.attached = true;
        ldebug!(generation = self.generation, "ListGeometry::attach");
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Signals that the scroll container was swapped out.
    ///
    /// Bumps the generation and drops the range memo; measurements describe
    /// the items, not the container, and are kept.
    pub fn container_replaced(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.memo.clear();
        ldebug!(generation = self.generation, "container_replaced");
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn viewport_size(&self) -> f64 {
        self.viewport_size
    }

    pub fn set_viewport_size(&mut self, viewport_size: f64) {
        self.viewport_size = viewport_size.max(0.0);
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, scroll_offset: f64) {
        self.scroll_offset = scroll_offset;
    }

    pub fn max_scroll_offset(&self) -> f64 {
        (self.ledger.total_height() - self.viewport_size).max(0.0)
    }

    pub fn clamp_scroll_offset(&self, scroll_offset: f64) -> f64 {
        scroll_offset.clamp(0.0, self.max_scroll_offset())
    }

    /// The index window to render for the current scroll state, memoized.
    pub fn visible_range(&mut self) -> VisibleRange {
        range::compute_range(
            &self.ledger,
            self.scroll_offset,
            self.viewport_size,
            self.buffer,
            self.mode,
            &mut self.memo,
        )
    }

    /// Like [`visible_range`](Self::visible_range) for an arbitrary scroll
    /// state, bypassing the memo.
    pub fn visible_range_for(&self, scroll_offset: f64, viewport_size: f64) -> VisibleRange {
        range::compute_range_uncached(
            &self.ledger,
            scroll_offset,
            viewport_size,
            self.buffer,
            self.mode,
        )
    }

    /// Forward-coordinate offset of `index`'s leading edge; the positioning
    /// transform for a rendered block starting at `index`.
    pub fn offset_of(&self, index: usize) -> f64 {
        self.ledger.offset_of(index)
    }

    /// The scroll offset that satisfies `align` for `target_index`, or `None`
    /// when no scroll is needed (see [`Align::Nearest`]).
    pub fn scroll_target(&mut self, target_index: usize, align: Align) -> Option<f64> {
        let visible = self.visible_range();
        scroll_target::compute_scroll_target(
            &self.ledger,
            self.mode,
            align,
            target_index,
            self.viewport_size,
            self.scroll_offset,
            visible,
        )
    }

    /// Computes and applies the scroll target. Returns the applied offset.
    pub fn scroll_to(&mut self, target_index: usize, align: Align) -> Option<f64> {
        let target = self.scroll_target(target_index, align)?;
        self.scroll_offset = target;
        Some(target)
    }

    pub fn apply_changes(&mut self, changes: &[HeightChange]) {
        self.ledger.apply_changes(changes);
    }

    pub fn set_item_height(&mut self, index: usize, height: f64) {
        self.ledger.set_single_height(index, height);
    }

    pub fn set_item_len(&mut self, item_len: usize) {
        self.ledger.update_item_length(item_len);
        self.memo.clear();
    }

    pub fn set_estimated_height(&mut self, estimated_height: f64) {
        self.ledger.update_estimated_height(estimated_height);
    }

    pub fn reset_measurements(&mut self) {
        self.ledger.reset();
        self.memo.clear();
    }

    /// Runs `f` inside one dynamic-update window: any number of mutations,
    /// exactly one recompute at the end.
    pub fn update_window(&mut self, f: impl FnOnce(&mut Self)) {
        self.ledger.begin_update();
        f(self);
        self.ledger.end_update();
    }

    /// Drains a deferred recompute, if armed. Deferred hosts call this once
    /// per frame before reading geometry.
    pub fn flush(&mut self) -> bool {
        self.ledger.flush()
    }

    pub fn total_height(&self) -> f64 {
        self.ledger.total_height()
    }

    pub fn stats(&self) -> LedgerStats {
        self.ledger.stats()
    }
}
