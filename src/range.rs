use crate::{HeightLedger, RenderMode, VisibleRange};

/// Scroll deltas below this many pixels reuse the memoized range.
pub const SCROLL_MEMO_THRESHOLD: f64 = 8.0;

/// Item-height drift below this still counts as "unchanged" for the memo.
pub const ITEM_HEIGHT_MEMO_EPSILON: f64 = 0.01;

/// Fraction of one item height within which the end-of-list pack kicks in.
const END_PACK_TOLERANCE: f64 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq)]
struct MemoKey {
    scroll_offset: f64,
    viewport_size: f64,
    item_height: f64,
    item_len: usize,
    buffer: usize,
    mode: RenderMode,
}

/// Short-lived memo for [`compute_range`].
///
/// Reuses the last result while viewport size, item count, buffer, mode, and
/// item height are unchanged and the scroll offset moved less than
/// [`SCROLL_MEMO_THRESHOLD`]. Purely an optimization: recomputing from
/// scratch on every call is always correct.
#[derive(Clone, Copy, Debug, Default)]
pub struct RangeMemo {
    key: Option<MemoKey>,
    result: VisibleRange,
}

impl RangeMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.key = None;
    }

    fn lookup(&self, key: &MemoKey) -> Option<VisibleRange> {
        let prev = self.key.as_ref()?;
        let hit = prev.viewport_size == key.viewport_size
            && prev.item_len == key.item_len
            && prev.buffer == key.buffer
            && prev.mode == key.mode
            && (prev.item_height - key.item_height).abs() < ITEM_HEIGHT_MEMO_EPSILON
            && (prev.scroll_offset - key.scroll_offset).abs() < SCROLL_MEMO_THRESHOLD;
        hit.then_some(self.result)
    }

    fn store(&mut self, key: MemoKey, result: VisibleRange) {
        self.key = Some(key);
        self.result = result;
    }
}

/// Computes the index window to render, memoized.
///
/// See [`compute_range_uncached`] for the range rules.
pub fn compute_range(
    ledger: &HeightLedger,
    scroll_offset: f64,
    viewport_size: f64,
    buffer: usize,
    mode: RenderMode,
    memo: &mut RangeMemo,
) -> VisibleRange {
    let key = MemoKey {
        scroll_offset,
        viewport_size,
        item_height: ledger.average_height(),
        item_len: ledger.item_len(),
        buffer,
        mode,
    };
    if let Some(result) = memo.lookup(&key) {
        return result;
    }
    let result = compute_range_uncached(ledger, scroll_offset, viewport_size, buffer, mode);
    memo.store(key, result);
    result
}

/// Computes the index window to render: half-open, buffered symmetrically,
/// clamped to `[0, item_len]`.
///
/// Forward mode divides by the current average height, with a pack-from-the-end
/// pass near the bottom that walks real heights backward so the last item ends
/// up fully visible even when estimates are off. Reversed mode converts the
/// scroll offset to a distance from the start of the content and divides from
/// there; over-scroll clamps to the first items.
pub fn compute_range_uncached(
    ledger: &HeightLedger,
    scroll_offset: f64,
    viewport_size: f64,
    buffer: usize,
    mode: RenderMode,
) -> VisibleRange {
    let item_len = ledger.item_len();
    if item_len == 0 || viewport_size <= 0.0 {
        return VisibleRange { start: 0, end: 0 };
    }
    match mode {
        RenderMode::Forward => forward_range(ledger, scroll_offset, viewport_size, buffer),
        RenderMode::Reversed => reversed_range(ledger, scroll_offset, viewport_size, buffer),
    }
}

fn forward_range(
    ledger: &HeightLedger,
    scroll_offset: f64,
    viewport_size: f64,
    buffer: usize,
) -> VisibleRange {
    let item_len = ledger.item_len();
    let item_height = ledger.average_height();
    let total = ledger.total_height();
    let scroll_offset = scroll_offset.max(0.0);
    let max_scroll = (total - viewport_size).max(0.0);

    let (start, end) = if scroll_offset >= max_scroll - item_height * END_PACK_TOLERANCE {
        // Near the bottom, estimates can leave the last item clipped; walk
        // real heights backward until the viewport is filled.
        let mut filled = 0.0;
        let mut start = item_len;
        while start > 0 && filled < viewport_size {
            start -= 1;
            filled += ledger.height_or_average(start);
        }
        (start, item_len)
    } else {
        let raw_start = (scroll_offset / item_height).floor() as usize;
        let visible_count = (viewport_size / item_height).ceil() as usize + 1;
        (
            raw_start.min(item_len),
            raw_start.saturating_add(visible_count).min(item_len),
        )
    };

    buffered(start, end, buffer, item_len)
}

fn reversed_range(
    ledger: &HeightLedger,
    scroll_offset: f64,
    viewport_size: f64,
    buffer: usize,
) -> VisibleRange {
    let item_len = ledger.item_len();
    let item_height = ledger.average_height();
    let total = ledger.total_height();
    let max_scroll = (total - viewport_size).max(0.0);
    let visible_count = (viewport_size / item_height).ceil() as usize + 1;

    // Index 0 sits at the bottom edge; convert the offset into a distance
    // from the start of the content before dividing.
    let distance = max_scroll - scroll_offset;
    if distance < 0.0 {
        // Over-scrolled past the pinned start.
        let end = visible_count
            .saturating_add(buffer.saturating_mul(2))
            .min(item_len);
        return VisibleRange { start: 0, end };
    }

    let lowest = (distance / item_height).floor() as usize;
    let start = lowest.saturating_sub(buffer).min(item_len);
    let end = lowest
        .saturating_add(visible_count)
        .saturating_add(buffer)
        .min(item_len);
    VisibleRange {
        start: start.min(end),
        end,
    }
}

fn buffered(start: usize, end: usize, buffer: usize, item_len: usize) -> VisibleRange {
    VisibleRange {
        start: start.saturating_sub(buffer),
        end: end.saturating_add(buffer).min(item_len),
    }
}
