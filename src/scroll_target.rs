use crate::{Align, HeightLedger, RenderMode, VisibleRange};

/// Computes the scroll offset that brings `target_index` into view.
///
/// `item_top`/`item_bottom` come from the block-backed offset query; in
/// reversed mode they are derived by subtracting the forward-coordinate
/// offsets from the total height. Targets are clamped to `[0, max_scroll]`.
///
/// Policy summary:
/// - [`Align::Top`] and [`Align::Bottom`] align the matching edges.
/// - [`Align::Nearest`] returns `None` when the item already overlaps the
///   viewport, otherwise scrolls the shorter way.
/// - [`Align::Auto`] behaves like `Top` above the visible range and `Bottom`
///   below it; inside it, it aligns to the numerically closer edge and never
///   returns `None`. Callers must not conflate `Auto` with `Nearest`.
///
/// Ties between the two edges prefer the top. Empty lists yield `None`;
/// out-of-range indexes clamp to the last item.
pub fn compute_scroll_target(
    ledger: &HeightLedger,
    mode: RenderMode,
    align: Align,
    target_index: usize,
    viewport_size: f64,
    scroll_offset: f64,
    visible: VisibleRange,
) -> Option<f64> {
    let item_len = ledger.item_len();
    if item_len == 0 {
        return None;
    }
    let index = target_index.min(item_len - 1);
    let total = ledger.total_height();

    let forward_top = ledger.offset_of(index);
    let forward_bottom = forward_top + ledger.height_or_average(index);
    let (item_top, item_bottom) = match mode {
        RenderMode::Forward => (forward_top, forward_bottom),
        RenderMode::Reversed => (
            (total - forward_bottom).max(0.0),
            (total - forward_top).max(0.0),
        ),
    };

    let max_scroll = (total - viewport_size).max(0.0);
    let top_target = item_top.clamp(0.0, max_scroll);
    let bottom_target = (item_bottom - viewport_size).max(0.0).clamp(0.0, max_scroll);

    ltrace!(
        index,
        item_top,
        item_bottom,
        "compute_scroll_target"
    );

    match align {
        Align::Top => Some(top_target),
        Align::Bottom => Some(bottom_target),
        Align::Nearest => {
            if overlaps(item_top, item_bottom, scroll_offset, viewport_size) {
                None
            } else {
                Some(closer_edge(top_target, bottom_target, scroll_offset))
            }
        }
        Align::Auto => {
            if index < visible.start {
                Some(top_target)
            } else if index >= visible.end {
                Some(bottom_target)
            } else {
                Some(closer_edge(top_target, bottom_target, scroll_offset))
            }
        }
    }
}

/// Half-open interval overlap: `[top, bottom)` against the viewport window.
fn overlaps(item_top: f64, item_bottom: f64, scroll_offset: f64, viewport_size: f64) -> bool {
    item_top < scroll_offset + viewport_size && item_bottom > scroll_offset
}

/// Smaller absolute movement wins; ties prefer the top edge.
fn closer_edge(top_target: f64, bottom_target: f64, scroll_offset: f64) -> f64 {
    if (top_target - scroll_offset).abs() <= (bottom_target - scroll_offset).abs() {
        top_target
    } else {
        bottom_target
    }
}
