/// Alignment policy for programmatic "scroll to index" requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    /// Put the item's leading edge at the viewport's leading edge.
    Top,
    /// Put the item's trailing edge at the viewport's trailing edge.
    Bottom,
    /// Scroll the minimum distance; `None` when the item is already visible.
    Nearest,
    /// `Top` above the viewport, `Bottom` below it, closest edge when inside.
    ///
    /// Unlike [`Align::Nearest`], this always yields an offset, even when the
    /// target is already visible.
    Auto,
}

/// How indexes map onto the scroll axis.
///
/// Fixed for the lifetime of a list instance; switching modes is a full reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderMode {
    /// Index 0 at the top, indexes growing downward.
    Forward,
    /// Index 0 pinned at the bottom edge, indexes growing upward.
    Reversed,
}

/// A single height delta reported by a measurement collaborator.
///
/// `old_height: None` means "first measurement"; `new_height: None` means
/// "unmeasure this index". Consumed once by
/// [`HeightLedger::apply_changes`](crate::HeightLedger::apply_changes).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeightChange {
    pub index: usize,
    pub old_height: Option<f64>,
    pub new_height: Option<f64>,
}

impl HeightChange {
    /// A first measurement for `index`.
    pub fn first(index: usize, height: f64) -> Self {
        Self {
            index,
            old_height: None,
            new_height: Some(height),
        }
    }

    /// A re-measurement replacing a previously reported height.
    pub fn update(index: usize, old_height: f64, new_height: f64) -> Self {
        Self {
            index,
            old_height: Some(old_height),
            new_height: Some(new_height),
        }
    }

    /// Removes the measurement for `index`.
    pub fn remove(index: usize, old_height: f64) -> Self {
        Self {
            index,
            old_height: Some(old_height),
            new_height: None,
        }
    }
}

/// A half-open index window to render: `start..end`, `0 <= start <= end <= len`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize, // exclusive
}

impl VisibleRange {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// A read-only diagnostics snapshot of a ledger's aggregates.
///
/// Purely derived; taking a snapshot has no side effects.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LedgerStats {
    pub total_measured_height: f64,
    pub measured_count: usize,
    pub item_len: usize,
    /// Share of items with a real measurement, in percent of `item_len`.
    pub coverage_percent: f64,
    pub estimated_height: f64,
    pub average_height: f64,
    pub total_height: f64,
}
