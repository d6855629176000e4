//! Height accounting and visible-range computation for virtualized lists.
//!
//! This crate is the geometry core of a list virtualizer: it tracks measured
//! vs. estimated item heights without ever rescanning the list, keeps a
//! block-prefix-sum cache for near-constant-time offset queries over very
//! large lists, computes the visible index window for forward and reversed
//! rendering, and resolves "scroll to index" requests under four alignment
//! policies.
//!
//! It is UI-agnostic and renders nothing. A host layer is expected to
//! provide:
//! - viewport size and scroll offset,
//! - item measurements (as [`HeightChange`] batches), and
//! - the frame boundary for draining deferred recomputes.
//!
//! Start with [`ListGeometry`] for per-list orchestration, or drive
//! [`HeightLedger`] directly when you own the scroll state yourself.

#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod block;
mod ledger;
mod list;
mod range;
mod scheduler;
mod scroll_target;
mod types;


pub use block::{AVERAGE_EPSILON, BlockSumCache, DEFAULT_BLOCK_SIZE, HeightsView};
pub use ledger::{HeightLedger, OnRecomputeCallback};
pub use list::{GeometryOptions, ListGeometry};
pub use range::{
    ITEM_HEIGHT_MEMO_EPSILON, RangeMemo, SCROLL_MEMO_THRESHOLD, compute_range,
    compute_range_uncached,
};
pub use scheduler::{RecomputeMode, RecomputeScheduler};
pub use scroll_target::compute_scroll_target;
pub use types::{Align, HeightChange, LedgerStats, RenderMode, VisibleRange};
