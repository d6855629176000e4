/// Controls *when* a requested recompute actually runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecomputeMode {
    /// Run synchronously inside the mutating call. Deterministic; intended
    /// for tests and offline computation.
    Immediate,
    /// Arm a pending pass that the host drains on its next frame via
    /// [`RecomputeScheduler::drain`].
    Deferred,
}

/// A cooperative debouncer for "recompute derived values" requests.
///
/// Repeated [`schedule`](Self::schedule) calls coalesce into a single pass.
/// [`block`](Self::block) / [`unblock`](Self::unblock) implement a reentrant
/// suspend so a caller can perform many mutations inside a dynamic-update
/// window and pay for exactly one recompute at the end.
///
/// The scheduler only tracks state; the owner runs the actual recompute
/// whenever `schedule`, `unblock`, or `drain` returns `true`.
#[derive(Clone, Debug)]
pub struct RecomputeScheduler {
    mode: RecomputeMode,
    block_depth: usize,
    /// Set while blocked; fired by the matching final `unblock`.
    pending: bool,
    /// Set in deferred mode; taken by `drain`.
    armed: bool,
}

impl RecomputeScheduler {
    pub fn new(mode: RecomputeMode) -> Self {
        Self {
            mode,
            block_depth: 0,
            pending: false,
            armed: false,
        }
    }

    pub fn mode(&self) -> RecomputeMode {
        self.mode
    }

    pub fn is_blocked(&self) -> bool {
        self.block_depth > 0
    }

    /// True when a recompute has been requested but not yet run.
    pub fn has_work(&self) -> bool {
        self.pending || self.armed
    }

    /// Requests that the owner's recompute run once "soon".
    ///
    /// Returns `true` when the owner must recompute now (immediate mode,
    /// not blocked). Otherwise the request is recorded: as `pending` while
    /// blocked, or as `armed` in deferred mode.
    #[must_use]
    pub fn schedule(&mut self) -> bool {
        if self.block_depth > 0 {
            self.pending = true;
            return false;
        }
        match self.mode {
            RecomputeMode::Immediate => true,
            RecomputeMode::Deferred => {
                self.armed = true;
                false
            }
        }
    }

    /// Enters a dynamic-update window. Reentrant.
    pub fn block(&mut self) {
        self.block_depth = self.block_depth.saturating_add(1);
    }

    /// Leaves a dynamic-update window.
    ///
    /// Returns `true` when the depth reaches 0 and a recompute is pending;
    /// the owner must run it synchronously. Calling `unblock` with depth
    /// already 0 is a safe no-op.
    #[must_use]
    pub fn unblock(&mut self) -> bool {
        if self.block_depth == 0 {
            lwarn!("RecomputeScheduler::unblock without matching block");
            return false;
        }
        self.block_depth -= 1;
        if self.block_depth == 0 && self.pending {
            self.pending = false;
            return true;
        }
        false
    }

    /// Takes the armed deferred pass, if any.
    ///
    /// Deferred hosts call this once per frame and recompute when it returns
    /// `true`. Always `false` in immediate mode.
    #[must_use]
    pub fn drain(&mut self) -> bool {
        let armed = self.armed;
        self.armed = false;
        armed
    }

    /// Discards any pending or armed recompute without running it and leaves
    /// the scheduler idle. Safe to call in any state; used on teardown.
    pub fn cancel(&mut self) {
        self.pending = false;
        self.armed = false;
        self.block_depth = 0;
    }
}
