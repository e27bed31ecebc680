//! Strongly-typed identifiers for streamers and simulation steps.

use std::fmt;

/// Identifies a streamer channel within one simulation run.
///
/// Allocated sequentially by [`StreamerIdAllocator`]. Ordering follows
/// allocation order, which is also the order channels are rasterized in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamerId(pub u32);

impl fmt::Display for StreamerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for StreamerId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing step counter.
///
/// Step 0 is the initial (zero-time) solve; the first propagation step
/// is step 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepIndex(pub u64);

impl StepIndex {
    /// The step that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for StepIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StepIndex {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Hands out fresh [`StreamerId`]s for a single run.
///
/// Unlike a process-wide counter, each simulation owns its allocator so
/// that two runs with the same configuration produce identical ids.
#[derive(Clone, Debug, Default)]
pub struct StreamerIdAllocator {
    next: u32,
}

impl StreamerIdAllocator {
    /// Create an allocator whose first id is `StreamerId(0)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` streamers are allocated in one run.
    pub fn allocate(&mut self) -> StreamerId {
        let id = StreamerId(self.next);
        self.next = self
            .next
            .checked_add(1)
            .expect("streamer id space exhausted");
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next
    }
}
