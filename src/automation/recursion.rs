// Chain Depth - bounds automation-triggered-automation cascades
//
// The depth is an explicit value threaded through the call chain rather
// than ambient mutable state, so concurrent unrelated event chains never
// share or contend on a counter.

/// Depth of the current logical call chain, with its ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainDepth {
    current: u32,
    ceiling: u32,
}

impl ChainDepth {
    /// Depth for the first event of a chain.
    pub fn root(ceiling: u32) -> Self {
        Self {
            current: 0,
            ceiling,
        }
    }

    /// Depth to pass when processing an event raised by automation itself.
    pub fn child(self) -> Self {
        Self {
            current: self.current.saturating_add(1),
            ceiling: self.ceiling,
        }
    }

    /// True once the chain has reached its ceiling; processing at this
    /// depth must soft-stop.
    pub fn exceeded(&self) -> bool {
        self.current >= self.ceiling
    }

    pub fn value(&self) -> u32 {
        self.current
    }
}
