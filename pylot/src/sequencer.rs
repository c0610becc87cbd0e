use crate::errors::PilotError;
use crate::types::Resolution;

/// Number of trailing catalog entries that are not part of the repeating
/// route.
pub const DEFAULT_RESERVED_TAIL: usize = 3;

/// Chooses the next waypoint along the route.
///
/// The first `len - reserved_tail` catalog entries form a cycle; the tail is
/// never proposed as a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequencer {
    cycle_len: usize,
}

impl Sequencer {
    pub fn new(catalog_len: usize, reserved_tail: usize) -> Result<Self, PilotError> {
        if catalog_len <= reserved_tail {
            return Err(PilotError::Config(format!(
                "catalog has {catalog_len} entries, need more than the {reserved_tail} reserved at the end"
            )));
        }
        Ok(Self {
            cycle_len: catalog_len - reserved_tail,
        })
    }

    /// Length of the repeating part of the route.
    pub fn cycle_len(&self) -> usize {
        self.cycle_len
    }

    /// Index of the waypoint after `current`.
    ///
    /// Positions at the end of the cycle, inside the reserved tail, or not
    /// resolved at all lead back to index 0.
    pub fn next_index(&self, current: Option<usize>) -> usize {
        match current {
            Some(index) if index + 1 < self.cycle_len => index + 1,
            _ => 0,
        }
    }

    pub fn next_after(&self, position: &Resolution) -> usize {
        self.next_index(position.index())
    }
}
