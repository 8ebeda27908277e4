use thiserror::Error;

/// Errors reported by the fallible operations of [`Map`](crate::Map) and
/// [`HashTable`](crate::HashTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MapError {
    /// The requested key has no entry in the map.
    #[error("key not found")]
    NotFound,
    /// The backing array could not be allocated. The existing table is left
    /// untouched.
    #[error("failed to allocate a table of {capacity} slots")]
    AllocFailed {
        /// Number of slots that were requested.
        capacity: usize,
    },
    /// The requested capacity does not fit in `usize` or exceeds the maximum
    /// allocation size.
    #[error("capacity overflow")]
    CapacityOverflow,
    /// A [`Position`](crate::Position) was used after the table it points into
    /// was grown, compacted, cleared or had an entry removed.
    #[error("position refers to generation {position}, table is at generation {table}")]
    StalePosition {
        /// Generation recorded in the position.
        position: u64,
        /// Current generation of the table.
        table: u64,
    },
    /// A [`Position`](crate::Position) does not address an occupied slot.
    #[error("position does not address an occupied slot")]
    VacantPosition,
}

impl MapError {
    /// Returns `true` for [`MapError::NotFound`].
    pub const fn is_not_found(&self) -> bool {
        matches!(self, MapError::NotFound)
    }
}
