#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Bidirectional cursors and detached positions over a [`Map`].
pub mod cursor;

mod error;

/// Hash capabilities used to place keys in a [`Map`].
pub mod hash_op;

/// A key-value map over the quadratic-probing [`HashTable`].
///
/// This module provides [`Map`], which hashes keys with a pluggable
/// [`HashOp`] and stores the pairs in a `HashTable`.
pub mod hash_map;

/// The slot table underneath [`Map`]: probing, growth and tombstones.
pub mod hash_table;

pub use cursor::Cursor;
pub use cursor::Position;
pub use error::MapError;
pub use hash_map::Entry;
pub use hash_map::Map;
pub use hash_op::DefaultHashOp;
pub use hash_op::HashOp;
pub use hash_table::HashTable;
#[cfg(feature = "stats")]
pub use hash_table::TableStats;
