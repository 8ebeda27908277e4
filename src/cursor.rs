use core::fmt::Debug;

use crate::hash_table::HashTable;

/// A detached reference to one slot of a [`Map`](crate::Map).
///
/// Unlike a [`Cursor`], a `Position` does not borrow the map. It records the
/// table generation it was taken at instead, and every operation that accepts
/// a `Position` rejects it with [`MapError::StalePosition`] once the map has
/// been grown, compacted, cleared or had an entry removed since.
///
/// [`MapError::StalePosition`]: crate::MapError::StalePosition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

impl Position {
    /// Slot index this position addresses.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Table generation this position was taken at.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    BeforeFront,
    At(usize),
    End,
}

/// A bidirectional cursor over the occupied slots of a [`Map`](crate::Map).
///
/// A cursor always rests on an occupied slot or on one of two sentinels: the
/// end (one past the last occupied slot) or the position before the first
/// occupied slot. Moving past a sentinel leaves the cursor where it is.
/// Tombstones and vacant slots are skipped in both directions.
///
/// The cursor borrows the map, so the map cannot change underneath it. Two
/// cursors compare equal when they rest on the same slot or sentinel.
///
/// ## Example
///
/// ```rust
/// use probe_map::Map;
/// use probe_map::hash_op::Identity;
///
/// let mut map = Map::with_hash_op(Identity);
/// map.insert(1u32, "one");
/// map.insert(5u32, "five");
///
/// let mut cursor = map.cursor_front();
/// assert_eq!(cursor.key_value(), Some((&1, &"one")));
/// cursor.move_next();
/// assert_eq!(cursor.key(), Some(&5));
/// cursor.move_next();
/// assert!(cursor.is_end());
/// cursor.move_prev();
/// assert_eq!(cursor.value(), Some(&"five"));
/// ```
pub struct Cursor<'a, K, V> {
    table: &'a HashTable<(K, V)>,
    location: Location,
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for Cursor<'_, K, V> {}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

impl<K, V> Debug for Cursor<'_, K, V>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.location {
            Location::BeforeFront => f.write_str("Cursor(before front)"),
            Location::End => f.write_str("Cursor(end)"),
            Location::At(index) => f
                .debug_tuple("Cursor")
                .field(&index)
                .field(&self.key_value())
                .finish(),
        }
    }
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(crate) fn front(table: &'a HashTable<(K, V)>) -> Self {
        let mut cursor = Self::before_front(table);
        cursor.move_next();
        cursor
    }

    pub(crate) fn back(table: &'a HashTable<(K, V)>) -> Self {
        let mut cursor = Self::end(table);
        cursor.move_prev();
        cursor
    }

    pub(crate) fn end(table: &'a HashTable<(K, V)>) -> Self {
        Cursor {
            table,
            location: Location::End,
        }
    }

    pub(crate) fn before_front(table: &'a HashTable<(K, V)>) -> Self {
        Cursor {
            table,
            location: Location::BeforeFront,
        }
    }

    pub(crate) fn at(table: &'a HashTable<(K, V)>, index: usize) -> Self {
        Cursor {
            table,
            location: Location::At(index),
        }
    }

    /// Moves to the next occupied slot, or to the end sentinel if there is
    /// none. Does nothing at the end.
    pub fn move_next(&mut self) {
        self.location = match self.location {
            Location::BeforeFront => self.seek_forward(0),
            Location::At(index) => self.seek_forward(index + 1),
            Location::End => Location::End,
        };
    }

    /// Moves to the previous occupied slot, or to the before-front sentinel if
    /// there is none. Does nothing before the front.
    pub fn move_prev(&mut self) {
        self.location = match self.location {
            Location::BeforeFront => Location::BeforeFront,
            Location::At(index) => self.seek_backward(index.checked_sub(1)),
            Location::End => self.seek_backward(self.table.capacity().checked_sub(1)),
        };
    }

    fn seek_forward(&self, from: usize) -> Location {
        self.table
            .occupied_from(from)
            .map_or(Location::End, Location::At)
    }

    fn seek_backward(&self, until: Option<usize>) -> Location {
        until
            .and_then(|index| self.table.occupied_until(index))
            .map_or(Location::BeforeFront, Location::At)
    }

    /// Returns `true` at the end sentinel.
    pub fn is_end(&self) -> bool {
        self.location == Location::End
    }

    /// Returns `true` at the before-front sentinel.
    pub fn is_before_front(&self) -> bool {
        self.location == Location::BeforeFront
    }

    /// Slot index the cursor rests on, or `None` at a sentinel.
    pub fn index(&self) -> Option<usize> {
        match self.location {
            Location::At(index) => Some(index),
            _ => None,
        }
    }

    /// Key and value of the current slot.
    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        let table: &'a HashTable<(K, V)> = self.table;
        let (key, value) = table.get(self.index()?)?;
        Some((key, value))
    }

    /// Key of the current slot.
    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|(key, _)| key)
    }

    /// Value of the current slot.
    pub fn value(&self) -> Option<&'a V> {
        self.key_value().map(|(_, value)| value)
    }

    /// Detaches the current slot as a [`Position`] that outlives the cursor.
    pub fn position(&self) -> Option<Position> {
        Some(Position {
            index: self.index()?,
            generation: self.table.generation(),
        })
    }
}
