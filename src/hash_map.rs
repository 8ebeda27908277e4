use core::borrow::Borrow;
use core::fmt::Debug;
use core::fmt::Display;
use core::iter::FusedIterator;
use core::mem;
use core::ops::Index;

use crate::cursor::Cursor;
use crate::cursor::Position;
use crate::error::MapError;
use crate::hash_op::DefaultHashOp;
use crate::hash_op::HashOp;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;

/// An open-addressing hash map with triangular quadratic probing.
///
/// `Map<K, V, H>` stores key-value pairs in a single power-of-two array of
/// slots, caching each key's hash next to it. Keys are hashed by the hash op
/// `H` (any [`BuildHasher`](core::hash::BuildHasher) works, see
/// [`HashOp`]), and **two keys with equal hashes are the same key**: the map
/// never compares keys, so `K` needs neither `Eq` nor `Hash`, only a hash op
/// that distinguishes the keys you store.
///
/// Removal leaves a tombstone, which keeps lookups correct without moving
/// other entries. Tombstones are reclaimed by the next growth, by
/// [`compact`](Map::compact) or by [`clear`](Map::clear).
///
/// Iteration, [`Cursor`]s and [`Position`]s all follow slot order, which is
/// stable between mutations and reshuffled by growth.
///
/// # Examples
///
/// ```rust
/// use probe_map::Map;
/// use probe_map::hash_op::Djb2;
///
/// let mut map = Map::with_hash_op(Djb2);
/// map.insert("a", 1);
/// map.insert("b", 2);
/// map.insert("a", 3);
///
/// assert_eq!(map.len(), 2);
/// assert_eq!(map["a"], 3);
/// assert_eq!(map.get("b"), Some(&2));
/// assert!(map.try_get("z").is_err());
/// ```
#[derive(Clone)]
pub struct Map<K, V, H = DefaultHashOp> {
    table: HashTable<(K, V)>,
    hash_op: H,
}

impl<K, V, H> Debug for Map<K, V, H>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Renders the map as `{'key': value, ...}` in slot order.
impl<K, V, H> Display for Map<K, V, H>
where
    K: Display,
    V: Display,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{key}': {value}")?;
        }
        f.write_str("}")
    }
}

impl<K, V, H> Map<K, V, H> {
    /// Creates a map with the default initial capacity and the given hash op.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let map: Map<u32, String, _> = Map::with_hash_op(Identity);
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 8);
    /// ```
    pub fn with_hash_op(hash_op: H) -> Self {
        Self::with_capacity_and_hash_op(crate::hash_table::INITIAL_CAPACITY, hash_op)
    }

    /// Creates a map with at least `capacity` slots and the given hash op.
    ///
    /// The slot count is rounded up to a power of two. Slots are not entries:
    /// the map grows once the load factor is reached, so use
    /// [`reserve`](Map::reserve) to make room for a number of entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let map: Map<u32, String, _> = Map::with_capacity_and_hash_op(100, Identity);
    /// assert_eq!(map.capacity(), 128);
    /// ```
    pub fn with_capacity_and_hash_op(capacity: usize, hash_op: H) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            hash_op,
        }
    }

    /// Fallible version of
    /// [`with_capacity_and_hash_op`](Map::with_capacity_and_hash_op).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// # use probe_map::MapError;
    /// let map = Map::<u32, u32, _>::try_with_capacity_and_hash_op(16, Identity).unwrap();
    /// assert_eq!(map.capacity(), 16);
    ///
    /// let err = Map::<u32, u32, _>::try_with_capacity_and_hash_op(usize::MAX, Identity);
    /// assert_eq!(err.unwrap_err(), MapError::CapacityOverflow);
    /// ```
    pub fn try_with_capacity_and_hash_op(capacity: usize, hash_op: H) -> Result<Self, MapError> {
        Ok(Self {
            table: HashTable::try_with_capacity(capacity)?,
            hash_op,
        })
    }

    /// Returns the hash op used by the map.
    pub fn hash_op(&self) -> &H {
        &self.hash_op
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// assert_eq!(map.len(), 0);
    /// map.insert(1u8, "a");
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// assert!(map.is_empty());
    /// map.insert(1u32, 'a');
    /// assert!(!map.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of slots in the backing table. Always zero or a
    /// power of two.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// assert_eq!(map.capacity(), 8);
    /// for i in 0..100u32 {
    ///     map.insert(i, i);
    /// }
    /// assert!(map.capacity().is_power_of_two());
    /// assert!(map.capacity() > 100);
    /// ```
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the number of tombstones waiting to be reclaimed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// map.insert(1u32, 'a');
    /// map.insert(2u32, 'b');
    /// map.remove(&1);
    /// assert_eq!(map.tombstones(), 1);
    /// map.compact();
    /// assert_eq!(map.tombstones(), 0);
    /// ```
    pub fn tombstones(&self) -> usize {
        self.table.tombstones()
    }

    /// Removes every entry, keeping the allocated slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// for i in 0..20u32 {
    ///     map.insert(i, i);
    /// }
    /// let capacity = map.capacity();
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), capacity);
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Moves every entry into a new map, leaving `self` empty with no
    /// allocated slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut source = Map::with_hash_op(Identity);
    /// source.insert(1u32, 'a');
    ///
    /// let moved = source.take();
    /// assert_eq!(moved[&1], 'a');
    /// assert!(source.is_empty());
    /// assert_eq!(source.capacity(), 0);
    /// ```
    pub fn take(&mut self) -> Self
    where
        H: Clone,
    {
        let table = mem::replace(&mut self.table, HashTable::with_capacity(0));
        Self {
            table,
            hash_op: self.hash_op.clone(),
        }
    }

    /// Reserves room for at least `additional` more entries without growing.
    ///
    /// # Panics
    ///
    /// Panics if the new capacity overflows `usize`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map: Map<u32, u32, _> = Map::with_hash_op(Identity);
    /// map.reserve(100);
    /// let capacity = map.capacity();
    /// for i in 0..100 {
    ///     map.insert(i, i);
    /// }
    /// assert_eq!(map.capacity(), capacity);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Fallible version of [`reserve`](Map::reserve). On error the map is
    /// unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::MapError;
    /// # use probe_map::hash_op::Identity;
    /// let mut map: Map<u32, u32, _> = Map::with_hash_op(Identity);
    /// map.insert(1, 1);
    /// assert_eq!(map.try_reserve(usize::MAX), Err(MapError::CapacityOverflow));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), MapError> {
        self.table.try_reserve(additional)
    }

    /// Rebuilds the table at its current capacity, dropping all tombstones.
    ///
    /// Removal never stops later lookups short, so misses get slower as
    /// tombstones pile up between growths. Call this after a burst of
    /// removals to restore fresh-table probe lengths. Invalidates every
    /// outstanding [`Position`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map: Map<u32, u32, Identity> = (0..20).map(|i| (i, i)).collect();
    /// for i in 0..15 {
    ///     map.remove(&i);
    /// }
    /// let capacity = map.capacity();
    /// assert_eq!(map.tombstones(), 15);
    ///
    /// map.compact();
    /// assert_eq!(map.tombstones(), 0);
    /// assert_eq!(map.capacity(), capacity);
    /// assert_eq!(map.get(&17), Some(&17));
    /// ```
    pub fn compact(&mut self) {
        self.table.compact();
    }

    /// Fallible version of [`compact`](Map::compact).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map: Map<u32, u32, Identity> = (0..4).map(|i| (i, i)).collect();
    /// map.remove(&0);
    /// assert!(map.try_compact().is_ok());
    /// assert_eq!(map.tombstones(), 0);
    /// ```
    pub fn try_compact(&mut self) -> Result<(), MapError> {
        self.table.try_compact()
    }

    /// Returns a reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Djb2;
    /// let mut map = Map::with_hash_op(Djb2);
    /// map.insert(String::from("key"), 7);
    /// assert_eq!(map.get("key"), Some(&7));
    /// assert_eq!(map.get("other"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashOp<Q>,
    {
        let hash = self.hash_op.hash_of(key);
        self.table.find(hash).map(|(_, value)| value)
    }

    /// Returns the stored key and value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Djb2;
    /// let mut map = Map::with_hash_op(Djb2);
    /// map.insert(String::from("k"), 1);
    /// assert_eq!(map.get_key_value("k"), Some((&String::from("k"), &1)));
    /// assert_eq!(map.get_key_value("z"), None);
    /// ```
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashOp<Q>,
    {
        let hash = self.hash_op.hash_of(key);
        self.table.find(hash).map(|(key, value)| (key, value))
    }

    /// Returns the value for `key`, or [`MapError::NotFound`].
    ///
    /// The non-panicking counterpart of `map[&key]`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// # use probe_map::MapError;
    /// let mut map = Map::with_hash_op(Identity);
    /// map.insert(1u32, 'a');
    /// assert_eq!(map.try_get(&1), Ok(&'a'));
    /// assert_eq!(map.try_get(&2), Err(MapError::NotFound));
    /// ```
    pub fn try_get<Q>(&self, key: &Q) -> Result<&V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashOp<Q>,
    {
        self.get(key).ok_or(MapError::NotFound)
    }

    /// Returns a mutable reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// map.insert(1u32, 10);
    /// if let Some(value) = map.get_mut(&1) {
    ///     *value += 5;
    /// }
    /// assert_eq!(map[&1], 15);
    /// assert_eq!(map.get_mut(&2), None);
    /// ```
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashOp<Q>,
    {
        let hash = self.hash_op.hash_of(key);
        self.table.find_mut(hash).map(|(_, value)| value)
    }

    /// Returns `true` if the map has an entry for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// map.insert(1u32, 'a');
    /// assert!(map.contains_key(&1));
    /// assert!(!map.contains_key(&2));
    /// ```
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashOp<Q>,
    {
        self.table.search(self.hash_op.hash_of(key)).is_some()
    }

    /// Removes `key` from the map, returning its value. Does nothing if the
    /// key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// map.insert(1u32, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// assert_eq!(map.tombstones(), 1);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashOp<Q>,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key` from the map, returning the stored key and value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Djb2;
    /// let mut map = Map::with_hash_op(Djb2);
    /// map.insert(String::from("k"), 1);
    /// assert_eq!(map.remove_entry("k"), Some((String::from("k"), 1)));
    /// assert_eq!(map.remove_entry("k"), None);
    /// ```
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashOp<Q>,
    {
        let hash = self.hash_op.hash_of(key);
        self.table.remove(hash)
    }

    /// Returns the [`Position`] of the entry for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// map.insert(3u32, 'c');
    /// let position = map.find(&3).unwrap();
    /// assert_eq!(map.get_at(position), Ok((&3, &'c')));
    /// assert!(map.find(&4).is_none());
    /// ```
    pub fn find<Q>(&self, key: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: HashOp<Q>,
    {
        let index = self.table.search(self.hash_op.hash_of(key))?;
        Some(self.position_of(index))
    }

    /// Returns the [`Position`] of the first entry in slot order whose value
    /// equals `value`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// map.insert(1u32, "one");
    /// map.insert(2u32, "two");
    /// let position = map.find_value(&"two").unwrap();
    /// assert_eq!(map.get_at(position), Ok((&2, &"two")));
    /// assert!(map.find_value(&"three").is_none());
    /// ```
    pub fn find_value(&self, value: &V) -> Option<Position>
    where
        V: PartialEq,
    {
        self.find_by(|_, candidate| candidate == value)
    }

    /// Returns the [`Position`] of the first entry in slot order matching
    /// `predicate`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// map.insert(3u32, 30);
    /// map.insert(4u32, 41);
    ///
    /// let odd = map.find_by(|_, v| v % 2 == 1).unwrap();
    /// assert_eq!(map.get_at(odd), Ok((&4, &41)));
    /// ```
    pub fn find_by<F>(&self, mut predicate: F) -> Option<Position>
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.table
            .iter()
            .find(|(_, (key, value))| predicate(key, value))
            .map(|(index, _)| self.position_of(index))
    }

    /// Removes the first entry in slot order whose value equals `value`.
    /// Returns `true` if an entry was removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// map.insert(1u32, 'x');
    /// map.insert(2u32, 'x');
    /// assert!(map.remove_value(&'x'));
    /// assert_eq!(map.len(), 1);
    /// assert!(!map.contains_key(&1));
    /// assert!(!map.remove_value(&'y'));
    /// ```
    pub fn remove_value(&mut self, value: &V) -> bool
    where
        V: PartialEq,
    {
        match self.find_value(value) {
            Some(position) => self.table.remove_at(position.index).is_some(),
            None => false,
        }
    }

    /// Keeps only the entries for which `keep` returns `true`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map: Map<u32, u32, Identity> = (0..10).map(|i| (i, i * 10)).collect();
    /// map.retain(|k, _| k % 3 == 0);
    /// assert_eq!(map.len(), 4);
    /// ```
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        for index in 0..self.table.capacity() {
            let Some((key, value)) = self.table.get_mut(index) else {
                continue;
            };
            if !keep(key, value) {
                self.table.remove_at(index);
            }
        }
    }

    #[inline]
    fn position_of(&self, index: usize) -> Position {
        Position {
            index,
            generation: self.table.generation(),
        }
    }

    /// Checks that `position` is current and addresses an occupied slot.
    fn resolve(&self, position: Position) -> Result<usize, MapError> {
        let generation = self.table.generation();
        if position.generation != generation {
            return Err(MapError::StalePosition {
                position: position.generation,
                table: generation,
            });
        }
        match self.table.get(position.index) {
            Some(_) => Ok(position.index),
            None => Err(MapError::VacantPosition),
        }
    }

    /// Returns the entry at `position`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// # use probe_map::MapError;
    /// let mut map = Map::with_hash_op(Identity);
    /// map.insert(1u32, 'a');
    /// let position = map.find(&1).unwrap();
    /// assert_eq!(map.get_at(position), Ok((&1, &'a')));
    ///
    /// map.remove(&1);
    /// assert!(matches!(map.get_at(position), Err(MapError::StalePosition { .. })));
    /// ```
    pub fn get_at(&self, position: Position) -> Result<(&K, &V), MapError> {
        let index = self.resolve(position)?;
        match self.table.get(index) {
            Some((key, value)) => Ok((key, value)),
            None => Err(MapError::VacantPosition),
        }
    }

    /// Returns the key and a mutable reference to the value at `position`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// map.insert(1u32, 10);
    /// let position = map.find(&1).unwrap();
    /// if let Ok((_, value)) = map.get_at_mut(position) {
    ///     *value *= 3;
    /// }
    /// assert_eq!(map[&1], 30);
    /// ```
    pub fn get_at_mut(&mut self, position: Position) -> Result<(&K, &mut V), MapError> {
        let index = self.resolve(position)?;
        match self.table.get_mut(index) {
            Some((key, value)) => Ok((&*key, value)),
            None => Err(MapError::VacantPosition),
        }
    }

    /// Removes the entry at `position`, leaving a tombstone.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::MapError;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// map.insert(1u32, 'a');
    /// map.insert(2u32, 'b');
    ///
    /// let position = map.find(&1).unwrap();
    /// assert_eq!(map.remove_at(position), Ok((1, 'a')));
    /// assert!(matches!(
    ///     map.remove_at(position),
    ///     Err(MapError::StalePosition { .. })
    /// ));
    /// ```
    pub fn remove_at(&mut self, position: Position) -> Result<(K, V), MapError> {
        let index = self.resolve(position)?;
        self.table.remove_at(index).ok_or(MapError::VacantPosition)
    }

    /// Exchanges the values stored at two positions. Keys stay where they
    /// are, so each key keeps the slot its hash leads to.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Djb2;
    /// let mut map = Map::with_hash_op(Djb2);
    /// map.insert("x", 1);
    /// map.insert("y", 2);
    ///
    /// let x = map.find("x").unwrap();
    /// let y = map.find("y").unwrap();
    /// map.swap(x, y).unwrap();
    /// assert_eq!(map["x"], 2);
    /// assert_eq!(map["y"], 1);
    /// ```
    pub fn swap(&mut self, a: Position, b: Position) -> Result<(), MapError> {
        let a = self.resolve(a)?;
        let b = self.resolve(b)?;
        if a == b {
            return Ok(());
        }

        let (first, second) = self
            .table
            .get_pair_mut(a, b)
            .ok_or(MapError::VacantPosition)?;
        mem::swap(&mut first.1, &mut second.1);
        Ok(())
    }

    /// Returns a cursor on the first occupied slot, or at the end if the map
    /// is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let map: Map<u32, char, Identity> = [(2, 'b'), (1, 'a')].into_iter().collect();
    /// let mut cursor = map.cursor_front();
    /// assert_eq!(cursor.key_value(), Some((&1, &'a')));
    /// cursor.move_next();
    /// assert_eq!(cursor.key(), Some(&2));
    /// cursor.move_next();
    /// assert!(cursor.is_end());
    /// ```
    pub fn cursor_front(&self) -> Cursor<'_, K, V> {
        Cursor::front(&self.table)
    }

    /// Returns a cursor on the last occupied slot, or before the front if the
    /// map is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let map: Map<u32, char, Identity> = [(2, 'b'), (1, 'a')].into_iter().collect();
    /// let mut cursor = map.cursor_back();
    /// assert_eq!(cursor.key(), Some(&2));
    /// cursor.move_prev();
    /// cursor.move_prev();
    /// assert!(cursor.is_before_front());
    ///
    /// let empty: Map<u32, char, _> = Map::with_hash_op(Identity);
    /// assert!(empty.cursor_back().is_before_front());
    /// ```
    pub fn cursor_back(&self) -> Cursor<'_, K, V> {
        Cursor::back(&self.table)
    }

    /// Returns a cursor at the end sentinel.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let map: Map<u32, char, Identity> = [(1, 'a')].into_iter().collect();
    /// let mut cursor = map.cursor_end();
    /// assert_eq!(cursor.key_value(), None);
    /// cursor.move_next();
    /// assert!(cursor.is_end());
    /// cursor.move_prev();
    /// assert_eq!(cursor, map.cursor_back());
    /// ```
    pub fn cursor_end(&self) -> Cursor<'_, K, V> {
        Cursor::end(&self.table)
    }

    /// Returns a cursor at the before-front sentinel.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let map: Map<u32, char, Identity> = [(1, 'a')].into_iter().collect();
    /// let mut cursor = map.cursor_before_front();
    /// assert!(cursor.is_before_front());
    /// cursor.move_next();
    /// assert_eq!(cursor, map.cursor_front());
    /// ```
    pub fn cursor_before_front(&self) -> Cursor<'_, K, V> {
        Cursor::before_front(&self.table)
    }

    /// Returns a cursor resting on `position`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let map: Map<u32, char, Identity> = [(1, 'a'), (4, 'd'), (6, 'f')].into_iter().collect();
    /// let position = map.find(&4).unwrap();
    /// let mut cursor = map.cursor_at(position).unwrap();
    /// cursor.move_prev();
    /// assert_eq!(cursor.key(), Some(&1));
    /// cursor.move_next();
    /// cursor.move_next();
    /// assert_eq!(cursor.key(), Some(&6));
    /// ```
    pub fn cursor_at(&self, position: Position) -> Result<Cursor<'_, K, V>, MapError> {
        let index = self.resolve(position)?;
        Ok(Cursor::at(&self.table, index))
    }

    /// An iterator visiting all key-value pairs in slot order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// map.insert(5u32, "five");
    /// map.insert(2u32, "two");
    ///
    /// let pairs: Vec<_> = map.iter().collect();
    /// assert_eq!(pairs, [(&2, &"two"), (&5, &"five")]);
    /// let reversed: Vec<_> = map.iter().rev().collect();
    /// assert_eq!(reversed, [(&5, &"five"), (&2, &"two")]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// An iterator visiting all key-value pairs in slot order, with mutable
    /// references to the values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map: Map<u32, u32, Identity> = (0..3).map(|i| (i, i)).collect();
    /// for (_, value) in map.iter_mut() {
    ///     *value *= 10;
    /// }
    /// assert_eq!(map[&2], 20);
    /// ```
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// An iterator visiting all keys in slot order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let map: Map<u32, char, Identity> = [(3, 'c'), (1, 'a')].into_iter().collect();
    /// let keys: Vec<u32> = map.keys().copied().collect();
    /// assert_eq!(keys, [1, 3]);
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// An iterator visiting all values in slot order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let map: Map<u32, char, Identity> = [(3, 'c'), (1, 'a')].into_iter().collect();
    /// let values: String = map.values().collect();
    /// assert_eq!(values, "ac");
    /// ```
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// An iterator visiting all values mutably in slot order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map: Map<u32, String, _> = Map::with_hash_op(Identity);
    /// map.insert(1, String::from("a"));
    /// for value in map.values_mut() {
    ///     value.push('!');
    /// }
    /// assert_eq!(map[&1], "a!");
    /// ```
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Clears the map, returning all key-value pairs as an iterator. The
    /// allocated slots are kept.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map: Map<u32, u32, Identity> = (0..5).map(|i| (i, i * i)).collect();
    /// let capacity = map.capacity();
    ///
    /// let drained: Vec<(u32, u32)> = map.drain().collect();
    /// assert_eq!(drained.len(), 5);
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), capacity);
    /// assert_eq!(map.tombstones(), 0);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Returns occupancy and probe-length statistics for the backing table.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> crate::hash_table::TableStats {
        self.table.stats()
    }

    /// Computes a histogram of probe distances for the backing table.
    #[cfg(feature = "stats")]
    pub fn probe_histogram(&self) -> crate::hash_table::ProbeHistogram {
        self.table.probe_histogram()
    }
}

impl<K, V, H> Map<K, V, H>
where
    H: HashOp<K>,
{
    /// Inserts a key-value pair, returning the previous value for the key.
    ///
    /// When the key is already present its old pair is removed first and the
    /// new pair is placed in the first free slot of the probe sequence, which
    /// keeps probe runs short after removals. The stored key is replaced.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// assert_eq!(map.insert(37u32, "a"), None);
    /// assert_eq!(map.insert(37u32, "b"), Some("a"));
    /// assert_eq!(map[&37], "b");
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_op.hash_of(&key);
        let (_, previous) = self.table.insert(hash, (key, value));
        previous.map(|(_, value)| value)
    }

    /// Fallible version of [`insert`](Map::insert). If the table has to grow
    /// and cannot, the map is unchanged and the pair is dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Identity;
    /// let mut map = Map::with_hash_op(Identity);
    /// assert_eq!(map.try_insert(1u32, 'a'), Ok(None));
    /// assert_eq!(map.try_insert(1u32, 'b'), Ok(Some('a')));
    /// ```
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, MapError> {
        let hash = self.hash_op.hash_of(&key);
        let (_, previous) = self.table.try_insert(hash, (key, value))?;
        Ok(previous.map(|(_, value)| value))
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// A vacant entry already has room reserved, so inserting through it
    /// never grows the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Djb2;
    /// let mut counts = Map::with_hash_op(Djb2);
    /// for word in ["a", "b", "a"] {
    ///     *counts.entry(word).or_insert(0) += 1;
    /// }
    /// assert_eq!(counts["a"], 2);
    /// assert_eq!(counts["b"], 1);
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let hash = self.hash_op.hash_of(&key);
        Entry::from_table(self.table.entry(hash), key)
    }

    /// Fallible version of [`entry`](Map::entry).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Djb2;
    /// let mut map = Map::with_hash_op(Djb2);
    /// *map.try_entry("k").unwrap().or_insert(0) += 2;
    /// assert_eq!(map["k"], 2);
    /// ```
    pub fn try_entry(&mut self, key: K) -> Result<Entry<'_, K, V>, MapError> {
        let hash = self.hash_op.hash_of(&key);
        Ok(Entry::from_table(self.table.try_entry(hash)?, key))
    }

    /// Returns a mutable reference to the value for `key`, inserting
    /// `V::default()` first if the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// # use probe_map::hash_op::Djb2;
    /// let mut map: Map<&str, Vec<u32>, _> = Map::with_hash_op(Djb2);
    /// map.get_or_default("k").push(1);
    /// map.get_or_default("k").push(2);
    /// assert_eq!(map["k"], [1, 2]);
    /// ```
    pub fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.entry(key).or_default()
    }
}

impl<K, V, H> Map<K, V, H>
where
    H: Default,
{
    /// Creates an empty map with the default initial capacity and a default
    /// hash op.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// let map: Map<u32, String> = Map::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::with_hash_op(H::default())
    }

    /// Creates an empty map with at least `capacity` slots and a default hash
    /// op.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::Map;
    /// let map: Map<u32, u32> = Map::with_capacity(100);
    /// assert_eq!(map.capacity(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hash_op(capacity, H::default())
    }
}

impl<K, V, H> Default for Map<K, V, H>
where
    H: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Two maps are equal when they hold the same keys with equal values,
/// regardless of slot order or capacity.
impl<K, V, H> PartialEq for Map<K, V, H>
where
    V: PartialEq,
    H: HashOp<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|other| value == other))
    }
}

impl<K, V, H> Eq for Map<K, V, H>
where
    V: Eq,
    H: HashOp<K>,
{
}

impl<K, Q, V, H> Index<&Q> for Map<K, V, H>
where
    K: Borrow<Q>,
    Q: ?Sized,
    H: HashOp<Q>,
{
    type Output = V;

    /// Returns the value for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present. Use [`Map::try_get`] or
    /// [`Map::get`] to handle absence.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key not found in map"),
        }
    }
}

impl<K, V, H> Extend<(K, V)> for Map<K, V, H>
where
    H: HashOp<K>,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        let additional = if self.is_empty() {
            lower
        } else {
            lower.div_ceil(2)
        };
        self.reserve(additional);

        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, H> Extend<(&'a K, &'a V)> for Map<K, V, H>
where
    K: Copy,
    V: Copy,
    H: HashOp<K>,
{
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        self.extend(iter.into_iter().map(|(key, value)| (*key, *value)));
    }
}

impl<K, V, H> FromIterator<(K, V)> for Map<K, V, H>
where
    H: HashOp<K> + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, H, const N: usize> From<[(K, V); N]> for Map<K, V, H>
where
    H: HashOp<K> + Default,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_iter(pairs)
    }
}

impl<'a, K, V, H> IntoIterator for &'a Map<K, V, H> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, H> IntoIterator for &'a mut Map<K, V, H> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, H> IntoIterator for Map<K, V, H> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`Map`].
///
/// [`entry`]: Map::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    fn from_table(entry: TableEntry<'a, (K, V)>, key: K) -> Self {
        match entry {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        }
    }

    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Inserts the result of `default`, called with the key, if the entry is
    /// vacant.
    pub fn or_insert_with_key<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce(&K) -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let value = default(entry.key());
                entry.insert(value)
            }
        }
    }

    /// Runs `f` on the value if the key is present, leaving vacant entries
    /// untouched.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns the key of this entry. For an occupied entry this is the key
    /// already stored in the map.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V> Entry<'a, K, V>
where
    V: Default,
{
    /// Inserts `V::default()` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// An entry whose key is absent; inserting claims a free slot.
pub struct VacantEntry<'a, K, V> {
    entry: crate::hash_table::VacantEntry<'a, (K, V)>,
    key: K,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// The key that `insert` will store.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the key without inserting anything.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        &mut self.entry.insert((self.key, value)).1
    }
}

/// An entry whose key is present in the map.
pub struct OccupiedEntry<'a, K, V> {
    entry: crate::hash_table::OccupiedEntry<'a, (K, V)>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.entry.get().0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.entry.get().1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().1
    }

    /// Consumes the entry, returning a mutable reference tied to the map borrow.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().1
    }

    /// Replaces the value, returning the old one. The stored key is kept.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(&mut self.entry.get_mut().1, value)
    }

    /// Removes the entry, leaving a tombstone, and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry, leaving a tombstone, and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove()
    }
}

/// An iterator over the key-value pairs of a [`Map`], in slot order.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (K, V)>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, (k, v))| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, (k, v))| (k, v))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A mutable iterator over the key-value pairs of a [`Map`], in slot order.
pub struct IterMut<'a, K, V> {
    inner: crate::hash_table::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, (k, v))| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, (k, v))| (&*k, v))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a [`Map`], in slot order.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a [`Map`], in slot order.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a [`Map`], in slot order.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// A draining iterator over the key-value pairs of a [`Map`].
pub struct Drain<'a, K, V> {
    inner: crate::hash_table::Drain<'a, (K, V)>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}

/// An owning iterator over the key-value pairs of a [`Map`], in slot order.
pub struct IntoIter<K, V> {
    inner: crate::hash_table::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::Cell;
    use core::hash::BuildHasher;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::hash_op::Djb2;
    use crate::hash_op::Identity;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    #[test]
    fn overwrite_keeps_len() {
        let mut map = Map::with_hash_op(Djb2);
        map.insert("a", 1);
        map.insert("b", 2);
        map.insert("a", 3);

        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], 3);
        assert_eq!(map["b"], 2);
    }

    #[test]
    #[cfg(not(feature = "load-factor-fifty"))]
    fn sixth_insert_doubles_capacity() {
        let mut map = Map::with_hash_op(Identity);
        assert_eq!(map.capacity(), 8);

        for key in 0..5u32 {
            map.insert(key, key * 100);
        }
        assert_eq!(map.capacity(), 8);

        map.insert(5, 500);
        assert_eq!(map.capacity(), 16);
        for key in 0..6u32 {
            assert_eq!(map.get(&key), Some(&(key * 100)));
        }
    }

    #[test]
    fn removed_key_is_skipped_by_iteration() {
        let mut map = Map::with_hash_op(SipHashBuilder::default());
        map.insert("first", 1);
        map.insert("second", 2);
        map.insert("third", 3);
        let before: Vec<&str> = map.keys().copied().collect();

        map.remove("second");
        let after: Vec<&str> = map.keys().copied().collect();
        let expected: Vec<&str> = before.into_iter().filter(|k| *k != "second").collect();
        assert_eq!(after, expected);
        assert_eq!(map.iter().len(), 2);
    }

    #[test]
    fn missing_key_lookups() {
        let mut map = Map::with_hash_op(Djb2);
        map.insert("a", 1);

        assert_eq!(map.try_get("z"), Err(MapError::NotFound));
        assert!(map.try_get("z").unwrap_err().is_not_found());
        assert!(!map.contains_key("z"));
        assert_eq!(map.get("z"), None);
    }

    #[test]
    #[should_panic(expected = "key not found")]
    fn index_missing_key_panics() {
        let mut map = Map::with_hash_op(Djb2);
        map.insert("a", 1);
        let _ = map["z"];
    }

    #[test]
    fn test_new_and_with_hash_op() {
        let map: Map<i32, String, SipHashBuilder> = Map::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.capacity(), crate::hash_table::INITIAL_CAPACITY);

        let map2 = Map::<i32, String, _>::with_hash_op(SipHashBuilder::default());
        assert!(map2.is_empty());
    }

    #[test]
    fn test_with_capacity() {
        let map: Map<i32, String, SipHashBuilder> = Map::with_capacity(100);
        assert_eq!(map.capacity(), 128);

        let mut empty = Map::<i32, i32, _>::with_capacity_and_hash_op(0, Identity);
        assert_eq!(empty.capacity(), 0);
        assert_eq!(empty.get(&1), None);
        empty.insert(1, 1);
        assert_eq!(empty.capacity(), crate::hash_table::INITIAL_CAPACITY);
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = Map::with_hash_op(SipHashBuilder::default());

        assert_eq!(map.insert(1, "hello".to_string()), None);
        assert_eq!(map.len(), 1);
        assert!(!map.is_empty());

        assert_eq!(map.get(&1), Some(&"hello".to_string()));
        assert_eq!(map.get(&2), None);

        assert_eq!(
            map.insert(1, "world".to_string()),
            Some("hello".to_string())
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"world".to_string()));
        assert_eq!(map.get_key_value(&1), Some((&1, &"world".to_string())));
    }

    #[test]
    fn test_get_mut() {
        let mut map = Map::with_hash_op(SipHashBuilder::default());
        map.insert(1, "hello".to_string());

        if let Some(value) = map.get_mut(&1) {
            value.push_str(" world");
        }

        assert_eq!(map.get(&1), Some(&"hello world".to_string()));
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn test_get_or_default() {
        let mut map: Map<String, u32, _> = Map::with_hash_op(Djb2);
        *map.get_or_default("hits".to_string()) += 1;
        *map.get_or_default("hits".to_string()) += 1;
        assert_eq!(map.get_or_default("misses".to_string()), &0);

        assert_eq!(map["hits"], 2);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut map = Map::with_hash_op(SipHashBuilder::default());
        map.insert(1, "hello".to_string());
        map.insert(2, "world".to_string());

        assert_eq!(map.remove(&1), Some("hello".to_string()));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));

        assert_eq!(map.remove(&1), None);
        assert_eq!(map.remove(&3), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_remove_entry() {
        let mut map = Map::with_hash_op(SipHashBuilder::default());
        map.insert(1, "hello".to_string());

        assert_eq!(map.remove_entry(&1), Some((1, "hello".to_string())));
        assert_eq!(map.len(), 0);
        assert_eq!(map.remove_entry(&1), None);
    }

    #[test]
    fn test_clear() {
        let mut map = Map::with_hash_op(SipHashBuilder::default());
        map.insert(1, "hello".to_string());
        map.insert(2, "world".to_string());
        map.remove(&2);
        let capacity = map.capacity();

        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.tombstones(), 0);
        assert_eq!(map.capacity(), capacity);
        assert!(!map.contains_key(&1));
    }

    #[test]
    fn take_leaves_unallocated_map() {
        let mut map = Map::with_hash_op(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());

        let mut moved = map.take();
        assert_eq!(moved.len(), 2);
        assert_eq!(moved.get(&2), Some(&"two".to_string()));
        assert!(map.is_empty());
        assert_eq!(map.capacity(), 0);
        assert_eq!(map.cursor_front(), map.cursor_end());

        map.insert(3, "three".to_string());
        assert_eq!(map.capacity(), crate::hash_table::INITIAL_CAPACITY);
        moved.insert(3, "three".to_string());
        assert_eq!(moved.len(), 3);
    }

    #[test]
    fn test_reserve() {
        let mut map = Map::<i32, String, _>::with_hash_op(SipHashBuilder::default());
        map.reserve(1000);
        let capacity = map.capacity();
        assert!(capacity >= 1000);

        for i in 0..1000 {
            map.insert(i, i.to_string());
        }
        assert_eq!(map.capacity(), capacity);
    }

    #[test]
    fn test_entry_api() {
        let mut map = Map::with_hash_op(SipHashBuilder::default());

        let value = map.entry(1).or_insert("hello".to_string());
        assert_eq!(value, &"hello".to_string());
        assert_eq!(map.len(), 1);

        let value = map.entry(1).or_insert("world".to_string());
        assert_eq!(value, &"hello".to_string());
        assert_eq!(map.len(), 1);

        map.entry(2).or_insert_with(|| "computed".to_string());
        assert_eq!(map.get(&2), Some(&"computed".to_string()));

        map.entry(1)
            .and_modify(|v| v.push_str(" world"))
            .or_insert("default".to_string());
        assert_eq!(map.get(&1), Some(&"hello world".to_string()));

        map.entry(4).or_insert_with_key(|k| format!("key {k}"));
        assert_eq!(map.get(&4), Some(&"key 4".to_string()));

        assert_eq!(map.entry(3).key(), &3);
    }

    #[test]
    fn test_occupied_entry() {
        let mut map = Map::with_hash_op(SipHashBuilder::default());
        map.insert(1, "hello".to_string());

        match map.entry(1) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), &1);
                assert_eq!(entry.get(), &"hello".to_string());

                *entry.get_mut() = "world".to_string();
                let old_value = entry.insert("new".to_string());
                assert_eq!(old_value, "world".to_string());

                let (key, value) = entry.remove_entry();
                assert_eq!(key, 1);
                assert_eq!(value, "new".to_string());
            }
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }

        assert!(map.is_empty());
    }

    #[test]
    fn test_vacant_entry() {
        let mut map = Map::with_hash_op(SipHashBuilder::default());

        match map.entry(1) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.key(), &1);
                let value = entry.insert("hello".to_string());
                assert_eq!(value, &"hello".to_string());
            }
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"hello".to_string()));
    }

    #[test]
    fn growth_keeps_every_pair() {
        let mut map = Map::with_hash_op(SipHashBuilder::default());
        let mut capacities = vec![map.capacity()];
        for i in 0..1000u32 {
            map.insert(i, i * 3);
            if map.capacity() != *capacities.last().unwrap() {
                capacities.push(map.capacity());
            }
        }

        assert!(capacities.len() > 5);
        assert!(capacities.windows(2).all(|w| w[1] == w[0] * 2));
        assert_eq!(map.len(), 1000);

        let mut keys: Vec<u32> = map.keys().copied().collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..1000).collect::<Vec<_>>());
        assert!(map.iter().all(|(k, v)| *v == k * 3));
    }

    #[test]
    fn iteration_is_slot_ordered_and_reversible() {
        let mut map = Map::with_hash_op(Identity);
        for key in [7u32, 3, 12, 1, 9] {
            map.insert(key, key);
        }
        map.remove(&12);

        let forward: Vec<u32> = map.keys().copied().collect();
        let mut backward: Vec<u32> = map.keys().rev().copied().collect();
        backward.reverse();
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), map.len());

        let positions: Vec<usize> = forward
            .iter()
            .map(|k| map.find(k).unwrap().index())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let values: Vec<u32> = map.values().rev().copied().collect();
        assert_eq!(values.len(), 4);
        assert_eq!(map.keys().len(), 4);
    }

    #[test]
    fn test_iter_mut_and_values_mut() {
        let mut map = Map::with_hash_op(Identity);
        for key in 0..10u32 {
            map.insert(key, key);
        }

        for (key, value) in map.iter_mut() {
            *value += key;
        }
        for value in map.values_mut() {
            *value += 1;
        }
        for (key, value) in &mut map {
            *value *= if key % 2 == 0 { 1 } else { 10 };
        }

        assert_eq!(map[&4], 9);
        assert_eq!(map[&5], 110);
    }

    #[test]
    fn test_drain() {
        let mut map = Map::with_hash_op(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());
        map.insert(3, "three".to_string());
        let capacity = map.capacity();

        let drained: std::collections::HashMap<i32, String> = map.drain().collect();
        assert_eq!(drained.len(), 3);
        assert!(map.is_empty());
        assert_eq!(map.capacity(), capacity);
        assert_eq!(drained.get(&2), Some(&"two".to_string()));
    }

    #[test]
    fn forgotten_drain_keeps_remaining_entries() {
        let mut map = Map::with_hash_op(Identity);
        for i in 0..4u32 {
            map.insert(i, i);
        }

        core::mem::forget(map.drain());
        assert_eq!(map.len(), 4);
        assert!(map.contains_key(&2));
        assert_eq!(map.iter().count(), 4);
        assert_eq!(map.remove(&2), Some(2));
        assert_eq!(map.len(), 3);

        let mut drain = map.drain();
        assert!(drain.next().is_some());
        core::mem::forget(drain);
        assert_eq!(map.len(), 2);
        assert_eq!(map.iter().count(), 2);
        map.insert(9, 9);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_into_iter() {
        let mut map = Map::with_hash_op(Identity);
        map.extend([(1u32, 'a'), (2, 'b'), (3, 'c')]);
        let pairs: Vec<(u32, char)> = map.clone().into_iter().collect();
        assert_eq!(pairs, [(1, 'a'), (2, 'b'), (3, 'c')]);
        let reversed: Vec<(u32, char)> = map.into_iter().rev().collect();
        assert_eq!(reversed, [(3, 'c'), (2, 'b'), (1, 'a')]);
    }

    #[test]
    fn positions_go_stale() {
        let mut map = Map::with_capacity_and_hash_op(64, Identity);
        map.insert(1u32, 'a');
        map.insert(2u32, 'b');
        map.insert(3u32, 'c');

        let position = map.find(&2).unwrap();
        assert_eq!(map.get_at(position), Ok((&2, &'b')));

        map.insert(4, 'd');
        assert_eq!(map.get_at(position), Ok((&2, &'b')));

        map.remove(&1);
        assert!(matches!(
            map.get_at(position),
            Err(MapError::StalePosition { .. })
        ));

        let position = map.find(&2).unwrap();
        map.compact();
        assert!(matches!(
            map.remove_at(position),
            Err(MapError::StalePosition { .. })
        ));

        let position = map.find(&2).unwrap();
        for key in 10..60u32 {
            map.insert(key, 'z');
        }
        assert!(matches!(
            map.get_at(position),
            Err(MapError::StalePosition { .. })
        ));

        let position = map.find(&2).unwrap();
        map.clear();
        assert!(matches!(
            map.cursor_at(position),
            Err(MapError::StalePosition { .. })
        ));
    }

    #[test]
    fn vacant_position_is_rejected() {
        let mut map = Map::with_hash_op(Identity);
        map.insert(1u32, 'a');
        let position = map.cursor_front().position().unwrap();
        let bogus = Position {
            index: 5,
            generation: position.generation(),
        };
        assert_eq!(map.get_at(bogus), Err(MapError::VacantPosition));
        let out_of_range = Position {
            index: 500,
            generation: position.generation(),
        };
        assert_eq!(map.get_at(out_of_range), Err(MapError::VacantPosition));
    }

    #[test]
    fn swap_exchanges_values_only() {
        let mut map = Map::with_hash_op(Djb2);
        map.insert("x", 1);
        map.insert("y", 2);
        let x = map.find("x").unwrap();
        let y = map.find("y").unwrap();

        map.swap(x, y).unwrap();
        assert_eq!(map["x"], 2);
        assert_eq!(map["y"], 1);
        assert_eq!(map.find("x"), Some(x));

        map.swap(x, x).unwrap();
        assert_eq!(map["x"], 2);

        map.remove("y");
        assert!(matches!(
            map.swap(x, y),
            Err(MapError::StalePosition { .. })
        ));
    }

    #[test]
    fn get_at_mut_updates_value() {
        let mut map = Map::with_hash_op(Identity);
        map.insert(8u32, 1);
        let position = map.find(&8).unwrap();
        {
            let (key, value) = map.get_at_mut(position).unwrap();
            assert_eq!(*key, 8);
            *value = 80;
        }
        assert_eq!(map[&8], 80);
    }

    #[test]
    fn find_by_value_and_predicate() {
        let mut map = Map::with_hash_op(Identity);
        for key in 0..6u32 {
            map.insert(key, key * key);
        }

        let position = map.find_value(&16).unwrap();
        assert_eq!(map.get_at(position), Ok((&4, &16)));
        assert!(map.find_value(&7).is_none());

        let position = map.find_by(|k, v| *k > 1 && v % 2 == 1).unwrap();
        assert_eq!(map.get_at(position), Ok((&3, &9)));
        assert!(map.find_by(|_, v| *v > 100).is_none());
    }

    #[test]
    fn remove_value_and_retain() {
        let mut map = Map::with_hash_op(Identity);
        for key in 0..10u32 {
            map.insert(key, key % 3);
        }

        assert!(map.remove_value(&2));
        assert!(!map.contains_key(&2));
        assert_eq!(map.len(), 9);
        assert!(!map.remove_value(&7));

        map.retain(|_, v| *v != 0);
        assert_eq!(map.len(), 5);
        assert!(map.values().all(|v| *v != 0));
    }

    #[test]
    fn compact_drops_tombstones() {
        let mut map = Map::with_hash_op(SipHashBuilder::default());
        for i in 0..50u32 {
            map.insert(i, i);
        }
        for i in 0..40u32 {
            map.remove(&i);
        }
        let capacity = map.capacity();
        assert_eq!(map.tombstones(), 40);

        map.compact();
        assert_eq!(map.tombstones(), 0);
        assert_eq!(map.capacity(), capacity);
        assert_eq!(map.len(), 10);
        for i in 40..50u32 {
            assert_eq!(map.get(&i), Some(&i));
        }
    }

    #[test]
    fn try_insert_and_try_reserve() {
        let mut map = Map::with_hash_op(Identity);
        assert_eq!(map.try_insert(1u32, 'a'), Ok(None));
        assert_eq!(map.try_insert(1u32, 'b'), Ok(Some('a')));

        let capacity = map.capacity();
        assert_eq!(map.try_reserve(usize::MAX), Err(MapError::CapacityOverflow));
        assert_eq!(map.capacity(), capacity);
        assert_eq!(map[&1], 'b');

        assert!(map.try_reserve(100).is_ok());
        assert!(map.capacity() >= 128);

        assert_eq!(
            Map::<u32, u32, _>::try_with_capacity_and_hash_op(usize::MAX, Identity).unwrap_err(),
            MapError::CapacityOverflow
        );
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[cfg_attr(miri, ignore)]
    fn try_reserve_reports_alloc_failure() {
        let mut map = Map::with_hash_op(Identity);
        map.insert(1u32, 'a');
        let capacity = map.capacity();

        assert!(matches!(
            map.try_reserve(1usize << 50),
            Err(MapError::AllocFailed { .. })
        ));
        assert_eq!(map.capacity(), capacity);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&'a'));
    }

    #[test]
    fn equality_ignores_layout() {
        let a: Map<u32, u32, Identity> = (0..20).map(|i| (i, i)).collect();
        let mut b = Map::with_capacity_and_hash_op(256, Identity);
        for i in (0..20u32).rev() {
            b.insert(i, i);
        }
        assert_eq!(a, b);

        b.insert(3, 4);
        assert_ne!(a, b);
        b.insert(3, 3);
        b.insert(21, 21);
        assert_ne!(a, b);
    }

    #[test]
    fn extend_and_from_iter() {
        let mut map: Map<&str, i32, Djb2> = [("a", 1), ("b", 2)].into_iter().collect();
        let other = Map::<&str, i32, Djb2>::from([("b", 20), ("c", 30)]);

        map.extend(&other);
        assert_eq!(map.len(), 3);
        assert_eq!(map["b"], 20);
        map.extend([("d", 4)]);
        assert_eq!(map["d"], 4);
    }

    #[test]
    fn display_and_debug() {
        let mut map = Map::with_hash_op(Identity);
        map.insert(2u32, "two");
        map.insert(1u32, "one");
        assert_eq!(format!("{map}"), "{'1': one, '2': two}");
        assert_eq!(format!("{map:?}"), r#"{1: "one", 2: "two"}"#);

        let empty: Map<u32, u32, Identity> = Map::with_hash_op(Identity);
        assert_eq!(format!("{empty}"), "{}");
    }

    #[test]
    fn values_drop_exactly_once() {
        struct Tracked(Rc<Cell<usize>>);

        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let drops = Rc::new(Cell::new(0));
        {
            let mut map = Map::with_hash_op(Identity);
            for key in 0..32u32 {
                map.insert(key, Tracked(drops.clone()));
            }
            map.insert(0, Tracked(drops.clone()));
            assert_eq!(drops.get(), 1);

            map.remove(&1);
            assert_eq!(drops.get(), 2);

            map.compact();
            assert_eq!(drops.get(), 2);

            let _ = map.drain().take(3).count();
            assert_eq!(drops.get(), 33);

            for key in 0..4u32 {
                map.insert(key, Tracked(drops.clone()));
            }
        }
        assert_eq!(drops.get(), 37);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn matches_std_hash_map() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let mut map = Map::with_hash_op(SipHashBuilder::default());
        let mut model = std::collections::HashMap::new();

        for step in 0..20000u32 {
            let key: u16 = rng.random_range(0..512);
            match rng.random_range(0..10) {
                0..=4 => {
                    assert_eq!(map.insert(key, step), model.insert(key, step));
                }
                5..=7 => {
                    assert_eq!(map.remove(&key), model.remove(&key));
                }
                8 => {
                    assert_eq!(map.get(&key), model.get(&key));
                }
                _ => {
                    if rng.random_bool(0.05) {
                        map.compact();
                    }
                    assert_eq!(map.contains_key(&key), model.contains_key(&key));
                }
            }
            assert_eq!(map.len(), model.len());
        }

        assert_eq!(map.iter().len(), model.len());
        for (key, value) in map.iter() {
            assert_eq!(model.get(key), Some(value));
        }
    }
}
