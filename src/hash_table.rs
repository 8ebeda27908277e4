use alloc::alloc::handle_alloc_error;
use alloc::vec::Vec;
use core::alloc::Layout;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::mem;

use cfg_if::cfg_if;

use crate::error::MapError;

/// Number of slots allocated by [`HashTable::new`] and by the first growth of
/// an unallocated table.
pub const INITIAL_CAPACITY: usize = 8;

cfg_if! {
    if #[cfg(feature = "load-factor-fifty")] {
        const LOAD_FACTOR_NUMERATOR: usize = 1;
        const LOAD_FACTOR_DENOMINATOR: usize = 2;
    } else {
        const LOAD_FACTOR_NUMERATOR: usize = 7;
        const LOAD_FACTOR_DENOMINATOR: usize = 10;
    }
}

/// Returns `true` once holding `len` entries in `capacity` slots reaches the
/// growth threshold.
#[inline(always)]
fn reaches_load_factor(len: usize, capacity: usize) -> bool {
    len.saturating_mul(LOAD_FACTOR_DENOMINATOR) >= capacity.saturating_mul(LOAD_FACTOR_NUMERATOR)
}

/// Triangular-number probe sequence: `hash + i * (i + 1) / 2` for `i` in
/// `0..capacity`, masked to the table size.
///
/// For a power-of-two capacity this visits every slot exactly once.
#[derive(Clone)]
struct ProbeSeq {
    pos: usize,
    stride: usize,
    mask: usize,
    remaining: usize,
}

impl ProbeSeq {
    #[inline(always)]
    fn new(hash: usize, capacity: usize) -> Self {
        let mask = capacity.wrapping_sub(1);
        ProbeSeq {
            pos: hash & mask,
            stride: 0,
            mask,
            remaining: capacity,
        }
    }
}

impl Iterator for ProbeSeq {
    type Item = usize;

    #[inline(always)]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }

        let current = self.pos;
        self.stride += 1;
        self.pos = self.pos.wrapping_add(self.stride) & self.mask;
        self.remaining -= 1;
        Some(current)
    }
}

#[derive(Clone)]
enum Slot<V> {
    Vacant,
    Tombstone,
    Occupied { hash: usize, value: V },
}

impl<V> Slot<V> {
    #[inline(always)]
    fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied { .. })
    }

    #[inline(always)]
    fn value(&self) -> Option<&V> {
        match self {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    #[inline(always)]
    fn value_mut(&mut self) -> Option<&mut V> {
        match self {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Allocates `capacity` vacant slots, reporting failure instead of aborting.
fn allocate_slots<V>(capacity: usize) -> Result<Vec<Slot<V>>, MapError> {
    Layout::array::<Slot<V>>(capacity).map_err(|_| MapError::CapacityOverflow)?;

    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| MapError::AllocFailed { capacity })?;
    slots.resize_with(capacity, || Slot::Vacant);
    Ok(slots)
}

/// Escalates an error from a fallible growth path the way `Vec` does: abort on
/// allocation failure, panic on capacity overflow.
#[cold]
#[inline(never)]
fn growth_failed<V>(err: MapError) -> ! {
    match err {
        MapError::AllocFailed { capacity } => match Layout::array::<Slot<V>>(capacity) {
            Ok(layout) => handle_alloc_error(layout),
            Err(_) => panic!("capacity overflow"),
        },
        err => panic!("{err}"),
    }
}

/// Rounds a requested slot count up to a valid table size.
fn table_size_for(slots: usize) -> Result<usize, MapError> {
    if slots == 0 {
        return Ok(0);
    }
    slots
        .checked_next_power_of_two()
        .ok_or(MapError::CapacityOverflow)
}

/// An open-addressing hash table with triangular quadratic probing.
///
/// `HashTable<V>` stores values of type `V` together with a caller-supplied
/// `usize` hash. Two values with the same hash are the same entry: inserting
/// under a hash that is already present evicts the previous occupant. Callers
/// that need a key/value view use [`Map`](crate::Map), which layers a hash
/// capability over this table.
///
/// Removal leaves a tombstone behind. Searches step over tombstones and only
/// stop early at a slot that has never been occupied since the last growth,
/// compaction or clear, so a lookup miss degrades towards `O(capacity)` as
/// tombstones accumulate. Growth and [`compact`](HashTable::compact) drop all
/// tombstones.
///
/// The table size is always zero or a power of two, and the table grows by
/// doubling before an insertion would take the load factor to the threshold
/// (7/10 by default, 1/2 with the `load-factor-fifty` feature).
///
/// ## Example
///
/// ```rust
/// use probe_map::hash_table::HashTable;
///
/// let mut table = HashTable::new();
/// table.insert(17, "seventeen");
/// table.insert(42, "forty-two");
///
/// assert_eq!(table.find(42), Some(&"forty-two"));
/// assert_eq!(table.remove(17), Some("seventeen"));
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Clone)]
pub struct HashTable<V> {
    slots: Vec<Slot<V>>,
    len: usize,
    tombstones: usize,
    generation: u64,
}

impl<V> Debug for HashTable<V>
where
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct Slots<'a, V>(&'a [Slot<V>]);

        impl<V: Debug> Debug for Slots<'_, V> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let mut list = f.debug_list();
                for slot in self.0 {
                    match slot {
                        Slot::Vacant => list.entry(&format_args!("-")),
                        Slot::Tombstone => list.entry(&format_args!("x")),
                        Slot::Occupied { hash, value } => {
                            list.entry(&format_args!("{hash:#x}: {value:?}"))
                        }
                    };
                }
                list.finish()
            }
        }

        f.debug_struct("HashTable")
            .field("slots", &Slots(&self.slots))
            .field("len", &self.len)
            .field("tombstones", &self.tombstones)
            .field("capacity", &self.capacity())
            .field("generation", &self.generation)
            .finish()
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HashTable<V> {
    /// Creates a table with [`INITIAL_CAPACITY`] slots.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Creates a table with at least `capacity` slots, rounded up to a power
    /// of two. A capacity of zero allocates nothing until the first insertion.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::hash_table::HashTable;
    /// let table: HashTable<u32> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(table) => table,
            Err(err) => growth_failed::<V>(err),
        }
    }

    /// Fallible version of [`with_capacity`](HashTable::with_capacity).
    pub fn try_with_capacity(capacity: usize) -> Result<Self, MapError> {
        let capacity = table_size_for(capacity)?;
        Ok(Self {
            slots: allocate_slots(capacity)?,
            len: 0,
            tombstones: 0,
            generation: 0,
        })
    }

    /// Returns the number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slot is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots, occupied or not. Always zero or a power of
    /// two.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of tombstones left behind by removals since the last
    /// growth, compaction or clear.
    #[inline]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Returns the current generation. It changes whenever an occupied slot is
    /// vacated or the table is rebuilt, which invalidates slot indices handed
    /// out earlier.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Returns the index of the slot holding `hash`, if any.
    pub fn search(&self, hash: usize) -> Option<usize> {
        for index in ProbeSeq::new(hash, self.capacity()) {
            match &self.slots[index] {
                Slot::Vacant => return None,
                Slot::Occupied { hash: stored, .. } if *stored == hash => return Some(index),
                _ => {}
            }
        }

        None
    }

    /// Returns the value stored under `hash`.
    pub fn find(&self, hash: usize) -> Option<&V> {
        self.search(hash).and_then(|index| self.slots[index].value())
    }

    /// Returns a mutable reference to the value stored under `hash`.
    pub fn find_mut(&mut self, hash: usize) -> Option<&mut V> {
        let index = self.search(hash)?;
        self.slots[index].value_mut()
    }

    /// Returns the first slot in the probe sequence of `hash` that can take a
    /// new occupant.
    fn find_free(&self, hash: usize) -> usize {
        for index in ProbeSeq::new(hash, self.capacity()) {
            if !self.slots[index].is_occupied() {
                return index;
            }
        }

        unreachable!("probe sequence exhausted: the table must grow before it fills up")
    }

    /// Moves `value` into the free slot at `index`.
    fn claim(&mut self, index: usize, hash: usize, value: V) -> &mut V {
        let slot = &mut self.slots[index];
        debug_assert!(!slot.is_occupied());
        if matches!(slot, Slot::Tombstone) {
            self.tombstones -= 1;
        }
        *slot = Slot::Occupied { hash, value };
        self.len += 1;

        match slot {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!(),
        }
    }

    /// Turns the slot at `index` into a tombstone and returns its value.
    fn take(&mut self, index: usize) -> Option<V> {
        let slot = self.slots.get_mut(index)?;
        if !slot.is_occupied() {
            return None;
        }

        let Slot::Occupied { value, .. } = mem::replace(slot, Slot::Tombstone) else {
            unreachable!()
        };
        self.len -= 1;
        self.tombstones += 1;
        Some(value)
    }

    /// Inserts `value` under `hash`, growing the table first if needed.
    ///
    /// If `hash` is already present, the previous occupant is removed first
    /// and returned; the new value lands in the first free slot of the probe
    /// sequence, which may be an earlier tombstone. Returns the index of the
    /// slot now holding `value`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::hash_table::HashTable;
    /// let mut table = HashTable::new();
    /// let (index, previous) = table.insert(3, 'a');
    /// assert_eq!(previous, None);
    /// assert_eq!(table.get(index), Some(&'a'));
    ///
    /// let (_, previous) = table.insert(3, 'b');
    /// assert_eq!(previous, Some('a'));
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn insert(&mut self, hash: usize, value: V) -> (usize, Option<V>) {
        match self.try_insert(hash, value) {
            Ok(inserted) => inserted,
            Err(err) => growth_failed::<V>(err),
        }
    }

    /// Fallible version of [`insert`](HashTable::insert). On error the table
    /// is left exactly as it was.
    pub fn try_insert(&mut self, hash: usize, value: V) -> Result<(usize, Option<V>), MapError> {
        let existing = self.search(hash);
        if existing.is_none() {
            self.try_reserve_one()?;
        }

        let previous = existing.and_then(|index| self.take(index));
        let index = self.find_free(hash);
        if existing.is_some_and(|old| old != index) {
            self.bump_generation();
        }
        self.claim(index, hash, value);

        Ok((index, previous))
    }

    /// Removes and returns the value stored under `hash`.
    pub fn remove(&mut self, hash: usize) -> Option<V> {
        let index = self.search(hash)?;
        self.remove_at(index)
    }

    /// Removes and returns the value in the slot at `index`, leaving a
    /// tombstone. Returns `None` if the slot is not occupied.
    pub fn remove_at(&mut self, index: usize) -> Option<V> {
        let value = self.take(index)?;
        self.bump_generation();
        Some(value)
    }

    /// Returns the value in the slot at `index`, if occupied.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&V> {
        self.slots.get(index).and_then(Slot::value)
    }

    /// Returns a mutable reference to the value in the slot at `index`, if
    /// occupied.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut V> {
        self.slots.get_mut(index).and_then(Slot::value_mut)
    }

    /// Returns the cached hash of the slot at `index`, if occupied.
    #[inline]
    pub fn hash_at(&self, index: usize) -> Option<usize> {
        match self.slots.get(index)? {
            Slot::Occupied { hash, .. } => Some(*hash),
            _ => None,
        }
    }

    /// Returns mutable references to the values of two distinct occupied
    /// slots.
    pub fn get_pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut V, &mut V)> {
        let [first, second] = self.slots.get_disjoint_mut([a, b]).ok()?;
        Some((first.value_mut()?, second.value_mut()?))
    }

    /// Index of the first occupied slot at or after `index`.
    #[inline]
    pub fn occupied_from(&self, index: usize) -> Option<usize> {
        self.slots
            .get(index..)?
            .iter()
            .position(Slot::is_occupied)
            .map(|offset| index + offset)
    }

    /// Index of the last occupied slot at or before `index`.
    #[inline]
    pub fn occupied_until(&self, index: usize) -> Option<usize> {
        let end = index.saturating_add(1).min(self.capacity());
        self.slots[..end].iter().rposition(Slot::is_occupied)
    }

    /// Gets the entry for `hash`, growing the table first if `hash` is absent
    /// and one more entry would reach the load factor.
    pub fn entry(&mut self, hash: usize) -> Entry<'_, V> {
        match self.try_entry(hash) {
            Ok(entry) => entry,
            Err(err) => growth_failed::<V>(err),
        }
    }

    /// Fallible version of [`entry`](HashTable::entry).
    pub fn try_entry(&mut self, hash: usize) -> Result<Entry<'_, V>, MapError> {
        match self.search(hash) {
            Some(index) => Ok(Entry::Occupied(OccupiedEntry { table: self, index })),
            None => {
                self.try_reserve_one()?;
                Ok(Entry::Vacant(VacantEntry { table: self, hash }))
            }
        }
    }

    /// Ensures that `additional` more entries fit without growing.
    pub fn reserve(&mut self, additional: usize) {
        if let Err(err) = self.try_reserve(additional) {
            growth_failed::<V>(err)
        }
    }

    /// Fallible version of [`reserve`](HashTable::reserve). On error the table
    /// is left exactly as it was.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), MapError> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(MapError::CapacityOverflow)?;
        if !reaches_load_factor(required, self.capacity()) {
            return Ok(());
        }

        let mut capacity = self.capacity().max(INITIAL_CAPACITY);
        while reaches_load_factor(required, capacity) {
            capacity = capacity
                .checked_mul(2)
                .ok_or(MapError::CapacityOverflow)?;
        }
        self.try_rehash(capacity)
    }

    #[inline]
    fn try_reserve_one(&mut self) -> Result<(), MapError> {
        if reaches_load_factor(self.len + 1, self.capacity()) {
            self.try_grow()?;
        }
        Ok(())
    }

    #[cold]
    fn try_grow(&mut self) -> Result<(), MapError> {
        let capacity = self
            .capacity()
            .checked_mul(2)
            .ok_or(MapError::CapacityOverflow)?
            .max(INITIAL_CAPACITY);
        self.try_rehash(capacity)
    }

    /// Rebuilds the table at the same capacity, dropping every tombstone.
    ///
    /// Lookups never stop early on a tombstone, so a table that sees many
    /// removals between growths gets slower misses. Compaction restores the
    /// probe lengths of a freshly built table. It does nothing when there are
    /// no tombstones.
    pub fn compact(&mut self) {
        if let Err(err) = self.try_compact() {
            growth_failed::<V>(err)
        }
    }

    /// Fallible version of [`compact`](HashTable::compact).
    pub fn try_compact(&mut self) -> Result<(), MapError> {
        if self.tombstones == 0 {
            return Ok(());
        }
        self.try_rehash(self.capacity())
    }

    /// Moves every occupant into a freshly allocated table of `capacity`
    /// slots. The new table is allocated before anything is moved.
    fn try_rehash(&mut self, capacity: usize) -> Result<(), MapError> {
        debug_assert!(capacity.is_power_of_two());
        debug_assert!(!reaches_load_factor(self.len, capacity) || self.len == 0);

        let slots = allocate_slots(capacity)?;
        let old_slots = mem::replace(&mut self.slots, slots);

        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!(
                from = old_slots.len(),
                to = capacity,
                len = self.len,
                tombstones = self.tombstones,
                "rehashing table"
            );
        }

        self.len = 0;
        self.tombstones = 0;
        self.bump_generation();
        for slot in old_slots {
            if let Slot::Occupied { hash, value } = slot {
                let index = self.find_free(hash);
                self.claim(index, hash, value);
            }
        }

        Ok(())
    }

    /// Drops every value and marks every slot vacant. The capacity is kept.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Vacant;
        }
        self.len = 0;
        self.tombstones = 0;
        self.bump_generation();
    }

    /// Returns an iterator over the occupied slots as `(index, &value)`, in
    /// ascending slot order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            inner: self.slots.iter().enumerate(),
            remaining: self.len,
        }
    }

    /// Returns an iterator over the occupied slots as `(index, &mut value)`,
    /// in ascending slot order.
    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            inner: self.slots.iter_mut().enumerate(),
            remaining: self.len,
        }
    }

    /// Removes every value, yielding them in slot order. The capacity is kept.
    /// Values not consumed are dropped with the iterator.
    ///
    /// Each yielded slot becomes a tombstone until the iterator is dropped,
    /// so a leaked `Drain` leaves the table valid with the unyielded values
    /// still present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_map::hash_table::HashTable;
    /// let mut table = HashTable::new();
    /// table.insert(3, "c");
    /// table.insert(1, "a");
    ///
    /// let values: Vec<&str> = table.drain().collect();
    /// assert_eq!(values.len(), 2);
    /// assert!(table.is_empty());
    /// assert_eq!(table.tombstones(), 0);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, V> {
        self.bump_generation();
        Drain {
            table: self,
            slot_index: 0,
        }
    }
}

/// A view into a single entry of a [`HashTable`], which may be vacant or
/// occupied.
pub enum Entry<'a, V> {
    /// The hash is not present.
    Vacant(VacantEntry<'a, V>),
    /// The hash is present.
    Occupied(OccupiedEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the value returned by `default` if the entry is vacant.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }
}

/// A vacant entry. The table already has room for it.
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    hash: usize,
}

impl<'a, V> VacantEntry<'a, V> {
    /// The hash this entry will be stored under.
    pub fn hash(&self) -> usize {
        self.hash
    }

    /// Inserts `value` and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        let index = self.table.find_free(self.hash);
        self.table.claim(index, self.hash, value)
    }

    /// Inserts `value` and returns the index of the slot now holding it.
    pub fn insert_at(self, value: V) -> usize {
        let index = self.table.find_free(self.hash);
        self.table.claim(index, self.hash, value);
        index
    }
}

/// An occupied entry.
pub struct OccupiedEntry<'a, V> {
    table: &'a mut HashTable<V>,
    index: usize,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// Index of the slot holding this entry.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns a reference to the value.
    pub fn get(&self) -> &V {
        match self.table.get(self.index) {
            Some(value) => value,
            None => unreachable!("occupied entry points at a free slot"),
        }
    }

    /// Returns a mutable reference to the value.
    pub fn get_mut(&mut self) -> &mut V {
        match self.table.get_mut(self.index) {
            Some(value) => value,
            None => unreachable!("occupied entry points at a free slot"),
        }
    }

    /// Converts the entry into a mutable reference bound to the table.
    pub fn into_mut(self) -> &'a mut V {
        match self.table.get_mut(self.index) {
            Some(value) => value,
            None => unreachable!("occupied entry points at a free slot"),
        }
    }

    /// Removes the entry, leaving a tombstone, and returns its value.
    pub fn remove(self) -> V {
        match self.table.remove_at(self.index) {
            Some(value) => value,
            None => unreachable!("occupied entry points at a free slot"),
        }
    }
}

/// Iterator over the occupied slots of a [`HashTable`].
///
/// Created by [`HashTable::iter`].
pub struct Iter<'a, V> {
    inner: core::iter::Enumerate<core::slice::Iter<'a, Slot<V>>>,
    remaining: usize,
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (usize, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for (index, slot) in self.inner.by_ref() {
            if let Slot::Occupied { value, .. } = slot {
                self.remaining -= 1;
                return Some((index, value));
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> DoubleEndedIterator for Iter<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        while let Some((index, slot)) = self.inner.next_back() {
            if let Slot::Occupied { value, .. } = slot {
                self.remaining -= 1;
                return Some((index, value));
            }
        }

        None
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

/// Mutable iterator over the occupied slots of a [`HashTable`].
///
/// Created by [`HashTable::iter_mut`].
pub struct IterMut<'a, V> {
    inner: core::iter::Enumerate<core::slice::IterMut<'a, Slot<V>>>,
    remaining: usize,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = (usize, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        for (index, slot) in self.inner.by_ref() {
            if let Slot::Occupied { value, .. } = slot {
                self.remaining -= 1;
                return Some((index, value));
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> DoubleEndedIterator for IterMut<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        while let Some((index, slot)) = self.inner.next_back() {
            if let Slot::Occupied { value, .. } = slot {
                self.remaining -= 1;
                return Some((index, value));
            }
        }

        None
    }
}

impl<V> ExactSizeIterator for IterMut<'_, V> {}

impl<V> FusedIterator for IterMut<'_, V> {}

/// A draining iterator over the values of a [`HashTable`].
///
/// Created by [`HashTable::drain`].
pub struct Drain<'a, V> {
    table: &'a mut HashTable<V>,
    slot_index: usize,
}

impl<V> Iterator for Drain<'_, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        if self.table.len == 0 {
            return None;
        }

        while self.slot_index < self.table.slots.len() {
            let index = self.slot_index;
            self.slot_index += 1;
            if let Some(value) = self.table.take(index) {
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.table.len, Some(self.table.len))
    }
}

impl<V> ExactSizeIterator for Drain<'_, V> {}

impl<V> FusedIterator for Drain<'_, V> {}

impl<V> Drop for Drain<'_, V> {
    fn drop(&mut self) {
        for _ in &mut *self {}

        for slot in &mut self.table.slots {
            *slot = Slot::Vacant;
        }
        self.table.tombstones = 0;
    }
}

/// An owning iterator over the values of a [`HashTable`], in slot order.
pub struct IntoIter<V> {
    inner: alloc::vec::IntoIter<Slot<V>>,
    remaining: usize,
}

impl<V> IntoIterator for HashTable<V> {
    type Item = V;
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.slots.into_iter(),
            remaining: self.len,
        }
    }
}

impl<V> Iterator for IntoIter<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.inner.by_ref() {
            if let Slot::Occupied { value, .. } = slot {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> DoubleEndedIterator for IntoIter<V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.inner.next_back() {
            if let Slot::Occupied { value, .. } = slot {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}

#[cfg(feature = "stats")]
pub use stats::ProbeHistogram;
#[cfg(feature = "stats")]
pub use stats::TableStats;

#[cfg(feature = "stats")]
mod stats {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::HashTable;
    use super::ProbeSeq;
    use super::Slot;

    /// Occupancy and probe-length statistics of a [`HashTable`].
    #[derive(Debug, Clone, PartialEq)]
    pub struct TableStats {
        /// Number of occupied slots
        pub len: usize,
        /// Total number of slots
        pub capacity: usize,
        /// Slots vacated by removal and not yet reclaimed
        pub tombstones: usize,
        /// Slots never occupied since the last rebuild
        pub vacant: usize,
        /// `len / capacity`
        pub load_factor: f64,
        /// Longest probe distance of any occupant
        pub max_probe_length: usize,
        /// Mean probe distance over all occupants
        pub mean_probe_length: f64,
        /// Bytes held by the slot array
        pub total_bytes: usize,
    }

    impl TableStats {
        /// Pretty-print the statistics.
        #[cfg(feature = "std")]
        pub fn print(&self) {
            println!("=== Hash Table Statistics ===");
            println!(
                "Population: {}/{} ({:.2}% load factor)",
                self.len,
                self.capacity,
                self.load_factor * 100.0
            );
            println!("Tombstones: {}, vacant: {}", self.tombstones, self.vacant);
            println!(
                "Probe length: max {}, mean {:.2}",
                self.max_probe_length, self.mean_probe_length
            );
            println!("Total Allocated: {} bytes", self.total_bytes);
        }
    }

    /// Number of occupants found at each probe distance from their home slot.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ProbeHistogram {
        /// `bins[i]` counts occupants sitting `i` steps into their probe
        /// sequence.
        pub bins: Vec<usize>,
    }

    impl ProbeHistogram {
        /// Pretty-prints the histogram horizontally using stdout.
        #[cfg(feature = "std")]
        pub fn print(&self) {
            let max = self.bins.iter().copied().max().unwrap_or(0);
            if max == 0 {
                println!("probe histogram: empty");
                return;
            }

            let max_bar = 60usize;
            println!(
                "probe histogram ({} entries):",
                self.bins.iter().sum::<usize>()
            );
            for (distance, &count) in self.bins.iter().enumerate() {
                let width = (count * max_bar).div_ceil(max);
                println!("{:>3} | {} ({})", distance, "█".repeat(width), count);
            }
        }
    }

    impl<V> HashTable<V> {
        /// Probe distance of the occupant at `index`: the step of its probe
        /// sequence at which it was placed.
        fn probe_length(&self, index: usize, hash: usize) -> usize {
            ProbeSeq::new(hash, self.capacity())
                .position(|candidate| candidate == index)
                .unwrap_or(0)
        }

        /// Computes a histogram of probe distances for the current table.
        pub fn probe_histogram(&self) -> ProbeHistogram {
            let mut bins: Vec<usize> = vec![];
            for (index, slot) in self.slots.iter().enumerate() {
                if let Slot::Occupied { hash, .. } = slot {
                    let distance = self.probe_length(index, *hash);
                    if bins.len() <= distance {
                        bins.resize(distance + 1, 0);
                    }
                    bins[distance] += 1;
                }
            }

            ProbeHistogram { bins }
        }

        /// Returns occupancy and probe-length statistics.
        pub fn stats(&self) -> TableStats {
            let histogram = self.probe_histogram();
            let total_distance: usize = histogram
                .bins
                .iter()
                .enumerate()
                .map(|(distance, count)| distance * count)
                .sum();

            TableStats {
                len: self.len,
                capacity: self.capacity(),
                tombstones: self.tombstones,
                vacant: self.capacity() - self.len - self.tombstones,
                load_factor: if self.capacity() == 0 {
                    0.0
                } else {
                    self.len as f64 / self.capacity() as f64
                },
                max_probe_length: histogram.bins.len().saturating_sub(1),
                mean_probe_length: if self.len == 0 {
                    0.0
                } else {
                    total_distance as f64 / self.len as f64
                },
                total_bytes: self.capacity() * core::mem::size_of::<Slot<V>>(),
            }
        }
    }
}
