use alloc::string::String;
use alloc::vec::Vec;
use core::hash::BuildHasher;
use core::hash::Hash;

use cfg_if::cfg_if;

/// A hash capability: maps a key to a register-width hash.
///
/// [`Map`](crate::Map) stores at most one entry per hash value, so two keys
/// that hash equal under a `HashOp` are the same key as far as the map is
/// concerned. Use a hash op that is injective over the keys you store, or a
/// keyed hasher wide enough that collisions do not occur in practice.
///
/// Every [`BuildHasher`] is a `HashOp` for every `Hash` key, with the 64-bit
/// hash truncated to `usize`.
///
/// ## Example
///
/// ```rust
/// use probe_map::hash_op::Djb2;
/// use probe_map::hash_op::HashOp;
/// use probe_map::hash_op::Identity;
///
/// assert_eq!(Identity.hash_of(&42u32), 42);
/// assert_eq!(Djb2.hash_of("a"), 5381 * 33 + 97);
/// ```
pub trait HashOp<K: ?Sized> {
    /// Hashes `key`. Must return the same value for the same key every time
    /// it is called on the same `self`.
    fn hash_of(&self, key: &K) -> usize;
}

impl<K, S> HashOp<K> for S
where
    K: Hash + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn hash_of(&self, key: &K) -> usize {
        self.hash_one(key) as usize
    }
}

/// Hashes integers to themselves.
///
/// Injective for every integer type no wider than `usize`, which makes it an
/// exact key identity for [`Map`](crate::Map). Sequential keys fill
/// consecutive slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

macro_rules! identity_hash {
    ($($ty:ty),* $(,)?) => {
        $(
            impl HashOp<$ty> for Identity {
                #[inline(always)]
                fn hash_of(&self, key: &$ty) -> usize {
                    *key as usize
                }
            }
        )*
    };
}

identity_hash!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl HashOp<char> for Identity {
    #[inline(always)]
    fn hash_of(&self, key: &char) -> usize {
        *key as usize
    }
}

impl HashOp<bool> for Identity {
    #[inline(always)]
    fn hash_of(&self, key: &bool) -> usize {
        *key as usize
    }
}

/// Bernstein's string hash: `h = h * 33 + byte`, seeded with 5381, computed in
/// wrapping `usize` arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Djb2;

impl Djb2 {
    /// Hashes a byte string.
    #[inline]
    pub fn hash_bytes(bytes: &[u8]) -> usize {
        bytes.iter().fold(5381usize, |hash, &byte| {
            hash.wrapping_mul(33).wrapping_add(byte as usize)
        })
    }
}

impl HashOp<[u8]> for Djb2 {
    #[inline]
    fn hash_of(&self, key: &[u8]) -> usize {
        Djb2::hash_bytes(key)
    }
}

impl HashOp<Vec<u8>> for Djb2 {
    #[inline]
    fn hash_of(&self, key: &Vec<u8>) -> usize {
        Djb2::hash_bytes(key)
    }
}

impl HashOp<str> for Djb2 {
    #[inline]
    fn hash_of(&self, key: &str) -> usize {
        Djb2::hash_bytes(key.as_bytes())
    }
}

impl HashOp<String> for Djb2 {
    #[inline]
    fn hash_of(&self, key: &String) -> usize {
        Djb2::hash_bytes(key.as_bytes())
    }
}

impl<T> HashOp<&T> for Djb2
where
    T: ?Sized,
    Djb2: HashOp<T>,
{
    #[inline]
    fn hash_of(&self, key: &&T) -> usize {
        self.hash_of(*key)
    }
}

cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Hash op used by [`Map`](crate::Map) when none is named.
        pub type DefaultHashOp = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// Hash op used by [`Map`](crate::Map) when none is named.
        pub type DefaultHashOp = std::hash::RandomState;
    } else {
        /// Hash op used by [`Map`](crate::Map) when none is named. Without
        /// `foldhash` or `std` only integer keys have a default hash op.
        pub type DefaultHashOp = Identity;
    }
}
