//! Map containers and the chained hash table
//! shared between them.
use alloc::vec::Vec;

use snafu::Snafu;

use super::{Kind, Object};

/// Buckets allocated by a freshly created map.
const INITIAL_BUCKETS: usize = 16;

/// Error returned when an entry of the wrong kinds is
/// offered to a [`TypedMap`].
///
/// Both offered objects ride along in the error, so the
/// caller keeps ownership of them.
#[derive(Debug, Snafu)]
#[snafu(display(
    "expected a ({expected_key:?}, {expected_value:?}) entry, found ({:?}, {:?})",
    key.kind(),
    value.kind()
))]
pub struct EntryKindMismatch {
    /// The map's key kind.
    pub expected_key: Kind,

    /// The map's value kind.
    pub expected_value: Kind,

    /// The offered key, returned to the caller.
    pub key: Object,

    /// The offered value, returned to the caller.
    pub value: Object,
}

#[derive(Debug, Clone)]
struct MapEntry {
    key: Object,
    value: Object,
}

/// Chained hash table over [`Object`] keys.
///
/// Entries live in one insertion-ordered backing vector;
/// each bucket chains indices into it. A key's bucket is
/// `hash_code mod bucket_count`, collisions append to the
/// chain, and lookups walk the chain with structural
/// equality. The table rehashes into twice the buckets
/// once three quarters of them are (on average) occupied,
/// which keeps chains short without ever being required
/// for correctness.
#[derive(Debug, Clone)]
pub(crate) struct MapCore {
    buckets: Vec<Vec<usize>>,
    entries: Vec<MapEntry>,
}

impl MapCore {
    fn new() -> Self {
        Self {
            buckets: alloc::vec![Vec::new(); INITIAL_BUCKETS],
            entries: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_for(hash: i32, bucket_count: usize) -> usize {
        hash as u32 as usize % bucket_count
    }

    /// Finds the entry index for `key`, if present.
    fn position(&self, key: &Object) -> Option<usize> {
        let bucket = &self.buckets[Self::bucket_for(key.hash_code(), self.buckets.len())];
        bucket
            .iter()
            .copied()
            .find(|&at| self.entries[at].key == *key)
    }

    fn get(&self, key: &Object) -> Option<&Object> {
        self.position(key).map(|at| &self.entries[at].value)
    }

    fn get_mut(&mut self, key: &Object) -> Option<&mut Object> {
        let at = self.position(key)?;
        Some(&mut self.entries[at].value)
    }

    /// Inserts `key → value`, returning the previous value
    /// if the key was already present.
    ///
    /// Replacement keeps the resident key object; the
    /// offered duplicate is dropped.
    fn insert(&mut self, key: Object, value: Object) -> Option<Object> {
        if let Some(at) = self.position(&key) {
            return Some(core::mem::replace(&mut self.entries[at].value, value));
        }

        self.grow_if_needed();
        let at = self.entries.len();
        let bucket = Self::bucket_for(key.hash_code(), self.buckets.len());
        self.entries.push(MapEntry { key, value });
        self.buckets[bucket].push(at);
        None
    }

    /// Unlinks `key`'s entry and returns its value.
    fn remove(&mut self, key: &Object) -> Option<Object> {
        let bucket = Self::bucket_for(key.hash_code(), self.buckets.len());
        let chain_pos = self.buckets[bucket]
            .iter()
            .position(|&at| self.entries[at].key == *key)?;
        let at = self.buckets[bucket].remove(chain_pos);
        let entry = self.entries.remove(at);

        // Entry indices past the removed slot shift down by one.
        for chain in &mut self.buckets {
            for index in chain {
                if *index > at {
                    *index -= 1;
                }
            }
        }

        Some(entry.value)
    }

    fn contains_key(&self, key: &Object) -> bool {
        self.position(key).is_some()
    }

    /// Iterates entries in insertion order.
    fn iter(&self) -> impl Iterator<Item = (&Object, &Object)> {
        self.entries.iter().map(|entry| (&entry.key, &entry.value))
    }

    fn grow_if_needed(&mut self) {
        if (self.entries.len() + 1) * 4 > self.buckets.len() * 3 {
            self.rehash(self.buckets.len() * 2);
        }
    }

    fn rehash(&mut self, bucket_count: usize) {
        self.buckets = alloc::vec![Vec::new(); bucket_count];
        for (at, entry) in self.entries.iter().enumerate() {
            let bucket = Self::bucket_for(entry.key.hash_code(), bucket_count);
            self.buckets[bucket].push(at);
        }
    }
}

impl Default for MapCore {
    fn default() -> Self {
        Self::new()
    }
}

/// Keyed entries whose keys all share one kind and whose
/// values all share another.
///
/// An empty map's key and value kinds are fluid, exactly
/// like an empty [`TypedArray`](super::TypedArray)'s
/// element kind: they can be assigned while the map is
/// empty, and the first inserted entry fixes them both.
#[derive(Debug, Clone, Default)]
pub struct TypedMap {
    key_kind: Kind,
    value_kind: Kind,
    core: MapCore,
}

impl TypedMap {
    /// Returns a new, empty map with [`Kind::Null`]
    /// key and value kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new, empty map accepting `key_kind`
    /// keys and `value_kind` values.
    pub fn with_entry_kinds(key_kind: Kind, value_kind: Kind) -> Self {
        Self {
            key_kind,
            value_kind,
            core: MapCore::new(),
        }
    }

    /// The kind shared by every key in the map.
    pub fn key_kind(&self) -> Kind {
        self.key_kind
    }

    /// The kind shared by every value in the map.
    pub fn value_kind(&self) -> Kind {
        self.value_kind
    }

    /// Assigns a new key kind.
    ///
    /// Does nothing unless the map is empty.
    pub fn set_key_kind(&mut self, key_kind: Kind) {
        if self.is_empty() {
            self.key_kind = key_kind;
        }
    }

    /// Assigns a new value kind.
    ///
    /// Does nothing unless the map is empty.
    pub fn set_value_kind(&mut self, value_kind: Kind) {
        if self.is_empty() {
            self.value_kind = value_kind;
        }
    }

    /// The number of entries in the map.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Returns true iff the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The map's bucket count.
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Returns the value keyed by `key`, if any.
    pub fn get(&self, key: &Object) -> Option<&Object> {
        self.core.get(key)
    }

    /// Returns the value keyed by `key` mutably, if any.
    pub fn get_mut(&mut self, key: &Object) -> Option<&mut Object> {
        self.core.get_mut(key)
    }

    /// Inserts `key → value`, returning the previous value
    /// if the key was already present.
    ///
    /// If the map is empty, its key and value kinds become
    /// the entry's kinds.
    pub fn insert(
        &mut self,
        key: Object,
        value: Object,
    ) -> Result<Option<Object>, EntryKindMismatch> {
        if self.is_empty() {
            self.key_kind = key.kind();
            self.value_kind = value.kind();
        }

        if key.kind() != self.key_kind || value.kind() != self.value_kind {
            return Err(EntryKindMismatch {
                expected_key: self.key_kind,
                expected_value: self.value_kind,
                key,
                value,
            });
        }

        Ok(self.core.insert(key, value))
    }

    /// Kinds already validated by the decoder.
    pub(crate) fn insert_raw(&mut self, key: Object, value: Object) {
        self.core.insert(key, value);
    }

    /// Removes the entry keyed by `key`, returning
    /// its value.
    pub fn remove(&mut self, key: &Object) -> Option<Object> {
        self.core.remove(key)
    }

    /// Returns true iff the map holds an entry
    /// keyed by `key`.
    pub fn contains_key(&self, key: &Object) -> bool {
        self.core.contains_key(key)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Object, &Object)> {
        self.core.iter()
    }
}

/// Equality is keyed and structural: entry kinds declared
/// by empty maps don't participate.
impl PartialEq for TypedMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl Eq for TypedMap {}

/// Keyed entries of any kinds.
#[derive(Debug, Clone, Default)]
pub struct UntypedMap {
    core: MapCore,
}

impl UntypedMap {
    /// Returns a new, empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of entries in the map.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Returns true iff the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The map's bucket count.
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Returns the value keyed by `key`, if any.
    pub fn get(&self, key: &Object) -> Option<&Object> {
        self.core.get(key)
    }

    /// Returns the value keyed by `key` mutably, if any.
    pub fn get_mut(&mut self, key: &Object) -> Option<&mut Object> {
        self.core.get_mut(key)
    }

    /// Inserts `key → value`, returning the previous value
    /// if the key was already present.
    pub fn insert(&mut self, key: Object, value: Object) -> Option<Object> {
        self.core.insert(key, value)
    }

    /// Removes the entry keyed by `key`, returning
    /// its value.
    pub fn remove(&mut self, key: &Object) -> Option<Object> {
        self.core.remove(key)
    }

    /// Returns true iff the map holds an entry
    /// keyed by `key`.
    pub fn contains_key(&self, key: &Object) -> bool {
        self.core.contains_key(key)
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Object, &Object)> {
        self.core.iter()
    }
}

impl PartialEq for UntypedMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl Eq for UntypedMap {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut map = UntypedMap::new();
        assert!(map.is_empty());
        assert_eq!(INITIAL_BUCKETS, map.capacity());

        assert_eq!(None, map.insert(Object::from("one"), Object::from(1i32)));
        assert_eq!(None, map.insert(Object::from("two"), Object::from(2i32)));
        assert_eq!(2, map.len());

        assert_eq!(Some(&Object::from(1i32)), map.get(&Object::from("one")));
        assert!(map.contains_key(&Object::from("two")));
        assert!(!map.contains_key(&Object::from("three")));

        // Removal transfers the value out.
        assert_eq!(Some(Object::from(1i32)), map.remove(&Object::from("one")));
        assert_eq!(None, map.remove(&Object::from("one")));
        assert_eq!(1, map.len());
    }

    #[test]
    fn replacement_returns_old_value() {
        let mut map = UntypedMap::new();
        map.insert(Object::from("key"), Object::from(1u8));

        let old = map.insert(Object::from("key"), Object::from(2u8));
        assert_eq!(Some(Object::from(1u8)), old);
        assert_eq!(1, map.len());
        assert_eq!(Some(&Object::from(2u8)), map.get(&Object::from("key")));
    }

    #[test]
    fn colliding_keys_share_a_bucket() {
        // Boolean(true) hashes to 1231, and so does
        // UnsignedInteger(1231): same bucket, different
        // kinds, and both must stay reachable.
        let mut map = UntypedMap::new();
        map.insert(Object::from(true), Object::from("bool"));
        map.insert(Object::from(1231u32), Object::from("int"));

        assert_eq!(
            Object::from(true).hash_code(),
            Object::from(1231u32).hash_code()
        );
        assert_eq!(Some(&Object::from("bool")), map.get(&Object::from(true)));
        assert_eq!(Some(&Object::from("int")), map.get(&Object::from(1231u32)));

        assert_eq!(
            Some(Object::from("bool")),
            map.remove(&Object::from(true))
        );
        assert_eq!(Some(&Object::from("int")), map.get(&Object::from(1231u32)));
    }

    #[test]
    fn rehash_keeps_lookups_correct() {
        let mut map = UntypedMap::new();
        for i in 0..100u32 {
            map.insert(Object::from(i), Object::from(i * 2));
        }

        assert!(map.capacity() > INITIAL_BUCKETS);
        for i in 0..100u32 {
            assert_eq!(Some(&Object::from(i * 2)), map.get(&Object::from(i)));
        }
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut map = UntypedMap::new();
        map.insert(Object::from("c"), Object::from(3u8));
        map.insert(Object::from("a"), Object::from(1u8));
        map.insert(Object::from("b"), Object::from(2u8));

        let keys: alloc::vec::Vec<&Object> = map.iter().map(|(key, _)| key).collect();
        assert_eq!(
            alloc::vec![
                &Object::from("c"),
                &Object::from("a"),
                &Object::from("b")
            ],
            keys
        );

        // Removal preserves the order of the survivors.
        map.remove(&Object::from("a"));
        let keys: alloc::vec::Vec<&Object> = map.iter().map(|(key, _)| key).collect();
        assert_eq!(alloc::vec![&Object::from("c"), &Object::from("b")], keys);
        assert_eq!(Some(&Object::from(2u8)), map.get(&Object::from("b")));
    }

    #[test]
    fn first_entry_fixes_kinds() {
        let mut map = TypedMap::new();
        map.insert(Object::from("name"), Object::from(1i64)).unwrap();
        assert_eq!(Kind::Utf8String, map.key_kind());
        assert_eq!(Kind::SignedLongInteger, map.value_kind());

        // Mismatched entries bounce back to the caller.
        let err = map
            .insert(Object::from(5u8), Object::from(2i64))
            .unwrap_err();
        assert_eq!(Object::from(5u8), err.key);
        assert_eq!(Object::from(2i64), err.value);
        assert_eq!(1, map.len());
    }

    #[test]
    fn entry_kinds_frozen_while_nonempty() {
        let mut map = TypedMap::new();
        map.set_key_kind(Kind::Utf8String);
        map.set_value_kind(Kind::Boolean);

        map.insert(Object::from("on"), Object::from(true)).unwrap();
        map.set_key_kind(Kind::SignedByte);
        map.set_value_kind(Kind::SignedByte);
        assert_eq!(Kind::Utf8String, map.key_kind());
        assert_eq!(Kind::Boolean, map.value_kind());

        map.remove(&Object::from("on"));
        map.set_key_kind(Kind::SignedByte);
        assert_eq!(Kind::SignedByte, map.key_kind());
    }

    #[test]
    fn keyed_equality_ignores_order() {
        let mut a = UntypedMap::new();
        a.insert(Object::from("x"), Object::from(1u8));
        a.insert(Object::from("y"), Object::from(2u8));

        let mut b = UntypedMap::new();
        b.insert(Object::from("y"), Object::from(2u8));
        b.insert(Object::from("x"), Object::from(1u8));

        assert_eq!(a, b);

        b.insert(Object::from("y"), Object::from(3u8));
        assert_ne!(a, b);
    }
}
