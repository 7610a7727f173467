//! The dynamic object type at the heart of the format.
use alloc::string::String;

use super::{Category, Kind, TypedArray, TypedMap, UntypedArray, UntypedMap, Utf8String};

/// Bit pattern every NaN normalizes to before
/// hashing or comparing a 32-bit float.
const CANONICAL_NAN_32: u32 = 0x7FC0_0000;

/// Bit pattern every NaN normalizes to before
/// hashing or comparing a 64-bit float.
const CANONICAL_NAN_64: u64 = 0x7FF8_0000_0000_0000;

/// A value of one of the sixteen supported kinds,
/// payload included.
///
/// An object's kind is fixed at creation: it's the enum
/// discriminant, so there is no way to change it without
/// replacing the object wholesale. Containers own their
/// children; dropping a container drops everything in it.
///
/// Objects compare structurally and hash to a 32-bit code
/// coherent with that comparison (equal objects always
/// share a hash code). Floats hash and compare by their
/// IEEE-754 bit pattern with every NaN normalized to one
/// canonical pattern, which keeps the comparison total:
/// two NaNs of the same width are equal to each other.
/// Hash codes are not stable across processes or builds.
#[derive(Debug, Clone)]
pub enum Object {
    Null,
    SignedByte(i8),
    UnsignedByte(u8),
    SignedInteger(i32),
    UnsignedInteger(u32),
    SignedLongInteger(i64),
    UnsignedLongInteger(u64),
    Boolean(bool),
    SingleFloat(f32),
    DoubleFloat(f64),
    Character(char),
    Utf8String(Utf8String),
    TypedArray(TypedArray),
    UntypedArray(UntypedArray),
    TypedMap(TypedMap),
    UntypedMap(UntypedMap),
}

impl Object {
    /// Returns a new object of `kind` with a default
    /// payload: numeric zero, `false`, `'\0'`, or an
    /// empty string or container.
    pub fn new(kind: Kind) -> Self {
        match kind {
            Kind::Null => Object::Null,
            Kind::SignedByte => Object::SignedByte(0),
            Kind::UnsignedByte => Object::UnsignedByte(0),
            Kind::SignedInteger => Object::SignedInteger(0),
            Kind::UnsignedInteger => Object::UnsignedInteger(0),
            Kind::SignedLongInteger => Object::SignedLongInteger(0),
            Kind::UnsignedLongInteger => Object::UnsignedLongInteger(0),
            Kind::Boolean => Object::Boolean(false),
            Kind::SingleFloat => Object::SingleFloat(0.0),
            Kind::DoubleFloat => Object::DoubleFloat(0.0),
            Kind::Character => Object::Character('\0'),
            Kind::Utf8String => Object::Utf8String(Utf8String::new()),
            Kind::TypedArray => Object::TypedArray(TypedArray::new()),
            Kind::UntypedArray => Object::UntypedArray(UntypedArray::new()),
            Kind::TypedMap => Object::TypedMap(TypedMap::new()),
            Kind::UntypedMap => Object::UntypedMap(UntypedMap::new()),
        }
    }

    /// This object's kind.
    pub fn kind(&self) -> Kind {
        match self {
            Object::Null => Kind::Null,
            Object::SignedByte(_) => Kind::SignedByte,
            Object::UnsignedByte(_) => Kind::UnsignedByte,
            Object::SignedInteger(_) => Kind::SignedInteger,
            Object::UnsignedInteger(_) => Kind::UnsignedInteger,
            Object::SignedLongInteger(_) => Kind::SignedLongInteger,
            Object::UnsignedLongInteger(_) => Kind::UnsignedLongInteger,
            Object::Boolean(_) => Kind::Boolean,
            Object::SingleFloat(_) => Kind::SingleFloat,
            Object::DoubleFloat(_) => Kind::DoubleFloat,
            Object::Character(_) => Kind::Character,
            Object::Utf8String(_) => Kind::Utf8String,
            Object::TypedArray(_) => Kind::TypedArray,
            Object::UntypedArray(_) => Kind::UntypedArray,
            Object::TypedMap(_) => Kind::TypedMap,
            Object::UntypedMap(_) => Kind::UntypedMap,
        }
    }

    /// This object's [`Category`].
    pub fn category(&self) -> Category {
        self.kind().category()
    }

    /// Returns true iff both objects share one kind.
    pub fn same_kind(&self, other: &Object) -> bool {
        self.kind() == other.kind()
    }

    /// Returns true iff both objects' kinds share
    /// one category.
    pub fn same_category(&self, other: &Object) -> bool {
        self.category() == other.category()
    }

    /// This object's 32-bit hash code.
    ///
    /// Coherent with `==`: equal objects share a code.
    /// Codes are not stable across processes, platforms,
    /// or library versions.
    pub fn hash_code(&self) -> i32 {
        match self {
            Object::Null => 0,
            Object::SignedByte(value) => *value as i32,
            Object::UnsignedByte(value) => *value as i32,
            Object::SignedInteger(value) => *value,
            Object::UnsignedInteger(value) => *value as i32,
            Object::SignedLongInteger(value) => fold_64(*value as u64),
            Object::UnsignedLongInteger(value) => fold_64(*value),
            Object::Boolean(value) => {
                if *value {
                    1231
                } else {
                    1237
                }
            }
            Object::SingleFloat(value) => float_bits_32(*value) as i32,
            Object::DoubleFloat(value) => fold_64(float_bits_64(*value)),
            Object::Character(value) => *value as i32,
            Object::Utf8String(value) => value.hash_code(),
            Object::TypedArray(array) => hash_sequence(Kind::TypedArray.id() as i32, array.iter()),
            Object::UntypedArray(array) => {
                hash_sequence(Kind::UntypedArray.id() as i32, array.iter())
            }
            Object::TypedMap(map) => hash_entries(Kind::TypedMap.id() as i32, map.iter()),
            Object::UntypedMap(map) => hash_entries(Kind::UntypedMap.id() as i32, map.iter()),
        }
    }

    /// Returns the string payload iff this is a
    /// [`Kind::Utf8String`] object.
    pub fn as_utf8_string(&self) -> Option<&Utf8String> {
        match self {
            Object::Utf8String(value) => Some(value),
            _ => None,
        }
    }

    /// Replaces the string payload.
    ///
    /// Panics if this is not a [`Kind::Utf8String`] object.
    pub fn set_utf8_string(&mut self, value: &str) {
        match self {
            Object::Utf8String(string) => string.set(value),
            _ => panic!("called `set_utf8_string` on a {:?} object", self.kind()),
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::Null
    }
}

/// Implements the typed payload accessors for a scalar kind.
macro_rules! scalar_accessors {
    (
        /// Object variant to generate accessors for.
        $variant:ident,

        /// Payload type of the variant.
        $payload:ty,

        /// Name of the generated getter.
        $as_fn:ident,

        /// Name of the generated setter.
        $set_fn:ident
    ) => {
        impl Object {
            #[doc = concat!(
                "Returns the payload iff this is a [`Kind::",
                stringify!($variant), "`] object."
            )]
            pub fn $as_fn(&self) -> Option<$payload> {
                match self {
                    Object::$variant(value) => Some(*value),
                    _ => None,
                }
            }

            #[doc = concat!(
                "Replaces the payload of this [`Kind::",
                stringify!($variant), "`] object.\n\n",
                "Panics if the object is of any other kind; \
                 applying a scalar setter to the wrong kind \
                 is a programming error."
            )]
            pub fn $set_fn(&mut self, value: $payload) {
                match self {
                    Object::$variant(payload) => *payload = value,
                    _ => panic!(
                        concat!("called `", stringify!($set_fn), "` on a {:?} object"),
                        self.kind()
                    ),
                }
            }
        }
    };
}

scalar_accessors!(SignedByte, i8, as_signed_byte, set_signed_byte);
scalar_accessors!(UnsignedByte, u8, as_unsigned_byte, set_unsigned_byte);
scalar_accessors!(SignedInteger, i32, as_signed_integer, set_signed_integer);
scalar_accessors!(UnsignedInteger, u32, as_unsigned_integer, set_unsigned_integer);
scalar_accessors!(
    SignedLongInteger,
    i64,
    as_signed_long_integer,
    set_signed_long_integer
);
scalar_accessors!(
    UnsignedLongInteger,
    u64,
    as_unsigned_long_integer,
    set_unsigned_long_integer
);
scalar_accessors!(Boolean, bool, as_boolean, set_boolean);
scalar_accessors!(SingleFloat, f32, as_single_float, set_single_float);
scalar_accessors!(DoubleFloat, f64, as_double_float, set_double_float);
scalar_accessors!(Character, char, as_character, set_character);

/// Implements the borrowing accessors for a container kind.
macro_rules! container_accessors {
    ($variant:ident, $payload:ty, $as_fn:ident, $as_mut_fn:ident) => {
        impl Object {
            #[doc = concat!(
                "Returns the container iff this is a [`Kind::",
                stringify!($variant), "`] object."
            )]
            pub fn $as_fn(&self) -> Option<&$payload> {
                match self {
                    Object::$variant(container) => Some(container),
                    _ => None,
                }
            }

            #[doc = concat!(
                "Returns the container mutably iff this is a [`Kind::",
                stringify!($variant), "`] object."
            )]
            pub fn $as_mut_fn(&mut self) -> Option<&mut $payload> {
                match self {
                    Object::$variant(container) => Some(container),
                    _ => None,
                }
            }
        }
    };
}

container_accessors!(TypedArray, TypedArray, as_typed_array, as_typed_array_mut);
container_accessors!(
    UntypedArray,
    UntypedArray,
    as_untyped_array,
    as_untyped_array_mut
);
container_accessors!(TypedMap, TypedMap, as_typed_map, as_typed_map_mut);
container_accessors!(UntypedMap, UntypedMap, as_untyped_map, as_untyped_map_mut);

/// Implements `From<payload>` for an object variant.
macro_rules! from_payload {
    ($variant:ident, $payload:ty) => {
        impl From<$payload> for Object {
            fn from(value: $payload) -> Self {
                Object::$variant(value.into())
            }
        }
    };
}

from_payload!(SignedByte, i8);
from_payload!(UnsignedByte, u8);
from_payload!(SignedInteger, i32);
from_payload!(UnsignedInteger, u32);
from_payload!(SignedLongInteger, i64);
from_payload!(UnsignedLongInteger, u64);
from_payload!(Boolean, bool);
from_payload!(SingleFloat, f32);
from_payload!(DoubleFloat, f64);
from_payload!(Character, char);
from_payload!(Utf8String, Utf8String);
from_payload!(Utf8String, &str);
from_payload!(Utf8String, String);
from_payload!(TypedArray, TypedArray);
from_payload!(UntypedArray, UntypedArray);
from_payload!(TypedMap, TypedMap);
from_payload!(UntypedMap, UntypedMap);

/// Structural equality.
///
/// Objects of different kinds are never equal; in
/// particular, two containers of different kinds are
/// unequal no matter their contents. Floats compare by
/// NaN-normalized bit pattern, strings byte-wise, arrays
/// pairwise in order, and maps as keyed entry sets.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Null, Object::Null) => true,
            (Object::SignedByte(a), Object::SignedByte(b)) => a == b,
            (Object::UnsignedByte(a), Object::UnsignedByte(b)) => a == b,
            (Object::SignedInteger(a), Object::SignedInteger(b)) => a == b,
            (Object::UnsignedInteger(a), Object::UnsignedInteger(b)) => a == b,
            (Object::SignedLongInteger(a), Object::SignedLongInteger(b)) => a == b,
            (Object::UnsignedLongInteger(a), Object::UnsignedLongInteger(b)) => a == b,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::SingleFloat(a), Object::SingleFloat(b)) => {
                float_bits_32(*a) == float_bits_32(*b)
            }
            (Object::DoubleFloat(a), Object::DoubleFloat(b)) => {
                float_bits_64(*a) == float_bits_64(*b)
            }
            (Object::Character(a), Object::Character(b)) => a == b,
            (Object::Utf8String(a), Object::Utf8String(b)) => a == b,
            (Object::TypedArray(a), Object::TypedArray(b)) => a == b,
            (Object::UntypedArray(a), Object::UntypedArray(b)) => a == b,
            (Object::TypedMap(a), Object::TypedMap(b)) => a == b,
            (Object::UntypedMap(a), Object::UntypedMap(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Object {}

/// Delegates to [`Object::hash_code`], so objects can key
/// the standard collections coherently with `==`.
impl core::hash::Hash for Object {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash_code());
    }
}

/// Normalizes NaNs to one canonical bit pattern.
fn float_bits_32(value: f32) -> u32 {
    if value.is_nan() {
        CANONICAL_NAN_32
    } else {
        value.to_bits()
    }
}

/// Normalizes NaNs to one canonical bit pattern.
fn float_bits_64(value: f64) -> u64 {
    if value.is_nan() {
        CANONICAL_NAN_64
    } else {
        value.to_bits()
    }
}

/// Folds 64 bits down to a 32-bit hash code by
/// XORing the halves.
fn fold_64(bits: u64) -> i32 {
    ((bits as u32) ^ ((bits >> 32) as u32)) as i32
}

/// Order-sensitive hash over a sequence of elements.
fn hash_sequence<'a>(seed: i32, elems: impl Iterator<Item = &'a Object>) -> i32 {
    let mut hash = seed;
    for elem in elems {
        hash = hash.wrapping_mul(31).wrapping_add(elem.hash_code());
    }
    hash
}

/// Order-insensitive hash over keyed entries, matching
/// the order-insensitive equality of maps.
fn hash_entries<'a>(seed: i32, entries: impl Iterator<Item = (&'a Object, &'a Object)>) -> i32 {
    let mut hash = seed;
    for (key, value) in entries {
        hash = hash.wrapping_add(key.hash_code() ^ value.hash_code().wrapping_mul(31));
    }
    hash
}

// Serde ///////////////////////////////////////////////

#[cfg(feature = "serde")]
impl serde::Serialize for Object {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Object::Null => serializer.serialize_unit(),
            Object::SignedByte(value) => value.serialize(serializer),
            Object::UnsignedByte(value) => value.serialize(serializer),
            Object::SignedInteger(value) => value.serialize(serializer),
            Object::UnsignedInteger(value) => value.serialize(serializer),
            Object::SignedLongInteger(value) => value.serialize(serializer),
            Object::UnsignedLongInteger(value) => value.serialize(serializer),
            Object::Boolean(value) => value.serialize(serializer),
            Object::SingleFloat(value) => value.serialize(serializer),
            Object::DoubleFloat(value) => value.serialize(serializer),
            Object::Character(value) => value.serialize(serializer),
            Object::Utf8String(value) => match value.as_str() {
                Some(text) => serializer.serialize_str(text),
                // Malformed decoded bytes fall back to a raw view.
                None => serializer.serialize_bytes(value.as_bytes()),
            },
            Object::TypedArray(array) => serialize_sequence(array.iter(), serializer),
            Object::UntypedArray(array) => serialize_sequence(array.iter(), serializer),
            Object::TypedMap(map) => serialize_entries(map.len(), map.iter(), serializer),
            Object::UntypedMap(map) => serialize_entries(map.len(), map.iter(), serializer),
        }
    }
}

#[cfg(feature = "serde")]
fn serialize_sequence<'a, S: serde::Serializer>(
    elems: core::slice::Iter<'a, Object>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;
    let mut seq = serializer.serialize_seq(Some(elems.len()))?;
    for elem in elems {
        seq.serialize_element(elem)?;
    }
    seq.end()
}

#[cfg(feature = "serde")]
fn serialize_entries<'a, S: serde::Serializer>(
    len: usize,
    entries: impl Iterator<Item = (&'a Object, &'a Object)>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(len))?;
    for (key, value) in entries {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Object {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ObjectVisitor)
    }
}

/// Visitor that deserializes any self-describing value
/// into the nearest-fitting [`Object`] variant. Containers
/// land in the untyped variants, since self-describing
/// formats make no homogeneity promises.
#[cfg(feature = "serde")]
struct ObjectVisitor;

#[cfg(feature = "serde")]
impl<'de> serde::de::Visitor<'de> for ObjectVisitor {
    type Value = Object;

    fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
        formatter.write_str("any value")
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(Object::Null)
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(Object::Null)
    }

    fn visit_some<D: serde::Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<Self::Value, D::Error> {
        serde::Deserialize::deserialize(deserializer)
    }

    fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Object::Boolean(v))
    }

    fn visit_i8<E: serde::de::Error>(self, v: i8) -> Result<Self::Value, E> {
        Ok(Object::SignedByte(v))
    }

    fn visit_i16<E: serde::de::Error>(self, v: i16) -> Result<Self::Value, E> {
        Ok(Object::SignedInteger(v.into()))
    }

    fn visit_i32<E: serde::de::Error>(self, v: i32) -> Result<Self::Value, E> {
        Ok(Object::SignedInteger(v))
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Object::SignedLongInteger(v))
    }

    fn visit_u8<E: serde::de::Error>(self, v: u8) -> Result<Self::Value, E> {
        Ok(Object::UnsignedByte(v))
    }

    fn visit_u16<E: serde::de::Error>(self, v: u16) -> Result<Self::Value, E> {
        Ok(Object::UnsignedInteger(v.into()))
    }

    fn visit_u32<E: serde::de::Error>(self, v: u32) -> Result<Self::Value, E> {
        Ok(Object::UnsignedInteger(v))
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Object::UnsignedLongInteger(v))
    }

    fn visit_f32<E: serde::de::Error>(self, v: f32) -> Result<Self::Value, E> {
        Ok(Object::SingleFloat(v))
    }

    fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Object::DoubleFloat(v))
    }

    fn visit_char<E: serde::de::Error>(self, v: char) -> Result<Self::Value, E> {
        Ok(Object::Character(v))
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Object::Utf8String(v.into()))
    }

    fn visit_string<E: serde::de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Object::Utf8String(v.into()))
    }

    fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        Ok(Object::Utf8String(Utf8String::from_bytes(v.to_vec())))
    }

    fn visit_seq<A: serde::de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut array = UntypedArray::new();
        while let Some(elem) = seq.next_element::<Object>()? {
            array.push(elem);
        }
        Ok(Object::UntypedArray(array))
    }

    fn visit_map<A: serde::de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut result = UntypedMap::new();
        while let Some((key, value)) = map.next_entry::<Object, Object>()? {
            result.insert(key, value);
        }
        Ok(Object::UntypedMap(result))
    }
}
