//! Built-in object kinds and their in-memory
//! representations.

pub mod array;
pub use array::{KindMismatch, TypedArray, UntypedArray};
pub mod map;
pub use map::{EntryKindMismatch, TypedMap, UntypedMap};
mod object;
pub use object::*;
mod text;
pub use text::*;

/// Enumeration of every kind of [`Object`].
///
/// Each kind's discriminant is its type ID on the
/// wire: the codec writes the ID verbatim as the
/// one-byte type tag, so the numbering here is part
/// of the format and must not change.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The absence of a value.
    Null = 0,

    /// Signed (positive or negative) 8-bit number.
    SignedByte = 1,
    /// Unsigned (positive) 8-bit number.
    UnsignedByte = 2,
    /// Signed (positive or negative) 32-bit number.
    SignedInteger = 3,
    /// Unsigned (positive) 32-bit number.
    UnsignedInteger = 4,
    /// Signed (positive or negative) 64-bit number.
    SignedLongInteger = 5,
    /// Unsigned (positive) 64-bit number.
    UnsignedLongInteger = 6,

    /// Boolean (true or false).
    Boolean = 7,

    /// 32-bit (IEEE-754 binary32) floating point number.
    SingleFloat = 8,
    /// 64-bit (IEEE-754 binary64) floating point number.
    DoubleFloat = 9,

    /// 32-bit Unicode scalar value.
    Character = 10,

    /// UTF-8 encoded text.
    Utf8String = 11,

    /// Ordered sequence of elements sharing one kind.
    TypedArray = 128,
    /// Ordered sequence of elements of any kinds.
    UntypedArray = 129,
    /// Keyed entries whose keys share one kind and
    /// whose values share another.
    TypedMap = 130,
    /// Keyed entries of any kinds.
    UntypedMap = 131,
}

impl Kind {
    /// This kind's type ID on the wire.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Returns the kind with the wire type ID `id`,
    /// or `None` if the ID is unassigned.
    pub const fn from_id(id: u8) -> Option<Kind> {
        match id {
            0 => Some(Kind::Null),
            1 => Some(Kind::SignedByte),
            2 => Some(Kind::UnsignedByte),
            3 => Some(Kind::SignedInteger),
            4 => Some(Kind::UnsignedInteger),
            5 => Some(Kind::SignedLongInteger),
            6 => Some(Kind::UnsignedLongInteger),
            7 => Some(Kind::Boolean),
            8 => Some(Kind::SingleFloat),
            9 => Some(Kind::DoubleFloat),
            10 => Some(Kind::Character),
            11 => Some(Kind::Utf8String),
            128 => Some(Kind::TypedArray),
            129 => Some(Kind::UntypedArray),
            130 => Some(Kind::TypedMap),
            131 => Some(Kind::UntypedMap),
            _ => None,
        }
    }

    /// This kind's [`Category`].
    pub const fn category(self) -> Category {
        match self {
            Kind::Null
            | Kind::SignedByte
            | Kind::UnsignedByte
            | Kind::SignedInteger
            | Kind::UnsignedInteger
            | Kind::SignedLongInteger
            | Kind::UnsignedLongInteger
            | Kind::Boolean
            | Kind::SingleFloat
            | Kind::DoubleFloat
            | Kind::Character
            | Kind::Utf8String => Category::Value,
            Kind::TypedArray | Kind::UntypedArray | Kind::TypedMap | Kind::UntypedMap => {
                Category::Container
            }
        }
    }

    /// Returns true iff this kind is a value kind.
    pub const fn is_value(self) -> bool {
        matches!(self.category(), Category::Value)
    }

    /// Returns true iff this kind is a container kind.
    pub const fn is_container(self) -> bool {
        matches!(self.category(), Category::Container)
    }
}

impl Default for Kind {
    fn default() -> Self {
        Self::Null
    }
}

/// The two categories of [`Kind`]s: self-contained
/// values, and containers that own other objects.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Category {
    Value,
    Container,
}
