//! The DBOF-1 object decoder.
use alloc::vec::Vec;

use snafu::OptionExt;

use crate::stream::Reads;
use crate::types::{Kind, Object, TypedArray, TypedMap, UntypedArray, UntypedMap, Utf8String};

use super::{
    flex, CodecError, InvalidCharacterSnafu, OversizedLengthSnafu, UnknownTypeIdSnafu,
};

/// Elements worth of space a decoder will reserve up
/// front on the say-so of an untrusted size prefix;
/// anything bigger grows as the elements actually arrive.
const SPECULATIVE_CAPACITY: usize = 1024;

/// Decodes one tagged object from `source`.
pub(crate) fn decode_object(source: &mut (impl Reads + ?Sized)) -> Result<Object, CodecError> {
    let kind = read_kind(source)?;
    decode_payload(kind, source)
}

/// Decodes the payload of an object whose kind is
/// already known, as inside a typed container.
fn decode_payload(kind: Kind, source: &mut (impl Reads + ?Sized)) -> Result<Object, CodecError> {
    Ok(match kind {
        Kind::Null => Object::Null,
        Kind::SignedByte => Object::SignedByte(i8::from_le_bytes(read_array(source)?)),
        Kind::UnsignedByte => Object::UnsignedByte(u8::from_le_bytes(read_array(source)?)),
        Kind::SignedInteger => Object::SignedInteger(i32::from_le_bytes(read_array(source)?)),
        Kind::UnsignedInteger => Object::UnsignedInteger(u32::from_le_bytes(read_array(source)?)),
        Kind::SignedLongInteger => {
            Object::SignedLongInteger(i64::from_le_bytes(read_array(source)?))
        }
        Kind::UnsignedLongInteger => {
            Object::UnsignedLongInteger(u64::from_le_bytes(read_array(source)?))
        }

        // Any nonzero byte reads as true.
        Kind::Boolean => Object::Boolean(u8::from_le_bytes(read_array(source)?) != 0),

        Kind::SingleFloat => Object::SingleFloat(f32::from_le_bytes(read_array(source)?)),
        Kind::DoubleFloat => Object::DoubleFloat(f64::from_le_bytes(read_array(source)?)),

        Kind::Character => {
            let value = u32::from_le_bytes(read_array(source)?);
            Object::Character(char::from_u32(value).context(InvalidCharacterSnafu { value })?)
        }

        Kind::Utf8String => decode_string(source)?,
        Kind::TypedArray => decode_typed_array(source)?,
        Kind::UntypedArray => decode_untyped_array(source)?,
        Kind::TypedMap => decode_typed_map(source)?,
        Kind::UntypedMap => decode_untyped_map(source)?,
    })
}

fn read_kind(source: &mut (impl Reads + ?Sized)) -> Result<Kind, CodecError> {
    let mut tag = [0u8; 1];
    source.read_exact(&mut tag)?;
    let id = tag[0];
    Kind::from_id(id).context(UnknownTypeIdSnafu { id })
}

fn read_array<const N: usize>(source: &mut (impl Reads + ?Sized)) -> Result<[u8; N], CodecError> {
    let mut bytes = [0u8; N];
    source.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// Converts a wire size to an in-memory one.
fn checked_len(size: u64) -> Result<usize, CodecError> {
    usize::try_from(size).ok().context(OversizedLengthSnafu { size })
}

/// Reads a flex-length count of raw bytes.
///
/// The buffer grows chunk by chunk as bytes actually
/// arrive, so a hostile length prefix can't demand a
/// huge allocation up front.
fn decode_string(source: &mut (impl Reads + ?Sized)) -> Result<Object, CodecError> {
    let length = checked_len(flex::read_flex(source)?)?;

    let mut bytes = Vec::with_capacity(length.min(SPECULATIVE_CAPACITY));
    let mut chunk = [0u8; 1024];
    while bytes.len() < length {
        let take = chunk.len().min(length - bytes.len());
        source.read_exact(&mut chunk[..take])?;
        bytes.extend_from_slice(&chunk[..take]);
    }

    // Stored as received; validation is the producer's job.
    Ok(Object::Utf8String(Utf8String::from_bytes(bytes)))
}

fn decode_typed_array(source: &mut (impl Reads + ?Sized)) -> Result<Object, CodecError> {
    let size = checked_len(flex::read_flex(source)?)?;
    let element_kind = read_kind(source)?;

    let mut elems = Vec::with_capacity(size.min(SPECULATIVE_CAPACITY));
    for _ in 0..size {
        elems.push(decode_payload(element_kind, source)?);
    }

    Ok(Object::TypedArray(TypedArray::from_parts(
        element_kind,
        elems,
    )))
}

fn decode_untyped_array(source: &mut (impl Reads + ?Sized)) -> Result<Object, CodecError> {
    let size = checked_len(flex::read_flex(source)?)?;

    let mut elems = Vec::with_capacity(size.min(SPECULATIVE_CAPACITY));
    for _ in 0..size {
        elems.push(decode_object(source)?);
    }

    Ok(Object::UntypedArray(UntypedArray::from_parts(elems)))
}

fn decode_typed_map(source: &mut (impl Reads + ?Sized)) -> Result<Object, CodecError> {
    let size = checked_len(flex::read_flex(source)?)?;
    let key_kind = read_kind(source)?;
    let value_kind = read_kind(source)?;

    let mut map = TypedMap::with_entry_kinds(key_kind, value_kind);
    for _ in 0..size {
        let key = decode_payload(key_kind, source)?;
        let value = decode_payload(value_kind, source)?;
        map.insert_raw(key, value);
    }

    Ok(Object::TypedMap(map))
}

fn decode_untyped_map(source: &mut (impl Reads + ?Sized)) -> Result<Object, CodecError> {
    let size = checked_len(flex::read_flex(source)?)?;

    let mut map = UntypedMap::new();
    for _ in 0..size {
        let key = decode_object(source)?;
        let value = decode_object(source)?;
        map.insert(key, value);
    }

    Ok(Object::UntypedMap(map))
}
