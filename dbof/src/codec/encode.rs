//! The DBOF-1 object encoder.
use crate::stream::Writes;
use crate::types::{Object, TypedArray, TypedMap, UntypedArray, UntypedMap, Utf8String};

use super::{flex, CodecError};

/// Encodes `object` as a one-byte type tag followed by
/// its payload.
pub(crate) fn encode_object(
    object: &Object,
    sink: &mut (impl Writes + ?Sized),
) -> Result<(), CodecError> {
    sink.write_all(&[object.kind().id()])?;
    encode_payload(object, sink)
}

/// Encodes only the payload of `object`.
///
/// Elements of typed containers are written this way: the
/// container prefix carries their tag once for all of them.
fn encode_payload(object: &Object, sink: &mut (impl Writes + ?Sized)) -> Result<(), CodecError> {
    match object {
        Object::Null => Ok(()),
        Object::SignedByte(value) => Ok(sink.write_all(&value.to_le_bytes())?),
        Object::UnsignedByte(value) => Ok(sink.write_all(&value.to_le_bytes())?),
        Object::SignedInteger(value) => Ok(sink.write_all(&value.to_le_bytes())?),
        Object::UnsignedInteger(value) => Ok(sink.write_all(&value.to_le_bytes())?),
        Object::SignedLongInteger(value) => Ok(sink.write_all(&value.to_le_bytes())?),
        Object::UnsignedLongInteger(value) => Ok(sink.write_all(&value.to_le_bytes())?),
        Object::Boolean(value) => Ok(sink.write_all(&[*value as u8])?),
        Object::SingleFloat(value) => Ok(sink.write_all(&value.to_le_bytes())?),
        Object::DoubleFloat(value) => Ok(sink.write_all(&value.to_le_bytes())?),
        Object::Character(value) => Ok(sink.write_all(&(*value as u32).to_le_bytes())?),
        Object::Utf8String(value) => encode_string(value, sink),
        Object::TypedArray(array) => encode_typed_array(array, sink),
        Object::UntypedArray(array) => encode_untyped_array(array, sink),
        Object::TypedMap(map) => encode_typed_map(map, sink),
        Object::UntypedMap(map) => encode_untyped_map(map, sink),
    }
}

fn encode_string(
    string: &Utf8String,
    sink: &mut (impl Writes + ?Sized),
) -> Result<(), CodecError> {
    flex::write_flex(sink, string.len() as u64)?;
    Ok(sink.write_all(string.as_bytes())?)
}

fn encode_typed_array(
    array: &TypedArray,
    sink: &mut (impl Writes + ?Sized),
) -> Result<(), CodecError> {
    flex::write_flex(sink, array.len() as u64)?;
    sink.write_all(&[array.element_kind().id()])?;

    // Homogeneity makes per-element tags redundant.
    for elem in array.iter() {
        encode_payload(elem, sink)?;
    }

    Ok(())
}

fn encode_untyped_array(
    array: &UntypedArray,
    sink: &mut (impl Writes + ?Sized),
) -> Result<(), CodecError> {
    flex::write_flex(sink, array.len() as u64)?;

    for elem in array.iter() {
        encode_object(elem, sink)?;
    }

    Ok(())
}

fn encode_typed_map(map: &TypedMap, sink: &mut (impl Writes + ?Sized)) -> Result<(), CodecError> {
    flex::write_flex(sink, map.len() as u64)?;
    sink.write_all(&[map.key_kind().id(), map.value_kind().id()])?;

    // Entries follow in insertion order, untagged.
    for (key, value) in map.iter() {
        encode_payload(key, sink)?;
        encode_payload(value, sink)?;
    }

    Ok(())
}

fn encode_untyped_map(
    map: &UntypedMap,
    sink: &mut (impl Writes + ?Sized),
) -> Result<(), CodecError> {
    flex::write_flex(sink, map.len() as u64)?;

    for (key, value) in map.iter() {
        encode_object(key, sink)?;
        encode_object(value, sink)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Kind;

    fn encode(object: &Object) -> alloc::vec::Vec<u8> {
        let mut bytes = alloc::vec![];
        encode_object(object, &mut bytes).unwrap();
        bytes
    }

    #[test]
    fn scalars_are_tagged_little_endian() {
        assert_eq!(alloc::vec![0x00], encode(&Object::Null));
        assert_eq!(alloc::vec![0x01, 0xFF], encode(&Object::from(-1i8)));
        assert_eq!(alloc::vec![0x07, 0x01], encode(&Object::from(true)));
        assert_eq!(alloc::vec![0x07, 0x00], encode(&Object::from(false)));
        assert_eq!(
            alloc::vec![0x03, 0x01, 0x00, 0x00, 0x00],
            encode(&Object::from(1i32))
        );
        assert_eq!(
            alloc::vec![0x06, 0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01],
            encode(&Object::from(0x0123_4567_89AB_CDEFu64))
        );
        assert_eq!(
            alloc::vec![0x0A, 0x41, 0x00, 0x00, 0x00],
            encode(&Object::from('A'))
        );

        // IEEE-754 bit patterns, LSB first.
        let bits = 1.5f32.to_bits().to_le_bytes();
        assert_eq!(
            alloc::vec![0x08, bits[0], bits[1], bits[2], bits[3]],
            encode(&Object::from(1.5f32))
        );
    }

    #[test]
    fn strings_carry_a_flex_length() {
        // Tag, flex-length 2, then the bytes.
        assert_eq!(
            alloc::vec![0x0B, 0x01, 0x02, 0x68, 0x69],
            encode(&Object::from("hi"))
        );
        assert_eq!(alloc::vec![0x0B, 0x01, 0x00], encode(&Object::from("")));
    }

    #[test]
    fn typed_arrays_elide_element_tags() {
        let mut array = TypedArray::new();
        array.push(Object::from(7i32)).unwrap();
        array.push(Object::from(8i32)).unwrap();

        assert_eq!(
            alloc::vec![
                0x80, // typed array tag
                0x01, 0x02, // size
                0x03, // element kind
                0x07, 0x00, 0x00, 0x00, // 7
                0x08, 0x00, 0x00, 0x00, // 8
            ],
            encode(&Object::from(array))
        );
    }

    #[test]
    fn empty_typed_array_writes_its_declared_kind() {
        let array = TypedArray::with_element_kind(Kind::Character);
        assert_eq!(
            alloc::vec![0x80, 0x01, 0x00, 0x0A],
            encode(&Object::from(array))
        );
    }

    #[test]
    fn untyped_arrays_tag_every_element() {
        let mut array = UntypedArray::new();
        array.push(Object::from(5u8));
        array.push(Object::from(true));

        assert_eq!(
            alloc::vec![
                0x81, // untyped array tag
                0x01, 0x02, // size
                0x02, 0x05, // tagged unsigned byte
                0x07, 0x01, // tagged boolean
            ],
            encode(&Object::from(array))
        );
    }

    #[test]
    fn typed_maps_write_untagged_pairs_in_insertion_order() {
        let mut map = TypedMap::new();
        map.insert(Object::from(1u8), Object::from("a")).unwrap();
        map.insert(Object::from(2u8), Object::from("b")).unwrap();

        assert_eq!(
            alloc::vec![
                0x82, // typed map tag
                0x01, 0x02, // size
                0x02, 0x0B, // key and value kinds
                0x01, // key 1
                0x01, 0x01, 0x61, // "a"
                0x02, // key 2
                0x01, 0x01, 0x62, // "b"
            ],
            encode(&Object::from(map))
        );
    }

    #[test]
    fn untyped_maps_tag_both_halves() {
        let mut map = UntypedMap::new();
        map.insert(Object::from('k'), Object::Null);

        assert_eq!(
            alloc::vec![
                0x83, // untyped map tag
                0x01, 0x01, // size
                0x0A, 0x6B, 0x00, 0x00, 0x00, // tagged character key
                0x00, // tagged null value
            ],
            encode(&Object::from(map))
        );
    }
}
