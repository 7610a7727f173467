//! The versioned binary codec ("DBOF") for object trees.
//!
//! ## Framing
//!
//! Every serialized stream normally opens with a 6-byte
//! header: the four magic bytes `D` `B` `O` `F`, then the
//! format version as a little-endian `u16`. The header is
//! how readers pick the right decoder; writers may omit it
//! (see [`Writer::no_header`](crate::stream::Writer::no_header)),
//! but a headerless stream can only be read back by a
//! reader told which version to assume.
//!
//! Version `1` ("DBOF-1") is currently the only defined
//! format.
//!
//! ## DBOF-1
//!
//! DBOF-1 encodes an object as a one-byte type tag (the
//! object's [`Kind::id`](crate::types::Kind::id)) followed
//! by a payload:
//!
//! Kind | Payload
//! -----|--------
//! `Null` | nothing
//! byte and boolean kinds | 1 byte
//! 32-bit kinds | 4 bytes, little-endian
//! 64-bit kinds | 8 bytes, little-endian
//! floats | their IEEE-754 bit patterns, little-endian
//! `Utf8String` | flex-length byte count, then the bytes
//! `TypedArray` | flex-length size, element type tag, then each element's bare payload
//! `UntypedArray` | flex-length size, then each element tagged
//! `TypedMap` | flex-length size, key and value type tags, then bare key/value payload pairs
//! `UntypedMap` | flex-length size, then tagged key/value pairs
//!
//! Typed containers declare their element kinds once up
//! front, so their children are encoded without per-element
//! tags; untyped containers tag every child. Containers
//! nest by recursion, and map entries are written in the
//! map's insertion order, so byte output is a deterministic
//! function of the object tree.
//!
//! A "flex-length" is the format's variable-width unsigned
//! integer: one byte holding a byte count `N ≤ 8`, then the
//! value's `N` low little-endian bytes. Encoders emit the
//! smallest `N` that fits the value (one byte minimum);
//! decoders accept any `N` up to eight.
use snafu::{ensure, Backtrace, Snafu};

use crate::stream::{Reader, Reads, StreamError, Writer, Writes};
use crate::types::Object;

// Expose the per-version encoder and decoder as part of
// this module, keeping them in separate files.
mod decode;
mod encode;
mod flex;

/// The magic bytes opening every framed stream.
pub const MAGIC: [u8; 4] = *b"DBOF";

/// The format version written when a writer doesn't
/// force one.
pub const DEFAULT_VERSION: u16 = 1;

/// Reads one object from `reader`.
///
/// Unless the reader is marked headerless, this consumes
/// and verifies the 6-byte header first; a forced version
/// on the reader overrides the version the header
/// declares. Decoding failures leave the source at an
/// unspecified position.
pub fn read<R: Reads>(reader: &mut Reader<R>) -> Result<Object, CodecError> {
    let version = if reader.is_headerless() {
        match reader.forced_version() {
            0 => return MissingVersionSnafu.fail(),
            version => version,
        }
    } else {
        let mut header = [0u8; 6];
        reader.get_mut().read_exact(&mut header)?;

        let found = [header[0], header[1], header[2], header[3]];
        ensure!(found == MAGIC, BadMagicSnafu { found });

        let declared = u16::from_le_bytes([header[4], header[5]]);
        match reader.forced_version() {
            0 => declared,
            version => version,
        }
    };

    match version {
        1 => decode::decode_object(reader.get_mut()),
        version => UnsupportedVersionSnafu { version }.fail(),
    }
}

/// Writes `object` into `writer`.
///
/// Unless the writer is marked headerless, the 6-byte
/// header is emitted first, declaring the forced version
/// (or [`DEFAULT_VERSION`]). A failure partway through
/// leaves the sink holding a partial stream.
pub fn write<W: Writes>(object: &Object, writer: &mut Writer<W>) -> Result<(), CodecError> {
    let version = match writer.forced_version() {
        0 => DEFAULT_VERSION,
        version => version,
    };

    if !writer.is_headerless() {
        let mut header = [0u8; 6];
        header[..4].copy_from_slice(&MAGIC);
        header[4..].copy_from_slice(&version.to_le_bytes());
        writer.get_mut().write_all(&header)?;
    }

    match version {
        1 => encode::encode_object(object, writer.get_mut()),
        version => UnsupportedVersionSnafu { version }.fail(),
    }
}

/// Encodes `object` into a fresh byte vector, header
/// included.
pub fn to_vec(object: &Object) -> Result<alloc::vec::Vec<u8>, CodecError> {
    let mut writer = Writer::new(alloc::vec::Vec::new());
    write(object, &mut writer)?;
    Ok(writer.into_inner())
}

/// Decodes one object from the front of `bytes`,
/// header included.
pub fn from_slice(bytes: &[u8]) -> Result<Object, CodecError> {
    read(&mut Reader::new(bytes))
}

/// Enumeration of errors that may occur while encoding
/// or decoding objects.
#[derive(Debug, Snafu)]
pub enum CodecError {
    /// The byte source or sink failed, or stalled short
    /// of the bytes the codec asked for.
    #[snafu(display("error while reading or writing the byte stream: {source}"))]
    Stream { source: StreamError },

    /// The stream doesn't open with the `DBOF` magic.
    #[snafu(display("stream opens with {found:02X?} instead of the DBOF magic bytes"))]
    BadMagic {
        found: [u8; 4],
        backtrace: Backtrace,
    },

    /// The stream declares (or the caller forced) a
    /// format version this build doesn't implement.
    #[snafu(display("unsupported format version {version}"))]
    UnsupportedVersion { version: u16, backtrace: Backtrace },

    /// A headerless stream was read without forcing
    /// a version.
    #[snafu(display("reading a headerless stream requires a forced version"))]
    MissingVersion,

    /// A flex-length prefix claims more than 8 bytes.
    #[snafu(display("flex-length prefix claims {count} bytes, but at most 8 are allowed"))]
    OverlongFlexLength { count: u8, backtrace: Backtrace },

    /// A type tag doesn't name any known kind.
    #[snafu(display("unrecognized type id {id:#04X}"))]
    UnknownTypeId { id: u8, backtrace: Backtrace },

    /// A character payload isn't a Unicode scalar value.
    #[snafu(display("{value:#010X} is not a Unicode scalar value"))]
    InvalidCharacter { value: u32, backtrace: Backtrace },

    /// A size prefix exceeds what this platform
    /// can address.
    #[snafu(display("encoded size {size} does not fit in memory on this platform"))]
    OversizedLength { size: u64 },
}

impl From<StreamError> for CodecError {
    fn from(value: StreamError) -> Self {
        Self::Stream { source: value }
    }
}
