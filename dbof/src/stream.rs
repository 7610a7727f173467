//! Contracts for the byte sources and sinks the codec
//! reads from and writes to, plus the reader and writer
//! configurations that carry framing options.
//!
//! On platforms with `std` (or under test), anything
//! implementing `std::io::Read`/`std::io::Write` is
//! usable directly; without `std`, byte slices and
//! vectors are supported out of the box.
use snafu::Snafu;

/// A thing that pulls bytes from a stream.
///
/// The codec treats any transfer that stalls short of
/// what it asked for as fatal to the operation in
/// progress, so implementations need not (and should
/// not) paper over truncated sources.
pub trait Reads {
    /// Reads up to `buf.len()` bytes into `buf`,
    /// returning the number of bytes read.
    ///
    /// If an error occurs, the state of `buf` and the
    /// number of bytes consumed is undefined.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

    /// Reads _exactly_ `buf.len()` bytes into `buf`.
    ///
    /// Fails with [`StreamError::Empty`] if the source
    /// stops producing bytes before `buf` is full.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), StreamError> {
        let mut read = 0;

        while read < buf.len() {
            match self.read(&mut buf[read..])? {
                0 => return Err(StreamError::Empty),
                n => read += n,
            }
        }

        Ok(())
    }
}

#[cfg(not(any(feature = "std", test)))]
impl Reads for &[u8] {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let amt = core::cmp::min(buf.len(), self.len());
        let (a, b) = self.split_at(amt);
        buf[..amt].copy_from_slice(a);
        *self = b;
        Ok(amt)
    }
}

#[cfg(not(any(feature = "std", test)))]
impl<R: Reads + ?Sized> Reads for &mut R {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        (**self).read(buf)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), StreamError> {
        (**self).read_exact(buf)
    }
}

#[cfg(any(feature = "std", test))]
impl<T> Reads for T
where
    T: std::io::Read,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        std::io::Read::read(self, buf).map_err(map_io_error)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), StreamError> {
        std::io::Read::read_exact(self, buf).map_err(map_io_error)
    }
}

/// A thing that pushes bytes into a stream.
pub trait Writes {
    /// Writes up to `buf.len()` bytes from `buf`,
    /// returning the number of bytes written.
    ///
    /// If an error occurs, the number of bytes actually
    /// written is undefined.
    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError>;

    /// Writes _all_ bytes from `buf`.
    ///
    /// Fails with [`StreamError::Closed`] if the sink
    /// stops accepting bytes before `buf` is drained.
    fn write_all(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        let mut written = 0;

        while written < buf.len() {
            match self.write(&buf[written..])? {
                0 => return Err(StreamError::Closed),
                n => written += n,
            }
        }

        Ok(())
    }
}

#[cfg(not(any(feature = "std", test)))]
impl Writes for alloc::vec::Vec<u8> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }
}

#[cfg(not(any(feature = "std", test)))]
impl<W: Writes + ?Sized> Writes for &mut W {
    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        (**self).write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        (**self).write_all(buf)
    }
}

#[cfg(any(feature = "std", test))]
impl<T> Writes for T
where
    T: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, StreamError> {
        let written = std::io::Write::write(self, buf).map_err(map_io_error)?;

        // A writer reporting zero bytes accepted is, for
        // our purposes, a writer that stopped accepting.
        if written == 0 && !buf.is_empty() {
            Err(StreamError::Closed)
        } else {
            Ok(written)
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        std::io::Write::write_all(self, buf).map_err(map_io_error)
    }
}

#[cfg(any(feature = "std", test))]
fn map_io_error(error: std::io::Error) -> StreamError {
    match error.kind() {
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::ConnectionAborted
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::WriteZero => StreamError::Closed,
        std::io::ErrorKind::UnexpectedEof => StreamError::Empty,
        _ => StreamError::Other {
            message: "unexpected IO error",
        },
    }
}

/// Enumeration of errors that may occur while reading
/// or writing a stream of bytes.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum StreamError {
    /// The stream ran out of data before the
    /// operation finished.
    Empty,

    /// The stream stopped accepting or producing data.
    Closed,

    /// Uncategorized error.
    #[snafu(display("{message}"))]
    Other { message: &'static str },
}

/// Configuration for reading serialized objects from
/// a byte source.
///
/// Besides the source itself, a reader carries two
/// framing options:
///
/// - a forced format version ([`Self::use_version`]),
///   which overrides whatever version the stream's
///   header declares; `0` (the default) means "trust
///   the header", and
/// - a headerless flag ([`Self::no_header`]) for streams
///   serialized without the 6-byte header. Headerless
///   streams carry no version of their own, so reading
///   one requires a forced version.
#[derive(Debug)]
pub struct Reader<R> {
    source: R,
    use_version: u16,
    no_header: bool,
}

impl<R: Reads> Reader<R> {
    /// Returns a reader over `source` that expects a
    /// header and trusts the version it declares.
    pub fn new(source: R) -> Self {
        Self {
            source,
            use_version: 0,
            no_header: false,
        }
    }

    /// Forces objects to be read as format `version`,
    /// ignoring the version the header declares.
    /// A `version` of `0` restores header dispatch.
    pub fn use_version(mut self, version: u16) -> Self {
        self.use_version = version;
        self
    }

    /// Marks the stream as headerless.
    pub fn no_header(mut self) -> Self {
        self.no_header = true;
        self
    }

    /// Borrows the underlying source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Mutably borrows the underlying source.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.source
    }

    /// Unwraps the reader, returning the source.
    pub fn into_inner(self) -> R {
        self.source
    }

    pub(crate) fn forced_version(&self) -> u16 {
        self.use_version
    }

    pub(crate) fn is_headerless(&self) -> bool {
        self.no_header
    }
}

/// Configuration for writing serialized objects into
/// a byte sink.
///
/// Mirrors [`Reader`]: a forced format version of `0`
/// (the default) means "write the default version", and
/// the headerless flag suppresses the 6-byte header.
/// Note that a headerless stream can only be read back
/// by a reader configured with a forced version.
#[derive(Debug)]
pub struct Writer<W> {
    sink: W,
    use_version: u16,
    no_header: bool,
}

impl<W: Writes> Writer<W> {
    /// Returns a writer into `sink` that emits a header
    /// declaring the default format version.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            use_version: 0,
            no_header: false,
        }
    }

    /// Forces objects to be written as format `version`.
    /// A `version` of `0` restores the default.
    pub fn use_version(mut self, version: u16) -> Self {
        self.use_version = version;
        self
    }

    /// Suppresses the stream header.
    pub fn no_header(mut self) -> Self {
        self.no_header = true;
        self
    }

    /// Borrows the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Mutably borrows the underlying sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Unwraps the writer, returning the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    pub(crate) fn forced_version(&self) -> u16 {
        self.use_version
    }

    pub(crate) fn is_headerless(&self) -> bool {
        self.no_header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A source that trickles one byte per call, to
    /// exercise the `read_exact` retry loop.
    struct Trickle {
        bytes: alloc::vec::Vec<u8>,
        at: usize,
    }

    impl Reads for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
            if self.at == self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.at];
            self.at += 1;
            Ok(1)
        }
    }

    #[test]
    fn read_exact_loops_until_full() {
        let mut source = Trickle {
            bytes: alloc::vec![1, 2, 3, 4],
            at: 0,
        };

        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).unwrap();
        assert_eq!([1, 2, 3, 4], buf);
    }

    #[test]
    fn read_exact_fails_on_exhausted_source() {
        let mut source = Trickle {
            bytes: alloc::vec![1, 2],
            at: 0,
        };

        let mut buf = [0u8; 4];
        assert_eq!(Err(StreamError::Empty), source.read_exact(&mut buf));
    }

    #[test]
    fn slices_and_vecs_stream() {
        let mut sink: alloc::vec::Vec<u8> = alloc::vec![];
        sink.write_all(&[1, 2, 3]).unwrap();
        assert_eq!(alloc::vec![1, 2, 3], sink);

        let mut source: &[u8] = &sink;
        let mut buf = [0u8; 2];
        source.read_exact(&mut buf).unwrap();
        assert_eq!([1, 2], buf);
        assert_eq!(&[3u8][..], source);
    }
}
