#![cfg(test)]
//! Integration tests of the codec over `std` IO streams.

use std::io::Cursor;
use std::net::{TcpListener, TcpStream};
use std::thread::JoinHandle;

use dbof::codec::{self, CodecError};
use dbof::stream::{Reader, Writer};
use dbof::types::{Object, TypedArray, UntypedMap};
use pretty_assertions::assert_eq;

/// Builds a document shaped like real application data:
/// a map holding scalars, a string, and a typed array.
fn sensor_report() -> Object {
    let mut samples = TypedArray::new();
    for value in [19.5f64, 20.25, 21.0, 22.75] {
        samples.push(Object::from(value)).unwrap();
    }

    let mut report = UntypedMap::new();
    report.insert(Object::from("station"), Object::from("rooftop-a"));
    report.insert(Object::from("sequence"), Object::from(48_213u32));
    report.insert(Object::from("calibrated"), Object::from(true));
    report.insert(Object::from("samples"), Object::from(samples));
    Object::from(report)
}

#[test]
fn codec_over_tcp() -> Result<(), CodecError> {
    let request = sensor_report();

    // The server echoes the document back with an
    // acknowledgement entry spliced in.
    let mut expected_response = request.clone();
    expected_response
        .as_untyped_map_mut()
        .unwrap()
        .insert(Object::from("ack"), Object::from(true));

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let expected_request = request.clone();
    let server: JoinHandle<Result<(), CodecError>> = std::thread::spawn(move || {
        let (mut socket, _) = listener.accept().unwrap();

        let mut document = codec::read(&mut Reader::new(&mut socket))?;
        assert_eq!(expected_request, document);

        document
            .as_untyped_map_mut()
            .unwrap()
            .insert(Object::from("ack"), Object::from(true));
        codec::write(&document, &mut Writer::new(&mut socket))?;

        Ok(())
    });

    let mut client = TcpStream::connect(format!("127.0.0.1:{port}")).unwrap();
    codec::write(&request, &mut Writer::new(&mut client))?;

    let response = codec::read(&mut Reader::new(&mut client))?;
    assert_eq!(expected_response, response);

    server.join().unwrap()?;
    Ok(())
}

#[test]
fn codec_over_cursor() -> Result<(), CodecError> {
    let document = sensor_report();

    // Write through the generic writer into an
    // in-memory "file".
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    codec::write(&document, &mut writer)?;
    let bytes = writer.into_inner().into_inner();

    assert_eq!(b"DBOF", &bytes[..4]);
    assert_eq!([1u8, 0], bytes[4..6]);

    // Read it back from the start.
    let decoded = codec::read(&mut Reader::new(Cursor::new(&bytes)))?;
    assert_eq!(document, decoded);

    Ok(())
}

/// A single implementation must serialize a map to the
/// same bytes every time: entry order is insertion order,
/// not bucket order.
#[test]
fn map_serialization_is_deterministic() -> Result<(), CodecError> {
    let first = codec::to_vec(&sensor_report())?;
    for _ in 0..10 {
        assert_eq!(first, codec::to_vec(&sensor_report())?);
    }
    Ok(())
}
