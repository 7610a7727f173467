use criterion::{criterion_group, criterion_main, Criterion};

use dbof::codec::{self, write};
use dbof::stream::Writer;
use dbof::types::{Object, TypedArray, TypedMap, UntypedArray, UntypedMap};

/// Builds a moderately nested document touching every
/// container kind and most scalar kinds.
fn document() -> Object {
    let mut readings = TypedArray::new();
    for i in 0..64i64 {
        readings.push(Object::from(i * 37)).unwrap();
    }

    let mut labels = TypedMap::new();
    for i in 0..16u32 {
        labels
            .insert(Object::from(i), Object::from(format!("channel-{i}")))
            .unwrap();
    }

    let mut tags = UntypedArray::new();
    tags.push(Object::from("bench"));
    tags.push(Object::from(true));
    tags.push(Object::from(2.5f64));

    let mut root = UntypedMap::new();
    root.insert(Object::from("readings"), Object::from(readings));
    root.insert(Object::from("labels"), Object::from(labels));
    root.insert(Object::from("tags"), Object::from(tags));
    root.insert(Object::from("revision"), Object::from(9_000_001u64));
    Object::from(root)
}

fn codecs(c: &mut Criterion) {
    let mut group = c.benchmark_group("Codecs");
    group.throughput(criterion::Throughput::Elements(1));

    let document = document();

    // Pre-encode the bytes for decoding later.
    let encoded = codec::to_vec(&document).unwrap();
    assert_eq!(document, codec::from_slice(&encoded).unwrap());

    group.bench_function("Encode", |b| {
        let mut bytes = Vec::with_capacity(encoded.len());

        b.iter(|| {
            bytes.clear();
            write(&document, &mut Writer::new(&mut bytes)).unwrap();
            assert_eq!(encoded.len(), bytes.len());
        });
    });

    group.bench_function("Decode", |b| {
        b.iter(|| {
            let decoded = codec::from_slice(&encoded).unwrap();
            assert_eq!(Some(4), decoded.as_untyped_map().map(UntypedMap::len));
        });
    });

    group.finish();
}

criterion_group!(benches, codecs);
criterion_main!(benches);
