// ABOUTME: Criterion benchmarks for the SMS PDU codec hot paths
// ABOUTME: Covers 7-bit packing, UCS-2, addresses, full encode/decode and reassembly

use atmodem::pdu::{self, gsm7, hex, ucs2, Message, MessageEncoding};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const ASCII_TEXT: &str = "Hello World! This is a test message.";
const CJK_TEXT: &str = "你好世界！这是一条测试消息。";
const DELIVER_PDU: &str = "07911326040000F0040B911346610089F600002080629173140805C8329BFD06";

fn bench_gsm7(c: &mut Criterion) {
    let septets = gsm7::to_septets(ASCII_TEXT).unwrap();
    let packed = gsm7::pack(&septets, 0);

    c.bench_function("gsm7_to_septets", |b| {
        b.iter(|| gsm7::to_septets(black_box(ASCII_TEXT)).unwrap())
    });
    c.bench_function("gsm7_pack", |b| b.iter(|| gsm7::pack(black_box(&septets), 0)));
    c.bench_function("gsm7_unpack", |b| {
        b.iter(|| gsm7::unpack(black_box(&packed), septets.len(), 0))
    });
    c.bench_function("gsm7_compatibility_check", |b| {
        b.iter(|| pdu::is_gsm7_compatible(black_box("with extended chars: €|^")))
    });
}

fn bench_ucs2(c: &mut Criterion) {
    let encoded = ucs2::encode(CJK_TEXT);

    c.bench_function("ucs2_encode", |b| b.iter(|| ucs2::encode(black_box(CJK_TEXT))));
    c.bench_function("ucs2_decode", |b| {
        b.iter(|| ucs2::decode(black_box(&encoded)).unwrap())
    });
}

fn bench_addresses(c: &mut Criterion) {
    c.bench_function("phone_number_encode", |b| {
        b.iter(|| pdu::encode_phone_number(black_box("+8613800138000")).unwrap())
    });

    let (addr_type, bytes) = pdu::encode_phone_number("+8613800138000").unwrap();
    c.bench_function("phone_number_decode", |b| {
        b.iter(|| pdu::decode_phone_number(black_box(&bytes), 13, addr_type).unwrap())
    });
}

fn bench_messages(c: &mut Criterion) {
    let short = Message::submit("+8613800138000", ASCII_TEXT);
    let long = Message::submit("+8613800138000", "a".repeat(500));

    c.bench_function("encode_single_sms", |b| {
        b.iter(|| pdu::encode(black_box(&short)).unwrap())
    });
    c.bench_function("encode_concatenated_sms", |b| {
        b.iter(|| pdu::encode(black_box(&long)).unwrap())
    });
    c.bench_function("decode_deliver", |b| {
        b.iter(|| pdu::decode(black_box(DELIVER_PDU)).unwrap())
    });
    c.bench_function("calculate_parts", |b| {
        b.iter(|| pdu::calculate_parts(black_box(&"a".repeat(500)), MessageEncoding::Gsm7Bit))
    });
}

fn bench_concat_manager(c: &mut Criterion) {
    c.bench_function("concat_reassembly", |b| {
        b.iter(|| {
            let mut manager = pdu::ConcatManager::new();
            for part in 1..=3u8 {
                let msg = Message {
                    phone_number: "+8613800138000".into(),
                    text: "Part".into(),
                    reference: 0x42,
                    parts: 3,
                    part,
                    ..Message::default()
                };
                let _ = manager.add(black_box(msg));
            }
        })
    });
}

fn bench_hex(c: &mut Criterion) {
    let data = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];
    c.bench_function("hex_round_trip", |b| {
        b.iter(|| {
            let encoded = hex::bytes_to_hex(black_box(&data));
            hex::hex_to_bytes(&encoded).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_gsm7,
    bench_ucs2,
    bench_addresses,
    bench_messages,
    bench_concat_manager,
    bench_hex,
);
criterion_main!(benches);
