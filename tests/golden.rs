//! Fixed inputs against fixed expected bytes. Any implementation of the format should produce
//! exactly these encodings, and read every one of them back to the same value.

use chainpack::*;
use indexmap::IndexMap;

fn repeat(b: u8, n: usize) -> String {
    format!("{:02x}", b).repeat(n)
}

fn pow2(n: usize) -> U256 {
    U256::from(1u8) << n
}

fn check(v: Value, hex: &str) {
    let enc = encode(&v).unwrap();
    assert_eq!(
        encode_hex(&v).unwrap(),
        format!("0x{}", hex),
        "encoding of {:?}",
        v
    );
    assert_eq!(decode(&enc).unwrap(), v, "decoding of 0x{}", hex);
    let mut cursor = Cursor::new(&enc);
    cursor.skip().unwrap();
    assert!(!cursor.has_more(), "skip over 0x{} stopped early", hex);
}

#[test]
fn scalars() {
    check(Value::Nil, "c0");
    check(Value::Bool(false), "c2");
    check(Value::Bool(true), "c3");
}

#[test]
fn unsigned_tiers() {
    check(0u8.into(), "00");
    check(42u8.into(), "2a");
    check(127u8.into(), "7f");
    check(128u8.into(), "cc80");
    check(255u8.into(), "ccff");
    check(256u16.into(), "cd0100");
    check(65535u16.into(), "cdffff");
    check(65536u32.into(), "ce00010000");
    check(u32::MAX.into(), "ceffffffff");
    check((1u64 << 32).into(), "cf0000000100000000");
    check(u64::MAX.into(), "cfffffffffffffffff");
    check(
        (1u128 << 64).into(),
        "d400000000000000010000000000000000",
    );
    check(u128::MAX.into(), &format!("d4{}", repeat(0xff, 16)));
    check(
        pow2(128).into(),
        &format!("d5{}01{}", repeat(0, 15), repeat(0, 16)),
    );
    check(U256::MAX.into(), &format!("d5{}", repeat(0xff, 32)));
}

#[test]
fn signed_tiers() {
    check((-1i8).into(), "ff");
    check((-32i8).into(), "e0");
    check((-33i8).into(), "d0df");
    check((-128i8).into(), "d080");
    check((-129i16).into(), "d1ff7f");
    check((-32768i16).into(), "d18000");
    check((-32769i32).into(), "d2ffff7fff");
    check(i32::MIN.into(), "d280000000");
    // No 64-bit signed tier: anything past 32 bits goes straight to 256 bits
    check(
        (i32::MIN as i64 - 1).into(),
        &format!("d6{}7fffffff", repeat(0xff, 28)),
    );
    check(i64::MIN.into(), &format!("d6{}8000000000000000", repeat(0xff, 24)));
    check(
        Integer::min_value().into(),
        &format!("d680{}", repeat(0, 31)),
    );
}

#[test]
fn text_and_bytes() {
    check("".into(), "a0");
    check("hello".into(), "a568656c6c6f");
    check("a".repeat(31).into(), &format!("bf{}", repeat(b'a', 31)));
    check("a".repeat(32).into(), &format!("d920{}", repeat(b'a', 32)));
    check("a".repeat(256).into(), &format!("da0100{}", repeat(b'a', 256)));
    check(Value::Bin(vec![]), "c400");
    check(Value::Bin(vec![1, 2, 3]), "c403010203");
    check(Value::Bin(vec![7; 256]), &format!("c50100{}", repeat(7, 256)));
}

#[test]
fn containers() {
    check(Value::Array(vec![]), "90");
    check(Value::Array(vec![Value::Nil; 15]), &format!("9f{}", repeat(0xc0, 15)));
    check(Value::Array(vec![Value::Nil; 16]), &format!("c710{}", repeat(0xc0, 16)));
    check(Value::Array(vec![Value::Nil; 256]), &format!("dc0100{}", repeat(0xc0, 256)));
    check(Value::Map(IndexMap::new()), "80");

    let mut map = IndexMap::new();
    map.insert("test".to_string(), Value::from(42u8));
    map.insert("test2".to_string(), Value::Array(vec![]));
    check(Value::Map(map), "82a4746573742aa5746573743290");

    // Insertion order is kept, not sorted
    let mut map = IndexMap::new();
    map.insert("b".to_string(), Value::from(1u8));
    map.insert("a".to_string(), Value::from(2u8));
    check(Value::Map(map), "82a16201a16102");

    let keys = "abcdefghijklmnop";
    let map: IndexMap<String, Value> = keys
        .chars()
        .map(|k| (k.to_string(), Value::Nil))
        .collect();
    let body: String = keys.bytes().map(|k| format!("a1{:02x}c0", k)).collect();
    check(Value::Map(map), &format!("c810{}", body));
}

#[test]
fn fixed_width() {
    check(
        Address::new([0x11; 20]).into(),
        &format!("d7{}", repeat(0x11, 20)),
    );
    check(
        Hash32::new([0xab; 32]).into(),
        &format!("d8{}", repeat(0xab, 32)),
    );
}

#[test]
fn reserved_tags() {
    for tag in [0xc1u8, 0xc6, 0xc9, 0xca, 0xcb, 0xdb, 0xdd, 0xdf] {
        assert_eq!(
            decode(&[tag]),
            Err(Error::UnknownTag { offset: 0, tag }),
            "tag 0x{:02x}",
            tag
        );
    }
}

#[test]
fn tolerant_reads() {
    // Non-minimal encodings read back to the same value
    let cases = [
        ("cc05", Value::from(5u8)),
        ("cd0005", Value::from(5u8)),
        ("ce00000005", Value::from(5u8)),
        ("d400000000000000000000000000000005", Value::from(5u8)),
        ("d0ff", Value::from(-1i8)),
        ("d3ffffffffffffffff", Value::from(-1i8)),
        ("d30000000000000005", Value::from(5u8)),
        ("d90161", Value::from("a")),
        ("da000161", Value::from("a")),
        ("c500020102", Value::Bin(vec![1, 2])),
        ("c70101", Value::Array(vec![1u8.into()])),
        ("dc000101", Value::Array(vec![1u8.into()])),
    ];
    for (hex, v) in cases {
        assert_eq!(decode_hex(hex).unwrap(), v, "0x{}", hex);
    }
}
