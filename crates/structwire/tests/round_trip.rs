// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Randomized decode(encode(x)) == x over generated schemas.

#![allow(clippy::cast_possible_truncation)]

use structwire::{
    Assembler, BasicKind, Codec, FieldType, GroupKind, RawField, RawStruct, Record, TypeDesc,
    Value,
};

fn random_scalar(rng: &mut fastrand::Rng, kind: BasicKind) -> Value {
    match kind {
        BasicKind::F32 => Value::F32(f32::from_bits(rng.u32(..))),
        BasicKind::F64 => Value::F64(f64::from_bits(rng.u64(..))),
        kind => Value::from_bits(kind, rng.u64(..)),
    }
}

/// NaN != NaN would break the equality check.
fn finite(v: Value) -> Value {
    match v {
        Value::F32(x) if x.is_nan() => Value::F32(0.5),
        Value::F64(x) if x.is_nan() => Value::F64(0.25),
        other => other,
    }
}

/// A random struct plus a matching record.
fn random_case(rng: &mut fastrand::Rng, id: usize) -> (RawStruct, Record) {
    let mut raw = RawStruct::new(format!("Case{id}"));
    let mut rec = Record::new();
    let mut counters: Vec<(String, u64)> = Vec::new();

    for i in 0..rng.usize(0..12) {
        let name = format!("f{i}");
        let kind = BasicKind::ALL[rng.usize(0..BasicKind::ALL.len())];
        let elem = TypeDesc::named(kind.name());

        match rng.u8(0..4) {
            0 if !counters.is_empty() => {
                let (counter, count) = counters[rng.usize(0..counters.len())].clone();
                let extra = rng.u64(0..3);
                let len = if extra == 0 {
                    counter
                } else {
                    format!("{counter} + {extra}")
                };
                raw = raw.field(RawField::new(&name, TypeDesc::sequence(elem)).with_len(len));
                let elems = (0..count + extra)
                    .map(|_| finite(random_scalar(rng, kind)))
                    .collect();
                rec.set(name, Value::Sequence(elems));
            }
            1 => {
                let len = rng.usize(0..5);
                raw = raw.field(RawField::new(&name, TypeDesc::array(elem, len)));
                let elems = (0..len).map(|_| finite(random_scalar(rng, kind))).collect();
                rec.set(name, Value::Array(elems));
            }
            _ if kind.is_unsigned() && rng.bool() => {
                // Small values so the sequences they count stay small.
                let count = rng.u64(0..6);
                raw = raw.field(RawField::new(&name, elem));
                rec.set(name.clone(), Value::from_bits(kind, count));
                counters.push((name, count));
            }
            _ => {
                raw = raw.field(RawField::new(&name, elem));
                rec.set(name, finite(random_scalar(rng, kind)));
            }
        }
    }
    (raw, rec)
}

#[test]
fn random_records_round_trip() {
    let mut rng = fastrand::Rng::with_seed(0x5717_C0DE);
    let asm = Assembler::default();

    for id in 0..300 {
        let (raw, rec) = random_case(&mut rng, id);
        let unit = asm.compile(&raw).unwrap();
        let codec = Codec::new(&unit);

        let bytes = codec.encode_to_vec(&rec).unwrap();
        let expected_len: usize = rec
            .iter()
            .map(|(_, v)| match v.as_elements() {
                Some(elems) => elems.iter().filter_map(Value::kind).map(BasicKind::size).sum(),
                None => v.kind().map_or(0, BasicKind::size),
            })
            .sum();
        assert_eq!(bytes.len(), expected_len, "{}", raw.name);

        let back = codec.decode_from_slice(&bytes).unwrap();
        assert_eq!(back, rec, "{}", raw.name);
    }
}

#[test]
fn planned_groups_cover_every_field() {
    let mut rng = fastrand::Rng::with_seed(42);
    let asm = Assembler::default();

    for id in 0..200 {
        let (raw, _) = random_case(&mut rng, id);
        let unit = asm.compile(&raw).unwrap();

        let mut next = 0;
        let mut prev_fixed = false;
        for group in &unit.groups {
            assert_eq!(group.start, next);
            match group.kind {
                GroupKind::Fixed(_) => assert!(!prev_fixed, "adjacent fixed groups"),
                GroupKind::Variable => {
                    assert_eq!(group.len, 1);
                    assert!(matches!(
                        unit.fields[group.start].ty(),
                        FieldType::Sequence { .. }
                    ));
                }
            }
            prev_fixed = group.is_fixed();
            next += group.len;
        }
        assert_eq!(next, unit.fields.len());
    }
}

#[test]
fn truncated_input_fails_with_eof() {
    let mut rng = fastrand::Rng::with_seed(7);
    let asm = Assembler::default();

    for id in 0..100 {
        let (raw, rec) = random_case(&mut rng, id);
        let unit = asm.compile(&raw).unwrap();
        let codec = Codec::new(&unit);
        let bytes = codec.encode_to_vec(&rec).unwrap();
        if bytes.is_empty() {
            continue;
        }
        let cut = rng.usize(0..bytes.len());
        let err = codec.decode_from_slice(&bytes[..cut]).unwrap_err();
        assert!(err.is_eof(), "{}: {err}", raw.name);
    }
}
