// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec emitter: turns a planned struct into decode/encode statement lists.

use crate::ir::{CodecUnit, DecodeStmt, EncodeStmt, Place, ReadLen};
use crate::plan::{GroupKind, Plan};
use crate::schema::InputStruct;
use crate::types::FieldType;

/// Decode body: one read per group, then per-field byte reconstruction.
pub fn emit_decode(s: &InputStruct, plan: &Plan) -> Vec<DecodeStmt> {
    let mut out = Vec::new();
    let reads = plan
        .groups()
        .iter()
        .any(|g| !matches!(g.kind, GroupKind::Fixed(0)));
    if reads {
        out.push(DecodeStmt::Scratch(plan.max_fixed()));
    }

    for group in plan.groups() {
        if let GroupKind::Fixed(bytes) = group.kind {
            // Zero-byte runs (empty arrays) still allocate their fields.
            if bytes > 0 {
                out.push(DecodeStmt::ReadBytes(ReadLen::Fixed(bytes)));
            }
        }

        let mut cursor = 0;
        for field in &s.fields()[group.fields()] {
            let name = field.name().to_string();
            match field.ty() {
                FieldType::Simple(scalar) => {
                    out.push(DecodeStmt::EmitByteOr {
                        place: Place::Field(name),
                        scalar: scalar.clone(),
                        offset: cursor,
                    });
                    cursor += scalar.size();
                }
                FieldType::Array { elem, len } => {
                    out.push(DecodeStmt::AllocArray {
                        field: name.clone(),
                        len: *len,
                        elem: elem.clone(),
                    });
                    if *len > 0 {
                        out.push(DecodeStmt::EmitByteOr {
                            place: Place::Elements(name),
                            scalar: elem.clone(),
                            offset: cursor,
                        });
                    }
                    cursor += elem.size() * len;
                }
                FieldType::Sequence { elem, len } => {
                    out.push(DecodeStmt::EvalLen {
                        field: name.clone(),
                        expr: len.clone(),
                    });
                    out.push(DecodeStmt::ReadBytes(ReadLen::Counted {
                        field: name.clone(),
                        unit: elem.size(),
                    }));
                    out.push(DecodeStmt::AllocSequence {
                        field: name.clone(),
                        elem: elem.clone(),
                    });
                    out.push(DecodeStmt::EmitByteOr {
                        place: Place::Elements(name),
                        scalar: elem.clone(),
                        offset: 0,
                    });
                }
            }
        }
    }
    out
}

/// Encode body: size the buffer, append every field in order, write once.
pub fn emit_encode(s: &InputStruct, plan: &Plan) -> Vec<EncodeStmt> {
    let mut out = Vec::new();
    let mut counted = Vec::new();

    for field in s.fields() {
        if let FieldType::Sequence { elem, len } = field.ty() {
            let name = field.name().to_string();
            out.push(EncodeStmt::EvalLen {
                field: name.clone(),
                expr: len.clone(),
            });
            out.push(EncodeStmt::CheckLen { field: name.clone() });
            counted.push((name, elem.size()));
        }
    }

    out.push(EncodeStmt::Reserve {
        fixed: plan.fixed_size(),
        counted,
    });

    for field in s.fields() {
        let name = field.name().to_string();
        let place = match field.ty() {
            FieldType::Simple(_) => Place::Field(name),
            FieldType::Array { .. } | FieldType::Sequence { .. } => Place::Elements(name),
        };
        out.push(EncodeStmt::AppendBytes {
            place,
            scalar: field.ty().scalar().clone(),
        });
    }

    out.push(EncodeStmt::WriteAll);
    out
}

/// Plan and emit both procedures for a bound struct.
pub fn compile(s: &InputStruct) -> CodecUnit {
    let plan = Plan::for_struct(s);
    let decode = emit_decode(s, &plan);
    let encode = emit_encode(s, &plan);

    log::debug!(
        "{}: {} groups, {} fixed bytes, {} decode / {} encode statements",
        s.name(),
        plan.groups().len(),
        plan.fixed_size(),
        decode.len(),
        encode.len()
    );

    CodecUnit {
        name: s.name().to_string(),
        fields: s.fields().to_vec(),
        fixed_size: plan.fixed_size(),
        groups: plan.groups().to_vec(),
        decode,
        encode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawField, RawStruct};
    use crate::types::NamedTypes;

    fn bind(raw: RawStruct) -> InputStruct {
        InputStruct::bind(&raw, &NamedTypes::new()).expect("bind")
    }

    fn listing<T: ToString>(stmts: &[T]) -> Vec<String> {
        stmts.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_decode_reads_once_per_group() {
        let s = bind(
            RawStruct::new("Packet")
                .field(RawField::new("n", "u8".parse().expect("ty")))
                .field(RawField::new("a", "u16".parse().expect("ty")))
                .field(RawField::new("b", "[i16; 2]".parse().expect("ty")))
                .field(RawField::new("c", "Vec<u32>".parse().expect("ty")).with_len("n"))
                .field(RawField::new("z", "f64".parse().expect("ty"))),
        );
        let unit = compile(&s);
        assert_eq!(
            listing(&unit.decode),
            vec![
                "scratch 8",
                "read 7",
                "load n: u8 @0",
                "load a: u16 @1",
                "alloc b: [i16; 2]",
                "load b[..]: i16 @3",
                "len c = n",
                "read len(c) * 4",
                "alloc c: Vec<u32>",
                "load c[..]: u32 @0",
                "read 8",
                "load z: f64 @0",
            ]
        );
        assert_eq!(unit.fixed_size, 15);
    }

    #[test]
    fn test_encode_appends_in_declaration_order() {
        let s = bind(
            RawStruct::new("Packet")
                .field(RawField::new("n", "u8".parse().expect("ty")))
                .field(RawField::new("c", "Vec<u16>".parse().expect("ty")).with_len("n * 2"))
                .field(RawField::new("t", "[u8; 3]".parse().expect("ty"))),
        );
        let unit = compile(&s);
        assert_eq!(
            listing(&unit.encode),
            vec![
                "len c = n * 2",
                "check len(c)",
                "reserve 4 + len(c) * 2",
                "store n: u8",
                "store c[..]: u16",
                "store t[..]: u8",
                "write",
            ]
        );
        assert!(!unit.is_fixed_size());
    }

    #[test]
    fn test_empty_array_emits_no_read() {
        let s = bind(RawStruct::new("Pad").field(RawField::new("p", "[u8; 0]".parse().expect("ty"))));
        let unit = compile(&s);
        assert_eq!(
            listing(&unit.decode),
            vec!["alloc p: [u8; 0]"]
        );
    }

    #[test]
    fn test_empty_array_between_fixed_fields() {
        let s = bind(
            RawStruct::new("Pad")
                .field(RawField::new("a", "u8".parse().expect("ty")))
                .field(RawField::new("p", "[u16; 0]".parse().expect("ty")))
                .field(RawField::new("b", "u8".parse().expect("ty"))),
        );
        let unit = compile(&s);
        assert_eq!(
            listing(&unit.decode),
            vec![
                "scratch 2",
                "read 2",
                "load a: u8 @0",
                "alloc p: [u16; 0]",
                "load b: u8 @1",
            ]
        );
    }

    #[test]
    fn test_empty_struct() {
        let unit = compile(&bind(RawStruct::new("Unit")));
        assert!(unit.decode.is_empty());
        assert_eq!(listing(&unit.encode), vec!["reserve 0", "write"]);
        assert!(unit.is_fixed_size());
    }
}
