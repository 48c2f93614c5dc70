// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use structwire::{Assembler, Codec, RawField, RawStruct, TypeDesc};

fuzz_target!(|data: &[u8]| {
    let raw = RawStruct::new("Frame")
        .field(RawField::new("kind", TypeDesc::named("u8")))
        .field(RawField::new("count", TypeDesc::named("u16")))
        .field(RawField::new("scale", TypeDesc::named("f32")))
        .field(RawField::new("values", TypeDesc::sequence(TypeDesc::named("i32"))).with_len("count"))
        .field(RawField::new("tag", TypeDesc::array(TypeDesc::named("u8"), 4)));
    let Ok(unit) = Assembler::default().compile(&raw) else {
        return;
    };
    let codec = Codec::new(&unit);

    // Anything that decodes must re-encode to the bytes it consumed
    if let Ok(record) = codec.decode_from_slice(data) {
        let bytes = codec.encode_to_vec(&record).expect("decoded record must encode");
        assert_eq!(&data[..bytes.len()], bytes.as_slice());
    }
});
