// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use structwire::{NamedTypes, TypeDesc};

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };
    let (ty, len) = match src.split_once('|') {
        Some((ty, len)) => (ty, Some(len)),
        None => (src, None),
    };
    let Ok(desc) = ty.parse::<TypeDesc>() else {
        return;
    };

    let aliases = NamedTypes::new().with("Id", "u32").with("Loop", "Loop");
    if let Ok(field) = aliases.classify(&desc, len) {
        let _ = field.size();
        let _ = field.size_expr().to_string();
    }
});
