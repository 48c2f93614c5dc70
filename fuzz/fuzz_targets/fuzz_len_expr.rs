// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use structwire::LenExpr;

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(expr) = LenExpr::parse(src) else {
        return;
    };

    // Display output must parse back to the same tree
    let reparsed = LenExpr::parse(&expr.to_string()).expect("display output must parse");
    assert_eq!(reparsed, expr);

    // Evaluation is checked; it may fail but never panic
    let _ = expr.eval(&mut |name| Some(name.len() as u64));
    let _ = expr.render_checked(&|name| format!("u64::from(f_{name})"));
});
