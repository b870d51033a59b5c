// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for the canonicalizer.
// Run with: cargo +nightly fuzz run fuzz_canonicalize
//
// Any JSON body is either rejected as unsupported or canonicalized; a
// canonical form must always be equivalent to itself.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if input.len() <= 4096 {
            if let Ok(body) = serde_json::from_str::<serde_json::Value>(input) {
                if opal_normalizer::canonicalize(&body).is_ok() {
                    assert_eq!(opal_normalizer::equivalent(&body, &body).ok(), Some(true));
                }
            }
        }
    }
});
