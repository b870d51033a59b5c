// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Fuzz target for the filter translator.
// Run with: cargo +nightly fuzz run fuzz_filter_translate
//
// Arbitrary JSON goes through both numeric-equality modes. Translation
// may fail but must not panic, and every body it produces must be
// accepted by the canonicalizer.

#![no_main]

use libfuzzer_sys::fuzz_target;
use opal_query::{FilterTranslator, TranslatorConfig};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if input.len() <= 4096 {
            if let Ok(filter) = serde_json::from_str::<serde_json::Value>(input) {
                for config in [TranslatorConfig::default(), TranslatorConfig::dual_typed()] {
                    if let Ok(condition) = FilterTranslator::new(config).translate(&filter) {
                        let body = condition.to_body();
                        assert!(opal_normalizer::canonicalize(&body).is_ok());
                    }
                }
            }
        }
    }
});
