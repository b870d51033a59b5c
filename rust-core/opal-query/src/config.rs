// SPDX-License-Identifier: PMPL-1.0-or-later
//! Filter translator configuration.

use serde::{Deserialize, Serialize};

/// How the translator treats a scalar number compared for equality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericEquality {
    /// A single `term` leaf carrying the number as written.
    #[default]
    Exact,
    /// The dual float/integer `should` produced by `FieldRef::equals`.
    DualTyped,
}

/// Filter translator configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub numeric_equality: NumericEquality,
}

impl TranslatorConfig {
    /// Configuration that makes scalar numbers match the algebra's equality.
    pub fn dual_typed() -> Self {
        Self {
            numeric_equality: NumericEquality::DualTyped,
        }
    }
}
