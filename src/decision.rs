//! Decision Type
//!
//! Decoding of the packed per-node `decision_type` word.
use crate::constants::{CATEGORICAL_MASK, DEFAULT_LEFT_MASK, MISSING_TYPE_MASK};
use serde::{Deserialize, Serialize};

/// Flags packed into a node's `decision_type`.
///
/// Bit layout:
/// - Bit 0: categorical split.
/// - Bit 1: missing values go to the left child.
/// - Bits 2-3: missing value handling, any non-zero value means the
///   node handles missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct DecisionFlags {
    pub is_categorical: bool,
    pub is_default_left: bool,
    pub has_missing: bool,
}

impl DecisionFlags {
    /// Decode the flags of a `decision_type` value. Every `u32` is valid.
    pub fn decode(code: u32) -> Self {
        DecisionFlags {
            is_categorical: code & CATEGORICAL_MASK != 0,
            is_default_left: code & DEFAULT_LEFT_MASK != 0,
            has_missing: code & MISSING_TYPE_MASK != 0,
        }
    }

    /// Value a missing feature is imputed with for a numeric split.
    ///
    /// Left-defaulting nodes impute the threshold itself, right-defaulting
    /// nodes impute a value above it. Categorical nodes and nodes without
    /// missing handling impute 0.
    pub fn default_value(&self, threshold: f64) -> f64 {
        if self.has_missing && !self.is_categorical {
            if self.is_default_left {
                threshold
            } else {
                threshold + 1.0
            }
        } else {
            0.0
        }
    }
}
