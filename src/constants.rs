pub const TREE_MARKER: &str = "Tree=";
pub const MAX_FEATURE_IDX_MARKER: &str = "max_feature_idx";
pub const PARAMETERS_MARKER: &str = "parameters";
pub const END_OF_PARAMETERS_MARKER: &str = "end of parameters";

/// Width of one word in a categorical bitset.
pub const BITSET_WORD_BITS: usize = 32;

pub const CATEGORICAL_MASK: u32 = 0b0001;
pub const DEFAULT_LEFT_MASK: u32 = 0b0010;
pub const MISSING_TYPE_MASK: u32 = 0b1100;
