//! Tree Block
//!
//! The raw `key=value` fields of one `Tree=` section, and their validation
//! into typed arrays.
use crate::errors::ModelTextError;
use crate::utils::{parse_float_array, parse_int_array, parse_number};

/// A raw field value along with the line it was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub line: usize,
    pub value: &'a str,
}

/// The recognized fields of one tree section of the model text.
///
/// Keys the reader does not use (`leaf_weight`, `shrinkage`, ...) are
/// dropped while the block is scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeBlock<'a> {
    /// Position of the block among all tree blocks of the text.
    pub index: usize,
    /// Line of the `Tree=` header.
    pub line: usize,
    pub num_leaves: Option<Field<'a>>,
    pub num_cat: Option<Field<'a>>,
    pub left_child: Option<Field<'a>>,
    pub right_child: Option<Field<'a>>,
    pub split_feature: Option<Field<'a>>,
    pub threshold: Option<Field<'a>>,
    pub split_gain: Option<Field<'a>>,
    pub leaf_value: Option<Field<'a>>,
    pub decision_type: Option<Field<'a>>,
    pub cat_boundaries: Option<Field<'a>>,
    pub cat_threshold: Option<Field<'a>>,
    /// First line of the section that is not a single `key=value` pair.
    pub invalid_line: Option<Field<'a>>,
}

/// Typed arrays of a tree with at least one split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitArrays {
    pub num_leaves: usize,
    pub left_child: Vec<i32>,
    pub right_child: Vec<i32>,
    pub split_feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub split_gain: Vec<f64>,
    pub leaf_value: Vec<f64>,
    pub decision_type: Vec<u32>,
    pub cat_boundaries: Vec<usize>,
    pub cat_threshold: Vec<u32>,
}

/// A tree block after validation.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBlock {
    /// `num_leaves == 1`, the tree is a constant.
    Constant(f64),
    Split(SplitArrays),
}

impl<'a> TreeBlock<'a> {
    pub fn new(index: usize, line: usize) -> Self {
        TreeBlock {
            index,
            line,
            ..Default::default()
        }
    }

    /// Record a field. Returns `false` if the key is not one the reader uses.
    /// A repeated key replaces the earlier value.
    pub fn set(&mut self, key: &str, field: Field<'a>) -> bool {
        let slot = match key {
            "num_leaves" => &mut self.num_leaves,
            "num_cat" => &mut self.num_cat,
            "left_child" => &mut self.left_child,
            "right_child" => &mut self.right_child,
            "split_feature" => &mut self.split_feature,
            "threshold" => &mut self.threshold,
            "split_gain" => &mut self.split_gain,
            "leaf_value" => &mut self.leaf_value,
            "decision_type" => &mut self.decision_type,
            "cat_boundaries" => &mut self.cat_boundaries,
            "cat_threshold" => &mut self.cat_threshold,
            _ => return false,
        };
        *slot = Some(field);
        true
    }

    pub(crate) fn malformed(&self, field: &str, line: usize, reason: impl Into<String>) -> ModelTextError {
        ModelTextError::MalformedTreeBlock {
            tree: self.index,
            line,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    fn required(&self, name: &str, field: Option<Field<'a>>) -> Result<Field<'a>, ModelTextError> {
        field.ok_or_else(|| self.malformed(name, self.line, "required field is missing"))
    }

    fn check_len<T>(&self, name: &str, field: Field<'a>, values: &[T], expected: usize) -> Result<(), ModelTextError> {
        if values.len() != expected {
            return Err(ModelTextError::InconsistentArrayLengths {
                tree: self.index,
                line: field.line,
                field: name.to_string(),
                expected,
                actual: values.len(),
            });
        }
        Ok(())
    }

    fn ints<T: std::str::FromStr>(&self, name: &str, field: Field<'a>) -> Result<Vec<T>, ModelTextError> {
        parse_int_array(field.value, Some(self.index), name, field.line)
    }

    fn floats(&self, name: &str, field: Field<'a>) -> Result<Vec<f64>, ModelTextError> {
        parse_float_array(field.value, Some(self.index), name, field.line)
    }

    /// Required integer array of exactly `expected` values.
    fn int_array<T: std::str::FromStr>(
        &self,
        name: &str,
        field: Option<Field<'a>>,
        expected: usize,
    ) -> Result<Vec<T>, ModelTextError> {
        let field = self.required(name, field)?;
        let values = self.ints(name, field)?;
        self.check_len(name, field, &values, expected)?;
        Ok(values)
    }

    /// Required float array of exactly `expected` values.
    fn float_array(&self, name: &str, field: Option<Field<'a>>, expected: usize) -> Result<Vec<f64>, ModelTextError> {
        let field = self.required(name, field)?;
        let values = self.floats(name, field)?;
        self.check_len(name, field, &values, expected)?;
        Ok(values)
    }

    /// Validate the block and parse its arrays.
    ///
    /// Every required field must be present and every array must agree with
    /// `num_leaves` (and `num_cat` for the categorical arrays). Constant trees
    /// only need `num_leaves`, `num_cat` and `leaf_value`, any split array
    /// they carry must be empty.
    pub fn decode(&self) -> Result<DecodedBlock, ModelTextError> {
        if let Some(field) = self.invalid_line {
            return Err(self.malformed(field.value, field.line, "expected a single `key=value` pair"));
        }
        let field = self.required("num_leaves", self.num_leaves)?;
        let num_leaves: usize = parse_number(field.value, Some(self.index), "num_leaves", field.line)?;
        if num_leaves == 0 {
            return Err(self.malformed("num_leaves", field.line, "a tree needs at least one leaf"));
        }
        let field = self.required("num_cat", self.num_cat)?;
        let num_cat: usize = parse_number(field.value, Some(self.index), "num_cat", field.line)?;

        let num_nodes = num_leaves - 1;
        if num_nodes == 0 {
            let leaf_value = self.float_array("leaf_value", self.leaf_value, 1)?;
            for (name, field) in [
                ("left_child", self.left_child),
                ("right_child", self.right_child),
                ("split_feature", self.split_feature),
                ("threshold", self.threshold),
                ("split_gain", self.split_gain),
                ("decision_type", self.decision_type),
            ] {
                if let Some(field) = field {
                    let values = self.floats(name, field)?;
                    self.check_len(name, field, &values, 0)?;
                }
            }
            return Ok(DecodedBlock::Constant(leaf_value[0]));
        }

        for (name, field) in [
            ("left_child", self.left_child),
            ("right_child", self.right_child),
            ("split_feature", self.split_feature),
            ("threshold", self.threshold),
            ("split_gain", self.split_gain),
            ("leaf_value", self.leaf_value),
            ("decision_type", self.decision_type),
        ] {
            self.required(name, field)?;
        }

        let left_child = self.int_array("left_child", self.left_child, num_nodes)?;
        let right_child = self.int_array("right_child", self.right_child, num_nodes)?;
        let split_feature = self.int_array("split_feature", self.split_feature, num_nodes)?;
        let threshold = self.float_array("threshold", self.threshold, num_nodes)?;
        let split_gain = self.float_array("split_gain", self.split_gain, num_nodes)?;
        let leaf_value = self.float_array("leaf_value", self.leaf_value, num_leaves)?;
        let decision_type = self.int_array("decision_type", self.decision_type, num_nodes)?;

        let (cat_boundaries, cat_threshold) = if num_cat > 0 {
            let bounds_field = self.required("cat_boundaries", self.cat_boundaries)?;
            let cat_boundaries: Vec<usize> = self.ints("cat_boundaries", bounds_field)?;
            let words_field = self.required("cat_threshold", self.cat_threshold)?;
            let cat_threshold: Vec<u32> = self.ints("cat_threshold", words_field)?;
            if cat_boundaries.len().checked_sub(1) != Some(num_cat) {
                return Err(self.malformed(
                    "cat_boundaries",
                    bounds_field.line,
                    format!(
                        "expected one offset more than num_cat={}, found {}",
                        num_cat,
                        cat_boundaries.len()
                    ),
                ));
            }
            if cat_boundaries.windows(2).any(|w| w[0] > w[1]) {
                return Err(self.malformed("cat_boundaries", bounds_field.line, "offsets must not decrease"));
            }
            let last = cat_boundaries.last().copied().unwrap_or_default();
            if last > cat_threshold.len() {
                return Err(self.malformed(
                    "cat_boundaries",
                    bounds_field.line,
                    format!("offset {} is past the {} words of cat_threshold", last, cat_threshold.len()),
                ));
            }
            (cat_boundaries, cat_threshold)
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(DecodedBlock::Split(SplitArrays {
            num_leaves,
            left_child,
            right_child,
            split_feature,
            threshold,
            split_gain,
            leaf_value,
            decision_type,
            cat_boundaries,
            cat_threshold,
        }))
    }
}
