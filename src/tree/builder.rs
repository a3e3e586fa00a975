use super::block::{DecodedBlock, Field, SplitArrays, TreeBlock};
use super::tree::Tree;
use crate::bitset::decode_range;
use crate::decision::DecisionFlags;
use crate::errors::ModelTextError;
use crate::node::{ChildRef, Node};
use log::debug;
use std::collections::BTreeSet;

fn field_line(block: &TreeBlock, field: Option<Field>) -> usize {
    field.map(|f| f.line).unwrap_or(block.line)
}

impl Tree {
    /// Build a tree from one block of the model text.
    ///
    /// * `block` - The fields of the `Tree=` section.
    /// * `categorical_boundaries` - Optional map from the tree's local feature
    ///   index to the absolute feature index, applied to every split feature.
    pub fn from_block(block: &TreeBlock, categorical_boundaries: Option<&[usize]>) -> Result<Self, ModelTextError> {
        Self::build(block, categorical_boundaries, true)
    }

    /// Two leaf stand-in for a constant tree: one split on feature 0 at
    /// threshold 0 whose leaves both hold `value`. Consumers that drop trees
    /// without splits keep its contribution.
    pub fn constant(value: f64) -> Self {
        let node = Node::numeric(
            0,
            0,
            0.0,
            0.0,
            0.0,
            ChildRef::Leaf(0),
            ChildRef::Leaf(1),
            DecisionFlags::default(),
        );
        Tree {
            nodes: vec![node],
            leaf_values: vec![value, value],
        }
    }

    pub(crate) fn build(
        block: &TreeBlock,
        categorical_boundaries: Option<&[usize]>,
        convert_constant_trees: bool,
    ) -> Result<Self, ModelTextError> {
        match block.decode()? {
            DecodedBlock::Constant(value) => {
                if value == 0.0 || !convert_constant_trees {
                    Ok(Tree::leaf(value))
                } else {
                    debug!("Tree {} is a constant {}, converting it to a single split.", block.index, value);
                    Ok(Tree::constant(value))
                }
            }
            DecodedBlock::Split(arrays) => build_split_tree(block, &arrays, categorical_boundaries),
        }
    }
}

/// Resolve the absolute split feature of a node.
fn split_feature(
    block: &TreeBlock,
    raw: i32,
    categorical_boundaries: Option<&[usize]>,
) -> Result<usize, ModelTextError> {
    let line = field_line(block, block.split_feature);
    let local = usize::try_from(raw)
        .map_err(|_| block.malformed("split_feature", line, format!("feature index {} is negative", raw)))?;
    match categorical_boundaries {
        Some(bounds) => bounds.get(local).copied().ok_or_else(|| {
            block.malformed(
                "split_feature",
                line,
                format!(
                    "feature index {} is outside the {} categorical boundaries",
                    local,
                    bounds.len()
                ),
            )
        }),
        None => Ok(local),
    }
}

fn child(block: &TreeBlock, name: &str, node: usize, raw: i32, arrays: &SplitArrays) -> Result<ChildRef, ModelTextError> {
    let field = if name == "left_child" {
        block.left_child
    } else {
        block.right_child
    };
    let c = ChildRef::from_raw(raw);
    let valid = match c {
        ChildRef::Node(j) => j > node && j < arrays.num_leaves - 1,
        ChildRef::Leaf(k) => k < arrays.num_leaves,
    };
    if valid {
        Ok(c)
    } else {
        Err(block.malformed(
            name,
            field_line(block, field),
            format!("node {} points to {}, which is not below it in the tree", node, c),
        ))
    }
}

fn categorical_values(
    block: &TreeBlock,
    arrays: &SplitArrays,
    threshold: f64,
    feature: usize,
) -> Result<BTreeSet<usize>, ModelTextError> {
    let line = field_line(block, block.threshold);
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(block.malformed(
            "threshold",
            line,
            format!("{} is not a categorical split index", threshold),
        ));
    }
    let cat_idx = threshold as usize;
    let bounds = cat_idx
        .checked_add(2)
        .and_then(|end| arrays.cat_boundaries.get(cat_idx..end));
    let Some(&[start, end]) = bounds else {
        return Err(block.malformed(
            "threshold",
            line,
            format!(
                "categorical split index {} has no range in the {} cat_boundaries",
                cat_idx,
                arrays.cat_boundaries.len()
            ),
        ));
    };
    Ok(decode_range(&arrays.cat_threshold, start, end)
        .into_iter()
        .map(|c| feature + c)
        .collect())
}

fn build_split_tree(
    block: &TreeBlock,
    arrays: &SplitArrays,
    categorical_boundaries: Option<&[usize]>,
) -> Result<Tree, ModelTextError> {
    let n_nodes = arrays.num_leaves - 1;
    let mut nodes = Vec::with_capacity(n_nodes);
    for i in 0..n_nodes {
        let feature = split_feature(block, arrays.split_feature[i], categorical_boundaries)?;
        let decision_type = DecisionFlags::decode(arrays.decision_type[i]);
        let threshold = arrays.threshold[i];
        let split_gain = arrays.split_gain[i];
        let left_child = child(block, "left_child", i, arrays.left_child[i], arrays)?;
        let right_child = child(block, "right_child", i, arrays.right_child[i], arrays)?;

        let node = if decision_type.is_categorical {
            let values = categorical_values(block, arrays, threshold, feature)?;
            // Categories in the set follow the raw right child.
            Node::categorical(
                i,
                threshold as f32,
                split_gain,
                right_child,
                left_child,
                decision_type,
                values,
            )
        } else {
            Node::numeric(
                i,
                feature,
                threshold as f32,
                split_gain,
                decision_type.default_value(threshold) as f32,
                left_child,
                right_child,
                decision_type,
            )
        };
        nodes.push(node);
    }
    Ok(Tree {
        nodes,
        leaf_values: arrays.leaf_value.clone(),
    })
}
