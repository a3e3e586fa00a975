use crate::decision::DecisionFlags;
use crate::utils::{json_f32, json_f64};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Reference from a node to one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ChildRef {
    /// Index into the tree's nodes.
    Node(usize),
    /// Index into the tree's leaf values.
    Leaf(usize),
}

impl ChildRef {
    /// Decode the signed child encoding of the model text, where
    /// non-negative values are node indices and a leaf `k` is stored
    /// as `-(k + 1)`.
    pub fn from_raw(raw: i32) -> Self {
        if raw >= 0 {
            ChildRef::Node(raw as usize)
        } else {
            ChildRef::Leaf((-(i64::from(raw) + 1)) as usize)
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, ChildRef::Leaf(_))
    }
}

impl fmt::Display for ChildRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChildRef::Node(i) => write!(f, "node {}", i),
            ChildRef::Leaf(i) => write!(f, "leaf {}", i),
        }
    }
}

/// An internal decision node of a reconstructed tree.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Node {
    pub num: usize,
    /// Absolute feature index tested by a numeric split, `None` for
    /// categorical splits.
    pub split_feature: Option<usize>,
    /// Split threshold. For categorical splits this is the index of the
    /// split's entry in the tree's categorical boundaries.
    #[serde(with = "json_f32")]
    pub threshold: f32,
    #[serde(with = "json_f64")]
    pub split_gain: f64,
    /// Value used in place of a missing feature value.
    #[serde(with = "json_f32")]
    pub default_value: f32,
    pub left_child: ChildRef,
    pub right_child: ChildRef,
    pub is_categorical: bool,
    pub decision_type: DecisionFlags,
    /// Feature indices routed to the left child, ascending. Empty unless
    /// the split is categorical.
    pub categorical_values: BTreeSet<usize>,
}

impl Node {
    /// Create a numeric split node.
    #[allow(clippy::too_many_arguments)]
    pub fn numeric(
        num: usize,
        split_feature: usize,
        threshold: f32,
        split_gain: f64,
        default_value: f32,
        left_child: ChildRef,
        right_child: ChildRef,
        decision_type: DecisionFlags,
    ) -> Self {
        Node {
            num,
            split_feature: Some(split_feature),
            threshold,
            split_gain,
            default_value,
            left_child,
            right_child,
            is_categorical: false,
            decision_type,
            categorical_values: BTreeSet::new(),
        }
    }

    /// Create a categorical split node. Children are given in routing order,
    /// values in `categorical_values` go to `left_child`.
    pub fn categorical(
        num: usize,
        threshold: f32,
        split_gain: f64,
        left_child: ChildRef,
        right_child: ChildRef,
        decision_type: DecisionFlags,
        categorical_values: BTreeSet<usize>,
    ) -> Self {
        Node {
            num,
            split_feature: None,
            threshold,
            split_gain,
            default_value: 0.0,
            left_child,
            right_child,
            is_categorical: true,
            decision_type,
            categorical_values,
        }
    }

    /// Both children of the node, left first.
    pub fn children(&self) -> [ChildRef; 2] {
        [self.left_child, self.right_child]
    }
}

impl fmt::Display for Node {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_categorical {
            write!(
                f,
                "{}:[in {:?}] yes={},no={},gain={}",
                self.num, self.categorical_values, self.left_child, self.right_child, self.split_gain
            )
        } else {
            write!(
                f,
                "{}:[{} > {}] yes={},no={},missing={},gain={}",
                self.num,
                self.split_feature.unwrap_or_default(),
                self.threshold,
                self.right_child,
                self.left_child,
                self.default_value,
                self.split_gain
            )
        }
    }
}
