use crate::node::{ChildRef, Node};
use crate::utils::json_f64_vec;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A reconstructed regression tree.
///
/// Nodes are stored in the order of the model text, the root is node 0.
/// A tree without nodes is a single leaf.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
    #[serde(with = "json_f64_vec")]
    pub leaf_values: Vec<f64>,
}

impl Tree {
    /// A tree made of one leaf and no splits.
    pub fn leaf(value: f64) -> Self {
        Tree {
            nodes: Vec::new(),
            leaf_values: vec![value],
        }
    }

    pub fn num_leaves(&self) -> usize {
        self.leaf_values.len()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Where traversal starts, the first node or the only leaf.
    pub fn root(&self) -> ChildRef {
        if self.nodes.is_empty() {
            ChildRef::Leaf(0)
        } else {
            ChildRef::Node(0)
        }
    }

    /// True when every leaf holds the same value, so the tree adds a
    /// constant whatever the input.
    pub fn is_constant(&self) -> bool {
        match self.leaf_values.split_first() {
            Some((first, rest)) => rest.iter().all(|v| v == first),
            None => true,
        }
    }

    pub fn has_categorical_splits(&self) -> bool {
        self.nodes.iter().any(|n| n.is_categorical)
    }

    /// Depth of every node, the root being at depth 0.
    fn node_depths(&self) -> Vec<usize> {
        let mut depths = vec![0; self.nodes.len()];
        if self.nodes.is_empty() {
            return depths;
        }
        let mut stack = vec![(0, 0)];
        while let Some((idx, depth)) = stack.pop() {
            depths[idx] = depth;
            for child in self.nodes[idx].children() {
                if let ChildRef::Node(c) = child {
                    if c > idx && c < self.nodes.len() {
                        stack.push((c, depth + 1));
                    }
                }
            }
        }
        depths
    }

    /// Maximum number of splits on a path from the root to a leaf.
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            0
        } else {
            self.node_depths().into_iter().max().unwrap_or_default() + 1
        }
    }

    /// True for the single split that stands in for a constant tree.
    pub fn is_constant_stand_in(&self) -> bool {
        match self.leaf_values.first() {
            Some(v) if self.nodes.len() == 1 => *self == Tree::constant(*v),
            _ => false,
        }
    }

    fn get_node_stats(&self, value: &dyn Fn(&Node) -> f32, stats: &mut HashMap<usize, (f32, usize)>) {
        // The constant stand-in does not split on anything real.
        if self.is_constant_stand_in() {
            return;
        }
        for n in self.nodes.iter() {
            let v = value(n);
            let features: Vec<usize> = match n.split_feature {
                Some(f) => vec![f],
                None => n.categorical_values.iter().copied().collect(),
            };
            for f in features {
                let s = stats.entry(f).or_insert((0., 0));
                s.0 += v;
                s.1 += 1;
            }
        }
    }

    pub fn calculate_importance_weight(&self, stats: &mut HashMap<usize, (f32, usize)>) {
        self.get_node_stats(&|_: &Node| 1., stats);
    }

    pub fn calculate_importance_gain(&self, stats: &mut HashMap<usize, (f32, usize)>) {
        self.get_node_stats(&|n: &Node| n.split_gain as f32, stats);
    }
}

impl Display for Tree {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut print_buffer: Vec<(ChildRef, usize)> = vec![(self.root(), 0)];
        let mut r = String::new();
        while let Some((child, depth)) = print_buffer.pop() {
            let indent = "      ".repeat(depth);
            match child {
                ChildRef::Leaf(i) => match self.leaf_values.get(i) {
                    Some(v) => r += format!("{}leaf {}={}\n", indent, i, v).as_str(),
                    None => r += format!("{}leaf {}=?\n", indent, i).as_str(),
                },
                ChildRef::Node(i) => {
                    let Some(node) = self.nodes.get(i) else {
                        continue;
                    };
                    r += format!("{}{}\n", indent, node).as_str();
                    // Children always come after their parent, anything else
                    // would loop forever.
                    for c in [node.right_child, node.left_child] {
                        match c {
                            ChildRef::Node(c) if c <= i => (),
                            c => print_buffer.push((c, depth + 1)),
                        }
                    }
                }
            }
        }
        write!(f, "{}", r)
    }
}
