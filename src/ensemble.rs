//! Ensemble
//!
//! The ordered collection of reconstructed trees, with persistence and
//! inspection helpers.
use crate::errors::ModelTextError;
use crate::reader::{assemble, read_blocks};
use crate::tree::tree::Tree;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::fs;

/// Method to calculate variable importance.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ImportanceMethod {
    /// The number of times a feature is used to split the data across all trees.
    Weight,
    /// The average split gain across all splits the feature is used in.
    Gain,
    /// The total gain across all splits the feature is used in.
    TotalGain,
}

type ImportanceFn = fn(&Tree, &mut HashMap<usize, (f32, usize)>);

/// Trees of a boosted model in the order they appear in the model text.
/// A prediction is the sum of every tree's output.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Ensemble {
    pub trees: Vec<Tree>,
}

impl Ensemble {
    pub fn new(trees: Vec<Tree>) -> Self {
        Ensemble { trees }
    }

    /// Build the ensemble of a model text.
    ///
    /// * `text` - The complete model text.
    /// * `categorical_boundaries` - Optional map from tree-local feature
    ///   indices to absolute feature indices.
    pub fn from_model_text(text: &str, categorical_boundaries: Option<&[usize]>) -> Result<Self, ModelTextError> {
        let blocks = read_blocks(text);
        let trees = assemble(&blocks, categorical_boundaries, true, None)?;
        Ok(Ensemble::new(trees))
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Total number of split nodes over all trees.
    pub fn num_nodes(&self) -> usize {
        self.trees.iter().map(|t| t.num_nodes()).sum()
    }

    /// Total number of leaves over all trees.
    pub fn num_leaves(&self) -> usize {
        self.trees.iter().map(|t| t.num_leaves()).sum()
    }

    pub fn has_categorical_splits(&self) -> bool {
        self.trees.iter().any(|t| t.has_categorical_splits())
    }

    /// Calculate feature importance measure for the features
    /// in the model.
    /// - `method`: variable importance method to use.
    /// - `normalize`: whether to scale the values to sum to one.
    ///
    /// Categorical splits count towards every feature of their set, the
    /// stand-ins of constant trees are skipped.
    pub fn calculate_feature_importance(&self, method: ImportanceMethod, normalize: bool) -> HashMap<usize, f32> {
        let (average, importance_fn): (bool, ImportanceFn) = match method {
            ImportanceMethod::Weight => (false, Tree::calculate_importance_weight),
            ImportanceMethod::Gain => (true, Tree::calculate_importance_gain),
            ImportanceMethod::TotalGain => (false, Tree::calculate_importance_gain),
        };
        let mut stats = HashMap::new();
        for tree in self.trees.iter() {
            importance_fn(tree, &mut stats)
        }

        let importance = stats
            .iter()
            .map(|(k, (v, c))| if average { (*k, v / (*c as f32)) } else { (*k, *v) })
            .collect::<HashMap<usize, f32>>();

        if normalize {
            // Sum in a fixed order so the result does not depend on
            // the map's iteration order.
            let mut values: Vec<f32> = importance.values().copied().collect();
            values.sort_by(|a, b| a.total_cmp(b));
            let total: f32 = values.iter().sum();
            if total == 0.0 {
                return importance;
            }
            importance.iter().map(|(k, v)| (*k, v / total)).collect()
        } else {
            importance
        }
    }

    /// Save an ensemble as a json object to a file.
    ///
    /// * `path` - Path to save the ensemble.
    pub fn save_ensemble(&self, path: &str) -> Result<(), ModelTextError> {
        let model = self.json_dump()?;
        match fs::write(path, model) {
            Err(e) => Err(ModelTextError::UnableToWrite(e.to_string())),
            Ok(_) => Ok(()),
        }
    }

    /// Dump an ensemble as a json object
    pub fn json_dump(&self) -> Result<String, ModelTextError> {
        match serde_json::to_string(self) {
            Ok(s) => Ok(s),
            Err(e) => Err(ModelTextError::UnableToWrite(e.to_string())),
        }
    }

    /// Load an ensemble from Json string
    ///
    /// * `json_str` - String object, which can be serialized to json.
    pub fn from_json(json_str: &str) -> Result<Self, ModelTextError> {
        let model = serde_json::from_str::<Ensemble>(json_str);
        match model {
            Ok(m) => Ok(m),
            Err(e) => Err(ModelTextError::UnableToRead(e.to_string())),
        }
    }

    /// Load an ensemble from a path to a json ensemble object.
    ///
    /// * `path` - Path to load the ensemble from.
    pub fn load_ensemble(path: &str) -> Result<Self, ModelTextError> {
        let json_str = match fs::read_to_string(path) {
            Ok(s) => Ok(s),
            Err(e) => Err(ModelTextError::UnableToRead(e.to_string())),
        }?;
        Self::from_json(&json_str)
    }
}

impl Display for Ensemble {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, tree) in self.trees.iter().enumerate() {
            writeln!(f, "Tree={}", i)?;
            write!(f, "{}", tree)?;
        }
        Ok(())
    }
}
