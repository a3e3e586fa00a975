//! Reader
//!
//! Configuration for turning a model text into an [`Ensemble`], and the
//! assembly of the trees of a text.
use crate::ensemble::Ensemble;
use crate::errors::ModelTextError;
use crate::scanner::Scanner;
use crate::tree::block::TreeBlock;
use crate::tree::tree::Tree;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_convert_constant_trees() -> bool {
    true
}

/// Options used when reading a model text.
///
/// To adjust the reader, start from the default and use the relevant `set_`
/// methods.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnsembleReader {
    /// Map from a tree's local feature index to the absolute feature index,
    /// produced when categorical features were expanded before training.
    #[serde(default)]
    pub categorical_boundaries: Option<Vec<usize>>,
    /// Number of threads used to build the trees, `None` builds them on the
    /// calling thread.
    #[serde(default)]
    pub num_threads: Option<usize>,
    /// Replace constant trees with a non-zero value by a single split whose
    /// two leaves hold the constant.
    #[serde(default = "default_convert_constant_trees")]
    pub convert_constant_trees: bool,
}

impl Default for EnsembleReader {
    fn default() -> Self {
        EnsembleReader {
            categorical_boundaries: None,
            num_threads: None,
            convert_constant_trees: default_convert_constant_trees(),
        }
    }
}

impl EnsembleReader {
    /// Set the categorical boundaries on the reader.
    /// * `categorical_boundaries` - Absolute feature index of every tree-local feature index.
    pub fn set_categorical_boundaries(mut self, categorical_boundaries: Option<Vec<usize>>) -> Self {
        self.categorical_boundaries = categorical_boundaries;
        self
    }

    /// Set the number of threads on the reader.
    /// * `num_threads` - Set the number of threads to be used to build trees.
    pub fn set_num_threads(mut self, num_threads: Option<usize>) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Set whether constant trees are converted to a single split.
    /// * `convert_constant_trees` - Keep constant trees visible to consumers
    ///   that skip trees without splits.
    pub fn set_convert_constant_trees(mut self, convert_constant_trees: bool) -> Self {
        self.convert_constant_trees = convert_constant_trees;
        self
    }

    /// Build the ensemble of a model text.
    ///
    /// * `text` - The complete model text.
    pub fn read(&self, text: &str) -> Result<Ensemble, ModelTextError> {
        debug!(
            "Reading model text of {} bytes, categorical boundaries: {}, threads: {:?}.",
            text.len(),
            self.categorical_boundaries.is_some(),
            self.num_threads
        );
        let blocks = read_blocks(text);
        let trees = assemble(
            &blocks,
            self.categorical_boundaries.as_deref(),
            self.convert_constant_trees,
            self.num_threads,
        )?;
        let ensemble = Ensemble::new(trees);
        if self.categorical_boundaries.is_some() && !ensemble.has_categorical_splits() {
            warn!("Categorical boundaries were given, but the model has no categorical split.");
        }
        Ok(ensemble)
    }

    /// Build the ensemble of a model text file.
    ///
    /// * `path` - Path of the model text.
    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> Result<Ensemble, ModelTextError> {
        let text = match fs::read_to_string(path) {
            Ok(s) => Ok(s),
            Err(e) => Err(ModelTextError::UnableToRead(e.to_string())),
        }?;
        self.read(&text)
    }
}

/// Collect every `Tree=` block of a text, in order.
///
/// Blocks are not validated here. Each one is checked when its tree is
/// built, so the reported error is the one of the first broken block.
pub fn read_blocks(text: &str) -> Vec<TreeBlock<'_>> {
    let mut scanner = Scanner::new(text);
    let mut blocks = Vec::new();
    while let Some(block) = scanner.next_tree_block() {
        blocks.push(block);
    }
    blocks
}

/// Build the tree of every block.
///
/// With several threads the trees are built in parallel, the result is the
/// same as building them in order: the trees keep the order of the blocks
/// and the reported error is the one of the first failing block.
pub(crate) fn assemble(
    blocks: &[TreeBlock],
    categorical_boundaries: Option<&[usize]>,
    convert_constant_trees: bool,
    num_threads: Option<usize>,
) -> Result<Vec<Tree>, ModelTextError> {
    let results: Vec<Result<Tree, ModelTextError>> = match num_threads {
        Some(n) if n > 1 && blocks.len() > 1 => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
            Ok(pool) => pool.install(|| {
                blocks
                    .par_iter()
                    .map(|b| Tree::build(b, categorical_boundaries, convert_constant_trees))
                    .collect()
            }),
            Err(e) => {
                warn!("Unable to start {} threads ({}), building trees sequentially.", n, e);
                blocks
                    .iter()
                    .map(|b| Tree::build(b, categorical_boundaries, convert_constant_trees))
                    .collect()
            }
        },
        _ => blocks
            .iter()
            .map(|b| Tree::build(b, categorical_boundaries, convert_constant_trees))
            .collect(),
    };
    let trees = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    info!("Built {} trees from the model text.", trees.len());
    Ok(trees)
}

/// Build the ensemble of a model text.
///
/// * `text` - The complete model text.
/// * `categorical_boundaries` - Optional map from tree-local feature indices
///   to absolute feature indices.
pub fn build_ensemble(text: &str, categorical_boundaries: Option<&[usize]>) -> Result<Ensemble, ModelTextError> {
    Ensemble::from_model_text(text, categorical_boundaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    const MODEL_PATH: &str = "resources/regression_model.txt";

    #[test]
    fn test_reader_defaults() {
        let reader = EnsembleReader::default();
        assert_eq!(reader.categorical_boundaries, None);
        assert_eq!(reader.num_threads, None);
        assert!(reader.convert_constant_trees);

        let reader: EnsembleReader = serde_json::from_str("{}").unwrap();
        assert_eq!(reader, EnsembleReader::default());
        let reader: EnsembleReader = serde_json::from_str(r#"{"num_threads": 2}"#).unwrap();
        assert_eq!(reader.num_threads, Some(2));
    }

    #[test]
    fn test_reader_matches_build_ensemble() -> Result<(), Box<dyn Error>> {
        let text = fs::read_to_string(MODEL_PATH)?;
        let ensemble = EnsembleReader::default().read(&text)?;
        assert_eq!(ensemble, build_ensemble(&text, None)?);
        assert_eq!(ensemble, EnsembleReader::default().read_file(MODEL_PATH)?);
        Ok(())
    }

    #[test]
    fn test_reader_threads() -> Result<(), Box<dyn Error>> {
        let text = fs::read_to_string(MODEL_PATH)?;
        let sequential = EnsembleReader::default().read(&text)?;
        let parallel = EnsembleReader::default().set_num_threads(Some(2)).read(&text)?;
        assert_eq!(sequential, parallel);

        // The first broken block is reported, whatever the thread count.
        let broken = text.replacen("num_leaves=3", "num_leaves=4", 2);
        for n in [None, Some(3)] {
            match EnsembleReader::default().set_num_threads(n).read(&broken).unwrap_err() {
                ModelTextError::InconsistentArrayLengths { tree, .. } => assert_eq!(tree, 0),
                e => panic!("unexpected error {:?}", e),
            }
        }
        Ok(())
    }

    #[test]
    fn test_reader_reports_first_broken_block() {
        // Tree 0 is short of a leaf value, tree 1 has a line without a value.
        let text = "Tree=0\nnum_leaves=3\nnum_cat=0\nsplit_feature=0 1\nsplit_gain=1 1\nthreshold=0 0\ndecision_type=0 0\nleft_child=1 -1\nright_child=-2 -3\nleaf_value=1 2\n\nTree=1\nnum_leaves=1\nnum_cat=0\nleaf_value\n";
        for n in [None, Some(2)] {
            match EnsembleReader::default().set_num_threads(n).read(text).unwrap_err() {
                ModelTextError::InconsistentArrayLengths { tree, line, field, expected, actual } => {
                    assert_eq!((tree, line), (0, 10));
                    assert_eq!(field, "leaf_value");
                    assert_eq!((expected, actual), (3, 2));
                }
                e => panic!("unexpected error {:?}", e),
            }
        }
        assert_eq!(read_blocks(text).len(), 2);
    }

    #[test]
    fn test_reader_boundaries() -> Result<(), Box<dyn Error>> {
        let text = fs::read_to_string(MODEL_PATH)?;
        let ensemble = EnsembleReader::default()
            .set_categorical_boundaries(Some(vec![0, 2, 4, 7]))
            .read(&text)?;
        assert_eq!(ensemble, build_ensemble(&text, Some(&[0, 2, 4, 7][..]))?);
        let root = &ensemble.trees[1].nodes[0];
        assert_eq!(root.categorical_values.iter().copied().collect::<Vec<_>>(), vec![5, 7]);
        assert_eq!(ensemble.trees[0].nodes[1].split_feature, Some(2));
        // The constant stand-in always splits on feature 0.
        assert_eq!(ensemble.trees[2].nodes[0].split_feature, Some(0));
        Ok(())
    }

    #[test]
    fn test_reader_keep_constant_trees() -> Result<(), Box<dyn Error>> {
        let text = fs::read_to_string(MODEL_PATH)?;
        let ensemble = EnsembleReader::default().set_convert_constant_trees(false).read(&text)?;
        assert_eq!(ensemble.trees[2], Tree::leaf(-0.125));
        assert_eq!(ensemble.num_trees(), 5);
        Ok(())
    }

    #[test]
    fn test_read_missing_file() {
        let err = EnsembleReader::default().read_file("resources/does_not_exist.txt").unwrap_err();
        assert!(matches!(err, ModelTextError::UnableToRead(_)));
    }
}
