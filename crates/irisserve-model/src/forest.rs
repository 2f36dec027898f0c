//! Random forest artifact
//!
//! The on-disk artifact is a JSON document describing an ensemble of binary
//! decision trees. Each tree is a flat node array rooted at index 0:
//!
//! ```json
//! {
//!   "n_features": 4,
//!   "n_classes": 3,
//!   "trees": [
//!     { "nodes": [
//!       { "type": "split", "feature": 2, "threshold": 2.45, "left": 1, "right": 2 },
//!       { "type": "leaf", "value": [40.0, 0.0, 0.0] },
//!       { "type": "leaf", "value": [0.0, 39.0, 41.0] }
//!     ] }
//!   ]
//! }
//! ```
//!
//! A sample goes left when `row[feature] <= threshold`. Leaf values are class
//! weights; each tree votes with its normalized leaf distribution and the
//! forest averages the votes.

use crate::artifact::{ArtifactError, ModelArtifact, Row};
use serde::{Deserialize, Serialize};

/// Errors found while decoding a forest artifact
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForestError {
    #[error("malformed forest document: {0}")]
    Decode(String),

    #[error("forest must declare at least one feature and one class")]
    EmptyShape,

    #[error("forest has no trees")]
    NoTrees,

    #[error("tree {tree} has no nodes")]
    EmptyTree { tree: usize },

    #[error("tree {tree} node {node}: {reason}")]
    InvalidNode {
        tree: usize,
        node: usize,
        reason: String,
    },
}

/// One node of a decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    /// Internal node routing on a single feature
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },

    /// Terminal node carrying per-class weights
    Leaf { value: Vec<f64> },
}

impl TreeNode {
    /// Create a split node
    pub fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Self::Split {
            feature,
            threshold,
            left,
            right,
        }
    }

    /// Create a leaf node
    pub fn leaf(value: Vec<f64>) -> Self {
        Self::Leaf { value }
    }
}

/// A single decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    /// Check node references and leaf widths.
    ///
    /// Children must point strictly forward, which rules out cycles.
    fn check(&self, tree: usize, n_features: usize, n_classes: usize) -> Result<(), ForestError> {
        if self.nodes.is_empty() {
            return Err(ForestError::EmptyTree { tree });
        }

        let invalid = |node: usize, reason: String| ForestError::InvalidNode { tree, node, reason };

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(invalid(index, format!("feature {} out of range", feature)));
                    }
                    if !threshold.is_finite() {
                        return Err(invalid(index, "threshold is not finite".to_string()));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(invalid(index, format!("child {} out of range", child)));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(invalid(
                            index,
                            format!("leaf has {} classes, expected {}", value.len(), n_classes),
                        ));
                    }
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(invalid(index, "leaf weights must be finite and >= 0".to_string()));
                    }
                    if value.iter().sum::<f64>() <= 0.0 {
                        return Err(invalid(index, "leaf weights sum to zero".to_string()));
                    }
                }
            }
        }

        Ok(())
    }

    /// Walk from the root to the leaf this row lands in
    fn leaf(&self, row: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}

/// Ensemble of decision trees with averaged class probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Build a forest, checking every tree against the declared shape
    pub fn new(
        n_features: usize,
        n_classes: usize,
        trees: Vec<DecisionTree>,
    ) -> Result<Self, ForestError> {
        let forest = Self {
            n_features,
            n_classes,
            trees,
        };
        forest.check()?;
        Ok(forest)
    }

    /// Decode a forest from its JSON document
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ForestError> {
        let forest: Self =
            serde_json::from_slice(bytes).map_err(|e| ForestError::Decode(e.to_string()))?;
        forest.check()?;
        Ok(forest)
    }

    /// Serialize the forest to its JSON document
    pub fn to_json(&self) -> String {
        // Serialization of plain numbers and vectors cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn check(&self) -> Result<(), ForestError> {
        if self.n_features == 0 || self.n_classes == 0 {
            return Err(ForestError::EmptyShape);
        }
        if self.trees.is_empty() {
            return Err(ForestError::NoTrees);
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.check(index, self.n_features, self.n_classes)?;
        }
        Ok(())
    }

    fn check_row(&self, index: usize, row: &[f64]) -> Result<(), ArtifactError> {
        if row.len() != self.n_features {
            return Err(ArtifactError::Shape {
                row: index,
                expected: self.n_features,
                actual: row.len(),
            });
        }
        Ok(())
    }

    fn distribution(&self, row: &[f64]) -> Vec<f64> {
        let mut probabilities = vec![0.0; self.n_classes];

        for tree in &self.trees {
            let leaf = tree.leaf(row);
            let total: f64 = leaf.iter().sum();
            for (acc, weight) in probabilities.iter_mut().zip(leaf) {
                *acc += weight / total;
            }
        }

        let n_trees = self.trees.len() as f64;
        for p in &mut probabilities {
            *p /= n_trees;
        }
        probabilities
    }
}

/// Index of the largest probability, lowest index on ties
fn argmax(probabilities: &[f64]) -> usize {
    let mut best = 0;
    for (index, p) in probabilities.iter().enumerate().skip(1) {
        if *p > probabilities[best] {
            best = index;
        }
    }
    best
}

impl ModelArtifact for RandomForest {
    fn predict(&self, batch: &[Row]) -> Result<Vec<usize>, ArtifactError> {
        self.predict_probability(batch)
            .map(|rows| rows.iter().map(|p| argmax(p)).collect())
    }

    fn predict_probability(&self, batch: &[Row]) -> Result<Vec<Vec<f64>>, ArtifactError> {
        batch
            .iter()
            .enumerate()
            .map(|(index, row)| {
                self.check_row(index, row)?;
                Ok(self.distribution(row))
            })
            .collect()
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
