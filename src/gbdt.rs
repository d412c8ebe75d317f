use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// A tree node. Internal nodes split on `feature <= threshold` (left on
/// true); leaves carry the unscaled weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub feature: i32,
    pub threshold: f64,
    pub left: i32,
    pub right: i32,
    pub leaf: Option<f64>,
}

impl Node {
    fn leaf(value: f64) -> Self {
        Self {
            feature: -1,
            threshold: 0.0,
            left: -1,
            right: -1,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }
}

/// A single regression tree over margin space. Node 0 is the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };
            if let Some(value) = node.leaf {
                return value;
            }
            let feature = node.feature as usize;
            let value = features.get(feature).copied().unwrap_or(0.0);
            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 {
                return 0.0;
            }
            idx = next as usize;
        }
    }
}

/// Boosting hyperparameters. Defaults mirror a stock 100-round binary
/// classifier; only `scale_pos_weight` is data-dependent.
#[derive(Debug, Clone, Copy)]
pub struct GbdtParams {
    pub n_trees: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_child_weight: f64,
    pub lambda: f64,
    /// Weight multiplier on positive-label rows; the imbalance correction.
    pub scale_pos_weight: f64,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            learning_rate: 0.1,
            max_depth: 4,
            min_child_weight: 1.0,
            lambda: 1.0,
            scale_pos_weight: 1.0,
        }
    }
}

/// A fitted gradient-boosted binary classifier. Scores are sums of tree
/// outputs in log-odds space, squashed through a sigmoid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbdtModel {
    pub feature_count: usize,
    pub base_score: f64,
    pub learning_rate: f64,
    pub trees: Vec<Tree>,
}

impl GbdtModel {
    /// Fit with logistic loss and second-order leaf weights. Greedy exact
    /// splits over sorted feature values, so the fit is deterministic for a
    /// given input order.
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: &GbdtParams) -> Result<Self> {
        if x.is_empty() {
            return Err(anyhow!("cannot fit on an empty design matrix"));
        }
        if x.len() != y.len() {
            return Err(anyhow!(
                "design matrix has {} rows, labels have {}",
                x.len(),
                y.len()
            ));
        }
        let feature_count = x[0].len();
        if x.iter().any(|row| row.len() != feature_count) {
            return Err(anyhow!("ragged design matrix"));
        }

        let weights: Vec<f64> = y
            .iter()
            .map(|&label| {
                if label == 1 {
                    params.scale_pos_weight
                } else {
                    1.0
                }
            })
            .collect();

        // Feature values pre-sorted once per feature, reused by every tree.
        let sorted: Vec<Vec<usize>> = (0..feature_count)
            .map(|f| {
                let mut idx: Vec<usize> = (0..x.len()).collect();
                idx.sort_by(|&a, &b| x[a][f].total_cmp(&x[b][f]));
                idx
            })
            .collect();

        let base_score = 0.0;
        let mut margins = vec![base_score; x.len()];
        let mut trees = Vec::with_capacity(params.n_trees);

        for _ in 0..params.n_trees {
            let mut grad = vec![0.0; x.len()];
            let mut hess = vec![0.0; x.len()];
            for i in 0..x.len() {
                let p = sigmoid(margins[i]);
                grad[i] = weights[i] * (p - y[i] as f64);
                hess[i] = weights[i] * p * (1.0 - p);
            }

            let mut builder = TreeBuilder {
                x,
                grad: &grad,
                hess: &hess,
                sorted: &sorted,
                params,
                nodes: Vec::new(),
            };
            let rows: Vec<bool> = vec![true; x.len()];
            builder.build(&rows, 0);
            let tree = Tree {
                nodes: builder.nodes,
            };

            for (i, row) in x.iter().enumerate() {
                margins[i] += params.learning_rate * tree.evaluate(row);
            }
            trees.push(tree);
        }

        Ok(Self {
            feature_count,
            base_score,
            learning_rate: params.learning_rate,
            trees,
        })
    }

    pub fn predict_margin(&self, features: &[f64]) -> f64 {
        let mut margin = self.base_score;
        for tree in &self.trees {
            margin += self.learning_rate * tree.evaluate(features);
        }
        margin
    }

    /// Positive-class probability for one row.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.predict_margin(features))
    }

    pub fn predict_proba_matrix(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_proba(row)).collect()
    }

    /// Structural sanity check on a reloaded artifact.
    pub fn validate(&self) -> Result<()> {
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(anyhow!("tree {t} has no nodes"));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                if node.is_leaf() {
                    continue;
                }
                let valid_child = |c: i32| c >= 0 && (c as usize) < tree.nodes.len();
                if !valid_child(node.left) || !valid_child(node.right) {
                    return Err(anyhow!("tree {t} node {i} has out-of-range children"));
                }
                if node.feature < 0 || node.feature as usize >= self.feature_count {
                    return Err(anyhow!("tree {t} node {i} splits on unknown feature"));
                }
            }
        }
        Ok(())
    }
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    grad: &'a [f64],
    hess: &'a [f64],
    sorted: &'a [Vec<usize>],
    params: &'a GbdtParams,
    nodes: Vec<Node>,
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl TreeBuilder<'_> {
    /// Grow a node over the rows flagged in `mask`; returns its index.
    fn build(&mut self, mask: &[bool], depth: usize) -> i32 {
        let mut sum_g = 0.0;
        let mut sum_h = 0.0;
        for i in 0..mask.len() {
            if mask[i] {
                sum_g += self.grad[i];
                sum_h += self.hess[i];
            }
        }

        let leaf_value = -sum_g / (sum_h + self.params.lambda);
        if depth >= self.params.max_depth {
            return self.push(Node::leaf(leaf_value));
        }
        let Some(split) = self.best_split(mask, sum_g, sum_h) else {
            return self.push(Node::leaf(leaf_value));
        };

        let mut left_mask = vec![false; mask.len()];
        let mut right_mask = vec![false; mask.len()];
        for i in 0..mask.len() {
            if !mask[i] {
                continue;
            }
            if self.x[i][split.feature] <= split.threshold {
                left_mask[i] = true;
            } else {
                right_mask[i] = true;
            }
        }

        // Reserve the slot before recursing so node 0 stays the root.
        let idx = self.push(Node {
            feature: split.feature as i32,
            threshold: split.threshold,
            left: -1,
            right: -1,
            leaf: None,
        });
        let left = self.build(&left_mask, depth + 1);
        let right = self.build(&right_mask, depth + 1);
        let node = &mut self.nodes[idx as usize];
        node.left = left;
        node.right = right;
        idx
    }

    fn best_split(&self, mask: &[bool], sum_g: f64, sum_h: f64) -> Option<Split> {
        let lambda = self.params.lambda;
        let parent_score = sum_g * sum_g / (sum_h + lambda);
        let mut best: Option<Split> = None;

        for (feature, order) in self.sorted.iter().enumerate() {
            let mut left_g = 0.0;
            let mut left_h = 0.0;
            let mut prev_value: Option<f64> = None;
            for &i in order {
                if !mask[i] {
                    continue;
                }
                let value = self.x[i][feature];
                if let Some(prev) = prev_value {
                    if value > prev {
                        let right_g = sum_g - left_g;
                        let right_h = sum_h - left_h;
                        if left_h >= self.params.min_child_weight
                            && right_h >= self.params.min_child_weight
                        {
                            let gain = 0.5
                                * (left_g * left_g / (left_h + lambda)
                                    + right_g * right_g / (right_h + lambda)
                                    - parent_score);
                            if gain > 1e-12
                                && best.as_ref().map(|b| gain > b.gain).unwrap_or(true)
                            {
                                best = Some(Split {
                                    feature,
                                    threshold: (prev + value) / 2.0,
                                    gain,
                                });
                            }
                        }
                    }
                }
                left_g += self.grad[i];
                left_h += self.hess[i];
                prev_value = Some(value);
            }
        }
        best
    }

    fn push(&mut self, node: Node) -> i32 {
        self.nodes.push(node);
        (self.nodes.len() - 1) as i32
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
