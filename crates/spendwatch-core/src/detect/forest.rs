//! Isolation forest scorer
//!
//! Anomalies are isolated by random recursive partitioning in fewer splits
//! than normal points, so their average path length across the ensemble is
//! shorter. Scores follow `s(x) = 2^(-E[h(x)] / c(psi))`:
//! - close to 1: short paths, strongly anomalous
//! - around 0.5: no distinct anomaly
//! - close to 0: deep paths, strongly normal

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::encoder::FeatureVector;
use super::DetectError;
use crate::config::DetectionConfig;

/// Neutral score: neither isolated early nor late
const NEUTRAL_SCORE: f64 = 0.5;

/// Which side of the contamination cut counts as anomalous.
///
/// With the `2^(-E[h]/c)` normalization short paths map to high scores, so
/// `HigherIsAnomalous` is the consistent convention. `LowerIsAnomalous`
/// exists for callers that consume an inverted (decision-function style)
/// reading of the same score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdDirection {
    #[default]
    HigherIsAnomalous,
    LowerIsAnomalous,
}

impl ThresholdDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HigherIsAnomalous => "higher_is_anomalous",
            Self::LowerIsAnomalous => "lower_is_anomalous",
        }
    }

    /// Whether `score` falls on the anomalous side of `cut`
    pub fn is_anomalous(&self, score: f64, cut: f64) -> bool {
        match self {
            Self::HigherIsAnomalous => score >= cut && score > NEUTRAL_SCORE,
            Self::LowerIsAnomalous => score <= cut && score < NEUTRAL_SCORE,
        }
    }
}

impl std::fmt::Display for ThresholdDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ensemble parameters
#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    pub tree_count: usize,
    pub sample_size: usize,
    pub contamination: f64,
    pub direction: ThresholdDirection,
}

impl ForestParams {
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            tree_count: config.tree_count,
            sample_size: config.sample_size,
            contamination: config.contamination,
            direction: config.direction,
        }
    }
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}

#[derive(Debug, Clone)]
enum Node {
    Internal {
        feature: usize,
        threshold: f64,
        /// Points with `x[feature] < threshold`
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        depth: usize,
        size: usize,
    },
}

/// A single random partitioning tree
#[derive(Debug, Clone)]
pub struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn build<R: Rng + ?Sized>(
        data: &[FeatureVector],
        indices: &[usize],
        max_depth: usize,
        rng: &mut R,
    ) -> Self {
        Self {
            root: build_node(data, indices, 0, max_depth, rng),
        }
    }

    /// Path length of `x`: leaf depth plus the expected depth of the
    /// unbuilt subtree below a leaf holding more than one point
    pub fn path_length(&self, x: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Internal {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] < *threshold { left } else { right };
                }
                Node::Leaf { depth, size } => {
                    return *depth as f64 + average_path_length(*size);
                }
            }
        }
    }
}

fn build_node<R: Rng + ?Sized>(
    data: &[FeatureVector],
    indices: &[usize],
    depth: usize,
    max_depth: usize,
    rng: &mut R,
) -> Node {
    let size = indices.len();
    if size <= 1 || depth >= max_depth {
        return Node::Leaf { depth, size };
    }

    // Only dimensions that vary inside this node can separate its points
    let dims = data[indices[0]].len();
    let splittable: Vec<(usize, f64, f64)> = (0..dims)
        .filter_map(|feature| {
            let (min, max) = indices.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), &i| (lo.min(data[i][feature]), hi.max(data[i][feature])),
            );
            (max > min).then_some((feature, min, max))
        })
        .collect();

    if splittable.is_empty() {
        return Node::Leaf { depth, size };
    }

    let (feature, min, max) = splittable[rng.gen_range(0..splittable.len())];
    let threshold = rng.gen_range(min..max);

    let (left, right): (Vec<usize>, Vec<usize>) =
        indices.iter().partition(|&&i| data[i][feature] < threshold);

    if left.is_empty() || right.is_empty() {
        return Node::Leaf { depth, size };
    }

    Node::Internal {
        feature,
        threshold,
        left: Box::new(build_node(data, &left, depth + 1, max_depth, rng)),
        right: Box::new(build_node(data, &right, depth + 1, max_depth, rng)),
    }
}

/// Average path length of an unsuccessful BST search over `n` points:
/// `c(n) = 2H(n-1) - 2(n-1)/n`
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n_f = n as f64;
            2.0 * harmonic(n - 1) - 2.0 * (n_f - 1.0) / n_f
        }
    }
}

fn harmonic(n: usize) -> f64 {
    (1..=n).map(|k| 1.0 / k as f64).sum()
}

/// A fitted isolation forest
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    params: ForestParams,
    /// Effective per-tree subsample size (psi)
    subsample: usize,
    /// Contamination-derived score cut
    threshold: f64,
}

impl IsolationForest {
    /// Build the ensemble over `vectors` and derive the contamination cut
    /// from their scores
    pub fn fit<R: Rng + ?Sized>(
        vectors: &[FeatureVector],
        params: ForestParams,
        rng: &mut R,
    ) -> Result<Self, DetectError> {
        validate_vectors(vectors)?;

        let n = vectors.len();
        let subsample = params.sample_size.min(n);
        let max_depth = (subsample as f64).log2().ceil() as usize;

        let trees = (0..params.tree_count.max(1))
            .map(|_| {
                let sample = index::sample(rng, n, subsample).into_vec();
                IsolationTree::build(vectors, &sample, max_depth, rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            params,
            subsample,
            threshold: NEUTRAL_SCORE,
        };

        let scores = forest.score(vectors);
        forest.threshold = contamination_cut(&scores, params.contamination, params.direction);

        debug!(
            points = n,
            trees = forest.trees.len(),
            subsample,
            max_depth,
            threshold = forest.threshold,
            "Fitted isolation forest"
        );

        Ok(forest)
    }

    /// Anomaly score in [0, 1] for one vector
    pub fn score_one(&self, x: &[f64]) -> f64 {
        let mean_path = self
            .trees
            .iter()
            .map(|tree| tree.path_length(x))
            .sum::<f64>()
            / self.trees.len() as f64;

        2.0_f64.powf(-mean_path / average_path_length(self.subsample))
    }

    /// Anomaly scores for a batch of vectors
    pub fn score(&self, vectors: &[FeatureVector]) -> Vec<f64> {
        vectors.iter().map(|v| self.score_one(v)).collect()
    }

    /// Contamination-derived score cut
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Apply the configured direction to a score
    pub fn is_anomalous(&self, score: f64) -> bool {
        self.params.direction.is_anomalous(score, self.threshold)
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn subsample_size(&self) -> usize {
        self.subsample
    }
}

/// Score of the k-th most anomalous point, `k = max(1, ceil(contamination * n))`
fn contamination_cut(scores: &[f64], contamination: f64, direction: ThresholdDirection) -> f64 {
    if scores.is_empty() {
        return NEUTRAL_SCORE;
    }

    let mut sorted = scores.to_vec();
    match direction {
        ThresholdDirection::HigherIsAnomalous => sorted.sort_by(|a, b| b.total_cmp(a)),
        ThresholdDirection::LowerIsAnomalous => sorted.sort_by(|a, b| a.total_cmp(b)),
    }

    let k = ((contamination * sorted.len() as f64).ceil() as usize).clamp(1, sorted.len());
    sorted[k - 1]
}

fn validate_vectors(vectors: &[FeatureVector]) -> Result<(), DetectError> {
    if vectors.len() < 2 {
        warn!(points = vectors.len(), "Too few points to fit isolation forest");
        return Err(DetectError::InsufficientData {
            have: vectors.len(),
            need: 2,
        });
    }

    let dims = vectors[0].len();
    if dims == 0 {
        return Err(DetectError::MalformedInput(
            "feature vectors are empty".to_string(),
        ));
    }

    for (i, v) in vectors.iter().enumerate() {
        if v.len() != dims {
            return Err(DetectError::MalformedInput(format!(
                "vector {} has {} dimensions, expected {}",
                i,
                v.len(),
                dims
            )));
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(DetectError::MalformedInput(format!(
                "vector {} contains a non-finite value",
                i
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn cluster_with(outliers: &[f64]) -> Vec<FeatureVector> {
        let mut data: Vec<FeatureVector> = (0..40)
            .map(|i| vec![100.0 + i as f64 * 0.25, 1.0, 0.0])
            .collect();
        data.extend(outliers.iter().map(|&a| vec![a, 1.0, 0.0]));
        data
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // c(3) = 2 * (1 + 1/2) - 4/3
        assert!((average_path_length(3) - (3.0 - 4.0 / 3.0)).abs() < 1e-12);
        // Grows roughly logarithmically
        assert!(average_path_length(256) > average_path_length(16));
        assert!(average_path_length(256) < 12.0);
    }

    #[test]
    fn test_scores_in_unit_interval() {
        let data = cluster_with(&[5_000.0]);
        let forest = IsolationForest::fit(&data, ForestParams::default(), &mut seeded()).unwrap();
        for score in forest.score(&data) {
            assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
        }
    }

    #[test]
    fn test_outlier_scores_higher_than_inlier() {
        let data = cluster_with(&[5_000.0]);
        let forest = IsolationForest::fit(&data, ForestParams::default(), &mut seeded()).unwrap();

        let outlier = forest.score_one(&[5_000.0, 1.0, 0.0]);
        let inlier = forest.score_one(&[103.0, 1.0, 0.0]);
        assert!(
            outlier > inlier,
            "outlier {} should beat inlier {}",
            outlier,
            inlier
        );
        assert!(outlier > 0.5);
        assert!(forest.is_anomalous(outlier));
        assert!(!forest.is_anomalous(inlier));
    }

    #[test]
    fn test_subsample_capped_by_data_size() {
        let data = cluster_with(&[]);
        let params = ForestParams {
            tree_count: 10,
            sample_size: 256,
            ..Default::default()
        };
        let forest = IsolationForest::fit(&data, params, &mut seeded()).unwrap();
        assert_eq!(forest.subsample_size(), 40);
        assert_eq!(forest.tree_count(), 10);

        let params = ForestParams {
            sample_size: 16,
            ..params
        };
        let forest = IsolationForest::fit(&data, params, &mut seeded()).unwrap();
        assert_eq!(forest.subsample_size(), 16);
    }

    #[test]
    fn test_same_seed_same_scores() {
        let data = cluster_with(&[900.0, 2_000.0]);
        let a = IsolationForest::fit(&data, ForestParams::default(), &mut seeded()).unwrap();
        let b = IsolationForest::fit(&data, ForestParams::default(), &mut seeded()).unwrap();
        assert_eq!(a.score(&data), b.score(&data));
        assert_eq!(a.threshold(), b.threshold());
    }

    #[test]
    fn test_identical_points_are_not_anomalous() {
        let data: Vec<FeatureVector> = (0..10).map(|_| vec![50.0, 0.0, 1.0]).collect();
        let forest = IsolationForest::fit(&data, ForestParams::default(), &mut seeded()).unwrap();
        // Every tree is a single leaf, so every point gets the neutral-ish c(n)/c(n) = 0.5
        let score = forest.score_one(&[50.0, 0.0, 1.0]);
        assert!((score - 0.5).abs() < 1e-9);
        assert!(!forest.is_anomalous(score));
    }

    #[test]
    fn test_lower_direction_flags_the_dense_side() {
        let data = cluster_with(&[5_000.0]);
        let params = ForestParams {
            direction: ThresholdDirection::LowerIsAnomalous,
            ..Default::default()
        };
        let forest = IsolationForest::fit(&data, params, &mut seeded()).unwrap();

        let outlier = forest.score_one(&[5_000.0, 1.0, 0.0]);
        assert!(!forest.is_anomalous(outlier));
        let flagged = forest.score(&data).into_iter().filter(|&s| forest.is_anomalous(s)).count();
        assert!(flagged > 0, "inverted convention should flag deep-path points");
    }

    #[test]
    fn test_contamination_cut() {
        let scores = [0.9, 0.4, 0.6, 0.5, 0.45];
        // ceil(0.2 * 5) = 1 -> highest score
        assert_eq!(
            contamination_cut(&scores, 0.2, ThresholdDirection::HigherIsAnomalous),
            0.9
        );
        // ceil(0.5 * 5) = 3 -> third highest
        assert_eq!(
            contamination_cut(&scores, 0.5, ThresholdDirection::HigherIsAnomalous),
            0.5
        );
        assert_eq!(
            contamination_cut(&scores, 0.2, ThresholdDirection::LowerIsAnomalous),
            0.4
        );
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut rng = seeded();
        let params = ForestParams::default();

        assert!(matches!(
            IsolationForest::fit(&[], params, &mut rng),
            Err(DetectError::InsufficientData { have: 0, .. })
        ));
        assert!(matches!(
            IsolationForest::fit(&[vec![1.0], vec![1.0, 2.0]], params, &mut rng),
            Err(DetectError::MalformedInput(_))
        ));
        assert!(matches!(
            IsolationForest::fit(&[vec![1.0], vec![f64::NAN]], params, &mut rng),
            Err(DetectError::MalformedInput(_))
        ));
    }
}
