//! Forest adapter: `Classifier` backed by a JSON-exported random forest.
//!
//! The artifact mirrors the arrays of a fitted scikit-learn tree
//! (`children_left`, `children_right`, `feature`, `threshold`, `value`), one
//! entry per tree. Feature columns are bound by name at load time, so the
//! export may list them in any order.
//!
//! # Integrity
//!
//! Before parsing, the model directory is checked against `manifest.json`
//! (see [`manifest`]). With [`SignaturePolicy::Required`] only artifacts
//! signed by the configured Ed25519 key are accepted.
//!
//! # Evaluation
//!
//! Each tree routes left when `x[feature] <= threshold`. Leaf rows are
//! normalized per tree and averaged across the forest, which is how
//! scikit-learn computes `predict_proba` for a random forest. The predicted
//! class is the argmax with ties going to class 0.

pub mod manifest;

use std::fs;
use std::path::{Path, PathBuf};

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

use crate::domain::{ClassLabel, ClassProbabilities, FeatureRecord};
use crate::ports::{Classifier, ClassifierLoader, InferenceError, LoadError, ModelInfo};

pub use manifest::{ModelManifest, SignaturePolicy, Verification};

/// Default artifact file name inside the model directory.
pub const MODEL_FILE: &str = "cardio_forest.json";

const FORMAT_VERSION: u32 = 1;

/// Marker for "no child" in `children_left` / `children_right`.
const LEAF: i64 = -1;

/// One exported decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    /// Column index into the artifact's `feature_names` (negative on leaves)
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class counts or weights, `[class 0, class 1]`
    pub value: Vec<Vec<f64>>,
}

/// The serialized forest as written by the export script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedForest {
    pub format_version: u32,
    pub model_type: String,
    pub classes: Vec<u8>,
    pub feature_names: Vec<String>,
    pub trees: Vec<ExportedTree>,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        column: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        distribution: [f64; 2],
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_export(
        index: usize,
        tree: &ExportedTree,
        n_features: usize,
    ) -> Result<Self, LoadError> {
        let n = tree.children_left.len();
        if n == 0 {
            return Err(LoadError::Corrupt(format!("tree {index} has no nodes")));
        }
        if tree.children_right.len() != n
            || tree.feature.len() != n
            || tree.threshold.len() != n
            || tree.value.len() != n
        {
            return Err(LoadError::Corrupt(format!(
                "tree {index} has arrays of different lengths"
            )));
        }

        let child = |raw: i64, node: usize| -> Result<usize, LoadError> {
            usize::try_from(raw)
                .ok()
                .filter(|&c| c < n && c != node)
                .ok_or_else(|| {
                    LoadError::Corrupt(format!(
                        "tree {index} node {node} has invalid child {raw}"
                    ))
                })
        };

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            if tree.children_left[i] == LEAF {
                let row = &tree.value[i];
                if row.len() != 2 {
                    return Err(LoadError::Incompatible(format!(
                        "tree {index} leaf {i} has {} class values, expected 2",
                        row.len()
                    )));
                }
                let total = row[0] + row[1];
                if !total.is_finite() || total <= 0.0 || row[0] < 0.0 || row[1] < 0.0 {
                    return Err(LoadError::Corrupt(format!(
                        "tree {index} leaf {i} has invalid class values"
                    )));
                }
                nodes.push(Node::Leaf {
                    distribution: [row[0] / total, row[1] / total],
                });
            } else {
                let column = usize::try_from(tree.feature[i])
                    .ok()
                    .filter(|&c| c < n_features)
                    .ok_or_else(|| {
                        LoadError::Corrupt(format!(
                            "tree {index} node {i} splits on unknown feature {}",
                            tree.feature[i]
                        ))
                    })?;
                let threshold = tree.threshold[i];
                if !threshold.is_finite() {
                    return Err(LoadError::Corrupt(format!(
                        "tree {index} node {i} has a non-finite threshold"
                    )));
                }
                nodes.push(Node::Split {
                    column,
                    threshold,
                    left: child(tree.children_left[i], i)?,
                    right: child(tree.children_right[i], i)?,
                });
            }
        }

        Ok(Self { nodes })
    }

    /// Walk from the root to a leaf. Bounded by the node count so a cyclic
    /// artifact fails instead of hanging.
    fn leaf_distribution(&self, x: &[f64]) -> Result<[f64; 2], InferenceError> {
        let mut current = 0;
        for _ in 0..self.nodes.len() {
            match &self.nodes[current] {
                Node::Leaf { distribution } => return Ok(*distribution),
                Node::Split {
                    column,
                    threshold,
                    left,
                    right,
                } => {
                    current = if x[*column] <= *threshold { *left } else { *right };
                }
            }
        }
        Err(InferenceError::Evaluation(
            "tree traversal did not reach a leaf".into(),
        ))
    }
}

/// A loaded random forest.
#[derive(Debug, Clone)]
pub struct ForestClassifier {
    trees: Vec<Tree>,
    /// For each artifact column, its index in `FeatureRecord::FEATURE_NAMES`
    column_map: Vec<usize>,
    info: ModelInfo,
}

impl ForestClassifier {
    /// Build a classifier from a parsed export.
    ///
    /// # Errors
    /// Returns `LoadError::Incompatible` when the export does not describe a
    /// binary classifier over known features, or `LoadError::Corrupt` when a
    /// tree is malformed.
    pub fn from_export(
        export: &ExportedForest,
        source: PathBuf,
        sha256: String,
        signed: bool,
    ) -> Result<Self, LoadError> {
        if export.format_version != FORMAT_VERSION {
            return Err(LoadError::Incompatible(format!(
                "unsupported format_version {}",
                export.format_version
            )));
        }
        if export.classes != [0, 1] {
            return Err(LoadError::Incompatible(format!(
                "expected classes [0, 1], got {:?}",
                export.classes
            )));
        }
        if export.feature_names.is_empty() {
            return Err(LoadError::Incompatible("no feature names".into()));
        }
        if export.trees.is_empty() {
            return Err(LoadError::Corrupt("forest has no trees".into()));
        }

        let mut column_map = Vec::with_capacity(export.feature_names.len());
        for name in &export.feature_names {
            let idx = FeatureRecord::index_of(name).ok_or_else(|| {
                LoadError::Incompatible(format!("model expects unknown feature '{name}'"))
            })?;
            if column_map.contains(&idx) {
                return Err(LoadError::Incompatible(format!(
                    "feature '{name}' listed twice"
                )));
            }
            column_map.push(idx);
        }

        let trees = export
            .trees
            .iter()
            .enumerate()
            .map(|(i, t)| Tree::from_export(i, t, column_map.len()))
            .collect::<Result<Vec<_>, _>>()?;

        let info = ModelInfo {
            model_type: export.model_type.clone(),
            source,
            n_estimators: trees.len(),
            feature_names: export.feature_names.clone(),
            sha256,
            signed,
            loaded_at: chrono::Utc::now(),
        };

        Ok(Self {
            trees,
            column_map,
            info,
        })
    }

    fn columns(&self, record: &FeatureRecord) -> Vec<f64> {
        let all = record.to_vec();
        self.column_map.iter().map(|&i| all[i]).collect()
    }

    fn distribution(&self, record: &FeatureRecord) -> Result<[f64; 2], InferenceError> {
        let x = self.columns(record);
        if let Some(bad) = x.iter().position(|v| !v.is_finite()) {
            return Err(InferenceError::FeatureMismatch(format!(
                "feature '{}' is not finite",
                self.info.feature_names[bad]
            )));
        }

        let mut sum = [0.0, 0.0];
        for tree in &self.trees {
            let d = tree.leaf_distribution(&x)?;
            sum[0] += d[0];
            sum[1] += d[1];
        }
        let n = self.trees.len() as f64;
        Ok([sum[0] / n, sum[1] / n])
    }

    fn label_for(distribution: [f64; 2]) -> ClassLabel {
        if distribution[1] > distribution[0] {
            ClassLabel::Positive
        } else {
            ClassLabel::Negative
        }
    }
}

impl Classifier for ForestClassifier {
    fn predict(&self, record: &FeatureRecord) -> Result<ClassLabel, InferenceError> {
        self.distribution(record).map(Self::label_for)
    }

    fn predict_probabilities(
        &self,
        record: &FeatureRecord,
    ) -> Result<ClassProbabilities, InferenceError> {
        let d = self.distribution(record)?;
        ClassProbabilities::new(d[0], d[1]).map_err(InferenceError::InvalidProbabilities)
    }

    fn predict_with_probabilities(
        &self,
        record: &FeatureRecord,
    ) -> Result<(ClassLabel, ClassProbabilities), InferenceError> {
        let d = self.distribution(record)?;
        let probabilities =
            ClassProbabilities::new(d[0], d[1]).map_err(InferenceError::InvalidProbabilities)?;
        Ok((Self::label_for(d), probabilities))
    }

    fn info(&self) -> Option<&ModelInfo> {
        Some(&self.info)
    }
}

/// Loads a [`ForestClassifier`] from disk.
#[derive(Debug, Clone)]
pub struct ForestLoader {
    model_path: PathBuf,
    policy: SignaturePolicy,
    verifying_key: Option<VerifyingKey>,
}

impl ForestLoader {
    /// `model_path` is either a directory holding [`MODEL_FILE`] or the JSON
    /// file itself.
    #[must_use]
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            policy: SignaturePolicy::IfPresent,
            verifying_key: None,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SignaturePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_verifying_key(mut self, key: VerifyingKey) -> Self {
        self.verifying_key = Some(key);
        self
    }

    fn resolve(&self) -> Result<(PathBuf, String), LoadError> {
        if !self.model_path.exists() {
            return Err(LoadError::NotFound(self.model_path.clone()));
        }

        if self.model_path.is_dir() {
            let file = self.model_path.join(MODEL_FILE);
            if !file.exists() {
                return Err(LoadError::NotFound(file));
            }
            return Ok((self.model_path.clone(), MODEL_FILE.to_string()));
        }

        let name = self
            .model_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| LoadError::NotFound(self.model_path.clone()))?
            .to_string();
        let dir = self
            .model_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok((dir, name))
    }
}

/// Digest of the bytes about to be parsed, checked against the manifest
/// entry when there is one. The file may have changed since
/// `verify_model_dir` hashed it.
fn verified_digest(
    verification: &Verification,
    file_name: &str,
    bytes: &[u8],
) -> Result<String, LoadError> {
    let sha256 = manifest::sha256_hex(bytes);
    if let Some(expected) = verification
        .manifest
        .as_ref()
        .and_then(|m| m.files.get(file_name))
    {
        if !sha256.eq_ignore_ascii_case(expected) {
            return Err(LoadError::Integrity(format!(
                "digest mismatch for {file_name}"
            )));
        }
    }
    Ok(sha256)
}

impl ClassifierLoader for ForestLoader {
    type Classifier = ForestClassifier;

    fn load(&self) -> Result<ForestClassifier, LoadError> {
        let (dir, file_name) = self.resolve()?;
        let verification =
            manifest::verify_model_dir(&dir, &file_name, self.policy, self.verifying_key.as_ref())?;

        let path = dir.join(&file_name);
        let bytes = fs::read(&path).map_err(|e| LoadError::Io(format!("{path:?}: {e}")))?;
        let sha256 = verified_digest(&verification, &file_name, &bytes)?;

        let export: ExportedForest =
            serde_json::from_slice(&bytes).map_err(|e| LoadError::Corrupt(e.to_string()))?;

        let classifier =
            ForestClassifier::from_export(&export, path.clone(), sha256, verification.signed)?;

        tracing::info!(
            "Loaded {} from {:?} ({} trees, {} features, signed={})",
            export.model_type,
            path,
            classifier.info.n_estimators,
            classifier.column_map.len(),
            verification.signed
        );

        Ok(classifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{derive, RawAssessmentInput};
    use tempfile::tempdir;

    /// One stump on `bmi` and one on `ap_hi`.
    fn two_stump_forest() -> ExportedForest {
        ExportedForest {
            format_version: 1,
            model_type: "random_forest".into(),
            classes: vec![0, 1],
            feature_names: vec!["ap_hi".into(), "bmi".into()],
            trees: vec![
                ExportedTree {
                    children_left: vec![1, -1, -1],
                    children_right: vec![2, -1, -1],
                    feature: vec![1, -2, -2],
                    threshold: vec![25.0, -2.0, -2.0],
                    value: vec![vec![50.0, 50.0], vec![45.0, 5.0], vec![15.0, 35.0]],
                },
                ExportedTree {
                    children_left: vec![1, -1, -1],
                    children_right: vec![2, -1, -1],
                    feature: vec![0, -2, -2],
                    threshold: vec![130.0, -2.0, -2.0],
                    value: vec![vec![50.0, 50.0], vec![30.0, 10.0], vec![2.0, 8.0]],
                },
            ],
        }
    }

    fn load(export: &ExportedForest) -> Result<ForestClassifier, LoadError> {
        ForestClassifier::from_export(export, PathBuf::from("mem"), String::new(), false)
    }

    #[test]
    fn test_forest_probability_is_tree_mean() {
        let forest = load(&two_stump_forest()).expect("valid forest");

        // bmi 25.7 > 25 -> [0.3, 0.7]; ap_hi 120 <= 130 -> [0.75, 0.25]
        let record = derive(&RawAssessmentInput::default());
        let probs = forest.predict_probabilities(&record).expect("probabilities");
        assert!((probs.positive - 0.475).abs() < 1e-12);
        assert!((probs.negative - 0.525).abs() < 1e-12);
        assert_eq!(forest.predict(&record), Ok(ClassLabel::Negative));

        // Both trees vote positive.
        let raw = RawAssessmentInput {
            systolic_bp: 160,
            ..Default::default()
        };
        let (label, probs) = forest
            .predict_with_probabilities(&derive(&raw))
            .expect("combined");
        assert_eq!(label, ClassLabel::Positive);
        assert!((probs.positive - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_routes_left_on_equality() {
        let mut export = two_stump_forest();
        export.trees.truncate(1);
        export.feature_names = vec!["bmi".into()];
        export.trees[0].feature[0] = 0;
        let forest = load(&export).expect("valid forest");

        let raw = RawAssessmentInput {
            height_cm: 200,
            weight_kg: 100,
            ..Default::default()
        };
        // 100 / 2.0^2 == 25.0 exactly
        let probs = forest.predict_probabilities(&derive(&raw)).expect("probs");
        assert!((probs.positive - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_unknown_feature() {
        let mut export = two_stump_forest();
        export.feature_names[0] = "cholesterol_mg".into();
        assert!(matches!(load(&export), Err(LoadError::Incompatible(_))));
    }

    #[test]
    fn test_rejects_multiclass() {
        let mut export = two_stump_forest();
        export.classes = vec![0, 1, 2];
        assert!(matches!(load(&export), Err(LoadError::Incompatible(_))));
    }

    #[test]
    fn test_rejects_out_of_range_child() {
        let mut export = two_stump_forest();
        export.trees[0].children_right[0] = 9;
        assert!(matches!(load(&export), Err(LoadError::Corrupt(_))));
    }

    #[test]
    fn test_rejects_unsupported_format_version() {
        let export = ExportedForest {
            format_version: 2,
            ..two_stump_forest()
        };
        assert_eq!(
            load(&export).expect_err("version"),
            LoadError::Incompatible("unsupported format_version 2".into())
        );
    }

    #[test]
    fn test_rejects_empty_forest() {
        let export = ExportedForest {
            trees: Vec::new(),
            ..two_stump_forest()
        };
        assert_eq!(
            load(&export).expect_err("no trees"),
            LoadError::Corrupt("forest has no trees".into())
        );
    }

    #[test]
    fn test_rejects_mismatched_array_lengths() {
        let mut export = two_stump_forest();
        export.trees[1].threshold.pop();
        assert_eq!(
            load(&export).expect_err("lengths"),
            LoadError::Corrupt("tree 1 has arrays of different lengths".into())
        );
    }

    #[test]
    fn test_rejects_split_on_missing_column() {
        let mut export = two_stump_forest();
        // Only two columns are declared.
        export.trees[0].feature[0] = 2;
        let err = load(&export).expect_err("feature index");
        assert!(matches!(err, LoadError::Corrupt(msg) if msg.contains("unknown feature 2")));
    }

    #[test]
    fn test_rejects_leaf_with_zero_weight() {
        let mut export = two_stump_forest();
        export.trees[0].value[2] = vec![0.0, 0.0];
        assert_eq!(
            load(&export).expect_err("zero sum"),
            LoadError::Corrupt("tree 0 leaf 2 has invalid class values".into())
        );
    }

    #[test]
    fn test_rejects_leaf_with_wrong_class_count() {
        let mut export = two_stump_forest();
        export.trees[1].value[1] = vec![3.0, 1.0, 1.0];
        assert_eq!(
            load(&export).expect_err("three classes"),
            LoadError::Incompatible("tree 1 leaf 1 has 3 class values, expected 2".into())
        );
    }

    #[test]
    fn test_parsed_bytes_must_match_manifest() {
        let json = serde_json::to_vec(&two_stump_forest()).expect("serialize");
        let mut files = std::collections::BTreeMap::new();
        files.insert(MODEL_FILE.to_string(), manifest::sha256_hex(b"earlier contents"));
        let verification = Verification {
            manifest: Some(ModelManifest { version: 1, files }),
            signed: false,
        };

        let err = verified_digest(&verification, MODEL_FILE, &json).expect_err("swapped");
        assert_eq!(
            err,
            LoadError::Integrity(format!("digest mismatch for {MODEL_FILE}"))
        );

        let unverified = Verification {
            manifest: None,
            signed: false,
        };
        assert_eq!(
            verified_digest(&unverified, MODEL_FILE, &json).expect("no manifest"),
            manifest::sha256_hex(&json)
        );
    }

    #[test]
    fn test_loader_reads_manifest_bound_model() {
        let temp = tempdir().expect("tempdir");
        let json = serde_json::to_vec(&two_stump_forest()).expect("serialize");
        fs::write(temp.path().join(MODEL_FILE), &json).expect("write");
        let manifest = ModelManifest::for_files(temp.path(), &[MODEL_FILE]).expect("manifest");
        fs::write(
            temp.path().join(manifest::MANIFEST_FILE),
            manifest.to_bytes().expect("bytes"),
        )
        .expect("write manifest");

        let classifier = ForestLoader::new(temp.path()).load().expect("load");
        assert_eq!(
            classifier.info().expect("info").sha256,
            manifest::sha256_hex(&json)
        );
    }

    #[test]
    fn test_cyclic_tree_fails_at_inference() {
        let export = ExportedForest {
            trees: vec![ExportedTree {
                children_left: vec![1, 0, -1],
                children_right: vec![2, 2, -1],
                feature: vec![0, 0, -2],
                threshold: vec![1000.0, 1000.0, -2.0],
                value: vec![vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]],
            }],
            ..two_stump_forest()
        };
        let forest = load(&export).expect("structurally valid");
        let err = forest
            .predict_probabilities(&derive(&RawAssessmentInput::default()))
            .expect_err("cycle");
        assert!(matches!(err, InferenceError::Evaluation(_)));
    }

    #[test]
    fn test_loader_reads_directory() {
        let temp = tempdir().expect("tempdir");
        let json = serde_json::to_vec(&two_stump_forest()).expect("serialize");
        fs::write(temp.path().join(MODEL_FILE), &json).expect("write");

        let classifier = ForestLoader::new(temp.path()).load().expect("load");
        let info = classifier.info().expect("info");
        assert_eq!(info.n_estimators, 2);
        assert_eq!(info.sha256, manifest::sha256_hex(&json));
        assert!(!info.signed);
    }

    #[test]
    fn test_loader_missing_artifact() {
        let temp = tempdir().expect("tempdir");
        let err = ForestLoader::new(temp.path().join("nope"))
            .load()
            .expect_err("missing");
        assert!(matches!(err, LoadError::NotFound(_)));

        let err = ForestLoader::new(temp.path()).load().expect_err("missing file");
        assert_eq!(err, LoadError::NotFound(temp.path().join(MODEL_FILE)));
    }

    #[test]
    fn test_loader_rejects_garbage() {
        let temp = tempdir().expect("tempdir");
        fs::write(temp.path().join(MODEL_FILE), b"not json").expect("write");
        let err = ForestLoader::new(temp.path()).load().expect_err("corrupt");
        assert!(matches!(err, LoadError::Corrupt(_)));
    }

    #[test]
    fn test_loader_requires_signature_when_configured() {
        let temp = tempdir().expect("tempdir");
        let json = serde_json::to_vec(&two_stump_forest()).expect("serialize");
        fs::write(temp.path().join(MODEL_FILE), &json).expect("write");

        let err = ForestLoader::new(temp.path())
            .with_policy(SignaturePolicy::Required)
            .load()
            .expect_err("unsigned");
        assert!(matches!(err, LoadError::Integrity(_)));
    }

    #[test]
    fn test_bundled_demo_model_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let forest = ForestLoader::new(dir).load().expect("demo model");
        let probs = forest
            .predict_probabilities(&derive(&RawAssessmentInput::default()))
            .expect("probs");
        assert!((0.0..=1.0).contains(&probs.positive));
    }
}
