// Model artifacts - JSON-backed pre-fitted scaler and logistic classifier
//
// Artifact formats:
//
//   scaler.json  {"feature_names": [...], "mean": [...], "scale": [...]}
//   model.json   {"feature_names": [...], "coefficients": [...], "intercept": f}
//
// `feature_names` must equal FEATURE_NAMES in order; the arrays are positional
// against that order. Validation happens once at load time so a detector is
// never built around an artifact it cannot feed.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::classifier::{Classifier, EventModel, FeatureScaler};
use super::features::{FEATURE_COUNT, FEATURE_NAMES};
use crate::config::DetectorConfig;
use crate::error::ModelError;

/// Standardization fitted on the training features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let scaler: Self = read_artifact(path.as_ref())?;
        scaler.validate()?;
        Ok(scaler)
    }

    /// Check vocabulary and array widths
    pub fn validate(&self) -> Result<(), ModelError> {
        check_vocabulary(&self.feature_names)?;
        check_width("mean", self.mean.len())?;
        check_width("scale", self.scale.len())
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        if features.len() != self.mean.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.mean.len(),
                actual: features.len(),
            });
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                // Constant training features were fitted with unit scale
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

/// Binary logistic regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticModel {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let model: Self = read_artifact(path.as_ref())?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        check_vocabulary(&self.feature_names)?;
        check_width("coefficients", self.coefficients.len())
    }
}

impl EventModel for LogisticModel {
    fn event_probability(&self, scaled: &[f64]) -> Result<f64, ModelError> {
        if scaled.len() != self.coefficients.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.coefficients.len(),
                actual: scaled.len(),
            });
        }

        let logit: f64 = self
            .coefficients
            .iter()
            .zip(scaled)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;

        Ok(1.0 / (1.0 + (-logit).exp()))
    }
}

/// Both artifacts of one detector, loaded and validated
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub scaler: StandardScaler,
    pub model: LogisticModel,
}

impl ModelArtifacts {
    /// Load `scaler_file` and `model_file` from `models_dir`
    pub fn load(config: &DetectorConfig) -> Result<Self, ModelError> {
        let scaler = StandardScaler::from_file(config.scaler_path())?;
        let model = LogisticModel::from_file(config.model_path())?;
        log::info!(
            "[ModelArtifacts] Loaded scaler and model from {}",
            config.models_dir.display()
        );
        Ok(Self { scaler, model })
    }

    pub fn into_classifier(self) -> Classifier {
        Classifier::new(Box::new(self.scaler), Box::new(self.model))
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    let unreadable = |reason: String| ModelError::ArtifactUnreadable {
        path: PathBuf::from(path),
        reason,
    };

    let contents = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ModelError::ArtifactMissing {
                path: PathBuf::from(path),
            }
        } else {
            unreadable(e.to_string())
        }
    })?;

    serde_json::from_str(&contents).map_err(|e| unreadable(e.to_string()))
}

fn check_vocabulary(names: &[String]) -> Result<(), ModelError> {
    if names.len() != FEATURE_COUNT {
        return Err(ModelError::VocabularyMismatch {
            reason: format!(
                "artifact lists {} features, extractor produces {}",
                names.len(),
                FEATURE_COUNT
            ),
        });
    }

    if let Some((position, (found, expected))) = names
        .iter()
        .zip(FEATURE_NAMES.iter())
        .enumerate()
        .find(|(_, (found, expected))| found.as_str() != **expected)
    {
        return Err(ModelError::VocabularyMismatch {
            reason: format!(
                "position {} is '{}', expected '{}'",
                position, found, expected
            ),
        });
    }

    Ok(())
}

fn check_width(field: &str, actual: usize) -> Result<(), ModelError> {
    if actual != FEATURE_COUNT {
        return Err(ModelError::VocabularyMismatch {
            reason: format!(
                "'{}' has {} entries, expected {}",
                field, actual, FEATURE_COUNT
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::io::Write;
    use tempfile::TempDir;

    fn vocabulary() -> Vec<String> {
        FEATURE_NAMES.iter().map(|n| n.to_string()).collect()
    }

    fn write_json(dir: &Path, name: &str, value: &serde_json::Value) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        write!(file, "{}", value).unwrap();
    }

    fn detector_config(dir: &TempDir) -> DetectorConfig {
        DetectorConfig {
            models_dir: dir.path().to_path_buf(),
            ..DetectorConfig::default()
        }
    }

    #[test]
    fn test_scaler_transform() {
        let mut mean = vec![0.0; FEATURE_COUNT];
        let mut scale = vec![1.0; FEATURE_COUNT];
        mean[0] = 2.0;
        scale[0] = 4.0;
        scale[1] = 0.0;

        let scaler = StandardScaler {
            feature_names: vocabulary(),
            mean,
            scale,
        };

        let mut input = vec![0.0; FEATURE_COUNT];
        input[0] = 10.0;
        input[1] = 3.0;
        let scaled = scaler.transform(&input).unwrap();

        assert_eq!(scaled[0], 2.0);
        assert_eq!(scaled[1], 3.0, "zero scale acts as unit scale");
        assert_eq!(scaled.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_scaler_rejects_wrong_width() {
        let scaler = StandardScaler {
            feature_names: vocabulary(),
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        };
        let err = scaler.transform(&[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ModelError::ShapeMismatch {
                expected: FEATURE_COUNT,
                actual: 2
            }
        );
    }

    #[test]
    fn test_logistic_probability() {
        let model = LogisticModel {
            feature_names: vocabulary(),
            coefficients: vec![0.0; FEATURE_COUNT],
            intercept: 0.0,
        };
        let p = model.event_probability(&[1.0; FEATURE_COUNT]).unwrap();
        assert_eq!(p, 0.5);

        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[3] = 2.0;
        let model = LogisticModel {
            coefficients,
            ..model
        };
        let mut x = vec![0.0; FEATURE_COUNT];
        x[3] = 1.0;
        let p = model.event_probability(&x).unwrap();
        assert!((p - 1.0 / (1.0 + (-2.0_f64).exp())).abs() < 1e-15);
    }

    #[test]
    fn test_load_valid_artifacts() {
        let dir = TempDir::new().unwrap();
        write_json(
            dir.path(),
            "scaler.json",
            &serde_json::json!({
                "feature_names": FEATURE_NAMES.to_vec(),
                "mean": vec![0.0; FEATURE_COUNT],
                "scale": vec![1.0; FEATURE_COUNT],
            }),
        );
        write_json(
            dir.path(),
            "model.json",
            &serde_json::json!({
                "feature_names": FEATURE_NAMES.to_vec(),
                "coefficients": vec![0.1; FEATURE_COUNT],
                "intercept": -0.5,
            }),
        );

        let artifacts = ModelArtifacts::load(&detector_config(&dir)).unwrap();
        assert_eq!(artifacts.model.intercept, -0.5);
        assert_eq!(artifacts.scaler.mean.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let err = ModelArtifacts::load(&detector_config(&dir)).unwrap_err();
        assert!(matches!(err, ModelError::ArtifactMissing { .. }));
    }

    #[test]
    fn test_unparseable_artifact() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("scaler.json"), "{ not json").unwrap();
        let err = ModelArtifacts::load(&detector_config(&dir)).unwrap_err();
        assert!(matches!(err, ModelError::ArtifactUnreadable { .. }));
    }

    #[test]
    fn test_reordered_vocabulary_is_rejected() {
        let mut names = vocabulary();
        names.swap(0, 1);
        let scaler = StandardScaler {
            feature_names: names,
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        };
        let err = scaler.validate().unwrap_err();
        assert!(matches!(err, ModelError::VocabularyMismatch { .. }));
        assert!(err.message().contains("position 0"));
    }

    #[test]
    fn test_short_coefficients_are_rejected() {
        let model = LogisticModel {
            feature_names: vocabulary(),
            coefficients: vec![0.0; FEATURE_COUNT - 1],
            intercept: 0.0,
        };
        assert!(matches!(
            model.validate(),
            Err(ModelError::VocabularyMismatch { .. })
        ));
    }
}
