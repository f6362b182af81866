use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::anomaly::AnomalyModel;
use crate::classifier::CategoryModel;
use crate::error::{Result, TrackerError};
use crate::forecast::PredictionModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Category,
    Prediction,
    Anomaly,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [ArtifactKind::Category, ArtifactKind::Prediction, ArtifactKind::Anomaly];

    pub fn name(self) -> &'static str {
        match self {
            ArtifactKind::Category => "category",
            ArtifactKind::Prediction => "prediction",
            ArtifactKind::Anomaly => "anomaly",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Category => "category_model.json",
            ArtifactKind::Prediction => "prediction_model.json",
            ArtifactKind::Anomaly => "anomaly_model.json",
        }
    }
}

/// Directory holding one JSON file per trained model.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    #[cfg(test)]
    pub fn exists(&self, kind: ArtifactKind) -> bool {
        self.path(kind).exists()
    }

    /// Write through a temporary sibling and rename, so readers see either
    /// the old file or the new one.
    pub fn save<T: Serialize>(&self, kind: ArtifactKind, value: &T) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(kind);
        let tmp = self.dir.join(format!("{}.tmp", kind.file_name()));
        let json = serde_json::to_string(value)?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        info!(model = kind.name(), path = %path.display(), "saved model");
        Ok(path)
    }

    /// Delete a stale artifact. Missing files are fine.
    pub fn remove(&self, kind: ArtifactKind) -> Result<()> {
        match std::fs::remove_file(self.path(kind)) {
            Ok(()) => {
                info!(model = kind.name(), "removed stale model");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// `Ok(None)` when the model has never been trained. Unreadable or
    /// malformed files are errors.
    pub fn load<T: DeserializeOwned>(&self, kind: ArtifactKind) -> Result<Option<T>> {
        let path = self.path(kind);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(TrackerError::ArtifactLoad {
                    name: kind.name(),
                    reason: e.to_string(),
                })
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| TrackerError::ArtifactLoad {
                name: kind.name(),
                reason: e.to_string(),
            })
    }
}

/// One loaded model, or why it is not usable.
#[derive(Debug, Clone)]
pub enum Slot<T> {
    Missing,
    Ready(T),
    Broken(String),
}

impl<T> Slot<T> {
    fn from_load(kind: ArtifactKind, loaded: Result<Option<T>>) -> Self {
        match loaded {
            Ok(Some(value)) => Slot::Ready(value),
            Ok(None) => Slot::Missing,
            Err(e) => {
                warn!(model = kind.name(), error = %e, "could not load model");
                Slot::Broken(e.to_string())
            }
        }
    }

    /// `Ok(None)` when missing; a broken slot is an error for the caller.
    pub fn get(&self, kind: ArtifactKind) -> Result<Option<&T>> {
        match self {
            Slot::Missing => Ok(None),
            Slot::Ready(value) => Ok(Some(value)),
            Slot::Broken(reason) => Err(TrackerError::ArtifactLoad {
                name: kind.name(),
                reason: reason.clone(),
            }),
        }
    }
}

/// The current set of trained models. Replaced wholesale after retraining.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub category: Slot<CategoryModel>,
    pub prediction: Slot<PredictionModel>,
    pub anomaly: Slot<AnomalyModel>,
}

impl ModelBundle {
    /// Load every model independently; one bad file leaves the others usable.
    pub fn load(store: &ArtifactStore) -> Self {
        Self {
            category: Slot::from_load(ArtifactKind::Category, store.load(ArtifactKind::Category)),
            prediction: Slot::from_load(ArtifactKind::Prediction, store.load(ArtifactKind::Prediction)),
            anomaly: Slot::from_load(ArtifactKind::Anomaly, store.load(ArtifactKind::Anomaly)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MonthlyTotal;

    fn store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("models"));
        (dir, store)
    }

    fn fallback() -> PredictionModel {
        PredictionModel::fit(&[MonthlyTotal {
            month: "2025-01".into(),
            total: 12.0,
        }])
        .unwrap()
    }

    #[test]
    fn test_load_missing_is_none() {
        let (_dir, store) = store();
        let loaded: Option<PredictionModel> = store.load(ArtifactKind::Prediction).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, store) = store();
        let path = store.save(ArtifactKind::Prediction, &fallback()).unwrap();
        assert!(path.ends_with("prediction_model.json"));
        assert!(!store.dir().join("prediction_model.json.tmp").exists());
        let loaded: Option<PredictionModel> = store.load(ArtifactKind::Prediction).unwrap();
        assert_eq!(loaded, Some(fallback()));
    }

    #[test]
    fn test_save_replaces_previous() {
        let (_dir, store) = store();
        store.save(ArtifactKind::Prediction, &fallback()).unwrap();
        let empty = PredictionModel::fit(&[]).unwrap();
        store.save(ArtifactKind::Prediction, &empty).unwrap();
        let loaded: Option<PredictionModel> = store.load(ArtifactKind::Prediction).unwrap();
        assert_eq!(loaded, Some(empty));
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.path(ArtifactKind::Prediction), "{\"kind\":\"mystery\"}").unwrap();
        let err = store.load::<PredictionModel>(ArtifactKind::Prediction).unwrap_err();
        assert!(matches!(err, TrackerError::ArtifactLoad { name: "prediction", .. }));
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let (_dir, store) = store();
        store.remove(ArtifactKind::Anomaly).unwrap();
        store.save(ArtifactKind::Prediction, &fallback()).unwrap();
        store.remove(ArtifactKind::Prediction).unwrap();
        assert!(!store.exists(ArtifactKind::Prediction));
    }

    #[test]
    fn test_bundle_isolates_broken_files() {
        let (_dir, store) = store();
        store.save(ArtifactKind::Prediction, &fallback()).unwrap();
        std::fs::write(store.path(ArtifactKind::Category), "not json").unwrap();

        let bundle = ModelBundle::load(&store);
        assert!(matches!(bundle.prediction, Slot::Ready(_)));
        assert!(matches!(bundle.anomaly, Slot::Missing));
        assert!(bundle.category.get(ArtifactKind::Category).is_err());
        assert!(bundle.anomaly.get(ArtifactKind::Anomaly).unwrap().is_none());
    }
}
