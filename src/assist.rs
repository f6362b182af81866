use rusqlite::Connection;

use crate::anomaly::MIN_ANOMALY_MONTHS;
use crate::artifacts::{ArtifactKind, ArtifactStore, ModelBundle};
use crate::error::{Result, TrackerError};
use crate::forecast::Forecast;
use crate::models::MonthlyTotal;
use crate::training::{train_all, TrainingReport};

/// Result of an action that depends on a trained model.
#[derive(Debug, Clone, PartialEq)]
pub enum Availability<T> {
    Available(T),
    /// Not trained yet, or not enough data to train. Not an error.
    Unavailable(String),
}

fn not_trained(kind: ArtifactKind) -> String {
    let mut label = kind.name().to_string();
    if let Some(first) = label.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    let needs = match kind {
        ArtifactKind::Category => " (needs at least one expense with a description)".to_string(),
        ArtifactKind::Prediction => String::new(),
        ArtifactKind::Anomaly => format!(" (needs at least {MIN_ANOMALY_MONTHS} months of data)"),
    };
    format!("{label} model not trained{needs}. Run `spendsense train` once there is enough data.")
}

pub fn suggest_category(bundle: &ModelBundle, description: &str) -> Result<Availability<String>> {
    let description = description.trim();
    if description.is_empty() {
        return Err(TrackerError::InvalidInput(
            "Type a description to get a suggestion".to_string(),
        ));
    }
    Ok(match bundle.category.get(ArtifactKind::Category)? {
        Some(model) => Availability::Available(model.predict(description).to_string()),
        None => Availability::Unavailable(not_trained(ArtifactKind::Category)),
    })
}

pub fn predict_next_month(bundle: &ModelBundle) -> Result<Availability<Forecast>> {
    Ok(match bundle.prediction.get(ArtifactKind::Prediction)? {
        Some(model) => Availability::Available(model.forecast()),
        None => Availability::Unavailable(not_trained(ArtifactKind::Prediction)),
    })
}

/// Months flagged by the anomaly model, with their totals. An empty list
/// means nothing unusual was found.
pub fn detect_anomalies(bundle: &ModelBundle) -> Result<Availability<Vec<MonthlyTotal>>> {
    Ok(match bundle.anomaly.get(ArtifactKind::Anomaly)? {
        Some(model) => Availability::Available(model.anomalies()),
        None => Availability::Unavailable(not_trained(ArtifactKind::Anomaly)),
    })
}

/// Retrain everything from the ledger and hand back a freshly loaded bundle.
pub fn retrain(conn: &Connection, store: &ArtifactStore) -> Result<(TrainingReport, ModelBundle)> {
    let report = train_all(conn, store)?;
    Ok((report, ModelBundle::load(store)))
}
