use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::anomaly::{AnomalyModel, ForestConfig};
use crate::artifacts::{ArtifactKind, ArtifactStore};
use crate::classifier::{training_fit, CategoryModel, LabeledText, TrainingFit};
use crate::error::{Result, TrackerError};
use crate::forecast::{Basis, PredictionModel};
use crate::ledger::{load_ledger, monthly_totals};
use crate::models::{Expense, MonthlyTotal};

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Saved,
    /// Not enough data; any older model of this kind was removed.
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub rows: usize,
    pub months: usize,
    pub category: StepOutcome,
    pub category_fit: Option<TrainingFit>,
    pub prediction: StepOutcome,
    pub prediction_basis: Option<Basis>,
    pub anomaly: StepOutcome,
    pub anomalies_flagged: Option<usize>,
}

fn labeled_rows(expenses: &[Expense]) -> Vec<LabeledText> {
    expenses
        .iter()
        .filter(|e| !e.description.trim().is_empty() && !e.category.trim().is_empty())
        .map(|e| LabeledText {
            description: e.description.clone(),
            category: e.category.clone(),
        })
        .collect()
}

fn train_category(expenses: &[Expense], store: &ArtifactStore) -> Result<TrainingFit> {
    let rows = labeled_rows(expenses);
    let model = CategoryModel::fit(&rows)?;
    let fit = training_fit(&model, &rows);
    store.save(ArtifactKind::Category, &model)?;
    Ok(fit)
}

fn train_prediction(months: &[MonthlyTotal], store: &ArtifactStore) -> Result<Basis> {
    let model = PredictionModel::fit(months)?;
    store.save(ArtifactKind::Prediction, &model)?;
    Ok(model.forecast().basis)
}

fn train_anomaly(months: &[MonthlyTotal], store: &ArtifactStore, config: &ForestConfig) -> Result<usize> {
    let model = AnomalyModel::fit(months, config)?;
    store.save(ArtifactKind::Anomaly, &model)?;
    Ok(model.anomalies().len())
}

/// Turn one step's result into an outcome. Insufficient data is a skip, not
/// a failure, and clears the previous model so it cannot go stale.
fn settle<T>(kind: ArtifactKind, store: &ArtifactStore, result: Result<T>) -> (StepOutcome, Option<T>) {
    match result {
        Ok(value) => (StepOutcome::Saved, Some(value)),
        Err(TrackerError::InsufficientData(reason)) => {
            warn!(model = kind.name(), "skipped: {reason}");
            match store.remove(kind) {
                Ok(()) => (StepOutcome::Skipped(reason), None),
                Err(e) => (StepOutcome::Failed(e.to_string()), None),
            }
        }
        Err(e) => {
            error!(model = kind.name(), error = %e, "training failed");
            (StepOutcome::Failed(e.to_string()), None)
        }
    }
}

/// Reload the whole ledger and retrain every model. Each model is trained
/// on its own; a skip or failure in one does not stop the others.
pub fn train_all(conn: &Connection, store: &ArtifactStore) -> Result<TrainingReport> {
    train_all_with(conn, store, &ForestConfig::default())
}

pub fn train_all_with(conn: &Connection, store: &ArtifactStore, config: &ForestConfig) -> Result<TrainingReport> {
    let expenses = load_ledger(conn)?;
    info!(rows = expenses.len(), "loaded ledger");
    let months = monthly_totals(&expenses);

    let (category, category_fit) = settle(ArtifactKind::Category, store, train_category(&expenses, store));
    let (prediction, prediction_basis) =
        settle(ArtifactKind::Prediction, store, train_prediction(&months, store));
    let (anomaly, anomalies_flagged) =
        settle(ArtifactKind::Anomaly, store, train_anomaly(&months, store, config));

    info!("training completed");
    Ok(TrainingReport {
        rows: expenses.len(),
        months: months.len(),
        category,
        category_fit,
        prediction,
        prediction_basis,
        anomaly,
        anomalies_flagged,
    })
}
