use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, TrackerError};

/// Below this many labelled rows the classifier still trains, but with a warning.
pub const MIN_RELIABLE_ROWS: usize = 10;

const ALPHA: f64 = 1.0;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

/// Lowercased word tokens of two or more characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// A labelled training row.
#[derive(Debug, Clone)]
pub struct LabeledText {
    pub description: String,
    pub category: String,
}

/// Multinomial naive Bayes over bag-of-words counts of expense descriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryModel {
    vocabulary: BTreeMap<String, usize>,
    classes: Vec<String>,
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
    pub trained_rows: usize,
}

impl CategoryModel {
    pub fn fit(rows: &[LabeledText]) -> Result<Self> {
        if rows.is_empty() {
            return Err(TrackerError::InsufficientData(
                "no labelled descriptions to train the category model".to_string(),
            ));
        }
        if rows.len() < MIN_RELIABLE_ROWS {
            warn!(
                rows = rows.len(),
                "not enough labelled description data for a good classifier, need >= {MIN_RELIABLE_ROWS} rows"
            );
        }

        let tokenized: Vec<Vec<String>> = rows.iter().map(|r| tokenize(&r.description)).collect();

        let mut vocabulary = BTreeMap::new();
        for token in tokenized.iter().flatten() {
            vocabulary.entry(token.clone()).or_insert(0usize);
        }
        for (i, idx) in vocabulary.values_mut().enumerate() {
            *idx = i;
        }

        let classes: Vec<String> = rows
            .iter()
            .map(|r| r.category.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        let class_index: BTreeMap<&str, usize> =
            classes.iter().enumerate().map(|(i, c)| (c.as_str(), i)).collect();

        let mut class_count = vec![0usize; classes.len()];
        let mut feature_count = vec![vec![0.0f64; vocabulary.len()]; classes.len()];
        for (row, tokens) in rows.iter().zip(&tokenized) {
            let c = class_index[row.category.as_str()];
            class_count[c] += 1;
            for token in tokens {
                feature_count[c][vocabulary[token]] += 1.0;
            }
        }

        let total = rows.len() as f64;
        let class_log_prior = class_count.iter().map(|&n| (n as f64 / total).ln()).collect();
        let feature_log_prob = feature_count
            .into_iter()
            .map(|counts| {
                let denom = (counts.iter().sum::<f64>() + ALPHA * counts.len() as f64).ln();
                counts.into_iter().map(|n| (n + ALPHA).ln() - denom).collect()
            })
            .collect();

        Ok(Self {
            vocabulary,
            classes,
            class_log_prior,
            feature_log_prob,
            trained_rows: rows.len(),
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Most likely category. Unknown words are ignored, so text with no known
    /// words gets the most common category. Ties go to the first label in
    /// sorted order.
    pub fn predict(&self, description: &str) -> &str {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokenize(description) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (c, prior) in self.class_log_prior.iter().enumerate() {
            let score = prior
                + counts
                    .iter()
                    .map(|(&idx, &n)| n * self.feature_log_prob[c][idx])
                    .sum::<f64>();
            if score > best_score {
                best = c;
                best_score = score;
            }
        }
        &self.classes[best]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassFit {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// How well the model reproduces its own training rows. This is a sanity
/// check only and says nothing about accuracy on new descriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingFit {
    pub classes: Vec<ClassFit>,
    pub accuracy: f64,
    pub rows: usize,
}

pub fn training_fit(model: &CategoryModel, rows: &[LabeledText]) -> TrainingFit {
    let predictions: Vec<&str> = rows.iter().map(|r| model.predict(&r.description)).collect();

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

    let classes = model
        .classes()
        .iter()
        .map(|label| {
            let mut true_pos = 0;
            let mut predicted = 0;
            let mut support = 0;
            for (row, pred) in rows.iter().zip(&predictions) {
                let actual = row.category == *label;
                let guessed = *pred == label.as_str();
                if actual {
                    support += 1;
                }
                if guessed {
                    predicted += 1;
                }
                if actual && guessed {
                    true_pos += 1;
                }
            }
            let precision = ratio(true_pos, predicted);
            let recall = ratio(true_pos, support);
            let f1 = if precision + recall == 0.0 {
                0.0
            } else {
                2.0 * precision * recall / (precision + recall)
            };
            ClassFit {
                label: label.clone(),
                precision,
                recall,
                f1,
                support,
            }
        })
        .collect();

    let correct = rows
        .iter()
        .zip(&predictions)
        .filter(|(row, pred)| row.category == **pred)
        .count();

    TrainingFit {
        classes,
        accuracy: ratio(correct, rows.len()),
        rows: rows.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(pairs: &[(&str, &str)]) -> Vec<LabeledText> {
        pairs
            .iter()
            .map(|(d, c)| LabeledText {
                description: d.to_string(),
                category: c.to_string(),
            })
            .collect()
    }

    fn sample_rows() -> Vec<LabeledText> {
        rows(&[
            ("Lunch at cafe", "Food"),
            ("Groceries", "Food"),
            ("Dinner at restaurant", "Food"),
            ("Uber ride", "Travel"),
            ("Bus ticket", "Travel"),
            ("Train fare", "Travel"),
            ("Electricity bill", "Bills"),
            ("Water bill", "Bills"),
            ("Internet bill", "Bills"),
            ("Clothes", "Shopping"),
            ("Electronics", "Shopping"),
        ])
    }

    #[test]
    fn test_tokenize_matches_word_runs() {
        assert_eq!(tokenize("Uber ride, 2x!"), vec!["uber", "ride", "2x"]);
        assert_eq!(tokenize("a I ok"), vec!["ok"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_fit_rejects_empty_input() {
        let err = CategoryModel::fit(&[]).unwrap_err();
        assert!(matches!(err, TrackerError::InsufficientData(_)));
    }

    #[test]
    fn test_trains_below_threshold() {
        let model = CategoryModel::fit(&rows(&[("Bus ticket", "Travel")])).unwrap();
        assert_eq!(model.trained_rows, 1);
        assert_eq!(model.predict("anything"), "Travel");
    }

    #[test]
    fn test_predicts_seen_categories() {
        let model = CategoryModel::fit(&sample_rows()).unwrap();
        assert_eq!(model.predict("phone bill"), "Bills");
        assert_eq!(model.predict("train ticket"), "Travel");
        assert_eq!(model.predict("dinner"), "Food");
        assert!(model.classes().iter().any(|c| c == model.predict("electronics store")));
    }

    #[test]
    fn test_unknown_words_fall_back_to_prior() {
        let model = CategoryModel::fit(&sample_rows()).unwrap();
        // Food, Travel and Bills tie on prior; Bills sorts first.
        assert_eq!(model.predict("zzz qqq"), "Bills");
    }

    #[test]
    fn test_classes_are_sorted() {
        let model = CategoryModel::fit(&sample_rows()).unwrap();
        assert_eq!(model.classes(), &["Bills", "Food", "Shopping", "Travel"]);
    }

    #[test]
    fn test_model_survives_json() {
        let model = CategoryModel::fit(&sample_rows()).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let loaded: CategoryModel = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.predict("water bill"), "Bills");
    }

    #[test]
    fn test_training_fit_on_separable_rows() {
        let data = sample_rows();
        let model = CategoryModel::fit(&data).unwrap();
        let fit = training_fit(&model, &data);
        assert_eq!(fit.rows, data.len());
        assert_eq!(fit.accuracy, 1.0);
        let bills = fit.classes.iter().find(|c| c.label == "Bills").unwrap();
        assert_eq!(bills.support, 3);
        assert_eq!(bills.precision, 1.0);
        assert_eq!(bills.recall, 1.0);
    }

    #[test]
    fn test_training_fit_counts_misses() {
        let data = rows(&[("coffee", "Food"), ("coffee", "Food"), ("coffee", "Other")]);
        let model = CategoryModel::fit(&data).unwrap();
        let fit = training_fit(&model, &data);
        let other = fit.classes.iter().find(|c| c.label == "Other").unwrap();
        assert_eq!(other.recall, 0.0);
        assert_eq!(other.precision, 0.0);
        assert_eq!(other.f1, 0.0);
        assert!((fit.accuracy - 2.0 / 3.0).abs() < 1e-12);
    }
}
