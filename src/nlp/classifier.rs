// src/nlp/classifier.rs
use crate::nlp::trainer::TrainError;
use crate::nlp::vectorizer::SparseVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("Feature dimension mismatch: classifier expects {expected}, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },
    #[error("Feature column {column} out of range for {dim} features")]
    ColumnOutOfRange { column: usize, dim: usize },
    #[error("Classifier parameters are malformed: {0}")]
    MalformedModel(String),
    #[error("Classifier produced an invalid distribution: {0}")]
    InvalidDistribution(String),
}

/// What a classifier can say about a feature vector.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// One probability per entry of `IntentClassifier::classes`, same order.
    Probabilities(Vec<f64>),
    /// Best guess only, for classifiers without calibrated scores.
    Label(String),
}

/// A fitted mapping from feature vectors to intent tags.
pub trait IntentClassifier: Send + Sync {
    fn classes(&self) -> &[String];

    fn predict(&self, features: &SparseVector) -> Result<Prediction, ClassifyError>;
}

/// Hyper-parameters for fitting [`LogisticRegression`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingParams {
    /// Inverse L2 regularization strength.
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    /// Stop once the gradient norm falls below this.
    pub tol: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            learning_rate: 1.0,
            max_iter: 2000,
            tol: 1e-5,
        }
    }
}

/// Multinomial (softmax) logistic regression with an L2 penalty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    classes: Vec<String>,
    n_features: usize,
    /// `weights[k][j]` is the coefficient of feature `j` for class `k`.
    weights: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

impl LogisticRegression {
    /// Fit on `rows` with one label per row.
    ///
    /// Minimizes `(1/n) * sum(cross_entropy) + 1/(2*C*n) * ||W||^2` with
    /// full-batch gradient descent from zero weights, which is the usual
    /// `C * sum(loss) + ||W||^2 / 2` objective rescaled. Intercepts are not
    /// penalized. Classes are ordered alphabetically.
    pub fn fit(
        rows: &[SparseVector],
        labels: &[String],
        n_features: usize,
        params: &TrainingParams,
    ) -> Result<Self, TrainError> {
        if rows.len() != labels.len() {
            return Err(TrainError::LengthMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }

        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        if classes.len() < 2 {
            return Err(TrainError::TooFewClasses(classes.len()));
        }

        let targets: Vec<usize> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default())
            .collect();

        let n_classes = classes.len();
        let n = rows.len() as f64;
        let penalty = 1.0 / (params.c * n);

        let mut model = Self {
            classes,
            n_features,
            weights: vec![vec![0.0; n_features]; n_classes],
            intercepts: vec![0.0; n_classes],
        };

        for iteration in 0..params.max_iter {
            let mut grad_w = vec![vec![0.0; n_features]; n_classes];
            let mut grad_b = vec![0.0; n_classes];

            for (row, &target) in rows.iter().zip(&targets) {
                let probabilities = model.probabilities(row)?;
                for (k, p) in probabilities.iter().enumerate() {
                    let residual = p - if k == target { 1.0 } else { 0.0 };
                    grad_b[k] += residual / n;
                    for &(column, value) in &row.entries {
                        grad_w[k][column] += residual * value / n;
                    }
                }
            }

            let mut grad_norm_sq = 0.0;
            for k in 0..n_classes {
                for j in 0..n_features {
                    let g = grad_w[k][j] + penalty * model.weights[k][j];
                    grad_norm_sq += g * g;
                    model.weights[k][j] -= params.learning_rate * g;
                }
                grad_norm_sq += grad_b[k] * grad_b[k];
                model.intercepts[k] -= params.learning_rate * grad_b[k];
            }

            if grad_norm_sq.sqrt() < params.tol {
                tracing::debug!("logistic regression converged after {} iterations", iteration + 1);
                break;
            }
        }

        Ok(model)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Reject a deserialized model whose parameter tables disagree in size.
    pub fn check_shape(&self) -> Result<(), String> {
        if self.weights.len() != self.classes.len() || self.intercepts.len() != self.classes.len() {
            return Err(format!(
                "{} classes but {} weight rows and {} intercepts",
                self.classes.len(),
                self.weights.len(),
                self.intercepts.len()
            ));
        }
        if let Some((k, row)) = self.weights.iter().enumerate().find(|(_, row)| row.len() != self.n_features) {
            return Err(format!(
                "weight row {} has {} coefficients, expected {}",
                k,
                row.len(),
                self.n_features
            ));
        }
        Ok(())
    }

    fn probabilities(&self, features: &SparseVector) -> Result<Vec<f64>, ClassifyError> {
        if features.dim != self.n_features {
            return Err(ClassifyError::FeatureMismatch {
                expected: self.n_features,
                actual: features.dim,
            });
        }

        if self.weights.len() != self.intercepts.len() {
            return Err(ClassifyError::MalformedModel(format!(
                "{} weight rows for {} intercepts",
                self.weights.len(),
                self.intercepts.len()
            )));
        }

        let mut scores = self.intercepts.clone();
        for &(column, value) in &features.entries {
            if column >= self.n_features {
                return Err(ClassifyError::ColumnOutOfRange {
                    column,
                    dim: self.n_features,
                });
            }
            for (score, row) in scores.iter_mut().zip(&self.weights) {
                let weight = row.get(column).ok_or_else(|| {
                    ClassifyError::MalformedModel(format!("weight row has no coefficient for column {}", column))
                })?;
                *score += weight * value;
            }
        }

        softmax(&scores)
    }
}

impl IntentClassifier for LogisticRegression {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict(&self, features: &SparseVector) -> Result<Prediction, ClassifyError> {
        self.probabilities(features).map(Prediction::Probabilities)
    }
}

fn softmax(scores: &[f64]) -> Result<Vec<f64>, ClassifyError> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(ClassifyError::InvalidDistribution(format!("non-finite scores {:?}", scores)));
    }
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    Ok(exps.into_iter().map(|e| e / total).collect())
}

/// Index and value of the largest probability; the first one wins ties.
pub fn argmax(probabilities: &[f64]) -> Option<(usize, f64)> {
    probabilities
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, p)| match best {
            Some((_, best_p)) if best_p >= p => best,
            _ => Some((i, p)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::vectorizer::TfidfVectorizer;

    fn fitted() -> (TfidfVectorizer, LogisticRegression) {
        let utterances = [
            "what is the weather today",
            "will it rain tomorrow",
            "weather forecast please",
            "tell me a joke",
            "make me laugh",
            "say something funny",
            "when are you open",
            "what are your opening hours",
            "store hours",
        ];
        let labels: Vec<String> = ["weather", "weather", "weather", "jokes", "jokes", "jokes", "hours", "hours", "hours"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let (vectorizer, rows) = TfidfVectorizer::fit_transform(&utterances).unwrap();
        let model = LogisticRegression::fit(&rows, &labels, vectorizer.n_features(), &TrainingParams::default()).unwrap();
        (vectorizer, model)
    }

    fn best_tag(vectorizer: &TfidfVectorizer, model: &LogisticRegression, text: &str) -> String {
        match model.predict(&vectorizer.transform(text).unwrap()).unwrap() {
            Prediction::Probabilities(probs) => {
                let (index, _) = argmax(&probs).unwrap();
                model.classes()[index].clone()
            }
            Prediction::Label(tag) => tag,
        }
    }

    #[test]
    fn test_classes_are_sorted_and_unique() {
        let (_, model) = fitted();
        assert_eq!(model.classes(), &["hours", "jokes", "weather"]);
    }

    #[test]
    fn test_predicts_training_intents() {
        let (vectorizer, model) = fitted();
        assert_eq!(best_tag(&vectorizer, &model, "weather forecast"), "weather");
        assert_eq!(best_tag(&vectorizer, &model, "tell me something funny"), "jokes");
        assert_eq!(best_tag(&vectorizer, &model, "opening hours"), "hours");
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (vectorizer, model) = fitted();
        let Prediction::Probabilities(probs) = model.predict(&vectorizer.transform("rain").unwrap()).unwrap() else {
            panic!("logistic regression always yields probabilities");
        };
        assert_eq!(probs.len(), 3);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_words_give_low_confidence() {
        let (vectorizer, model) = fitted();
        let Prediction::Probabilities(probs) = model.predict(&vectorizer.transform("zzz qqq").unwrap()).unwrap() else {
            panic!("logistic regression always yields probabilities");
        };
        let (_, confidence) = argmax(&probs).unwrap();
        assert!(confidence < 0.6);
    }

    #[test]
    fn test_mismatched_features_are_an_error() {
        let (_, model) = fitted();
        let other = TfidfVectorizer::fit(&["completely different vocabulary here"]).unwrap();
        let result = model.predict(&other.transform("different").unwrap());
        assert!(matches!(result, Err(ClassifyError::FeatureMismatch { .. })));
    }

    #[test]
    fn test_short_weight_row_is_an_error_not_a_panic() {
        let model: LogisticRegression = serde_json::from_str(
            r#"{"classes":["a","b"],"n_features":2,"weights":[[0.0],[0.0,0.0]],"intercepts":[0.0,0.0]}"#,
        )
        .unwrap();
        assert!(model.check_shape().is_err());

        let features = SparseVector { dim: 2, entries: vec![(1, 1.0)] };
        assert!(matches!(model.predict(&features), Err(ClassifyError::MalformedModel(_))));
    }

    #[test]
    fn test_missing_weight_rows_fail_shape_check() {
        let model: LogisticRegression = serde_json::from_str(
            r#"{"classes":["a","b"],"n_features":2,"weights":[[0.0,0.0]],"intercepts":[0.0,0.0]}"#,
        )
        .unwrap();
        assert!(model.check_shape().is_err());

        let features = SparseVector { dim: 2, entries: vec![(0, 1.0)] };
        assert!(matches!(model.predict(&features), Err(ClassifyError::MalformedModel(_))));

        let (_, fitted) = fitted();
        assert!(fitted.check_shape().is_ok());
    }

    #[test]
    fn test_single_class_is_rejected() {
        let (vectorizer, rows) = TfidfVectorizer::fit_transform(&["hello there", "hi there"]).unwrap();
        let labels = vec!["greeting".to_string(), "greeting".to_string()];
        let result = LogisticRegression::fit(&rows, &labels, vectorizer.n_features(), &TrainingParams::default());
        assert!(matches!(result, Err(TrainError::TooFewClasses(1))));
    }

    #[test]
    fn test_argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some((1, 0.4)));
        assert_eq!(argmax(&[]), None);
    }
}
