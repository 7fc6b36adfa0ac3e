// src/nlp/trainer.rs
use crate::models::intent::IntentCatalog;
use crate::nlp::artifacts::{write_json, ArtifactError};
use crate::nlp::classifier::{argmax, ClassifyError, IntentClassifier, LogisticRegression, Prediction, TrainingParams};
use crate::nlp::vectorizer::TfidfVectorizer;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainError {
    #[error("Intents catalog is empty")]
    EmptyCatalog,
    #[error("Intent '{0}' has no patterns")]
    NoPatterns(String),
    #[error("Intent '{0}' has no responses")]
    NoResponses(String),
    #[error("Intent tag '{0}' appears more than once")]
    DuplicateTag(String),
    #[error("Need at least two intents to train a classifier, found {0}")]
    TooFewClasses(usize),
    #[error("No usable tokens in any pattern")]
    EmptyVocabulary,
    #[error("Got {rows} feature rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },
    #[error("Classification error during training: {0}")]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Parallel utterance/label sequences flattened from a catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub utterances: Vec<String>,
    pub labels: Vec<String>,
}

impl TrainingSet {
    pub fn from_catalog(catalog: &IntentCatalog) -> Self {
        let mut set = Self::default();
        for intent in &catalog.intents {
            for pattern in &intent.patterns {
                set.utterances.push(pattern.clone());
                set.labels.push(intent.tag.clone());
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub samples: usize,
    pub vocabulary_size: usize,
    pub classes: usize,
    /// Share of training utterances whose top prediction is their own tag.
    pub training_accuracy: f64,
}

pub struct TrainedModel {
    pub vectorizer: TfidfVectorizer,
    pub classifier: LogisticRegression,
    pub report: TrainingReport,
}

impl TrainedModel {
    pub fn save(&self, model_path: &Path, vectorizer_path: &Path) -> Result<(), ArtifactError> {
        write_json(model_path, &self.classifier)?;
        write_json(vectorizer_path, &self.vectorizer)?;
        tracing::info!(
            model = %model_path.display(),
            vectorizer = %vectorizer_path.display(),
            "saved model artifacts"
        );
        Ok(())
    }
}

/// Every intent needs a unique tag, a pattern and a response.
pub fn validate_catalog(catalog: &IntentCatalog) -> Result<(), TrainError> {
    if catalog.is_empty() {
        return Err(TrainError::EmptyCatalog);
    }

    let mut seen = HashSet::new();
    for intent in &catalog.intents {
        if !seen.insert(intent.tag.as_str()) {
            return Err(TrainError::DuplicateTag(intent.tag.clone()));
        }
        if intent.patterns.is_empty() {
            return Err(TrainError::NoPatterns(intent.tag.clone()));
        }
        if intent.responses.is_empty() {
            return Err(TrainError::NoResponses(intent.tag.clone()));
        }
    }
    Ok(())
}

pub fn train(catalog: &IntentCatalog, params: &TrainingParams) -> Result<TrainedModel, TrainError> {
    validate_catalog(catalog)?;

    let set = TrainingSet::from_catalog(catalog);
    tracing::info!("Training on {} patterns across {} intents", set.len(), catalog.len());

    let (vectorizer, rows) = TfidfVectorizer::fit_transform(&set.utterances)?;
    let classifier = LogisticRegression::fit(&rows, &set.labels, vectorizer.n_features(), params)?;

    let mut correct = 0usize;
    for (row, label) in rows.iter().zip(&set.labels) {
        let predicted = match classifier.predict(row)? {
            Prediction::Probabilities(probs) => argmax(&probs).map(|(i, _)| classifier.classes()[i].clone()),
            Prediction::Label(tag) => Some(tag),
        };
        if predicted.as_deref() == Some(label.as_str()) {
            correct += 1;
        }
    }

    let report = TrainingReport {
        samples: set.len(),
        vocabulary_size: vectorizer.n_features(),
        classes: classifier.classes().len(),
        training_accuracy: correct as f64 / set.len() as f64,
    };
    tracing::info!(
        samples = report.samples,
        vocabulary = report.vocabulary_size,
        classes = report.classes,
        accuracy = report.training_accuracy,
        "training finished"
    );

    Ok(TrainedModel {
        vectorizer,
        classifier,
        report,
    })
}
