// src/nlp/artifacts.rs
use crate::nlp::classifier::{IntentClassifier, LogisticRegression};
use crate::nlp::vectorizer::TfidfVectorizer;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Corrupt artifact {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("Vectorizer has {vectorizer} features but classifier expects {classifier}")]
    Mismatch { vectorizer: usize, classifier: usize },
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let file = File::open(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let io_err = |source: std::io::Error| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_err)
}

/// A vectorizer and classifier that were fitted together.
pub struct ModelArtifacts {
    pub vectorizer: TfidfVectorizer,
    pub classifier: Box<dyn IntentClassifier>,
}

impl ModelArtifacts {
    pub fn new(vectorizer: TfidfVectorizer, classifier: Box<dyn IntentClassifier>) -> Self {
        Self { vectorizer, classifier }
    }

    /// Load both artifacts, rejecting malformed tables and a pair whose
    /// feature spaces disagree.
    pub fn load(model_path: &Path, vectorizer_path: &Path) -> Result<Self, ArtifactError> {
        let classifier: LogisticRegression = read_json(model_path)?;
        classifier.check_shape().map_err(|reason| ArtifactError::Corrupt {
            path: model_path.to_path_buf(),
            reason,
        })?;
        let vectorizer: TfidfVectorizer = read_json(vectorizer_path)?;
        vectorizer.check_shape().map_err(|reason| ArtifactError::Corrupt {
            path: vectorizer_path.to_path_buf(),
            reason,
        })?;

        if classifier.n_features() != vectorizer.n_features() {
            return Err(ArtifactError::Mismatch {
                vectorizer: vectorizer.n_features(),
                classifier: classifier.n_features(),
            });
        }

        Ok(Self::new(vectorizer, Box::new(classifier)))
    }
}
