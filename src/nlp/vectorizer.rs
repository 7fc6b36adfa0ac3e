// src/nlp/vectorizer.rs
//! TF-IDF text vectorizer.
//!
//! Tokens are runs of two or more word characters after lower-casing. Term
//! counts are weighted by a smoothed inverse document frequency
//! `ln((1 + n) / (1 + df)) + 1` and every row is L2-normalized. The fitted
//! vocabulary and idf weights are serialized alongside the classifier so
//! serving uses exactly what training saw.

use crate::nlp::classifier::ClassifyError;
use crate::nlp::trainer::TrainError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

lazy_static::lazy_static! {
    static ref TOKEN_PATTERN: Regex = Regex::new(r"\b\w\w+\b").expect("token pattern is valid");
}

/// Sparse feature row: `(column, value)` pairs sorted by column.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    pub dim: usize,
    pub entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt()
    }
}

pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn vocabulary and idf weights from `documents`.
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Result<Self, TrainError> {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let unique: BTreeSet<&String> = tokens.iter().collect();
            for term in unique {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(TrainError::EmptyVocabulary);
        }

        let n_documents = documents.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(document_frequency.len());
        // BTreeMap iteration is sorted, so columns follow alphabetical term order.
        for (column, (term, df)) in document_frequency.into_iter().enumerate() {
            vocabulary.insert(term, column);
            idf.push(((1.0 + n_documents) / (1.0 + df as f64)).ln() + 1.0);
        }

        Ok(Self { vocabulary, idf })
    }

    pub fn fit_transform<S: AsRef<str>>(documents: &[S]) -> Result<(Self, Vec<SparseVector>), TrainError> {
        let vectorizer = Self::fit(documents)?;
        let rows = documents
            .iter()
            .map(|d| vectorizer.transform(d.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((vectorizer, rows))
    }

    /// Map `text` into the fitted feature space. Unknown terms are dropped.
    pub fn transform(&self, text: &str) -> Result<SparseVector, ClassifyError> {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(text) {
            if let Some(&column) = self.vocabulary.get(&token) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(column, count)| {
                self.idf
                    .get(column)
                    .map(|weight| (column, count * weight))
                    .ok_or(ClassifyError::ColumnOutOfRange {
                        column,
                        dim: self.idf.len(),
                    })
            })
            .collect::<Result<_, _>>()?;
        entries.sort_by_key(|(column, _)| *column);

        let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, value) in entries.iter_mut() {
                *value /= norm;
            }
        }

        Ok(SparseVector { dim: self.idf.len(), entries })
    }

    /// Reject a deserialized vectorizer whose vocabulary does not fit its idf table.
    pub fn check_shape(&self) -> Result<(), String> {
        let mut seen = vec![false; self.idf.len()];
        for (term, &column) in &self.vocabulary {
            match seen.get_mut(column) {
                None => {
                    return Err(format!(
                        "term '{}' maps to column {} but there are only {} idf weights",
                        term,
                        column,
                        self.idf.len()
                    ))
                }
                Some(true) => return Err(format!("column {} is assigned to more than one term", column)),
                Some(slot) => *slot = true,
            }
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_single_characters_and_punctuation() {
        assert_eq!(tokenize("Is it a GOOD day?"), vec!["is", "it", "good", "day"]);
        assert!(tokenize("? ! a").is_empty());
    }

    #[test]
    fn test_vocabulary_is_alphabetical() {
        let vectorizer = TfidfVectorizer::fit(&["zebra apple", "mango"]).unwrap();
        let columns: Vec<(&str, usize)> = vectorizer
            .vocabulary()
            .iter()
            .map(|(term, column)| (term.as_str(), *column))
            .collect();
        assert_eq!(columns, vec![("apple", 0), ("mango", 1), ("zebra", 2)]);
    }

    #[test]
    fn test_smoothed_idf() {
        let docs = ["open hours", "open now", "store location"];
        let vectorizer = TfidfVectorizer::fit(&docs).unwrap();
        let open = vectorizer.vocabulary()["open"];
        let store = vectorizer.vocabulary()["store"];

        // open: df = 2 -> ln(4/3) + 1, store: df = 1 -> ln(4/2) + 1
        assert!((vectorizer.idf()[open] - ((4.0f64 / 3.0).ln() + 1.0)).abs() < 1e-12);
        assert!((vectorizer.idf()[store] - (2.0f64.ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_rows_are_l2_normalized() {
        let (_, rows) = TfidfVectorizer::fit_transform(&["open hours today", "where is the store"]).unwrap();
        for row in rows {
            assert!((row.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unknown_terms_yield_zero_vector() {
        let vectorizer = TfidfVectorizer::fit(&["open hours"]).unwrap();
        let row = vectorizer.transform("completely unrelated words").unwrap();
        assert!(row.is_zero());
        assert_eq!(row.dim, 2);
    }

    #[test]
    fn test_repeated_terms_weigh_more() {
        let vectorizer = TfidfVectorizer::fit(&["rain sun", "sun"]).unwrap();
        let row = vectorizer.transform("rain rain sun").unwrap();
        let rain = vectorizer.vocabulary()["rain"];
        let sun = vectorizer.vocabulary()["sun"];
        let value = |column: usize| row.entries.iter().find(|(c, _)| *c == column).unwrap().1;
        assert!(value(rain) > value(sun));
    }

    #[test]
    fn test_out_of_range_column_is_an_error() {
        let vectorizer: TfidfVectorizer =
            serde_json::from_str(r#"{"vocabulary":{"hours":5},"idf":[1.0]}"#).unwrap();
        assert!(vectorizer.check_shape().is_err());
        assert_eq!(
            vectorizer.transform("opening hours"),
            Err(ClassifyError::ColumnOutOfRange { column: 5, dim: 1 })
        );
    }

    #[test]
    fn test_shared_column_fails_shape_check() {
        let vectorizer: TfidfVectorizer =
            serde_json::from_str(r#"{"vocabulary":{"hours":0,"open":0},"idf":[1.0,1.0]}"#).unwrap();
        assert!(vectorizer.check_shape().is_err());

        let fitted = TfidfVectorizer::fit(&["open hours"]).unwrap();
        assert!(fitted.check_shape().is_ok());
    }

    #[test]
    fn test_empty_vocabulary_is_rejected() {
        let result = TfidfVectorizer::fit(&["?", "a"]);
        assert!(matches!(result, Err(TrainError::EmptyVocabulary)));
    }
}
