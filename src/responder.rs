// src/responder.rs
//! Turns a user message into a reply.
//!
//! Resolution runs in a fixed order:
//! 1. keyword shortcuts (greeting, farewell, gratitude) by substring match,
//! 2. the statistical classifier, trusted only above [`CONFIDENCE_THRESHOLD`],
//! 3. a generic fallback.
//!
//! Classification failures never escape: they are logged and answered with
//! [`CANNOT_PROCESS`].

use crate::models::intent::IntentCatalog;
use crate::nlp::artifacts::ModelArtifacts;
use crate::nlp::classifier::{argmax, ClassifyError, Prediction};
use rand::seq::SliceRandom;
use rand::Rng;

pub const CONFIDENCE_THRESHOLD: f64 = 0.6;

pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that.";
pub const CANNOT_PROCESS: &str = "Sorry, I cannot process this message right now.";

pub const GREETING_KEYWORDS: &[&str] = &["hello", "hi", "hey"];
pub const GREETING_REPLIES: &[&str] = &["Hello!", "Hi there!", "Hey!"];

pub const FAREWELL_KEYWORDS: &[&str] = &["bye", "goodbye", "see you"];
pub const FAREWELL_REPLIES: &[&str] = &["Goodbye!", "See you later!", "Bye!"];

pub const GRATITUDE_KEYWORDS: &[&str] = &["thank", "thanks"];
pub const GRATITUDE_REPLIES: &[&str] = &["You're welcome!", "No problem!", "My pleasure!"];

/// Which rule produced a reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplySource {
    Greeting,
    Farewell,
    Gratitude,
    Intent { tag: String, confidence: Option<f64> },
    LowConfidence { tag: String, confidence: f64 },
    UnmatchedTag(String),
    Unavailable,
    ClassifierError,
}

impl ReplySource {
    pub fn label(&self) -> &'static str {
        match self {
            ReplySource::Greeting => "greeting",
            ReplySource::Farewell => "farewell",
            ReplySource::Gratitude => "gratitude",
            ReplySource::Intent { .. } => "intent",
            ReplySource::LowConfidence { .. } => "low_confidence",
            ReplySource::UnmatchedTag(_) => "unmatched_tag",
            ReplySource::Unavailable => "unavailable",
            ReplySource::ClassifierError => "classifier_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    fn new(text: impl Into<String>, source: ReplySource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}

struct Guess {
    tag: String,
    confidence: Option<f64>,
}

pub struct Responder {
    catalog: IntentCatalog,
    model: Option<ModelArtifacts>,
}

impl Responder {
    pub fn new(catalog: IntentCatalog, model: Option<ModelArtifacts>) -> Self {
        Self { catalog, model }
    }

    /// Whether the statistical tier can run at all.
    pub fn is_model_available(&self) -> bool {
        self.model.is_some() && !self.catalog.is_empty()
    }

    pub fn catalog(&self) -> &IntentCatalog {
        &self.catalog
    }

    /// Classifier labels with no intent in the loaded catalog.
    pub fn unmatched_labels(&self) -> Vec<&str> {
        match &self.model {
            Some(model) => model
                .classifier
                .classes()
                .iter()
                .filter(|tag| self.catalog.find(tag).is_none())
                .map(String::as_str)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn respond<R: Rng + ?Sized>(&self, message: &str, rng: &mut R) -> Reply {
        let normalized = message.trim().to_lowercase();

        if let Some((replies, source)) = keyword_replies(&normalized) {
            return Reply::new(pick(replies, rng), source);
        }

        let model = match &self.model {
            Some(model) if !self.catalog.is_empty() => model,
            _ => return Reply::new(NOT_UNDERSTOOD, ReplySource::Unavailable),
        };

        let guess = match guess_intent(model, message) {
            Ok(guess) => guess,
            Err(e) => {
                tracing::error!(error = %e, "intent classification failed");
                return Reply::new(CANNOT_PROCESS, ReplySource::ClassifierError);
            }
        };

        if let Some(confidence) = guess.confidence {
            if confidence < CONFIDENCE_THRESHOLD {
                tracing::debug!("low confidence {:.3} for intent '{}'", confidence, guess.tag);
                return Reply::new(
                    NOT_UNDERSTOOD,
                    ReplySource::LowConfidence {
                        tag: guess.tag,
                        confidence,
                    },
                );
            }
        }

        match self.catalog.find(&guess.tag).and_then(|intent| intent.responses.choose(rng)) {
            Some(response) => Reply::new(
                response.clone(),
                ReplySource::Intent {
                    tag: guess.tag,
                    confidence: guess.confidence,
                },
            ),
            None => {
                tracing::warn!("classifier picked '{}' but no loaded intent answers it", guess.tag);
                Reply::new(NOT_UNDERSTOOD, ReplySource::UnmatchedTag(guess.tag))
            }
        }
    }
}

fn keyword_replies(normalized: &str) -> Option<(&'static [&'static str], ReplySource)> {
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| normalized.contains(k));

    if contains_any(GREETING_KEYWORDS) {
        Some((GREETING_REPLIES, ReplySource::Greeting))
    } else if contains_any(FAREWELL_KEYWORDS) {
        Some((FAREWELL_REPLIES, ReplySource::Farewell))
    } else if contains_any(GRATITUDE_KEYWORDS) {
        Some((GRATITUDE_REPLIES, ReplySource::Gratitude))
    } else {
        None
    }
}

fn guess_intent(model: &ModelArtifacts, message: &str) -> Result<Guess, ClassifyError> {
    let features = model.vectorizer.transform(message)?;
    match model.classifier.predict(&features)? {
        Prediction::Probabilities(probs) => {
            let classes = model.classifier.classes();
            if probs.len() != classes.len() {
                return Err(ClassifyError::InvalidDistribution(format!(
                    "{} probabilities for {} classes",
                    probs.len(),
                    classes.len()
                )));
            }
            let (index, confidence) = argmax(&probs)
                .ok_or_else(|| ClassifyError::InvalidDistribution("empty distribution".to_string()))?;
            Ok(Guess {
                tag: classes[index].clone(),
                confidence: Some(confidence),
            })
        }
        Prediction::Label(tag) => Ok(Guess { tag, confidence: None }),
    }
}

fn pick<R: Rng + ?Sized>(choices: &[&str], rng: &mut R) -> String {
    choices.choose(rng).copied().unwrap_or(NOT_UNDERSTOOD).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::intent::Intent;
    use crate::nlp::classifier::{IntentClassifier, LogisticRegression, TrainingParams};
    use crate::nlp::trainer;
    use crate::nlp::vectorizer::{SparseVector, TfidfVectorizer};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Classifier that answers every query with a fixed prediction.
    struct FixedClassifier {
        classes: Vec<String>,
        outcome: Result<Prediction, ClassifyError>,
    }

    impl IntentClassifier for FixedClassifier {
        fn classes(&self) -> &[String] {
            &self.classes
        }

        fn predict(&self, _features: &SparseVector) -> Result<Prediction, ClassifyError> {
            self.outcome.clone()
        }
    }

    fn catalog() -> IntentCatalog {
        IntentCatalog::new(vec![
            Intent::new(
                "hours",
                &["When are you open?", "What are your opening hours?", "What time do you close?"],
                &["We open at 9.", "Doors open at 9am."],
            ),
            Intent::new(
                "location",
                &["Where are you located?", "What is your address?", "Directions to the shop"],
                &["12 Market Street."],
            ),
            Intent::new(
                "jokes",
                &["Tell me a joke", "Make me laugh", "Say something funny"],
                &["Knock knock."],
            ),
        ])
    }

    fn fixed(classes: &[&str], outcome: Result<Prediction, ClassifyError>) -> Responder {
        let vectorizer = TfidfVectorizer::fit(&["open hours", "tell joke"]).unwrap();
        fixed_with(vectorizer, classes, outcome)
    }

    fn fixed_with(
        vectorizer: TfidfVectorizer,
        classes: &[&str],
        outcome: Result<Prediction, ClassifyError>,
    ) -> Responder {
        let classifier = FixedClassifier {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            outcome,
        };
        Responder::new(catalog(), Some(ModelArtifacts::new(vectorizer, Box::new(classifier))))
    }

    fn trained() -> Responder {
        let model = trainer::train(&catalog(), &TrainingParams::default()).unwrap();
        Responder::new(catalog(), Some(ModelArtifacts::new(model.vectorizer, Box::new(model.classifier))))
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_greetings_win_regardless_of_model() {
        let responders = [
            Responder::new(IntentCatalog::default(), None),
            fixed(&["hours"], Err(ClassifyError::InvalidDistribution("boom".into()))),
            trained(),
        ];
        for responder in &responders {
            for message in ["Hello", "  HEY there ", "oh hi, what are your opening hours?"] {
                let reply = responder.respond(message, &mut rng());
                assert_eq!(reply.source, ReplySource::Greeting);
                assert!(GREETING_REPLIES.contains(&reply.text.as_str()));
            }
        }
    }

    #[test]
    fn test_keyword_tiers_in_order() {
        let responder = Responder::new(IntentCatalog::default(), None);

        let farewell = responder.respond("ok goodbye", &mut rng());
        assert_eq!(farewell.source, ReplySource::Farewell);
        assert!(FAREWELL_REPLIES.contains(&farewell.text.as_str()));

        let thanks = responder.respond("Thank you so much", &mut rng());
        assert_eq!(thanks.source, ReplySource::Gratitude);
        assert!(GRATITUDE_REPLIES.contains(&thanks.text.as_str()));

        // greeting beats farewell when both appear
        let both = responder.respond("hello and bye", &mut rng());
        assert_eq!(both.source, ReplySource::Greeting);
    }

    #[test]
    fn test_keywords_match_substrings() {
        let responder = Responder::new(IntentCatalog::default(), None);
        // "this" contains "hi"
        assert_eq!(responder.respond("is this open", &mut rng()).source, ReplySource::Greeting);
    }

    #[test]
    fn test_same_seed_same_reply() {
        let responder = Responder::new(IntentCatalog::default(), None);
        let first = responder.respond("hello", &mut StdRng::seed_from_u64(42));
        let second = responder.respond("hello", &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_low_confidence_is_not_understood() {
        let responder = fixed(&["hours", "jokes", "location"], Ok(Prediction::Probabilities(vec![0.59, 0.3, 0.11])));
        let reply = responder.respond("what time", &mut rng());
        assert_eq!(reply.text, NOT_UNDERSTOOD);
        assert!(matches!(reply.source, ReplySource::LowConfidence { ref tag, .. } if tag == "hours"));
    }

    #[test]
    fn test_confident_prediction_uses_intent_responses() {
        let responder = fixed(&["hours", "jokes", "location"], Ok(Prediction::Probabilities(vec![0.1, 0.2, 0.7])));
        let reply = responder.respond("where do I go", &mut rng());
        assert_eq!(reply.text, "12 Market Street.");
        assert_eq!(
            reply.source,
            ReplySource::Intent {
                tag: "location".to_string(),
                confidence: Some(0.7)
            }
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let responder = fixed(&["jokes", "hours"], Ok(Prediction::Probabilities(vec![0.6, 0.4])));
        assert_eq!(responder.respond("funny", &mut rng()).text, "Knock knock.");
    }

    #[test]
    fn test_unmatched_tag_is_not_understood() {
        let responder = fixed(&["weather", "hours"], Ok(Prediction::Probabilities(vec![0.9, 0.1])));
        let reply = responder.respond("will it rain", &mut rng());
        assert_eq!(reply.text, NOT_UNDERSTOOD);
        assert_eq!(reply.source, ReplySource::UnmatchedTag("weather".to_string()));
        assert_eq!(responder.unmatched_labels(), vec!["weather"]);
    }

    #[test]
    fn test_label_only_classifier_skips_threshold() {
        let responder = fixed(&["hours"], Ok(Prediction::Label("hours".to_string())));
        let reply = responder.respond("open?", &mut rng());
        assert!(["We open at 9.", "Doors open at 9am."].contains(&reply.text.as_str()));

        let unknown = fixed(&["hours"], Ok(Prediction::Label("weather".to_string())));
        assert_eq!(unknown.respond("rain?", &mut rng()).text, NOT_UNDERSTOOD);
    }

    #[test]
    fn test_classifier_error_cannot_process() {
        let responder = fixed(
            &["hours"],
            Err(ClassifyError::FeatureMismatch {
                expected: 10,
                actual: 2,
            }),
        );
        let reply = responder.respond("opening times", &mut rng());
        assert_eq!(reply.text, CANNOT_PROCESS);
        assert_eq!(reply.source, ReplySource::ClassifierError);
    }

    #[test]
    fn test_corrupt_parameters_cannot_process() {
        let vectorizer: TfidfVectorizer =
            serde_json::from_str(r#"{"vocabulary":{"hours":0,"open":1},"idf":[1.0,1.0]}"#).unwrap();
        let classifier: LogisticRegression = serde_json::from_str(
            r#"{"classes":["hours","jokes"],"n_features":2,"weights":[[0.0]],"intercepts":[0.0,0.0]}"#,
        )
        .unwrap();
        let responder = Responder::new(catalog(), Some(ModelArtifacts::new(vectorizer, Box::new(classifier))));

        let reply = responder.respond("open now", &mut rng());
        assert_eq!(reply.text, CANNOT_PROCESS);
        assert_eq!(reply.source, ReplySource::ClassifierError);

        let vectorizer: TfidfVectorizer = serde_json::from_str(r#"{"vocabulary":{"open":5},"idf":[1.0]}"#).unwrap();
        let responder = fixed_with(vectorizer, &["hours"], Ok(Prediction::Label("hours".to_string())));
        let reply = responder.respond("open now", &mut rng());
        assert_eq!(reply.text, CANNOT_PROCESS);
    }

    #[test]
    fn test_malformed_distribution_cannot_process() {
        let responder = fixed(&["hours", "jokes"], Ok(Prediction::Probabilities(vec![1.0])));
        assert_eq!(responder.respond("opening times", &mut rng()).text, CANNOT_PROCESS);
    }

    #[test]
    fn test_without_model_everything_else_falls_back() {
        let responder = Responder::new(catalog(), None);
        assert!(!responder.is_model_available());
        for message in ["What are your opening hours?", "Tell me a joke", "???"] {
            let reply = responder.respond(message, &mut rng());
            assert!(reply.text == NOT_UNDERSTOOD || reply.text == CANNOT_PROCESS);
        }
    }

    #[test]
    fn test_empty_catalog_disables_statistical_tier() {
        let model = trainer::train(&catalog(), &TrainingParams::default()).unwrap();
        let responder = Responder::new(
            IntentCatalog::default(),
            Some(ModelArtifacts::new(model.vectorizer, Box::new(model.classifier))),
        );
        assert!(!responder.is_model_available());
        let reply = responder.respond("Tell me a joke", &mut rng());
        assert_eq!(reply.source, ReplySource::Unavailable);
    }

    #[test]
    fn test_trained_model_replies_are_intent_or_not_understood() {
        let responder = trained();
        let catalog = catalog();
        let reply = responder.respond("Tell me a joke", &mut rng());
        match reply.source {
            ReplySource::Intent { ref tag, confidence } => {
                assert_eq!(tag, "jokes");
                assert!(confidence.unwrap() >= CONFIDENCE_THRESHOLD);
                assert!(catalog.find("jokes").unwrap().responses.contains(&reply.text));
            }
            ReplySource::LowConfidence { ref tag, confidence } => {
                assert_eq!(tag, "jokes");
                assert!(confidence < CONFIDENCE_THRESHOLD);
                assert_eq!(reply.text, NOT_UNDERSTOOD);
            }
            other => panic!("unexpected source {:?}", other),
        }
    }
}
