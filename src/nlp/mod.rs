// src/nlp/mod.rs
pub mod artifacts;
pub mod classifier;
pub mod trainer;
pub mod vectorizer;
