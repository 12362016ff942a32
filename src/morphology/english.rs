//! English morphology: Snowball stemming behind an override dictionary

use crate::morphology::{DictionaryMorphology, Language, Morphology, WordForm};
use crate::MorphologyError;
use rust_stemmers::{Algorithm, Stemmer};
use std::path::Path;

const BUILTIN_OVERRIDES: &str = include_str!("../../dictionaries/english.dict");

/// English analyzer
///
/// Words listed in the override dictionary (function words and irregular
/// forms) take their analyses from it. Every other word reduces to its
/// Snowball stem and carries no tags.
pub struct EnglishMorphology {
    stemmer: Stemmer,
    overrides: DictionaryMorphology,
}

impl EnglishMorphology {
    pub fn new(overrides: DictionaryMorphology) -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
            overrides,
        }
    }

    /// Uses the override list compiled into the binary
    pub fn builtin() -> Result<Self, MorphologyError> {
        let overrides =
            DictionaryMorphology::parse(Language::English, "built-in overrides", BUILTIN_OVERRIDES)?;
        Ok(Self::new(overrides))
    }

    /// Loads overrides from a file, or falls back to the built-in list
    pub fn load(overrides: Option<&Path>) -> Result<Self, MorphologyError> {
        match overrides {
            Some(path) => Ok(Self::new(DictionaryMorphology::load(Language::English, path)?)),
            None => Self::builtin(),
        }
    }

    /// Number of words with overridden analyses
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl Morphology for EnglishMorphology {
    fn language(&self) -> Language {
        Language::English
    }

    fn morph_info(&self, word: &str) -> Vec<WordForm> {
        if !self.check_string(word) {
            return Vec::new();
        }

        match self.overrides.lookup(word) {
            Some(analyses) => analyses.to_vec(),
            None => vec![WordForm {
                normal_form: self.stemmer.stem(word).into_owned(),
                tags: Vec::new(),
            }],
        }
    }
}
