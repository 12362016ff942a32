//! Russian morphology backed by the OpenCorpora dictionary
//!
//! Analysis is done by `rsmorphy`, which also predicts normal forms for words
//! missing from the dictionary. Tags are the OpenCorpora tag split into its
//! part of speech and grammemes, e.g. `NOUN,inan,femn sing,nomn` becomes
//! `["NOUN", "inan", "femn", "sing", "nomn"]`.

use crate::morphology::{DictionaryMorphology, Language, Morphology, WordForm};
use crate::MorphologyError;
use rsmorphy::prelude::*;
use std::path::Path;
use tracing::debug;

/// Russian analyzer with optional dictionary overrides
pub struct RussianMorphology {
    analyzer: MorphAnalyzer,
    overrides: Option<DictionaryMorphology>,
}

impl RussianMorphology {
    /// Loads the compiled dictionary from a directory
    ///
    /// # Errors
    ///
    /// Returns `MorphologyError::MissingDictionary` if the directory does not
    /// exist.
    pub fn load(dictionary: &Path) -> Result<Self, MorphologyError> {
        if !dictionary.is_dir() {
            return Err(MorphologyError::MissingDictionary(
                dictionary.display().to_string(),
            ));
        }

        let analyzer = MorphAnalyzer::from_file(dictionary);
        debug!("Loaded OpenCorpora dictionary from {}", dictionary.display());

        Ok(Self {
            analyzer,
            overrides: None,
        })
    }

    /// Loads the dictionary shipped with `rsmorphy-dict-ru`
    pub fn bundled() -> Result<Self, MorphologyError> {
        Self::load(Path::new(rsmorphy_dict_ru::DICT_PATH))
    }

    /// Words listed in `overrides` take their analyses from it
    pub fn with_overrides(mut self, overrides: DictionaryMorphology) -> Self {
        self.overrides = Some(overrides);
        self
    }
}

impl Morphology for RussianMorphology {
    fn language(&self) -> Language {
        Language::Russian
    }

    fn morph_info(&self, word: &str) -> Vec<WordForm> {
        if !self.check_string(word) {
            return Vec::new();
        }

        if let Some(analyses) = self.overrides.as_ref().and_then(|o| o.lookup(word)) {
            return analyses.to_vec();
        }

        self.analyzer
            .parse(word)
            .iter()
            .map(|parsed| WordForm {
                normal_form: parsed.lex.get_normal_form(&self.analyzer).to_string(),
                tags: split_tag(&parsed.lex.get_tag(&self.analyzer).string),
            })
            .collect()
    }
}

/// Splits an OpenCorpora tag string on commas and spaces
fn split_tag(tag: &str) -> Vec<String> {
    tag.split(|c: char| c == ',' || c == ' ')
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}
