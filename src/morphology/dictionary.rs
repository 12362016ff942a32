//! Dictionary-backed morphology
//!
//! Dictionary files are UTF-8 text with one analysis per line:
//!
//! ```text
//! # comment
//! form<TAB>normal form<TAB>TAG [grammemes...]
//! ```
//!
//! A form listed on several lines is ambiguous and gets every analysis. Used on
//! its own, a word written in the alphabet but missing from the dictionary is
//! treated as its own normal form with no tags. The analyzers for real text
//! consult a dictionary through `lookup` before falling back to their own
//! analysis.

use crate::morphology::{Language, Morphology, WordForm};
use crate::MorphologyError;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// A morphology that looks words up in an in-memory dictionary
#[derive(Debug, Clone)]
pub struct DictionaryMorphology {
    language: Language,
    entries: HashMap<String, Vec<WordForm>>,
}

impl DictionaryMorphology {
    /// Loads a dictionary file for the given language
    ///
    /// # Errors
    ///
    /// Returns `MorphologyError::Io` if the file cannot be read,
    /// `MorphologyError::Malformed` for a bad line and `MorphologyError::Empty`
    /// when the file has no entries.
    pub fn load(language: Language, path: &Path) -> Result<Self, MorphologyError> {
        let source_name = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| MorphologyError::Io {
            path: source_name.clone(),
            source,
        })?;

        let morphology = Self::parse(language, &source_name, &text)?;
        debug!(
            "Loaded {} {} dictionary forms from {}",
            morphology.len(),
            language,
            source_name
        );
        Ok(morphology)
    }

    /// Parses dictionary text
    ///
    /// `source_name` is only used in error messages.
    pub fn parse(
        language: Language,
        source_name: &str,
        text: &str,
    ) -> Result<Self, MorphologyError> {
        let mut entries: HashMap<String, Vec<WordForm>> = HashMap::new();

        for (index, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let malformed = |message: String| MorphologyError::Malformed {
                source_name: source_name.to_string(),
                line: index + 1,
                message,
            };

            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            if fields.len() != 3 {
                return Err(malformed(format!(
                    "expected 3 tab-separated fields, found {}",
                    fields.len()
                )));
            }

            let form = fields[0].to_lowercase();
            let normal_form = fields[1].to_lowercase();
            let tags: Vec<String> = fields[2].split_whitespace().map(String::from).collect();

            if !language.accepts(&form) {
                return Err(malformed(format!(
                    "form '{}' is not written in the {} alphabet",
                    form, language
                )));
            }
            if normal_form.is_empty() {
                return Err(malformed("normal form is empty".to_string()));
            }
            if tags.is_empty() {
                return Err(malformed(format!("form '{}' has no tags", form)));
            }

            let analyses = entries.entry(form).or_default();
            let analysis = WordForm { normal_form, tags };
            if !analyses.contains(&analysis) {
                analyses.push(analysis);
            }
        }

        if entries.is_empty() {
            return Err(MorphologyError::Empty(source_name.to_string()));
        }

        Ok(Self { language, entries })
    }

    /// Returns the listed analyses of a lower-case word
    pub fn lookup(&self, word: &str) -> Option<&[WordForm]> {
        self.entries.get(word).map(Vec::as_slice)
    }

    /// Number of distinct forms in the dictionary
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Morphology for DictionaryMorphology {
    fn language(&self) -> Language {
        self.language
    }

    fn morph_info(&self, word: &str) -> Vec<WordForm> {
        if !self.check_string(word) {
            return Vec::new();
        }

        match self.lookup(word) {
            Some(analyses) => analyses.to_vec(),
            None => vec![WordForm {
                normal_form: word.to_string(),
                tags: Vec::new(),
            }],
        }
    }
}
