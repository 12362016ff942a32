//! Per-language morphological analysis
//!
//! A morphology answers three questions about a lower-case word: whether it is
//! written in the language's alphabet, which analyses (normal form plus tags)
//! it has, and which normal forms it reduces to.
//!
//! # Components
//!
//! - `Language`: the supported languages and their alphabets
//! - `Morphology`: the analyzer interface used by the lemmatizer
//! - `RussianMorphology`: OpenCorpora analysis via `rsmorphy`
//! - `EnglishMorphology`: Snowball stemming with function-word overrides
//! - `DictionaryMorphology`: a plain-text dictionary, used for overrides and
//!   in tests

mod dictionary;
mod english;
mod russian;

pub use dictionary::DictionaryMorphology;
pub use english::EnglishMorphology;
pub use russian::RussianMorphology;

use std::fmt;

/// Languages the lemmatizer can recognize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Russian,
    English,
}

impl Language {
    /// Returns true if `c` is a lower-case letter of this language's alphabet
    pub fn alphabet_contains(&self, c: char) -> bool {
        match self {
            Self::Russian => matches!(c, 'а'..='я' | 'ё'),
            Self::English => c.is_ascii_lowercase(),
        }
    }

    /// Returns true if the word is non-empty and written entirely in this alphabet
    pub fn accepts(&self, word: &str) -> bool {
        !word.is_empty() && word.chars().all(|c| self.alphabet_contains(c))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Russian => "russian",
            Self::English => "english",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One morphological analysis of a word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordForm {
    /// The dictionary (normal) form
    pub normal_form: String,

    /// Part-of-speech tag followed by grammemes; empty for unknown words
    pub tags: Vec<String>,
}

impl WordForm {
    pub fn has_any_tag(&self, tags: &std::collections::HashSet<String>) -> bool {
        self.tags.iter().any(|tag| tags.contains(tag))
    }
}

/// Morphological analyzer for a single language
///
/// Implementations are shared between crawl and search tasks.
pub trait Morphology: Send + Sync {
    /// The language this analyzer handles
    fn language(&self) -> Language;

    /// Returns true if the word can be analyzed by this morphology
    fn check_string(&self, word: &str) -> bool {
        self.language().accepts(word)
    }

    /// Returns every analysis of the word
    ///
    /// Words outside the alphabet have no analyses.
    fn morph_info(&self, word: &str) -> Vec<WordForm>;

    /// Returns the distinct normal forms of the word, in analysis order
    fn normal_forms(&self, word: &str) -> Vec<String> {
        let mut forms: Vec<String> = Vec::new();
        for analysis in self.morph_info(word) {
            if !forms.contains(&analysis.normal_form) {
                forms.push(analysis.normal_form);
            }
        }
        forms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_russian_alphabet() {
        assert!(Language::Russian.accepts("ёжик"));
        assert!(Language::Russian.accepts("кошка"));
        assert!(!Language::Russian.accepts("cat"));
        assert!(!Language::Russian.accepts("кошkа"));
        assert!(!Language::Russian.accepts(""));
    }

    #[test]
    fn test_english_alphabet() {
        assert!(Language::English.accepts("cat"));
        assert!(!Language::English.accepts("Cat"));
        assert!(!Language::English.accepts("кот"));
        assert!(!Language::English.accepts("café"));
    }

    #[test]
    fn test_has_any_tag_matches_whole_tags() {
        let form = WordForm {
            normal_form: "мой".to_string(),
            tags: vec!["ADJF".to_string(), "Apro".to_string()],
        };

        let partial: HashSet<String> = ["Apr".to_string()].into_iter().collect();
        assert!(!form.has_any_tag(&partial));

        let adjectival: HashSet<String> = ["Apro".to_string()].into_iter().collect();
        assert!(form.has_any_tag(&adjectival));
    }
}
