//! Lemmatizer: reduces text to counts of normalized word forms
//!
//! Text is lower-cased and split on every non-letter character. Each token is
//! handed to the first morphology that recognizes its alphabet (Russian before
//! English); tokens nobody recognizes are dropped, as are tokens with any
//! analysis tagged with an excluded word class. The remaining tokens add one
//! to the count of every normal form they reduce to.

use crate::config::MorphologyConfig;
use crate::morphology::{
    DictionaryMorphology, EnglishMorphology, Language, Morphology, RussianMorphology,
};
use crate::MorphologyError;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

/// Turns text into lemma counts using a fixed list of morphologies
pub struct Lemmatizer {
    languages: Vec<Box<dyn Morphology>>,
    excluded_tags: HashSet<String>,
}

impl Lemmatizer {
    /// Creates a lemmatizer from morphologies in recognition order
    pub fn new<I, S>(languages: Vec<Box<dyn Morphology>>, excluded_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            languages,
            excluded_tags: excluded_tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds the Russian and English analyzers named in the configuration
    ///
    /// # Errors
    ///
    /// A dictionary or override file that cannot be read or parsed is an
    /// error; the caller is expected to treat it as fatal.
    pub fn from_config(config: &MorphologyConfig) -> Result<Self, MorphologyError> {
        let mut russian = RussianMorphology::load(Path::new(&config.russian_dictionary))?;
        if let Some(path) = &config.russian_overrides {
            let overrides = DictionaryMorphology::load(Language::Russian, Path::new(path))?;
            russian = russian.with_overrides(overrides);
        }

        let english = EnglishMorphology::load(config.english_overrides.as_deref().map(Path::new))?;

        info!(
            "Morphology ready: OpenCorpora dictionary at {}, {} English overrides, {} excluded tags",
            config.russian_dictionary,
            english.override_count(),
            config.excluded_tags.len()
        );

        Ok(Self::new(
            vec![Box::new(russian), Box::new(english)],
            config.excluded_tags.iter().cloned(),
        ))
    }

    /// Counts the lemmas of a text
    ///
    /// A token with several normal forms contributes one to each of them.
    ///
    /// # Example
    ///
    /// ```
    /// use lexicrawl::lemmatizer::Lemmatizer;
    /// use lexicrawl::morphology::{DictionaryMorphology, Language, Morphology};
    ///
    /// let english = DictionaryMorphology::parse(
    ///     Language::English,
    ///     "inline",
    ///     "dogs\tdog\tVERB\nthe\tthe\tARTICLE\n",
    /// )
    /// .unwrap();
    /// let languages: Vec<Box<dyn Morphology>> = vec![Box::new(english)];
    /// let lemmatizer = Lemmatizer::new(languages, ["ARTICLE"]);
    ///
    /// let lemmas = lemmatizer.lemmatize("The dogs, the DOGS!");
    /// assert_eq!(lemmas.get("dog"), Some(&2));
    /// assert!(lemmas.get("the").is_none());
    /// ```
    pub fn lemmatize(&self, text: &str) -> HashMap<String, u32> {
        let mut lemmas = HashMap::new();

        for token in tokenize(&text.to_lowercase()) {
            for form in self.token_forms(token) {
                *lemmas.entry(form).or_insert(0) += 1;
            }
        }

        lemmas
    }

    /// Returns the distinct lemmas of a single word, sorted
    ///
    /// Punctuation around or inside the word splits it the same way
    /// `lemmatize` would.
    pub fn lemma_forms(&self, word: &str) -> Vec<String> {
        let mut forms: Vec<String> = self.lemmatize(word).into_keys().collect();
        forms.sort();
        forms
    }

    /// Extracts the visible text of stored page markup
    pub fn clear_text(&self, html: &str) -> String {
        crate::text::clear_text(html)
    }

    /// Normal forms of one lower-case token, or nothing if it is filtered out
    fn token_forms(&self, token: &str) -> Vec<String> {
        let Some(morphology) = self.languages.iter().find(|m| m.check_string(token)) else {
            return Vec::new();
        };

        let excluded = morphology
            .morph_info(token)
            .iter()
            .any(|analysis| analysis.has_any_tag(&self.excluded_tags));
        if excluded {
            return Vec::new();
        }

        morphology.normal_forms(token)
    }
}

/// Splits text on runs of non-letter characters
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|token| !token.is_empty())
}
