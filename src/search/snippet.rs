//! Snippet generation
//!
//! Query matches are wrapped in `<b>…</b>` and the snippet is cut out around
//! them: each match gets an equal share of the snippet length as context on
//! both sides, overlapping windows merge, and gaps are marked with `...`.
//! All lengths are counted in characters.

use crate::lemmatizer::Lemmatizer;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

const ELLIPSIS: &str = "...";

/// A highlighted word as produced by `highlight`
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<b>[^<>]+</b>").expect("emphasis pattern is valid"));

/// Builds a highlighted snippet of `text` for the given query lemmas
pub fn build_snippet(
    text: &str,
    query_lemmas: &[String],
    lemmatizer: &Lemmatizer,
    snippet_length: usize,
) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let marked = highlight(text, query_lemmas, lemmatizer);
    cut_snippet(&marked, snippet_length)
}

/// Wraps every standalone occurrence of a matching word in `<b>…</b>`
///
/// A word matches when one of its lemma forms is a query lemma. Matching is
/// decided on the word stripped of surrounding punctuation, and only
/// whitespace-delimited tokens equal to that bare word are wrapped.
pub fn highlight(text: &str, query_lemmas: &[String], lemmatizer: &Lemmatizer) -> String {
    let query: HashSet<&str> = query_lemmas.iter().map(String::as_str).collect();
    let mut marked: HashSet<&str> = HashSet::new();

    for token in text.split_whitespace() {
        let bare = token.trim_matches(|c: char| !c.is_alphanumeric());
        if bare.is_empty() || marked.contains(bare) {
            continue;
        }

        let matches_query = lemmatizer
            .lemma_forms(token)
            .iter()
            .any(|form| query.contains(form.as_str()));
        if matches_query {
            marked.insert(bare);
        }
    }

    if marked.is_empty() {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len() + marked.len() * 7);
    for piece in text.split_inclusive(char::is_whitespace) {
        let token = piece.trim_end_matches(char::is_whitespace);
        let separator = &piece[token.len()..];

        if marked.contains(token) {
            result.push_str("<b>");
            result.push_str(token);
            result.push_str("</b>");
        } else {
            result.push_str(token);
        }
        result.push_str(separator);
    }

    result
}

/// Cuts a snippet of roughly `snippet_length` characters around `<b>` spans
///
/// Returns an empty string when the text has no highlighted span.
pub fn cut_snippet(marked: &str, snippet_length: usize) -> String {
    let chars: Vec<char> = marked.chars().collect();
    let spans: Vec<(usize, usize)> = EMPHASIS
        .find_iter(marked)
        .map(|m| (char_index(marked, m.start()), char_index(marked, m.end())))
        .collect();

    if spans.is_empty() {
        return String::new();
    }

    let len = chars.len();
    let window = snippet_length / spans.len() / 2;

    let mut body = String::new();
    let mut first_from: Option<usize> = None;
    let mut from = 0;
    let mut to = 0;
    let mut previous_to: Option<usize> = None;

    for (start, end) in spans {
        from = from.max(start.saturating_sub(window));
        to = len.min(end + window);

        if let Some(previous) = previous_to {
            if from <= previous {
                from = previous;
            } else {
                body.push_str(ELLIPSIS);
            }
        }
        first_from.get_or_insert(from);

        body.extend(&chars[from..to.max(from)]);
        previous_to = Some(to.max(from));
    }

    let mut start = first_from.unwrap_or(0);
    let mut end = previous_to.unwrap_or(to);
    let mut prefix = String::new();
    let mut suffix = String::new();

    let body_length = body.chars().count();
    if body_length < snippet_length {
        let adding = (snippet_length - body_length) / 2;

        let padded_start = start.saturating_sub(adding);
        prefix.extend(&chars[padded_start..start]);
        start = padded_start;

        let padded_end = len.min(end + adding);
        suffix.extend(&chars[end..padded_end]);
        end = padded_end;
    }

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.push_str(&prefix);
    snippet.push_str(&body);
    snippet.push_str(&suffix);
    if end < len {
        snippet.push_str(ELLIPSIS);
    }

    snippet
}

fn char_index(text: &str, byte_index: usize) -> usize {
    text[..byte_index].chars().count()
}
