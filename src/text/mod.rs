//! Plain-text extraction from stored page markup
//!
//! Pages are stored as raw HTML. Indexing, snippets and result titles work on
//! the visible text, which this module extracts with `scraper`.

use scraper::{ElementRef, Html, Selector};

/// Elements whose text content is never visible
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that break the text flow; inline elements join their neighbours
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Extracts the visible body text of an HTML document
///
/// Block elements are separated by a space, inline markup is not, so a word
/// split by `<b>` stays one word. Runs of whitespace are collapsed. Documents
/// without a `<body>` (fragments, plain text) fall back to the text of the
/// whole document.
///
/// # Example
///
/// ```
/// use lexicrawl::text::clear_text;
///
/// let text = clear_text("<html><body><p>Hello</p><p>wo<b>rld</b>!</p></body></html>");
/// assert_eq!(text, "Hello world!");
/// ```
pub fn clear_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let root = match Selector::parse("body") {
        Ok(selector) => document
            .select(&selector)
            .next()
            .unwrap_or_else(|| document.root_element()),
        Err(_) => document.root_element(),
    };

    let mut raw = String::new();
    push_visible_text(root, &mut raw);

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_visible_text(element: ElementRef<'_>, text: &mut String) {
    let name = element.value().name();
    if HIDDEN_ELEMENTS.contains(&name) {
        return;
    }

    let block = BLOCK_ELEMENTS.contains(&name);
    if block {
        text.push(' ');
    }

    for child in element.children() {
        if let Some(fragment) = child.value().as_text() {
            text.push_str(fragment);
        } else if let Some(child) = ElementRef::wrap(child) {
            push_visible_text(child, text);
        }
    }

    if block {
        text.push(' ');
    }
}

/// Extracts the document title, or an empty string when there is none
pub fn page_title(html: &str) -> String {
    let document = Html::parse_document(html);

    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|element| {
            element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_text_collapses_whitespace() {
        let html = "<html><body>\n  <h1>Title</h1>\n\n<p>Some   text\there</p></body></html>";
        assert_eq!(clear_text(html), "Title Some text here");
    }

    #[test]
    fn test_clear_text_skips_head_and_scripts() {
        let html = r#"<html><head><title>Ignored</title></head>
            <body><script>var x = 1;</script><style>p { color: red; }</style><p>Visible</p></body></html>"#;
        assert_eq!(clear_text(html), "Visible");
    }

    #[test]
    fn test_clear_text_keeps_inline_markup_attached() {
        let html = "<p>Пере<b>вод</b> текста, <i>кошки</i>, и <b>Кошки</b>!</p>";
        assert_eq!(clear_text(html), "Перевод текста, кошки, и Кошки!");
    }

    #[test]
    fn test_clear_text_separates_blocks() {
        let html = "<body><ul><li>one</li><li>two</li></ul><div>three<br>four</div></body>";
        assert_eq!(clear_text(html), "one two three four");
    }

    #[test]
    fn test_clear_text_plain_text_input() {
        assert_eq!(clear_text("just words"), "just words");
    }

    #[test]
    fn test_clear_text_empty() {
        assert_eq!(clear_text(""), "");
    }

    #[test]
    fn test_clear_text_cyrillic() {
        let html = "<body><p>Привет,   мир!</p></body>";
        assert_eq!(clear_text(html), "Привет, мир!");
    }

    #[test]
    fn test_page_title() {
        let html = "<html><head><title>  My   Page </title></head><body></body></html>";
        assert_eq!(page_title(html), "My Page");
    }

    #[test]
    fn test_page_title_missing() {
        assert_eq!(page_title("<html><body>No title</body></html>"), "");
    }
}
