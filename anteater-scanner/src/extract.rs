use scraper::{Html, Node, Selector};

/// Text and anchors pulled out of one HTML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Visible text with runs of whitespace collapsed to single spaces.
    pub text: String,
    /// `href` of every `<a>` element in document order; `None` when the
    /// attribute is missing.
    pub hrefs: Vec<Option<String>>,
}

// Elements whose text content never renders.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    let mut chunks = Vec::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            chunks.push(&**text);
        }
    }
    let text = chunks
        .iter()
        .flat_map(|chunk| chunk.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");

    let hrefs = match Selector::parse("a") {
        Ok(selector) => document
            .select(&selector)
            .map(|el| el.value().attr("href").map(str::to_string))
            .collect(),
        Err(_) => Vec::new(),
    };

    ParsedPage { text, hrefs }
}
