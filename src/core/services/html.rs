//! Text extraction from scraped pages.

use scraper::{ElementRef, Html, Node};

/// Text of an element with `<br>` turned into newlines. Children marked
/// `data-exclude-from-selection` are skipped.
pub fn text_with_breaks(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_text(element, &mut out);
    out
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if el.name() == "br" {
                    out.push('\n');
                    continue;
                }
                if el.attr("data-exclude-from-selection") == Some("true") {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    push_text(child_el, out);
                    if matches!(el.name(), "p" | "div") {
                        out.push('\n');
                    }
                }
            }
            _ => {}
        }
    }
}

/// Decode entities in a markup fragment and return its text.
pub fn fragment_text(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect::<String>()
}
