use scraper::{ElementRef, Html, Node};

/// One unit of structured content for a remote document body.
/// Ordering is significant; a converted body is a sequence, not a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Paragraph { text: String },
    Heading { level: u8, text: String },
    Link { text: String, url: String },
    Image { url: String },
}

/// Converts an HTML fragment into an ordered sequence of content blocks.
///
/// Only the top-level children of the fragment are inspected; nested markup
/// inside a paragraph or heading is flattened into its text. Anchors become
/// standalone link blocks rather than inline links, and image support is a
/// capability the config can switch off.
pub struct HtmlBlockConverter {
    images: bool,
}

impl HtmlBlockConverter {
    pub fn new(images: bool) -> Self {
        Self { images }
    }

    /// Best-effort conversion: malformed or partial markup yields a partial
    /// or empty sequence, never an error, so a batch caller keeps going.
    pub fn convert(&self, html: &str) -> Vec<ContentBlock> {
        let fragment = Html::parse_fragment(html);
        let mut blocks = Vec::new();

        for child in fragment.root_element().children() {
            match child.value() {
                Node::Element(element) => {
                    let Some(el) = ElementRef::wrap(child) else {
                        continue;
                    };
                    match element.name() {
                        "p" => blocks.push(ContentBlock::Paragraph {
                            text: flattened_text(el).trim().to_string(),
                        }),
                        name @ ("h1" | "h2" | "h3") => blocks.push(ContentBlock::Heading {
                            level: name.as_bytes()[1] - b'0',
                            text: flattened_text(el).trim().to_string(),
                        }),
                        "a" => {
                            if let Some(href) = element.attr("href") {
                                blocks.push(ContentBlock::Link {
                                    text: flattened_text(el),
                                    url: href.to_string(),
                                });
                            } else if let Some(text) = direct_literal_text(el) {
                                blocks.push(ContentBlock::Paragraph { text });
                            }
                        }
                        "img" => {
                            if self.images {
                                if let Some(src) = element.attr("src") {
                                    blocks.push(ContentBlock::Image {
                                        url: src.to_string(),
                                    });
                                }
                            }
                        }
                        _ => {
                            if let Some(text) = direct_literal_text(el) {
                                blocks.push(ContentBlock::Paragraph { text });
                            }
                        }
                    }
                }
                Node::Text(text) => {
                    let trimmed = text.text.trim();
                    if !trimmed.is_empty() {
                        blocks.push(ContentBlock::Paragraph {
                            text: trimmed.to_string(),
                        });
                    }
                }
                _ => {}
            }
        }

        blocks
    }
}

/// Full descendant text of an element, in document order.
fn flattened_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Text attached directly to the element (not via descendants), or None
/// when there is nothing but whitespace.
fn direct_literal_text(el: ElementRef<'_>) -> Option<String> {
    let text: String = el
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(&*text.text),
            _ => None,
        })
        .collect();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
