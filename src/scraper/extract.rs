// Copyright 2026 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::FetchConfig;

/// Elements whose text is never part of page content
const STRIPPED_TAGS: [&str; 5] = ["script", "style", "nav", "header", "footer"];

/// Elements that end a line of text when closed
const BLOCK_TAGS: [&str; 24] = [
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "td", "th",
    "table", "section", "article", "main", "aside", "blockquote", "pre", "dd", "dt",
];

const FORM_DOMAINS: [&str; 6] = [
    "forms.microsoft.com",
    "forms.office.com",
    "docs.google.com",
    "typeform.com",
    "surveymonkey.com",
    "jotform.com",
];

const APPLICATION_WORDS: [&str; 5] = ["apply", "application", "register", "enroll", "form"];

const MAX_LINKS: usize = 5;

/// Call-to-action link found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLink {
    pub text: String,
    pub url: String,
}

/// Turns raw HTML into the title-prefixed plain text stored per section
pub struct HtmlExtractor {
    selectors: Vec<Selector>,
    min_content_chars: usize,
    min_body_chars: usize,
    content_max_chars: usize,
    extract_links: bool,
}

impl HtmlExtractor {
    pub fn new(config: &FetchConfig) -> Self {
        let selectors = config
            .content_selectors
            .iter()
            .filter_map(|s| match Selector::parse(s) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    tracing::warn!(selector = %s, error = %e, "Ignoring invalid content selector");
                    None
                }
            })
            .collect();

        Self {
            selectors,
            min_content_chars: config.min_content_chars,
            min_body_chars: config.min_body_chars,
            content_max_chars: config.content_max_chars,
            extract_links: config.extract_links,
        }
    }

    /// Extract `"{title}\n\n{text}"`; `None` when the page has no usable text
    pub fn extract(&self, html: &str, page_url: Option<&Url>) -> Option<String> {
        let document = Html::parse_document(html);

        let links = if self.extract_links {
            extract_external_links(&document, page_url)
        } else {
            Vec::new()
        };

        let title = extract_title(&document);
        let content = self.extract_main_content(&document);
        if content.is_empty() {
            return None;
        }

        let mut output = format!(
            "{}\n\n{}",
            title,
            truncate_chars(&content, self.content_max_chars)
        );

        if !links.is_empty() {
            output.push_str("\n\nExternal Links:");
            for link in &links {
                output.push_str(&format!("\n• {}: {}", link.text, link.url));
            }
        }

        Some(output)
    }

    /// First selector with substantial text wins, otherwise the whole body
    /// when it is longer than `min_body_chars`
    fn extract_main_content(&self, document: &Html) -> String {
        for selector in &self.selectors {
            let text = document
                .select(selector)
                .map(|el| clean_text(&element_text(el)))
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            if text.chars().count() > self.min_content_chars {
                return text;
            }
        }

        let body = Selector::parse("body")
            .ok()
            .and_then(|sel| document.select(&sel).next())
            .unwrap_or_else(|| document.root_element());
        let text = clean_text(&element_text(body));
        if text.chars().count() > self.min_body_chars {
            text
        } else {
            String::new()
        }
    }
}

/// `<title>`, then first `<h1>`, then "Untitled"
fn extract_title(document: &Html) -> String {
    for tag in ["title", "h1"] {
        let Ok(selector) = Selector::parse(tag) else {
            continue;
        };
        if let Some(el) = document.select(&selector).next() {
            let title = el.text().collect::<Vec<_>>().join(" ");
            let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
            if !title.is_empty() {
                return title;
            }
        }
    }
    "Untitled".to_string()
}

/// Text of an element, skipping stripped subtrees; block ends break lines, inline ends add a space
fn element_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if STRIPPED_TAGS.contains(&name) {
        return;
    }

    for child in element.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            collect_text(child_el, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }

    if BLOCK_TAGS.contains(&name) {
        out.push('\n');
    } else {
        out.push(' ');
    }
}

/// Collapse whitespace and drop noise fragments of two characters or fewer
pub fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > 2)
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_external_links(document: &Html, page_url: Option<&Url>) -> Vec<ExternalLink> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        let text = anchor
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");

        if href.is_empty() || text.chars().count() <= 3 || text.chars().count() >= 100 {
            continue;
        }

        let href_lower = href.to_lowercase();
        let text_lower = text.to_lowercase();
        let is_external = FORM_DOMAINS.iter().any(|d| href_lower.contains(d));
        let is_application = APPLICATION_WORDS.iter().any(|w| text_lower.contains(w));
        if !is_external && !is_application {
            continue;
        }

        let url = if href_lower.starts_with("http") {
            href.to_string()
        } else {
            match page_url.map(|base| base.join(href)) {
                Some(Ok(resolved)) => resolved.to_string(),
                _ => href.to_string(),
            }
        };

        links.push(ExternalLink { text, url });
        if links.len() == MAX_LINKS {
            break;
        }
    }

    links
}

fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => &input[..idx],
        None => input,
    }
}
