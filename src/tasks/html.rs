//! Conservative HTML minifier used before template compilation.
//!
//! Works on a flat scan of tags and text. Contents of `pre`, `textarea`,
//! `script` and `style` are left alone.

use super::HtmlMinifyOptions;
use regex::Regex;
use std::sync::LazyLock;

// Quoted attribute values may contain `<` and `>`.
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<!--.*?-->|<[A-Za-z/!?](?:[^<>"']|"[^"]*"|'[^']*')*>"#).expect("Invalid regex pattern")
});

static START_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^<([A-Za-z][A-Za-z0-9:-]*)(.*?)(/?)>$").expect("Invalid regex pattern")
});

static ATTRIBUTE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
        ([^\s"'=<>/]+)                 # name
        (?:
            \s*=\s*
            (?:
                "([^"]*)"              # double quoted
                | '([^']*)'            # single quoted
                | ([^\s"'=<>`]+)       # unquoted
            )
        )?
        "#,
    )
    .expect("Invalid regex pattern")
});

static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

static UNQUOTABLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[^\s"'`=<>]*[^\s"'`=<>/]$"#).expect("Invalid regex pattern"));

const RAW_TEXT_ELEMENTS: &[&str] = &["pre", "textarea", "script", "style"];

const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "allowfullscreen", "async", "autofocus", "autoplay", "checked", "compact", "controls",
    "declare", "default", "defer", "disabled", "formnovalidate", "hidden", "inert", "ismap",
    "itemscope", "loop", "multiple", "muted", "nohref", "noresize", "noshade", "novalidate",
    "nowrap", "open", "readonly", "required", "reversed", "scoped", "seamless", "selected",
];

/// (element, attribute, default value)
const REDUNDANT_ATTRIBUTES: &[(&str, &str, &str)] = &[
    ("input", "type", "text"),
    ("form", "method", "get"),
    ("script", "type", "text/javascript"),
    ("script", "language", "javascript"),
    ("style", "type", "text/css"),
    ("area", "shape", "rect"),
];

#[derive(Debug, Clone, PartialEq)]
enum Quote {
    Double,
    Single,
    None,
}

#[derive(Debug, Clone, PartialEq)]
struct Attribute {
    name: String,
    value: Option<String>,
    quote: Quote,
}

/// HTML minifier configured by [`HtmlMinifyOptions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlMinifier {
    options: HtmlMinifyOptions,
}

impl HtmlMinifier {
    pub fn new(options: HtmlMinifyOptions) -> Self {
        Self { options }
    }

    fn rewrites_attributes(&self) -> bool {
        self.options.collapse_boolean_attributes
            || self.options.remove_attribute_quotes
            || self.options.remove_redundant_attributes
    }

    /// Minify a document or fragment.
    pub fn minify(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut raw: Option<String> = None;
        let mut last = 0;

        for token in TOKEN_PATTERN.find_iter(html) {
            self.push_text(&mut out, &html[last..token.start()], raw.is_some());
            last = token.end();
            let text = token.as_str();

            if text.starts_with("<!--") {
                if raw.is_some() || !self.options.remove_comments || is_conditional(text) {
                    out.push_str(text);
                }
                continue;
            }

            if let Some(open) = &raw {
                if closes(text, open) {
                    raw = None;
                }
                out.push_str(text);
                continue;
            }

            match START_TAG_PATTERN.captures(text) {
                Some(caps) => {
                    let name = caps[1].to_ascii_lowercase();
                    if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                        raw = Some(name.clone());
                    }
                    if self.rewrites_attributes() {
                        out.push_str(&self.rewrite_tag(&caps[1], &name, &caps[2], &caps[3]));
                    } else {
                        out.push_str(text);
                    }
                }
                None => out.push_str(text),
            }
        }
        self.push_text(&mut out, &html[last..], raw.is_some());

        if self.options.collapse_whitespace {
            out.trim().to_string()
        } else {
            out
        }
    }

    fn push_text(&self, out: &mut String, text: &str, raw: bool) {
        if raw || !self.options.collapse_whitespace {
            out.push_str(text);
        } else if !text.trim().is_empty() {
            out.push_str(&WHITESPACE_PATTERN.replace_all(text, " "));
        }
    }

    fn rewrite_tag(&self, tag: &str, name: &str, attributes: &str, self_closing: &str) -> String {
        let mut attrs = parse_attributes(attributes);

        if self.options.remove_redundant_attributes {
            attrs.retain(|a| !is_redundant(name, a));
        }
        if self.options.collapse_boolean_attributes {
            for attr in &mut attrs {
                if BOOLEAN_ATTRIBUTES.contains(&attr.name.to_ascii_lowercase().as_str()) {
                    attr.value = None;
                }
            }
        }

        let mut out = format!("<{}", tag);
        let mut ends_unquoted = false;
        for attr in &attrs {
            out.push(' ');
            out.push_str(&attr.name);
            ends_unquoted = false;
            let Some(value) = &attr.value else { continue };

            let unquote = matches!(attr.quote, Quote::None)
                || (self.options.remove_attribute_quotes && UNQUOTABLE_PATTERN.is_match(value));
            if unquote {
                out.push('=');
                out.push_str(value);
                ends_unquoted = true;
            } else if matches!(attr.quote, Quote::Single) {
                out.push_str(&format!("='{}'", value));
            } else {
                out.push_str(&format!("=\"{}\"", value));
            }
        }
        if !self_closing.is_empty() {
            if ends_unquoted {
                out.push(' ');
            }
            out.push('/');
        }
        out.push('>');
        out
    }
}

fn parse_attributes(text: &str) -> Vec<Attribute> {
    ATTRIBUTE_PATTERN
        .captures_iter(text)
        .map(|caps| {
            let (value, quote) = if let Some(v) = caps.get(2) {
                (Some(v.as_str().to_string()), Quote::Double)
            } else if let Some(v) = caps.get(3) {
                (Some(v.as_str().to_string()), Quote::Single)
            } else if let Some(v) = caps.get(4) {
                (Some(v.as_str().to_string()), Quote::None)
            } else {
                (None, Quote::None)
            };
            Attribute { name: caps[1].to_string(), value, quote }
        })
        .collect()
}

fn is_redundant(element: &str, attr: &Attribute) -> bool {
    let Some(value) = &attr.value else { return false };
    REDUNDANT_ATTRIBUTES.iter().any(|(el, name, default)| {
        *el == element
            && attr.name.eq_ignore_ascii_case(name)
            && value.trim().eq_ignore_ascii_case(default)
    })
}

fn is_conditional(comment: &str) -> bool {
    comment.starts_with("<!--[if") || comment.starts_with("<!--<![endif]") || comment.starts_with("<!--!")
}

fn closes(tag: &str, element: &str) -> bool {
    tag.strip_prefix("</")
        .map(|rest| rest.trim_end_matches('>').trim().eq_ignore_ascii_case(element))
        .unwrap_or(false)
}

/// Minify with the given switches.
pub fn minify_html(html: &str, options: &HtmlMinifyOptions) -> String {
    HtmlMinifier::new(*options).minify(html)
}
