//! core::xml
//!
//! Tag stream reading and writing for administrative files.
//!
//! # Modules
//!
//! - [`reader`] - Streaming tokenizer that drives a [`TagHandler`]
//! - [`writer`] - Serializes tags back to bytes
//!
//! # Scope
//!
//! Administrative files are a small XML dialect: a declaration, one root
//! element, and attribute-only child elements. The tokenizer covers that
//! dialect plus comments and nested unknown elements, and rejects anything
//! else (DOCTYPE, CDATA, text content outside the root) as malformed.
//! Character data inside elements is skipped.

pub mod reader;
pub mod writer;

pub use reader::{parse, TagHandler};
pub use writer::{TagKind, TagWriter, XML_HEADER};

use thiserror::Error;

/// Errors from reading a tag stream.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The underlying reader failed.
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not well-formed.
    #[error("line {line}: {message}")]
    Syntax {
        /// 1-based line where the offending construct starts.
        line: usize,
        /// What was wrong.
        message: String,
    },
}

/// A start tag with its attributes in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Element name.
    pub name: String,
    /// Attributes as written, values entity-decoded.
    pub attributes: Vec<(String, String)>,
    /// Whether the tag was written as `<name ... />`.
    pub self_closing: bool,
}

impl StartTag {
    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate attributes as string slices.
    pub fn attr_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// Escape a string for use inside a double-quoted attribute value.
pub fn escape_attr(value: &str) -> std::borrow::Cow<'_, str> {
    if !value
        .chars()
        .any(|c| matches!(c, '&' | '<' | '>' | '"' | '\'' | '\n' | '\r' | '\t'))
    {
        return std::borrow::Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            other => out.push(other),
        }
    }
    std::borrow::Cow::Owned(out)
}

/// Decode entity and character references in an attribute value.
///
/// Returns a description of the first bad reference on failure.
pub fn unescape(value: &str) -> Result<String, String> {
    if !value.contains('&') {
        return Ok(value.to_string());
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| format!("unterminated reference in '{value}'"))?;
        let reference = &after[..semi];
        let decoded = match reference {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = reference
                    .strip_prefix("#x")
                    .or_else(|| reference.strip_prefix("#X"))
                {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = reference.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| format!("unknown reference '&{reference};'"))?
            }
        };
        out.push(decoded);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
