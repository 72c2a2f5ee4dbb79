//! core::xml::writer
//!
//! Serializes tags to a byte sink, one tag per line.

use std::io::{self, Write};

use super::escape_attr;

/// Declaration written at the top of every generated file.
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

/// The shape of a tag to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `<name attrs>`
    Open,
    /// `<name attrs/>`
    SelfClosing,
    /// `</name>`
    Close,
}

/// Writes tags to an underlying sink.
#[derive(Debug)]
pub struct TagWriter<W: Write> {
    out: W,
}

impl<W: Write> TagWriter<W> {
    /// Wrap a sink.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write the XML declaration.
    pub fn write_header(&mut self) -> io::Result<()> {
        self.out.write_all(XML_HEADER.as_bytes())
    }

    /// Write one tag.
    ///
    /// Attributes are written in iteration order; `Close` tags ignore them.
    pub fn write_tag<'a, I>(&mut self, kind: TagKind, name: &str, attributes: I) -> io::Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut line = String::with_capacity(64);
        match kind {
            TagKind::Close => {
                line.push_str("</");
                line.push_str(name);
                line.push('>');
            }
            TagKind::Open | TagKind::SelfClosing => {
                line.push('<');
                line.push_str(name);
                for (key, value) in attributes {
                    line.push(' ');
                    line.push_str(key);
                    line.push_str("=\"");
                    line.push_str(&escape_attr(value));
                    line.push('"');
                }
                if kind == TagKind::SelfClosing {
                    line.push('/');
                }
                line.push('>');
            }
        }
        line.push('\n');
        self.out.write_all(line.as_bytes())
    }

    /// Write a close tag.
    pub fn write_close(&mut self, name: &str) -> io::Result<()> {
        self.write_tag(TagKind::Close, name, std::iter::empty::<(&str, &str)>())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Get the underlying sink back.
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut TagWriter<&mut Vec<u8>>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        let mut writer = TagWriter::new(&mut buf);
        f(&mut writer).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn open_self_closing_and_close() {
        let text = render(|w| {
            w.write_tag(TagKind::Open, "wc-entries", [("xmlns", "urn:x")])?;
            w.write_tag(TagKind::SelfClosing, "entry", [("version", "0")])?;
            w.write_close("wc-entries")
        });
        assert_eq!(
            text,
            "<wc-entries xmlns=\"urn:x\">\n<entry version=\"0\"/>\n</wc-entries>\n"
        );
    }

    #[test]
    fn attribute_values_are_escaped() {
        let text = render(|w| w.write_tag(TagKind::SelfClosing, "entry", [("note", "a\"<b>&")]));
        assert_eq!(text, "<entry note=\"a&quot;&lt;b&gt;&amp;\"/>\n");
    }

    #[test]
    fn header() {
        let text = render(|w| w.write_header());
        assert_eq!(text, XML_HEADER);
    }
}
