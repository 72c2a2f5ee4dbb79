//! core::xml::reader
//!
//! Streaming tag tokenizer.
//!
//! The reader pulls from a [`BufRead`] one construct at a time and never
//! holds more than the current tag in memory. Events are delivered to a
//! [`TagHandler`]; a self-closing tag produces a start event followed
//! immediately by an end event for the same name.
//!
//! # Example
//!
//! ```
//! use wcadm::core::xml::{parse, TagHandler, XmlError};
//! use wcadm::core::xml::StartTag;
//!
//! #[derive(Default)]
//! struct Names(Vec<String>);
//!
//! impl TagHandler for Names {
//!     type Error = XmlError;
//!
//!     fn start_tag(&mut self, tag: &StartTag) -> Result<(), XmlError> {
//!         self.0.push(tag.name.clone());
//!         Ok(())
//!     }
//!
//!     fn end_tag(&mut self, _name: &str) -> Result<(), XmlError> {
//!         Ok(())
//!     }
//! }
//!
//! let mut names = Names::default();
//! parse(&b"<a><b/></a>"[..], &mut names).unwrap();
//! assert_eq!(names.0, vec!["a", "b"]);
//! ```

use std::collections::HashSet;
use std::io::BufRead;

use super::{unescape, StartTag, XmlError};
use crate::core::types::is_xml_name;

/// Receives tag events from [`parse`].
///
/// Handler errors abort parsing and are returned unchanged.
pub trait TagHandler {
    /// Error type returned by the callbacks.
    type Error: From<XmlError>;

    /// Called for every start tag, including self-closing ones.
    fn start_tag(&mut self, tag: &StartTag) -> Result<(), Self::Error>;

    /// Called for every end tag, and after every self-closing start tag.
    fn end_tag(&mut self, name: &str) -> Result<(), Self::Error>;
}

/// Drive `handler` with the tags of `input` until end of input.
///
/// # Errors
///
/// Returns tokenizer errors (converted into the handler's error type) or
/// the first error a callback returned.
pub fn parse<R, H>(input: R, handler: &mut H) -> Result<(), H::Error>
where
    R: BufRead,
    H: TagHandler,
{
    let mut reader = TagReader::new(input);
    while let Some(event) = reader.next_event()? {
        match event {
            Event::Start(tag) => {
                handler.start_tag(&tag)?;
                if tag.self_closing {
                    handler.end_tag(&tag.name)?;
                }
            }
            Event::End(name) => handler.end_tag(&name)?,
        }
    }
    Ok(())
}

/// One structural event.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Start(StartTag),
    End(String),
}

/// Pull tokenizer over a buffered reader.
struct TagReader<R> {
    input: R,
    /// Line of the next unread byte.
    line: usize,
    /// Names of the currently open elements.
    open: Vec<String>,
    /// Whether the root element has been opened.
    seen_root: bool,
}

impl<R: BufRead> TagReader<R> {
    fn new(input: R) -> Self {
        Self {
            input,
            line: 1,
            open: Vec::new(),
            seen_root: false,
        }
    }

    fn syntax(&self, line: usize, message: impl Into<String>) -> XmlError {
        XmlError::Syntax {
            line,
            message: message.into(),
        }
    }

    fn next_event(&mut self) -> Result<Option<Event>, XmlError> {
        loop {
            let mut text = Vec::new();
            let read = self.input.read_until(b'<', &mut text)?;
            if read == 0 {
                return self.finish();
            }
            let found_tag = text.last() == Some(&b'<');
            if found_tag {
                text.pop();
            }
            self.check_text(&text)?;
            if !found_tag {
                return self.finish();
            }

            let start_line = self.line;
            let markup = self.read_markup(start_line)?;
            let markup = String::from_utf8(markup)
                .map_err(|_| self.syntax(start_line, "tag is not valid utf-8"))?;

            if let Some(decl) = markup.strip_prefix('?') {
                if !decl.ends_with('?') {
                    return Err(self.syntax(start_line, "malformed processing instruction"));
                }
                if self.seen_root {
                    return Err(self.syntax(start_line, "processing instruction after root"));
                }
                continue;
            }
            if markup.starts_with("!--") {
                continue;
            }
            if markup.starts_with('!') {
                return Err(self.syntax(start_line, "DOCTYPE and CDATA are not supported"));
            }
            if let Some(name) = markup.strip_prefix('/') {
                return self.end_tag(name.trim_end(), start_line).map(Some);
            }
            return self.start_tag(&markup, start_line).map(Some);
        }
    }

    /// End of input: everything opened must have been closed.
    fn finish(&mut self) -> Result<Option<Event>, XmlError> {
        if let Some(name) = self.open.last() {
            return Err(self.syntax(self.line, format!("unexpected end of input inside <{name}>")));
        }
        if !self.seen_root {
            return Err(self.syntax(self.line, "no root element"));
        }
        Ok(None)
    }

    /// Character data is skipped inside elements but must be blank outside.
    fn check_text(&mut self, text: &[u8]) -> Result<(), XmlError> {
        let outside_root = self.open.is_empty();
        for &byte in text {
            if outside_root && !byte.is_ascii_whitespace() {
                return Err(self.syntax(self.line, "text outside the root element"));
            }
            if byte == b'\n' {
                self.line += 1;
            }
        }
        Ok(())
    }

    /// Read up to (not including) the `>` that ends the current markup.
    ///
    /// A `>` inside a quoted attribute value or inside a comment does not
    /// end the markup.
    fn read_markup(&mut self, start_line: usize) -> Result<Vec<u8>, XmlError> {
        let mut markup = Vec::new();
        loop {
            let read = self.input.read_until(b'>', &mut markup)?;
            if read == 0 || markup.last() != Some(&b'>') {
                return Err(self.syntax(start_line, "unterminated tag"));
            }
            let body = &markup[..markup.len() - 1];
            let complete = if body.starts_with(b"!--") {
                body.len() >= 5 && body.ends_with(b"--")
            } else {
                !in_open_quote(body)
            };
            if complete {
                self.line += markup.iter().filter(|&&b| b == b'\n').count();
                markup.pop();
                return Ok(markup);
            }
        }
    }

    fn end_tag(&mut self, name: &str, line: usize) -> Result<Event, XmlError> {
        match self.open.pop() {
            Some(open) if open == name => Ok(Event::End(name.to_string())),
            Some(open) => Err(self.syntax(line, format!("</{name}> does not close <{open}>"))),
            None => Err(self.syntax(line, format!("unexpected </{name}>"))),
        }
    }

    fn start_tag(&mut self, markup: &str, line: usize) -> Result<Event, XmlError> {
        let (body, self_closing) = match markup.strip_suffix('/') {
            Some(body) => (body, true),
            None => (markup, false),
        };

        let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
        let name = &body[..name_end];
        if !is_xml_name(name) {
            return Err(self.syntax(line, format!("invalid tag name '{name}'")));
        }

        if self.open.is_empty() {
            if self.seen_root {
                return Err(self.syntax(line, format!("second root element <{name}>")));
            }
            self.seen_root = true;
        }

        let attributes = parse_attributes(&body[name_end..]).map_err(|m| self.syntax(line, m))?;
        if !self_closing {
            self.open.push(name.to_string());
        }

        Ok(Event::Start(StartTag {
            name: name.to_string(),
            attributes,
            self_closing,
        }))
    }
}

/// Whether `bytes` ends inside an unterminated quoted value.
fn in_open_quote(bytes: &[u8]) -> bool {
    let mut quote: Option<u8> = None;
    for &b in bytes {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None => {}
        }
    }
    quote.is_some()
}

/// Parse ` key="value" key2='value2'` into ordered pairs.
fn parse_attributes(mut rest: &str) -> Result<Vec<(String, String)>, String> {
    let mut attributes = Vec::new();
    let mut seen = HashSet::new();

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Ok(attributes);
        }

        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .ok_or_else(|| format!("attribute '{rest}' has no value"))?;
        let key = &rest[..key_end];
        if !is_xml_name(key) {
            return Err(format!("invalid attribute name '{key}'"));
        }

        rest = rest[key_end..].trim_start();
        rest = rest
            .strip_prefix('=')
            .ok_or_else(|| format!("expected '=' after attribute '{key}'"))?
            .trim_start();

        let quote = rest
            .chars()
            .next()
            .filter(|c| *c == '"' || *c == '\'')
            .ok_or_else(|| format!("value of attribute '{key}' is not quoted"))?;
        let body = &rest[1..];
        let close = body
            .find(quote)
            .ok_or_else(|| format!("unterminated value for attribute '{key}'"))?;
        let raw = &body[..close];
        if raw.contains('<') {
            return Err(format!("'<' in value of attribute '{key}'"));
        }

        if !seen.insert(key.to_string()) {
            return Err(format!("duplicate attribute '{key}'"));
        }
        attributes.push((key.to_string(), unescape(raw)?));

        rest = &body[close + 1..];
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return Err(format!("missing whitespace after attribute '{key}'"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    /// Records events as strings for easy comparison.
    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl TagHandler for Recorder {
        type Error = XmlError;

        fn start_tag(&mut self, tag: &StartTag) -> Result<(), XmlError> {
            let attrs: Vec<String> = tag
                .attributes
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            self.0.push(format!("start {} [{}]", tag.name, attrs.join(",")));
            Ok(())
        }

        fn end_tag(&mut self, name: &str) -> Result<(), XmlError> {
            self.0.push(format!("end {name}"));
            Ok(())
        }
    }

    fn events(input: &str) -> Result<Vec<String>, XmlError> {
        let mut recorder = Recorder::default();
        parse(input.as_bytes(), &mut recorder)?;
        Ok(recorder.0)
    }

    fn syntax_line(result: Result<Vec<String>, XmlError>) -> usize {
        match result {
            Err(XmlError::Syntax { line, .. }) => line,
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    mod well_formed {
        use super::*;

        #[test]
        fn entries_document() {
            let doc = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
                       <wc-entries xmlns=\"urn:x\">\n\
                       <entry version=\"0\"/>\n\
                       <entry name=\"foo.c\" version=\"5\" kind=\"file\"/>\n\
                       </wc-entries>\n";
            assert_eq!(
                events(doc).unwrap(),
                vec![
                    "start wc-entries [xmlns=urn:x]",
                    "start entry [version=0]",
                    "end entry",
                    "start entry [name=foo.c,version=5,kind=file]",
                    "end entry",
                    "end wc-entries",
                ]
            );
        }

        #[test]
        fn attribute_order_is_preserved() {
            let got = events("<r z=\"1\" a=\"2\" m=\"3\"/>").unwrap();
            assert_eq!(got[0], "start r [z=1,a=2,m=3]");
        }

        #[test]
        fn gt_inside_quoted_value() {
            let got = events("<r expr=\"a > b\" other='x>y'/>").unwrap();
            assert_eq!(got[0], "start r [expr=a > b,other=x>y]");
        }

        #[test]
        fn comments_and_text_inside_root_are_skipped() {
            let got = events("<!-- a > b --><r>text<!-- c --><c/></r>").unwrap();
            assert_eq!(got, vec!["start r []", "start c []", "end c", "end r"]);
        }

        #[test]
        fn entities_are_decoded() {
            let got = events("<r v=\"&lt;&amp;&gt;&#65;\"/>").unwrap();
            assert_eq!(got[0], "start r [v=<&>A]");
        }

        #[test]
        fn whitespace_around_equals_and_multiline_tags() {
            let got = events("<r\n   a = \"1\"\n   b=\"2\"\n/>").unwrap();
            assert_eq!(got[0], "start r [a=1,b=2]");
        }

        #[test]
        fn works_with_small_buffers() {
            let doc = "<r><entry name=\"a b > c\" version=\"1\"/></r>";
            let reader = BufReader::with_capacity(2, doc.as_bytes());
            let mut recorder = Recorder::default();
            parse(reader, &mut recorder).unwrap();
            assert_eq!(recorder.0[1], "start entry [name=a b > c,version=1]");
        }
    }

    mod malformed {
        use super::*;

        #[test]
        fn empty_input() {
            assert_eq!(syntax_line(events("")), 1);
            assert_eq!(syntax_line(events("<?xml version=\"1.0\"?>\n")), 2);
        }

        #[test]
        fn unclosed_root() {
            assert_eq!(syntax_line(events("<r>\n<c/>\n")), 3);
        }

        #[test]
        fn mismatched_end_tag() {
            assert_eq!(syntax_line(events("<r>\n<c>\n</r>")), 3);
        }

        #[test]
        fn stray_end_tag() {
            assert!(events("</r>").is_err());
        }

        #[test]
        fn second_root() {
            assert!(events("<r/><s/>").is_err());
        }

        #[test]
        fn text_outside_root() {
            assert!(events("junk<r/>").is_err());
            assert!(events("<r/>junk").is_err());
        }

        #[test]
        fn truncated_tag() {
            assert!(events("<r><entry name=\"foo").is_err());
            assert!(events("<r><entry name=\"foo\"").is_err());
        }

        #[test]
        fn bad_attributes() {
            assert!(events("<r a=1/>").is_err());
            assert!(events("<r a/>").is_err());
            assert!(events("<r a=\"1\" a=\"2\"/>").is_err());
            assert!(events("<r a=\"1\"b=\"2\"/>").is_err());
            assert!(events("<r a=\"&bogus;\"/>").is_err());
            assert!(events("<r 1a=\"x\"/>").is_err());
        }

        #[test]
        fn doctype_rejected() {
            assert!(events("<!DOCTYPE r><r/>").is_err());
        }

        #[test]
        fn invalid_utf8() {
            let mut recorder = Recorder::default();
            let bytes: &[u8] = b"<r a=\"\xff\"/>";
            assert!(parse(bytes, &mut recorder).is_err());
        }
    }

    mod handler_errors {
        use super::*;

        struct FailOn(&'static str);

        impl TagHandler for FailOn {
            type Error = XmlError;

            fn start_tag(&mut self, tag: &StartTag) -> Result<(), XmlError> {
                if tag.name == self.0 {
                    return Err(XmlError::Syntax {
                        line: 0,
                        message: "handler refused".into(),
                    });
                }
                Ok(())
            }

            fn end_tag(&mut self, _name: &str) -> Result<(), XmlError> {
                Ok(())
            }
        }

        #[test]
        fn handler_error_stops_parse() {
            let err = parse(&b"<r><bad/></r>"[..], &mut FailOn("bad")).unwrap_err();
            assert!(err.to_string().contains("handler refused"));
        }
    }
}
