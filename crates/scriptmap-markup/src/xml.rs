/*
 * xml.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Strict XML parsing backed by quick-xml.

use quick_xml::Reader;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use scriptmap_source_map::Edit;

use crate::error::{MarkupError, Result};
use crate::types::{Attribute, Content, Document, DocumentMode, Element};

const CDATA_OPEN: usize = "<![CDATA[".len();
const CDATA_CLOSE: usize = "]]>".len();

/// Parse a well-formed XML document into element records.
///
/// Content that is not character data (CDATA delimiters, comments,
/// processing instructions, entity references and nested elements) is
/// described by the [`Content::edits`] of the innermost enclosing element.
///
/// # Example
///
/// ```rust
/// use scriptmap_markup::xml::parse;
///
/// let doc = parse("<root><script>a &amp;&amp; b</script></root>").unwrap();
/// let script = doc.elements_named("script").next().unwrap();
/// assert_eq!(script.content.as_ref().unwrap().edits.len(), 2);
/// ```
///
/// # Errors
///
/// Returns a [`MarkupError`] positioned at the first offending byte if the
/// document is not well-formed.
pub fn parse(source: &str) -> Result<Document> {
    let mut parser = XmlParser::new(source);
    parser.parse()
}

/// An element whose end tag has not been seen yet.
struct OpenElement {
    /// Index into `XmlParser::elements`.
    index: usize,
    /// Qualified name as written, for end tag matching.
    qname: String,
    /// Offset just past the start tag's `>`.
    content_start: usize,
    /// Edits collected for this element's content so far.
    edits: Vec<Edit>,
}

struct XmlParser<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
    elements: Vec<Element>,
    stack: Vec<OpenElement>,
}

impl<'a> XmlParser<'a> {
    fn new(source: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        reader.config_mut().check_end_names = false;

        Self {
            source,
            reader,
            elements: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn parse(&mut self) -> Result<Document> {
        loop {
            // Capture position before reading the event
            let event_start = self.reader.buffer_position() as usize;

            match self.reader.read_event() {
                Ok(Event::Start(e)) => self.handle_start(&e, event_start)?,
                Ok(Event::End(e)) => self.handle_end(&e, event_start)?,
                Ok(Event::Empty(e)) => self.handle_empty(&e, event_start)?,
                Ok(Event::Text(_)) => self.handle_text(event_start),
                Ok(Event::CData(_)) => {
                    let end = self.position();
                    self.push_edit(Edit::delete(event_start..event_start + CDATA_OPEN));
                    self.push_edit(Edit::delete(end - CDATA_CLOSE..end));
                }
                Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_)) => {
                    let end = self.position();
                    self.push_edit(Edit::delete(event_start..end));
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(self.syntax_error(&e.to_string(), event_start)),
            }
        }

        if let Some(open) = self.stack.last() {
            let element = &self.elements[open.index];
            return Err(MarkupError::UnclosedElement {
                name: open.qname.clone(),
                position: element.start,
            });
        }

        tracing::trace!(count = self.elements.len(), "Parsed XML elements");
        Ok(Document {
            mode: DocumentMode::Xml,
            elements: std::mem::take(&mut self.elements),
        })
    }

    fn position(&self) -> usize {
        self.reader.buffer_position() as usize
    }

    /// Record an edit on the innermost open element, if any.
    fn push_edit(&mut self, edit: Edit) {
        if let Some(open) = self.stack.last_mut() {
            open.edits.push(edit);
        }
    }

    fn handle_start(&mut self, e: &BytesStart<'_>, event_start: usize) -> Result<()> {
        let element = self.element_record(e, event_start)?;
        let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        self.stack.push(OpenElement {
            index: self.elements.len(),
            qname,
            content_start: self.position(),
            edits: Vec::new(),
        });
        self.elements.push(element);
        Ok(())
    }

    fn handle_empty(&mut self, e: &BytesStart<'_>, event_start: usize) -> Result<()> {
        let element = self.element_record(e, event_start)?;
        let end = self.position();
        self.push_edit(Edit::delete(event_start..end));
        self.elements.push(element);
        Ok(())
    }

    fn handle_end(&mut self, e: &BytesEnd<'_>, event_start: usize) -> Result<()> {
        let found = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        let Some(open) = self.stack.pop() else {
            return Err(MarkupError::UnexpectedEndTag {
                name: found,
                position: event_start,
            });
        };

        if open.qname != found {
            return Err(MarkupError::MismatchedEndTag {
                expected: open.qname,
                found,
                position: event_start,
            });
        }

        let element_start = self.elements[open.index].start;
        self.elements[open.index].content = Some(Content {
            range: open.content_start..event_start,
            edits: open.edits,
        });

        // The whole child element is markup from the parent's point of view
        let end = self.position();
        self.push_edit(Edit::delete(element_start..end));
        Ok(())
    }

    /// Replace predefined and numeric character references with their text.
    fn handle_text(&mut self, event_start: usize) {
        let end = self.position();
        let Some(text) = self.source.get(event_start..end) else {
            return;
        };

        let mut edits = Vec::new();
        let mut rest = text;
        let mut base = event_start;
        while let Some(amp) = rest.find('&') {
            let after = &rest[amp + 1..];
            let Some(semi) = after.find(';') else {
                break;
            };
            let entity = &after[..semi];
            let ref_len = semi + 2;
            let ref_start = base + amp;

            match decode_entity(entity) {
                Some(decoded) => {
                    edits.push(Edit::new(ref_start..ref_start + ref_len, decoded));
                    rest = &after[semi + 1..];
                    base = ref_start + ref_len;
                }
                None => {
                    // Not a reference; its `;` may close a later one
                    tracing::debug!(offset = ref_start, "Leaving bare '&' as-is");
                    rest = after;
                    base = ref_start + 1;
                }
            }
        }

        for edit in edits {
            self.push_edit(edit);
        }
    }

    fn element_record(&self, e: &BytesStart<'_>, event_start: usize) -> Result<Element> {
        let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        validate_name(&qname, event_start)?;
        let (name, prefix) = split_name(&qname);

        let mut attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| MarkupError::Syntax {
                message: err.to_string(),
                position: event_start,
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let (attr_name, attr_prefix) = split_name(&key);
            let value = attr.unescape_value().map_err(|err| MarkupError::Syntax {
                message: format!("Invalid attribute value: {}", err),
                position: event_start,
            })?;

            attributes.push(Attribute {
                name: attr_name,
                prefix: attr_prefix,
                value: value.into_owned(),
            });
        }

        Ok(Element {
            name,
            prefix,
            attributes,
            start: event_start,
            depth: self.stack.len(),
            content: None,
        })
    }

    /// Turn a quick-xml error into a positioned error.
    ///
    /// A failure at a `<` that cannot start any markup is reported as an
    /// unescaped less-than sign.
    fn syntax_error(&self, message: &str, event_start: usize) -> MarkupError {
        let rest = self.source.get(event_start..).unwrap_or_default();
        let mut chars = rest.chars();
        if chars.next() == Some('<') {
            match chars.next() {
                Some(c) if c == '/' || c == '!' || c == '?' || is_name_start(c) => {}
                _ => {
                    return MarkupError::UnescapedLessThan {
                        position: event_start,
                    };
                }
            }
        }

        MarkupError::Syntax {
            message: message.to_string(),
            position: self.reader.error_position() as usize,
        }
    }
}

fn validate_name(qname: &str, position: usize) -> Result<()> {
    let mut chars = qname.chars();
    match chars.next() {
        Some(c) if is_name_start(c) => {}
        _ => return Err(MarkupError::UnescapedLessThan { position }),
    }
    if chars.all(is_name_char) {
        Ok(())
    } else {
        Err(MarkupError::InvalidName {
            name: qname.to_string(),
            position,
        })
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-' || c == '.'
}

fn split_name(qname: &str) -> (String, Option<String>) {
    match qname.split_once(':') {
        Some((prefix, local)) => (local.to_string(), Some(prefix.to_string())),
        None => (qname.to_string(), None),
    }
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(number) = entity.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    resolve_xml_entity(entity).map(str::to_string)
}
