//! In-memory EMUBT XML document
//!
//! The document is kept as the flat list of XML events it was read from, so
//! saving reproduces everything we never touched: comments, processing
//! instructions, whitespace and element order. Only attributes explicitly
//! set through [`Document::set_attribute`] change.

use crate::error::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::Serialize;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

/// Position of an element inside the [`Document`] it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementHandle(usize);

/// A parsed XML document
#[derive(Debug, Clone)]
pub struct Document {
    events: Vec<Event<'static>>,
    source_path: PathBuf,
}

impl Document {
    /// Read and parse a document from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let content = String::from_utf8(bytes)
            .map_err(|e| parse_error(path, format!("invalid UTF-8: {}", e)))?;

        Self::parse_str(&content, path)
    }

    /// Parse a document from a string
    pub fn parse_str<P: AsRef<Path>>(content: &str, source: P) -> Result<Self> {
        let path = source.as_ref();
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut reader = Reader::from_str(content);
        reader.trim_text(false);
        reader.check_end_names(true);

        let mut events: Vec<Event<'static>> = Vec::new();
        let mut depth = 0usize;
        let mut seen_root = false;
        let mut after_decl = false;

        loop {
            let event = reader.read_event().map_err(|e| {
                parse_error(
                    path,
                    format!("{} (at byte {})", e, reader.buffer_position()),
                )
            })?;

            match &event {
                Event::Eof => break,
                // The declaration is rewritten on save
                Event::Decl(_) if events.is_empty() && !after_decl => {
                    after_decl = true;
                    continue;
                }
                Event::Text(text) if events.is_empty() && after_decl => {
                    if is_blank(text) {
                        continue;
                    }
                    return Err(parse_error(path, "text outside of root element"));
                }
                Event::Start(start) | Event::Empty(start) => {
                    if depth == 0 && seen_root {
                        return Err(parse_error(path, "junk after document element"));
                    }
                    validate_attributes(start, path)?;
                    seen_root = true;
                    if matches!(event, Event::Start(_)) {
                        depth += 1;
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                }
                Event::Text(text) if depth == 0 && !is_blank(text) => {
                    return Err(parse_error(path, "text outside of root element"));
                }
                _ => {}
            }

            events.push(event.into_owned());
        }

        if !seen_root {
            return Err(parse_error(path, "no element found"));
        }
        if depth != 0 {
            return Err(parse_error(path, format!("{} unclosed element(s)", depth)));
        }

        Ok(Self {
            events,
            source_path: path.to_path_buf(),
        })
    }

    /// Path the document was loaded from
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Every element (start or self-closing tag) in document order
    pub fn elements(&self) -> impl Iterator<Item = (ElementHandle, &BytesStart<'static>)> {
        self.events
            .iter()
            .enumerate()
            .filter_map(|(i, event)| match event {
                Event::Start(start) | Event::Empty(start) => Some((ElementHandle(i), start)),
                _ => None,
            })
    }

    /// Unescaped value of an attribute on the element at `handle`
    pub fn attribute(&self, handle: ElementHandle, key: &str) -> Option<String> {
        let start = self.element(handle)?;
        read_attribute(start, key)
    }

    fn element(&self, handle: ElementHandle) -> Option<&BytesStart<'static>> {
        match self.events.get(handle.0)? {
            Event::Start(start) | Event::Empty(start) => Some(start),
            _ => None,
        }
    }

    /// Overwrite (or add) one attribute, leaving the others in place
    pub fn set_attribute(&mut self, handle: ElementHandle, key: &str, value: &str) -> Result<()> {
        let start = match self.events.get_mut(handle.0) {
            Some(Event::Start(start)) | Some(Event::Empty(start)) => start,
            _ => return Err(Error::InvalidHandle(handle.0)),
        };

        let mut updated = start.clone();
        updated.clear_attributes();

        let mut replaced = false;
        for attr in start.attributes() {
            let attr = attr.map_err(|e| parse_error(&self.source_path, e.to_string()))?;
            if attr.key.as_ref() == key.as_bytes() {
                updated.push_attribute((key, value));
                replaced = true;
            } else if attr.value.contains(&b'"') {
                // Raw value was single-quoted; re-escape for double quotes
                let unescaped = attr
                    .unescape_value()
                    .map_err(|e| parse_error(&self.source_path, e.to_string()))?;
                let escaped = escape(unescaped.as_ref()).into_owned();
                updated.push_attribute(Attribute {
                    key: attr.key,
                    value: Cow::Owned(escaped.into_bytes()),
                });
            } else {
                updated.push_attribute(attr);
            }
        }
        if !replaced {
            updated.push_attribute((key, value));
        }

        *start = updated;
        Ok(())
    }

    /// Serialize the whole document with a fresh XML declaration
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        let save_error = |e: quick_xml::Error| Error::Save {
            path: self.source_path.clone(),
            message: e.to_string(),
        };

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(save_error)?;
        writer
            .write_event(Event::Text(BytesText::from_escaped("\n")))
            .map_err(save_error)?;
        for event in &self.events {
            writer.write_event(event).map_err(save_error)?;
        }

        Ok(writer.into_inner())
    }

    /// Serialize to a string (useful for testing)
    pub fn to_xml_string(&self) -> Result<String> {
        String::from_utf8(self.to_bytes()?).map_err(|e| Error::Save {
            path: self.source_path.clone(),
            message: e.to_string(),
        })
    }

    /// Write the document to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        fs::write(path, bytes).map_err(|e| Error::Save {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Unescaped value of `key` on an element, if present
pub(crate) fn read_attribute(start: &BytesStart<'_>, key: &str) -> Option<String> {
    // Attributes were validated when the document was parsed
    let attr = start.try_get_attribute(key).ok()??;
    attr.unescape_value().ok().map(Cow::into_owned)
}

fn validate_attributes(start: &BytesStart<'_>, path: &Path) -> Result<()> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| parse_error(path, e.to_string()))?;
        attr.unescape_value()
            .map_err(|e| parse_error(path, e.to_string()))?;
    }
    Ok(())
}

fn is_blank(text: &BytesText<'_>) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

fn parse_error(path: &Path, message: impl Into<String>) -> Error {
    Error::DocumentParse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}
