//! XML reading utilities shared by the Office Open XML and OpenDocument decoders.

use crate::error::ReadError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum XmlError {
    #[error("Unknown XML entity '&{0};'")]
    ParseEntityError(String),

    #[error("Cannot parse attribute '{0}' value '{1}'")]
    ParseAttributeValueError(String, String),
}

/// Pull-based XML reader over a zip entry, reusing one event buffer.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(source: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        // <c r="A1"/> is reported as Start + End so cell handling has one code path
        config.expand_empty_elements = true;
        config.trim_text(false);
        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Returns the next event, or `None` at end of document.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, ReadError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

/// Attribute lookup on start tags.
pub(crate) trait XmlNodeHelper<'a> {
    /// Unescaped value of the attribute, if present.
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, ReadError>;

    /// Value of the attribute parsed into `T`, if present.
    fn parse_attribute_value<T: FromStr>(&'a self, name: &str) -> Result<Option<T>, ReadError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, ReadError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?)),
            None => Ok(None),
        }
    }

    fn parse_attribute_value<T: FromStr>(&'a self, name: &str) -> Result<Option<T>, ReadError> {
        match self.get_attribute_value(name)? {
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| XmlError::ParseAttributeValueError(name.to_owned(), value.to_string()).into()),
            None => Ok(None),
        }
    }
}

/// Accumulates character data into a `String`.
pub(crate) trait XmlTextContextHelper {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), ReadError>;

    /// Appends an entity or character reference such as `&amp;` or `&#x41;`.
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), ReadError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), ReadError> {
        self.push_str(&text.xml_content()?);
        Ok(())
    }

    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), ReadError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = match number.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16)?,
                None => number.parse::<u32>()?,
            };
            if let Some(character) = char::from_u32(code) {
                self.push(character);
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::ParseEntityError(raw.to_string()))?;
        }
        Ok(())
    }
}

/// Drives an [`XmlReader`] to the end of the document, dispatching each event to the
/// given match arms. Unmatched events are skipped; `break` leaves the loop early.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next()? {
            match event {
                $($arms)*
                _ => (),
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn text_of(xml: &str) -> String {
        let mut reader = XmlReader::new(Cursor::new(xml.as_bytes().to_vec()));
        let mut text = String::new();
        let result: Result<(), ReadError> = (|| {
            match_xml_events!(reader => {
                Event::Text(event) => text.push_bytes_text(&event)?,
                Event::GeneralRef(event) => text.push_bytes_ref(&event)?,
            });
            Ok(())
        })();
        result.unwrap();
        text
    }

    #[test]
    fn resolves_entities_and_character_references() {
        assert_eq!(text_of("<t>a &amp; b &#65;&#x42;</t>"), "a & b AB");
    }

    #[test]
    fn reads_and_parses_attributes() {
        let mut reader = XmlReader::new(Cursor::new(b"<row r=\"7\" spans=\"x\"/>".to_vec()));
        let mut row = None;
        let mut invalid = false;
        let result: Result<(), ReadError> = (|| {
            match_xml_events!(reader => {
                Event::Start(event) => {
                    row = event.parse_attribute_value::<usize>("r")?;
                    invalid = event.parse_attribute_value::<usize>("spans").is_err();
                    assert_eq!(event.get_attribute_value("missing")?, None);
                }
            });
            Ok(())
        })();
        result.unwrap();
        assert_eq!(row, Some(7));
        assert!(invalid);
    }
}
