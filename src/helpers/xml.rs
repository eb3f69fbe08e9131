//! XML parsing utilities for the Office Open XML parts of a workbook
//! Provides a reader wrapper and helper traits for attribute and text processing

use crate::error::Gl860Error;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
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
pub enum XmlError {
    #[error("Unknown XML entity '&{0};'")]
    ParseEntityError(String),

    #[error("Invalid attribute value '{0}'")]
    ParseAttributeValueError(String),
}

/// Pull reader over one XML part, reusing a single event buffer
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    /// Creates a reader that expands `<x/>` into start and end events and keeps whitespace,
    /// so cell text such as `" 23.5"` reaches the caller untouched
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        XmlReader {
            reader,
            buffer: Vec::with_capacity(4096),
        }
    }

    /// Reads the next event, `None` at end of document
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, Gl860Error> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

pub(crate) trait XmlAttributeHelper<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, Gl860Error>;

    fn parse_value<T: FromStr>(&self) -> Result<T, Gl860Error>;
}

impl<'a> XmlAttributeHelper<'a> for Attribute<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, Gl860Error> {
        Ok(self.unescape_value()?)
    }

    fn parse_value<T: FromStr>(&self) -> Result<T, Gl860Error> {
        let value = self.get_value()?;
        value
            .parse()
            .map_err(|_| XmlError::ParseAttributeValueError(value.to_string()).into())
    }
}

/// Attribute lookup on start tags
pub(crate) trait XmlNodeHelper<'a> {
    /// Gets an attribute value by its qualified name
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, Gl860Error>;

    /// Gets an attribute value and parses it, `None` when the attribute is absent
    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, Gl860Error>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, Gl860Error> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.get_value())
            .transpose()
    }

    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, Gl860Error> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.parse_value())
            .transpose()
    }
}

/// Accumulates element text split across text and entity events
pub(crate) trait XmlTextContextHelper {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), Gl860Error>;

    /// Appends a general reference such as `&amp;` or `&#x2103;`
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), Gl860Error>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_text(&mut self, text: &BytesText) -> Result<(), Gl860Error> {
        self.push_str(&text.xml_content()?);
        Ok(())
    }

    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), Gl860Error> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = match number.strip_prefix(['x', 'X']) {
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

/// Drives an [`XmlReader`] to the end of its document, dispatching every event to the given arms.
/// Unmatched events are ignored.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next()? {
            match event {
                Event::Eof => break,
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
        let mut reader = XmlReader::new(Cursor::new(xml.as_bytes()));
        let mut text = String::new();
        let result: Result<(), Gl860Error> = (|| {
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
    fn test_text_with_entities() {
        assert_eq!(text_of("<t>W/m2 &amp; lux</t>"), "W/m2 & lux");
        assert_eq!(text_of("<t>&#x2103;</t>"), "\u{2103}");
        assert_eq!(text_of("<t>&#37;RH</t>"), "%RH");
    }

    #[test]
    fn test_unknown_entity_is_an_error() {
        let mut reader = XmlReader::new(Cursor::new("<t>&bogus;</t>".as_bytes()));
        let mut text = String::new();
        let result: Result<(), Gl860Error> = (|| {
            match_xml_events!(reader => {
                Event::GeneralRef(event) => text.push_bytes_ref(&event)?,
            });
            Ok(())
        })();
        assert!(matches!(
            result,
            Err(Gl860Error::XmlHelperError(XmlError::ParseEntityError(_)))
        ));
    }

    #[test]
    fn test_parse_attribute_value() {
        let mut reader = XmlReader::new(Cursor::new(r#"<c r="B7" s="3"/>"#.as_bytes()));
        let mut style = None;
        let mut reference = None;
        let result: Result<(), Gl860Error> = (|| {
            match_xml_events!(reader => {
                Event::Start(event) => {
                    style = event.parse_attribute_value::<usize>("s")?;
                    reference = event.get_attribute_value("r")?.map(|value| value.into_owned());
                },
            });
            Ok(())
        })();
        result.unwrap();
        assert_eq!(style, Some(3));
        assert_eq!(reference.as_deref(), Some("B7"));
    }
}
