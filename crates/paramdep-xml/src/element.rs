//! A small owned element tree over `quick-xml` events.
//!
//! Documents carry all data in attributes, so elements have a tag, ordered
//! attributes and child elements, and never text.

use std::io::Write;
use std::str::FromStr;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Result, XmlError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set_attribute(name, value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replace an existing attribute in place, or append it.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(existing, _)| existing == name)?;
        Some(self.attributes.remove(index).1)
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<XmlElement> {
        &mut self.children
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    /// First child with `tag`.
    pub fn child(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.tag == tag)
    }

    pub fn child_mut(&mut self, tag: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find(|child| child.tag == tag)
    }

    /// Drop every child with `tag`, returning how many were removed.
    pub fn remove_children(&mut self, tag: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|child| child.tag != tag);
        before - self.children.len()
    }

    pub fn require_attribute(&self, name: &'static str) -> Result<&str> {
        self.attribute(name).ok_or_else(|| XmlError::MissingAttribute {
            element: self.tag.clone(),
            attribute: name,
        })
    }

    /// Parse a required attribute.
    pub fn parse_attribute<T>(&self, name: &'static str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let text = self.require_attribute(name)?;
        self.parse_text(name, text)
    }

    /// Parse an attribute that may be absent.
    pub fn parse_optional_attribute<T>(&self, name: &'static str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.attribute(name)
            .map(|text| self.parse_text(name, text))
            .transpose()
    }

    pub(crate) fn invalid_attribute(
        &self,
        name: &str,
        value: &str,
        reason: impl std::fmt::Display,
    ) -> XmlError {
        XmlError::InvalidAttribute {
            element: self.tag.clone(),
            attribute: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse_text<T>(&self, name: &str, text: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        text.trim()
            .parse()
            .map_err(|err| self.invalid_attribute(name, text, err))
    }

    /// Fails unless this element is a `<tag>`.
    pub(crate) fn expect_tag(&self, tag: &str) -> Result<()> {
        if self.tag == tag {
            Ok(())
        } else {
            Err(XmlError::unexpected(format!("<{tag}>"), format!("<{}>", self.tag)))
        }
    }

    /// Parse a document into its root element.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;
        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(element_from(&start)?),
                Event::Empty(start) => {
                    let element = element_from(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XmlError::unexpected("an element", "a closing tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(_) | Event::CData(_) | Event::GeneralRef(_) => {
                    return Err(XmlError::unexpected("an element", "text content"));
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if let Some(open) = stack.last() {
            return Err(XmlError::unexpected(
                format!("</{}>", open.tag),
                "end of document",
            ));
        }
        root.ok_or_else(|| XmlError::unexpected("a root element", "an empty document"))
    }

    /// Write the element as a complete document with an XML declaration.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml = Writer::new_with_indent(writer, b' ', 2);
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.write_element(&mut xml)
    }

    pub fn to_xml_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        String::from_utf8(buffer).map_err(|err| XmlError::Utf8(err.utf8_error()))
    }

    fn write_element<W: Write>(&self, xml: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.tag.as_str());
        for (name, value) in &self.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }
        if self.children.is_empty() {
            xml.write_event(Event::Empty(start))?;
        } else {
            xml.write_event(Event::Start(start))?;
            for child in &self.children {
                child.write_element(xml)?;
            }
            xml.write_event(Event::End(BytesEnd::new(self.tag.as_str())))?;
        }
        Ok(())
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement> {
    let mut element = XmlElement::new(std::str::from_utf8(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute?;
        let name = std::str::from_utf8(attribute.key.as_ref())?.to_string();
        let value = attribute.unescape_value()?.into_owned();
        element.attributes.push((name, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(XmlError::unexpected(
                "a single root element",
                format!("a second root <{}>", element.tag),
            ));
        }
    }
    Ok(())
}
