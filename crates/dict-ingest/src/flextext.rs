//! Interlinear gloss documents exported from FLEx (`*.flextext`).
//!
//! The document is parsed into a small element tree; [`separate_examples`]
//! walks it phrase by phrase and [`read_glosses`] turns each phrase into a
//! [`GlossRecord`] keyed by `(text title, segment number)`.

use std::collections::BTreeMap;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IngestError, Result};

// =============================================================================
// Element tree
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First direct child element named `name`.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.name == name)
    }

    /// All direct child elements named `name`.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |element| element.name == name)
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// This element and all descendant elements in document order.
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(element) = stack.pop() {
            out.push(element);
            let children: Vec<&XmlElement> = element.elements().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }
}

fn xml_error(reader: &Reader<&[u8]>, message: impl ToString) -> IngestError {
    IngestError::Xml {
        position: reader.buffer_position(),
        message: message.to_string(),
    }
}

fn utf8<'a>(reader: &Reader<&[u8]>, bytes: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| xml_error(reader, e))
}

fn element_from_start(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = utf8(reader, start.name().as_ref())?.to_string();
    let mut element = XmlElement::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| xml_error(reader, e))?;
        let key = utf8(reader, attribute.key.as_ref())?.to_string();
        let raw = utf8(reader, &attribute.value)?;
        let value = unescape(raw).map_err(|e| xml_error(reader, e))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn append_text(stack: &mut [XmlElement], text: &str) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(XmlNode::Text(previous)) = parent.children.last_mut() {
        previous.push_str(text);
    } else {
        parent.children.push(XmlNode::Text(text.to_string()));
    }
}

/// Parse an XML document into its root element.
pub fn parse_document(text: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|e| xml_error(&reader, e))?;
        match event {
            Event::Start(start) => {
                let element = element_from_start(&reader, &start)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = element_from_start(&reader, &start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(element)),
                    None => root = Some(element),
                }
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(xml_error(&reader, "unexpected closing tag"));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(element)),
                    None => root = Some(element),
                }
            }
            Event::Text(bytes) => {
                let raw = utf8(&reader, &bytes)?;
                let value = unescape(raw).map_err(|e| xml_error(&reader, e))?;
                append_text(&mut stack, &value);
            }
            Event::CData(bytes) => {
                let raw = utf8(&reader, &bytes)?.to_string();
                append_text(&mut stack, &raw);
            }
            Event::GeneralRef(reference) => {
                let name = utf8(&reader, &reference)?;
                let escaped = format!("&{name};");
                let value = unescape(&escaped).map_err(|e| xml_error(&reader, e))?;
                append_text(&mut stack, &value);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(xml_error(&reader, "unexpected end of document"));
    }
    root.ok_or_else(|| xml_error(&reader, "document has no root element"))
}

// =============================================================================
// Document structure
// =============================================================================

/// Text of the first `<item type="...">` at or beneath `node`.
pub fn get_item(node: &XmlElement, item_type: &str) -> Option<String> {
    node.descendants()
        .into_iter()
        .find(|element| element.name == "item" && element.attribute("type") == Some(item_type))
        .map(XmlElement::text)
}

/// Vernacular language and the sorted list of other languages of a text.
pub fn get_languages(text: &XmlElement) -> Result<(Option<String>, Vec<String>)> {
    let languages = text
        .find("languages")
        .filter(|languages| languages.elements().next().is_some())
        .ok_or_else(|| IngestError::Structure {
            reason: "Missing <languages> tag".to_string(),
        })?;

    let mut vernacular = None;
    let mut other = Vec::new();
    for language in languages.elements() {
        if vernacular.is_none() && language.attribute("vernacular") == Some("true") {
            vernacular = language.attribute("lang").map(str::to_string);
        } else if let Some(lang) = language.attribute("lang") {
            other.push(lang.to_string());
        }
    }
    other.sort();
    Ok((vernacular, other))
}

/// One phrase of an interlinear text with its context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseContext<'a> {
    pub title: Option<String>,
    pub segnum: Option<String>,
    pub vernacular: Option<String>,
    pub other_langs: Vec<String>,
    pub phrase: &'a XmlElement,
}

/// Every phrase of every `<interlinear-text>` in the document.
pub fn separate_examples(document: &XmlElement) -> Result<Vec<PhraseContext<'_>>> {
    let mut phrases = Vec::new();
    for text in document.elements() {
        if text.name != "interlinear-text" {
            return Err(IngestError::Structure {
                reason: format!("unexpected <{}> in document", text.name),
            });
        }
        let title = get_item(text, "title");
        let (vernacular, other_langs) = get_languages(text)?;
        let Some(paragraphs) = text.find("paragraphs") else {
            continue;
        };
        for paragraph in paragraphs.elements() {
            let container = paragraph.find("phrases").ok_or_else(|| IngestError::Structure {
                reason: format!(
                    "paragraph without <phrases> in text {}",
                    title.as_deref().unwrap_or("?")
                ),
            })?;
            for phrase in container.elements() {
                phrases.push(PhraseContext {
                    title: title.clone(),
                    segnum: get_item(phrase, "segnum"),
                    vernacular: vernacular.clone(),
                    other_langs: other_langs.clone(),
                    phrase,
                });
            }
        }
    }
    Ok(phrases)
}

// =============================================================================
// Gloss records
// =============================================================================

/// Example columns contributed by one phrase of the gloss document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossRecord {
    pub text_id: String,
    pub segnum: String,
    /// Column name -> list value (`Analyzed_Word`, `Gloss`, `Morphemes`).
    pub example: BTreeMap<String, Vec<String>>,
}

fn item_in_lang(node: &XmlElement, item_type: &str, lang: Option<&str>) -> Option<String> {
    node.find_all("item")
        .find(|item| {
            item.attribute("type") == Some(item_type)
                && (lang.is_none() || item.attribute("lang") == lang)
        })
        .map(XmlElement::text)
}

fn gloss_record(context: &PhraseContext<'_>) -> GlossRecord {
    let vernacular = context.vernacular.as_deref();
    let analysis = context.other_langs.first().map(String::as_str);
    let mut words = Vec::new();
    let mut glosses = Vec::new();
    let mut morphemes = Vec::new();

    let word_nodes = context
        .phrase
        .find("words")
        .into_iter()
        .flat_map(|words| words.find_all("word"));
    for word in word_nodes {
        let Some(form) = item_in_lang(word, "txt", vernacular) else {
            continue;
        };
        let morphs: Vec<&XmlElement> = word
            .find("morphemes")
            .map(|container| container.find_all("morph").collect())
            .unwrap_or_default();
        let morph_glosses: Vec<String> = morphs
            .iter()
            .filter_map(|morph| item_in_lang(morph, "gls", analysis))
            .collect();
        let gloss = if morph_glosses.is_empty() {
            item_in_lang(word, "gls", analysis).unwrap_or_default()
        } else {
            morph_glosses.join("-")
        };
        let forms: Vec<String> = morphs
            .iter()
            .filter_map(|morph| item_in_lang(morph, "txt", vernacular))
            .collect();
        words.push(form);
        glosses.push(gloss);
        morphemes.push(forms.join("-"));
    }

    let mut example = BTreeMap::new();
    example.insert("Analyzed_Word".to_string(), words);
    example.insert("Gloss".to_string(), glosses);
    example.insert("Morphemes".to_string(), morphemes);
    GlossRecord {
        text_id: context.title.clone().unwrap_or_default(),
        segnum: context.segnum.clone().unwrap_or_default(),
        example,
    }
}

/// Gloss records of every phrase in a parsed document.
pub fn gloss_records(document: &XmlElement) -> Result<Vec<GlossRecord>> {
    Ok(separate_examples(document)?
        .iter()
        .map(gloss_record)
        .collect())
}

/// Read all gloss records from a `.flextext` file.
pub fn read_glosses(path: &Path) -> Result<Vec<GlossRecord>> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let document = parse_document(&text)?;
    let records = gloss_records(&document)?;
    debug!(path = %path.display(), phrases = records.len(), "read gloss document");
    Ok(records)
}
