//! GDAL metadata XML, as stored in TIFF tag 42112.
//!
//! ```text
//! <GDALMetadata>
//!   <Item name="KEY">value</Item>
//!   <Item name="KEY" sample="0">band value</Item>
//! </GDALMetadata>
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;

use quick_xml::events::attributes::Attribute;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::image::Tags;

const ROOT: &str = "GDALMetadata";
const ITEM: &str = "Item";

/// Dataset-level tags plus per-band tags keyed by zero-based sample index.
#[derive(Debug, Default, PartialEq)]
pub struct GdalMetadata {
    pub global: Tags,
    pub bands: BTreeMap<usize, Tags>,
}

fn encode_err(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Encode(format!("GDAL metadata: {}", e))
}

fn decode_err(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Decode(format!("GDAL metadata: {}", e))
}

/// Replaces every non-ASCII character with a numeric character reference.
///
/// TIFF ASCII tags only hold 7-bit text.
fn ascii_only(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(&format!("&#{};", u32::from(c)));
        }
    }
    Cow::Owned(out)
}

/// Encodes free text for a TIFF ASCII tag; reversed by [`decode_ascii`].
pub fn encode_ascii(text: &str) -> String {
    ascii_only(&escape(text)).into_owned()
}

pub fn decode_ascii(text: &str) -> Result<String> {
    unescape(text).map(Cow::into_owned).map_err(decode_err)
}

/// Serializes dataset-level tags as ASCII-only XML.
pub fn to_xml(tags: &Tags) -> Result<String> {
    let mut writer = Writer::new(Vec::new());

    writer
        .write_event(Event::Start(BytesStart::new(ROOT)))
        .map_err(encode_err)?;
    for (key, value) in tags {
        let mut item = BytesStart::new(ITEM);
        item.push_attribute(("name", key.as_str()));
        writer.write_event(Event::Start(item)).map_err(encode_err)?;
        writer
            .write_event(Event::Text(BytesText::new(value)))
            .map_err(encode_err)?;
        writer
            .write_event(Event::End(BytesEnd::new(ITEM)))
            .map_err(encode_err)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(ROOT)))
        .map_err(encode_err)?;

    let xml = String::from_utf8(writer.into_inner()).map_err(encode_err)?;
    Ok(ascii_only(&xml).into_owned())
}

fn attribute_value(attr: Option<Attribute<'_>>) -> Result<Option<String>> {
    attr.map(|a| a.unescape_value().map(|v| v.into_owned()))
        .transpose()
        .map_err(decode_err)
}

fn item_target(e: &BytesStart<'_>) -> Result<Option<(String, Option<usize>)>> {
    let name = attribute_value(e.try_get_attribute("name").map_err(decode_err)?)?;
    let sample = attribute_value(e.try_get_attribute("sample").map_err(decode_err)?)?;
    let Some(name) = name else {
        return Ok(None);
    };
    let sample = match sample {
        Some(s) => Some(s.trim().parse::<usize>().map_err(decode_err)?),
        None => None,
    };
    Ok(Some((name, sample)))
}

fn store(parsed: &mut GdalMetadata, (key, sample): (String, Option<usize>), value: String) {
    match sample {
        Some(index) => {
            parsed.bands.entry(index).or_default().insert(key, value);
        }
        None => {
            parsed.global.insert(key, value);
        }
    }
}

/// Parses the XML, ignoring items without a `name` attribute and items in
/// non-default domains.
pub fn parse(xml: &str) -> Result<GdalMetadata> {
    let mut reader = Reader::from_str(xml);

    let mut parsed = GdalMetadata::default();
    let mut current: Option<(String, Option<usize>)> = None;
    let mut text = String::new();

    loop {
        match reader.read_event().map_err(decode_err)? {
            Event::Start(ref e) if e.name().as_ref() == ITEM.as_bytes() => {
                let has_domain = e.try_get_attribute("domain").map_err(decode_err)?.is_some();
                current = if has_domain { None } else { item_target(e)? };
                text.clear();
            }
            Event::Empty(ref e) if e.name().as_ref() == ITEM.as_bytes() => {
                let has_domain = e.try_get_attribute("domain").map_err(decode_err)?.is_some();
                if !has_domain {
                    if let Some(target) = item_target(e)? {
                        store(&mut parsed, target, String::new());
                    }
                }
            }
            Event::Text(ref e) => {
                if current.is_some() {
                    text.push_str(&e.unescape().map_err(decode_err)?);
                }
            }
            Event::End(ref e) if e.name().as_ref() == ITEM.as_bytes() => {
                if let Some(target) = current.take() {
                    store(&mut parsed, target, std::mem::take(&mut text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parsed)
}
