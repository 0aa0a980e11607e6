//! Conversion engine: transcodes fragment bytes between catalog kinds.
//!
//! Dispatch is a closed match on `(from, to)` kind pairs. Any pair the
//! catalog does not list has no converter, and every failure (unknown
//! pair, malformed input, codec error) surfaces as
//! [`FragmentError::UnsupportedConversion`].

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use pulldown_cmark::{html, Options, Parser};
use scraper::{ElementRef, Html, Node};

use crate::catalog::ContentKind::{self, *};
use crate::error::{FragmentError, Result};
use crate::media_type::MediaType;

/// A single transcoding routine.
pub type Converter = fn(&[u8]) -> std::result::Result<Vec<u8>, String>;

/// Look up the converter for a kind pair.
///
/// Identity pairs are handled by [`convert`] before lookup and have no entry.
pub fn converter(from: ContentKind, to: ContentKind) -> Option<Converter> {
    let f: Converter = match (from, to) {
        (TextMarkdown, TextHtml) => markdown_to_html,
        (TextMarkdown, TextPlain) => passthrough_text,
        (TextHtml, TextPlain) => html_to_text,
        (TextCsv, ApplicationJson) => csv_to_json,
        (TextCsv, TextPlain) => passthrough_text,
        (ApplicationJson, ApplicationYaml) => json_to_yaml,
        (ApplicationJson, TextPlain) => passthrough_text,
        (ApplicationYaml, ApplicationJson) => yaml_to_json,
        (ApplicationYaml, TextPlain) => passthrough_text,
        (f, t) if f != t && f.is_image() && t.is_image() => image_encoder(t)?,
        _ => return None,
    };
    Some(f)
}

/// Convert `data` from one media type to another.
///
/// When both sides share an essence the input handle is returned as-is.
pub fn convert(data: Bytes, from: &MediaType, to: &MediaType) -> Result<Bytes> {
    let unsupported = |reason: &str| FragmentError::conversion(from.essence(), to.essence(), reason);

    let from_kind = ContentKind::from_media_type(from).ok_or_else(|| unsupported("unknown source type"))?;
    let to_kind = ContentKind::from_media_type(to).ok_or_else(|| unsupported("unknown target type"))?;

    if from_kind == to_kind {
        return Ok(data);
    }

    if !from_kind.can_convert_to(to_kind) {
        tracing::warn!(from = %from_kind, to = %to_kind, "conversion not in catalog");
        return Err(unsupported("pair not in catalog"));
    }

    let f = converter(from_kind, to_kind).ok_or_else(|| unsupported("no converter registered"))?;

    tracing::debug!(from = %from_kind, to = %to_kind, input_bytes = data.len(), "converting");
    let out = f(&data).map_err(|reason| unsupported(&reason))?;
    Ok(Bytes::from(out))
}

/// Convert by kind, for callers that already resolved the catalog entry.
pub fn convert_kind(data: Bytes, from: ContentKind, to: ContentKind) -> Result<Bytes> {
    let from = MediaType::parse(from.mime())?;
    let to = MediaType::parse(to.mime())?;
    convert(data, &from, &to)
}

fn utf8(data: &[u8]) -> std::result::Result<&str, String> {
    std::str::from_utf8(data).map_err(|e| format!("input is not valid UTF-8: {e}"))
}

fn passthrough_text(data: &[u8]) -> std::result::Result<Vec<u8>, String> {
    utf8(data)?;
    Ok(data.to_vec())
}

fn markdown_to_html(data: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let source = utf8(data)?;
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;

    let mut rendered = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut rendered, Parser::new_ext(source, options));
    Ok(rendered.into_bytes())
}

const SKIPPED_ELEMENTS: &[&str] = &["head", "script", "style", "template", "noscript"];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p",
    "pre", "section", "table", "tr", "ul",
];

fn html_to_text(data: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let document = Html::parse_document(utf8(data)?);
    let mut text = String::new();
    collect_text(document.root_element(), &mut text, false);
    Ok(text.trim().as_bytes().to_vec())
}

fn collect_text(element: ElementRef<'_>, out: &mut String, preformatted: bool) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) if preformatted => out.push_str(text),
            Node::Text(text) => push_collapsed(text, out),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_ELEMENTS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    trim_trailing_spaces(out);
                    out.push('\n');
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out, preformatted || name == "pre");
                }
                if BLOCK_ELEMENTS.contains(&name) {
                    trim_trailing_spaces(out);
                    if !out.is_empty() && !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
            }
            _ => {}
        }
    }
}

/// Append `text` with every whitespace run folded to one space, never
/// starting a line with a space.
fn push_collapsed(text: &str, out: &mut String) {
    let at_line_start = |out: &String| out.is_empty() || out.ends_with(|c: char| c == '\n' || c == ' ');

    if text.starts_with(char::is_whitespace) && !at_line_start(out) {
        out.push(' ');
    }
    let mut words = text.split_whitespace().peekable();
    let had_words = words.peek().is_some();
    while let Some(word) = words.next() {
        out.push_str(word);
        if words.peek().is_some() {
            out.push(' ');
        }
    }
    if had_words && text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

fn trim_trailing_spaces(out: &mut String) {
    let trimmed = out.trim_end_matches(' ').len();
    out.truncate(trimmed);
}

fn csv_to_json(data: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| format!("malformed CSV header: {e}"))?
        .clone();
    if headers.is_empty() {
        return Err("CSV has no header row".to_string());
    }
    let mut seen = std::collections::HashSet::new();
    if let Some(duplicate) = headers.iter().find(|name| !seen.insert(*name)) {
        return Err(format!("malformed CSV header: duplicate column {duplicate:?}"));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| format!("malformed CSV: {e}"))?;
        let row: serde_json::Map<String, serde_json::Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(key, value)| (key.to_string(), serde_json::Value::String(value.to_string())))
            .collect();
        rows.push(serde_json::Value::Object(row));
    }

    serde_json::to_vec_pretty(&rows).map_err(|e| e.to_string())
}

fn json_to_yaml(data: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let value: serde_json::Value =
        serde_json::from_slice(data).map_err(|e| format!("invalid JSON: {e}"))?;
    serde_yaml::to_string(&value)
        .map(String::into_bytes)
        .map_err(|e| e.to_string())
}

fn yaml_to_json(data: &[u8]) -> std::result::Result<Vec<u8>, String> {
    let value: serde_json::Value =
        serde_yaml::from_slice(data).map_err(|e| format!("invalid YAML: {e}"))?;
    serde_json::to_vec_pretty(&value).map_err(|e| e.to_string())
}

fn image_format(kind: ContentKind) -> Option<ImageFormat> {
    match kind {
        ImagePng => Some(ImageFormat::Png),
        ImageJpeg => Some(ImageFormat::Jpeg),
        ImageWebp => Some(ImageFormat::WebP),
        ImageGif => Some(ImageFormat::Gif),
        ImageAvif => Some(ImageFormat::Avif),
        _ => None,
    }
}

fn image_encoder(target: ContentKind) -> Option<Converter> {
    let f: Converter = match target {
        ImagePng => |d| reencode(d, ImagePng),
        ImageJpeg => |d| reencode(d, ImageJpeg),
        ImageWebp => |d| reencode(d, ImageWebp),
        ImageGif => |d| reencode(d, ImageGif),
        ImageAvif => |d| reencode(d, ImageAvif),
        _ => return None,
    };
    Some(f)
}

fn reencode(data: &[u8], target: ContentKind) -> std::result::Result<Vec<u8>, String> {
    let format = image_format(target).ok_or_else(|| format!("{target} is not an image type"))?;

    let decoded = image::load_from_memory(data).map_err(|e| format!("cannot decode image: {e}"))?;
    let image = match target {
        // JPEG has no alpha channel
        ImageJpeg => DynamicImage::ImageRgb8(decoded.to_rgb8()),
        ImagePng => decoded,
        _ => DynamicImage::ImageRgba8(decoded.to_rgba8()),
    };

    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, format)
        .map_err(|e| format!("cannot encode {target}: {e}"))?;
    Ok(out.into_inner())
}
