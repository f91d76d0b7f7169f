//! Flat HTML body produced by an external converter for legacy `.doc` files.

use super::xml::{self, XmlElement};
use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// An image delivered alongside the HTML body.
#[derive(Debug, Clone)]
pub struct HtmlImage {
    /// Value of the `src` attribute that references this image
    pub src: String,
    /// Raw image bytes
    pub data: Vec<u8>,
    /// Declared MIME type
    pub content_type: String,
}

/// Output of a fallback conversion.
#[derive(Debug, Clone, Default)]
pub struct HtmlConversion {
    /// HTML (or XHTML) body markup
    pub html: String,
    /// Images referenced from the markup by `src`
    pub images: Vec<HtmlImage>,
    /// Converter diagnostics, surfaced as warnings
    pub messages: Vec<String>,
}

/// External service that renders a legacy binary document as HTML.
///
/// Implementations may shell out or call a library; they are constructed by
/// the caller and injected into the converter.
pub trait HtmlFallback: Send + Sync {
    /// Convert the document bytes into an HTML body.
    fn convert(&self, source: &[u8]) -> Result<HtmlConversion>;
}

impl HtmlConversion {
    /// Parse the markup into a lenient element tree.
    pub fn parse(&self) -> Result<XmlElement> {
        xml::parse_lenient(self.html.as_bytes())
    }

    /// Resolve an `img` source: inline `data:` URIs are decoded, anything
    /// else is looked up among the delivered images.
    pub fn resolve_image(&self, src: &str) -> Option<(Vec<u8>, String)> {
        if let Some(rest) = src.strip_prefix("data:") {
            return decode_data_uri(rest);
        }
        self.images
            .iter()
            .find(|img| img.src == src)
            .map(|img| (img.data.clone(), img.content_type.clone()))
    }
}

/// Decode the part of a data URI after `data:`. Only base64 payloads are
/// accepted.
fn decode_data_uri(rest: &str) -> Option<(Vec<u8>, String)> {
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let data = STANDARD.decode(compact).ok()?;
    let mime = if mime.is_empty() {
        "application/octet-stream"
    } else {
        mime
    };
    Some((data, mime.to_string()))
}
