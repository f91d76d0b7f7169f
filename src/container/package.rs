//! OOXML package access: parts, relationships, content types and core
//! properties.

use super::xml::{self, XmlElement};
use crate::error::{Error, Result};
use crate::model::{detect_mime_type, Metadata};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Relationship type suffix for images.
pub const REL_IMAGE: &str = "/image";
/// Relationship type suffix for drawings.
pub const REL_DRAWING: &str = "/drawing";
/// Relationship type suffix for slide layouts.
pub const REL_SLIDE_LAYOUT: &str = "/slideLayout";
/// Relationship type suffix for notes slides.
pub const REL_NOTES_SLIDE: &str = "/notesSlide";

/// One entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Relationship id (`rId3`)
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Package-absolute target part name (no leading slash)
    pub target: String,
    /// Target lives outside the package
    pub external: bool,
}

/// Relationships of one source part, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    by_id: HashMap<String, Relationship>,
    order: Vec<String>,
}

impl Relationships {
    /// Look up a relationship by id.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// First relationship whose type ends with `suffix`.
    pub fn find_type(&self, suffix: &str) -> Option<&Relationship> {
        self.iter().find(|r| r.rel_type.ends_with(suffix))
    }

    /// All relationships in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Number of relationships.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether there are no relationships.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Dublin-core document properties from `docProps/core.xml`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreProperties {
    /// Title
    pub title: Option<String>,
    /// Author (`dc:creator`)
    pub author: Option<String>,
    /// Subject
    pub subject: Option<String>,
    /// Keywords
    pub keywords: Option<String>,
    /// Creation timestamp (W3CDTF string)
    pub created: Option<String>,
    /// Last modification timestamp (W3CDTF string)
    pub modified: Option<String>,
}

impl CoreProperties {
    /// Insert non-empty properties into a metadata map.
    pub fn fill(&self, metadata: &mut Metadata) {
        let fields = [
            ("title", &self.title),
            ("author", &self.author),
            ("subject", &self.subject),
            ("keywords", &self.keywords),
            ("created", &self.created),
            ("modified", &self.modified),
        ];
        for (key, value) in fields {
            if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                metadata.insert(key.to_string(), v.trim().to_string());
            }
        }
    }
}

/// Largest buffer reserved up front for a part; bigger parts grow as read.
const MAX_PREALLOC: usize = 64 << 20;

/// Buffer size to reserve for a part whose header declares `declared` bytes.
fn initial_capacity(declared: u64) -> usize {
    usize::try_from(declared).map_or(MAX_PREALLOC, |n| n.min(MAX_PREALLOC))
}

/// An opened OOXML zip package.
pub struct Package {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    content_types: ContentTypes,
}

impl Package {
    /// Open a package from its raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut package = Self {
            archive,
            content_types: ContentTypes::default(),
        };
        if let Some(data) = package.read_part_opt("[Content_Types].xml")? {
            package.content_types = ContentTypes::parse(&data)?;
        }
        Ok(package)
    }

    /// Whether the package contains a part.
    pub fn has_part(&self, name: &str) -> bool {
        self.archive.index_for_name(name.trim_start_matches('/')).is_some()
    }

    /// Read a part that must exist.
    pub fn read_part(&mut self, name: &str) -> Result<Vec<u8>> {
        self.read_part_opt(name)?
            .ok_or_else(|| Error::ContainerRead(format!("missing part {}", name)))
    }

    /// Read a part if present.
    pub fn read_part_opt(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let name = name.trim_start_matches('/');
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut data = Vec::with_capacity(initial_capacity(file.size()));
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    /// Read and parse an XML part that must exist.
    pub fn read_xml(&mut self, name: &str) -> Result<XmlElement> {
        let data = self.read_part(name)?;
        xml::parse(&data)
    }

    /// Read and parse an XML part if present.
    pub fn read_xml_opt(&mut self, name: &str) -> Result<Option<XmlElement>> {
        match self.read_part_opt(name)? {
            Some(data) => xml::parse(&data).map(Some),
            None => Ok(None),
        }
    }

    /// Relationships declared by `part` (empty when it has none).
    pub fn relationships(&mut self, part: &str) -> Result<Relationships> {
        let Some(root) = self.read_xml_opt(&rels_path(part))? else {
            return Ok(Relationships::default());
        };
        let mut rels = Relationships::default();
        for el in root.children_named("Relationship") {
            let (Some(id), Some(target)) = (el.attr("Id"), el.attr("Target")) else {
                continue;
            };
            let external = el.attr("TargetMode") == Some("External");
            let target = if external {
                target.to_string()
            } else {
                resolve_target(part, target)
            };
            rels.order.push(id.to_string());
            rels.by_id.insert(
                id.to_string(),
                Relationship {
                    id: id.to_string(),
                    rel_type: el.attr("Type").unwrap_or_default().to_string(),
                    target,
                    external,
                },
            );
        }
        Ok(rels)
    }

    /// Declared content type of a part, falling back to magic-byte sniffing.
    pub fn content_type(&self, part: &str, data: &[u8]) -> String {
        self.content_types
            .lookup(part)
            .map(str::to_string)
            .or_else(|| detect_mime_type(data).map(str::to_string))
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }

    /// Core document properties (default when the part is absent).
    pub fn core_properties(&mut self) -> Result<CoreProperties> {
        let Some(root) = self.read_xml_opt("docProps/core.xml")? else {
            return Ok(CoreProperties::default());
        };
        let text = |name: &str| root.child(name).map(|e| e.text()).filter(|t| !t.is_empty());
        Ok(CoreProperties {
            title: text("title"),
            author: text("creator"),
            subject: text("subject"),
            keywords: text("keywords"),
            created: text("created"),
            modified: text("modified"),
        })
    }
}

#[derive(Debug, Default)]
struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    fn parse(data: &[u8]) -> Result<Self> {
        let root = xml::parse(data)?;
        let mut types = Self::default();
        for el in root.elements() {
            match (el.name.as_str(), el.attr("ContentType")) {
                ("Default", Some(ct)) => {
                    if let Some(ext) = el.attr("Extension") {
                        types.defaults.insert(ext.to_lowercase(), ct.to_string());
                    }
                }
                ("Override", Some(ct)) => {
                    if let Some(part) = el.attr("PartName") {
                        types
                            .overrides
                            .insert(part.trim_start_matches('/').to_string(), ct.to_string());
                    }
                }
                _ => {}
            }
        }
        Ok(types)
    }

    fn lookup(&self, part: &str) -> Option<&str> {
        let part = part.trim_start_matches('/');
        if let Some(ct) = self.overrides.get(part) {
            return Some(ct);
        }
        let ext = part.rsplit_once('.')?.1.to_lowercase();
        self.defaults.get(&ext).map(String::as_str)
    }
}

/// Path of the relationships part for `part` (`word/_rels/document.xml.rels`).
pub fn rels_path(part: &str) -> String {
    let part = part.trim_start_matches('/');
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target relative to its source part.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let base = source_part
        .trim_start_matches('/')
        .rsplit_once('/')
        .map_or("", |(dir, _)| dir);
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
