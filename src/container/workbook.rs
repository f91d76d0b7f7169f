//! SpreadsheetML reader (`.xlsx`).
//!
//! Only cached cell values are read; formulas are never evaluated here.
//! Numbers whose cell style carries a date or time format are converted to
//! calendar values using the workbook's date system.

use super::package::{CoreProperties, Package, REL_DRAWING, REL_IMAGE};
use super::xml::XmlElement;
use super::EmbeddedImage;
use crate::error::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::collections::HashMap;
use std::fmt;

/// Highest row number a worksheet can hold.
pub const MAX_ROWS: usize = 1_048_576;

/// Number of columns a worksheet can hold (`A` to `XFD`).
pub const MAX_COLUMNS: usize = 16_384;

/// Largest serial the 1900 date system maps to (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

/// A cached cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// No value
    Empty,
    /// Shared, inline or formula string
    Text(String),
    /// Numeric value
    Number(f64),
    /// Number formatted as a date
    Date(NaiveDate),
    /// Number formatted as a date with a time of day
    DateTime(NaiveDateTime),
    /// Number formatted as a time of day
    Time(NaiveTime),
    /// Boolean
    Bool(bool),
    /// Error literal such as `#DIV/0!`
    Error(String),
}

impl CellValue {
    /// Whether the value renders as blank text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(t) => t.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(t) | CellValue::Error(t) => f.write_str(t),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
        }
    }
}

/// A picture anchored on a sheet's drawing.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetImage {
    /// Image part read from the package
    Embedded(EmbeddedImage),
    /// Image part that is missing or damaged
    Unreadable {
        /// Package part name
        part_name: String,
        /// Why reading failed
        reason: String,
    },
}

/// One worksheet with its cell grid and embedded pictures.
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    /// Sheet tab name
    pub name: String,
    /// Non-empty rows in sheet order; each row is indexed by column from
    /// the first used column
    pub rows: Vec<Vec<CellValue>>,
    /// Pictures anchored on the sheet's drawing, in drawing order
    pub images: Vec<SheetImage>,
}

/// How a number format presents its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberKind {
    Plain,
    Date,
    DateTime,
    Time,
}

/// Number format kind per cell style index (`c@s`).
#[derive(Debug, Clone, Default)]
struct CellStyles {
    kinds: Vec<NumberKind>,
    date1904: bool,
}

impl CellStyles {
    fn parse(styles: &XmlElement) -> Self {
        let mut custom = HashMap::new();
        if let Some(formats) = styles.child("numFmts") {
            for fmt in formats.children_named("numFmt") {
                let id = fmt.attr("numFmtId").and_then(|i| i.parse::<u32>().ok());
                if let (Some(id), Some(code)) = (id, fmt.attr("formatCode")) {
                    custom.insert(id, format_kind(code));
                }
            }
        }
        let kinds = styles
            .child("cellXfs")
            .map(|xfs| {
                xfs.children_named("xf")
                    .map(|xf| {
                        let id = xf
                            .attr("numFmtId")
                            .and_then(|i| i.parse::<u32>().ok())
                            .unwrap_or(0);
                        custom.get(&id).copied().unwrap_or_else(|| builtin_kind(id))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            kinds,
            date1904: false,
        }
    }

    fn number(&self, n: f64, style: Option<&str>) -> CellValue {
        let kind = style
            .and_then(|s| s.trim().parse::<usize>().ok())
            .and_then(|i| self.kinds.get(i))
            .copied()
            .unwrap_or(NumberKind::Plain);
        if kind == NumberKind::Plain {
            return CellValue::Number(n);
        }
        let Some(dt) = excel_datetime(n, self.date1904) else {
            return CellValue::Number(n);
        };
        match kind {
            NumberKind::Date => CellValue::Date(dt.date()),
            NumberKind::Time if n < 1.0 => CellValue::Time(dt.time()),
            _ => CellValue::DateTime(dt),
        }
    }
}

/// Kind of a built-in number format id.
fn builtin_kind(id: u32) -> NumberKind {
    match id {
        14..=17 => NumberKind::Date,
        22 => NumberKind::DateTime,
        18..=21 | 45..=47 => NumberKind::Time,
        _ => NumberKind::Plain,
    }
}

/// Kind of a custom format code, judged from its first section with quoted
/// literals, escapes and bracketed parts removed.
fn format_kind(code: &str) -> NumberKind {
    let mut tokens = String::new();
    let mut in_quote = false;
    let mut in_bracket = false;
    let mut chars = code.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' if !in_bracket => in_quote = !in_quote,
            _ if in_quote => {}
            '[' => in_bracket = true,
            ']' => in_bracket = false,
            _ if in_bracket => {}
            ';' => break,
            '\\' | '_' | '*' => {
                chars.next();
            }
            c => tokens.push(c.to_ascii_lowercase()),
        }
    }
    let time = tokens.contains('h') || tokens.contains('s');
    // `m` means minutes next to hours or seconds
    let date = tokens.contains('y') || tokens.contains('d') || (tokens.contains('m') && !time);
    match (date, time) {
        (true, true) => NumberKind::DateTime,
        (true, false) => NumberKind::Date,
        (false, true) => NumberKind::Time,
        (false, false) => NumberKind::Plain,
    }
}

/// Calendar value of a date serial, rounded to the second.
///
/// The 1900 system counts the nonexistent 1900-02-29 as serial 60, so
/// serials below it start one day later.
fn excel_datetime(serial: f64, date1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let base = if date1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let seconds = (serial * 86_400.0).round() as i64;
    base.and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_seconds(seconds)?)
}

/// Reader over an opened workbook package.
pub struct WorkbookReader {
    package: Package,
    workbook_part: String,
}

impl WorkbookReader {
    /// Open a `.xlsx` from its bytes.
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let mut package = Package::from_bytes(bytes)?;
        let workbook_part = package
            .relationships("")?
            .find_type("/officeDocument")
            .map(|r| r.target.clone())
            .unwrap_or_else(|| "xl/workbook.xml".to_string());
        Ok(Self {
            package,
            workbook_part,
        })
    }

    /// Core document properties.
    pub fn core_properties(&mut self) -> Result<CoreProperties> {
        self.package.core_properties()
    }

    /// Read every worksheet in tab order. Pictures are only loaded when
    /// `with_images` is set.
    pub fn worksheets(&mut self, with_images: bool) -> Result<Vec<Worksheet>> {
        let rels = self.package.relationships(&self.workbook_part)?;
        let workbook = self.package.read_xml(&self.workbook_part)?;
        let shared = match rels.find_type("/sharedStrings") {
            Some(rel) => {
                let part = rel.target.clone();
                self.shared_strings(&part)?
            }
            None => Vec::new(),
        };
        let mut styles = match rels.find_type("/styles") {
            Some(rel) => {
                let part = rel.target.clone();
                self.package
                    .read_xml_opt(&part)?
                    .map(|root| CellStyles::parse(&root))
                    .unwrap_or_default()
            }
            None => CellStyles::default(),
        };
        styles.date1904 = workbook
            .child("workbookPr")
            .and_then(|pr| pr.attr("date1904"))
            .is_some_and(|v| v == "1" || v == "true");

        let mut sheets = Vec::new();
        let Some(list) = workbook.child("sheets") else {
            return Ok(sheets);
        };
        for sheet in list.children_named("sheet") {
            let name = sheet.attr("name").unwrap_or_default().to_string();
            let Some(rel) = sheet.prefixed_attr("id").and_then(|id| rels.get(id)) else {
                log::warn!("sheet '{}' has no worksheet part", name);
                continue;
            };
            // Chart sheets and dialog sheets carry no cell grid
            if !rel.rel_type.ends_with("/worksheet") {
                continue;
            }
            let part = rel.target.clone();
            let root = self.package.read_xml(&part)?;
            let rows = read_rows(&root, &shared, &styles);
            let images = if with_images {
                self.sheet_images(&part)?
            } else {
                Vec::new()
            };
            sheets.push(Worksheet { name, rows, images });
        }
        Ok(sheets)
    }

    fn shared_strings(&mut self, part: &str) -> Result<Vec<String>> {
        let Some(root) = self.package.read_xml_opt(part)? else {
            return Ok(Vec::new());
        };
        Ok(root.children_named("si").map(rich_text).collect())
    }

    fn sheet_images(&mut self, sheet_part: &str) -> Result<Vec<SheetImage>> {
        let rels = self.package.relationships(sheet_part)?;
        let mut images = Vec::new();
        let drawings: Vec<String> = rels
            .iter()
            .filter(|r| r.rel_type.ends_with(REL_DRAWING) && !r.external)
            .map(|r| r.target.clone())
            .collect();

        for drawing in drawings {
            let Some(root) = self.package.read_xml_opt(&drawing)? else {
                continue;
            };
            let drawing_rels = self.package.relationships(&drawing)?;
            let mut blips = Vec::new();
            root.descendants("blip", &mut blips);
            for blip in blips {
                let Some(rel) = blip
                    .prefixed_attr("embed")
                    .and_then(|id| drawing_rels.get(id))
                else {
                    continue;
                };
                if rel.external || !rel.rel_type.ends_with(REL_IMAGE) {
                    continue;
                }
                let target = rel.target.clone();
                // A damaged image entry only affects this picture
                let image = match self.package.read_part_opt(&target) {
                    Ok(Some(data)) => {
                        let content_type = self.package.content_type(&target, &data);
                        SheetImage::Embedded(EmbeddedImage {
                            part_name: target,
                            data,
                            content_type,
                        })
                    }
                    Ok(None) => SheetImage::Unreadable {
                        part_name: target,
                        reason: "image part is missing".to_string(),
                    },
                    Err(e) => SheetImage::Unreadable {
                        part_name: target,
                        reason: e.to_string(),
                    },
                };
                images.push(image);
            }
        }
        Ok(images)
    }
}

/// Text of an `si`/`is` element, skipping phonetic runs.
fn rich_text(el: &XmlElement) -> String {
    let mut out = String::new();
    for child in el.elements() {
        match child.name.as_str() {
            "t" => out.push_str(&child.text()),
            "r" => {
                if let Some(t) = child.child("t") {
                    out.push_str(&t.text());
                }
            }
            _ => {}
        }
    }
    out
}

/// Cell grid of a worksheet. Cells and rows outside the sheet limits are
/// ignored, and skipped row numbers are not padded.
fn read_rows(sheet: &XmlElement, shared: &[String], styles: &CellStyles) -> Vec<Vec<CellValue>> {
    let Some(data) = sheet.child("sheetData") else {
        return Vec::new();
    };
    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for row in data.children_named("row") {
        if let Some(r) = row.attr("r") {
            if !r.trim().parse::<usize>().is_ok_and(|r| (1..=MAX_ROWS).contains(&r)) {
                log::debug!("ignoring row with reference {:?}", r);
                continue;
            }
        }
        if rows.len() >= MAX_ROWS {
            break;
        }
        let mut cells: Vec<CellValue> = Vec::new();
        for c in row.children_named("c") {
            let col = match c.attr("r") {
                Some(reference) => match column_index(reference) {
                    Some(col) => col,
                    None => {
                        log::debug!("ignoring cell with reference {:?}", reference);
                        continue;
                    }
                },
                None => cells.len(),
            };
            if col >= MAX_COLUMNS {
                continue;
            }
            if col >= cells.len() {
                cells.resize(col + 1, CellValue::Empty);
            }
            cells[col] = cell_value(c, shared, styles);
        }
        rows.push(cells);
    }
    trim_leading_columns(&mut rows);
    rows
}

fn cell_value(c: &XmlElement, shared: &[String], styles: &CellStyles) -> CellValue {
    let raw = c.child("v").map(|v| v.text());
    match c.attr("t").unwrap_or("n") {
        "s" => raw
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|i| shared.get(i))
            .map(|s| CellValue::Text(s.clone()))
            .unwrap_or(CellValue::Empty),
        "inlineStr" => c
            .child("is")
            .map(|is| CellValue::Text(rich_text(is)))
            .unwrap_or(CellValue::Empty),
        "b" => match raw.as_deref().map(str::trim) {
            Some("1") | Some("true") => CellValue::Bool(true),
            Some(_) => CellValue::Bool(false),
            None => CellValue::Empty,
        },
        "e" => raw.map(CellValue::Error).unwrap_or(CellValue::Empty),
        "str" => raw.map(CellValue::Text).unwrap_or(CellValue::Empty),
        _ => match raw {
            Some(v) => match v.trim().parse::<f64>() {
                Ok(n) => styles.number(n, c.attr("s")),
                Err(_) => CellValue::Text(v),
            },
            None => CellValue::Empty,
        },
    }
}

/// Drop columns left of the first column holding any value.
fn trim_leading_columns(rows: &mut [Vec<CellValue>]) {
    let first = rows
        .iter()
        .filter_map(|row| row.iter().position(|c| !c.is_blank()))
        .min()
        .unwrap_or(0);
    if first == 0 {
        return;
    }
    for row in rows.iter_mut() {
        let n = first.min(row.len());
        row.drain(..n);
    }
}

/// Zero-based column index from a cell reference (`C7` -> 2).
///
/// `None` when the reference has no column letters or names a column past
/// `XFD`.
pub fn column_index(reference: &str) -> Option<usize> {
    let mut index = 0usize;
    let mut seen = false;
    for ch in reference.chars() {
        if !ch.is_ascii_alphabetic() {
            break;
        }
        let digit = ch.to_ascii_uppercase() as usize - 'A' as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
        if index > MAX_COLUMNS {
            return None;
        }
        seen = true;
    }
    if seen {
        Some(index - 1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::xml;

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("C7"), Some(2));
        assert_eq!(column_index("AA10"), Some(26));
        assert_eq!(column_index("12"), None);
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Number(30.0).to_string(), "30");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Bool(true).to_string(), "TRUE");
        assert_eq!(CellValue::Error("#N/A".into()).to_string(), "#N/A");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn test_read_rows() {
        let sheet = xml::parse(
            br#"<worksheet><sheetData>
                <row r="1"><c r="B1" t="s"><v>0</v></c><c r="C1" t="s"><v>1</v></c></row>
                <row r="3"><c r="B3" t="inlineStr"><is><t>Al</t></is></c><c r="C3"><v>30</v></c></row>
                <row r="4"><c r="B4" t="b"><v>0</v></c><c r="D4" t="e"><v>#DIV/0!</v></c></row>
            </sheetData></worksheet>"#,
        )
        .unwrap();
        let shared = vec!["Name".to_string(), "Age".to_string()];
        let rows = read_rows(&sheet, &shared, &CellStyles::default());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![CellValue::Text("Name".into()), CellValue::Text("Age".into())]);
        assert_eq!(rows[1][1], CellValue::Number(30.0));
        assert_eq!(rows[2][0], CellValue::Bool(false));
        assert_eq!(rows[2][2], CellValue::Error("#DIV/0!".into()));
    }

    #[test]
    fn test_column_index_bounds() {
        assert_eq!(column_index("XFD1"), Some(MAX_COLUMNS - 1));
        assert_eq!(column_index("XFE1"), None);
        assert_eq!(column_index("ZZZZZZ1"), None);
        assert_eq!(column_index("ZZZZZZZZZZZZZZZ1"), None);
    }

    #[test]
    fn test_out_of_range_references_ignored() {
        let sheet = xml::parse(
            br#"<worksheet><sheetData>
                <row r="1"><c r="A1" t="inlineStr"><is><t>kept</t></is></c><c r="ZZZZZZZZZZZZZZZ1"><v>1</v></c><c r="ZZZZZZ1"><v>2</v></c></row>
                <row r="1000000000"><c r="A1000000000"><v>3</v></c></row>
                <row r="2"><c r="B2"><v>4</v></c></row>
            </sheetData></worksheet>"#,
        )
        .unwrap();
        let rows = read_rows(&sheet, &[], &CellStyles::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![CellValue::Text("kept".into())]);
        assert_eq!(rows[1], vec![CellValue::Empty, CellValue::Number(4.0)]);
    }

    #[test]
    fn test_format_kinds() {
        assert_eq!(builtin_kind(14), NumberKind::Date);
        assert_eq!(builtin_kind(22), NumberKind::DateTime);
        assert_eq!(builtin_kind(20), NumberKind::Time);
        assert_eq!(builtin_kind(0), NumberKind::Plain);
        assert_eq!(builtin_kind(10), NumberKind::Plain);

        assert_eq!(format_kind("yyyy-mm-dd"), NumberKind::Date);
        assert_eq!(format_kind("[$-409]mmm\\ yy;@"), NumberKind::Date);
        assert_eq!(format_kind("dd/mm/yyyy hh:mm"), NumberKind::DateTime);
        assert_eq!(format_kind("mm:ss"), NumberKind::Time);
        assert_eq!(format_kind("[Red]#,##0.00"), NumberKind::Plain);
        assert_eq!(format_kind("0.0 \"days\""), NumberKind::Plain);
        assert_eq!(format_kind("General"), NumberKind::Plain);
    }

    #[test]
    fn test_excel_serials() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(excel_datetime(45306.0, false).unwrap().date(), date(2024, 1, 15));
        assert_eq!(excel_datetime(1.0, false).unwrap().date(), date(1900, 1, 1));
        assert_eq!(excel_datetime(61.0, false).unwrap().date(), date(1900, 3, 1));
        assert_eq!(excel_datetime(0.0, true).unwrap().date(), date(1904, 1, 1));
        assert_eq!(
            excel_datetime(45306.5, false).unwrap().time(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap()
        );
        assert!(excel_datetime(-1.0, false).is_none());
        assert!(excel_datetime(f64::NAN, false).is_none());
        assert!(excel_datetime(1e12, false).is_none());
    }

    #[test]
    fn test_date_styled_cells() {
        let styles = xml::parse(
            br#"<styleSheet><numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd\ hh:mm"/></numFmts>
                <cellXfs count="4"><xf numFmtId="0"/><xf numFmtId="14"/><xf numFmtId="164"/><xf numFmtId="21"/></cellXfs></styleSheet>"#,
        )
        .unwrap();
        let styles = CellStyles::parse(&styles);
        let sheet = xml::parse(
            br#"<worksheet><sheetData><row r="1">
                <c r="A1"><v>45306</v></c><c r="B1" s="1"><v>45306</v></c>
                <c r="C1" s="2"><v>45306.75</v></c><c r="D1" s="3"><v>0.5</v></c>
                <c r="E1" s="9"><v>7</v></c>
            </row></sheetData></worksheet>"#,
        )
        .unwrap();
        let rows = read_rows(&sheet, &[], &styles);
        let text: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(
            text,
            vec!["45306", "2024-01-15", "2024-01-15 18:00:00", "12:00:00", "7"]
        );
    }

    #[test]
    fn test_rich_text_skips_phonetic() {
        let si = xml::parse(br#"<si><r><t>Hello </t></r><r><t>World</t></r><rPh><t>x</t></rPh></si>"#)
            .unwrap();
        assert_eq!(rich_text(&si), "Hello World");
    }
}
