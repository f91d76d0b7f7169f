//! Spreadsheet (`.xlsx`) adapter.

use super::{numbered, AdapterContext, Extraction, ImageCursor, SourceAdapter};
use crate::container::{CellValue, SheetImage, WorkbookReader, Worksheet};
use crate::error::Result;
use crate::model::Block;

/// One section per worksheet: header, table (or empty note), pictures, rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetAdapter;

impl SourceAdapter for SpreadsheetAdapter {
    fn parse(&self, bytes: Vec<u8>, ctx: &AdapterContext<'_>) -> Result<Extraction> {
        let mut reader = WorkbookReader::open(bytes)?;
        let mut out = Extraction::default();
        reader.core_properties()?.fill(&mut out.metadata);

        let sheets = reader.worksheets(ctx.extract_images)?;
        out.metadata
            .insert("sheet_count".to_string(), sheets.len().to_string());
        out.metadata.insert(
            "sheet_names".to_string(),
            sheets
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );

        let mut cursor = ImageCursor::new();
        for sheet in sheets {
            sheet_blocks(sheet, &mut cursor, &mut out);
        }
        out.assets = cursor.into_assets();
        Ok(out)
    }
}

fn sheet_blocks(sheet: Worksheet, cursor: &mut ImageCursor, out: &mut Extraction) {
    out.blocks
        .push(Block::raw(format!("# Sheet: {}\n", sheet.name)));

    match Block::table(non_blank_rows(&sheet.rows)) {
        Some(table) => out.blocks.push(table),
        None => out.blocks.push(Block::raw("*Empty sheet*\n")),
    }

    for image in sheet.images {
        match image {
            SheetImage::Embedded(image) => {
                let name = cursor.push(image.data, image.content_type, |i| {
                    numbered("excel_image_", i)
                });
                out.blocks.push(Block::image(name.clone(), name));
            }
            SheetImage::Unreadable { part_name, reason } => {
                let reason = format!("{}: {}", part_name, reason);
                out.warn(format!("sheet '{}': image unreadable: {}", sheet.name, reason));
                out.blocks.push(Block::image_failure(reason));
            }
        }
    }

    out.blocks.push(Block::Separator);
}

/// Rows rendered as text, with rows whose every cell is blank removed.
pub fn non_blank_rows(rows: &[Vec<CellValue>]) -> Vec<Vec<String>> {
    rows.iter()
        .filter(|row| row.iter().any(|c| !c.is_blank()))
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect()
}
