//! Renderer contract tests through the public API.

use officemd::render::{to_markdown, ImageMode, MarkdownRenderer, RenderOptions};
use officemd::{Block, ImageBlock, InlineRun};

fn md(blocks: &[Block]) -> String {
    to_markdown(blocks, &RenderOptions::default()).unwrap()
}

fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

#[test]
fn test_golden_table() {
    let table = Block::table(grid(&[&["Name", "Age"], &["Al", "30"], &["Bo", ""]])).unwrap();
    assert_eq!(
        md(&[table]),
        "| Name | Age |\n| --- | --- |\n| Al | 30 |\n| Bo |  |"
    );
}

#[test]
fn test_jagged_grids_render_rectangular() {
    let cases: Vec<Vec<Vec<String>>> = vec![
        grid(&[&["a"], &["b", "c", "d"], &[]]),
        grid(&[&["1", "2", "3", "4"], &["x"]]),
        grid(&[&[""], &["", ""]]),
        grid(&[&["only"]]),
    ];
    for rows in cases {
        let width = rows.iter().map(Vec::len).max().unwrap();
        let rendered = md(&[Block::table(rows).unwrap()]);
        for line in rendered.lines() {
            // "| a | b |" has width + 1 pipes
            assert_eq!(line.matches('|').count(), width + 1, "line: {:?}", line);
        }
        assert_eq!(rendered.lines().nth(1).unwrap().matches("---").count(), width);
    }
}

#[test]
fn test_empty_grids_produce_no_table() {
    assert!(Block::table(vec![]).is_none());
    assert!(Block::table(vec![vec![], vec![]]).is_none());
}

#[test]
fn test_cell_escaping_is_idempotent() {
    let table = Block::table(grid(&[&["a|b", "line\nbreak"]])).unwrap();
    let rendered = md(&[table]);
    assert!(rendered.starts_with("| a\\|b | line break |"));
    assert!(!rendered.contains("\\\\|"));
}

#[test]
fn test_inline_flags_exact() {
    let all = InlineRun::new("text")
        .with_bold(true)
        .with_italic(true)
        .with_underline(true)
        .with_strike(true);
    assert_eq!(md(&[Block::paragraph(vec![all])]), "**_<u>~~text~~</u>_**");

    let partial = InlineRun::new("mid").with_italic(true).with_strike(true);
    assert_eq!(md(&[Block::paragraph(vec![partial])]), "_~~mid~~_");
}

#[test]
fn test_document_structure() {
    let blocks = vec![
        Block::heading(1, vec![InlineRun::new("Title")]),
        Block::paragraph(vec![InlineRun::new("Body "), InlineRun::bold("strong")]),
        Block::list_item(vec![InlineRun::new("first")], 1),
        Block::list_item(vec![InlineRun::new("nested")], 2),
        Block::heading(7, vec![InlineRun::new("Too deep")]),
        Block::Separator,
        Block::raw("## Slide 1\n"),
    ];
    assert_eq!(
        md(&blocks),
        "# Title\n\nBody **strong**\n\n- first\n\n  - nested\n\nToo deep\n\n---\n\n## Slide 1"
    );
}

#[test]
fn test_render_is_deterministic() {
    let blocks = vec![
        Block::heading(2, vec![InlineRun::new("Same")]),
        Block::table(grid(&[&["h"], &["v"]])).unwrap(),
    ];
    let renderer = MarkdownRenderer::new(RenderOptions::default());
    assert_eq!(renderer.render(&blocks).unwrap(), renderer.render(&blocks).unwrap());
}

#[test]
fn test_image_reference_forms() {
    let image = |path: Option<&str>, data: Option<&str>| {
        Block::Image(ImageBlock {
            placement_hint: "image_001".into(),
            alt: "image".into(),
            relative_path: path.map(str::to_string),
            data_uri: data.map(str::to_string),
        })
    };
    let file = RenderOptions::new().with_image_mode(ImageMode::File);
    let base64 = RenderOptions::new().with_image_mode(ImageMode::Base64);

    let linked = image(Some("images/image_001.png"), None);
    assert_eq!(to_markdown(&[linked], &file).unwrap(), "![image](images/image_001.png)");

    let embedded = image(None, Some("data:image/png;base64,iVBO"));
    assert_eq!(
        to_markdown(&[embedded], &base64).unwrap(),
        "![image](data:image/png;base64,iVBO)"
    );

    let both = image(Some("images/image_001.png"), Some("data:image/png;base64,iVBO"));
    let rendered = to_markdown(&[both], &RenderOptions::new().with_image_mode(ImageMode::Both))
        .unwrap();
    assert_eq!(rendered.matches("![").count(), 1);
    assert!(rendered.contains("images/image_001.png"));
}

#[test]
fn test_normalization_pass() {
    let blocks = vec![
        Block::raw("  \n\n\n"),
        Block::paragraph(vec![InlineRun::new("Cafe\u{0301}   ")]),
        Block::raw("\n\n\n\nend   "),
    ];
    assert_eq!(md(&blocks), "Caf\u{00E9}\n\nend");

    let raw_opts = RenderOptions::new().with_unicode_normalization(false);
    let out = to_markdown(&[Block::paragraph(vec![InlineRun::new("e\u{0301}")])], &raw_opts)
        .unwrap();
    assert_eq!(out, "e\u{0301}");
}

#[test]
fn test_blocks_serialize_with_type_tag() {
    let block = Block::heading(2, vec![InlineRun::new("x")]);
    let json = serde_json::to_value(&block).unwrap();
    assert_eq!(json["type"], "heading");
    assert_eq!(json["level"], 2);

    let back: Block = serde_json::from_value(json).unwrap();
    assert_eq!(back, block);
}
