//! Outline parser and serializer.
//!
//! Turns raw file text into a [`Page`] plus an ordered block tree, and turns
//! a block tree back into the same outline format. Parsing is a total, pure
//! function: malformed input degrades to best-effort block extraction, it
//! never fails.
//!
//! Format, line by line:
//! - `key:: value` before any block line sets a page property; the `title`
//!   property overrides the file-stem default title.
//! - `<indent>- <rest>` is a block. A leading `id:: <token>` inside `<rest>`
//!   declares the block id; otherwise one is synthesized as `<stem>-<n>`.
//!   Nesting comes from indentation depth.
//! - Anything else is ignored.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{Block, Link, Page};

static PROPERTY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_-]+)::\s*(.+)$").expect("property regex"));

static BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)-\s+(.*)$").expect("block regex"));

static BLOCK_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^id::\s*(\S+)\s*(.*)$").expect("block id regex"));

static PAGE_LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("page link regex"));

static BLOCK_LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\(([^)]+)\)\)").expect("block link regex"));

/// A page together with its blocks in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    pub page: Page,
    pub blocks: Vec<Block>,
}

/// Extract every `[[page]]` and `((block-id))` occurrence from block text.
pub fn extract_links(text: &str) -> Vec<Link> {
    let mut links = Vec::new();
    for cap in PAGE_LINK_REGEX.captures_iter(text) {
        links.push(Link::Page { page: cap[1].to_string() });
    }
    for cap in BLOCK_LINK_REGEX.captures_iter(text) {
        links.push(Link::Block { block_id: cap[1].to_string() });
    }
    links
}

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Parse one outline file into a page and its block tree.
pub fn parse_page(path: &str, content: &str) -> ParsedPage {
    let stem = file_stem(path);
    let mut title = stem.clone();
    let mut blocks: Vec<Block> = Vec::new();
    // (indent, block id) pairs along the current branch.
    let mut stack: Vec<(usize, String)> = Vec::new();
    let mut counter = 0usize;

    for raw in content.lines() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if !line.trim_start().starts_with('-') {
            if let Some(prop) = PROPERTY_REGEX.captures(line) {
                if &prop[1] == "title" && blocks.is_empty() {
                    title = prop[2].trim().to_string();
                }
            }
            continue;
        }
        let Some(m) = BLOCK_REGEX.captures(line) else {
            continue;
        };
        let indent = m[1].len();
        let mut text = m[2].to_string();
        let id = match BLOCK_ID_REGEX.captures(&text) {
            Some(idm) => {
                let id = idm[1].to_string();
                text = idm[2].to_string();
                id
            }
            None => {
                counter += 1;
                format!("{stem}-{counter}")
            }
        };
        let links = extract_links(&text);
        while stack.last().is_some_and(|(top, _)| indent <= *top) {
            stack.pop();
        }
        let parent_id = stack.last().map(|(_, id)| id.clone());
        blocks.push(Block {
            id: id.clone(),
            page_id: String::new(),
            parent_id,
            text: text.trim().to_string(),
            links,
        });
        stack.push((indent, id));
    }

    for block in &mut blocks {
        block.page_id = title.clone();
    }
    let page = Page { id: title.clone(), title, path: path.to_string() };
    ParsedPage { page, blocks }
}

/// Serialize a parsed page back to outline text.
///
/// Emits `title:: <title>` followed by the block tree, two spaces of indent
/// per depth, every block carrying an explicit `id::` so a later parse keeps
/// the same identities.
pub fn page_to_markdown(parsed: &ParsedPage) -> String {
    let mut lines = vec![format!("title:: {}", parsed.page.title)];
    emit_children(&parsed.blocks, None, 0, &mut lines);
    lines.join("\n")
}

fn emit_children(blocks: &[Block], parent: Option<&str>, depth: usize, lines: &mut Vec<String>) {
    for block in blocks.iter().filter(|b| b.parent_id.as_deref() == parent) {
        let prefix = "  ".repeat(depth);
        if block.text.is_empty() {
            lines.push(format!("{prefix}- id:: {}", block.id));
        } else {
            lines.push(format!("{prefix}- id:: {} {}", block.id, block.text));
        }
        emit_children(blocks, Some(&block.id), depth + 1, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_title_property_and_nested_blocks() {
        let parsed = parse_page("alpha.md", "title:: Alpha\n- id:: a1 one\n  - id:: a2 two");
        assert_eq!(parsed.page.title, "Alpha");
        assert_eq!(parsed.page.id, "Alpha");
        assert_eq!(parsed.blocks.len(), 2);
        assert_eq!(parsed.blocks[0].id, "a1");
        assert_eq!(parsed.blocks[0].text, "one");
        assert_eq!(parsed.blocks[0].parent_id, None);
        assert_eq!(parsed.blocks[1].id, "a2");
        assert_eq!(parsed.blocks[1].text, "two");
        assert_eq!(parsed.blocks[1].parent_id.as_deref(), Some("a1"));
        assert_eq!(parsed.blocks[1].page_id, "Alpha");
    }

    #[test]
    fn title_defaults_to_file_stem() {
        let parsed = parse_page("notes/daily.md", "- first");
        assert_eq!(parsed.page.title, "daily");
        assert_eq!(parsed.blocks[0].id, "daily-1");
    }

    #[test]
    fn synthesizes_ids_only_for_blocks_without_one() {
        let parsed = parse_page("p.md", "- one\n- id:: x two\n- three");
        let ids: Vec<_> = parsed.blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["p-1", "x", "p-2"]);
    }

    #[test]
    fn extracts_every_link_occurrence() {
        let parsed = parse_page("p.md", "- see [[Alpha]] and [[Beta]] plus ((b1)) ((b2))");
        assert_eq!(
            parsed.blocks[0].links,
            vec![
                Link::Page { page: "Alpha".into() },
                Link::Page { page: "Beta".into() },
                Link::Block { block_id: "b1".into() },
                Link::Block { block_id: "b2".into() },
            ]
        );
    }

    #[test]
    fn sibling_after_dedent_attaches_to_grandparent() {
        let content = "- id:: a root\n  - id:: b child\n    - id:: c grandchild\n  - id:: d sibling";
        let parsed = parse_page("p.md", content);
        let parent_of = |id: &str| {
            parsed
                .blocks
                .iter()
                .find(|b| b.id == id)
                .and_then(|b| b.parent_id.clone())
        };
        assert_eq!(parent_of("b").as_deref(), Some("a"));
        assert_eq!(parent_of("c").as_deref(), Some("b"));
        assert_eq!(parent_of("d").as_deref(), Some("a"));
    }

    #[test]
    fn malformed_indentation_degrades_to_root_block() {
        // A deeper first line has nothing to attach to.
        let parsed = parse_page("p.md", "      - id:: deep floating\n- id:: top root");
        assert_eq!(parsed.blocks[0].parent_id, None);
        assert_eq!(parsed.blocks[1].parent_id, None);
    }

    #[test]
    fn ignores_blank_and_unrecognized_lines() {
        let parsed = parse_page("p.md", "\nsome prose\nkey:: value\n\n- id:: a real");
        assert_eq!(parsed.blocks.len(), 1);
        assert_eq!(parsed.blocks[0].id, "a");
    }

    #[test]
    fn round_trips_through_markdown() {
        let content = "title:: Trip\n- id:: a one [[Alpha]]\n  - id:: b two\n    - id:: c three\n- id:: d four ((a))";
        let parsed = parse_page("trip.md", content);
        let rendered = page_to_markdown(&parsed);
        let reparsed = parse_page("trip.md", &rendered);
        assert_eq!(parsed.page.title, reparsed.page.title);
        assert_eq!(parsed.blocks, reparsed.blocks);
    }

    #[test]
    fn serializes_empty_text_without_trailing_space() {
        let parsed = parse_page("p.md", "- id:: empty");
        assert_eq!(page_to_markdown(&parsed), "title:: p\n- id:: empty");
    }
}
