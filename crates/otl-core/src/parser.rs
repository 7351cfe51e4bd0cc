//! Markdown heading extraction from notebook cells.
//!
//! The grammar is deliberately narrow: a heading is a line of 1-6 leading
//! `#` characters, whitespace, then non-empty text, with any trailing run
//! of `#` stripped from the captured text. Anything else is ignored. Full
//! markdown edge-case coverage is a non-goal.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::host::DocumentSnapshot;
use crate::{CellKind, CellRange, Error, Heading, NodeId, OutlineNode, Result};

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*$").expect("valid heading regex"));
static TRAILING_HASHES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*#+\s*$").expect("valid trailing-hash regex"));

/// Parses markdown headings out of notebook cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingParser;

impl HeadingParser {
    /// Creates a new parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parse headings from a single cell's text.
    ///
    /// Non-markup cells yield no headings. A failure while scanning is
    /// logged and the cell is treated as contributing no headings; a bad
    /// cell never aborts a whole-document scan.
    #[must_use]
    pub fn parse_headings(&self, kind: CellKind, text: &str) -> Vec<Heading> {
        if kind != CellKind::Markup {
            return Vec::new();
        }

        match scan_cell(text) {
            Ok(headings) => headings,
            Err(err) => {
                warn!("Failed to parse headings from cell: {err}");
                Vec::new()
            },
        }
    }

    /// Extract all headings from a document and create placeholder outline
    /// nodes in document order.
    ///
    /// Child ranges are set to the owning cell only; the hierarchy builder
    /// computes the final ranges.
    #[must_use]
    pub fn extract_headings(&self, document: &DocumentSnapshot) -> Vec<OutlineNode> {
        let mut nodes = Vec::new();

        for (cell_index, cell) in document.cells.iter().enumerate() {
            let headings = self.parse_headings(cell.kind, &cell.text);
            for (slot, heading) in headings.into_iter().enumerate() {
                nodes.push(OutlineNode {
                    id: NodeId::new(cell_index, slot),
                    heading,
                    cell_index,
                    child_range: CellRange::new(cell_index, cell_index + 1),
                    in_view: false,
                });
            }
        }

        nodes
    }
}

fn scan_cell(text: &str) -> Result<Vec<Heading>> {
    let mut headings = Vec::new();

    for (line_number, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some(captures) = HEADING_RE.captures(trimmed) else {
            continue;
        };

        let level = u8::try_from(captures[1].len())
            .map_err(|_| Error::Parse(format!("heading marker too long on line {line_number}")))?;

        let text = TRAILING_HASHES_RE.replace(&captures[2], "");
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        headings.push(Heading {
            text: text.to_string(),
            level,
            line_number,
        });
    }

    Ok(headings)
}
