//! Export formatting: grouped listing for people, flat JSON for machines

use crate::index::types::{CodeElement, ElementKind, SearchResult};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::Path;
use termcolor::{Buffer, Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Lines of context on each side of an element in the flat payload
pub const CONTEXT_RADIUS: u32 = 5;

/// Numbered lines `[line - radius, line + radius]` clamped to the file.
///
/// Lines are 1-based; line 0 (file elements) starts at the top of the file.
pub fn context_window(content: &str, line: u32, radius: u32) -> Vec<(u32, &str)> {
    let first = line.saturating_sub(radius).max(1);
    let last = line.saturating_add(radius);
    content
        .lines()
        .enumerate()
        .map(|(idx, text)| (idx as u32 + 1, text))
        .skip_while(|(n, _)| *n < first)
        .take_while(|(n, _)| *n <= last)
        .collect()
}

fn context_text(content: &str, line: u32) -> String {
    context_window(content, line, CONTEXT_RADIUS)
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One element of the machine-readable export and of the ranking request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedElement {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_type: Option<ElementKind>,
    pub file_path: String,
    pub line_number: u32,
    pub context: String,
}

impl From<&CodeElement> for ExportedElement {
    fn from(element: &CodeElement) -> Self {
        Self {
            id: element.id.clone(),
            name: element.name.clone(),
            kind: element.kind,
            parent_name: element.parent_name().map(str::to_string),
            parent_type: element.parent_kind(),
            file_path: element.file_path.to_string_lossy().into_owned(),
            line_number: element.line_number,
            context: context_text(element.file_content(), element.line_number),
        }
    }
}

pub fn flat_payload(results: &[SearchResult]) -> Vec<ExportedElement> {
    results
        .iter()
        .map(|r| ExportedElement::from(&r.element))
        .collect()
}

/// Group results by file in order of first appearance
fn group_by_file(results: &[SearchResult]) -> Vec<(&Path, Vec<&CodeElement>)> {
    let mut groups: Vec<(&Path, Vec<&CodeElement>)> = Vec::new();
    for result in results {
        let path = result.element.file_path.as_path();
        match groups.iter_mut().find(|(p, _)| *p == path) {
            Some((_, members)) => members.push(&result.element),
            None => groups.push((path, vec![&result.element])),
        }
    }
    groups
}

/// Write the grouped listing; colours apply only if `out` supports them
pub fn write_grouped<W: WriteColor>(out: &mut W, results: &[SearchResult]) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(out, "# Code Structure Analysis")?;
    out.reset()?;

    for (path, members) in group_by_file(results) {
        writeln!(out)?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
        writeln!(out, "## {}", crate::index::types::file_name_of(path))?;
        out.reset()?;
        writeln!(out, "*Path: {}*", path.display())?;
        writeln!(out)?;

        for element in members {
            write!(out, "- ")?;
            out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
            write!(out, "**{}**", element.kind)?;
            out.reset()?;
            writeln!(out, ": {}", element.scoped_name())?;
        }
    }
    Ok(())
}

/// The grouped listing as plain text
pub fn grouped_listing(results: &[SearchResult]) -> String {
    let mut buffer = Buffer::no_color();
    // Writing into an in-memory buffer cannot fail
    let _ = write_grouped(&mut buffer, results);
    String::from_utf8_lossy(buffer.as_slice()).into_owned()
}

pub fn print_grouped(results: &[SearchResult], color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    write_grouped(&mut stdout, results)
}

pub fn write_json<W: Write>(out: &mut W, results: &[SearchResult]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, &flat_payload(results))?;
    writeln!(out)
}

pub fn print_json(results: &[SearchResult]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_json(&mut out, results)
}
