use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Kind of an indexed code element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    File,
    Class,
    Interface,
    Function,
    Method,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::File => "file",
            ElementKind::Class => "class",
            ElementKind::Interface => "interface",
            ElementKind::Function => "function",
            ElementKind::Method => "method",
        }
    }

    /// Single-character marker used by the TUI and stats listings
    pub fn icon(&self) -> &'static str {
        match self {
            ElementKind::File => "F",
            ElementKind::Class => "C",
            ElementKind::Interface => "I",
            ElementKind::Function => "ƒ",
            ElementKind::Method => "m",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owning scope of an element.
///
/// Name and kind are stored together so they can never be set independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub name: String,
    pub kind: ElementKind,
}

impl ParentRef {
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Data carried alongside an element that is not part of its identity
#[derive(Debug, Clone)]
pub struct ElementContext {
    /// Full text of the owning file, shared by every element of that file
    pub file_content: Arc<str>,
}

/// A normalized, searchable unit of code
#[derive(Debug, Clone)]
pub struct CodeElement {
    /// Unique within one indexing run
    pub id: String,
    pub kind: ElementKind,
    pub name: String,
    pub parent: Option<ParentRef>,
    pub file_path: PathBuf,
    /// 1-based start line, 0 for file elements
    pub line_number: u32,
    pub description: String,
    pub searchable_text: String,
    pub context: ElementContext,
}

impl CodeElement {
    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_ref().map(|p| p.name.as_str())
    }

    pub fn parent_kind(&self) -> Option<ElementKind> {
        self.parent.as_ref().map(|p| p.kind)
    }

    /// Basename of the owning file
    pub fn file_name(&self) -> String {
        file_name_of(&self.file_path)
    }

    /// `parent.name` whenever the element has a parent, file parents included
    pub fn scoped_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent.name, self.name),
            None => self.name.clone(),
        }
    }

    /// Short display name: `Parent.name` for members, plain `name` otherwise.
    ///
    /// File parents are left out; the TUI shows the file in the detail panel.
    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) if parent.kind != ElementKind::File => {
                format!("{}.{}", parent.name, self.name)
            }
            _ => self.name.clone(),
        }
    }

    pub fn file_content(&self) -> &str {
        &self.context.file_content
    }
}

/// A code element paired with its match distance (lower is better, 0 is exact)
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub element: CodeElement,
    pub score: f64,
}

impl SearchResult {
    pub fn new(element: CodeElement, score: f64) -> Self {
        Self { element, score }
    }
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
