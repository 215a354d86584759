use crate::index::types::{CodeElement, ElementKind};
use std::collections::HashMap;
use std::io::{self, Write};

const TOP_EXTENSIONS: usize = 10;

/// Element counts of an index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub total: usize,
    /// Sorted by count descending, then kind name
    pub by_kind: Vec<(ElementKind, usize)>,
    /// Top extensions by element count
    pub by_extension: Vec<(String, usize)>,
}

impl IndexStats {
    pub fn collect(elements: &[CodeElement]) -> Self {
        let mut kinds: HashMap<ElementKind, usize> = HashMap::new();
        let mut extensions: HashMap<String, usize> = HashMap::new();

        for element in elements {
            *kinds.entry(element.kind).or_insert(0) += 1;
            let ext = element
                .file_path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_else(|| "(none)".to_string());
            *extensions.entry(ext).or_insert(0) += 1;
        }

        let mut by_kind: Vec<_> = kinds.into_iter().collect();
        by_kind.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));

        let mut by_extension: Vec<_> = extensions.into_iter().collect();
        by_extension.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        by_extension.truncate(TOP_EXTENSIONS);

        Self {
            total: elements.len(),
            by_kind,
            by_extension,
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Index Statistics")?;
        writeln!(out, "================")?;
        writeln!(out)?;
        writeln!(out, "Total elements:   {}", self.total)?;

        writeln!(out)?;
        writeln!(out, "Elements by type:")?;
        for (kind, count) in &self.by_kind {
            writeln!(out, "  {:15} {}", kind.as_str(), count)?;
        }

        writeln!(out)?;
        writeln!(out, "Elements by file extension:")?;
        for (ext, count) in &self.by_extension {
            writeln!(out, "  {:15} {}", ext, count)?;
        }
        Ok(())
    }
}

/// Display index statistics on stdout
pub fn show_stats(elements: &[CodeElement]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    IndexStats::collect(elements).write_to(&mut out)
}
