use crate::error::IndexError;
use crate::index::parser::{ParsedContainer, ParsedFile, SourceParser, TypeScriptParser};
use crate::index::project::ProjectConfig;
use crate::index::types::{file_name_of, CodeElement, ElementContext, ElementKind, ParentRef};
use crate::utils::progress::Spinner;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What to do when one root's project configuration cannot be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootFailurePolicy {
    /// Fail the whole indexing run
    #[default]
    Abort,
    /// Log the failure and continue with the remaining roots
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    pub root_failure: RootFailurePolicy,
    /// Suppress the progress spinner
    pub quiet: bool,
}

/// A file read and parsed, ready for element emission
struct ParsedSource {
    path: PathBuf,
    content: Arc<str>,
    parsed: ParsedFile,
}

/// Builds the element list for one indexing run.
///
/// A single counter feeds both element ids and synthetic names of anonymous
/// declarations, and it is never reset between files or roots.
pub struct Indexer<'p> {
    parser: &'p dyn SourceParser,
    options: IndexOptions,
    counter: u64,
    elements: Vec<CodeElement>,
}

impl<'p> Indexer<'p> {
    pub fn new(parser: &'p dyn SourceParser, options: IndexOptions) -> Self {
        Self {
            parser,
            options,
            counter: 0,
            elements: Vec::new(),
        }
    }

    /// Index every root in order, honouring the root failure policy
    pub fn index_roots(&mut self, roots: &[PathBuf]) -> Result<(), IndexError> {
        let mut loaded = 0usize;
        for root in roots {
            match self.index_root(root) {
                Ok(count) => {
                    loaded += 1;
                    info!(root = %root.display(), elements = count, "indexed project");
                }
                Err(err) if self.options.root_failure == RootFailurePolicy::Skip => {
                    warn!(root = %root.display(), error = %err, "skipping project");
                }
                Err(err) => return Err(err),
            }
        }

        if loaded == 0 && !roots.is_empty() {
            return Err(IndexError::NoProjects);
        }
        Ok(())
    }

    /// Index a single root; returns the number of elements it contributed
    pub fn index_root(&mut self, root: &Path) -> Result<usize, IndexError> {
        let project_error = |source| IndexError::ProjectLoad {
            root: root.to_path_buf(),
            source,
        };
        let project = ProjectConfig::load(root).map_err(project_error)?;
        let files = project.source_files().map_err(project_error)?;

        let spinner = Spinner::start(
            format!("Parsing {} files in {}", files.len(), project.root_dir.display()),
            self.options.quiet,
        );

        let parser = self.parser;
        let sources: Vec<ParsedSource> = files
            .par_iter()
            .filter_map(|path| read_and_parse(parser, path))
            .collect();

        let before = self.elements.len();
        for source in &sources {
            self.emit_file(&source.path, Arc::clone(&source.content), &source.parsed);
        }
        let added = self.elements.len() - before;

        spinner.finish(format!("Indexed {} elements from {} files", added, sources.len()));
        Ok(added)
    }

    /// Emit the elements of one parsed file.
    ///
    /// Order: the file itself, each class followed by its methods, each
    /// interface followed by its methods, then functions. Files without any
    /// declaration contribute nothing.
    pub fn emit_file(&mut self, path: &Path, content: Arc<str>, parsed: &ParsedFile) {
        if parsed.is_empty() {
            return;
        }

        let base = file_name_of(path);
        let full = path.to_string_lossy().into_owned();
        let dir = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_parent = ParentRef::new(&base, ElementKind::File);

        let id = self.next_id("file");
        self.elements.push(CodeElement {
            id,
            kind: ElementKind::File,
            name: base.clone(),
            parent: None,
            file_path: path.to_path_buf(),
            line_number: 0,
            description: format!("File {} in {}", base, dir),
            searchable_text: format!("file {} {}", base, full),
            context: shared_context(&content),
        });

        for class in &parsed.classes {
            let name = self.container_name(class, "AnonymousClass");
            let id = self.next_id("class");
            self.elements.push(CodeElement {
                id,
                kind: ElementKind::Class,
                name: name.clone(),
                parent: Some(file_parent.clone()),
                file_path: path.to_path_buf(),
                line_number: class.line,
                description: format!("Class {} in {}", name, base),
                searchable_text: format!("class {} {} {}", name, base, full),
                context: shared_context(&content),
            });
            self.emit_methods(&content, path, &base, &full, &name, ElementKind::Class, class);
        }

        for interface in &parsed.interfaces {
            let name = self.container_name(interface, "AnonymousInterface");
            let id = self.next_id("interface");
            self.elements.push(CodeElement {
                id,
                kind: ElementKind::Interface,
                name: name.clone(),
                parent: Some(file_parent.clone()),
                file_path: path.to_path_buf(),
                line_number: interface.line,
                description: format!("Interface {} in {}", name, base),
                searchable_text: format!("interface {} {} {}", name, base, full),
                context: shared_context(&content),
            });
            self.emit_methods(&content, path, &base, &full, &name, ElementKind::Interface, interface);
        }

        for function in &parsed.functions {
            let name = match &function.name {
                Some(name) => name.clone(),
                None => format!("AnonymousFunction{}", self.bump()),
            };
            let id = self.next_id("function");
            self.elements.push(CodeElement {
                id,
                kind: ElementKind::Function,
                name: name.clone(),
                parent: Some(file_parent.clone()),
                file_path: path.to_path_buf(),
                line_number: function.line,
                description: format!("Function {} in {}", name, base),
                searchable_text: format!("function {} {} {}", name, base, full),
                context: shared_context(&content),
            });
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_methods(
        &mut self,
        content: &Arc<str>,
        path: &Path,
        base: &str,
        full: &str,
        owner: &str,
        owner_kind: ElementKind,
        container: &ParsedContainer,
    ) {
        let id_prefix = match owner_kind {
            ElementKind::Interface => "interface-method",
            _ => "method",
        };

        for method in &container.methods {
            let Some(name) = method.name.clone() else {
                continue;
            };
            let id = self.next_id(id_prefix);
            self.elements.push(CodeElement {
                id,
                kind: ElementKind::Method,
                name: name.clone(),
                parent: Some(ParentRef::new(owner, owner_kind)),
                file_path: path.to_path_buf(),
                line_number: method.line,
                description: format!("Method {} in {} {}", name, owner_kind, owner),
                searchable_text: format!(
                    "method {} {} {} {} {}",
                    name, owner, owner_kind, base, full
                ),
                context: shared_context(content),
            });
        }
    }

    fn container_name(&mut self, container: &ParsedContainer, prefix: &str) -> String {
        match &container.name {
            Some(name) => name.clone(),
            None => format!("{}{}", prefix, self.bump()),
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.bump())
    }

    fn bump(&mut self) -> u64 {
        let n = self.counter;
        self.counter += 1;
        n
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn finish(self) -> Vec<CodeElement> {
        self.elements
    }
}

/// Every element of a file points at the same content
fn shared_context(content: &Arc<str>) -> ElementContext {
    ElementContext {
        file_content: Arc::clone(content),
    }
}

fn read_and_parse(parser: &dyn SourceParser, path: &Path) -> Option<ParsedSource> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "skipping unreadable file");
            return None;
        }
    };

    let parsed = match parser.parse(path, &content) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(error = %err, "skipping unparsable file");
            return None;
        }
    };

    if parsed.is_empty() {
        debug!(path = %path.display(), "no declarations");
        return None;
    }

    Some(ParsedSource {
        path: path.to_path_buf(),
        content: Arc::from(content),
        parsed,
    })
}

/// Index all roots with the TypeScript parser
pub fn build_elements(roots: &[PathBuf], options: IndexOptions) -> Result<Vec<CodeElement>, IndexError> {
    let parser = TypeScriptParser::new();
    let mut indexer = Indexer::new(&parser, options);
    indexer.index_roots(roots)?;
    info!(elements = indexer.len(), roots = roots.len(), "index built");
    Ok(indexer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::parser::ParsedSymbol;
    use std::collections::HashSet;

    struct NoParser;

    impl SourceParser for NoParser {
        fn parse(&self, _path: &Path, _source: &str) -> Result<ParsedFile, IndexError> {
            Ok(ParsedFile::default())
        }
    }

    fn symbol(name: Option<&str>, line: u32) -> ParsedSymbol {
        ParsedSymbol {
            name: name.map(str::to_string),
            line,
        }
    }

    fn sample() -> ParsedFile {
        ParsedFile {
            classes: vec![ParsedContainer {
                name: Some("UserService".to_string()),
                line: 3,
                methods: vec![symbol(Some("create"), 5), symbol(Some("remove"), 9)],
            }],
            interfaces: vec![ParsedContainer {
                name: Some("Repo".to_string()),
                line: 14,
                methods: vec![symbol(Some("insert"), 15)],
            }],
            functions: vec![symbol(Some("buildUser"), 18), symbol(None, 22)],
        }
    }

    fn emit(indexer: &mut Indexer, path: &str, parsed: &ParsedFile) {
        indexer.emit_file(Path::new(path), Arc::from("line1\nline2\n"), parsed);
    }

    #[test]
    fn test_emission_order_and_kinds() {
        let parser = NoParser;
        let mut indexer = Indexer::new(&parser, IndexOptions::default());
        emit(&mut indexer, "/app/src/user.service.ts", &sample());
        let elements = indexer.finish();

        let kinds: Vec<(ElementKind, &str)> =
            elements.iter().map(|e| (e.kind, e.name.as_str())).collect();
        assert_eq!(kinds[0], (ElementKind::File, "user.service.ts"));
        assert_eq!(kinds[1], (ElementKind::Class, "UserService"));
        assert_eq!(kinds[2], (ElementKind::Method, "create"));
        assert_eq!(kinds[3], (ElementKind::Method, "remove"));
        assert_eq!(kinds[4], (ElementKind::Interface, "Repo"));
        assert_eq!(kinds[5], (ElementKind::Method, "insert"));
        assert_eq!(kinds[6], (ElementKind::Function, "buildUser"));
        assert_eq!(kinds[7].0, ElementKind::Function);
        assert!(kinds[7].1.starts_with("AnonymousFunction"));
        assert_eq!(elements[0].line_number, 0);
    }

    #[test]
    fn test_templates() {
        let parser = NoParser;
        let mut indexer = Indexer::new(&parser, IndexOptions::default());
        emit(&mut indexer, "/app/src/user.service.ts", &sample());
        let elements = indexer.finish();

        let method = &elements[2];
        assert_eq!(method.description, "Method create in class UserService");
        assert_eq!(
            method.searchable_text,
            "method create UserService class user.service.ts /app/src/user.service.ts"
        );
        assert!(method.id.starts_with("method-"));

        let interface_method = &elements[5];
        assert_eq!(interface_method.description, "Method insert in interface Repo");
        assert!(interface_method.id.starts_with("interface-method-"));

        let class = &elements[1];
        assert_eq!(class.description, "Class UserService in user.service.ts");
        assert_eq!(
            class.searchable_text,
            "class UserService user.service.ts /app/src/user.service.ts"
        );
    }

    #[test]
    fn test_parents_co_occur() {
        let parser = NoParser;
        let mut indexer = Indexer::new(&parser, IndexOptions::default());
        emit(&mut indexer, "/app/a.ts", &sample());
        for element in indexer.finish() {
            match element.kind {
                ElementKind::File => assert!(element.parent.is_none()),
                ElementKind::Method => {
                    let parent = element.parent.expect("method without parent");
                    assert!(matches!(parent.kind, ElementKind::Class | ElementKind::Interface));
                }
                _ => assert_eq!(element.parent_kind(), Some(ElementKind::File)),
            }
        }
    }

    #[test]
    fn test_ids_and_anonymous_names_unique_across_files() {
        let parser = NoParser;
        let mut indexer = Indexer::new(&parser, IndexOptions::default());
        let anonymous = ParsedFile {
            classes: vec![ParsedContainer {
                name: None,
                line: 1,
                methods: vec![],
            }],
            interfaces: vec![],
            functions: vec![symbol(None, 4)],
        };
        emit(&mut indexer, "/app/a.ts", &anonymous);
        emit(&mut indexer, "/app/b.ts", &anonymous);
        let elements = indexer.finish();

        let ids: HashSet<&str> = elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), elements.len());

        let names: HashSet<&str> = elements
            .iter()
            .filter(|e| e.kind != ElementKind::File)
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_file_content_is_shared() {
        let parser = NoParser;
        let mut indexer = Indexer::new(&parser, IndexOptions::default());
        let content: Arc<str> = Arc::from("class A {}\n");
        indexer.emit_file(Path::new("/app/a.ts"), Arc::clone(&content), &sample());
        let elements = indexer.finish();
        assert!(elements
            .iter()
            .all(|e| Arc::ptr_eq(&content, &e.context.file_content)));
        assert!(elements.iter().all(|e| e.file_path == Path::new("/app/a.ts")));
        // The indexer's clones plus ours
        assert_eq!(Arc::strong_count(&content), elements.len() + 1);
    }

    #[test]
    fn test_empty_file_emits_nothing() {
        let parser = NoParser;
        let mut indexer = Indexer::new(&parser, IndexOptions::default());
        emit(&mut indexer, "/app/empty.ts", &ParsedFile::default());
        assert!(indexer.is_empty());
    }
}
