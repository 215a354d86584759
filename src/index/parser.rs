//! Source parsing: extracts top-level declarations from a file.
//!
//! The indexer only depends on the [`SourceParser`] trait; the shipped
//! implementation uses tree-sitter's TypeScript/TSX grammars.

use crate::error::IndexError;
use std::path::Path;
use tree_sitter::{Language, Node, Parser};

/// A named declaration (function or member) and its 1-based start line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSymbol {
    /// `None` for anonymous declarations such as `export default function () {}`
    pub name: Option<String>,
    pub line: u32,
}

/// A class or interface with its methods
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContainer {
    pub name: Option<String>,
    pub line: u32,
    pub methods: Vec<ParsedSymbol>,
}

/// Top-level declarations of a single file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFile {
    pub classes: Vec<ParsedContainer>,
    pub interfaces: Vec<ParsedContainer>,
    pub functions: Vec<ParsedSymbol>,
}

impl ParsedFile {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.interfaces.is_empty() && self.functions.is_empty()
    }
}

/// Parses one source file into its top-level declarations
pub trait SourceParser: Send + Sync {
    fn parse(&self, path: &Path, source: &str) -> Result<ParsedFile, IndexError>;
}

/// tree-sitter based parser for TypeScript, TSX and (with `allowJs`) JavaScript
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptParser;

impl TypeScriptParser {
    pub fn new() -> Self {
        Self
    }

    fn language_for(path: &Path) -> Language {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            // JSX syntax needs the TSX grammar
            "tsx" | "jsx" => tree_sitter_typescript::LANGUAGE_TSX.into(),
            _ => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        }
    }
}

impl SourceParser for TypeScriptParser {
    fn parse(&self, path: &Path, source: &str) -> Result<ParsedFile, IndexError> {
        let parse_error = |message: String| IndexError::Parse {
            path: path.to_path_buf(),
            message,
        };

        // Parsers are not Sync; one per call keeps the trait usable from rayon
        let mut parser = Parser::new();
        parser
            .set_language(&Self::language_for(path))
            .map_err(|e| parse_error(e.to_string()))?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| parse_error("parser returned no tree".to_string()))?;

        let mut parsed = ParsedFile::default();
        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            collect_declaration(child, source, &mut parsed);
        }
        Ok(parsed)
    }
}

fn collect_declaration(node: Node, source: &str, parsed: &mut ParsedFile) {
    match node.kind() {
        "export_statement" => {
            let inner = node
                .child_by_field_name("declaration")
                .or_else(|| node.child_by_field_name("value"));
            if let Some(inner) = inner {
                collect_declaration(inner, source, parsed);
            }
        }
        // `declare class Foo {}` and friends
        "ambient_declaration" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                collect_declaration(child, source, parsed);
            }
        }
        "class_declaration" | "abstract_class_declaration" | "class" => {
            parsed.classes.push(ParsedContainer {
                name: field_text(node, "name", source),
                line: start_line(node),
                methods: class_methods(node, source),
            });
        }
        "interface_declaration" => {
            parsed.interfaces.push(ParsedContainer {
                name: field_text(node, "name", source),
                line: start_line(node),
                methods: interface_methods(node, source),
            });
        }
        "function_declaration"
        | "generator_function_declaration"
        | "function_expression"
        | "function" => {
            parsed.functions.push(ParsedSymbol {
                name: field_text(node, "name", source),
                line: start_line(node),
            });
        }
        _ => {}
    }
}

fn class_methods(class: Node, source: &str) -> Vec<ParsedSymbol> {
    let Some(body) = class.child_by_field_name("body") else {
        return Vec::new();
    };

    let mut methods = Vec::new();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        match member.kind() {
            "method_definition" if !is_accessor(member) => {}
            "abstract_method_signature" => {}
            _ => continue,
        }
        let Some(name) = field_text(member, "name", source) else {
            continue;
        };
        if name == "constructor" {
            continue;
        }
        methods.push(ParsedSymbol {
            name: Some(name),
            line: start_line(member),
        });
    }
    methods
}

fn interface_methods(interface: Node, source: &str) -> Vec<ParsedSymbol> {
    let Some(body) = interface.child_by_field_name("body") else {
        return Vec::new();
    };

    let mut methods = Vec::new();
    let mut cursor = body.walk();
    for member in body.named_children(&mut cursor) {
        if member.kind() != "method_signature" {
            continue;
        }
        if let Some(name) = field_text(member, "name", source) {
            methods.push(ParsedSymbol {
                name: Some(name),
                line: start_line(member),
            });
        }
    }
    methods
}

/// `get foo()` / `set foo(v)` are accessors, not methods
fn is_accessor(method: Node) -> bool {
    let mut cursor = method.walk();
    let found = method
        .children(&mut cursor)
        .take_while(|child| child.kind() != "property_identifier")
        .any(|child| matches!(child.kind(), "get" | "set"));
    found
}

fn field_text(node: Node, field: &str, source: &str) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| n.utf8_text(source.as_bytes()).ok())
        .map(str::to_string)
}

fn start_line(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"import { Injectable } from './di';

export class UserService {
    constructor(private readonly repo: Repo) {}

    create(name: string): User {
        return this.repo.insert(name);
    }

    get count(): number {
        return 0;
    }

    async remove(id: string) {}
}

interface Repo {
    insert(name: string): User;
    size: number;
}

export function buildUser(name: string) {
    return { name };
}

function* ids() {}
"#;

    fn names(symbols: &[ParsedSymbol]) -> Vec<&str> {
        symbols.iter().filter_map(|s| s.name.as_deref()).collect()
    }

    #[test]
    fn test_extracts_top_level_declarations() {
        let parsed = TypeScriptParser::new()
            .parse(Path::new("user.service.ts"), SAMPLE)
            .unwrap();

        assert_eq!(parsed.classes.len(), 1);
        let class = &parsed.classes[0];
        assert_eq!(class.name.as_deref(), Some("UserService"));
        assert_eq!(class.line, 3);
        assert_eq!(names(&class.methods), vec!["create", "remove"]);
        assert_eq!(class.methods[0].line, 6);

        assert_eq!(parsed.interfaces.len(), 1);
        assert_eq!(parsed.interfaces[0].name.as_deref(), Some("Repo"));
        assert_eq!(names(&parsed.interfaces[0].methods), vec!["insert"]);

        assert_eq!(names(&parsed.functions), vec!["buildUser", "ids"]);
        assert_eq!(parsed.functions[0].line, 22);
    }

    #[test]
    fn test_anonymous_default_exports() {
        let source = "export default class {\n  run() {}\n}\n";
        let parsed = TypeScriptParser::new()
            .parse(Path::new("anon.ts"), source)
            .unwrap();
        assert_eq!(parsed.classes.len(), 1);
        assert_eq!(parsed.classes[0].name, None);
        assert_eq!(names(&parsed.classes[0].methods), vec!["run"]);
    }

    #[test]
    fn test_nested_declarations_are_ignored() {
        let source = "function outer() {\n  function inner() {}\n  class Local {}\n}\n";
        let parsed = TypeScriptParser::new()
            .parse(Path::new("nested.ts"), source)
            .unwrap();
        assert_eq!(names(&parsed.functions), vec!["outer"]);
        assert!(parsed.classes.is_empty());
    }

    #[test]
    fn test_file_without_declarations() {
        let parsed = TypeScriptParser::new()
            .parse(Path::new("consts.ts"), "export const x = 1;\n")
            .unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_tsx_file() {
        let source = "export function App() {\n  return <div>hi</div>;\n}\n";
        let parsed = TypeScriptParser::new()
            .parse(Path::new("App.tsx"), source)
            .unwrap();
        assert_eq!(names(&parsed.functions), vec!["App"]);
    }
}
