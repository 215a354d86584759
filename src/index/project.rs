//! Project configuration loading (`tsconfig.json`) and source file discovery

use crate::error::ProjectConfigError;
use crate::utils::strip_jsonc;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "tsconfig.json";

const DEFAULT_EXCLUDE: &[&str] = &["node_modules", "bower_components", "jspm_packages"];

const TS_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];
const JS_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    files: Option<Vec<String>>,
    #[serde(default)]
    include: Option<Vec<String>>,
    #[serde(default)]
    exclude: Option<Vec<String>>,
    #[serde(default)]
    compiler_options: RawCompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    #[serde(default)]
    allow_js: bool,
    #[serde(default)]
    out_dir: Option<String>,
}

/// A loaded project: where it lives and which files belong to it
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Directory containing the configuration file
    pub root_dir: PathBuf,
    pub config_path: PathBuf,
    pub files: Vec<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub allow_js: bool,
}

impl ProjectConfig {
    /// Load the project at `root`, which is either a directory holding a
    /// `tsconfig.json` or the path of a configuration file itself.
    pub fn load(root: &Path) -> Result<Self, ProjectConfigError> {
        let config_path = if root.is_dir() {
            root.join(CONFIG_FILE)
        } else {
            root.to_path_buf()
        };

        if !config_path.is_file() {
            return Err(ProjectConfigError::Missing(config_path));
        }

        let config_path = config_path
            .canonicalize()
            .map_err(|source| ProjectConfigError::Io {
                path: config_path.clone(),
                source,
            })?;

        let content = fs::read_to_string(&config_path).map_err(|source| ProjectConfigError::Io {
            path: config_path.clone(),
            source,
        })?;

        let raw: RawConfig =
            serde_json::from_str(&strip_jsonc(&content)).map_err(|source| {
                ProjectConfigError::Json {
                    path: config_path.clone(),
                    source,
                }
            })?;

        let root_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        // An explicit `files` list without `include` means "only these files"
        let has_files = raw.files.as_ref().is_some_and(|f| !f.is_empty());
        let include = match raw.include {
            Some(include) => include,
            None if has_files => Vec::new(),
            None => vec!["**/*".to_string()],
        };

        let mut exclude = raw
            .exclude
            .unwrap_or_else(|| DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect());
        if let Some(out_dir) = raw.compiler_options.out_dir {
            exclude.push(out_dir);
        }

        Ok(Self {
            root_dir,
            config_path,
            files: raw.files.unwrap_or_default(),
            include,
            exclude,
            allow_js: raw.compiler_options.allow_js,
        })
    }

    /// Whether a path has a source extension this project compiles
    pub fn is_source_file(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        TS_EXTENSIONS.contains(&ext.as_str())
            || (self.allow_js && JS_EXTENSIONS.contains(&ext.as_str()))
    }

    /// All source files of the project, sorted by path
    pub fn source_files(&self) -> Result<Vec<PathBuf>, ProjectConfigError> {
        let include = build_globset(&self.include)?;
        let exclude = build_globset(&self.exclude)?;

        let mut files: Vec<PathBuf> = self
            .files
            .iter()
            .map(|f| self.root_dir.join(f.trim_start_matches("./")))
            .filter(|p| p.is_file())
            .collect();

        if !self.include.is_empty() {
            let walker = WalkBuilder::new(&self.root_dir)
                .hidden(true)
                .git_ignore(false)
                .git_global(false)
                .git_exclude(false)
                .filter_entry(|entry| {
                    let name = entry.file_name().to_string_lossy();
                    !matches!(name.as_ref(), ".git" | "node_modules")
                })
                .build();

            for entry in walker.filter_map(|entry| entry.ok()) {
                let path = entry.path();
                if !path.is_file() || !self.is_source_file(path) {
                    continue;
                }
                let Ok(rel) = path.strip_prefix(&self.root_dir) else {
                    continue;
                };
                if include.is_match(rel) && !exclude.is_match(rel) {
                    files.push(path.to_path_buf());
                }
            }
        }

        files.sort();
        files.dedup();
        Ok(files)
    }
}

/// Compile tsconfig-style patterns. A pattern also matches everything below
/// it, so `"src"` behaves like `"src/**/*"`.
fn build_globset(patterns: &[String]) -> Result<GlobSet, ProjectConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
        if pattern.is_empty() {
            continue;
        }
        for variant in [pattern.to_string(), format!("{}/**", pattern)] {
            let glob = GlobBuilder::new(&variant)
                .literal_separator(true)
                .build()
                .map_err(|source| ProjectConfigError::Glob {
                    pattern: variant.clone(),
                    source,
                })?;
            builder.add(glob);
        }
    }
    builder.build().map_err(|source| ProjectConfigError::Glob {
        pattern: patterns.join(", "),
        source,
    })
}
