//! Layer boundary lint for the ShareLinks client.
//!
//! The client crate is split into `domain` (model, services, ports),
//! `inbound` (the terminal shell) and `outbound` (store and identity
//! adapters). This crate parses every source file under those three
//! directories of `client/src` and rejects imports that cross a boundary:
//!
//! | layer | may not reach |
//! | --- | --- |
//! | `domain` | `inbound`, `outbound`, HTTP, CLI and bootstrap crates |
//! | `inbound` | `outbound`, the HTTP client |
//! | `outbound` | `inbound`, the CLI parser, the bootstrap error report |
//!
//! Items gated behind `#[cfg(test)]` are skipped; tests may wire concrete
//! adapters. Run with `cargo run -p architecture-lint`.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use syn::visit::Visit;

/// Library name of the linted crate, as it appears in absolute paths.
const CRATE_NAME: &str = "sharelinks";

const LAYER_DIRS: [&str; 3] = ["domain", "inbound", "outbound"];

/// One import or path that crosses a layer boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File path relative to `client/src`.
    pub file: PathBuf,
    /// The broken rule.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}

/// Why a lint run did not pass.
#[derive(Debug)]
pub enum ArchitectureLintError {
    /// Reading the source tree failed.
    Io(io::Error),
    /// A file could not be parsed or placed in a layer.
    Parse {
        /// Offending file, relative to `client/src`.
        file: PathBuf,
        /// Parser or layout message.
        message: String,
    },
    /// Boundary violations, in file order.
    Violations(Vec<Violation>),
}

impl fmt::Display for ArchitectureLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read client sources: {err}"),
            Self::Parse { file, message } => {
                write!(f, "cannot lint {}: {message}", file.display())
            }
            Self::Violations(violations) => {
                writeln!(f, "{} layer boundary violation(s):", violations.len())?;
                violations
                    .iter()
                    .try_for_each(|violation| writeln!(f, "  {violation}"))
            }
        }
    }
}

impl std::error::Error for ArchitectureLintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse { .. } | Self::Violations(_) => None,
        }
    }
}

impl From<io::Error> for ArchitectureLintError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// A Rust source file to lint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `client/src`; its first component names the layer.
    pub file: PathBuf,
    /// Rust source text.
    pub contents: String,
}

/// Lint `client_dir/src` on disk. Files outside the layer directories
/// (`lib.rs`, `main.rs`, `settings.rs`, ...) are composition roots and are
/// not linted.
///
/// # Errors
/// See [`ArchitectureLintError`].
pub fn lint_client_sources(client_dir: &Path) -> Result<(), ArchitectureLintError> {
    let src_dir = client_dir.join("src");
    let mut sources = Vec::new();
    for layer in LAYER_DIRS {
        let dir = src_dir.join(layer);
        if dir.is_dir() {
            read_sources(&src_dir, &dir, &mut sources)?;
        }
    }
    lint_sources(&sources)
}

/// Lint in-memory sources.
///
/// # Errors
/// See [`ArchitectureLintError`].
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();
    for source in sources {
        let Some(layer) = Layer::of(&source.file) else {
            return Err(ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: "file is not under domain/, inbound/ or outbound/".to_owned(),
            });
        };
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;
        violations.extend(
            layer
                .check(&parsed)
                .into_iter()
                .map(|message| Violation {
                    file: source.file.clone(),
                    message,
                }),
        );
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Domain,
    Inbound,
    Outbound,
}

impl Layer {
    fn of(relative_path: &Path) -> Option<Self> {
        match relative_path.components().next()?.as_os_str().to_str()? {
            "domain" => Some(Self::Domain),
            "inbound" => Some(Self::Inbound),
            "outbound" => Some(Self::Outbound),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    const fn forbidden_layers(self) -> &'static [&'static str] {
        match self {
            Self::Domain => &["inbound", "outbound"],
            Self::Inbound => &["outbound"],
            Self::Outbound => &["inbound"],
        }
    }

    const fn forbidden_crates(self) -> &'static [&'static str] {
        match self {
            Self::Domain => &[
                "clap",
                "color_eyre",
                "hyper",
                "ortho_config",
                "reqwest",
                "tracing_subscriber",
            ],
            Self::Inbound => &["hyper", "reqwest"],
            Self::Outbound => &["clap", "color_eyre"],
        }
    }

    fn check(self, file: &syn::File) -> BTreeSet<String> {
        let mut collector = PathCollector::default();
        collector.visit_file(file);

        let mut messages = BTreeSet::new();
        for path in &collector.paths {
            if let Some(target) = internal_layer(path)
                .filter(|layer| self.forbidden_layers().contains(layer))
            {
                messages.insert(format!(
                    "{} module must not depend on crate::{target}",
                    self.name()
                ));
            }
            if let Some(krate) = external_crate(path)
                .filter(|name| self.forbidden_crates().contains(name))
            {
                messages.insert(format!(
                    "{} module must not depend on external crate `{krate}`",
                    self.name()
                ));
            }
        }
        messages
    }
}

fn is_relative(segment: &str) -> bool {
    matches!(segment, "crate" | "self" | "super")
}

/// Layer a path points into, if it names one of the crate's own layers.
fn internal_layer(path: &[String]) -> Option<&str> {
    let first = path.first()?.as_str();
    let candidate = if LAYER_DIRS.contains(&first) {
        first
    } else if first == CRATE_NAME {
        path.get(1)?.as_str()
    } else if is_relative(first) {
        path.iter().map(String::as_str).find(|segment| !is_relative(segment))?
    } else {
        return None;
    };
    LAYER_DIRS.contains(&candidate).then_some(candidate)
}

/// Leading crate name of a path that does not point into this crate.
fn external_crate(path: &[String]) -> Option<&str> {
    let first = path.first()?.as_str();
    (!is_relative(first) && first != CRATE_NAME).then_some(first)
}

fn is_test_only(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && matches!(&attr.meta, syn::Meta::List(list) if list.tokens.to_string() == "test")
    })
}

fn item_attrs(item: &syn::Item) -> &[syn::Attribute] {
    match item {
        syn::Item::Const(item) => &item.attrs,
        syn::Item::Enum(item) => &item.attrs,
        syn::Item::Fn(item) => &item.attrs,
        syn::Item::Impl(item) => &item.attrs,
        syn::Item::Macro(item) => &item.attrs,
        syn::Item::Mod(item) => &item.attrs,
        syn::Item::Static(item) => &item.attrs,
        syn::Item::Struct(item) => &item.attrs,
        syn::Item::Trait(item) => &item.attrs,
        syn::Item::Type(item) => &item.attrs,
        syn::Item::Use(item) => &item.attrs,
        _ => &[],
    }
}

#[derive(Default)]
struct PathCollector {
    paths: BTreeSet<Vec<String>>,
}

impl PathCollector {
    fn use_tree(&mut self, tree: &syn::UseTree, prefix: &mut Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.use_tree(&path.tree, prefix);
                prefix.pop();
            }
            syn::UseTree::Name(syn::UseName { ident })
            | syn::UseTree::Rename(syn::UseRename { ident, .. }) => {
                self.leaf(prefix, ident.to_string());
            }
            syn::UseTree::Glob(_) => self.leaf(prefix, "*".to_owned()),
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.use_tree(item, prefix);
                }
            }
        }
    }

    fn leaf(&mut self, prefix: &[String], last: String) {
        let mut path = prefix.to_vec();
        path.push(last);
        self.paths.insert(path);
    }
}

impl<'ast> Visit<'ast> for PathCollector {
    fn visit_item(&mut self, node: &'ast syn::Item) {
        if !is_test_only(item_attrs(node)) {
            syn::visit::visit_item(self, node);
        }
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.use_tree(&node.tree, &mut Vec::new());
    }

    fn visit_path(&mut self, node: &'ast syn::Path) {
        let path: Vec<String> = node
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();
        if !path.is_empty() {
            self.paths.insert(path);
        }
        syn::visit::visit_path(self, node);
    }
}

fn read_sources(
    src_root: &Path,
    dir: &Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), ArchitectureLintError> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|found| found.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            read_sources(src_root, &path, sources)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            let file = path
                .strip_prefix(src_root)
                .map_err(|err| ArchitectureLintError::Parse {
                    file: path.clone(),
                    message: err.to_string(),
                })?
                .to_path_buf();
            let contents = fs::read_to_string(&path)?;
            sources.push(LintSource { file, contents });
        }
    }
    Ok(())
}
