//! On-disk behaviour of the architecture lint over a `client/src` tree.

use std::fs;
use std::path::{Path, PathBuf};

use architecture_lint::{ArchitectureLintError, Violation};
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct ClientTree {
    root: TempDir,
}

impl ClientTree {
    fn client_dir(&self) -> PathBuf {
        self.root.path().join("client")
    }

    fn write(&self, file: &str, contents: &str) -> &Self {
        let path = self.client_dir().join("src").join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, contents).expect("write source file");
        self
    }

    fn lint(&self) -> Result<(), ArchitectureLintError> {
        architecture_lint::lint_client_sources(&self.client_dir())
    }
}

#[fixture]
fn tree() -> ClientTree {
    let tree = ClientTree {
        root: TempDir::new().expect("tempdir"),
    };
    tree.write(
        "domain/link.rs",
        "pub struct LinkId(String); impl LinkId { pub fn new(v: &str) -> Self { Self(v.to_owned()) } }",
    )
    .write(
        "inbound/cli/shell.rs",
        "use crate::domain::link::LinkId; fn vote() { let _id = LinkId::new(\"a\"); }",
    )
    .write(
        "outbound/memory/link_store.rs",
        "use crate::domain::link::LinkId; pub struct Store; impl Store { pub fn get(&self, _id: LinkId) {} }",
    )
    .write("main.rs", "use sharelinks::outbound::memory; fn main() {}")
    .write("settings.rs", "use clap::Parser;");
    tree
}

fn violations(result: Result<(), ArchitectureLintError>) -> Vec<Violation> {
    match result {
        Ok(()) => Vec::new(),
        Err(ArchitectureLintError::Violations(violations)) => violations,
        Err(other) => panic!("expected violations error, got: {other:?}"),
    }
}

fn has_violation(violations: &[Violation], file: &str, needle: &str) -> bool {
    violations
        .iter()
        .any(|violation| violation.file == Path::new(file) && violation.message.contains(needle))
}

#[rstest]
fn well_layered_sources_pass(tree: ClientTree) {
    let result = tree.lint();
    assert!(result.is_ok(), "expected success, got: {result:?}");
}

#[rstest]
fn files_outside_the_layers_are_not_linted(tree: ClientTree) {
    tree.write("lib.rs", "pub mod domain; use reqwest::Client;");
    assert!(tree.lint().is_ok());
}

#[rstest]
#[case(
    "inbound/cli/wiring.rs",
    "use sharelinks::outbound::firestore::FirestoreLinkStore; fn wire() {}",
    "crate::outbound"
)]
#[case(
    "inbound/cli/fetch.rs",
    "use reqwest::Client; fn fetch() {}",
    "external crate `reqwest`"
)]
#[case(
    "outbound/firestore/bad.rs",
    "use crate::inbound::cli::render_board; fn thing() {}",
    "crate::inbound"
)]
#[case(
    "domain/bad.rs",
    "use clap::Parser; #[derive(Parser)] struct Args;",
    "external crate `clap`"
)]
fn single_violations_are_reported(
    tree: ClientTree,
    #[case] file: &str,
    #[case] contents: &str,
    #[case] needle: &str,
) {
    tree.write(file, contents);

    let violations = violations(tree.lint());

    assert!(
        has_violation(&violations, file, needle),
        "expected violation in {file} containing {needle:?}, got: {violations:?}"
    );
}

#[rstest]
fn every_violation_is_reported(tree: ClientTree) {
    tree.write(
        "inbound/cli/bad.rs",
        "use crate::outbound::memory::InMemoryLinkStore; fn wire() {}",
    )
    .write(
        "domain/bad.rs",
        "use reqwest::Client; fn fetch() { let _ = Client::new(); }",
    );

    let violations = violations(tree.lint());

    assert_eq!(violations.len(), 2, "got: {violations:?}");
    assert!(has_violation(&violations, "inbound/cli/bad.rs", "crate::outbound"));
    assert!(has_violation(&violations, "domain/bad.rs", "external crate `reqwest`"));
}

#[test]
fn unparsable_sources_are_parse_errors() {
    let tree = ClientTree {
        root: TempDir::new().expect("tempdir"),
    };
    tree.write("domain/broken.rs", "fn {");

    let result = tree.lint();

    assert!(
        matches!(result, Err(ArchitectureLintError::Parse { .. })),
        "got: {result:?}"
    );
}
