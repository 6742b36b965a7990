/// Golden-file tests over the checked-in breaking-change fixtures
use std::path::{Path, PathBuf};

use apiport2json::source::temp_workspace;
use apiport2json::{AppError, BreakingChange, Checkout, Config, Converter, DocumentSource};
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn expected_json() -> String {
    std::fs::read_to_string(fixtures_dir().join("expected.json"))
        .expect("read expected.json")
        .replace("\r\n", "\n")
}

/// Copies the fixture documents into a fresh checkout, laid out like the real repository.
struct FixtureSource;

impl DocumentSource for FixtureSource {
    fn checkout(&self, _url: &str) -> Result<Checkout, AppError> {
        let dir = temp_workspace()?;
        let root = dir.path().join("repo");
        let docs = root.join("docs/BreakingChanges");
        std::fs::create_dir_all(&docs).expect("create docs dir");
        for entry in std::fs::read_dir(fixtures_dir().join("BreakingChanges")).expect("list fixtures") {
            let path = entry.expect("fixture entry").path();
            std::fs::copy(&path, docs.join(path.file_name().unwrap())).expect("copy fixture");
        }
        Ok(Checkout::new(dir, root))
    }
}

#[test]
fn test_fixture_directory_matches_golden_file() {
    let converter = Converter::new(Config::default());
    let mut out = Vec::new();
    let (written, skipped) = converter
        .convert_dir(&fixtures_dir().join("BreakingChanges"), &mut out)
        .unwrap();

    assert_eq!((written, skipped), (4, 0));
    assert_eq!(String::from_utf8(out).unwrap(), expected_json());
}

#[test]
fn test_full_run_matches_golden_file() {
    let out_dir = TempDir::new().unwrap();
    let output = out_dir.path().join("apiport.json");
    let converter = Converter::new(Config {
        output_path: output.clone(),
        ..Config::default()
    });

    let summary = converter.run(&FixtureSource).unwrap();
    assert_eq!(summary.written, 4);
    assert_eq!(summary.output_path, output);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), expected_json());
}

#[test]
fn test_template_never_appears_in_output() {
    let converter = Converter::new(Config::default());
    let mut out = Vec::new();
    converter
        .convert_dir(&fixtures_dir().join("BreakingChanges"), &mut out)
        .unwrap();

    let records: Vec<BreakingChange> = serde_json::from_slice(&out).unwrap();
    assert!(records.iter().all(|r| r.title != "Breaking Change Title"));
    assert_eq!(
        records.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![5, 42, 142, 230]
    );
}

#[test]
fn test_optional_fields_omitted_not_null() {
    let json: serde_json::Value = serde_json::from_str(&expected_json()).unwrap();
    let minimal = json[1].as_object().unwrap();
    assert_eq!(minimal["id"], serde_json::json!(42));
    for key in ["versionReverted", "moreInformation", "originalBug", "notes"] {
        assert!(!minimal.contains_key(key), "{key} should be omitted");
    }
    assert_eq!(minimal["categories"], serde_json::json!([]));
}

#[test]
fn test_only_template_yields_empty_array() {
    let docs = TempDir::new().unwrap();
    std::fs::copy(
        fixtures_dir().join("BreakingChanges/! Template.md"),
        docs.path().join("! Template.md"),
    )
    .unwrap();

    let mut out = Vec::new();
    let (written, _) = Converter::new(Config::default())
        .convert_dir(docs.path(), &mut out)
        .unwrap();
    assert_eq!(written, 0);
    assert_eq!(out, b"[]");
}

#[test]
fn test_byte_order_mark_document_is_converted() {
    let path = fixtures_dir().join("BreakingChanges/WithBom.md");
    assert!(std::fs::read(&path).unwrap().starts_with(b"\xEF\xBB\xBF"));

    let change = Converter::new(Config::default()).extract(&path).unwrap();
    assert_eq!(change.id, 230);
    assert_eq!(change.title, "Saved with a byte order mark");
    assert_eq!(
        change.notes.as_deref(),
        Some("Written by an editor that adds a BOM")
    );
}
