use docmerge_core::{
    GenerateError, Generator, GeneratorConfig, Row, RowErrorPolicy, StampError, Stamper, Template,
};
use docmerge_sheet::SheetError;
use rust_xlsxwriter::{Format, Workbook};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const TEMPLATE_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Participant ${column['Id']}: ${Name}</w:t></w:r></w:p></w:body></w:document>"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// Workbook with a "Summary" sheet first and a "Data" sheet second.
    fn new(data: &[&[&str]]) -> Self {
        let dir = tempdir().unwrap();
        let mut workbook = Workbook::new();

        let summary = workbook.add_worksheet();
        summary.set_name("Summary").unwrap();
        summary.write_string(0, 0, "Id").unwrap();
        summary.write_string(1, 0, "summary-row").unwrap();

        let sheet = workbook.add_worksheet();
        sheet.set_name("Data").unwrap();
        for (r, cells) in data.iter().enumerate() {
            for (c, value) in cells.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
        workbook.save(dir.path().join("data.xlsx")).unwrap();

        std::fs::write(dir.path().join("template.docx"), docx(TEMPLATE_BODY)).unwrap();
        Self { dir }
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn config(&self) -> GeneratorConfig {
        GeneratorConfig::new(
            self.dir.path().join("template.docx"),
            self.dir.path().join("data.xlsx"),
            "Id",
        )
        .with_output_dir(self.out())
        .with_sheet(Some("data".to_string()))
    }

    fn outputs(&self) -> BTreeSet<String> {
        match std::fs::read_dir(self.out()) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => BTreeSet::new(),
        }
    }
}

fn docx(document: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(document.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

fn document_text(path: &Path) -> String {
    let bytes = std::fs::read(path).unwrap();
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut entry = archive.by_name("word/document.xml").unwrap();
    let mut xml = String::new();
    entry.read_to_string(&mut xml).unwrap();
    xml
}

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Counts calls and fails rows whose Id is "bad"
#[derive(Default)]
struct RecordingStamper {
    calls: Cell<usize>,
}

impl Stamper for RecordingStamper {
    fn stamp(&self, _template: &Template, row: &Row) -> docmerge_stamper::Result<Vec<u8>> {
        self.calls.set(self.calls.get() + 1);
        if row.column("Id") == Some("bad") {
            return Err(StampError::Unresolved {
                expression: "Missing".to_string(),
            });
        }
        Ok(row.to_string().into_bytes())
    }
}

fn template() -> Template {
    Template::from_bytes(docx(TEMPLATE_BODY)).unwrap()
}

fn rows(list: &[&[(&str, &str)]]) -> Vec<Row> {
    list.iter().map(|pairs| pairs.iter().copied().collect()).collect()
}

#[test]
fn test_generates_one_document_per_row() {
    let fixture = Fixture::new(&[
        &["Id", "Name"],
        &["1", "Ann"],
        &["2", "Bob"],
    ]);

    let summary = Generator::with_docx(fixture.config()).run().unwrap();

    assert_eq!(summary.sheet, "Data");
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.generated_count(), 2);
    assert_eq!(fixture.outputs(), names(&["1.docx", "2.docx"]));
    assert!(document_text(&fixture.out().join("1.docx")).contains("Participant 1: Ann"));
    assert!(document_text(&fixture.out().join("2.docx")).contains("Participant 2: Bob"));
}

#[test]
fn test_blank_rows_and_blank_keys_are_skipped() {
    let fixture = Fixture::new(&[
        &["Id", "Name"],
        &["1", "Ann"],
        &["", ""],
        &["", "No key"],
        &["   ", "Whitespace key"],
        &["5", "Eve"],
    ]);

    let summary = Generator::with_docx(fixture.config()).run().unwrap();

    assert_eq!(summary.skipped_blank_rows, 1);
    assert_eq!(summary.skipped_blank_keys, 2);
    assert_eq!(fixture.outputs(), names(&["1.docx", "5.docx"]));
}

#[test]
fn test_keys_that_are_not_file_names_are_skipped() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");

    let config = GeneratorConfig::new("unused.docx", "unused.xlsx", "Id").with_output_dir(&out);
    let generator = Generator::new(config, RecordingStamper::default());
    let summary = generator
        .generate(
            &template(),
            &rows(&[
                &[("Id", "../escape")],
                &[("Id", "a/b")],
                &[("Id", "ok")],
            ]),
        )
        .unwrap();

    assert_eq!(summary.skipped_unsafe_keys, 2);
    assert_eq!(summary.generated, vec![out.join("ok.docx")]);
    assert!(!dir.path().join("escape.docx").exists());
    assert_eq!(generator.stamper().calls.get(), 1);
}

#[test]
fn test_output_named_after_formatted_key() {
    let dir = tempdir().unwrap();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Id").unwrap();
    sheet.write_string(0, 1, "Name").unwrap();
    sheet
        .write_number_with_format(1, 0, 42, &Format::new().set_num_format("00000"))
        .unwrap();
    sheet.write_string(1, 1, "Ann").unwrap();
    workbook.save(dir.path().join("data.xlsx")).unwrap();
    std::fs::write(dir.path().join("template.docx"), docx(TEMPLATE_BODY)).unwrap();

    let out = dir.path().join("out");
    let config = GeneratorConfig::new(
        dir.path().join("template.docx"),
        dir.path().join("data.xlsx"),
        "Id",
    )
    .with_output_dir(&out);
    let summary = Generator::with_docx(config).run().unwrap();

    assert_eq!(summary.generated, vec![out.join("00042.docx")]);
    assert!(document_text(&out.join("00042.docx")).contains("Participant 00042: Ann"));
}

#[test]
fn test_all_rows_skipped_creates_no_output_dir() {
    let fixture = Fixture::new(&[&["Id", "Name"], &["", "Ann"]]);

    let summary = Generator::with_docx(fixture.config()).run().unwrap();

    assert_eq!(summary.generated_count(), 0);
    assert!(!fixture.out().exists());
}

#[test]
fn test_existing_output_is_left_untouched() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("1.docx"), b"keep me").unwrap();

    let config = GeneratorConfig::new("unused.docx", "unused.xlsx", "Id").with_output_dir(dir.path());
    let generator = Generator::new(config, RecordingStamper::default());
    let summary = generator
        .generate(&template(), &rows(&[&[("Id", "1")], &[("Id", "2")]]))
        .unwrap();

    assert_eq!(summary.skipped_existing, 1);
    assert_eq!(summary.generated, vec![dir.path().join("2.docx")]);
    assert_eq!(std::fs::read(dir.path().join("1.docx")).unwrap(), b"keep me");
    // Only the second row reached the stamper
    assert_eq!(generator.stamper().calls.get(), 1);
}

#[test]
fn test_replace_regenerates_existing_output() {
    let fixture = Fixture::new(&[&["Id", "Name"], &["1", "Ann"]]);
    std::fs::create_dir_all(fixture.out()).unwrap();
    std::fs::write(fixture.out().join("1.docx"), b"stale").unwrap();

    let summary = Generator::with_docx(fixture.config().with_replace(true))
        .run()
        .unwrap();

    assert_eq!(summary.generated_count(), 1);
    assert_eq!(summary.skipped_existing, 0);
    assert!(document_text(&fixture.out().join("1.docx")).contains("Participant 1: Ann"));
}

#[test]
fn test_second_run_without_replace_is_noop() {
    let fixture = Fixture::new(&[
        &["Id", "Name"],
        &["1", "Ann"],
        &["2", "Bob"],
    ]);

    let first = Generator::with_docx(fixture.config()).run().unwrap();
    let files_after_first = fixture.outputs();
    let bytes_after_first = std::fs::read(fixture.out().join("1.docx")).unwrap();

    let second = Generator::with_docx(fixture.config()).run().unwrap();

    assert_eq!(first.generated_count(), 2);
    assert_eq!(second.generated_count(), 0);
    assert_eq!(second.skipped_existing, 2);
    assert_eq!(fixture.outputs(), files_after_first);
    assert_eq!(
        std::fs::read(fixture.out().join("1.docx")).unwrap(),
        bytes_after_first
    );
}

#[test]
fn test_first_row_only_produces_first_eligible_row() {
    let fixture = Fixture::new(&[
        &["Id", "Name"],
        &["", ""],
        &["", "No key"],
        &["1", "Already there"],
        &["2", "Bob"],
        &["3", "Cid"],
        &["4", "Dee"],
    ]);
    std::fs::create_dir_all(fixture.out()).unwrap();
    std::fs::write(fixture.out().join("1.docx"), b"existing").unwrap();

    let summary = Generator::with_docx(fixture.config().with_first_row_only(true))
        .run()
        .unwrap();

    assert!(summary.stopped_early);
    assert_eq!(summary.generated, vec![fixture.out().join("2.docx")]);
    assert_eq!(fixture.outputs(), names(&["1.docx", "2.docx"]));
}

#[test]
fn test_default_sheet_is_first() {
    let fixture = Fixture::new(&[&["Id", "Name"], &["1", "Ann"]]);

    let summary = Generator::with_docx(fixture.config().with_sheet(None))
        .run()
        .unwrap();

    assert_eq!(summary.sheet, "Summary");
    assert_eq!(fixture.outputs(), names(&["summary-row.docx"]));
}

#[test]
fn test_unknown_sheet_aborts_before_any_output() {
    let fixture = Fixture::new(&[&["Id", "Name"], &["1", "Ann"]]);

    let err = Generator::with_docx(fixture.config().with_sheet(Some("Totals".into())))
        .run()
        .unwrap_err();

    assert!(matches!(
        err,
        GenerateError::Sheet(SheetError::SheetNotFound { .. })
    ));
    assert!(!fixture.out().exists());
}

#[test]
fn test_missing_template_is_fatal() {
    let fixture = Fixture::new(&[&["Id", "Name"], &["1", "Ann"]]);
    std::fs::remove_file(fixture.dir.path().join("template.docx")).unwrap();

    let err = Generator::with_docx(fixture.config()).run().unwrap_err();

    assert!(matches!(err, GenerateError::Template { .. }));
    assert!(fixture.outputs().is_empty());
}

#[test]
fn test_stamp_failure_aborts_by_default() {
    let dir = tempdir().unwrap();
    let config = GeneratorConfig::new("unused.docx", "unused.xlsx", "Id").with_output_dir(dir.path());
    let generator = Generator::new(config, RecordingStamper::default());

    let err = generator
        .generate(
            &template(),
            &rows(&[&[("Id", "1")], &[("Id", "bad")], &[("Id", "3")]]),
        )
        .unwrap_err();

    assert!(matches!(err, GenerateError::Stamp { ref key, .. } if key == "bad"));
    assert!(dir.path().join("1.docx").exists());
    assert!(!dir.path().join("bad.docx").exists());
    assert!(!dir.path().join("3.docx").exists());
}

#[test]
fn test_stamp_failure_isolated_when_skipping() {
    let dir = tempdir().unwrap();
    let config = GeneratorConfig::new("unused.docx", "unused.xlsx", "Id")
        .with_output_dir(dir.path())
        .with_row_errors(RowErrorPolicy::Skip);
    let generator = Generator::new(config, RecordingStamper::default());

    let summary = generator
        .generate(
            &template(),
            &rows(&[&[("Id", "1")], &[("Id", "bad")], &[("Id", "3")]]),
        )
        .unwrap();

    assert_eq!(summary.generated_count(), 2);
    assert_eq!(summary.failure_count(), 1);
    assert_eq!(summary.failures[0].key, "bad");
    assert!(!dir.path().join("bad.docx").exists());
}

#[test]
fn test_first_row_only_skips_past_isolated_failure() {
    let dir = tempdir().unwrap();
    let config = GeneratorConfig::new("unused.docx", "unused.xlsx", "Id")
        .with_output_dir(dir.path())
        .with_row_errors(RowErrorPolicy::Skip)
        .with_first_row_only(true);
    let generator = Generator::new(config, RecordingStamper::default());

    let summary = generator
        .generate(
            &template(),
            &rows(&[&[("Id", "bad")], &[("Id", "2")], &[("Id", "3")]]),
        )
        .unwrap();

    assert_eq!(summary.generated, vec![dir.path().join("2.docx")]);
    assert_eq!(summary.failure_count(), 1);
}

#[test]
fn test_summary_serializes_to_json() {
    let dir = tempdir().unwrap();
    let config = GeneratorConfig::new("unused.docx", "unused.xlsx", "Id").with_output_dir(dir.path());
    let generator = Generator::new(config, RecordingStamper::default());
    let summary = generator
        .generate(&template(), &rows(&[&[("Id", "1")], &[]]))
        .unwrap();

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["rows"], 2);
    assert_eq!(json["skipped_blank_rows"], 1);
    assert_eq!(json["generated"].as_array().unwrap().len(), 1);
}
