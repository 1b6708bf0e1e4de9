//! End-to-end export/import tests over real directories

use emubt_core::{
    export_directory, extract, import_directory, symbols, CellFormat, Document, ExportOptions,
    ImportOptions,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const GAIN_DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<bank version="3">
  <!-- tuning data -->
  <meta author="someone">notes &amp; things</meta>
  <symbol name="Gain Table" width="2" height="2" data="0A 0B 0C 0D"/>
</bank>"#;

const MULTI_DOC: &str = r#"<?xml version="1.0"?>
<bank>
  <symbol name="Curve" width="3" height="2" data="1 2 3 4 5 6"/>
  <group>
    <symbol name="Map/A" width="2" height="1" data="0x10 3C"/>
  </group>
  <symbol name="Broken" width="2" height="2" data="1 2 3"/>
</bank>"#;

fn data_attrs(path: &Path) -> Vec<(String, String)> {
    let doc = Document::load(path).unwrap();
    symbols(&doc)
        .into_iter()
        .map(|s| (s.sanitized_name, s.data))
        .collect()
}

#[test]
fn test_gain_table_scenario() {
    let tmp = TempDir::new().unwrap();
    let doc_path = tmp.path().join("bank0.emubt");
    fs::write(&doc_path, GAIN_DOC).unwrap();

    let export = export_directory(tmp.path(), &ExportOptions::default()).unwrap();
    let csv_path = tmp.path().join("bank0__Gain_Table.csv");
    assert_eq!(export.files_written, vec![csv_path.clone()]);
    assert_eq!(fs::read_to_string(&csv_path).unwrap(), "10,11\n12,13\n");

    fs::write(&csv_path, "10,11\n12,255\n").unwrap();
    let import = import_directory(tmp.path(), &ImportOptions::default()).unwrap();

    let out_path = tmp.path().join("altered_bank0.emubt");
    assert_eq!(import.changed(), 1);
    assert_eq!(import.outputs, vec![out_path.clone()]);
    assert_eq!(
        data_attrs(&out_path),
        vec![("Gain_Table".to_string(), "A B C FF".to_string())]
    );

    // Original is untouched
    assert_eq!(fs::read_to_string(&doc_path).unwrap(), GAIN_DOC);
}

#[test]
fn test_import_preserves_unrelated_content() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bank0.emubt"), GAIN_DOC).unwrap();
    fs::write(tmp.path().join("bank0__Gain_Table.csv"), "1,2\n3,4\n").unwrap();

    import_directory(tmp.path(), &ImportOptions::default()).unwrap();

    let written = fs::read_to_string(tmp.path().join("altered_bank0.emubt")).unwrap();
    let expected = GAIN_DOC.replace(r#"data="0A 0B 0C 0D""#, r#"data="1 2 3 4""#);
    assert_eq!(written, expected);
}

#[test]
fn test_round_trip_keeps_letter_spelled_values() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("multi.emubt"), MULTI_DOC).unwrap();

    let export = export_directory(tmp.path(), &ExportOptions::default()).unwrap();
    assert_eq!(export.files_written.len(), 2);
    assert_eq!(export.skipped.len(), 1);

    let import = import_directory(tmp.path(), &ImportOptions::default()).unwrap();
    assert_eq!(import.changed(), 2);

    let original = Document::load(tmp.path().join("multi.emubt")).unwrap();
    let altered = Document::load(tmp.path().join("altered_multi.emubt")).unwrap();
    let before = extract(&original);
    let after = extract(&altered);

    assert_eq!(
        after["Curve"].decode().unwrap(),
        before["Curve"].decode().unwrap()
    );
    assert_eq!(after["Curve"].data, "1 2 3 4 5 6");
    // 0x10 is stored as "10", which reads back as decimal ten;
    // only cells whose hex spelling has a letter keep their value
    assert_eq!(before["Map_A"].decode().unwrap(), vec![16, 60]);
    assert_eq!(after["Map_A"].data, "10 3C");
    assert_eq!(after["Map_A"].decode().unwrap(), vec![10, 60]);
    // Unexported symbol keeps its original text
    assert_eq!(after["Broken"].data, "1 2 3");
}

#[test]
fn test_hex_export_letter_free_cells_read_back_as_decimal() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("multi.emubt"), MULTI_DOC).unwrap();

    let options = ExportOptions {
        format: CellFormat::Hex,
        out_dir: None,
    };
    export_directory(tmp.path(), &options).unwrap();
    assert_eq!(
        fs::read_to_string(tmp.path().join("multi__Map_A.csv")).unwrap(),
        "10,3C\n"
    );

    import_directory(tmp.path(), &ImportOptions::default()).unwrap();

    let altered = Document::load(tmp.path().join("altered_multi.emubt")).unwrap();
    let after = extract(&altered);
    // "10" has no hex letter, so it comes back as decimal ten
    assert_eq!(after["Map_A"].decode().unwrap(), vec![10, 60]);
    assert_eq!(after["Curve"].decode().unwrap(), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_partial_failure_isolation() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bank0.emubt"), GAIN_DOC).unwrap();
    fs::write(tmp.path().join("bank0__Gain_Table.csv"), "1,2\n3,4\n").unwrap();
    fs::write(tmp.path().join("bank0__Nope.csv"), "1\n").unwrap();

    let import = import_directory(tmp.path(), &ImportOptions::default()).unwrap();

    assert_eq!(import.groups.len(), 1);
    let group = &import.groups[0];
    assert_eq!(group.changed(), 1);
    assert_eq!(group.skipped.len(), 1);
    assert_eq!(group.skipped[0].0, tmp.path().join("bank0__Nope.csv"));
    assert!(group.output.is_some());
    assert!(tmp.path().join("altered_bank0.emubt").exists());
}

#[test]
fn test_invalid_grids_leave_symbol_untouched() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("multi.emubt"), MULTI_DOC).unwrap();
    // wrong cell count
    fs::write(tmp.path().join("multi__Curve.csv"), "1,2\n3,4\n").unwrap();
    // ragged rows
    fs::write(tmp.path().join("multi__Map_A.csv"), "1,2\n3\n").unwrap();
    // bad token
    fs::write(tmp.path().join("multi__Broken.csv"), "1,2\nq,4\n").unwrap();

    let import = import_directory(tmp.path(), &ImportOptions::default()).unwrap();

    assert_eq!(import.changed(), 0);
    assert_eq!(import.skipped(), 3);
    assert!(import.outputs.is_empty());
    assert!(!tmp.path().join("altered_multi.emubt").exists());
}

#[test]
fn test_no_change_scenario() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bank0.emubt"), GAIN_DOC).unwrap();
    fs::write(tmp.path().join("bank0__Missing.csv"), "1,2\n3,4\n").unwrap();
    fs::write(tmp.path().join("bank0__Other.csv"), "1,2\n3,4\n").unwrap();

    let import = import_directory(tmp.path(), &ImportOptions::default()).unwrap();

    assert_eq!(import.changed(), 0);
    assert!(import.outputs.is_empty());
    assert_eq!(import.groups[0].skipped.len(), 2);
    assert!(!tmp.path().join("altered_bank0.emubt").exists());
}

#[test]
fn test_missing_and_malformed_documents() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("ghost__Gain_Table.csv"), "1,2\n3,4\n").unwrap();
    fs::write(tmp.path().join("bad.emubt"), "<bank><symbol></bank>").unwrap();
    fs::write(tmp.path().join("bad__Gain_Table.csv"), "1,2\n3,4\n").unwrap();
    fs::write(tmp.path().join("BANK0.EMUBT"), GAIN_DOC).unwrap();
    fs::write(tmp.path().join("bank0__Gain_Table.csv"), "5,6\n7,8\n").unwrap();

    let import = import_directory(tmp.path(), &ImportOptions::default()).unwrap();

    let failed: Vec<_> = import.failed_groups().map(|g| g.stem.as_str()).collect();
    assert_eq!(failed, vec!["bad", "ghost"]);
    assert_eq!(import.outputs, vec![tmp.path().join("altered_BANK0.EMUBT")]);
    assert_eq!(
        data_attrs(&tmp.path().join("altered_BANK0.EMUBT")),
        vec![("Gain_Table".to_string(), "5 6 7 8".to_string())]
    );
}

#[test]
fn test_custom_prefix() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bank0.emubt"), GAIN_DOC).unwrap();
    fs::write(tmp.path().join("bank0__Gain_Table.csv"), "1,2\n3,4\n").unwrap();

    let options = ImportOptions {
        out_prefix: "edited-".to_string(),
    };
    let import = import_directory(tmp.path(), &options).unwrap();

    assert_eq!(import.outputs, vec![tmp.path().join("edited-bank0.emubt")]);
}

#[test]
fn test_empty_directory() {
    let tmp = TempDir::new().unwrap();

    let export = export_directory(tmp.path(), &ExportOptions::default()).unwrap();
    let import = import_directory(tmp.path(), &ImportOptions::default()).unwrap();

    assert!(export.files_written.is_empty());
    assert!(import.groups.is_empty());
}

#[test]
fn test_missing_directory_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope");

    assert!(export_directory(&missing, &ExportOptions::default()).is_err());
    assert!(import_directory(&missing, &ImportOptions::default()).is_err());
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_does_not_abort_run() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bank0.emubt"), GAIN_DOC).unwrap();
    fs::write(tmp.path().join("bank0__Gain_Table.csv"), "1,2\n3,4\n").unwrap();
    std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("stale.lnk")).unwrap();

    let import = import_directory(tmp.path(), &ImportOptions::default()).unwrap();

    assert_eq!(import.changed(), 1);
    assert_eq!(import.outputs, vec![tmp.path().join("altered_bank0.emubt")]);
}
