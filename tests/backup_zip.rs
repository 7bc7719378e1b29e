#[path = "../src/backup.rs"]
mod backup;

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

#[test]
fn zip_export_and_import_roundtrip() {
    let src_dir = temp_dir("lessond-backup-src");
    let dst_dir = temp_dir("lessond-backup-dst");
    let out_dir = temp_dir("lessond-backup-out");

    let dataset = src_dir.join("calendar.csv");
    let bytes = b"Week,Lesson Title\n1,Intro\n";
    std::fs::write(&dataset, bytes).expect("write source dataset");

    let bundle_path = out_dir.join("calendar.lessond.zip");
    let export = backup::export_dataset_bundle(&dataset, &bundle_path).expect("export bundle");
    assert_eq!(export.bundle_format, backup::BUNDLE_FORMAT_V1);
    assert_eq!(export.entry_count, 2);
    assert_eq!(export.sha256, backup::sha256_hex(bytes));

    let f = File::open(&bundle_path).expect("open bundle");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut manifest = String::new();
    archive
        .by_name("manifest.json")
        .expect("manifest entry")
        .read_to_string(&mut manifest)
        .expect("read manifest");
    assert!(manifest.contains(backup::BUNDLE_FORMAT_V1));
    assert!(manifest.contains("calendar.csv"));
    archive
        .by_name("dataset/calendar.csv")
        .expect("dataset entry in bundle");

    let target = dst_dir.join("restored.csv");
    let import = backup::import_dataset_bundle(&bundle_path, &target).expect("import bundle");
    assert_eq!(import.bundle_format_detected, backup::BUNDLE_FORMAT_V1);
    assert_eq!(import.dataset_file, "calendar.csv");
    assert_eq!(std::fs::read(&target).expect("read restored"), bytes);

    let wrong_kind = dst_dir.join("restored.xlsx");
    assert!(backup::import_dataset_bundle(&bundle_path, &wrong_kind).is_err());
    assert!(!wrong_kind.exists());

    let _ = std::fs::remove_dir_all(src_dir);
    let _ = std::fs::remove_dir_all(dst_dir);
    let _ = std::fs::remove_dir_all(out_dir);
}

#[test]
fn tampered_dataset_entry_is_rejected() {
    let dir = temp_dir("lessond-backup-tamper");
    let dataset = dir.join("calendar.csv");
    std::fs::write(&dataset, b"Week,Lesson Title\n1,Intro\n").expect("write dataset");

    let good = dir.join("good.zip");
    backup::export_dataset_bundle(&dataset, &good).expect("export bundle");
    let mut manifest = String::new();
    zip::ZipArchive::new(File::open(&good).expect("open bundle"))
        .expect("zip")
        .by_name("manifest.json")
        .expect("manifest")
        .read_to_string(&mut manifest)
        .expect("read manifest");

    let bad = dir.join("bad.zip");
    let mut zip = zip::ZipWriter::new(File::create(&bad).expect("create bad bundle"));
    let opts = zip::write::FileOptions::default();
    zip.start_file("manifest.json", opts).expect("start manifest");
    zip.write_all(manifest.as_bytes()).expect("write manifest");
    zip.start_file("dataset/calendar.csv", opts).expect("start dataset");
    zip.write_all(b"Week,Lesson Title\n1,Tampered\n").expect("write dataset");
    zip.finish().expect("finish zip");

    let err = backup::import_dataset_bundle(&bad, &dataset).expect_err("checksum mismatch");
    assert!(err.to_string().contains("checksum"), "{err}");
    assert_eq!(
        std::fs::read_to_string(&dataset).expect("read dataset"),
        "Week,Lesson Title\n1,Intro\n"
    );

    let _ = std::fs::remove_dir_all(dir);
}
