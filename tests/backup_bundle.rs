mod test_support;

use serde_json::json;
use test_support::{error_code, open_dataset, request, request_ok, spawn_sidecar, temp_dir, write_csv};

#[test]
fn restore_reverts_edits_made_after_backup() {
    let dir = temp_dir("lessond-bundle");
    let path = write_csv(
        &dir,
        "calendar.csv",
        "Week,Lesson Title,Essential Question",
        &["1,Intro,Who are we?", "1,Maps,Where are we?"],
    );
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = open_dataset(&mut stdin, &mut reader, &path);

    let bundle = dir.join("backups").join("calendar.zip");
    let backup = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "dataset.backup",
        json!({ "outPath": bundle.to_string_lossy() }),
    );
    assert_eq!(backup["bundleFormat"], json!("lessond-dataset-v1"));
    assert_eq!(backup["entryCount"], json!(2));
    assert!(bundle.is_file());

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "lessons.update",
        json!({ "index": 0, "field": "Essential Question", "value": "Changed" }),
    );
    let _ = request_ok(&mut stdin, &mut reader, "3", "lessons.create", json!({ "week": "1" }));

    let restored = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "dataset.restore",
        json!({ "inPath": bundle.to_string_lossy() }),
    );
    assert_eq!(restored["bundleFormatDetected"], json!("lessond-dataset-v1"));
    assert_eq!(restored["recordCount"], json!(2));

    let got = request_ok(&mut stdin, &mut reader, "5", "lessons.get", json!({ "index": 0 }));
    assert_eq!(got["record"]["Essential Question"], json!("Who are we?"));

    let missing = request(
        &mut stdin,
        &mut reader,
        "6",
        "dataset.restore",
        json!({ "inPath": dir.join("nope.zip").to_string_lossy() }),
    );
    assert_eq!(error_code(&missing), Some("bundle_failed"));

    let no_path = request(&mut stdin, &mut reader, "7", "dataset.backup", json!({}));
    assert_eq!(error_code(&no_path), Some("bad_params"));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn backup_requires_open_session() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let resp = request(
        &mut stdin,
        &mut reader,
        "1",
        "dataset.backup",
        json!({ "outPath": "/tmp/never.zip" }),
    );
    assert_eq!(error_code(&resp), Some("no_session"));
}
