mod test_support;

use serde_json::json;
use test_support::{open_dataset, request_ok, spawn_sidecar, temp_dir, write_csv};

#[test]
fn new_lesson_appends_one_record_with_defaults() {
    let dir = temp_dir("lessond-create");
    let path = write_csv(
        &dir,
        "calendar.csv",
        "Week,Day # (Continuous),Lesson Title,Date,Lesson Status",
        &[
            "1,1,Intro,\"August 11, 2025\",Taught",
            "2,2,Maps,\"August 18, 2025\",Taught",
        ],
    );
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = open_dataset(&mut stdin, &mut reader, &path);

    let before: Vec<serde_json::Value> = (0..2)
        .map(|i| {
            request_ok(&mut stdin, &mut reader, "b", "lessons.get", json!({ "index": i }))["record"]
                .clone()
        })
        .collect();

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "lessons.create",
        json!({ "week": "2" }),
    );
    assert_eq!(first["recordCount"], json!(3));
    assert_eq!(first["index"], json!(2));
    let title = first["title"].as_str().expect("title").to_string();
    assert!(title.starts_with("New Lesson "), "{title}");

    let second = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "lessons.create",
        json!({ "week": 2 }),
    );
    assert_eq!(second["recordCount"], json!(4));
    assert_ne!(second["title"], first["title"]);

    let created = request_ok(&mut stdin, &mut reader, "3", "lessons.get", json!({ "index": 2 }));
    assert_eq!(created["record"]["Week"], json!("2"));
    assert_eq!(created["record"]["Lesson Status"], json!("Planned"));
    assert_eq!(created["record"]["Day # (Continuous)"], json!("3"));
    let date = created["record"]["Date"].as_str().expect("date");
    assert!(date.contains(", 20"), "{date}");

    let after: Vec<serde_json::Value> = (0..2)
        .map(|i| {
            request_ok(&mut stdin, &mut reader, "a", "lessons.get", json!({ "index": i }))["record"]
                .clone()
        })
        .collect();
    assert_eq!(before, after);

    let titles = request_ok(&mut stdin, &mut reader, "4", "lessons.titles", json!({ "week": "2" }));
    assert_eq!(titles["titles"].as_array().map(|a| a.len()), Some(3));

    // Persisted on disk.
    let (_child2, mut stdin2, mut reader2) = spawn_sidecar();
    let reopened = open_dataset(&mut stdin2, &mut reader2, &path);
    assert_eq!(reopened["recordCount"], json!(4));

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn new_lesson_without_week_param_uses_first_week_and_adds_columns() {
    let dir = temp_dir("lessond-create-defaults");
    let path = write_csv(&dir, "calendar.csv", "Week,Title", &["5,Reform", "3,Jackson"]);
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = open_dataset(&mut stdin, &mut reader, &path);

    let created = request_ok(&mut stdin, &mut reader, "1", "lessons.create", json!({}));
    assert_eq!(created["week"], json!("3"));

    let got = request_ok(&mut stdin, &mut reader, "2", "lessons.get", json!({ "index": 2 }));
    assert_eq!(got["record"]["Lesson Status"], json!("Planned"));
    assert!(got["record"].get("Day # (Continuous)").is_none());
    assert_eq!(got["record"]["Title"], created["title"]);

    let _ = std::fs::remove_dir_all(dir);
}
