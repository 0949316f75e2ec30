use chrono::NaiveDate;
use retail_ops::agents::forecasting;
use retail_ops::config::Settings;
use retail_ops::agents::local::LocalAgents;
use retail_ops::core::reference::ReferenceData;
use retail_ops::RetailError;
use std::fs;
use tempfile::TempDir;

fn write_minimal(dir: &TempDir) {
    let mut csv = String::from("date,category,sales\n");
    for day in 1..=30 {
        csv.push_str(&format!("2024-11-{day:02},toys,{}\n", if day % 2 == 0 { 6 } else { 4 }));
    }
    fs::write(dir.path().join("sales_history.csv"), csv).unwrap();
    fs::write(
        dir.path().join("events.json"),
        r#"{ "events": [ { "name": "Children's Day", "date": "2026-11-14", "multiplier": 1.5 } ] }"#,
    )
    .unwrap();
}

#[test]
fn loads_a_directory_with_only_required_files() {
    let dir = TempDir::new().unwrap();
    write_minimal(&dir);

    let data = ReferenceData::load(dir.path()).unwrap();
    assert_eq!(data.categories(), vec!["toys".to_string()]);
    assert_eq!(data.catalog().count(), 0);

    let figures = forecasting::compute(&data, "toys", NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()).unwrap();
    assert_eq!(figures.base, 5.0);
    assert_eq!(figures.event.as_deref(), Some("Children's Day"));
    assert_eq!(figures.surge, 1.0);
    assert_eq!(figures.final_forecast, 7.5);
}

#[test]
fn missing_event_calendar_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    write_minimal(&dir);
    fs::remove_file(dir.path().join("events.json")).unwrap();

    let err = ReferenceData::load(dir.path()).unwrap_err();
    assert!(matches!(err, RetailError::DataLoad { ref file, .. } if file.ends_with("events.json")));
}

#[test]
fn malformed_sales_row_names_the_line() {
    let dir = TempDir::new().unwrap();
    write_minimal(&dir);
    fs::write(
        dir.path().join("sales_history.csv"),
        "date,category,sales\n2024-11-01,toys,4\n2024-11-02,toys,lots\n",
    )
    .unwrap();

    let err = ReferenceData::load(dir.path()).unwrap_err().to_string();
    assert!(err.contains("line 3"), "{err}");
}

#[test]
fn settings_point_agents_at_a_data_directory() {
    let dir = TempDir::new().unwrap();
    write_minimal(&dir);
    let path = dir.path().to_string_lossy().to_string();

    let settings = Settings::from_lookup(|key| match key {
        "RETAIL_OPS_DATA_DIR" => Some(path.clone()),
        "RETAIL_OPS_AS_OF" => Some("2026-10-18".to_string()),
        _ => None,
    })
    .unwrap();

    let agents = LocalAgents::from_settings(&settings).unwrap();
    assert_eq!(agents.data().categories(), vec!["toys".to_string()]);
}
