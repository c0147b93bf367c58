mod common;

use common::{init_tracing, temp_db_path};
use hw_store::{HwStore, RawSample};

#[test]
fn test_file_backed_ingest_and_reopen() {
    init_tracing();
    let db_path = temp_db_path("ingest_flow");

    {
        let store = HwStore::open(&db_path).unwrap();

        let raw: Vec<RawSample> = vec![
            serde_json::from_str(r#"{"cpu_name":"Snapdragon 888"}"#).unwrap(),
            serde_json::from_str(r#"{"oem":"Google","has_touchscreen":true}"#).unwrap(),
        ];
        let batch: Vec<_> = raw.into_iter().map(RawSample::normalize).collect();
        assert_eq!(store.insert_batch(&batch).unwrap(), 2);
        assert_eq!(store.count_records().unwrap(), 2);
    }

    // Reopen: the data survives the handle's lifecycle
    let store = HwStore::open(&db_path).unwrap();
    let records = store.list_records().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sample.config.oem, "Google");
    assert!(records[0].sample.config.has_touchscreen);
    assert_eq!(records[1].sample.config.cpu_name, "Snapdragon 888");
    assert_eq!(records[1].sample.config.form_factor, "Smartphone");

    std::fs::remove_file(&db_path).ok();
}
