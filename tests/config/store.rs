use rstest::rstest;
use serde_json::Number;
use slow_relay::{
    RelayError,
    config::{ConfigStore, ConfigValue, store::CONFIG_CAPACITY},
};
use std::time::Duration;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Creating a temp dir should not fail")
}

#[rstest]
#[case("hello world", ConfigValue::Text("hello world".to_string()))]
#[case("42", ConfigValue::Number(Number::from(42)))]
#[case("true", ConfigValue::Bool(true))]
#[case("\"quoted\"", ConfigValue::Text("quoted".to_string()))]
#[case("[1, 2", ConfigValue::Text("[1, 2".to_string()))]
#[case("{\"a\":1}", ConfigValue::Text("{\"a\":1}".to_string()))]
#[case("null", ConfigValue::Text("null".to_string()))]
#[case(
    "123456789012345678901234",
    ConfigValue::Text("123456789012345678901234".to_string())
)]
#[case("-99999999999999999999", ConfigValue::Text("-99999999999999999999".to_string()))]
#[case("1.5", ConfigValue::Number(Number::from_f64(1.5).expect("1.5 is finite")))]
#[case("2e3", ConfigValue::Number(Number::from_f64(2000.0).expect("2000 is finite")))]
fn test_value_parse(#[case] raw: &str, #[case] expected: ConfigValue) {
    assert_eq!(ConfigValue::parse(raw), expected);
}

#[tokio::test]
async fn test_text_round_trips_through_disk() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    let mut store = ConfigStore::empty(path.clone());
    store
        .set("GREETING", "hello world")
        .await
        .expect("Setting a key should not fail");
    assert_eq!(store.lookup("GREETING").as_deref(), Some("hello world"));

    let reloaded = ConfigStore::load(path).await;
    assert_eq!(reloaded.lookup("GREETING").as_deref(), Some("hello world"));
}

#[tokio::test]
async fn test_number_renders_as_written() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    let mut store = ConfigStore::empty(path.clone());
    store
        .set("ANSWER", "42")
        .await
        .expect("Setting a key should not fail");

    let reloaded = ConfigStore::load(path).await;
    assert_eq!(
        reloaded.get("ANSWER"),
        Some(&ConfigValue::Number(Number::from(42)))
    );
    assert_eq!(reloaded.lookup("ANSWER").as_deref(), Some("42"));
}

#[tokio::test]
async fn test_empty_value_deletes_key() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    let mut store = ConfigStore::empty(path.clone());
    store.set("A", "1").await.expect("Set should not fail");
    store.set("B", "2").await.expect("Set should not fail");
    store.set("A", "").await.expect("Delete should not fail");

    assert!(store.get("A").is_none());
    let reloaded = ConfigStore::load(path).await;
    assert!(reloaded.get("A").is_none());
    assert_eq!(reloaded.lookup("B").as_deref(), Some("2"));
}

#[tokio::test]
async fn test_deleting_absent_key_does_not_write() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    let mut store = ConfigStore::empty(path.clone());
    store
        .set("MISSING", "")
        .await
        .expect("Deleting an absent key should not fail");
    assert!(!path.exists());
}

#[tokio::test]
async fn test_enumerate_is_key_ordered() {
    let dir = temp_dir();
    let mut store = ConfigStore::empty(dir.path().join("config.json"));
    store.set("ZETA", "last").await.expect("Set should not fail");
    store.set("ALPHA", "false").await.expect("Set should not fail");

    let pairs: Vec<(String, String)> = store
        .enumerate()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("ALPHA".to_string(), "false".to_string()),
            ("ZETA".to_string(), "last".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_oversized_store_is_refused() {
    let dir = temp_dir();
    let mut store = ConfigStore::empty(dir.path().join("config.json"));
    store.set("KEEP", "me").await.expect("Set should not fail");

    let huge = "x".repeat(CONFIG_CAPACITY);
    let result = store.set("HUGE", &huge).await;
    assert!(matches!(result, Err(RelayError::ConfigFull)));
    assert!(store.get("HUGE").is_none());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_oversized_update_keeps_previous_value() {
    let dir = temp_dir();
    let mut store = ConfigStore::empty(dir.path().join("config.json"));
    store.set("KEY", "small").await.expect("Set should not fail");

    let result = store.set("KEY", &"y".repeat(CONFIG_CAPACITY)).await;
    assert!(matches!(result, Err(RelayError::ConfigFull)));
    assert_eq!(store.lookup("KEY").as_deref(), Some("small"));
}

#[tokio::test]
async fn test_save_failure_keeps_memory_change() {
    let dir = temp_dir();
    let mut store = ConfigStore::empty(dir.path().join("missing-dir").join("config.json"));
    let result = store.set("KEY", "value").await;
    assert!(matches!(result, Err(RelayError::ConfigSave(_))));
    assert_eq!(store.lookup("KEY").as_deref(), Some("value"));
}

#[tokio::test]
async fn test_missing_or_corrupt_file_loads_empty() {
    let dir = temp_dir();
    let missing = ConfigStore::load(dir.path().join("absent.json")).await;
    assert!(missing.is_empty());

    let corrupt_path = dir.path().join("corrupt.json");
    std::fs::write(&corrupt_path, b"{not json").expect("Writing fixture should not fail");
    let corrupt = ConfigStore::load(corrupt_path).await;
    assert!(corrupt.is_empty());
}

#[tokio::test]
async fn test_load_keeps_non_scalar_values_as_text() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    std::fs::write(&path, br#"{"LIST":[1,2],"GONE":null,"ON":true}"#)
        .expect("Writing fixture should not fail");

    let store = ConfigStore::load(path).await;
    assert_eq!(store.lookup("LIST").as_deref(), Some("[1,2]"));
    assert!(store.get("GONE").is_none());
    assert_eq!(store.get("ON"), Some(&ConfigValue::Bool(true)));
}

#[tokio::test]
async fn test_wide_integer_renders_as_written() {
    let dir = temp_dir();
    let mut store = ConfigStore::empty(dir.path().join("config.json"));
    store
        .set("ID", "123456789012345678901234")
        .await
        .expect("Set should not fail");
    assert_eq!(
        store.lookup("ID").as_deref(),
        Some("123456789012345678901234")
    );
}

#[tokio::test]
async fn test_delay_key() {
    let dir = temp_dir();
    let mut store = ConfigStore::empty(dir.path().join("config.json"));
    assert_eq!(store.delay(), None);
    store.set("DELAY", "20").await.expect("Set should not fail");
    assert_eq!(store.delay(), Some(Duration::from_millis(20)));
}
