#![forbid(unsafe_code)]
use garde::{
    export_rule_json, load_rule_from_file, JsonStorage, Member, ScheduleStore, WardRule,
    WardSchedule, YearMonth,
};
use std::fs;
use tempfile::tempdir;

#[test]
fn save_and_load_rule_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rule.json");
    let rule = WardRule {
        weekday_day: 4,
        max_consecutive_nights: 2,
        ..WardRule::default()
    };
    export_rule_json(&path, &rule).unwrap();

    let loaded = load_rule_from_file(&path).unwrap();
    assert_eq!(loaded, rule);
}

#[test]
fn rule_limits_default_when_missing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rule.json");
    fs::write(
        &path,
        r#"{"weekday_day":3,"weekday_evening":2,"weekday_night":2,
            "weekend_day":2,"weekend_evening":2,"weekend_night":2}"#,
    )
    .unwrap();

    let loaded = load_rule_from_file(&path).unwrap();
    assert_eq!(loaded.max_consecutive_shifts, 5);
    assert_eq!(loaded.max_consecutive_nights, 3);
}

#[test]
fn invalid_rule_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rule.json");
    let rule = WardRule {
        weekend_night: -2,
        ..WardRule::default()
    };
    export_rule_json(&path, &rule).unwrap();
    assert!(load_rule_from_file(&path).is_err());
    assert!(load_rule_from_file(dir.path().join("missing.json")).is_err());
}

#[test]
fn schedule_storage_roundtrip() {
    let dir = tempdir().unwrap();
    let storage = JsonStorage::open(dir.path().join("schedule.json")).unwrap();
    assert!(!storage.exists());

    let month = YearMonth::new(2024, 2).unwrap();
    let schedule = WardSchedule::initialize("icu", month, &[Member::new(1, "a"), Member::new(2, "b")]);
    storage.save(&schedule).unwrap();

    let loaded = storage.load().unwrap();
    assert_eq!(loaded, schedule);
    assert_eq!(loaded.current().unwrap().rows[0].shifts, "X".repeat(29));
}
