//! Slot list behaviour and the date/no-data scenario.

use chrono::NaiveDate;
use client::ApiConfig;
use ntl_common::ProductType::{self, *};
use test_utils::{dates, regions};
use viewer::{
    deserialize_slots, serialize_slots, ComparisonSessionController, Direction, FileStore,
    KeyValueStore, MemoryStore, SessionConfig, SlotRequest,
};

fn session_with(slots: &[ProductType]) -> ComparisonSessionController {
    let store = MemoryStore::new();
    store.set("chart-config", &serialize_slots(slots)).unwrap();
    ComparisonSessionController::load(Box::new(store), SessionConfig::default())
}

fn parse_dates(raw: &[&str]) -> Vec<NaiveDate> {
    raw.iter().map(|d| d.parse().unwrap()).collect()
}

#[test]
fn test_reorder_first_prev_wraps_to_last() {
    let mut session = session_with(&[BaseMap, LuoJia, Overlay]);
    assert_eq!(session.reorder_slot(0, Direction::Prev), Some(2));
    assert_eq!(session.slots(), Some(&[Overlay, LuoJia, BaseMap][..]));
}

#[test]
fn test_reorder_last_next_wraps_to_first() {
    let mut session = session_with(&[BaseMap, LuoJia, Overlay]);
    session.reorder_slot(2, Direction::Next);
    assert_eq!(session.slots(), Some(&[Overlay, LuoJia, BaseMap][..]));
}

#[test]
fn test_paired_reorder_restores_order() {
    let original = [Vnp46a2GapFilled, Vnp46a1Dnb, LuoJia, Difference];
    for i in 0..original.len() - 1 {
        let mut session = session_with(&original);
        session.reorder_slot(i, Direction::Next);
        session.reorder_slot(i + 1, Direction::Prev);
        assert_eq!(session.slots(), Some(&original[..]), "index {}", i);
    }
}

#[test]
fn test_add_slot_when_full_is_noop() {
    let mut session = session_with(&ProductType::ALL);
    assert!(session.available_types().is_empty());
    assert_eq!(session.add_slot(None), None);
    assert_eq!(session.slots().map(<[_]>::len), Some(ProductType::ALL.len()));
}

#[test]
fn test_available_types_excludes_assigned() {
    let session = session_with(&[LuoJia, BaseMap]);
    let available = session.available_types();
    assert_eq!(available.len(), ProductType::ALL.len() - 2);
    assert!(!available.contains(&LuoJia));
    assert_eq!(available[0], Vnp46a2GapFilled);
}

#[test]
fn test_persisted_round_trip() {
    let sequences: [&[ProductType]; 3] = [&[], &[LuoJia], &[Difference, BaseMap, Vnp46a1RadianceM11]];
    for slots in sequences {
        let raw = serialize_slots(slots);
        assert_eq!(deserialize_slots(&raw, &[BaseMap]), slots.to_vec());
        assert_eq!(serialize_slots(&deserialize_slots(&raw, &[BaseMap])), raw);
    }
}

#[test]
fn test_corrupt_store_uses_default() {
    let store = MemoryStore::new();
    store.set("chart-config", "[\"lj\", 42").unwrap();
    let session = ComparisonSessionController::load(Box::new(store), SessionConfig::default());
    assert_eq!(session.slots(), Some(&[Vnp46a2GapFilled, LuoJia][..]));
}

#[test]
fn test_mutations_survive_reload_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("store.json");
    let config = SessionConfig {
        storage_path: Some(path.clone()),
        ..SessionConfig::default()
    };

    let mut session = ComparisonSessionController::open(config.clone());
    session.add_slot(Some(Vnp46a1RadianceM10));
    session.remove_slot(0);
    drop(session);

    let raw = FileStore::new(&path).get("chart-config").unwrap();
    assert_eq!(raw.as_deref(), Some(r#"["lj","vnp46a1_radiance_m10"]"#));

    let reloaded = ComparisonSessionController::open(config);
    assert_eq!(reloaded.slots(), Some(&[LuoJia, Vnp46a1RadianceM10][..]));
}

#[test]
fn test_date_without_region_data_shows_no_data() {
    let api = ApiConfig::default();
    let mut session = session_with(&[LuoJia, BaseMap]);
    session.set_global_dates(parse_dates(&dates::GLOBAL));
    session.set_region(Some(regions::SWITZERLAND.to_string()));
    session.set_region_dates(regions::SWITZERLAND, parse_dates(&dates::SWITZERLAND));

    session.set_date(Some("2023-01-10".parse().unwrap()));
    assert_eq!(session.slot_request(0, &api), SlotRequest::NoData);

    session.set_date(Some("2023-01-05".parse().unwrap()));
    assert_eq!(
        session.slot_request(0, &api),
        SlotRequest::Fetch {
            product: LuoJia,
            url: "http://localhost:8000/compare/2023-01-05/CHE/lj".to_string(),
        }
    );
    assert_eq!(session.slot_request(1, &api), SlotRequest::Unsupported(BaseMap));
    assert_eq!(session.slot_request(9, &api), SlotRequest::NoSelection);
}

#[test]
fn test_region_change_clears_date() {
    let mut session = session_with(&[LuoJia]);
    session.set_region(Some(regions::SWITZERLAND.to_string()));
    session.set_region_dates(regions::SWITZERLAND, parse_dates(&dates::SWITZERLAND));
    session.set_date(Some("2023-01-05".parse().unwrap()));

    session.set_region(Some(regions::LIECHTENSTEIN.to_string()));
    assert_eq!(session.date(), None);
    assert_eq!(session.availability().region_id(), None);
    assert_eq!(session.slot_request(0, &ApiConfig::default()), SlotRequest::NoSelection);

    // Late dates for the previous region are dropped.
    session.set_region_dates(regions::SWITZERLAND, parse_dates(&dates::SWITZERLAND));
    assert_eq!(session.availability().region_id(), None);
}
