// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use ducomm_app::{
    AgencyId, AgencyQuery, AgencyScope, AgencyUpdate, CreateOutcome, DeleteOutcome,
    DispatchCenterId, NewAgency, SettingKey,
};
use ducomm_db::{NewDispatchCenter, NewStation, NewUnit, Store, validate_db_path};
use ducomm_testkit::temp_db_path;

fn bootstrapped() -> Result<Store> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    Ok(store)
}

fn center(store: &Store, code: &str) -> Result<DispatchCenterId> {
    store.create_dispatch_center(&NewDispatchCenter {
        code: code.to_owned(),
        name: format!("{code} Dispatch"),
        active: true,
    })
}

fn agency(center: DispatchCenterId, short: &str, name: &str, active: bool) -> NewAgency {
    NewAgency {
        dispatch_center_id: center,
        short: short.to_owned(),
        name: name.to_owned(),
        kind: "fire".to_owned(),
        owned: true,
        active,
    }
}

fn created(outcome: CreateOutcome) -> AgencyId {
    match outcome {
        CreateOutcome::Created(id) => id,
        CreateOutcome::Rejected(message) => panic!("create rejected: {message}"),
    }
}

fn shorts(store: &Store, query: &AgencyQuery) -> Result<Vec<String>> {
    Ok(store
        .list_agencies(query)?
        .into_iter()
        .map(|item| item.short)
        .collect())
}

#[test]
fn validate_db_path_rejects_uri_forms() {
    assert!(validate_db_path("file:test.db").is_err());
    assert!(validate_db_path("https://example.com/db.sqlite").is_err());
    assert!(validate_db_path("db.sqlite?mode=ro").is_err());
    assert!(validate_db_path("").is_err());
    assert!(validate_db_path("/tmp/ducomm-forge.db").is_ok());
    assert!(validate_db_path(":memory:").is_ok());
}

#[test]
fn bootstrap_is_idempotent_on_disk() -> Result<()> {
    let (_dir, path) = temp_db_path()?;
    {
        let store = Store::open(&path)?;
        store.bootstrap()?;
        center(&store, "RRB")?;
    }

    let store = Store::open(&path)?;
    store.bootstrap()?;
    assert_eq!(store.list_dispatch_centers()?.len(), 1);
    Ok(())
}

#[test]
fn bootstrap_rejects_schema_missing_required_column() -> Result<()> {
    let store = bootstrapped()?;
    store.raw_connection().execute_batch(
        "
        PRAGMA foreign_keys = OFF;
        DROP TABLE units;
        CREATE TABLE units (
          id INTEGER PRIMARY KEY,
          station_id INTEGER NOT NULL,
          unit_code TEXT NOT NULL
        );
        ",
    )?;

    let error = store.bootstrap().expect_err("missing columns should fail");
    let message = error.to_string();
    assert!(message.contains("units"), "{message}");
    assert!(message.contains("jump"), "{message}");
    Ok(())
}

#[test]
fn bootstrap_restores_dropped_indexes() -> Result<()> {
    let store = bootstrapped()?;
    store
        .raw_connection()
        .execute_batch("DROP INDEX idx_agencies_short;")?;
    store.bootstrap()?;

    let count: i64 = store.raw_connection().query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_agencies_short'",
        [],
        |row| row.get(0),
    )?;
    assert_eq!(count, 1);
    Ok(())
}

#[test]
fn settings_upsert() -> Result<()> {
    let store = bootstrapped()?;
    assert_eq!(store.get_setting(SettingKey::CurrentDispatchCenterCode)?, None);

    store.put_setting(SettingKey::CurrentDispatchCenterCode, "RRB")?;
    store.put_setting(SettingKey::CurrentDispatchCenterCode, "CST")?;
    assert_eq!(
        store.get_setting(SettingKey::CurrentDispatchCenterCode)?,
        Some("CST".to_owned())
    );
    Ok(())
}

#[test]
fn current_dispatch_center_requires_a_known_code() -> Result<()> {
    let store = bootstrapped()?;
    let riverside = center(&store, "RRB")?;

    assert!(store.current_dispatch_center()?.is_none());
    assert!(store.set_current_dispatch_center("NOPE").is_err());

    store.set_current_dispatch_center(" RRB ")?;
    let current = store.current_dispatch_center()?.expect("current center");
    assert_eq!(current.id, riverside);
    assert_eq!(current.code, "RRB");
    Ok(())
}

#[test]
fn list_agencies_orders_by_short_and_filters_active() -> Result<()> {
    let store = bootstrapped()?;
    let riverside = center(&store, "RRB")?;
    for (short, active) in [("ZZZ", true), ("aaa", true), ("MMM", false)] {
        created(store.create_agency(&agency(riverside, short, "Some Fire", active))?);
    }

    let all = AgencyQuery::new(AgencyScope::AllDispatchCenters, None, false);
    assert_eq!(shorts(&store, &all)?, ["AAA", "MMM", "ZZZ"]);

    let active = AgencyQuery::new(AgencyScope::AllDispatchCenters, None, true);
    assert_eq!(shorts(&store, &active)?, ["AAA", "ZZZ"]);
    Ok(())
}

#[test]
fn current_scope_follows_the_setting() -> Result<()> {
    let store = bootstrapped()?;
    let riverside = center(&store, "RRB")?;
    let coastal = center(&store, "CST")?;
    created(store.create_agency(&agency(riverside, "BAF", "Banning Fire", true))?);
    created(store.create_agency(&agency(coastal, "HBF", "Huntington Fire", true))?);

    let current = AgencyQuery::new(AgencyScope::CurrentDispatchCenter, None, true);
    assert_eq!(shorts(&store, &current)?, ["BAF", "HBF"], "unset means unfiltered");

    store.set_current_dispatch_center("CST")?;
    assert_eq!(shorts(&store, &current)?, ["HBF"]);

    let all = AgencyQuery::new(AgencyScope::AllDispatchCenters, None, true);
    assert_eq!(shorts(&store, &all)?, ["BAF", "HBF"]);
    Ok(())
}

#[test]
fn search_matches_short_or_name_case_insensitively() -> Result<()> {
    let store = bootstrapped()?;
    let riverside = center(&store, "RRB")?;
    created(store.create_agency(&agency(riverside, "BAF", "Banning Fire", true))?);
    created(store.create_agency(&agency(riverside, "CSF", "Corona Station", true))?);

    let by_name = AgencyQuery::new(AgencyScope::AllDispatchCenters, Some("  banN "), true);
    assert_eq!(shorts(&store, &by_name)?, ["BAF"]);

    let by_short = AgencyQuery::new(AgencyScope::AllDispatchCenters, Some("cs"), true);
    assert_eq!(shorts(&store, &by_short)?, ["CSF"]);
    Ok(())
}

#[test]
fn get_agency_includes_dispatch_center_name() -> Result<()> {
    let store = bootstrapped()?;
    let riverside = center(&store, "RRB")?;
    let id = created(store.create_agency(&agency(riverside, "baf", " Banning Fire ", true))?);

    let detail = store.get_agency(id)?.expect("agency exists");
    assert_eq!(detail.short, "BAF");
    assert_eq!(detail.name, "Banning Fire");
    assert_eq!(detail.dispatch_center_code, "RRB");
    assert_eq!(detail.dispatch_center_name, "RRB Dispatch");

    assert!(store.get_agency(AgencyId::new(999))?.is_none());
    Ok(())
}

#[test]
fn update_agency_trims_and_reports_missing_rows() -> Result<()> {
    let store = bootstrapped()?;
    let riverside = center(&store, "RRB")?;
    let id = created(store.create_agency(&agency(riverside, "BAF", "Banning Fire", true))?);
    let update = AgencyUpdate {
        name: "  Banning City Fire ".to_owned(),
        kind: " ems ".to_owned(),
        owned: false,
        active: false,
    };

    assert!(store.update_agency(id, &update)?);
    let detail = store.get_agency(id)?.expect("agency exists");
    assert_eq!(detail.name, "Banning City Fire");
    assert_eq!(detail.kind, "ems");
    assert!(!detail.owned);
    assert!(!detail.active);

    assert!(!store.update_agency(AgencyId::new(999), &update)?);
    Ok(())
}

#[test]
fn update_agency_rejects_blank_name() -> Result<()> {
    let store = bootstrapped()?;
    let riverside = center(&store, "RRB")?;
    let id = created(store.create_agency(&agency(riverside, "BAF", "Banning Fire", true))?);
    let update = AgencyUpdate {
        name: "   ".to_owned(),
        kind: "fire".to_owned(),
        owned: true,
        active: true,
    };

    assert!(store.update_agency(id, &update).is_err());
    assert_eq!(store.get_agency(id)?.expect("agency exists").name, "Banning Fire");
    Ok(())
}

#[test]
fn create_agency_validates_fields() -> Result<()> {
    let store = bootstrapped()?;
    let riverside = center(&store, "RRB")?;

    let cases = [
        (agency(riverside, "  ", "Name", true), "Short is required."),
        (
            agency(riverside, "ABCDEFGHIJK", "Name", true),
            "Short must be 10 characters or fewer.",
        ),
        (agency(riverside, "BAF", " ", true), "Name is required."),
        (
            NewAgency {
                kind: String::new(),
                ..agency(riverside, "BAF", "Banning Fire", true)
            },
            "Type is required.",
        ),
    ];
    for (input, expected) in cases {
        assert_eq!(
            store.create_agency(&input)?,
            CreateOutcome::Rejected(expected.to_owned())
        );
    }
    assert!(
        store
            .list_agencies(&AgencyQuery::new(AgencyScope::AllDispatchCenters, None, false))?
            .is_empty()
    );
    Ok(())
}

#[test]
fn create_agency_rejects_duplicate_short_per_center() -> Result<()> {
    let store = bootstrapped()?;
    let riverside = center(&store, "RRB")?;
    let coastal = center(&store, "CST")?;
    created(store.create_agency(&agency(riverside, "BAF", "Banning Fire", true))?);

    let duplicate = store.create_agency(&agency(riverside, " baf", "Another", true))?;
    assert!(matches!(duplicate, CreateOutcome::Rejected(message) if message.contains("BAF")));
    assert!(store.agency_exists_with_short(riverside, "Baf")?);
    assert!(!store.agency_exists_with_short(coastal, "BAF")?);

    created(store.create_agency(&agency(coastal, "BAF", "Coastal Banning", true))?);
    Ok(())
}

#[test]
fn create_agency_rejects_unknown_center() -> Result<()> {
    let store = bootstrapped()?;
    let outcome = store.create_agency(&agency(DispatchCenterId::new(42), "BAF", "Banning", true))?;
    assert_eq!(
        outcome,
        CreateOutcome::Rejected("Dispatch center not found.".to_owned())
    );
    Ok(())
}

#[test]
fn delete_agency_respects_station_references() -> Result<()> {
    let store = bootstrapped()?;
    let riverside = center(&store, "RRB")?;
    let id = created(store.create_agency(&agency(riverside, "BAF", "Banning Fire", true))?);
    let station = store.create_station(&NewStation {
        agency_id: id,
        station_code: "BAF1".to_owned(),
        esz: Some("ESZ-01".to_owned()),
        active: true,
    })?;

    assert_eq!(
        store.delete_agency(id)?,
        DeleteOutcome::Referenced { stations: 1 }
    );
    assert!(store.get_agency(id)?.is_some());

    assert!(store.delete_station(station)?);
    assert_eq!(store.delete_agency(id)?, DeleteOutcome::Deleted);
    assert_eq!(store.delete_agency(id)?, DeleteOutcome::NotFound);
    Ok(())
}

#[test]
fn station_with_units_cannot_be_deleted() -> Result<()> {
    let store = bootstrapped()?;
    let riverside = center(&store, "RRB")?;
    let id = created(store.create_agency(&agency(riverside, "BAF", "Banning Fire", true))?);
    let station = store.create_station(&NewStation {
        agency_id: id,
        station_code: "BAF1".to_owned(),
        esz: None,
        active: true,
    })?;
    let unit = store.create_unit(&NewUnit {
        station_id: station,
        unit_code: "E1".to_owned(),
        kind: "engine".to_owned(),
        jump: true,
        active: true,
    })?;

    assert!(store.delete_station(station).is_err());
    let units = store.list_units(station)?;
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].id, unit);
    assert!(units[0].jump);
    assert_eq!(store.list_stations(id)?[0].esz, None);
    Ok(())
}

#[test]
fn seed_demo_data_builds_a_browsable_hierarchy() -> Result<()> {
    let store = bootstrapped()?;
    store.seed_demo_data()?;

    let current = store.current_dispatch_center()?.expect("seeded current center");
    assert_eq!(current.code, "RRB");

    let current_active = AgencyQuery::new(AgencyScope::CurrentDispatchCenter, None, true);
    assert_eq!(shorts(&store, &current_active)?, ["BAF", "CSF", "MVM"]);

    let everything = AgencyQuery::new(AgencyScope::AllDispatchCenters, None, false);
    assert_eq!(store.list_agencies(&everything)?.len(), 6);

    assert!(store.seed_demo_data().is_err(), "seeding twice should fail");
    Ok(())
}
