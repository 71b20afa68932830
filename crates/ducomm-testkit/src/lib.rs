// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use ducomm_app::{AgencyId, AgencyListItem, DispatchCenterId, NewAgency};
use std::collections::BTreeSet;
use std::path::PathBuf;

mod fake;

pub use fake::{CallKind, FakeBackend, FakeCall};

const PLACE_NAMES: [&str; 16] = [
    "Banning",
    "Beaumont",
    "Calimesa",
    "Canyon Lake",
    "Coachella",
    "Corona",
    "Hemet",
    "Indio",
    "Jurupa",
    "Menifee",
    "Murrieta",
    "Norco",
    "Perris",
    "Temecula",
    "Wildomar",
    "Yucaipa",
];

const AGENCY_KINDS: [(&str, &str, char); 5] = [
    ("fire", "Fire Department", 'F'),
    ("ems", "Ambulance Service", 'M'),
    ("rescue", "Search and Rescue", 'R'),
    ("police", "Police Department", 'P'),
    ("hazmat", "Hazmat Team", 'H'),
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, percent: usize) -> bool {
        self.int_n(100) < percent
    }
}

/// Generates plausible agencies from a seed. Shorts are unique per faker.
#[derive(Debug, Clone)]
pub struct AgencyFaker {
    rng: DeterministicRng,
    used_shorts: BTreeSet<String>,
}

impl AgencyFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            used_shorts: BTreeSet::new(),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn new_agency(&mut self, dispatch_center_id: DispatchCenterId) -> NewAgency {
        let place = PLACE_NAMES[self.rng.int_n(PLACE_NAMES.len())];
        let (kind, suffix, marker) = AGENCY_KINDS[self.rng.int_n(AGENCY_KINDS.len())];
        NewAgency {
            dispatch_center_id,
            short: self.unique_short(place, marker),
            name: format!("{place} {suffix}"),
            kind: kind.to_owned(),
            owned: self.rng.chance(50),
            active: self.rng.chance(85),
        }
    }

    /// Adds `count` generated agencies to `backend` and returns their ids.
    pub fn populate(
        &mut self,
        backend: &FakeBackend,
        dispatch_center_id: DispatchCenterId,
        count: usize,
    ) -> Vec<AgencyId> {
        (0..count)
            .map(|_| {
                let agency = self.new_agency(dispatch_center_id);
                backend.add_agency(dispatch_center_id, &agency.short, &agency.name, agency.active)
            })
            .collect()
    }

    fn unique_short(&mut self, place: &str, marker: char) -> String {
        let stem: String = place
            .chars()
            .filter(char::is_ascii_alphabetic)
            .take(2)
            .collect::<String>()
            .to_uppercase();
        let mut short = format!("{stem}{marker}");
        while self.used_shorts.contains(&short) {
            short = format!("{stem}{marker}{}", self.rng.int_n(100));
        }
        self.used_shorts.insert(short.clone());
        short
    }
}

/// List row fixture in dispatch center 1 (`RRB`).
pub fn list_item(id: i64, short: &str, active: bool) -> AgencyListItem {
    AgencyListItem {
        id: AgencyId::new(id),
        dispatch_center_id: DispatchCenterId::new(1),
        short: short.to_owned(),
        name: format!("{short} Agency"),
        kind: "fire".to_owned(),
        owned: true,
        active,
        dispatch_center_code: "RRB".to_owned(),
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("ducomm-forge.db");
    Ok((dir, db_path))
}
