// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use ducomm_app::{
    AgencyDetail, AgencyId, AgencyListItem, AgencyQuery, AgencyScope, AgencyUpdate, CreateOutcome,
    DeleteOutcome, DispatchCenterId, DispatchCenterInfo, NewAgency, SettingKey, Station, StationId,
    Unit, UnitId,
};
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info};

pub const APP_NAME: &str = "ducomm-forge";
pub const DB_PATH_ENV: &str = "DUCOMM_DB_PATH";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "dispatch_centers",
        &["id", "code", "name", "active", "created_at", "updated_at"],
    ),
    (
        "agencies",
        &[
            "id",
            "dispatch_center_id",
            "short",
            "name",
            "type",
            "owned",
            "active",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "stations",
        &[
            "id",
            "agency_id",
            "station_code",
            "esz",
            "active",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "units",
        &[
            "id",
            "station_id",
            "unit_code",
            "type",
            "jump",
            "active",
            "created_at",
            "updated_at",
        ],
    ),
    ("settings", &["key", "value", "updated_at"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_dispatch_centers_code",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_dispatch_centers_code ON dispatch_centers (code);",
    },
    RequiredIndex {
        name: "idx_agencies_center_short",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_agencies_center_short ON agencies (dispatch_center_id, short);",
    },
    RequiredIndex {
        name: "idx_agencies_short",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_agencies_short ON agencies (short COLLATE NOCASE);",
    },
    RequiredIndex {
        name: "idx_stations_agency_code",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_stations_agency_code ON stations (agency_id, station_code);",
    },
    RequiredIndex {
        name: "idx_units_station_code",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_units_station_code ON units (station_id, unit_code);",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDispatchCenter {
    pub code: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStation {
    pub agency_id: AgencyId,
    pub station_code: String,
    pub esz: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUnit {
    pub station_id: StationId,
    pub unit_code: String,
    pub kind: String,
    pub jump: bool,
    pub active: bool,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)
    }

    pub fn get_setting(&self, key: SettingKey) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("read setting {}", key.as_str()))
    }

    pub fn put_setting(&self, key: SettingKey, value: &str) -> Result<()> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO settings (key, value, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                  value = excluded.value,
                  updated_at = excluded.updated_at
                ",
                params![key.as_str(), value, now],
            )
            .with_context(|| format!("upsert setting {}", key.as_str()))?;
        Ok(())
    }

    /// Code named by the `CurrentDispatchCenterCode` setting, if non-blank.
    pub fn current_dispatch_center_code(&self) -> Result<Option<String>> {
        let code = self.get_setting(SettingKey::CurrentDispatchCenterCode)?;
        Ok(code
            .map(|code| code.trim().to_owned())
            .filter(|code| !code.is_empty()))
    }

    pub fn current_dispatch_center(&self) -> Result<Option<DispatchCenterInfo>> {
        match self.current_dispatch_center_code()? {
            Some(code) => self.find_dispatch_center(&code),
            None => Ok(None),
        }
    }

    pub fn set_current_dispatch_center(&self, code: &str) -> Result<()> {
        let code = code.trim();
        if self.find_dispatch_center(code)?.is_none() {
            bail!(
                "dispatch center `{code}` not found -- create it first or choose an existing code"
            );
        }
        self.put_setting(SettingKey::CurrentDispatchCenterCode, code)?;
        info!(code, "current dispatch center set");
        Ok(())
    }

    pub fn create_dispatch_center(&self, center: &NewDispatchCenter) -> Result<DispatchCenterId> {
        let code = center.code.trim();
        let name = center.name.trim();
        if code.is_empty() {
            bail!("dispatch center code is required -- enter a code and retry");
        }
        if name.is_empty() {
            bail!("dispatch center name is required -- enter a name and retry");
        }
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO dispatch_centers (code, name, active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                ",
                params![code, name, center.active, now, now],
            )
            .with_context(|| format!("insert dispatch center {code}"))?;
        Ok(DispatchCenterId::new(self.conn.last_insert_rowid()))
    }

    pub fn list_dispatch_centers(&self) -> Result<Vec<DispatchCenterInfo>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, code, name, active FROM dispatch_centers ORDER BY code ASC")
            .context("prepare dispatch centers query")?;
        let rows = stmt
            .query_map([], dispatch_center_from_row)
            .context("query dispatch centers")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect dispatch centers")
    }

    pub fn find_dispatch_center(&self, code: &str) -> Result<Option<DispatchCenterInfo>> {
        self.conn
            .query_row(
                "SELECT id, code, name, active FROM dispatch_centers WHERE code = ?",
                params![code],
                dispatch_center_from_row,
            )
            .optional()
            .with_context(|| format!("look up dispatch center {code}"))
    }

    fn dispatch_center_exists(&self, id: DispatchCenterId) -> Result<bool> {
        let exists = self
            .conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM dispatch_centers WHERE id = ?)",
                params![id.get()],
                |row| row.get::<_, i64>(0),
            )
            .with_context(|| format!("check dispatch center {id}"))?;
        Ok(exists == 1)
    }

    /// Agencies matching `query`, ordered by short. The current scope filters
    /// on the configured dispatch center and is unfiltered when none is set.
    pub fn list_agencies(&self, query: &AgencyQuery) -> Result<Vec<AgencyListItem>> {
        let center_code = match query.scope {
            AgencyScope::CurrentDispatchCenter => self.current_dispatch_center_code()?,
            AgencyScope::AllDispatchCenters => None,
        };

        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT
                  a.id, a.dispatch_center_id, a.short, a.name, a.type,
                  a.owned, a.active, d.code
                FROM agencies a
                JOIN dispatch_centers d ON d.id = a.dispatch_center_id
                WHERE (?1 IS NULL OR d.code = ?1)
                  AND (?2 = 0 OR a.active = 1)
                ORDER BY a.short COLLATE NOCASE ASC, a.id ASC
                ",
            )
            .context("prepare agencies query")?;
        let rows = stmt
            .query_map(params![center_code, query.active_only], |row| {
                Ok(AgencyListItem {
                    id: AgencyId::new(row.get(0)?),
                    dispatch_center_id: DispatchCenterId::new(row.get(1)?),
                    short: row.get(2)?,
                    name: row.get(3)?,
                    kind: row.get(4)?,
                    owned: row.get(5)?,
                    active: row.get(6)?,
                    dispatch_center_code: row.get(7)?,
                })
            })
            .context("query agencies")?;

        let items = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect agencies")?;
        let items: Vec<_> = items
            .into_iter()
            .filter(|item| query.matches(&item.short, &item.name, item.active))
            .collect();
        debug!(count = items.len(), ?query, "listed agencies");
        Ok(items)
    }

    pub fn get_agency(&self, agency_id: AgencyId) -> Result<Option<AgencyDetail>> {
        self.conn
            .query_row(
                "
                SELECT
                  a.id, a.dispatch_center_id, a.short, a.name, a.type,
                  a.owned, a.active, d.code, d.name
                FROM agencies a
                JOIN dispatch_centers d ON d.id = a.dispatch_center_id
                WHERE a.id = ?
                ",
                params![agency_id.get()],
                |row| {
                    Ok(AgencyDetail {
                        id: AgencyId::new(row.get(0)?),
                        dispatch_center_id: DispatchCenterId::new(row.get(1)?),
                        short: row.get(2)?,
                        name: row.get(3)?,
                        kind: row.get(4)?,
                        owned: row.get(5)?,
                        active: row.get(6)?,
                        dispatch_center_code: row.get(7)?,
                        dispatch_center_name: row.get(8)?,
                    })
                },
            )
            .optional()
            .with_context(|| format!("load agency {agency_id}"))
    }

    /// Returns false when no agency has `agency_id`.
    pub fn update_agency(&self, agency_id: AgencyId, update: &AgencyUpdate) -> Result<bool> {
        let update = update.normalized();
        update.validate()?;
        let now = now_rfc3339()?;
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE agencies
                SET
                  name = ?,
                  type = ?,
                  owned = ?,
                  active = ?,
                  updated_at = ?
                WHERE id = ?
                ",
                params![
                    update.name,
                    update.kind,
                    update.owned,
                    update.active,
                    now,
                    agency_id.get(),
                ],
            )
            .with_context(|| format!("update agency {agency_id}"))?;
        if rows_affected > 0 {
            info!(agency = %agency_id, "agency updated");
        }
        Ok(rows_affected > 0)
    }

    /// Validation failures and duplicate shorts come back as
    /// [`CreateOutcome::Rejected`] with a message for the form.
    pub fn create_agency(&self, agency: &NewAgency) -> Result<CreateOutcome> {
        if let Err(error) = agency.validate() {
            return Ok(CreateOutcome::Rejected(error.to_string()));
        }
        let agency = agency.normalized();
        if !self.dispatch_center_exists(agency.dispatch_center_id)? {
            return Ok(CreateOutcome::Rejected(
                "Dispatch center not found.".to_owned(),
            ));
        }
        if self.agency_exists_with_short(agency.dispatch_center_id, &agency.short)? {
            return Ok(CreateOutcome::Rejected(format!(
                "An agency with short '{}' already exists in this dispatch center.",
                agency.short
            )));
        }

        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO agencies (
                  dispatch_center_id, short, name, type, owned, active,
                  created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    agency.dispatch_center_id.get(),
                    agency.short,
                    agency.name,
                    agency.kind,
                    agency.owned,
                    agency.active,
                    now,
                    now,
                ],
            )
            .with_context(|| format!("insert agency {}", agency.short))?;
        let id = AgencyId::new(self.conn.last_insert_rowid());
        info!(agency = %id, short = %agency.short, "agency created");
        Ok(CreateOutcome::Created(id))
    }

    pub fn agency_exists_with_short(
        &self,
        dispatch_center_id: DispatchCenterId,
        short: &str,
    ) -> Result<bool> {
        let short = ducomm_app::normalize_short(short);
        let exists = self
            .conn
            .query_row(
                "
                SELECT EXISTS(
                  SELECT 1 FROM agencies
                  WHERE dispatch_center_id = ? AND UPPER(short) = ?
                )
                ",
                params![dispatch_center_id.get(), short],
                |row| row.get::<_, i64>(0),
            )
            .with_context(|| format!("check agency short {short}"))?;
        Ok(exists == 1)
    }

    pub fn delete_agency(&self, agency_id: AgencyId) -> Result<DeleteOutcome> {
        let stations: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM stations WHERE agency_id = ?",
                params![agency_id.get()],
                |row| row.get(0),
            )
            .with_context(|| format!("count stations for agency {agency_id}"))?;
        if stations > 0 {
            let stations = usize::try_from(stations)
                .map_err(|_| anyhow!("station count {stations} out of range"))?;
            return Ok(DeleteOutcome::Referenced { stations });
        }

        let rows_affected = self
            .conn
            .execute("DELETE FROM agencies WHERE id = ?", params![agency_id.get()])
            .with_context(|| format!("delete agency {agency_id}"))?;
        if rows_affected == 0 {
            return Ok(DeleteOutcome::NotFound);
        }
        info!(agency = %agency_id, "agency deleted");
        Ok(DeleteOutcome::Deleted)
    }

    pub fn create_station(&self, station: &NewStation) -> Result<StationId> {
        let code = station.station_code.trim();
        if code.is_empty() {
            bail!("station code is required -- enter a code and retry");
        }
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO stations (agency_id, station_code, esz, active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
                params![
                    station.agency_id.get(),
                    code,
                    station.esz.as_deref().map(str::trim),
                    station.active,
                    now,
                    now,
                ],
            )
            .with_context(|| format!("insert station {code}"))?;
        Ok(StationId::new(self.conn.last_insert_rowid()))
    }

    pub fn list_stations(&self, agency_id: AgencyId) -> Result<Vec<Station>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, agency_id, station_code, esz, active
                FROM stations
                WHERE agency_id = ?
                ORDER BY station_code ASC
                ",
            )
            .context("prepare stations query")?;
        let rows = stmt
            .query_map(params![agency_id.get()], |row| {
                Ok(Station {
                    id: StationId::new(row.get(0)?),
                    agency_id: AgencyId::new(row.get(1)?),
                    station_code: row.get(2)?,
                    esz: row.get(3)?,
                    active: row.get(4)?,
                })
            })
            .context("query stations")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect stations")
    }

    /// Fails while units still reference the station.
    pub fn delete_station(&self, station_id: StationId) -> Result<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM stations WHERE id = ?", params![station_id.get()])
            .with_context(|| {
                format!("delete station {station_id} -- remove its units first and retry")
            })?;
        Ok(rows_affected > 0)
    }

    pub fn create_unit(&self, unit: &NewUnit) -> Result<UnitId> {
        let code = unit.unit_code.trim();
        if code.is_empty() {
            bail!("unit code is required -- enter a code and retry");
        }
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO units (station_id, unit_code, type, jump, active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    unit.station_id.get(),
                    code,
                    unit.kind.trim(),
                    unit.jump,
                    unit.active,
                    now,
                    now,
                ],
            )
            .with_context(|| format!("insert unit {code}"))?;
        Ok(UnitId::new(self.conn.last_insert_rowid()))
    }

    pub fn list_units(&self, station_id: StationId) -> Result<Vec<Unit>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, station_id, unit_code, type, jump, active
                FROM units
                WHERE station_id = ?
                ORDER BY unit_code ASC
                ",
            )
            .context("prepare units query")?;
        let rows = stmt
            .query_map(params![station_id.get()], |row| {
                Ok(Unit {
                    id: UnitId::new(row.get(0)?),
                    station_id: StationId::new(row.get(1)?),
                    unit_code: row.get(2)?,
                    kind: row.get(3)?,
                    jump: row.get(4)?,
                    active: row.get(5)?,
                })
            })
            .context("query units")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect units")
    }

    /// Inserts a small two-center hierarchy and makes the first center
    /// current. Refuses to run against a database that already has centers.
    pub fn seed_demo_data(&self) -> Result<()> {
        if !self.list_dispatch_centers()?.is_empty() {
            bail!("database already has dispatch centers -- seed demo data into an empty database");
        }

        let riverside = self.create_dispatch_center(&NewDispatchCenter {
            code: "RRB".to_owned(),
            name: "Riverside Regional".to_owned(),
            active: true,
        })?;
        let coastal = self.create_dispatch_center(&NewDispatchCenter {
            code: "CST".to_owned(),
            name: "Coastal Dispatch".to_owned(),
            active: true,
        })?;

        let agencies = [
            (riverside, "BAF", "Banning Fire", "fire", true, true),
            (riverside, "CSF", "Corona Station Fire", "fire", true, true),
            (riverside, "MVM", "Moreno Valley Medical", "ems", false, true),
            (riverside, "OLD", "Old Town Volunteer", "fire", false, false),
            (coastal, "HBF", "Huntington Beach Fire", "fire", true, true),
            (coastal, "LGL", "Laguna Lifeguards", "rescue", false, true),
        ];
        for (center, short, name, kind, owned, active) in agencies {
            let outcome = self.create_agency(&NewAgency {
                dispatch_center_id: center,
                short: short.to_owned(),
                name: name.to_owned(),
                kind: kind.to_owned(),
                owned,
                active,
            })?;
            let CreateOutcome::Created(agency_id) = outcome else {
                bail!("seed agency {short} rejected: {outcome:?}");
            };
            if short == "BAF" || short == "HBF" {
                let station_id = self.create_station(&NewStation {
                    agency_id,
                    station_code: format!("{short}1"),
                    esz: Some(format!("{short}-ESZ-01")),
                    active: true,
                })?;
                self.create_unit(&NewUnit {
                    station_id,
                    unit_code: format!("E{short}1"),
                    kind: "engine".to_owned(),
                    jump: false,
                    active: true,
                })?;
            }
        }

        self.set_current_dispatch_center("RRB")
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os(DB_PATH_ENV) {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set {DB_PATH_ENV} to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join(format!("{APP_NAME}.db")))
}

/// Accepts plain filesystem paths and `:memory:`. SQLite URI forms are
/// refused so a config value can never smuggle in open flags.
pub fn validate_db_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        bail!("database path is blank -- set [storage].db_path or {DB_PATH_ENV} to a file path");
    }
    if path == ":memory:" {
        return Ok(());
    }

    let uri_scheme = path
        .split_once("://")
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.is_empty() && scheme.chars().all(char::is_alphabetic));
    if let Some(scheme) = uri_scheme {
        bail!("database path {path:?} is a {scheme}:// URI -- use a local file path");
    }
    if path.starts_with("file:") || path.contains('?') {
        bail!("database path {path:?} uses SQLite URI syntax -- drop the file: prefix and query string");
    }

    Ok(())
}

fn dispatch_center_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DispatchCenterInfo> {
    Ok(DispatchCenterInfo {
        id: DispatchCenterId::new(row.get(0)?),
        code: row.get(1)?,
        name: row.get(2)?,
        active: row.get(3)?,
    })
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    Ok(!schema_object_names(conn, "table")?.is_empty())
}

fn validate_schema(conn: &Connection) -> Result<()> {
    let tables = schema_object_names(conn, "table")?;
    for &(table, required_columns) in REQUIRED_SCHEMA {
        if !tables.contains(table) {
            bail!("table `{table}` not found -- point {DB_PATH_ENV} at a {APP_NAME} database");
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .filter(|&&column| !columns.contains(column))
            .copied()
            .collect();
        if !missing.is_empty() {
            bail!(
                "table `{table}` lacks columns {} -- upgrade the database and retry",
                missing.join(", ")
            );
        }
    }
    Ok(())
}

/// Recreates dropped indexes. Fails only when SQLite still does not list
/// one after the create statements ran.
fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("create index `{}`", index.name))?;
    }

    let present = schema_object_names(conn, "index")?;
    let absent: Vec<&str> = REQUIRED_INDEXES
        .iter()
        .map(|index| index.name)
        .filter(|name| !present.contains(*name))
        .collect();
    if !absent.is_empty() {
        bail!(
            "indexes {} could not be created -- upgrade the database and retry",
            absent.join(", ")
        );
    }
    Ok(())
}

/// Names of user objects of one `sqlite_master` type (`table`, `index`).
fn schema_object_names(conn: &Connection, kind: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = ? AND name NOT LIKE 'sqlite_%'")
        .with_context(|| format!("prepare {kind} listing"))?;
    let names = stmt
        .query_map(params![kind], |row| row.get::<_, String>(0))
        .with_context(|| format!("list {kind} names"))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("read {kind} names"))?;
    Ok(names)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("describe table {table}"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))
        .with_context(|| format!("describe table {table}"))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("read columns of {table}"))?;
    Ok(columns)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}
