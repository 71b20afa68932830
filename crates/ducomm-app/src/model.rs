// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AgencyScope {
    #[default]
    CurrentDispatchCenter,
    AllDispatchCenters,
}

impl AgencyScope {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CurrentDispatchCenter => "current",
            Self::AllDispatchCenters => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "current" => Some(Self::CurrentDispatchCenter),
            "all" => Some(Self::AllDispatchCenters),
            _ => None,
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::CurrentDispatchCenter => Self::AllDispatchCenters,
            Self::AllDispatchCenters => Self::CurrentDispatchCenter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    SuperAdmin,
    Admin,
    Editor,
    Viewer,
}

impl UserRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "super_admin" => Some(Self::SuperAdmin),
            "admin" => Some(Self::Admin),
            "editor" => Some(Self::Editor),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    CurrentDispatchCenterCode,
}

impl SettingKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CurrentDispatchCenterCode => "CurrentDispatchCenterCode",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchCenterInfo {
    pub id: DispatchCenterId,
    pub code: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyListItem {
    pub id: AgencyId,
    pub dispatch_center_id: DispatchCenterId,
    pub short: String,
    pub name: String,
    pub kind: String,
    pub owned: bool,
    pub active: bool,
    pub dispatch_center_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyDetail {
    pub id: AgencyId,
    pub dispatch_center_id: DispatchCenterId,
    pub short: String,
    pub name: String,
    pub kind: String,
    pub owned: bool,
    pub active: bool,
    pub dispatch_center_code: String,
    pub dispatch_center_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub agency_id: AgencyId,
    pub station_code: String,
    pub esz: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub station_id: StationId,
    pub unit_code: String,
    pub kind: String,
    pub jump: bool,
    pub active: bool,
}

/// Filter key for the agencies list. Two queries compare equal exactly when
/// they would return the same rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgencyQuery {
    pub scope: AgencyScope,
    pub search: Option<String>,
    pub active_only: bool,
}

impl AgencyQuery {
    pub fn new(scope: AgencyScope, search: Option<&str>, active_only: bool) -> Self {
        Self {
            scope,
            search: normalize_search(search),
            active_only,
        }
    }

    pub fn admits_active(&self, active: bool) -> bool {
        active || !self.active_only
    }

    /// Row predicate shared by the store and the in-memory list patches.
    pub fn matches(&self, short: &str, name: &str, active: bool) -> bool {
        if !self.admits_active(active) {
            return false;
        }
        let Some(search) = self.search.as_deref() else {
            return true;
        };
        let needle = search.to_lowercase();
        short.to_lowercase().contains(&needle) || name.to_lowercase().contains(&needle)
    }
}

pub fn normalize_search(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgencyUpdate {
    pub name: String,
    pub kind: String,
    pub owned: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAgency {
    pub dispatch_center_id: DispatchCenterId,
    pub short: String,
    pub name: String,
    pub kind: String,
    pub owned: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(AgencyId),
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    Referenced { stations: usize },
}
