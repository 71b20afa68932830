// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Result, anyhow};
use ducomm_app::{
    AgencyDetail, AgencyId, AgencyListItem, AgencyQuery, AgencyScope, AgencyUpdate, CreateOutcome,
    DeleteOutcome, DispatchCenterId, DispatchCenterInfo, NewAgency, ViewError,
};
use ducomm_shell::{
    AgencyCommandService, AgencyDetailQueryService, AgencyQueryService, CurrentScopeService,
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    ListAgencies,
    GetAgency,
    UpdateAgency,
    CreateAgency,
    DeleteAgency,
    CurrentDispatchCenter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    ListAgencies(AgencyQuery),
    GetAgency(AgencyId),
    UpdateAgency(AgencyId, AgencyUpdate),
    CreateAgency(NewAgency),
    DeleteAgency(AgencyId),
    CurrentDispatchCenter,
}

impl FakeCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::ListAgencies(_) => CallKind::ListAgencies,
            Self::GetAgency(_) => CallKind::GetAgency,
            Self::UpdateAgency(..) => CallKind::UpdateAgency,
            Self::CreateAgency(_) => CallKind::CreateAgency,
            Self::DeleteAgency(_) => CallKind::DeleteAgency,
            Self::CurrentDispatchCenter => CallKind::CurrentDispatchCenter,
        }
    }
}

#[derive(Debug, Default)]
struct FakeState {
    centers: Vec<DispatchCenterInfo>,
    current_code: Option<String>,
    agencies: Vec<AgencyDetail>,
    stations: BTreeMap<AgencyId, usize>,
    next_center_id: i64,
    next_agency_id: i64,
    delays: HashMap<CallKind, VecDeque<Duration>>,
    failures: HashMap<CallKind, VecDeque<String>>,
    calls: Vec<FakeCall>,
}

/// Planned behavior for one call, taken when the call is made.
struct Script {
    delay: Option<Duration>,
    failure: Option<String>,
}

/// In-memory backend with the same filtering and validation rules as the
/// SQLite store. Delays and failures are scripted per call kind and every
/// call is logged in the order it was made.
///
/// Results are computed after the scripted delay, so a slow call observes
/// writes made while it was waiting.
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_center(&self, code: &str, name: &str) -> DispatchCenterId {
        let mut state = self.lock();
        state.next_center_id += 1;
        let id = DispatchCenterId::new(state.next_center_id);
        state.centers.push(DispatchCenterInfo {
            id,
            code: code.to_owned(),
            name: name.to_owned(),
            active: true,
        });
        id
    }

    pub fn set_current(&self, code: Option<&str>) {
        self.lock().current_code = code.map(str::to_owned);
    }

    /// Inserts an agency without validation, for arranging fixtures.
    pub fn add_agency(
        &self,
        center: DispatchCenterId,
        short: &str,
        name: &str,
        active: bool,
    ) -> AgencyId {
        let mut state = self.lock();
        let id = state.allocate_agency();
        let (code, center_name) = state
            .center(center)
            .map(|info| (info.code.clone(), info.name.clone()))
            .unwrap_or_default();
        state.agencies.push(AgencyDetail {
            id,
            dispatch_center_id: center,
            short: short.to_owned(),
            name: name.to_owned(),
            kind: "fire".to_owned(),
            owned: true,
            active,
            dispatch_center_code: code,
            dispatch_center_name: center_name,
        });
        id
    }

    pub fn add_stations(&self, agency: AgencyId, count: usize) {
        *self.lock().stations.entry(agency).or_default() += count;
    }

    pub fn agency(&self, id: AgencyId) -> Option<AgencyDetail> {
        self.lock()
            .agencies
            .iter()
            .find(|agency| agency.id == id)
            .cloned()
    }

    /// Changes an agency behind the views' back.
    pub fn rename(&self, id: AgencyId, name: &str) {
        let mut state = self.lock();
        if let Some(agency) = state.agencies.iter_mut().find(|agency| agency.id == id) {
            agency.name = name.to_owned();
        }
    }

    /// The next call of `kind` waits `delay` before answering.
    pub fn push_delay(&self, kind: CallKind, delay: Duration) {
        self.lock().delays.entry(kind).or_default().push_back(delay);
    }

    /// The next call of `kind` fails with `message`.
    pub fn fail_next(&self, kind: CallKind, message: &str) {
        self.lock()
            .failures
            .entry(kind)
            .or_default()
            .push_back(message.to_owned());
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.lock().calls.clone()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.kind() == kind)
            .count()
    }

    pub fn list_queries(&self) -> Vec<AgencyQuery> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                FakeCall::ListAgencies(query) => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn record(&self, call: FakeCall) -> Script {
        let mut state = self.lock();
        let kind = call.kind();
        state.calls.push(call);
        Script {
            delay: state.delays.get_mut(&kind).and_then(VecDeque::pop_front),
            failure: state.failures.get_mut(&kind).and_then(VecDeque::pop_front),
        }
    }
}

impl FakeState {
    fn allocate_agency(&mut self) -> AgencyId {
        self.next_agency_id += 1;
        AgencyId::new(self.next_agency_id)
    }

    fn center(&self, id: DispatchCenterId) -> Option<&DispatchCenterInfo> {
        self.centers.iter().find(|center| center.id == id)
    }

    fn current_center(&self) -> Option<&DispatchCenterInfo> {
        let code = self.current_code.as_deref()?;
        self.centers.iter().find(|center| center.code == code)
    }

    fn list(&self, query: &AgencyQuery) -> Vec<AgencyListItem> {
        let code = match query.scope {
            AgencyScope::CurrentDispatchCenter => self
                .current_code
                .as_deref()
                .map(str::trim)
                .filter(|code| !code.is_empty()),
            AgencyScope::AllDispatchCenters => None,
        };
        let mut items: Vec<_> = self
            .agencies
            .iter()
            .filter(|agency| code.is_none_or(|code| agency.dispatch_center_code == code))
            .filter(|agency| query.matches(&agency.short, &agency.name, agency.active))
            .map(|agency| AgencyListItem {
                id: agency.id,
                dispatch_center_id: agency.dispatch_center_id,
                short: agency.short.clone(),
                name: agency.name.clone(),
                kind: agency.kind.clone(),
                owned: agency.owned,
                active: agency.active,
                dispatch_center_code: agency.dispatch_center_code.clone(),
            })
            .collect();
        items.sort_by(|left, right| {
            left.short
                .to_lowercase()
                .cmp(&right.short.to_lowercase())
                .then(left.id.cmp(&right.id))
        });
        items
    }

    fn update(&mut self, id: AgencyId, update: &AgencyUpdate) -> Result<bool> {
        let update = update.normalized();
        update.validate()?;
        let Some(agency) = self.agencies.iter_mut().find(|agency| agency.id == id) else {
            return Ok(false);
        };
        agency.name = update.name;
        agency.kind = update.kind;
        agency.owned = update.owned;
        agency.active = update.active;
        Ok(true)
    }

    fn create(&mut self, agency: &NewAgency) -> CreateOutcome {
        if let Err(error) = agency.validate() {
            return CreateOutcome::Rejected(error.to_string());
        }
        let agency = agency.normalized();
        let Some(center) = self.center(agency.dispatch_center_id).cloned() else {
            return CreateOutcome::Rejected("Dispatch center not found.".to_owned());
        };
        if self.agencies.iter().any(|existing| {
            existing.dispatch_center_id == center.id && existing.short.to_uppercase() == agency.short
        }) {
            return CreateOutcome::Rejected(format!(
                "An agency with short '{}' already exists in this dispatch center.",
                agency.short
            ));
        }
        let id = self.allocate_agency();
        self.agencies.push(AgencyDetail {
            id,
            dispatch_center_id: center.id,
            short: agency.short,
            name: agency.name,
            kind: agency.kind,
            owned: agency.owned,
            active: agency.active,
            dispatch_center_code: center.code,
            dispatch_center_name: center.name,
        });
        CreateOutcome::Created(id)
    }

    fn delete(&mut self, id: AgencyId) -> DeleteOutcome {
        if let Some(&stations) = self.stations.get(&id).filter(|count| **count > 0) {
            return DeleteOutcome::Referenced { stations };
        }
        let before = self.agencies.len();
        self.agencies.retain(|agency| agency.id != id);
        if self.agencies.len() == before {
            DeleteOutcome::NotFound
        } else {
            DeleteOutcome::Deleted
        }
    }
}

async fn play(script: Script, cancel: Option<&CancellationToken>) -> Result<()> {
    if let Some(delay) = script.delay {
        match cancel {
            Some(cancel) => {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(ViewError::Cancelled.into()),
                    () = tokio::time::sleep(delay) => {}
                }
            }
            None => tokio::time::sleep(delay).await,
        }
    }
    match script.failure {
        Some(message) => Err(anyhow!(message)),
        None => Ok(()),
    }
}

impl AgencyQueryService for FakeBackend {
    fn list_agencies(
        &self,
        query: AgencyQuery,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Vec<AgencyListItem>>> + Send {
        let script = self.record(FakeCall::ListAgencies(query.clone()));
        async move {
            play(script, Some(&cancel)).await?;
            Ok(self.lock().list(&query))
        }
    }
}

impl AgencyDetailQueryService for FakeBackend {
    fn get_agency(&self, id: AgencyId) -> impl Future<Output = Result<Option<AgencyDetail>>> + Send {
        let script = self.record(FakeCall::GetAgency(id));
        async move {
            play(script, None).await?;
            Ok(self.agency(id))
        }
    }
}

impl AgencyCommandService for FakeBackend {
    fn update_agency(
        &self,
        id: AgencyId,
        update: AgencyUpdate,
    ) -> impl Future<Output = Result<bool>> + Send {
        let script = self.record(FakeCall::UpdateAgency(id, update.clone()));
        async move {
            play(script, None).await?;
            self.lock().update(id, &update)
        }
    }

    fn create_agency(&self, agency: NewAgency) -> impl Future<Output = Result<CreateOutcome>> + Send {
        let script = self.record(FakeCall::CreateAgency(agency.clone()));
        async move {
            play(script, None).await?;
            Ok(self.lock().create(&agency))
        }
    }

    fn delete_agency(&self, id: AgencyId) -> impl Future<Output = Result<DeleteOutcome>> + Send {
        let script = self.record(FakeCall::DeleteAgency(id));
        async move {
            play(script, None).await?;
            Ok(self.lock().delete(id))
        }
    }
}

impl CurrentScopeService for FakeBackend {
    fn current_dispatch_center(
        &self,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Option<DispatchCenterInfo>>> + Send {
        let script = self.record(FakeCall::CurrentDispatchCenter);
        async move {
            play(script, Some(&cancel)).await?;
            Ok(self.lock().current_center().cloned())
        }
    }
}
