// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::{
    AgencyCreateView, AgencyDetail, AgencyDetailView, AgencyEditView, AgencyId, AgencyList,
    AgencyListItem, AgencyQuery, AgencyScope, AgencyUpdate, CreateOutcome, DeleteOutcome,
    DispatchCenterInfo, NavigationAware, NewAgency, ReturnState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u64);

impl ViewId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "view-{}", self.0)
    }
}

/// Independent stream of asynchronous work owned by a view. At most one task
/// per (view, lane) is live at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Debounce,
    Fetch,
    Load,
    Save,
    ScopeLookup,
    Delete,
}

impl Lane {
    pub const ALL: [Self; 6] = [
        Self::Debounce,
        Self::Fetch,
        Self::Load,
        Self::Save,
        Self::ScopeLookup,
        Self::Delete,
    ];

    const fn index(self) -> usize {
        match self {
            Self::Debounce => 0,
            Self::Fetch => 1,
            Self::Load => 2,
            Self::Save => 3,
            Self::ScopeLookup => 4,
            Self::Delete => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debounce => "debounce",
            Self::Fetch => "fetch",
            Self::Load => "load",
            Self::Save => "save",
            Self::ScopeLookup => "scope-lookup",
            Self::Delete => "delete",
        }
    }
}

/// Per-lane generation counters. Only a delivery carrying the latest
/// generation of its lane may change view state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneGenerations {
    latest: [u64; Lane::ALL.len()],
}

impl LaneGenerations {
    pub fn start(&mut self, lane: Lane) -> u64 {
        let slot = &mut self.latest[lane.index()];
        *slot += 1;
        *slot
    }

    pub fn is_current(&self, lane: Lane, generation: u64) -> bool {
        self.latest[lane.index()] == generation
    }

    pub fn latest(&self, lane: Lane) -> u64 {
        self.latest[lane.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    DebounceRefresh { delay: Duration },
    FetchAgencies(AgencyQuery),
    LoadAgency(AgencyId),
    UpdateAgency { id: AgencyId, update: AgencyUpdate },
    CreateAgency(NewAgency),
    DeleteAgency(AgencyId),
    LookupScope,
    /// Abandon whatever is running on the lane without starting new work.
    Cancel(Lane),
}

impl Request {
    pub fn lane(&self) -> Lane {
        match self {
            Self::DebounceRefresh { .. } => Lane::Debounce,
            Self::FetchAgencies(_) => Lane::Fetch,
            Self::LoadAgency(_) => Lane::Load,
            Self::UpdateAgency { .. } | Self::CreateAgency(_) => Lane::Save,
            Self::DeleteAgency(_) => Lane::Delete,
            Self::LookupScope => Lane::ScopeLookup,
            Self::Cancel(lane) => *lane,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    pub generation: u64,
    pub request: Request,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("{0}")]
    Validation(String),
    #[error("agency {0} not found")]
    NotFound(AgencyId),
    #[error("operation cancelled")]
    Cancelled,
    #[error("{0}")]
    Unexpected(String),
}

impl ViewError {
    /// Keeps a typed error that travelled inside `anyhow`, otherwise wraps
    /// the full context chain as unexpected.
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<ViewError>() {
            Some(typed) => typed.clone(),
            None => Self::Unexpected(format!("{error:#}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    DebounceElapsed,
    Agencies(Result<Vec<AgencyListItem>, ViewError>),
    Agency(Result<Option<AgencyDetail>, ViewError>),
    Updated(Result<bool, ViewError>),
    Created(Result<CreateOutcome, ViewError>),
    Deleted(Result<DeleteOutcome, ViewError>),
    Scope(Result<Option<DispatchCenterInfo>, ViewError>),
}

impl Completion {
    pub fn lane(&self) -> Lane {
        match self {
            Self::DebounceElapsed => Lane::Debounce,
            Self::Agencies(_) => Lane::Fetch,
            Self::Agency(_) => Lane::Load,
            Self::Updated(_) | Self::Created(_) => Lane::Save,
            Self::Deleted(_) => Lane::Delete,
            Self::Scope(_) => Lane::ScopeLookup,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub view: ViewId,
    pub generation: u64,
    pub completion: Completion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Scope,
    SearchText,
    ActiveOnly,
    Rows,
    SelectedId,
    Busy,
    ErrorMessage,
    CanCreate,
    CanEdit,
    CanSave,
    Short,
    Name,
    Kind,
    Owned,
    Active,
    DispatchCenter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    Changed(Field),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Agencies,
    Detail(AgencyId),
    Edit(AgencyId),
    Create,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavRequest {
    Open {
        target: Target,
        return_state: Option<ReturnState>,
    },
    Back(Option<ReturnState>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub events: Vec<ViewEvent>,
    pub effects: Vec<Effect>,
    pub navigation: Option<NavRequest>,
}

impl Outcome {
    pub fn changed(&mut self, field: Field) {
        let event = ViewEvent::Changed(field);
        if !self.events.contains(&event) {
            self.events.push(event);
        }
    }

    pub fn effect(&mut self, generation: u64, request: Request) {
        self.effects.push(Effect {
            generation,
            request,
        });
    }

    pub fn open(&mut self, target: Target, return_state: Option<ReturnState>) {
        self.navigation = Some(NavRequest::Open {
            target,
            return_state,
        });
    }

    pub fn back(&mut self, state: Option<ReturnState>) {
        self.navigation = Some(NavRequest::Back(state));
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.effects.is_empty() && self.navigation.is_none()
    }

    pub fn changed_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.events.iter().map(|ViewEvent::Changed(field)| *field)
    }

    pub fn requests(&self) -> impl Iterator<Item = &Request> + '_ {
        self.effects.iter().map(|effect| &effect.request)
    }
}

/// Writes `value` into `slot` and records a change event only when the value
/// actually differs.
pub(crate) fn assign<T: PartialEq>(
    slot: &mut T,
    value: T,
    field: Field,
    outcome: &mut Outcome,
) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    outcome.changed(field);
    true
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetSearchText(String),
    SetActiveOnly(bool),
    SetScope(AgencyScope),
    ToggleScope,
    Refresh,
    Select(Option<AgencyId>),
    OpenDetail(AgencyId),
    OpenCreate,
    Delete(AgencyId),
    Edit,
    Back,
    Reload,
    SetShort(String),
    SetName(String),
    SetKind(String),
    SetOwned(bool),
    SetActive(bool),
    Save,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Agencies,
    Detail,
    Edit,
    Create,
}

impl ViewKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Agencies => "agencies",
            Self::Detail => "agency-detail",
            Self::Edit => "agency-edit",
            Self::Create => "agency-create",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Agencies(AgencyList),
    Detail(AgencyDetailView),
    Edit(AgencyEditView),
    Create(AgencyCreateView),
}

impl View {
    pub fn id(&self) -> ViewId {
        match self {
            Self::Agencies(view) => view.id(),
            Self::Detail(view) => view.id(),
            Self::Edit(view) => view.id(),
            Self::Create(view) => view.id(),
        }
    }

    pub fn kind(&self) -> ViewKind {
        match self {
            Self::Agencies(_) => ViewKind::Agencies,
            Self::Detail(_) => ViewKind::Detail,
            Self::Edit(_) => ViewKind::Edit,
            Self::Create(_) => ViewKind::Create,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Agencies(view) => view.title(),
            Self::Detail(view) => view.title(),
            Self::Edit(view) => view.title(),
            Self::Create(view) => view.title(),
        }
    }

    pub fn as_agencies(&self) -> Option<&AgencyList> {
        match self {
            Self::Agencies(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_detail(&self) -> Option<&AgencyDetailView> {
        match self {
            Self::Detail(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_edit(&self) -> Option<&AgencyEditView> {
        match self {
            Self::Edit(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_create(&self) -> Option<&AgencyCreateView> {
        match self {
            Self::Create(view) => Some(view),
            _ => None,
        }
    }

    /// Routes a user action to the view. Actions a view does not offer are
    /// ignored.
    pub fn handle(&mut self, action: Action) -> Outcome {
        match (self, action) {
            (Self::Agencies(list), action) => match action {
                Action::SetSearchText(text) => list.set_search_text(text),
                Action::SetActiveOnly(value) => list.set_active_only(value),
                Action::SetScope(scope) => list.set_scope(scope),
                Action::ToggleScope => list.toggle_scope(),
                Action::Refresh | Action::Reload => list.refresh(),
                Action::Select(id) => list.select(id),
                Action::OpenDetail(id) => list.open_detail(id),
                Action::OpenCreate => list.open_create(),
                Action::Delete(id) => list.delete(id),
                other => ignored(ViewKind::Agencies, &other),
            },
            (Self::Detail(detail), action) => match action {
                Action::Edit => detail.edit(),
                Action::Back | Action::Cancel => detail.back(),
                Action::Reload | Action::Refresh => detail.reload(),
                other => ignored(ViewKind::Detail, &other),
            },
            (Self::Edit(edit), action) => match action {
                Action::SetName(value) => edit.set_name(value),
                Action::SetKind(value) => edit.set_kind(value),
                Action::SetOwned(value) => edit.set_owned(value),
                Action::SetActive(value) => edit.set_active(value),
                Action::Save => edit.save(),
                Action::Cancel | Action::Back => edit.cancel(),
                Action::Reload | Action::Refresh => edit.reload(),
                other => ignored(ViewKind::Edit, &other),
            },
            (Self::Create(create), action) => match action {
                Action::SetShort(value) => create.set_short(value),
                Action::SetName(value) => create.set_name(value),
                Action::SetKind(value) => create.set_kind(value),
                Action::SetOwned(value) => create.set_owned(value),
                Action::SetActive(value) => create.set_active(value),
                Action::Save => create.save(),
                Action::Cancel | Action::Back => create.cancel(),
                Action::Reload | Action::Refresh => create.reload(),
                other => ignored(ViewKind::Create, &other),
            },
        }
    }

    pub fn deliver(&mut self, delivery: Delivery) -> Outcome {
        match self {
            Self::Agencies(view) => view.deliver(delivery),
            Self::Detail(view) => view.deliver(delivery),
            Self::Edit(view) => view.deliver(delivery),
            Self::Create(view) => view.deliver(delivery),
        }
    }
}

impl NavigationAware for View {
    type Outcome = Outcome;

    fn on_navigated_to(
        &mut self,
        state: Option<ReturnState>,
        parent: Option<&ReturnState>,
    ) -> Outcome {
        match self {
            Self::Agencies(view) => view.on_navigated_to(state, parent),
            Self::Detail(view) => view.on_navigated_to(state, parent),
            Self::Edit(view) => view.on_navigated_to(state, parent),
            Self::Create(view) => view.on_navigated_to(state, parent),
        }
    }
}

fn ignored(kind: ViewKind, action: &Action) -> Outcome {
    debug!(view = kind.as_str(), ?action, "action not offered by view");
    Outcome::default()
}

/// Logs and drops a delivery whose generation is no longer the newest on its
/// lane. Returns true when the delivery may be applied.
pub(crate) fn accept(view: ViewId, lanes: &LaneGenerations, delivery: &Delivery) -> bool {
    let lane = delivery.completion.lane();
    if lanes.is_current(lane, delivery.generation) {
        return true;
    }
    debug!(
        %view,
        lane = lane.as_str(),
        generation = delivery.generation,
        latest = lanes.latest(lane),
        "dropping stale delivery"
    );
    false
}
