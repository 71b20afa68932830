// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, info, warn};

use crate::view::{accept, assign};
use crate::{
    Authorizer, Completion, CreateOutcome, CreatedAgency, Delivery, DispatchCenterInfo, Field,
    Lane, LaneGenerations, NewAgency, Outcome, Request, ReturnState, ViewError, ViewId,
    normalize_short,
};

const NO_CENTER_MESSAGE: &str = "Current dispatch center is not configured.";
const DENIED_MESSAGE: &str =
    "You do not have permission to create agencies for this dispatch center.";
const REQUIRED_MESSAGE: &str = "Short, Name, and Type are required.";

#[derive(Debug, Clone, PartialEq)]
pub struct AgencyCreateView {
    id: ViewId,
    authorizer: Authorizer,
    list_state: Option<ReturnState>,
    dispatch_center: Option<DispatchCenterInfo>,
    title: String,
    short: String,
    name: String,
    kind: String,
    owned: bool,
    active: bool,
    busy: bool,
    can_create: bool,
    can_save: bool,
    error_message: Option<String>,
    pending: Option<NewAgency>,
    lanes: LaneGenerations,
}

impl AgencyCreateView {
    pub fn new(id: ViewId, authorizer: Authorizer) -> Self {
        Self {
            id,
            authorizer,
            list_state: None,
            dispatch_center: None,
            title: "Create Agency".to_owned(),
            short: String::new(),
            name: String::new(),
            kind: String::new(),
            owned: false,
            active: true,
            busy: false,
            can_create: false,
            can_save: false,
            error_message: None,
            pending: None,
            lanes: LaneGenerations::default(),
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn dispatch_center(&self) -> Option<&DispatchCenterInfo> {
        self.dispatch_center.as_ref()
    }

    pub fn short(&self) -> &str {
        &self.short
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn owned(&self) -> bool {
        self.owned
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn can_create(&self) -> bool {
        self.can_create
    }

    pub fn can_save(&self) -> bool {
        self.can_save
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// `parent` is the list snapshot taken when create was opened; it is
    /// merged into the payload handed back on success.
    pub fn on_navigated_to(
        &mut self,
        _state: Option<ReturnState>,
        parent: Option<&ReturnState>,
    ) -> Outcome {
        let mut outcome = Outcome::default();
        self.list_state = parent.cloned();
        self.lookup(&mut outcome);
        outcome
    }

    /// Looks the current dispatch center up again, superseding any lookup in
    /// flight.
    pub fn reload(&mut self) -> Outcome {
        let mut outcome = Outcome::default();
        self.lookup(&mut outcome);
        outcome
    }

    pub fn set_short(&mut self, short: impl Into<String>) -> Outcome {
        let mut outcome = Outcome::default();
        if assign(&mut self.short, short.into(), Field::Short, &mut outcome) {
            self.sync_can_save(&mut outcome);
        }
        outcome
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Outcome {
        let mut outcome = Outcome::default();
        if assign(&mut self.name, name.into(), Field::Name, &mut outcome) {
            self.sync_can_save(&mut outcome);
        }
        outcome
    }

    pub fn set_kind(&mut self, kind: impl Into<String>) -> Outcome {
        let mut outcome = Outcome::default();
        if assign(&mut self.kind, kind.into(), Field::Kind, &mut outcome) {
            self.sync_can_save(&mut outcome);
        }
        outcome
    }

    pub fn set_owned(&mut self, owned: bool) -> Outcome {
        let mut outcome = Outcome::default();
        assign(&mut self.owned, owned, Field::Owned, &mut outcome);
        outcome
    }

    pub fn set_active(&mut self, active: bool) -> Outcome {
        let mut outcome = Outcome::default();
        assign(&mut self.active, active, Field::Active, &mut outcome);
        outcome
    }

    pub fn save(&mut self) -> Outcome {
        let mut outcome = Outcome::default();
        assign(&mut self.error_message, None, Field::ErrorMessage, &mut outcome);
        if self.busy {
            debug!(view = %self.id, "save while busy");
            return outcome;
        }
        let Some(dispatch_center_id) = self.dispatch_center.as_ref().map(|center| center.id)
        else {
            self.fail(NO_CENTER_MESSAGE.to_owned(), &mut outcome);
            return outcome;
        };
        if !self.authorizer.can_create(dispatch_center_id) {
            self.fail(DENIED_MESSAGE.to_owned(), &mut outcome);
            return outcome;
        }

        let agency = NewAgency {
            dispatch_center_id,
            short: self.short.trim().to_owned(),
            name: self.name.trim().to_owned(),
            kind: self.kind.trim().to_owned(),
            owned: self.owned,
            active: self.active,
        };
        if agency.short.is_empty() || agency.name.is_empty() || agency.kind.is_empty() {
            self.fail(REQUIRED_MESSAGE.to_owned(), &mut outcome);
            return outcome;
        }

        info!(view = %self.id, short = %agency.short, "creating agency");
        let generation = self.lanes.start(Lane::Save);
        self.pending = Some(agency.clone());
        self.set_busy(true, &mut outcome);
        outcome.effect(generation, Request::CreateAgency(agency));
        outcome
    }

    pub fn cancel(&mut self) -> Outcome {
        let mut outcome = Outcome::default();
        outcome.back(None);
        outcome
    }

    pub fn deliver(&mut self, delivery: Delivery) -> Outcome {
        let mut outcome = Outcome::default();
        if !accept(self.id, &self.lanes, &delivery) {
            return outcome;
        }
        match delivery.completion {
            Completion::Scope(result) => self.apply_lookup(result, &mut outcome),
            Completion::Created(result) => self.apply_create(result, &mut outcome),
            other => debug!(view = %self.id, ?other, "agency create ignores completion"),
        }
        outcome
    }

    fn lookup(&mut self, outcome: &mut Outcome) {
        let generation = self.lanes.start(Lane::ScopeLookup);
        assign(&mut self.error_message, None, Field::ErrorMessage, outcome);
        self.set_busy(true, outcome);
        outcome.effect(generation, Request::LookupScope);
    }

    fn apply_lookup(
        &mut self,
        result: Result<Option<DispatchCenterInfo>, ViewError>,
        outcome: &mut Outcome,
    ) {
        match result {
            Ok(Some(center)) => {
                let can_create = self.authorizer.can_create(center.id);
                assign(&mut self.title, "Create Agency".to_owned(), Field::Title, outcome);
                assign(
                    &mut self.dispatch_center,
                    Some(center),
                    Field::DispatchCenter,
                    outcome,
                );
                assign(&mut self.can_create, can_create, Field::CanCreate, outcome);
                if !can_create {
                    self.fail(DENIED_MESSAGE.to_owned(), outcome);
                }
            }
            Ok(None) => {
                let title = "Create Agency (No Current Dispatch Center)".to_owned();
                assign(&mut self.title, title, Field::Title, outcome);
                assign(&mut self.dispatch_center, None, Field::DispatchCenter, outcome);
                assign(&mut self.can_create, false, Field::CanCreate, outcome);
                self.fail(NO_CENTER_MESSAGE.to_owned(), outcome);
            }
            Err(ViewError::Cancelled) => {
                debug!(view = %self.id, "dispatch center lookup cancelled");
            }
            Err(error) => {
                assign(&mut self.can_create, false, Field::CanCreate, outcome);
                self.fail(error.to_string(), outcome);
            }
        }
        self.set_busy(false, outcome);
    }

    fn apply_create(&mut self, result: Result<CreateOutcome, ViewError>, outcome: &mut Outcome) {
        let pending = self.pending.take();
        self.set_busy(false, outcome);
        match (result, pending) {
            (Ok(CreateOutcome::Created(id)), Some(agency)) => {
                let code = self
                    .dispatch_center
                    .as_ref()
                    .map(|center| center.code.clone())
                    .unwrap_or_default();
                info!(view = %self.id, agency = %id, "agency created");
                let created = CreatedAgency {
                    id,
                    dispatch_center_id: agency.dispatch_center_id,
                    dispatch_center_code: code,
                    short: normalize_short(&agency.short),
                    name: agency.name,
                    kind: agency.kind,
                    owned: agency.owned,
                    active: agency.active,
                };
                let merged = ReturnState::merged_with_created(self.list_state.as_ref(), created);
                outcome.back(Some(merged));
            }
            (Ok(CreateOutcome::Created(id)), None) => {
                debug!(view = %self.id, agency = %id, "create completed without a pending save");
            }
            (Ok(CreateOutcome::Rejected(message)), _) => self.fail(message, outcome),
            (Err(ViewError::Cancelled), _) => {
                debug!(view = %self.id, "agency create cancelled");
            }
            (Err(error), _) => self.fail(error.to_string(), outcome),
        }
    }

    fn fail(&mut self, message: String, outcome: &mut Outcome) {
        warn!(view = %self.id, %message, "agency create blocked");
        assign(&mut self.error_message, Some(message), Field::ErrorMessage, outcome);
    }

    fn set_busy(&mut self, busy: bool, outcome: &mut Outcome) {
        assign(&mut self.busy, busy, Field::Busy, outcome);
        self.sync_can_save(outcome);
    }

    fn sync_can_save(&mut self, outcome: &mut Outcome) {
        let can_save = self.can_create
            && !self.busy
            && !self.short.trim().is_empty()
            && !self.name.trim().is_empty()
            && !self.kind.trim().is_empty();
        assign(&mut self.can_save, can_save, Field::CanSave, outcome);
    }
}
