// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, info, warn};

use crate::view::{accept, assign};
use crate::{
    AgencyDetail, AgencyId, Authorizer, Completion, Delivery, Field, Lane, LaneGenerations,
    Outcome, Request, ReturnState, Target, ViewError, ViewId,
};

/// Read-only view of one agency. When an edit of this agency finishes, the
/// view forwards the result to the list without rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct AgencyDetailView {
    id: ViewId,
    agency_id: AgencyId,
    authorizer: Authorizer,
    list_state: Option<ReturnState>,
    agency: Option<AgencyDetail>,
    title: String,
    busy: bool,
    not_found: bool,
    can_edit: bool,
    error_message: Option<String>,
    lanes: LaneGenerations,
}

impl AgencyDetailView {
    pub fn new(id: ViewId, agency_id: AgencyId, authorizer: Authorizer) -> Self {
        Self {
            id,
            agency_id,
            authorizer,
            list_state: None,
            agency: None,
            title: "Agency Details".to_owned(),
            busy: false,
            not_found: false,
            can_edit: false,
            error_message: None,
            lanes: LaneGenerations::default(),
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn agency_id(&self) -> AgencyId {
        self.agency_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn agency(&self) -> Option<&AgencyDetail> {
        self.agency.as_ref()
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn not_found(&self) -> bool {
        self.not_found
    }

    pub fn can_edit(&self) -> bool {
        self.can_edit
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn list_state(&self) -> Option<&ReturnState> {
        self.list_state.as_ref()
    }

    pub fn on_navigated_to(
        &mut self,
        state: Option<ReturnState>,
        parent: Option<&ReturnState>,
    ) -> Outcome {
        let mut outcome = Outcome::default();
        match state {
            Some(state) => {
                if let Some(edited) = state
                    .edited_payload()
                    .filter(|edited| edited.id == self.agency_id)
                {
                    let merged =
                        ReturnState::merged_with_edited(self.list_state.as_ref(), edited.clone());
                    debug!(view = %self.id, agency = %self.agency_id, "forwarding edit to list");
                    outcome.back(Some(merged));
                    return outcome;
                }
                self.list_state = Some(state);
            }
            None => self.list_state = parent.cloned(),
        }
        self.load(&mut outcome);
        outcome
    }

    pub fn edit(&mut self) -> Outcome {
        let mut outcome = Outcome::default();
        if !self.can_edit {
            debug!(view = %self.id, agency = %self.agency_id, "edit not available");
            return outcome;
        }
        info!(view = %self.id, agency = %self.agency_id, "opening agency edit");
        outcome.open(Target::Edit(self.agency_id), self.list_state.clone());
        outcome
    }

    pub fn back(&mut self) -> Outcome {
        let mut outcome = Outcome::default();
        outcome.back(None);
        outcome
    }

    pub fn reload(&mut self) -> Outcome {
        let mut outcome = Outcome::default();
        self.load(&mut outcome);
        outcome
    }

    pub fn deliver(&mut self, delivery: Delivery) -> Outcome {
        let mut outcome = Outcome::default();
        if !accept(self.id, &self.lanes, &delivery) {
            return outcome;
        }
        match delivery.completion {
            Completion::Agency(result) => self.apply_load(result, &mut outcome),
            other => debug!(view = %self.id, ?other, "agency detail ignores completion"),
        }
        outcome
    }

    fn load(&mut self, outcome: &mut Outcome) {
        let generation = self.lanes.start(Lane::Load);
        assign(&mut self.busy, true, Field::Busy, outcome);
        self.sync_can_edit(outcome);
        outcome.effect(generation, Request::LoadAgency(self.agency_id));
    }

    fn apply_load(&mut self, result: Result<Option<AgencyDetail>, ViewError>, outcome: &mut Outcome) {
        match result {
            Ok(Some(agency)) => {
                let title = format!("Agency Details: {}", agency.short);
                assign(&mut self.title, title, Field::Title, outcome);
                self.not_found = false;
                assign(&mut self.error_message, None, Field::ErrorMessage, outcome);
                if self.agency.as_ref() != Some(&agency) {
                    self.agency = Some(agency);
                    outcome.changed(Field::Short);
                    outcome.changed(Field::Name);
                    outcome.changed(Field::Kind);
                    outcome.changed(Field::Owned);
                    outcome.changed(Field::Active);
                    outcome.changed(Field::DispatchCenter);
                }
            }
            Ok(None) => {
                let title = format!("Agency Details (Not Found: {})", self.agency_id);
                assign(&mut self.title, title, Field::Title, outcome);
                self.not_found = true;
                assign(&mut self.error_message, None, Field::ErrorMessage, outcome);
                if self.agency.take().is_some() {
                    outcome.changed(Field::Name);
                }
            }
            Err(ViewError::Cancelled) => {
                debug!(view = %self.id, agency = %self.agency_id, "agency load cancelled");
            }
            Err(error) => {
                warn!(view = %self.id, agency = %self.agency_id, %error, "agency load failed");
                assign(
                    &mut self.error_message,
                    Some(error.to_string()),
                    Field::ErrorMessage,
                    outcome,
                );
            }
        }
        assign(&mut self.busy, false, Field::Busy, outcome);
        self.sync_can_edit(outcome);
    }

    fn sync_can_edit(&mut self, outcome: &mut Outcome) {
        let can_edit = !self.busy
            && !self.not_found
            && self
                .agency
                .as_ref()
                .is_some_and(|agency| self.authorizer.can_edit(agency.dispatch_center_id));
        assign(&mut self.can_edit, can_edit, Field::CanEdit, outcome);
    }
}
