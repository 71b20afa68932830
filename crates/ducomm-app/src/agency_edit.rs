// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, info, warn};

use crate::view::{accept, assign};
use crate::{
    AgencyDetail, AgencyId, AgencyUpdate, Authorizer, Completion, Delivery, EditedAgency, Field,
    Lane, LaneGenerations, Outcome, Request, ReturnState, ViewError, ViewId,
};

#[derive(Debug, Clone, PartialEq)]
pub struct AgencyEditView {
    id: ViewId,
    agency_id: AgencyId,
    authorizer: Authorizer,
    agency: Option<AgencyDetail>,
    title: String,
    name: String,
    kind: String,
    owned: bool,
    active: bool,
    busy: bool,
    can_save: bool,
    error_message: Option<String>,
    pending_update: Option<AgencyUpdate>,
    lanes: LaneGenerations,
}

impl AgencyEditView {
    pub fn new(id: ViewId, agency_id: AgencyId, authorizer: Authorizer) -> Self {
        Self {
            id,
            agency_id,
            authorizer,
            agency: None,
            title: "Edit Agency".to_owned(),
            name: String::new(),
            kind: String::new(),
            owned: false,
            active: true,
            busy: false,
            can_save: false,
            error_message: None,
            pending_update: None,
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

    pub fn short(&self) -> &str {
        self.agency.as_ref().map_or("", |agency| agency.short.as_str())
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

    pub fn can_save(&self) -> bool {
        self.can_save
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn on_navigated_to(
        &mut self,
        _state: Option<ReturnState>,
        _parent: Option<&ReturnState>,
    ) -> Outcome {
        let mut outcome = Outcome::default();
        self.load(&mut outcome);
        outcome
    }

    pub fn reload(&mut self) -> Outcome {
        let mut outcome = Outcome::default();
        self.load(&mut outcome);
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
        let Some(dispatch_center_id) = self.agency.as_ref().map(|agency| agency.dispatch_center_id)
        else {
            debug!(view = %self.id, agency = %self.agency_id, "save before agency loaded");
            return outcome;
        };
        if self.busy {
            debug!(view = %self.id, agency = %self.agency_id, "save while busy");
            return outcome;
        }
        if !self.authorizer.can_edit(dispatch_center_id) {
            let message = "You do not have permission to edit agencies for this dispatch center.";
            assign(
                &mut self.error_message,
                Some(message.to_owned()),
                Field::ErrorMessage,
                &mut outcome,
            );
            return outcome;
        }

        let update = AgencyUpdate {
            name: self.name.clone(),
            kind: self.kind.clone(),
            owned: self.owned,
            active: self.active,
        }
        .normalized();
        if let Err(error) = update.validate() {
            assign(
                &mut self.error_message,
                Some(error.to_string()),
                Field::ErrorMessage,
                &mut outcome,
            );
            return outcome;
        }

        info!(view = %self.id, agency = %self.agency_id, "saving agency");
        let generation = self.lanes.start(Lane::Save);
        self.pending_update = Some(update.clone());
        self.set_busy(true, &mut outcome);
        outcome.effect(
            generation,
            Request::UpdateAgency {
                id: self.agency_id,
                update,
            },
        );
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
            Completion::Agency(result) => self.apply_load(result, &mut outcome),
            Completion::Updated(result) => self.apply_update(result, &mut outcome),
            other => debug!(view = %self.id, ?other, "agency edit ignores completion"),
        }
        outcome
    }

    fn load(&mut self, outcome: &mut Outcome) {
        let generation = self.lanes.start(Lane::Load);
        assign(&mut self.error_message, None, Field::ErrorMessage, outcome);
        self.set_busy(true, outcome);
        outcome.effect(generation, Request::LoadAgency(self.agency_id));
    }

    fn apply_load(&mut self, result: Result<Option<AgencyDetail>, ViewError>, outcome: &mut Outcome) {
        match result {
            Ok(Some(agency)) => {
                let title = format!("Edit Agency: {}", agency.short);
                assign(&mut self.title, title, Field::Title, outcome);
                assign(&mut self.name, agency.name.clone(), Field::Name, outcome);
                assign(&mut self.kind, agency.kind.clone(), Field::Kind, outcome);
                assign(&mut self.owned, agency.owned, Field::Owned, outcome);
                assign(&mut self.active, agency.active, Field::Active, outcome);
                if self.agency.as_ref() != Some(&agency) {
                    self.agency = Some(agency);
                    outcome.changed(Field::Short);
                    outcome.changed(Field::DispatchCenter);
                }
            }
            Ok(None) => {
                let title = format!("Edit Agency (Not Found: {})", self.agency_id);
                assign(&mut self.title, title, Field::Title, outcome);
                self.agency = None;
                assign(
                    &mut self.error_message,
                    Some("Agency not found.".to_owned()),
                    Field::ErrorMessage,
                    outcome,
                );
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
        self.set_busy(false, outcome);
    }

    fn apply_update(&mut self, result: Result<bool, ViewError>, outcome: &mut Outcome) {
        let update = self.pending_update.take();
        self.set_busy(false, outcome);
        match (result, update) {
            (Ok(true), Some(update)) => {
                info!(view = %self.id, agency = %self.agency_id, "agency saved");
                outcome.back(Some(ReturnState::edited(EditedAgency {
                    id: self.agency_id,
                    name: update.name,
                    kind: update.kind,
                    owned: update.owned,
                    active: update.active,
                })));
            }
            (Ok(true), None) => {
                debug!(view = %self.id, "update completed without a pending save");
            }
            (Ok(false), _) => {
                assign(
                    &mut self.error_message,
                    Some("Agency not found.".to_owned()),
                    Field::ErrorMessage,
                    outcome,
                );
            }
            (Err(ViewError::Cancelled), _) => {
                debug!(view = %self.id, agency = %self.agency_id, "agency save cancelled");
            }
            (Err(error), _) => {
                warn!(view = %self.id, agency = %self.agency_id, %error, "agency save failed");
                assign(
                    &mut self.error_message,
                    Some(error.to_string()),
                    Field::ErrorMessage,
                    outcome,
                );
            }
        }
    }

    fn set_busy(&mut self, busy: bool, outcome: &mut Outcome) {
        assign(&mut self.busy, busy, Field::Busy, outcome);
        self.sync_can_save(outcome);
    }

    fn sync_can_save(&mut self, outcome: &mut Outcome) {
        let permitted = self
            .agency
            .as_ref()
            .is_some_and(|agency| self.authorizer.can_edit(agency.dispatch_center_id));
        let can_save = permitted
            && !self.busy
            && !self.name.trim().is_empty()
            && !self.kind.trim().is_empty();
        assign(&mut self.can_save, can_save, Field::CanSave, outcome);
    }
}
