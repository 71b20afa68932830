// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::view::{accept, assign};
use crate::{
    AgencyId, AgencyListItem, AgencyQuery, AgencyScope, Authorizer, Completion, CreatedAgency,
    DeleteOutcome, Delivery, DispatchCenterId, EditedAgency, Field, Lane, LaneGenerations,
    Outcome, Request, ReturnPayload, ReturnState, Target, ViewError, ViewId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgencyRow {
    pub id: AgencyId,
    pub dispatch_center_id: DispatchCenterId,
    pub short: String,
    pub name: String,
    pub kind: String,
    pub owned: bool,
    pub active: bool,
    pub dispatch_center_code: String,
    pub can_edit: bool,
}

impl AgencyRow {
    fn from_item(item: AgencyListItem, authorizer: &Authorizer) -> Self {
        Self {
            can_edit: authorizer.can_edit(item.dispatch_center_id),
            id: item.id,
            dispatch_center_id: item.dispatch_center_id,
            short: item.short,
            name: item.name,
            kind: item.kind,
            owned: item.owned,
            active: item.active,
            dispatch_center_code: item.dispatch_center_code,
        }
    }

    fn from_created(created: &CreatedAgency, authorizer: &Authorizer) -> Self {
        Self {
            id: created.id,
            dispatch_center_id: created.dispatch_center_id,
            short: created.short.clone(),
            name: created.name.clone(),
            kind: created.kind.clone(),
            owned: created.owned,
            active: created.active,
            dispatch_center_code: created.dispatch_center_code.clone(),
            can_edit: authorizer.can_edit(created.dispatch_center_id),
        }
    }
}

/// Agencies list controller: filter state, a debounced refresh, one
/// superseding fetch at a time, and in-memory patches for rows that were just
/// created, edited or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct AgencyList {
    id: ViewId,
    authorizer: Authorizer,
    search_debounce: Duration,
    scope: AgencyScope,
    search_text: String,
    active_only: bool,
    rows: Vec<AgencyRow>,
    selected_id: Option<AgencyId>,
    pending_select: Option<AgencyId>,
    busy: bool,
    error_message: Option<String>,
    can_create: bool,
    loaded_query: Option<AgencyQuery>,
    in_flight: Option<AgencyQuery>,
    debounce_pending: bool,
    pending_delete: Option<AgencyId>,
    lanes: LaneGenerations,
}

impl AgencyList {
    pub fn new(id: ViewId, authorizer: Authorizer, search_debounce: Duration) -> Self {
        let can_create = authorizer.has_blanket_rights();
        Self {
            id,
            authorizer,
            search_debounce,
            scope: AgencyScope::default(),
            search_text: String::new(),
            active_only: true,
            rows: Vec::new(),
            selected_id: None,
            pending_select: None,
            busy: false,
            error_message: None,
            can_create,
            loaded_query: None,
            in_flight: None,
            debounce_pending: false,
            pending_delete: None,
            lanes: LaneGenerations::default(),
        }
    }

    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn title(&self) -> &str {
        "Agencies"
    }

    pub fn scope(&self) -> AgencyScope {
        self.scope
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn active_only(&self) -> bool {
        self.active_only
    }

    pub fn rows(&self) -> &[AgencyRow] {
        &self.rows
    }

    pub fn row(&self, id: AgencyId) -> Option<&AgencyRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn selected_id(&self) -> Option<AgencyId> {
        self.selected_id
    }

    pub fn selected_row(&self) -> Option<&AgencyRow> {
        self.selected_id.and_then(|id| self.row(id))
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn can_create(&self) -> bool {
        self.can_create
    }

    pub fn query(&self) -> AgencyQuery {
        AgencyQuery::new(self.scope, Some(&self.search_text), self.active_only)
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) -> Outcome {
        let mut outcome = Outcome::default();
        if assign(&mut self.search_text, text.into(), Field::SearchText, &mut outcome) {
            self.schedule_refresh(&mut outcome);
        }
        outcome
    }

    pub fn set_active_only(&mut self, active_only: bool) -> Outcome {
        let mut outcome = Outcome::default();
        if assign(&mut self.active_only, active_only, Field::ActiveOnly, &mut outcome) {
            self.schedule_refresh(&mut outcome);
        }
        outcome
    }

    pub fn set_scope(&mut self, scope: AgencyScope) -> Outcome {
        let mut outcome = Outcome::default();
        if assign(&mut self.scope, scope, Field::Scope, &mut outcome) {
            self.schedule_refresh(&mut outcome);
        }
        outcome
    }

    pub fn toggle_scope(&mut self) -> Outcome {
        self.set_scope(self.scope.toggled())
    }

    /// Fetches now, even when the rows already match the filters.
    pub fn refresh(&mut self) -> Outcome {
        let mut outcome = Outcome::default();
        self.cancel_debounce(&mut outcome);
        self.fetch(true, &mut outcome);
        outcome
    }

    pub fn select(&mut self, id: Option<AgencyId>) -> Outcome {
        let mut outcome = Outcome::default();
        self.set_selected(id, &mut outcome);
        outcome
    }

    pub fn open_detail(&mut self, id: AgencyId) -> Outcome {
        let mut outcome = Outcome::default();
        self.set_selected(Some(id), &mut outcome);
        let state = self.capture_return_state(Some(id));
        info!(view = %self.id, agency = %id, "opening agency detail");
        outcome.open(Target::Detail(id), Some(state));
        outcome
    }

    pub fn open_create(&mut self) -> Outcome {
        let mut outcome = Outcome::default();
        let state = self.capture_return_state(self.selected_id);
        info!(view = %self.id, "opening agency create");
        outcome.open(Target::Create, Some(state));
        outcome
    }

    pub fn delete(&mut self, id: AgencyId) -> Outcome {
        let mut outcome = Outcome::default();
        if let Some(pending) = self.pending_delete {
            debug!(
                view = %self.id,
                agency = %id,
                %pending,
                "delete ignored while another is pending"
            );
            return outcome;
        }
        let Some(row) = self.row(id) else {
            debug!(view = %self.id, agency = %id, "delete ignored for unknown row");
            return outcome;
        };
        if !row.can_edit {
            let message =
                "You do not have permission to delete agencies for this dispatch center.";
            assign(
                &mut self.error_message,
                Some(message.to_owned()),
                Field::ErrorMessage,
                &mut outcome,
            );
            return outcome;
        }
        assign(&mut self.error_message, None, Field::ErrorMessage, &mut outcome);
        let generation = self.lanes.start(Lane::Delete);
        self.pending_delete = Some(id);
        self.sync_busy(&mut outcome);
        outcome.effect(generation, Request::DeleteAgency(id));
        outcome
    }

    /// Snapshot handed to a child view so the list can be restored on return.
    pub fn capture_return_state(&self, selected_id: Option<AgencyId>) -> ReturnState {
        let search_text = (!self.search_text.is_empty()).then(|| self.search_text.clone());
        ReturnState::list(self.scope, search_text, self.active_only, selected_id)
    }

    pub fn on_navigated_to(
        &mut self,
        state: Option<ReturnState>,
        _parent: Option<&ReturnState>,
    ) -> Outcome {
        let mut outcome = Outcome::default();
        self.cancel_debounce(&mut outcome);

        let Some(state) = state else {
            self.fetch(true, &mut outcome);
            return outcome;
        };

        if let Some(scope) = state.scope() {
            assign(&mut self.scope, scope, Field::Scope, &mut outcome);
        }
        let search_text = state.search_text().unwrap_or_default().to_owned();
        assign(&mut self.search_text, search_text, Field::SearchText, &mut outcome);
        let active_only = state.active_only().unwrap_or(true);
        assign(&mut self.active_only, active_only, Field::ActiveOnly, &mut outcome);
        self.pending_select = state.pending_selection();

        let patched = match state.payload() {
            Some(ReturnPayload::Created(created)) => self.patch_created(created, &mut outcome),
            Some(ReturnPayload::Edited(edited)) => self.patch_edited(edited, &mut outcome),
            None => false,
        };
        if !patched {
            self.fetch(true, &mut outcome);
        }
        outcome
    }

    pub fn deliver(&mut self, delivery: Delivery) -> Outcome {
        let mut outcome = Outcome::default();
        if !accept(self.id, &self.lanes, &delivery) {
            return outcome;
        }
        match delivery.completion {
            Completion::DebounceElapsed => {
                self.debounce_pending = false;
                self.fetch(false, &mut outcome);
            }
            Completion::Agencies(result) => self.apply_fetch(result, &mut outcome),
            Completion::Deleted(result) => self.apply_delete(result, &mut outcome),
            other => debug!(view = %self.id, ?other, "agencies list ignores completion"),
        }
        outcome
    }

    fn schedule_refresh(&mut self, outcome: &mut Outcome) {
        let generation = self.lanes.start(Lane::Debounce);
        self.debounce_pending = true;
        outcome.effect(
            generation,
            Request::DebounceRefresh {
                delay: self.search_debounce,
            },
        );
    }

    fn cancel_debounce(&mut self, outcome: &mut Outcome) {
        if !self.debounce_pending {
            return;
        }
        let generation = self.lanes.start(Lane::Debounce);
        self.debounce_pending = false;
        outcome.effect(generation, Request::Cancel(Lane::Debounce));
    }

    fn fetch(&mut self, force: bool, outcome: &mut Outcome) {
        let query = self.query();
        let unchanged = self.loaded_query.as_ref() == Some(&query);
        if !force && unchanged && self.pending_select.is_none() && self.in_flight.is_none() {
            debug!(view = %self.id, ?query, "rows already match filters, skipping fetch");
            return;
        }
        let generation = self.lanes.start(Lane::Fetch);
        debug!(view = %self.id, generation, force, ?query, "fetching agencies");
        self.in_flight = Some(query.clone());
        self.sync_busy(outcome);
        outcome.effect(generation, Request::FetchAgencies(query));
    }

    fn apply_fetch(&mut self, result: Result<Vec<AgencyListItem>, ViewError>, outcome: &mut Outcome) {
        let query = self.in_flight.take();
        match result {
            Ok(items) => {
                let rows = items
                    .into_iter()
                    .map(|item| AgencyRow::from_item(item, &self.authorizer))
                    .collect();
                assign(&mut self.rows, rows, Field::Rows, outcome);
                self.loaded_query = query;
                assign(&mut self.error_message, None, Field::ErrorMessage, outcome);
                let wanted = self.pending_select.take().or(self.selected_id);
                self.set_selected(wanted, outcome);
                self.sync_can_create(outcome);
            }
            Err(ViewError::Cancelled) => {
                debug!(view = %self.id, "agency fetch cancelled");
            }
            Err(error) => {
                warn!(view = %self.id, %error, "agency fetch failed");
                assign(
                    &mut self.error_message,
                    Some(error.to_string()),
                    Field::ErrorMessage,
                    outcome,
                );
            }
        }
        self.sync_busy(outcome);
    }

    fn apply_delete(&mut self, result: Result<DeleteOutcome, ViewError>, outcome: &mut Outcome) {
        let Some(id) = self.pending_delete.take() else {
            return;
        };
        match result {
            Ok(DeleteOutcome::Deleted) => {
                info!(view = %self.id, agency = %id, "agency deleted");
                self.remove_row(id, outcome);
            }
            Ok(DeleteOutcome::NotFound) => {
                debug!(view = %self.id, agency = %id, "agency already gone");
                self.remove_row(id, outcome);
            }
            Ok(DeleteOutcome::Referenced { stations }) => {
                let short = self
                    .row(id)
                    .map_or_else(|| id.to_string(), |row| row.short.clone());
                let message = format!(
                    "Cannot delete agency {short}: {stations} station(s) still reference it."
                );
                assign(&mut self.error_message, Some(message), Field::ErrorMessage, outcome);
            }
            Err(ViewError::Cancelled) => {
                debug!(view = %self.id, agency = %id, "agency delete cancelled");
            }
            Err(error) => {
                warn!(view = %self.id, agency = %id, %error, "agency delete failed");
                assign(
                    &mut self.error_message,
                    Some(error.to_string()),
                    Field::ErrorMessage,
                    outcome,
                );
            }
        }
        self.sync_busy(outcome);
    }

    /// Rows in memory can be patched only when they are the completed result
    /// of exactly the current filters.
    fn can_patch(&self) -> bool {
        self.in_flight.is_none() && self.loaded_query.as_ref() == Some(&self.query())
    }

    fn patch_created(&mut self, created: &CreatedAgency, outcome: &mut Outcome) -> bool {
        if !self.can_patch() {
            return false;
        }
        self.pending_select = None;
        if self.row(created.id).is_some() {
            self.set_selected(Some(created.id), outcome);
            return true;
        }
        if !self.query().matches(&created.short, &created.name, created.active) {
            debug!(view = %self.id, agency = %created.id, "created agency hidden by filters");
            self.set_selected(self.selected_id, outcome);
            return true;
        }

        let row = AgencyRow::from_created(created, &self.authorizer);
        let key = row.short.to_lowercase();
        let index = self
            .rows
            .partition_point(|existing| existing.short.to_lowercase() <= key);
        self.rows.insert(index, row);
        outcome.changed(Field::Rows);
        self.set_selected(Some(created.id), outcome);
        self.sync_can_create(outcome);
        true
    }

    fn patch_edited(&mut self, edited: &EditedAgency, outcome: &mut Outcome) -> bool {
        if !self.can_patch() {
            return false;
        }
        let query = self.query();
        let Some(index) = self.rows.iter().position(|row| row.id == edited.id) else {
            // The row's short is unknown here, so any row the active filter
            // admits might match the search.
            if query.admits_active(edited.active) {
                return false;
            }
            self.pending_select = None;
            self.set_selected(self.selected_id, outcome);
            return true;
        };

        self.pending_select = None;
        if query.matches(&self.rows[index].short, &edited.name, edited.active) {
            let row = &mut self.rows[index];
            row.name.clone_from(&edited.name);
            row.kind.clone_from(&edited.kind);
            row.owned = edited.owned;
            row.active = edited.active;
            outcome.changed(Field::Rows);
            self.set_selected(Some(edited.id), outcome);
        } else {
            self.remove_row(edited.id, outcome);
        }
        true
    }

    fn remove_row(&mut self, id: AgencyId, outcome: &mut Outcome) {
        let before = self.rows.len();
        self.rows.retain(|row| row.id != id);
        if self.rows.len() != before {
            outcome.changed(Field::Rows);
        }
        if self.selected_id == Some(id) {
            assign(&mut self.selected_id, None, Field::SelectedId, outcome);
        }
        self.sync_can_create(outcome);
    }

    /// Selects `id` only when that row is loaded.
    fn set_selected(&mut self, id: Option<AgencyId>, outcome: &mut Outcome) {
        let resolved = id.filter(|id| self.rows.iter().any(|row| row.id == *id));
        assign(&mut self.selected_id, resolved, Field::SelectedId, outcome);
    }

    fn sync_busy(&mut self, outcome: &mut Outcome) {
        let busy = self.in_flight.is_some() || self.pending_delete.is_some();
        assign(&mut self.busy, busy, Field::Busy, outcome);
    }

    fn sync_can_create(&mut self, outcome: &mut Outcome) {
        let can_create = self.authorizer.has_blanket_rights()
            || self
                .rows
                .iter()
                .any(|row| self.authorizer.can_create(row.dispatch_center_id));
        assign(&mut self.can_create, can_create, Field::CanCreate, outcome);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::{Result, anyhow};

    use super::AgencyList;
    use crate::{
        AgencyId, AgencyListItem, AgencyScope, Authorizer, Completion, CreatedAgency, CurrentUser,
        DeleteOutcome, Delivery, DispatchCenterId, EditedAgency, Field, Lane, NavRequest, Outcome,
        Request, ReturnState, Target, UserRole, ViewError, ViewId,
    };

    const DEBOUNCE: Duration = Duration::from_millis(300);

    fn admin() -> Authorizer {
        Authorizer::new(CurrentUser::new("admin", UserRole::Admin))
    }

    fn item(id: i64, short: &str, active: bool) -> AgencyListItem {
        AgencyListItem {
            id: AgencyId::new(id),
            dispatch_center_id: DispatchCenterId::new(1),
            short: short.to_owned(),
            name: format!("{short} Fire"),
            kind: "fire".to_owned(),
            owned: true,
            active,
            dispatch_center_code: "RRB".to_owned(),
        }
    }

    fn generation_of(outcome: &Outcome, lane: Lane) -> Result<u64> {
        outcome
            .effects
            .iter()
            .rev()
            .find(|effect| {
                effect.request.lane() == lane && !matches!(effect.request, Request::Cancel(_))
            })
            .map(|effect| effect.generation)
            .ok_or_else(|| anyhow!("no {} effect in {outcome:?}", lane.as_str()))
    }

    fn fetches(outcome: &Outcome) -> usize {
        outcome
            .requests()
            .filter(|request| matches!(request, Request::FetchAgencies(_)))
            .count()
    }

    fn deliver(list: &mut AgencyList, generation: u64, completion: Completion) -> Outcome {
        list.deliver(Delivery {
            view: list.id(),
            generation,
            completion,
        })
    }

    fn loaded_list(items: Vec<AgencyListItem>) -> Result<AgencyList> {
        let mut list = AgencyList::new(ViewId::new(1), admin(), DEBOUNCE);
        let outcome = list.on_navigated_to(None, None);
        let generation = generation_of(&outcome, Lane::Fetch)?;
        deliver(&mut list, generation, Completion::Agencies(Ok(items)));
        Ok(list)
    }

    fn shorts(list: &AgencyList) -> Vec<&str> {
        list.rows().iter().map(|row| row.short.as_str()).collect()
    }

    fn created(id: i64, short: &str, active: bool) -> CreatedAgency {
        CreatedAgency {
            id: AgencyId::new(id),
            dispatch_center_id: DispatchCenterId::new(1),
            dispatch_center_code: "RRB".to_owned(),
            short: short.to_owned(),
            name: format!("{short} Fire"),
            kind: "fire".to_owned(),
            owned: true,
            active,
        }
    }

    fn edited(id: i64, name: &str, active: bool) -> EditedAgency {
        EditedAgency {
            id: AgencyId::new(id),
            name: name.to_owned(),
            kind: "ems".to_owned(),
            owned: false,
            active,
        }
    }

    #[test]
    fn fresh_activation_fetches_active_rows_in_current_scope() -> Result<()> {
        let mut list = AgencyList::new(ViewId::new(1), admin(), DEBOUNCE);
        let outcome = list.on_navigated_to(None, None);

        let request = outcome
            .requests()
            .next()
            .ok_or_else(|| anyhow!("expected a fetch"))?;
        let Request::FetchAgencies(query) = request else {
            return Err(anyhow!("unexpected request {request:?}"));
        };
        assert_eq!(query.scope, AgencyScope::CurrentDispatchCenter);
        assert!(query.active_only);
        assert_eq!(query.search, None);
        assert!(list.busy());
        Ok(())
    }

    #[test]
    fn created_row_is_inserted_in_short_order() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "AAA", true), item(3, "ZZZ", true)])?;
        let back = list.capture_return_state(None);
        let state = ReturnState::merged_with_created(Some(&back), created(2, "BAF", true));

        let outcome = list.on_navigated_to(Some(state), None);

        assert_eq!(shorts(&list), vec!["AAA", "BAF", "ZZZ"]);
        assert_eq!(list.selected_id(), Some(AgencyId::new(2)));
        assert_eq!(fetches(&outcome), 0);
        Ok(())
    }

    #[test]
    fn created_row_sorts_after_rows_with_the_same_short() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "BAF", true), item(4, "hbf", true)])?;
        let back = list.capture_return_state(None);
        let state = ReturnState::merged_with_created(Some(&back), created(5, "HBF", true));

        list.on_navigated_to(Some(state), None);

        let ids: Vec<i64> = list.rows().iter().map(|row| row.id.get()).collect();
        assert_eq!(ids, vec![1, 4, 5]);
        assert_eq!(list.selected_id(), Some(AgencyId::new(5)));
        Ok(())
    }

    #[test]
    fn inactive_created_row_stays_hidden_under_active_only() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "AAA", true)])?;
        let back = list.capture_return_state(None);
        let state = ReturnState::merged_with_created(Some(&back), created(2, "BAF", false));

        let outcome = list.on_navigated_to(Some(state), None);

        assert_eq!(shorts(&list), vec!["AAA"]);
        assert_eq!(list.selected_id(), None);
        assert_eq!(fetches(&outcome), 0);
        Ok(())
    }

    #[test]
    fn created_row_already_loaded_is_just_selected() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "AAA", true), item(2, "BAF", true)])?;
        let back = list.capture_return_state(None);
        let state = ReturnState::merged_with_created(Some(&back), created(2, "BAF", true));

        list.on_navigated_to(Some(state), None);

        assert_eq!(list.rows().len(), 2);
        assert_eq!(list.selected_id(), Some(AgencyId::new(2)));
        Ok(())
    }

    #[test]
    fn edited_row_deactivated_under_active_only_is_removed() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "BAF", true), item(2, "CSF", true)])?;
        list.select(Some(AgencyId::new(2)));
        let back = list.capture_return_state(Some(AgencyId::new(2)));
        let state = ReturnState::merged_with_edited(Some(&back), edited(2, "CSF Fire", false));

        let outcome = list.on_navigated_to(Some(state), None);

        assert_eq!(shorts(&list), vec!["BAF"]);
        assert_eq!(list.selected_id(), None);
        assert_eq!(fetches(&outcome), 0);
        Ok(())
    }

    #[test]
    fn edited_row_still_matching_is_patched_in_place() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "BAF", true), item(2, "CSF", true)])?;
        let back = list.capture_return_state(Some(AgencyId::new(2)));
        let state = ReturnState::merged_with_edited(Some(&back), edited(2, "Corona", true));

        let outcome = list.on_navigated_to(Some(state), None);

        let row = list
            .row(AgencyId::new(2))
            .ok_or_else(|| anyhow!("row 2 missing"))?;
        assert_eq!(row.name, "Corona");
        assert_eq!(row.kind, "ems");
        assert!(!row.owned);
        assert_eq!(list.selected_id(), Some(AgencyId::new(2)));
        assert_eq!(fetches(&outcome), 0);
        assert!(outcome.changed_fields().any(|field| field == Field::Rows));
        Ok(())
    }

    #[test]
    fn edited_row_missing_from_memory_triggers_refresh() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "BAF", true)])?;
        let back = list.capture_return_state(None);
        let state = ReturnState::merged_with_edited(Some(&back), edited(9, "Late Arrival", true));

        let outcome = list.on_navigated_to(Some(state), None);
        assert_eq!(fetches(&outcome), 1);

        let generation = generation_of(&outcome, Lane::Fetch)?;
        deliver(
            &mut list,
            generation,
            Completion::Agencies(Ok(vec![item(1, "BAF", true), item(9, "LAF", true)])),
        );
        assert_eq!(list.selected_id(), Some(AgencyId::new(9)));
        Ok(())
    }

    #[test]
    fn edited_row_missing_and_still_hidden_changes_nothing() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "BAF", true)])?;
        let back = list.capture_return_state(None);
        let state = ReturnState::merged_with_edited(Some(&back), edited(9, "Gone", false));

        let outcome = list.on_navigated_to(Some(state), None);

        assert_eq!(fetches(&outcome), 0);
        assert_eq!(shorts(&list), vec!["BAF"]);
        Ok(())
    }

    #[test]
    fn patch_falls_back_to_refresh_when_filters_differ_from_loaded_rows() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "AAA", true)])?;
        let back = ReturnState::list(
            AgencyScope::AllDispatchCenters,
            None,
            true,
            None,
        );
        let state = ReturnState::merged_with_created(Some(&back), created(2, "BAF", true));

        let outcome = list.on_navigated_to(Some(state), None);

        assert_eq!(fetches(&outcome), 1);
        assert_eq!(shorts(&list), vec!["AAA"]);
        Ok(())
    }

    #[test]
    fn return_state_round_trips_filters() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "BAF", true)])?;
        list.set_scope(AgencyScope::AllDispatchCenters);
        list.set_search_text("ba");
        list.set_active_only(false);

        let outcome = list.open_detail(AgencyId::new(1));
        let Some(NavRequest::Open {
            target,
            return_state: Some(state),
        }) = &outcome.navigation
        else {
            return Err(anyhow!("expected navigation, got {:?}", outcome.navigation));
        };
        assert_eq!(*target, Target::Detail(AgencyId::new(1)));

        let mut restored = AgencyList::new(ViewId::new(2), admin(), DEBOUNCE);
        restored.on_navigated_to(Some(state.clone()), None);
        assert_eq!(restored.scope(), AgencyScope::AllDispatchCenters);
        assert_eq!(restored.search_text(), "ba");
        assert!(!restored.active_only());
        Ok(())
    }

    #[test]
    fn rapid_search_edits_collapse_into_one_fetch() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "BAF", true)])?;
        let mut debounces = Vec::new();
        for text in ["b", "ba", "ban"] {
            let outcome = list.set_search_text(text);
            debounces.push(generation_of(&outcome, Lane::Debounce)?);
        }

        let mut total = 0;
        let mut last = Outcome::default();
        for generation in debounces {
            last = deliver(&mut list, generation, Completion::DebounceElapsed);
            total += fetches(&last);
        }

        assert_eq!(total, 1);
        let Some(Request::FetchAgencies(query)) = last.requests().next() else {
            return Err(anyhow!("last debounce should fetch"));
        };
        assert_eq!(query.search.as_deref(), Some("ban"));
        Ok(())
    }

    #[test]
    fn unchanged_filters_skip_the_fetch() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "BAF", true)])?;
        list.set_search_text("x");
        let outcome = list.set_search_text("");
        let generation = generation_of(&outcome, Lane::Debounce)?;

        let outcome = deliver(&mut list, generation, Completion::DebounceElapsed);
        assert_eq!(fetches(&outcome), 0);

        let outcome = list.refresh();
        assert_eq!(fetches(&outcome), 1);
        Ok(())
    }

    #[test]
    fn refresh_cancels_a_pending_debounce() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "BAF", true)])?;
        let typed = list.set_search_text("ba");
        let stale = generation_of(&typed, Lane::Debounce)?;

        let outcome = list.refresh();
        assert!(outcome
            .requests()
            .any(|request| *request == Request::Cancel(Lane::Debounce)));

        let late = deliver(&mut list, stale, Completion::DebounceElapsed);
        assert!(late.is_empty());
        Ok(())
    }

    #[test]
    fn stale_fetch_never_overwrites_newer_rows() -> Result<()> {
        let mut list = loaded_list(vec![])?;
        let first = generation_of(&list.refresh(), Lane::Fetch)?;
        let second = generation_of(&list.refresh(), Lane::Fetch)?;

        deliver(
            &mut list,
            second,
            Completion::Agencies(Ok(vec![item(2, "NEW", true)])),
        );
        let late = deliver(
            &mut list,
            first,
            Completion::Agencies(Ok(vec![item(1, "OLD", true)])),
        );

        assert!(late.is_empty());
        assert_eq!(shorts(&list), vec!["NEW"]);
        assert!(!list.busy());
        Ok(())
    }

    #[test]
    fn fetch_failure_keeps_rows_and_surfaces_the_message() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "BAF", true)])?;
        let generation = generation_of(&list.refresh(), Lane::Fetch)?;

        deliver(
            &mut list,
            generation,
            Completion::Agencies(Err(ViewError::Unexpected("database is locked".to_owned()))),
        );

        assert_eq!(shorts(&list), vec!["BAF"]);
        assert_eq!(list.error_message(), Some("database is locked"));
        assert!(!list.busy());
        Ok(())
    }

    #[test]
    fn cancelled_fetch_changes_nothing() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "BAF", true)])?;
        let generation = generation_of(&list.refresh(), Lane::Fetch)?;

        deliver(&mut list, generation, Completion::Agencies(Err(ViewError::Cancelled)));

        assert_eq!(shorts(&list), vec!["BAF"]);
        assert_eq!(list.error_message(), None);
        Ok(())
    }

    #[test]
    fn delete_removes_the_row_and_reports_references() -> Result<()> {
        let mut list = loaded_list(vec![item(1, "BAF", true), item(2, "CSF", true)])?;
        list.select(Some(AgencyId::new(1)));

        let generation = generation_of(&list.delete(AgencyId::new(2)), Lane::Delete)?;
        deliver(
            &mut list,
            generation,
            Completion::Deleted(Ok(DeleteOutcome::Referenced { stations: 3 })),
        );
        assert_eq!(
            list.error_message(),
            Some("Cannot delete agency CSF: 3 station(s) still reference it.")
        );
        assert_eq!(list.rows().len(), 2);

        let generation = generation_of(&list.delete(AgencyId::new(1)), Lane::Delete)?;
        deliver(&mut list, generation, Completion::Deleted(Ok(DeleteOutcome::Deleted)));
        assert_eq!(shorts(&list), vec!["CSF"]);
        assert_eq!(list.selected_id(), None);
        assert_eq!(list.error_message(), None);
        Ok(())
    }

    #[test]
    fn second_delete_waits_for_the_pending_one() -> Result<()> {
        let mut list = loaded_list(vec![
            item(1, "BAF", true),
            item(2, "CSF", true),
            item(3, "MVM", true),
        ])?;

        let generation = generation_of(&list.delete(AgencyId::new(2)), Lane::Delete)?;
        let ignored = list.delete(AgencyId::new(3));
        assert!(ignored.effects.is_empty());
        assert!(list.busy());

        deliver(&mut list, generation, Completion::Deleted(Ok(DeleteOutcome::Deleted)));
        assert_eq!(shorts(&list), vec!["BAF", "MVM"]);
        assert!(!list.busy());

        let generation = generation_of(&list.delete(AgencyId::new(3)), Lane::Delete)?;
        deliver(&mut list, generation, Completion::Deleted(Ok(DeleteOutcome::Deleted)));
        assert_eq!(shorts(&list), vec!["BAF"]);
        Ok(())
    }

    #[test]
    fn viewers_cannot_delete_or_create() -> Result<()> {
        let viewer = Authorizer::new(CurrentUser::new("view", UserRole::Viewer));
        let mut list = AgencyList::new(ViewId::new(1), viewer, DEBOUNCE);
        let generation = generation_of(&list.on_navigated_to(None, None), Lane::Fetch)?;
        deliver(
            &mut list,
            generation,
            Completion::Agencies(Ok(vec![item(1, "BAF", true)])),
        );

        assert!(!list.can_create());
        let outcome = list.delete(AgencyId::new(1));
        assert!(outcome.effects.is_empty());
        assert!(list.error_message().is_some());
        Ok(())
    }

    #[test]
    fn editors_can_create_where_rows_are_editable() -> Result<()> {
        let mut user = CurrentUser::new("ed", UserRole::Editor);
        user.editable_dispatch_centers.insert(DispatchCenterId::new(1));
        let mut list = AgencyList::new(ViewId::new(1), Authorizer::new(user), DEBOUNCE);
        assert!(!list.can_create());

        let generation = generation_of(&list.on_navigated_to(None, None), Lane::Fetch)?;
        let outcome = deliver(
            &mut list,
            generation,
            Completion::Agencies(Ok(vec![item(1, "BAF", true)])),
        );

        assert!(list.can_create());
        assert!(outcome.changed_fields().any(|field| field == Field::CanCreate));
        Ok(())
    }

    #[test]
    fn setters_emit_one_event_and_only_on_change() {
        let mut list = AgencyList::new(ViewId::new(1), admin(), DEBOUNCE);
        let outcome = list.set_active_only(true);
        assert!(outcome.is_empty());

        let outcome = list.toggle_scope();
        assert_eq!(outcome.changed_fields().collect::<Vec<_>>(), vec![Field::Scope]);
        assert_eq!(list.scope(), AgencyScope::AllDispatchCenters);
        assert!(outcome.requests().any(|request| matches!(
            request,
            Request::DebounceRefresh { delay } if *delay == DEBOUNCE
        )));
    }
}
