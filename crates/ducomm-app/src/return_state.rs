// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AgencyId, AgencyScope, DispatchCenterId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAgency {
    pub id: AgencyId,
    pub dispatch_center_id: DispatchCenterId,
    pub dispatch_center_code: String,
    pub short: String,
    pub name: String,
    pub kind: String,
    pub owned: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedAgency {
    pub id: AgencyId,
    pub name: String,
    pub kind: String,
    pub owned: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnPayload {
    Created(CreatedAgency),
    Edited(EditedAgency),
}

/// Snapshot of the agencies list handed back and forth across navigation.
/// Never mutated once built; the `merged_*` helpers return new values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnState {
    scope: Option<AgencyScope>,
    search_text: Option<String>,
    active_only: Option<bool>,
    selected_id: Option<AgencyId>,
    payload: Option<ReturnPayload>,
}

impl ReturnState {
    pub fn list(
        scope: AgencyScope,
        search_text: Option<String>,
        active_only: bool,
        selected_id: Option<AgencyId>,
    ) -> Self {
        Self {
            scope: Some(scope),
            search_text,
            active_only: Some(active_only),
            selected_id,
            payload: None,
        }
    }

    pub fn edited(edited: EditedAgency) -> Self {
        Self {
            selected_id: Some(edited.id),
            payload: Some(ReturnPayload::Edited(edited)),
            ..Self::default()
        }
    }

    pub fn created(created: CreatedAgency) -> Self {
        Self {
            selected_id: Some(created.id),
            payload: Some(ReturnPayload::Created(created)),
            ..Self::default()
        }
    }

    /// List fields from `list` (if any), the created payload, and the new row
    /// as the selection.
    pub fn merged_with_created(list: Option<&ReturnState>, created: CreatedAgency) -> Self {
        let base = list.map(ReturnState::list_fields).unwrap_or_default();
        Self {
            selected_id: Some(created.id),
            payload: Some(ReturnPayload::Created(created)),
            ..base
        }
    }

    pub fn merged_with_edited(list: Option<&ReturnState>, edited: EditedAgency) -> Self {
        let base = list.map(ReturnState::list_fields).unwrap_or_default();
        Self {
            selected_id: Some(edited.id),
            payload: Some(ReturnPayload::Edited(edited)),
            ..base
        }
    }

    /// The same snapshot without any payload.
    pub fn list_fields(&self) -> Self {
        Self {
            scope: self.scope,
            search_text: self.search_text.clone(),
            active_only: self.active_only,
            selected_id: self.selected_id,
            payload: None,
        }
    }

    pub fn with_selected(&self, selected_id: Option<AgencyId>) -> Self {
        Self {
            selected_id,
            ..self.clone()
        }
    }

    pub fn scope(&self) -> Option<AgencyScope> {
        self.scope
    }

    pub fn search_text(&self) -> Option<&str> {
        self.search_text.as_deref()
    }

    pub fn active_only(&self) -> Option<bool> {
        self.active_only
    }

    pub fn selected_id(&self) -> Option<AgencyId> {
        self.selected_id
    }

    pub fn payload(&self) -> Option<&ReturnPayload> {
        self.payload.as_ref()
    }

    pub fn created_payload(&self) -> Option<&CreatedAgency> {
        match &self.payload {
            Some(ReturnPayload::Created(created)) => Some(created),
            _ => None,
        }
    }

    pub fn edited_payload(&self) -> Option<&EditedAgency> {
        match &self.payload {
            Some(ReturnPayload::Edited(edited)) => Some(edited),
            _ => None,
        }
    }

    /// Row the list should select after its next fetch or patch.
    pub fn pending_selection(&self) -> Option<AgencyId> {
        match &self.payload {
            Some(ReturnPayload::Created(created)) => Some(created.id),
            Some(ReturnPayload::Edited(edited)) => Some(edited.id),
            None => self.selected_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CreatedAgency, EditedAgency, ReturnPayload, ReturnState};
    use crate::{AgencyId, AgencyScope, DispatchCenterId};

    fn edited(id: i64) -> EditedAgency {
        EditedAgency {
            id: AgencyId::new(id),
            name: "Renamed".to_owned(),
            kind: "ems".to_owned(),
            owned: false,
            active: true,
        }
    }

    fn created(id: i64) -> CreatedAgency {
        CreatedAgency {
            id: AgencyId::new(id),
            dispatch_center_id: DispatchCenterId::new(1),
            dispatch_center_code: "RRB".to_owned(),
            short: "BAF".to_owned(),
            name: "Banning Fire".to_owned(),
            kind: "fire".to_owned(),
            owned: true,
            active: true,
        }
    }

    #[test]
    fn merged_edit_keeps_list_fields_and_selects_the_row() {
        let list = ReturnState::list(
            AgencyScope::AllDispatchCenters,
            Some("ba".to_owned()),
            false,
            Some(AgencyId::new(9)),
        );
        let merged = ReturnState::merged_with_edited(Some(&list), edited(2));

        assert_eq!(merged.scope(), Some(AgencyScope::AllDispatchCenters));
        assert_eq!(merged.search_text(), Some("ba"));
        assert_eq!(merged.active_only(), Some(false));
        assert_eq!(merged.selected_id(), Some(AgencyId::new(2)));
        assert_eq!(merged.edited_payload(), Some(&edited(2)));
        assert_eq!(merged.created_payload(), None);
    }

    #[test]
    fn merge_without_list_state_leaves_scope_absent() {
        let merged = ReturnState::merged_with_created(None, created(5));
        assert_eq!(merged.scope(), None);
        assert_eq!(merged.active_only(), None);
        assert!(matches!(merged.payload(), Some(ReturnPayload::Created(_))));
    }

    #[test]
    fn pending_selection_prefers_the_payload_id() {
        let list = ReturnState::list(
            AgencyScope::CurrentDispatchCenter,
            None,
            true,
            Some(AgencyId::new(1)),
        );
        assert_eq!(list.pending_selection(), Some(AgencyId::new(1)));

        let with_created = ReturnState::merged_with_created(Some(&list), created(7));
        assert_eq!(with_created.pending_selection(), Some(AgencyId::new(7)));
    }

    #[test]
    fn list_fields_drops_the_payload() {
        let state = ReturnState::edited(edited(3));
        assert_eq!(state.list_fields().payload(), None);
        assert_eq!(state.list_fields().selected_id(), Some(AgencyId::new(3)));
    }
}
