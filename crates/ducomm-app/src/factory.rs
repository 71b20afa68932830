// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use crate::{
    AgencyCreateView, AgencyDetailView, AgencyEditView, AgencyId, AgencyList, Authorizer, Target,
    View, ViewId,
};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Builds views with fresh ids and the shared authorization context.
#[derive(Debug, Clone)]
pub struct ViewFactory {
    authorizer: Authorizer,
    search_debounce: Duration,
    next_id: u64,
}

impl ViewFactory {
    pub fn new(authorizer: Authorizer) -> Self {
        Self {
            authorizer,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            next_id: 0,
        }
    }

    pub fn with_search_debounce(mut self, search_debounce: Duration) -> Self {
        self.search_debounce = search_debounce;
        self
    }

    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    pub fn search_debounce(&self) -> Duration {
        self.search_debounce
    }

    fn allocate(&mut self) -> ViewId {
        self.next_id += 1;
        ViewId::new(self.next_id)
    }

    pub fn agencies(&mut self) -> AgencyList {
        let id = self.allocate();
        AgencyList::new(id, self.authorizer.clone(), self.search_debounce)
    }

    pub fn create(&mut self) -> AgencyCreateView {
        let id = self.allocate();
        AgencyCreateView::new(id, self.authorizer.clone())
    }

    pub fn detail(&mut self, agency_id: AgencyId) -> AgencyDetailView {
        let id = self.allocate();
        AgencyDetailView::new(id, agency_id, self.authorizer.clone())
    }

    pub fn edit(&mut self, agency_id: AgencyId) -> AgencyEditView {
        let id = self.allocate();
        AgencyEditView::new(id, agency_id, self.authorizer.clone())
    }

    pub fn build(&mut self, target: Target) -> View {
        match target {
            Target::Agencies => View::Agencies(self.agencies()),
            Target::Detail(agency_id) => View::Detail(self.detail(agency_id)),
            Target::Edit(agency_id) => View::Edit(self.edit(agency_id)),
            Target::Create => View::Create(self.create()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_SEARCH_DEBOUNCE, ViewFactory};
    use crate::{AgencyId, Authorizer, CurrentUser, Target, UserRole, ViewKind};

    fn factory() -> ViewFactory {
        ViewFactory::new(Authorizer::new(CurrentUser::new("op", UserRole::Admin)))
    }

    #[test]
    fn every_view_gets_a_fresh_id() {
        let mut factory = factory();
        let first = factory.build(Target::Agencies);
        let second = factory.build(Target::Agencies);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn build_maps_targets_to_view_kinds() {
        let mut factory = factory();
        let id = AgencyId::new(4);
        assert_eq!(factory.build(Target::Detail(id)).kind(), ViewKind::Detail);
        assert_eq!(factory.build(Target::Edit(id)).kind(), ViewKind::Edit);
        assert_eq!(factory.build(Target::Create).kind(), ViewKind::Create);
        assert_eq!(factory.build(Target::Agencies).kind(), ViewKind::Agencies);
    }

    #[test]
    fn debounce_defaults_to_three_hundred_millis() {
        assert_eq!(factory().search_debounce(), DEFAULT_SEARCH_DEBOUNCE);
        assert_eq!(DEFAULT_SEARCH_DEBOUNCE.as_millis(), 300);
    }
}
