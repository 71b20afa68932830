// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{DispatchCenterId, UserRole};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub username: String,
    pub role: UserRole,
    pub editable_dispatch_centers: BTreeSet<DispatchCenterId>,
    pub can_edit_all: bool,
}

impl CurrentUser {
    pub fn new(username: impl Into<String>, role: UserRole) -> Self {
        Self {
            username: username.into(),
            role,
            editable_dispatch_centers: BTreeSet::new(),
            can_edit_all: false,
        }
    }
}

/// Permission checks against an explicit user context. Views receive a clone
/// through the view factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorizer {
    user: Arc<CurrentUser>,
}

impl Authorizer {
    pub fn new(user: CurrentUser) -> Self {
        Self {
            user: Arc::new(user),
        }
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn can_edit(&self, dispatch_center_id: DispatchCenterId) -> bool {
        match self.user.role {
            UserRole::SuperAdmin | UserRole::Admin => true,
            UserRole::Editor => {
                self.user.can_edit_all
                    || self
                        .user
                        .editable_dispatch_centers
                        .contains(&dispatch_center_id)
            }
            UserRole::Viewer => false,
        }
    }

    pub fn can_create(&self, dispatch_center_id: DispatchCenterId) -> bool {
        self.can_edit(dispatch_center_id)
    }

    /// True when the user may edit every dispatch center, listed or not.
    pub fn has_blanket_rights(&self) -> bool {
        match self.user.role {
            UserRole::SuperAdmin | UserRole::Admin => true,
            UserRole::Editor => self.user.can_edit_all,
            UserRole::Viewer => false,
        }
    }
}
