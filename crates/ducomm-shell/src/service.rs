// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::future::Future;

use anyhow::Result;
use ducomm_app::{
    AgencyDetail, AgencyId, AgencyListItem, AgencyQuery, AgencyUpdate, CreateOutcome,
    DeleteOutcome, DispatchCenterInfo, NewAgency,
};
use tokio_util::sync::CancellationToken;

/// Agencies visible to the list, ordered by short.
pub trait AgencyQueryService: Send + Sync + 'static {
    fn list_agencies(
        &self,
        query: AgencyQuery,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Vec<AgencyListItem>>> + Send;
}

pub trait AgencyDetailQueryService: Send + Sync + 'static {
    fn get_agency(&self, id: AgencyId) -> impl Future<Output = Result<Option<AgencyDetail>>> + Send;
}

pub trait AgencyCommandService: Send + Sync + 'static {
    /// Resolves to false when no agency has `id`.
    fn update_agency(
        &self,
        id: AgencyId,
        update: AgencyUpdate,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn create_agency(&self, agency: NewAgency) -> impl Future<Output = Result<CreateOutcome>> + Send;

    fn delete_agency(&self, id: AgencyId) -> impl Future<Output = Result<DeleteOutcome>> + Send;
}

pub trait CurrentScopeService: Send + Sync + 'static {
    fn current_dispatch_center(
        &self,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Option<DispatchCenterInfo>>> + Send;
}

/// Everything the shell needs from the outside world.
pub trait Backend:
    AgencyQueryService + AgencyDetailQueryService + AgencyCommandService + CurrentScopeService
{
}

impl<T> Backend for T where
    T: AgencyQueryService + AgencyDetailQueryService + AgencyCommandService + CurrentScopeService
{
}
