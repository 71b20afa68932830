// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use ducomm_app::{
    AgencyDetail, AgencyId, AgencyListItem, AgencyQuery, AgencyUpdate, CreateOutcome,
    DeleteOutcome, DispatchCenterInfo, NewAgency, ViewError,
};
use ducomm_db::Store;
use ducomm_shell::{
    AgencyCommandService, AgencyDetailQueryService, AgencyQueryService, CurrentScopeService,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Serves view requests from a SQLite store. Queries run on the blocking
/// pool so the shell's event loop stays responsive.
#[derive(Clone)]
pub struct DbBackend {
    store: Arc<Mutex<Store>>,
}

impl DbBackend {
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    async fn with_store<T, F>(&self, operation: &'static str, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Store) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let guard = store.lock().unwrap_or_else(PoisonError::into_inner);
            work(&guard)
        })
        .await
        .with_context(|| format!("{operation} task stopped before finishing"))?
    }
}

fn ensure_live(cancel: &CancellationToken, operation: &str) -> Result<()> {
    if cancel.is_cancelled() {
        debug!(operation, "skipping cancelled request");
        return Err(ViewError::Cancelled.into());
    }
    Ok(())
}

impl AgencyQueryService for DbBackend {
    async fn list_agencies(
        &self,
        query: AgencyQuery,
        cancel: CancellationToken,
    ) -> Result<Vec<AgencyListItem>> {
        ensure_live(&cancel, "list agencies")?;
        let rows = self
            .with_store("list agencies", move |store| store.list_agencies(&query))
            .await?;
        ensure_live(&cancel, "list agencies")?;
        Ok(rows)
    }
}

impl AgencyDetailQueryService for DbBackend {
    async fn get_agency(&self, id: AgencyId) -> Result<Option<AgencyDetail>> {
        self.with_store("load agency", move |store| store.get_agency(id))
            .await
    }
}

impl AgencyCommandService for DbBackend {
    async fn update_agency(&self, id: AgencyId, update: AgencyUpdate) -> Result<bool> {
        self.with_store("update agency", move |store| {
            store.update_agency(id, &update)
        })
        .await
    }

    async fn create_agency(&self, agency: NewAgency) -> Result<CreateOutcome> {
        self.with_store("create agency", move |store| store.create_agency(&agency))
            .await
    }

    async fn delete_agency(&self, id: AgencyId) -> Result<DeleteOutcome> {
        self.with_store("delete agency", move |store| store.delete_agency(id))
            .await
    }
}

impl CurrentScopeService for DbBackend {
    async fn current_dispatch_center(
        &self,
        cancel: CancellationToken,
    ) -> Result<Option<DispatchCenterInfo>> {
        ensure_live(&cancel, "current dispatch center")?;
        self.with_store("current dispatch center", |store| {
            store.current_dispatch_center()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::DbBackend;
    use anyhow::Result;
    use ducomm_app::{
        AgencyQuery, AgencyScope, AgencyUpdate, CreateOutcome, DeleteOutcome, NewAgency,
        ViewError,
    };
    use ducomm_db::Store;
    use ducomm_shell::{
        AgencyCommandService, AgencyDetailQueryService, AgencyQueryService, CurrentScopeService,
    };
    use tokio_util::sync::CancellationToken;

    fn demo_backend() -> Result<DbBackend> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        store.seed_demo_data()?;
        Ok(DbBackend::new(store))
    }

    #[tokio::test]
    async fn lists_current_center_agencies() -> Result<()> {
        let backend = demo_backend()?;
        let rows = backend
            .list_agencies(
                AgencyQuery::new(AgencyScope::CurrentDispatchCenter, None, true),
                CancellationToken::new(),
            )
            .await?;
        let shorts: Vec<_> = rows.iter().map(|row| row.short.as_str()).collect();
        assert_eq!(shorts, vec!["BAF", "CSF", "MVM"]);
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_list_request_reports_cancelled() -> Result<()> {
        let backend = demo_backend()?;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let error = backend
            .list_agencies(
                AgencyQuery::new(AgencyScope::AllDispatchCenters, None, false),
                cancel,
            )
            .await
            .expect_err("cancelled request should fail");
        assert_eq!(
            error.downcast_ref::<ViewError>(),
            Some(&ViewError::Cancelled)
        );
        Ok(())
    }

    #[tokio::test]
    async fn current_scope_comes_from_settings() -> Result<()> {
        let backend = demo_backend()?;
        let center = backend
            .current_dispatch_center(CancellationToken::new())
            .await?
            .expect("demo data sets a current center");
        assert_eq!(center.code, "RRB");
        Ok(())
    }

    #[tokio::test]
    async fn commands_reach_the_store() -> Result<()> {
        let backend = demo_backend()?;
        let center = backend
            .current_dispatch_center(CancellationToken::new())
            .await?
            .expect("demo data sets a current center");

        let created = backend
            .create_agency(NewAgency {
                dispatch_center_id: center.id,
                short: " bmf ".to_owned(),
                name: "Banning Mutual Fire".to_owned(),
                kind: "fire".to_owned(),
                owned: false,
                active: true,
            })
            .await?;
        let CreateOutcome::Created(id) = created else {
            panic!("expected created outcome, got {created:?}");
        };

        let detail = backend.get_agency(id).await?.expect("created agency loads");
        assert_eq!(detail.short, "BMF");
        assert_eq!(detail.dispatch_center_name, "Riverside Regional");

        let updated = backend
            .update_agency(
                id,
                AgencyUpdate {
                    name: "Banning Mutual Aid Fire".to_owned(),
                    kind: "fire".to_owned(),
                    owned: true,
                    active: false,
                },
            )
            .await?;
        assert!(updated);

        assert_eq!(backend.delete_agency(id).await?, DeleteOutcome::Deleted);
        assert!(backend.get_agency(id).await?.is_none());
        Ok(())
    }
}
