use loan_origination::applications::{
    ApplicationFilter, ApplicationId, ApplicationRecord, ApplicationRepository, NotificationError,
    NotificationSink, RepositoryError, StatusChanged,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl InMemoryApplicationRepository {
    fn records(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<ApplicationId, ApplicationRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records()?;
        if guard.contains_key(record.id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    fn update(
        &self,
        mut record: ApplicationRecord,
        expected_version: u64,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records()?;
        let found = guard
            .get(record.id())
            .map(|current| current.version)
            .ok_or(RepositoryError::NotFound)?;
        if found != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                found,
            });
        }

        record.version = found + 1;
        guard.insert(record.id().clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.records()?.get(id).cloned())
    }

    fn list(&self, filter: &ApplicationFilter) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let mut records: Vec<ApplicationRecord> = self
            .records()?
            .values()
            .filter(|record| filter.matches(&record.application))
            .cloned()
            .collect();
        records.sort_by(|left, right| left.id().cmp(right.id()));
        Ok(records)
    }
}

/// Keeps every status change in memory and mirrors it to the log.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotificationSink {
    events: Arc<Mutex<Vec<StatusChanged>>>,
}

impl NotificationSink for LoggingNotificationSink {
    fn publish(&self, event: StatusChanged) -> Result<(), NotificationError> {
        info!(
            application_id = %event.application_id,
            from = %event.from,
            to = %event.to,
            "status change notification queued"
        );
        let mut guard = self
            .events
            .lock()
            .map_err(|_| NotificationError::Transport("notification mutex poisoned".to_string()))?;
        guard.push(event);
        Ok(())
    }
}

impl LoggingNotificationSink {
    pub(crate) fn events(&self) -> Vec<StatusChanged> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}
