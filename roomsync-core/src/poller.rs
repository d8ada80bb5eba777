//! Polling: discover resources, fetch their calendars, reconcile.
//!
//! Fetches for different resources run concurrently. Their results are
//! merged into one snapshot and reconciled in a single pass. A resource whose
//! fetch fails is skipped for this pass and excluded from removal detection,
//! so a transient provider error never shows up as a burst of deletions.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

use crate::appointment::{Appointment, ResourceId};
use crate::engine::{PassStats, Reconciler};
use crate::error::{RoomSyncError, RoomSyncResult};
use crate::gateway::{CalendarGateway, ResourceDirectory};
use crate::sink::EventSink;

/// Outcome of fetching one resource's calendar.
#[derive(Debug)]
pub struct ResourceFetch {
    pub resource: ResourceId,
    pub result: RoomSyncResult<usize>,
}

/// Outcome of one poll.
#[derive(Debug)]
pub struct PassReport {
    pub resources: Vec<ResourceFetch>,
    pub stats: PassStats,
}

impl PassReport {
    pub fn failed(&self) -> impl Iterator<Item = &ResourceFetch> {
        self.resources.iter().filter(|r| r.result.is_err())
    }
}

/// Merged result of fetching a set of resources.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub appointments: Vec<Appointment>,
    /// Resources whose fetch succeeded
    pub scope: HashSet<ResourceId>,
    pub resources: Vec<ResourceFetch>,
}

/// Fetch every resource concurrently and merge, keeping resource order.
pub async fn fetch_snapshot(
    gateway: Arc<dyn CalendarGateway>,
    resources: &[ResourceId],
    window_months: u32,
) -> Snapshot {
    let mut tasks = JoinSet::new();

    for (index, resource) in resources.iter().enumerate() {
        let gateway = Arc::clone(&gateway);
        let resource = resource.clone();
        tasks.spawn(async move {
            let result = gateway
                .list_appointments(&resource, window_months)
                .await
                .map_err(|e| e.into_fetch_error(resource.as_str()));
            (index, resource, result)
        });
    }

    let mut results = Vec::with_capacity(resources.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) => tracing::error!(error = %e, "fetch task failed"),
        }
    }
    results.sort_by_key(|(index, _, _)| *index);

    let mut snapshot = Snapshot::default();
    for (_, resource, result) in results {
        match result {
            Ok(appointments) => {
                tracing::debug!(%resource, count = appointments.len(), "fetched calendar");
                snapshot.scope.insert(resource.clone());
                snapshot.resources.push(ResourceFetch {
                    resource: resource.clone(),
                    result: Ok(appointments.len()),
                });
                snapshot
                    .appointments
                    .extend(appointments.into_iter().map(|mut appointment| {
                        appointment.resource.get_or_insert_with(|| resource.clone());
                        appointment
                    }));
            }
            Err(e) => {
                tracing::warn!(%resource, error = %e, "skipping resource this pass");
                snapshot.resources.push(ResourceFetch {
                    resource,
                    result: Err(e),
                });
            }
        }
    }

    snapshot
}

pub struct Poller<S> {
    directory: Arc<dyn ResourceDirectory>,
    gateway: Arc<dyn CalendarGateway>,
    reconciler: Reconciler<S>,
    window_months: u32,
}

impl<S: EventSink> Poller<S> {
    pub fn new(
        directory: Arc<dyn ResourceDirectory>,
        gateway: Arc<dyn CalendarGateway>,
        reconciler: Reconciler<S>,
        window_months: u32,
    ) -> Self {
        Poller {
            directory,
            gateway,
            reconciler,
            window_months,
        }
    }

    pub fn reconciler(&self) -> &Reconciler<S> {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut Reconciler<S> {
        &mut self.reconciler
    }

    pub async fn poll_once(&mut self) -> RoomSyncResult<PassReport> {
        self.poll_once_as_of(Local::now().date_naive()).await
    }

    /// One pass. A directory failure aborts the pass before anything is
    /// fetched; fetch failures only drop the affected resources.
    pub async fn poll_once_as_of(&mut self, today: NaiveDate) -> RoomSyncResult<PassReport> {
        let resources = self
            .directory
            .list_resources()
            .await
            .map_err(RoomSyncError::into_directory_error)?;

        let snapshot =
            fetch_snapshot(Arc::clone(&self.gateway), &resources, self.window_months).await;

        let stats =
            self.reconciler
                .reconcile_scoped(&snapshot.appointments, &snapshot.scope, today)?;

        Ok(PassReport {
            resources: snapshot.resources,
            stats,
        })
    }

    /// Poll every `interval` until `shutdown` resolves.
    ///
    /// Shutdown is only observed between passes. Failed passes are logged and
    /// retried on the next tick.
    pub async fn run<F, C>(&mut self, interval: Duration, shutdown: F, mut on_pass: C)
    where
        F: Future<Output = ()>,
        C: FnMut(&PassReport, &Reconciler<S>),
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested, stopping poll loop");
                    break;
                }
                _ = ticker.tick() => {
                    match self.poll_once().await {
                        Ok(report) => on_pass(&report, &self.reconciler),
                        Err(e) => tracing::error!(error = %e, "poll pass failed"),
                    }
                }
            }
        }
    }
}
