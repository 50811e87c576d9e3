//! In-memory [`SyllabusRepository`] for demos and tests.

use crate::domain::{Course, CourseId, CourseSettings, ItemKind, ScheduleItem, SummarySource};
use crate::repository::{RepositoryError, SyllabusRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Default)]
struct Store {
    courses: HashMap<CourseId, Course>,
    settings: HashMap<CourseId, CourseSettings>,
    schedules: HashMap<(CourseId, SummarySource), Vec<ScheduleItem>>,
    course_failure: Option<RepositoryError>,
    settings_failure: Option<RepositoryError>,
    source_failures: HashMap<SummarySource, RepositoryError>,
}

/// A repository backed by hash maps, with injectable failures and latency.
///
/// A course without stored settings shows its summary; a source without
/// stored entries is empty; an unknown course yields `Status(404)`.
#[derive(Default)]
pub struct InMemorySyllabusRepository {
    store: Mutex<Store>,
    course_latency: Duration,
    summary_latency: Duration,
    calls: AtomicUsize,
    forced_calls: AtomicUsize,
}

impl InMemorySyllabusRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_course(self, course: Course) -> Self {
        self.lock().courses.insert(course.id, course);
        self
    }

    pub fn with_settings(self, id: CourseId, settings: CourseSettings) -> Self {
        self.lock().settings.insert(id, settings);
        self
    }

    /// Store summary entries, filed under the source their kind comes
    /// from: calendar events under [`SummarySource::CalendarEvents`],
    /// everything else under [`SummarySource::Assignments`].
    pub fn with_summary(self, id: CourseId, items: Vec<ScheduleItem>) -> Self {
        self.set_summary(id, items);
        self
    }

    pub fn with_source(self, id: CourseId, source: SummarySource, items: Vec<ScheduleItem>) -> Self {
        self.lock().schedules.insert((id, source), items);
        self
    }

    /// Delay applied to every course call and to every schedule call.
    pub fn with_latency(mut self, course: Duration, summary: Duration) -> Self {
        self.course_latency = course;
        self.summary_latency = summary;
        self
    }

    /// Make every following course call fail with `error` (`None` heals).
    pub fn fail_course(&self, error: Option<RepositoryError>) {
        self.lock().course_failure = error;
    }

    pub fn fail_settings(&self, error: Option<RepositoryError>) {
        self.lock().settings_failure = error;
    }

    /// Make every source of the summary fail with `error` (`None` heals).
    pub fn fail_summary(&self, error: Option<RepositoryError>) {
        for source in SummarySource::ALL {
            self.fail_source(source, error.clone());
        }
    }

    pub fn fail_source(&self, source: SummarySource, error: Option<RepositoryError>) {
        let mut store = self.lock();
        match error {
            Some(error) => store.source_failures.insert(source, error),
            None => store.source_failures.remove(&source),
        };
    }

    /// Replace the whole summary of a course, filed as in [`with_summary`](Self::with_summary).
    pub fn set_summary(&self, id: CourseId, items: Vec<ScheduleItem>) {
        let mut store = self.lock();
        store.schedules.retain(|(course, _), _| *course != id);
        for item in items {
            let source = match item.kind {
                ItemKind::CalendarEvent => SummarySource::CalendarEvents,
                _ => SummarySource::Assignments,
            };
            store.schedules.entry((id, source)).or_default().push(item);
        }
    }

    /// Total calls served, successful or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that asked to bypass the cache.
    pub fn forced_calls(&self) -> usize {
        self.forced_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, force_network: bool) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if force_network {
            self.forced_calls.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl SyllabusRepository for InMemorySyllabusRepository {
    async fn course(&self, id: CourseId, force_network: bool) -> Result<Course, RepositoryError> {
        self.record(force_network);
        if !self.course_latency.is_zero() {
            tokio::time::sleep(self.course_latency).await;
        }
        let store = self.lock();
        if let Some(error) = &store.course_failure {
            return Err(error.clone());
        }
        store
            .courses
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::Status(404))
    }

    async fn settings(
        &self,
        id: CourseId,
        force_network: bool,
    ) -> Result<CourseSettings, RepositoryError> {
        self.record(force_network);
        let store = self.lock();
        if let Some(error) = &store.settings_failure {
            return Err(error.clone());
        }
        Ok(store.settings.get(&id).copied().unwrap_or_default())
    }

    async fn schedule(
        &self,
        id: CourseId,
        source: SummarySource,
        force_network: bool,
    ) -> Result<Vec<ScheduleItem>, RepositoryError> {
        self.record(force_network);
        if !self.summary_latency.is_zero() {
            tokio::time::sleep(self.summary_latency).await;
        }
        let store = self.lock();
        if let Some(error) = store.source_failures.get(&source) {
            return Err(error.clone());
        }
        Ok(store.schedules.get(&(id, source)).cloned().unwrap_or_default())
    }
}
