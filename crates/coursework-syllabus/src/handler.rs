use crate::domain::{
    AssignmentId, CourseId, CourseSettings, ScheduleItem, SummarySource,
};
use crate::model::{LoadFailure, Notice, SyllabusData, SyllabusEffect, SyllabusEvent};
use crate::repository::{RepositoryError, SyllabusRepository};
use coursework_core::{EffectHandler, Work};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Navigation and messaging collaborator of the syllabus screen.
///
/// Every call is a hand-off: it returns once the request is queued with
/// the host's navigation stack or snackbar.
pub trait SyllabusRouter: Send + Sync {
    fn show_assignment(&self, assignment_id: AssignmentId, course_id: CourseId);
    fn show_schedule_item(&self, item: &ScheduleItem, course_id: CourseId);
    fn show_notice(&self, notice: Notice);
}

/// Executes syllabus effects against a repository and a router.
pub struct SyllabusEffectHandler {
    repository: Arc<dyn SyllabusRepository>,
    router: Arc<dyn SyllabusRouter>,
    timeout: Option<Duration>,
}

impl SyllabusEffectHandler {
    pub fn new(repository: Arc<dyn SyllabusRepository>, router: Arc<dyn SyllabusRouter>) -> Self {
        Self {
            repository,
            router,
            timeout: None,
        }
    }

    /// Bound each repository call; an expired call counts as
    /// [`LoadFailure::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn load(&self, course_id: CourseId, force_network: bool) -> Work<SyllabusEvent> {
        let repository = self.repository.clone();
        let timeout = self.timeout;
        Work::perform(
            async move {
                let (course, summary) = futures::join!(
                    bounded(timeout, repository.course(course_id, force_network)),
                    summary(repository.as_ref(), timeout, course_id, force_network),
                );
                SyllabusData {
                    course: course.map_err(|e| to_failure(course_id, "course", &e)),
                    summary: summary.map_err(|e| to_failure(course_id, "summary", &e)),
                }
            },
            SyllabusEvent::DataLoaded,
        )
    }
}

impl EffectHandler for SyllabusEffectHandler {
    type Effect = SyllabusEffect;
    type Event = SyllabusEvent;

    fn handle(&self, effect: SyllabusEffect) -> Work<SyllabusEvent> {
        match effect {
            SyllabusEffect::LoadData {
                course_id,
                force_network,
            } => self.load(course_id, force_network),
            SyllabusEffect::ShowAssignmentView {
                assignment_id,
                course_id,
            } => {
                let router = self.router.clone();
                Work::spawn(async move { router.show_assignment(assignment_id, course_id) })
            }
            SyllabusEffect::ShowScheduleItemView { item, course_id } => {
                let router = self.router.clone();
                Work::spawn(async move { router.show_schedule_item(&item, course_id) })
            }
            SyllabusEffect::ShowMessage(notice) => {
                let router = self.router.clone();
                Work::spawn(async move { router.show_notice(notice) })
            }
        }
    }
}

/// The course summary: every source fetched in parallel and merged.
///
/// Courses that hide their summary yield an empty list without touching
/// the sources.  Unreadable settings leave the summary on.  A failing
/// source is skipped; only when all of them fail is the summary a failure.
async fn summary(
    repository: &dyn SyllabusRepository,
    timeout: Option<Duration>,
    course_id: CourseId,
    force_network: bool,
) -> Result<Vec<ScheduleItem>, RepositoryError> {
    let settings = bounded(timeout, repository.settings(course_id, force_network))
        .await
        .unwrap_or_else(|error| {
            warn!(%course_id, %error, "course settings unavailable");
            CourseSettings::default()
        });
    if !settings.course_summary {
        return Ok(Vec::new());
    }

    let fetches = SummarySource::ALL.map(|source| async move {
        let result = bounded(timeout, repository.schedule(course_id, source, force_network)).await;
        (source, result)
    });

    let mut items = Vec::new();
    let mut failure = None;
    let mut loaded = 0usize;
    for (source, result) in futures::future::join_all(fetches).await {
        match result {
            Ok(batch) => {
                loaded += 1;
                items.extend(batch);
            }
            Err(error) => {
                warn!(%course_id, %source, %error, "summary source failed");
                failure = failure.or(Some(error));
            }
        }
    }
    if let (0, Some(error)) = (loaded, failure) {
        return Err(error);
    }

    // Sources overlap (a planner item may mirror an assignment).
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.id.clone()));
    items.sort_by_key(|item| (item.date.is_none(), item.date));
    Ok(items)
}

async fn bounded<T>(
    timeout: Option<Duration>,
    call: impl Future<Output = Result<T, RepositoryError>>,
) -> Result<T, RepositoryError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(RepositoryError::Timeout)),
        None => call.await,
    }
}

fn to_failure(course_id: CourseId, part: &str, error: &RepositoryError) -> LoadFailure {
    warn!(%course_id, part, %error, "syllabus fetch failed");
    LoadFailure::from(error)
}
