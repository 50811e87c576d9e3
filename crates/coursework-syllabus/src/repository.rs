use crate::domain::{Course, CourseId, CourseSettings, ScheduleItem, SummarySource};
use async_trait::async_trait;

/// Failure reported by a [`SyllabusRepository`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("network unavailable: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("session is no longer authorized")]
    Unauthorized,
}

/// Data access for the syllabus screen.
///
/// Every call must be safe to repeat: pull-to-refresh and retry re-issue
/// them.  `force_network` bypasses any local cache.
#[async_trait]
pub trait SyllabusRepository: Send + Sync {
    /// The course with its syllabus body.
    async fn course(&self, id: CourseId, force_network: bool) -> Result<Course, RepositoryError>;

    /// Course switches; `course_summary` gates every [`schedule`](Self::schedule) call.
    async fn settings(
        &self,
        id: CourseId,
        force_network: bool,
    ) -> Result<CourseSettings, RepositoryError>;

    /// Summary entries from one backend collection.
    async fn schedule(
        &self,
        id: CourseId,
        source: SummarySource,
        force_network: bool,
    ) -> Result<Vec<ScheduleItem>, RepositoryError>;
}
