//! The course syllabus screen.
//!
//! On start the screen loads the course (for its syllabus body) and the
//! course summary (assignments, quizzes, discussions and calendar events) in
//! parallel.  The summary is merged from four backend collections and can be
//! switched off per course.  Pull-to-refresh reloads everything from the
//! network while the old content stays visible, and tapping a summary row
//! opens the assignment or the schedule item behind it.
//!
//! ```rust,ignore
//! let handle = syllabus_loop(repository, router, SyllabusPresenter::new(Utc::now()))
//!     .start(CourseId(42))?;
//! ```

pub mod domain;
pub mod handler;
pub mod memory;
pub mod model;
pub mod presenter;
pub mod repository;
pub mod update;

pub use domain::{
    AssignmentId, Course, CourseId, CourseSettings, ItemKind, ScheduleItem, ScheduleItemId,
    SummarySource,
};
pub use handler::{SyllabusEffectHandler, SyllabusRouter};
pub use memory::InMemorySyllabusRepository;
pub use model::{LoadFailure, Notice, SyllabusData, SyllabusEffect, SyllabusEvent, SyllabusModel};
pub use presenter::{
    ItemIcon, ScheduleItemViewState, SyllabusContent, SyllabusPresenter, SyllabusViewState,
};
pub use repository::{RepositoryError, SyllabusRepository};
pub use update::SyllabusUpdate;

use coursework_core::{Loop, LoopHandle, LoopOptions};
use std::sync::Arc;

/// Handle of a running syllabus screen.
pub type SyllabusHandle = LoopHandle<SyllabusModel, SyllabusEvent, SyllabusViewState>;

/// Assemble an unstarted syllabus loop.
pub fn syllabus_loop(
    repository: Arc<dyn SyllabusRepository>,
    router: Arc<dyn SyllabusRouter>,
    presenter: SyllabusPresenter,
) -> Loop<SyllabusUpdate, SyllabusEffectHandler, SyllabusPresenter> {
    Loop::new(SyllabusEffectHandler::new(repository, router), presenter).with_options(
        LoopOptions {
            name: "syllabus".into(),
            ..LoopOptions::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use coursework_core::Phase;
    use futures::StreamExt;
    use std::sync::Mutex;
    use std::time::Duration;

    const COURSE: CourseId = CourseId(3);

    #[derive(Default)]
    struct RecordingRouter {
        assignments: Mutex<Vec<AssignmentId>>,
        shown: Mutex<Vec<ScheduleItemId>>,
    }

    impl SyllabusRouter for RecordingRouter {
        fn show_assignment(&self, assignment_id: AssignmentId, _course_id: CourseId) {
            self.assignments.lock().unwrap().push(assignment_id);
        }

        fn show_schedule_item(&self, item: &ScheduleItem, _course_id: CourseId) {
            self.shown.lock().unwrap().push(item.id.clone());
        }

        fn show_notice(&self, _notice: Notice) {}
    }

    fn course(body: Option<&str>) -> Course {
        Course {
            id: COURSE,
            name: "Statistics".into(),
            syllabus_body: body.map(str::to_string),
        }
    }

    fn items() -> Vec<ScheduleItem> {
        [("one", Some(AssignmentId(1))), ("two", Some(AssignmentId(2))), ("three", None)]
            .into_iter()
            .map(|(id, assignment_id)| ScheduleItem {
                id: ScheduleItemId::new(id),
                title: id.into(),
                kind: match assignment_id {
                    Some(_) => ItemKind::Assignment,
                    None => ItemKind::CalendarEvent,
                },
                date: None,
                assignment_id,
                html_url: format!("https://canvas.example/{id}"),
            })
            .collect()
    }

    fn presenter() -> SyllabusPresenter {
        SyllabusPresenter::new(Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap())
    }

    fn start(repo: Arc<InMemorySyllabusRepository>) -> (SyllabusHandle, Arc<RecordingRouter>) {
        let router = Arc::new(RecordingRouter::default());
        let handle = syllabus_loop(repo, router.clone(), presenter())
            .start(COURSE)
            .expect("inside runtime");
        (handle, router)
    }

    async fn settled(handle: &SyllabusHandle) -> Arc<SyllabusModel> {
        let mut models = handle.model_watch();
        let model = models
            .wait_for(|m| !m.is_loading)
            .await
            .expect("loop alive")
            .clone();
        model
    }

    #[tokio::test]
    async fn empty_backing_collection_shows_empty() {
        let repo = Arc::new(InMemorySyllabusRepository::new().with_course(course(None)));
        let (mut handle, _) = start(repo);

        settled(&handle).await;
        assert_eq!(
            handle.view_state(),
            SyllabusViewState::Empty { refreshing: false }
        );
        handle.stop().await.expect("clean stop");
    }

    #[tokio::test]
    async fn failing_repository_shows_error() {
        let repo = Arc::new(InMemorySyllabusRepository::new());
        repo.fail_course(Some(RepositoryError::Timeout));
        repo.fail_summary(Some(RepositoryError::Timeout));
        let (mut handle, _) = start(repo);

        let model = settled(&handle).await;
        assert!(!model.is_loading);
        assert!(matches!(
            handle.view_state(),
            SyllabusViewState::Error { .. }
        ));
        handle.stop().await.expect("clean stop");
    }

    #[tokio::test]
    async fn failed_course_with_empty_summary_offers_retry() {
        let repo = Arc::new(InMemorySyllabusRepository::new());
        repo.fail_course(Some(RepositoryError::Status(500)));
        let (mut handle, _) = start(repo);

        settled(&handle).await;
        let SyllabusViewState::Loaded(content) = handle.view_state() else {
            panic!("Expected Loaded, got {:?}", handle.view_state());
        };
        assert!(content.syllabus_unavailable);
        assert!(content.items.is_empty());
        handle.stop().await.expect("clean stop");
    }

    #[tokio::test]
    async fn hidden_summary_shows_the_body_alone() {
        let repo = Arc::new(
            InMemorySyllabusRepository::new()
                .with_course(course(Some("<p>Syllabus</p>")))
                .with_settings(COURSE, CourseSettings { course_summary: false })
                .with_summary(COURSE, items()),
        );
        let (mut handle, _) = start(repo);

        settled(&handle).await;
        let SyllabusViewState::Loaded(content) = handle.view_state() else {
            panic!("Expected Loaded, got {:?}", handle.view_state());
        };
        assert_eq!(content.body.as_deref(), Some("<p>Syllabus</p>"));
        assert!(content.items.is_empty());
        assert!(!content.summary_unavailable);
        handle.stop().await.expect("clean stop");
    }

    #[tokio::test]
    async fn click_navigates_through_router() {
        let repo = Arc::new(
            InMemorySyllabusRepository::new()
                .with_course(course(Some("<p>Syllabus</p>")))
                .with_summary(COURSE, items()),
        );
        let (mut handle, router) = start(repo.clone());
        let before = settled(&handle).await;

        handle.dispatch(SyllabusEvent::ItemClicked(ScheduleItemId::new("two")));
        handle.dispatch(SyllabusEvent::ItemClicked(ScheduleItemId::new("three")));
        handle.dispatch(SyllabusEvent::ItemClicked(ScheduleItemId::new("gone")));
        // Events apply in order, so the forced reload proves every click ran.
        handle.dispatch(SyllabusEvent::Refresh);
        for _ in 0..100 {
            if repo.forced_calls() == 6
                && !router.assignments.lock().unwrap().is_empty()
                && !router.shown.lock().unwrap().is_empty()
            {
                break;
            }
            tokio::task::yield_now().await;
        }
        settled(&handle).await;

        assert_eq!(*router.assignments.lock().unwrap(), vec![AssignmentId(2)]);
        assert_eq!(
            *router.shown.lock().unwrap(),
            vec![ScheduleItemId::new("three")]
        );
        assert_eq!(*handle.model(), *before);
        handle.stop().await.expect("clean stop");
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_shows_stale_content_while_loading() {
        let repo = Arc::new(
            InMemorySyllabusRepository::new()
                .with_course(course(Some("<p>Week 1</p>")))
                .with_summary(COURSE, items())
                .with_latency(Duration::from_millis(200), Duration::from_millis(100)),
        );
        let (mut handle, _) = start(repo.clone());
        let mut states = handle.view_states();

        assert_eq!(states.next().await, Some(SyllabusViewState::Loading));
        let Some(SyllabusViewState::Loaded(first)) = states.next().await else {
            panic!("Expected Loaded");
        };
        assert!(!first.refreshing);

        handle.dispatch(SyllabusEvent::Refresh);
        let Some(SyllabusViewState::Loaded(refreshing)) = states.next().await else {
            panic!("Expected Loaded while refreshing");
        };
        assert!(refreshing.refreshing);
        assert_eq!(refreshing.body, first.body);
        assert_eq!(refreshing.items, first.items);

        let Some(SyllabusViewState::Loaded(done)) = states.next().await else {
            panic!("Expected Loaded after refresh");
        };
        assert_eq!(done, first);
        // Course, settings and the four summary sources.
        assert_eq!(repo.forced_calls(), 6);
        handle.stop().await.expect("clean stop");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_load_discards_the_result() {
        let repo = Arc::new(
            InMemorySyllabusRepository::new()
                .with_course(course(Some("<p>Body</p>")))
                .with_latency(Duration::from_secs(1), Duration::from_secs(1)),
        );
        let (mut handle, _) = start(repo);

        handle.stop().await.expect("clean stop");
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(handle.phase(), Phase::Stopped);
        assert!(handle.model().is_loading);
        assert!(!handle.model().has_content());
        assert_eq!(handle.view_state(), SyllabusViewState::Loading);
    }
}
