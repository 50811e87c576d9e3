//! Syllabus screen over an in-memory repository.
//!
//! Run with `cargo run -p coursework --example syllabus`.  The first
//! refresh fails, so both the stale-content snackbar path and the recovery
//! can be tried.  Set `COURSEWORK_LOG=/tmp/coursework.log` to see the loop's
//! trace.

use chrono::{TimeDelta, Utc};
use coursework::screens::SyllabusScreen;
use coursework::syllabus::{
    syllabus_loop, AssignmentId, Course, CourseId, InMemorySyllabusRepository, ItemKind, Notice,
    RepositoryError, ScheduleItem, ScheduleItemId, SummarySource, SyllabusPresenter,
    SyllabusRouter,
};
use coursework::terminal::{run_screen, TerminalError, TerminalOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const COURSE: CourseId = CourseId(101);

struct LoggingRouter {
    notices: AtomicUsize,
    repository: Arc<InMemorySyllabusRepository>,
}

impl SyllabusRouter for LoggingRouter {
    fn show_assignment(&self, assignment_id: AssignmentId, course_id: CourseId) {
        info!(%assignment_id, %course_id, "open assignment");
    }

    fn show_schedule_item(&self, item: &ScheduleItem, course_id: CourseId) {
        info!(id = %item.id, %course_id, url = %item.html_url, "open schedule item");
    }

    fn show_notice(&self, notice: Notice) {
        info!(?notice, "snackbar");
        // Heal the repository after a failed refresh so the next one works.
        self.notices.fetch_add(1, Ordering::SeqCst);
        self.repository.fail_course(None);
        self.repository.fail_summary(None);
    }
}

fn sample_items() -> Vec<ScheduleItem> {
    let now = Utc::now();
    let item = |id: &str, title: &str, kind: ItemKind, offset: Option<i64>| ScheduleItem {
        id: ScheduleItemId::new(id),
        title: title.into(),
        kind,
        date: offset.map(|days| now + TimeDelta::days(days)),
        assignment_id: id
            .rsplit_once('_')
            .filter(|_| kind != ItemKind::CalendarEvent)
            .and_then(|(_, n)| n.parse().ok())
            .map(AssignmentId),
        html_url: format!("https://canvas.example/courses/101/{id}"),
    };
    vec![
        item("assignment_1", "Lab safety essay", ItemKind::Assignment, Some(-3)),
        item("quiz_1", "Cell structure quiz", ItemKind::Quiz, Some(2)),
        item("discussion_1", "Introduce yourself", ItemKind::Discussion, None),
        item("event_1", "Field trip", ItemKind::CalendarEvent, Some(9)),
        item("assignment_2", "Microscope report", ItemKind::Assignment, Some(14)),
    ]
}

#[tokio::main]
async fn main() -> Result<(), TerminalError> {
    coursework::logging::init_file_logging();

    let repository = Arc::new(
        InMemorySyllabusRepository::new()
            .with_course(Course {
                id: COURSE,
                name: "Introduction to Biology".into(),
                syllabus_body: Some(
                    "<h2>Welcome</h2><p>Labs meet on Fridays.</p>\
                     <p>Bring goggles &amp; a notebook.</p>"
                        .into(),
                ),
            })
            .with_summary(COURSE, sample_items())
            .with_source(
                COURSE,
                SummarySource::PlannerItems,
                vec![ScheduleItem {
                    id: ScheduleItemId::new("planner_note_1"),
                    title: "Review chapter 3".into(),
                    kind: ItemKind::Assignment,
                    date: Some(Utc::now() + TimeDelta::days(5)),
                    assignment_id: None,
                    html_url: "https://canvas.example/planner/notes/1".into(),
                }],
            )
            .with_latency(Duration::from_millis(800), Duration::from_millis(400)),
    );
    let router = Arc::new(LoggingRouter {
        notices: AtomicUsize::new(0),
        repository: repository.clone(),
    });

    let handle = syllabus_loop(
        repository.clone(),
        router.clone(),
        SyllabusPresenter::new(Utc::now()),
    )
    .start(COURSE)?;

    // Once the first load lands, break the repository: the next refresh
    // fails entirely and the content stays on screen.
    let mut models = handle.model_watch();
    let failing = repository.clone();
    tokio::spawn(async move {
        if models.wait_for(|m| !m.is_loading).await.is_ok() {
            failing.fail_course(Some(RepositoryError::Network("offline".into())));
            failing.fail_summary(Some(RepositoryError::Timeout));
        }
    });

    let options = TerminalOptions {
        title: Some("Syllabus".into()),
        ..TerminalOptions::default()
    };
    run_screen(handle, SyllabusScreen::new(), options).await?;

    info!(notices = router.notices.load(Ordering::SeqCst), "demo finished");
    Ok(())
}
