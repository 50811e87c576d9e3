use crate::domain::{AssignmentId, Course, CourseId, ScheduleItem, ScheduleItemId};
use crate::repository::RepositoryError;

/// Why a fetch failed, stripped of any technical detail.
///
/// This is all the model keeps of a [`RepositoryError`]; every variant is a
/// transient failure recoverable by refreshing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailure {
    Offline,
    Timeout,
    Server,
    Unauthorized,
}

impl From<&RepositoryError> for LoadFailure {
    fn from(error: &RepositoryError) -> Self {
        match error {
            RepositoryError::Network(_) => LoadFailure::Offline,
            RepositoryError::Timeout => LoadFailure::Timeout,
            RepositoryError::Status(_) => LoadFailure::Server,
            RepositoryError::Unauthorized => LoadFailure::Unauthorized,
        }
    }
}

/// Combined outcome of one load: each sub-fetch is tagged separately so a
/// partial failure is distinguishable from a total one.
#[derive(Debug, Clone, PartialEq)]
pub struct SyllabusData {
    pub course: Result<Course, LoadFailure>,
    pub summary: Result<Vec<ScheduleItem>, LoadFailure>,
}

impl SyllabusData {
    pub fn is_total_failure(&self) -> bool {
        self.course.is_err() && self.summary.is_err()
    }

    pub fn is_partial_failure(&self) -> bool {
        self.course.is_err() != self.summary.is_err()
    }
}

/// State of one syllabus screen.
///
/// Loaded parts survive failed reloads; the `*_failure` fields record how
/// the most recent fetch of each part went.
#[derive(Debug, Clone, PartialEq)]
pub struct SyllabusModel {
    pub course_id: CourseId,
    pub is_loading: bool,
    /// Last successfully loaded course; kept across failed refreshes.
    pub course: Option<Course>,
    /// Last successfully loaded summary; kept across failed refreshes.
    pub summary: Option<Vec<ScheduleItem>>,
    /// Failure of the latest course fetch, cleared by the next success.
    pub course_failure: Option<LoadFailure>,
    /// Failure of the latest summary fetch, cleared by the next success.
    pub summary_failure: Option<LoadFailure>,
}

impl SyllabusModel {
    /// Nothing loaded, not loading.
    pub fn new(course_id: CourseId) -> Self {
        Self {
            course_id,
            is_loading: false,
            course: None,
            summary: None,
            course_failure: None,
            summary_failure: None,
        }
    }

    /// Whether anything was ever loaded.
    pub fn has_content(&self) -> bool {
        self.course.is_some() || self.summary.is_some()
    }

    pub fn find_item(&self, id: &ScheduleItemId) -> Option<&ScheduleItem> {
        self.summary.as_ref()?.iter().find(|item| &item.id == id)
    }
}

/// Inputs of the syllabus screen.
#[derive(Debug, Clone, PartialEq)]
pub enum SyllabusEvent {
    /// Pull-to-refresh.
    Refresh,
    /// The retry button of the error state.
    Retry,
    DataLoaded(SyllabusData),
    ItemClicked(ScheduleItemId),
}

/// Transient messages shown over the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    RefreshFailed,
}

/// Side effects requested by [`SyllabusUpdate`](crate::update::SyllabusUpdate).
#[derive(Debug, Clone, PartialEq)]
pub enum SyllabusEffect {
    /// Fetch the course and its summary.
    LoadData {
        course_id: CourseId,
        force_network: bool,
    },
    /// Open the assignment details view.
    ShowAssignmentView {
        assignment_id: AssignmentId,
        course_id: CourseId,
    },
    /// Open a summary entry that is not backed by an assignment.
    ShowScheduleItemView {
        item: ScheduleItem,
        course_id: CourseId,
    },
    ShowMessage(Notice),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemKind;

    fn item(id: &str) -> ScheduleItem {
        ScheduleItem {
            id: ScheduleItemId::new(id),
            title: id.into(),
            kind: ItemKind::Assignment,
            date: None,
            assignment_id: None,
            html_url: format!("https://canvas.example/{id}"),
        }
    }

    #[test]
    fn failure_drops_technical_detail() {
        let failure = LoadFailure::from(&RepositoryError::Network("dns lookup failed".into()));
        assert_eq!(failure, LoadFailure::Offline);
        assert_eq!(LoadFailure::from(&RepositoryError::Status(503)), LoadFailure::Server);
    }

    #[test]
    fn partial_and_total_failures() {
        let partial = SyllabusData {
            course: Err(LoadFailure::Timeout),
            summary: Ok(vec![]),
        };
        assert!(partial.is_partial_failure());
        assert!(!partial.is_total_failure());

        let total = SyllabusData {
            course: Err(LoadFailure::Timeout),
            summary: Err(LoadFailure::Offline),
        };
        assert!(total.is_total_failure());
        assert!(!total.is_partial_failure());
    }

    #[test]
    fn find_item_without_summary() {
        let mut model = SyllabusModel::new(CourseId(1));
        assert!(model.find_item(&ScheduleItemId::new("a")).is_none());

        model.summary = Some(vec![item("a"), item("b")]);
        assert_eq!(
            model.find_item(&ScheduleItemId::new("b")).map(|i| i.title.as_str()),
            Some("b")
        );
    }
}
