use crate::domain::{ItemKind, ScheduleItem, ScheduleItemId};
use crate::model::SyllabusModel;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use coursework_core::Presenter;
use std::cmp::Ordering;

pub const ERROR_MESSAGE: &str = "There was an error loading the syllabus.";
pub const RETRY_LABEL: &str = "Retry";
pub const NO_DUE_DATE: &str = "No Due Date";
pub const DEFAULT_COURSE_COLOR: &str = "#394B58";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemIcon {
    Assignment,
    Quiz,
    Discussion,
    Calendar,
}

impl From<ItemKind> for ItemIcon {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Assignment => ItemIcon::Assignment,
            ItemKind::Quiz => ItemIcon::Quiz,
            ItemKind::Discussion => ItemIcon::Discussion,
            ItemKind::CalendarEvent => ItemIcon::Calendar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleItemViewState {
    pub id: ScheduleItemId,
    pub title: String,
    pub icon: ItemIcon,
    pub date_text: String,
    pub overdue: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllabusContent {
    pub course_name: Option<String>,
    pub course_color: String,
    /// Syllabus HTML, `None` when missing, blank or not loaded.
    pub body: Option<String>,
    pub items: Vec<ScheduleItemViewState>,
    /// A reload is running over this content.
    pub refreshing: bool,
    /// The summary could not be loaded; the body is shown alone.
    pub summary_unavailable: bool,
    /// The course could not be loaded; only the summary is shown.
    pub syllabus_unavailable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyllabusViewState {
    Loading,
    Empty { refreshing: bool },
    Error { message: String, retry_label: String },
    Loaded(SyllabusContent),
}

/// Projects a [`SyllabusModel`] for display.
///
/// Dates are formatted in the user's UTC offset and compared to a fixed
/// reference instant, both supplied by the caller, so projecting the same
/// model always gives the same result.
pub struct SyllabusPresenter {
    now: DateTime<Utc>,
    offset: FixedOffset,
    course_color: String,
}

impl SyllabusPresenter {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            offset: Utc.fix(),
            course_color: DEFAULT_COURSE_COLOR.into(),
        }
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_course_color(mut self, color: impl Into<String>) -> Self {
        self.course_color = color.into();
        self
    }

    fn content(&self, model: &SyllabusModel) -> SyllabusContent {
        let body = model
            .course
            .as_ref()
            .and_then(|c| c.syllabus_body.as_deref())
            .filter(|body| !body.trim().is_empty())
            .map(str::to_string);

        let mut items: Vec<&ScheduleItem> = model.summary.iter().flatten().collect();
        items.sort_by(|a, b| by_date_then_title(a, b));

        SyllabusContent {
            course_name: model.course.as_ref().map(|c| c.name.clone()),
            course_color: self.course_color.clone(),
            body,
            items: items.into_iter().map(|item| self.item(item)).collect(),
            refreshing: model.is_loading,
            summary_unavailable: model.summary.is_none() && model.summary_failure.is_some(),
            syllabus_unavailable: model.course.is_none() && model.course_failure.is_some(),
        }
    }

    fn item(&self, item: &ScheduleItem) -> ScheduleItemViewState {
        ScheduleItemViewState {
            id: item.id.clone(),
            title: item.title.clone(),
            icon: item.kind.into(),
            date_text: self.date_text(item),
            overdue: item.is_gradeable() && item.date.is_some_and(|due| due < self.now),
        }
    }

    fn date_text(&self, item: &ScheduleItem) -> String {
        let Some(date) = item.date else {
            return NO_DUE_DATE.to_string();
        };
        let local = date.with_timezone(&self.offset);
        let formatted = local.format("%b %-d, %Y at %-I:%M %p");
        if item.is_gradeable() {
            format!("Due {formatted}")
        } else {
            formatted.to_string()
        }
    }
}

impl Presenter for SyllabusPresenter {
    type Model = SyllabusModel;
    type ViewState = SyllabusViewState;

    fn present(&self, model: &SyllabusModel) -> SyllabusViewState {
        if !model.has_content() {
            return if model.is_loading {
                SyllabusViewState::Loading
            } else {
                SyllabusViewState::Error {
                    message: ERROR_MESSAGE.into(),
                    retry_label: RETRY_LABEL.into(),
                }
            };
        }

        // A failed half is never reported as an empty course.
        let content = self.content(model);
        if content.body.is_none()
            && content.items.is_empty()
            && !content.summary_unavailable
            && !content.syllabus_unavailable
        {
            SyllabusViewState::Empty {
                refreshing: content.refreshing,
            }
        } else {
            SyllabusViewState::Loaded(content)
        }
    }
}

/// Dated items first, oldest first; undated items last.  Ties break on
/// title, then id.
fn by_date_then_title(a: &ScheduleItem, b: &ScheduleItem) -> Ordering {
    let by_date = match (a.date, b.date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
}
