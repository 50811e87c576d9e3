use chrono::{DateTime, Utc};
use std::fmt;

/// Numeric id of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CourseId(pub u64);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric id of an assignment, the target of the assignment details view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssignmentId(pub u64);

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a course summary entry, e.g. `assignment_42` or
/// `calendar_event_7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduleItemId(pub String);

impl ScheduleItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ScheduleItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A course as far as the syllabus screen needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    /// Raw HTML syllabus, absent when the instructor never wrote one.
    pub syllabus_body: Option<String>,
}

/// Per-course switches that affect the syllabus screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseSettings {
    /// Show the course summary under the syllabus body.
    pub course_summary: bool,
}

impl Default for CourseSettings {
    fn default() -> Self {
        Self {
            course_summary: true,
        }
    }
}

/// Kind of a summary entry; decides the icon and how it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Assignment,
    Quiz,
    Discussion,
    CalendarEvent,
}

/// Backend collection a summary entry is fetched from.
///
/// The course summary is the union of all four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SummarySource {
    Assignments,
    SubAssignments,
    CalendarEvents,
    PlannerItems,
}

impl SummarySource {
    pub const ALL: [SummarySource; 4] = [
        SummarySource::Assignments,
        SummarySource::SubAssignments,
        SummarySource::CalendarEvents,
        SummarySource::PlannerItems,
    ];
}

impl fmt::Display for SummarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SummarySource::Assignments => "assignments",
            SummarySource::SubAssignments => "sub_assignments",
            SummarySource::CalendarEvents => "calendar_events",
            SummarySource::PlannerItems => "planner_items",
        })
    }
}

/// One row of the course summary shown under the syllabus body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleItem {
    pub id: ScheduleItemId,
    pub title: String,
    pub kind: ItemKind,
    /// Due date for gradeable items, start time for calendar events.
    pub date: Option<DateTime<Utc>>,
    /// Set when the entry is backed by an assignment.
    pub assignment_id: Option<AssignmentId>,
    pub html_url: String,
}

impl ScheduleItem {
    pub fn is_gradeable(&self) -> bool {
        !matches!(self.kind, ItemKind::CalendarEvent)
    }
}
