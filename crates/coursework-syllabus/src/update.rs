use crate::domain::{CourseId, ScheduleItem};
use crate::model::{Notice, SyllabusData, SyllabusEffect, SyllabusEvent, SyllabusModel};
use coursework_core::{First, Next, Update};

/// Transition table of the syllabus screen.
pub struct SyllabusUpdate;

impl Update for SyllabusUpdate {
    type Model = SyllabusModel;
    type Event = SyllabusEvent;
    type Effect = SyllabusEffect;
    type Flags = CourseId;

    fn init(course_id: CourseId) -> First<SyllabusModel, SyllabusEffect> {
        First::with_effects(
            SyllabusModel {
                is_loading: true,
                ..SyllabusModel::new(course_id)
            },
            [SyllabusEffect::LoadData {
                course_id,
                force_network: false,
            }],
        )
    }

    fn update(model: &SyllabusModel, event: SyllabusEvent) -> Next<SyllabusModel, SyllabusEffect> {
        match event {
            // Loaded content stays in place so it can render under the
            // loading indicator.
            SyllabusEvent::Refresh | SyllabusEvent::Retry => Next::next_with(
                SyllabusModel {
                    is_loading: true,
                    ..model.clone()
                },
                [SyllabusEffect::LoadData {
                    course_id: model.course_id,
                    force_network: true,
                }],
            ),
            SyllabusEvent::DataLoaded(data) => on_data_loaded(model, data),
            SyllabusEvent::ItemClicked(id) => match model.find_item(&id) {
                Some(item) => Next::dispatch([open_item(model, item)]),
                // Stale reference from the view.
                None => Next::no_change(),
            },
        }
    }
}

/// Entries backed by an assignment open the assignment view; everything
/// else opens the generic item view.
fn open_item(model: &SyllabusModel, item: &ScheduleItem) -> SyllabusEffect {
    match item.assignment_id {
        Some(assignment_id) => SyllabusEffect::ShowAssignmentView {
            assignment_id,
            course_id: model.course_id,
        },
        None => SyllabusEffect::ShowScheduleItemView {
            item: item.clone(),
            course_id: model.course_id,
        },
    }
}

fn on_data_loaded(
    model: &SyllabusModel,
    data: SyllabusData,
) -> Next<SyllabusModel, SyllabusEffect> {
    let refresh_failed = data.is_total_failure() && model.has_content();
    let mut next = SyllabusModel {
        is_loading: false,
        ..model.clone()
    };

    match data.course {
        Ok(course) => {
            next.course = Some(course);
            next.course_failure = None;
        }
        Err(failure) => next.course_failure = Some(failure),
    }
    match data.summary {
        Ok(items) => {
            next.summary = Some(items);
            next.summary_failure = None;
        }
        Err(failure) => next.summary_failure = Some(failure),
    }

    if refresh_failed {
        Next::next_with(next, [SyllabusEffect::ShowMessage(Notice::RefreshFailed)])
    } else {
        Next::next(next)
    }
}
