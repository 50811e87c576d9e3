//! Concrete [`Screen`](crate::terminal::Screen)s, one per feature.

mod syllabus;

pub use syllabus::SyllabusScreen;
