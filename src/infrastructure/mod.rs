pub mod store;
pub mod text_extract;

pub use store::{ExamStore, MemoryStore, QuizAttempt, Syllabus};
pub use text_extract::{extract_text, DocumentKind};
