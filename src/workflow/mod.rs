pub mod exam_flow;
pub mod stages;
pub mod state;

pub use exam_flow::{ExamWorkflow, WorkflowSettings};
pub use stages::Stage;
pub use state::{StateUpdate, Step, WorkflowState};
