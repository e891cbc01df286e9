pub mod category;
pub mod delegation;
pub mod evaluation;
pub mod health;
pub mod mcq;

pub use category::Category;
pub use delegation::{DelegationResult, DelegationStatus};
pub use evaluation::{EvaluationResult, Grade, QuestionResult};
pub use health::{AgentsHealth, HealthState, HealthStatus};
pub use mcq::{
    AnswerOption, Difficulty, McqCandidate, McqOptions, MissingField, PublicQuizQuestion,
    QuizQuestion,
};
