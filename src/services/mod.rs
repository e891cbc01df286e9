pub mod classifier;
pub mod generators;
pub mod llm_service;
pub mod scoring;
pub mod supervisor;
pub mod syllabus;

pub use classifier::TopicClassifier;
pub use generators::{GeneralGenerator, MathGenerator, McqGenerator};
pub use llm_service::{ChatModel, ChatRequest, LlmService};
pub use supervisor::Supervisor;
pub use syllabus::TopicExtractor;
