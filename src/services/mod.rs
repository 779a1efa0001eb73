pub mod distribution_planner;
pub mod exam_session_service;
pub mod performance_analyzer;
pub mod question_generator;
pub mod question_selector;
pub mod scoring_service;
pub mod test_assembly_service;

pub use distribution_planner::{Distribution, DistributionPlanner, DifficultyMix};
pub use exam_session_service::{ExamSessionService, SessionPolicy};
pub use performance_analyzer::PerformanceAnalyzer;
pub use question_generator::{GenerationRequest, OpenAiQuestionGenerator, QuestionGenerator};
pub use question_selector::{QuestionSelector, SelectionPolicy};
pub use scoring_service::ScoringService;
pub use test_assembly_service::{AssemblyPolicy, TestAssemblyService};
