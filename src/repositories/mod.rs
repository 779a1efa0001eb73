pub mod learner_profile_repository;
pub mod question_repository;
pub mod test_attempt_repository;

pub use learner_profile_repository::{LearnerProfileRepository, MongoLearnerProfileRepository};
pub use question_repository::{MongoQuestionRepository, QuestionFilter, QuestionRepository};
pub use test_attempt_repository::{MongoTestAttemptRepository, TestAttemptRepository};
