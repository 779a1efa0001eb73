pub mod learner_profile;
pub mod marking;
pub mod question;
pub mod test_attempt;
pub use learner_profile::{LearnerProfile, ProficiencyLevel, TopicMap};
pub use marking::{ExamPreset, MarkingScheme};
pub use question::{Difficulty, OptionLetter, QuestionId, QuestionRecord, Subject, Track};
pub use test_attempt::{AnswerSheet, AttemptKind, AttemptRecord, SubjectScore, TestSession};
