use crate::models::domain::{
    Difficulty, OptionLetter, QuestionId, QuestionRecord, Subject, Track,
};
use crate::services::question_generator::GenerationRequest;

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use std::collections::HashMap;

    /// Three topics per subject, cycled through by [`question_bank`].
    pub fn topics_for(subject: Subject) -> [&'static str; 3] {
        match subject {
            Subject::Physics => ["Motion", "Optics", "Waves"],
            Subject::Chemistry => ["Bonding", "Equilibrium", "Organic"],
            Subject::Biology => ["Genetics", "Ecology", "Cell"],
            Subject::Mathematics => ["Calculus", "Algebra", "Vectors"],
        }
    }

    /// A stored question whose correct answer is always A. The chapter is
    /// "<topic> basics".
    pub fn question(
        id: i64,
        subject: Subject,
        track: Track,
        difficulty: Difficulty,
        topic: &str,
    ) -> QuestionRecord {
        QuestionRecord {
            id: QuestionId::Persisted(id),
            subject,
            track,
            chapter: format!("{} basics", topic),
            topic: topic.to_string(),
            difficulty,
            prompt: format!("{} question {} on {}", subject, id, topic),
            options: [
                "first".to_string(),
                "second".to_string(),
                "third".to_string(),
                "fourth".to_string(),
            ],
            correct_option: OptionLetter::A,
            explanation: None,
            created_at: None,
        }
    }

    /// `per_cell` stored questions for every (subject, difficulty) of the
    /// track, ids starting at 1.
    pub fn question_bank(track: Track, per_cell: usize) -> Vec<QuestionRecord> {
        let mut bank = Vec::new();
        let mut next_id = 1;
        for &subject in track.subjects() {
            let topics = topics_for(subject);
            for difficulty in Difficulty::ALL {
                for i in 0..per_cell {
                    bank.push(question(next_id, subject, track, difficulty, topics[i % 3]));
                    next_id += 1;
                }
            }
        }
        bank
    }

    /// What a generator would hand back for `request`, `n` records long.
    pub fn generated_questions(request: &GenerationRequest, n: usize) -> Vec<QuestionRecord> {
        (0..n)
            .map(|i| QuestionRecord {
                id: QuestionId::new_transient(),
                subject: request.subject,
                track: request.track,
                chapter: "General".to_string(),
                topic: "General".to_string(),
                difficulty: request.difficulty,
                prompt: format!("Generated {} question {}", request.subject, i),
                options: [
                    "w".to_string(),
                    "x".to_string(),
                    "y".to_string(),
                    "z".to_string(),
                ],
                correct_option: OptionLetter::B,
                explanation: Some("Generated".to_string()),
                created_at: None,
            })
            .collect()
    }

    pub fn lookup_of(questions: &[QuestionRecord]) -> HashMap<QuestionId, QuestionRecord> {
        questions.iter().map(|q| (q.id, q.clone())).collect()
    }
}

#[cfg(test)]
pub mod test_helpers {
    /// Routes `log` output through the test harness; safe to call repeatedly.
    pub fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_question_bank_covers_every_cell() {
        let bank = question_bank(Track::Jee, 2);

        assert_eq!(bank.len(), 18);
        assert!(bank.iter().all(|q| q.track == Track::Jee));
        assert!(bank.iter().any(|q| q.subject == Subject::Mathematics));
        assert!(!bank.iter().any(|q| q.subject == Subject::Biology));
    }

    #[test]
    fn test_question_bank_ids_are_unique() {
        let bank = question_bank(Track::Neet, 4);
        let ids: std::collections::HashSet<_> = bank.iter().map(|q| q.id).collect();

        assert_eq!(ids.len(), bank.len());
    }

    #[test]
    fn test_generated_questions_are_transient() {
        let request = GenerationRequest::new(Track::Neet, Subject::Biology, Difficulty::Hard, 3);
        let generated = generated_questions(&request, 3);

        assert_eq!(generated.len(), 3);
        assert!(generated.iter().all(|q| q.id.is_transient()));
    }
}
