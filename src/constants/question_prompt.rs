use crate::models::domain::{Difficulty, Subject, Track};

pub const QUESTION_GENERATION_PROMPT: &str = "You are an expert exam question writer for Indian entrance examinations. You write original multiple-choice questions that match the syllabus, style and difficulty of the requested exam.

### Rules:

1. **Originality:** Every question must be new. Do not reproduce well-known textbook or past-paper questions verbatim.
2. **Format:** Every question has exactly four options. Exactly one option is correct.
3. **Answer:** Give the correct option as a single letter: A, B, C or D.
4. **Explanation:** Give a short worked explanation of why the correct option is right.
5. **Classification:** Name the chapter and the specific topic each question tests.
6. **Difficulty:** Match the requested difficulty. Easy questions test recall of a single fact or formula; Medium questions combine two steps; Hard questions need multi-step reasoning or careful reading.
7. **Output:** Reply with a single JSON object that follows the schema below. No prose, no markdown fences.

### Output schema:
";

/// Builds the user message for one batch.
pub fn question_batch_prompt(
    track: Track,
    subject: Subject,
    difficulty: Difficulty,
    count: usize,
) -> String {
    format!(
        "Generate {count} NEW {track} {subject} multiple-choice questions.\n\
         DIFFICULTY LEVEL: {difficulty}\n\
         Return exactly {count} items in the \"questions\" array."
    )
}
