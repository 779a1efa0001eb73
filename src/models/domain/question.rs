use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Subject {
    Physics,
    Chemistry,
    Biology,
    Mathematics,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
            Subject::Biology => "Biology",
            Subject::Mathematics => "Mathematics",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "physics" => Ok(Subject::Physics),
            "chemistry" => Ok(Subject::Chemistry),
            "biology" => Ok(Subject::Biology),
            "mathematics" | "maths" | "math" => Ok(Subject::Mathematics),
            other => Err(AppError::ValidationError(format!("Unknown subject '{}'", other))),
        }
    }
}

/// The two exam curricula.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Track {
    #[serde(rename = "NEET")]
    Neet,
    #[serde(rename = "JEE")]
    Jee,
}

const NEET_SUBJECTS: [Subject; 3] = [Subject::Physics, Subject::Chemistry, Subject::Biology];
const JEE_SUBJECTS: [Subject; 3] = [Subject::Physics, Subject::Chemistry, Subject::Mathematics];

impl Track {
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Neet => "NEET",
            Track::Jee => "JEE",
        }
    }

    pub fn subjects(&self) -> &'static [Subject] {
        match self {
            Track::Neet => &NEET_SUBJECTS,
            Track::Jee => &JEE_SUBJECTS,
        }
    }

    pub fn offers(&self, subject: Subject) -> bool {
        self.subjects().contains(&subject)
    }

    /// Lenient lookup used where an unknown track must degrade to an empty
    /// result instead of an error.
    pub fn parse(name: &str) -> Option<Track> {
        name.parse().ok()
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Track {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEET" => Ok(Track::Neet),
            "JEE" => Ok(Track::Jee),
            other => Err(AppError::ValidationError(format!("Unknown track '{}'", other))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(AppError::ValidationError(format!("Unknown difficulty '{}'", other))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl TryFrom<char> for OptionLetter {
    type Error = AppError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c.to_ascii_uppercase() {
            'A' => Ok(OptionLetter::A),
            'B' => Ok(OptionLetter::B),
            'C' => Ok(OptionLetter::C),
            'D' => Ok(OptionLetter::D),
            other => Err(AppError::ValidationError(format!(
                "Option must be one of A-D, got '{}'",
                other
            ))),
        }
    }
}

impl FromStr for OptionLetter {
    type Err = AppError;

    /// Takes the first letter, so "b", "B)" and "B. 4 N" all parse as B.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first = s
            .trim()
            .chars()
            .next()
            .ok_or_else(|| AppError::ValidationError("Empty option letter".to_string()))?;
        OptionLetter::try_from(first)
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            OptionLetter::A => "A",
            OptionLetter::B => "B",
            OptionLetter::C => "C",
            OptionLetter::D => "D",
        };
        f.write_str(letter)
    }
}

/// Persisted questions use the repository's integer ids; generated questions
/// get a uuid that is only meaningful inside one assembled test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QuestionId {
    Persisted(i64),
    Transient(Uuid),
}

impl QuestionId {
    pub fn new_transient() -> Self {
        QuestionId::Transient(Uuid::new_v4())
    }

    pub fn persisted(&self) -> Option<i64> {
        match self {
            QuestionId::Persisted(id) => Some(*id),
            QuestionId::Transient(_) => None,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, QuestionId::Transient(_))
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionId::Persisted(id) => write!(f, "{}", id),
            QuestionId::Transient(uuid) => write!(f, "gen-{}", uuid),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub subject: Subject,
    pub track: Track,
    pub chapter: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub prompt: String,
    pub options: [String; 4],
    pub correct_option: OptionLetter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl QuestionRecord {
    pub fn is_correct(&self, given: OptionLetter) -> bool {
        self.correct_option == given
    }
}
