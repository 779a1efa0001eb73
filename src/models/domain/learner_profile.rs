use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

use crate::models::domain::question::{Subject, Track};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ProficiencyLevel {
    /// Thresholds on score / max score: 0.8 and above is Advanced, 0.6 and
    /// above Intermediate.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.8 {
            ProficiencyLevel::Advanced
        } else if ratio >= 0.6 {
            ProficiencyLevel::Intermediate
        } else {
            ProficiencyLevel::Beginner
        }
    }
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProficiencyLevel::Beginner => "Beginner",
            ProficiencyLevel::Intermediate => "Intermediate",
            ProficiencyLevel::Advanced => "Advanced",
        };
        f.write_str(s)
    }
}

/// Subject -> topic names.
pub type TopicMap = BTreeMap<Subject, BTreeSet<String>>;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct LearnerProfile {
    pub id: String,
    pub track: Track,
    pub proficiency_level: ProficiencyLevel,
    #[serde(default)]
    pub initial_assessment_score: Option<i32>,
    #[serde(default)]
    pub weak_topics: TopicMap,
    #[serde(default)]
    pub strong_topics: TopicMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl LearnerProfile {
    pub fn new(track: Track) -> Self {
        LearnerProfile {
            id: Uuid::new_v4().to_string(),
            track,
            proficiency_level: ProficiencyLevel::Beginner,
            initial_assessment_score: None,
            weak_topics: TopicMap::new(),
            strong_topics: TopicMap::new(),
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn has_completed_initial_assessment(&self) -> bool {
        self.initial_assessment_score.is_some()
    }

    pub fn weak_topics_for(&self, subject: Subject) -> Option<&BTreeSet<String>> {
        self.weak_topics.get(&subject).filter(|topics| !topics.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_thresholds() {
        assert_eq!(ProficiencyLevel::from_ratio(0.84), ProficiencyLevel::Advanced);
        assert_eq!(ProficiencyLevel::from_ratio(0.8), ProficiencyLevel::Advanced);
        assert_eq!(ProficiencyLevel::from_ratio(0.64), ProficiencyLevel::Intermediate);
        assert_eq!(ProficiencyLevel::from_ratio(0.4), ProficiencyLevel::Beginner);
        assert_eq!(ProficiencyLevel::from_ratio(-0.2), ProficiencyLevel::Beginner);
    }

    #[test]
    fn new_profile_starts_as_beginner_without_initial_score() {
        let profile = LearnerProfile::new(Track::Neet);

        assert_eq!(profile.proficiency_level, ProficiencyLevel::Beginner);
        assert!(!profile.has_completed_initial_assessment());
        assert!(profile.weak_topics.is_empty());
    }

    #[test]
    fn empty_weak_topic_set_is_treated_as_absent() {
        let mut profile = LearnerProfile::new(Track::Jee);
        profile.weak_topics.insert(Subject::Physics, BTreeSet::new());

        assert!(profile.weak_topics_for(Subject::Physics).is_none());
    }

    #[test]
    fn profile_round_trips_topic_maps_through_json() {
        let mut profile = LearnerProfile::new(Track::Neet);
        profile
            .weak_topics
            .entry(Subject::Biology)
            .or_default()
            .insert("Genetics".to_string());

        let json = serde_json::to_string(&profile).expect("profile should serialize");
        let parsed: LearnerProfile = serde_json::from_str(&json).expect("profile should deserialize");

        assert_eq!(parsed, profile);
    }
}
