use serde::Serialize;

use crate::models::domain::{Difficulty, ProficiencyLevel, Subject, Track};

/// Easy and medium shares in percent; hard takes whatever is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyMix {
    pub easy_pct: usize,
    pub medium_pct: usize,
}

impl DifficultyMix {
    pub const DEFAULT: DifficultyMix = DifficultyMix {
        easy_pct: 25,
        medium_pct: 45,
    };

    pub fn for_level(level: Option<ProficiencyLevel>) -> Self {
        match level {
            None => DifficultyMix::DEFAULT,
            Some(ProficiencyLevel::Beginner) => DifficultyMix {
                easy_pct: 60,
                medium_pct: 30,
            },
            Some(ProficiencyLevel::Intermediate) => DifficultyMix {
                easy_pct: 30,
                medium_pct: 50,
            },
            Some(ProficiencyLevel::Advanced) => DifficultyMix {
                easy_pct: 10,
                medium_pct: 40,
            },
        }
    }

    /// Splits `count` into easy/medium/hard. Hard is the remainder so the
    /// three always sum to `count`.
    pub fn split(&self, count: usize) -> [(Difficulty, usize); 3] {
        let easy = count * self.easy_pct / 100;
        let medium = count * self.medium_pct / 100;
        let hard = count - easy - medium;
        [
            (Difficulty::Easy, easy),
            (Difficulty::Medium, medium),
            (Difficulty::Hard, hard),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DistributionCell {
    pub subject: Subject,
    pub difficulty: Difficulty,
    pub count: usize,
}

/// Requested question counts per (subject, difficulty), in subject order then
/// easy, medium, hard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub cells: Vec<DistributionCell>,
}

impl Distribution {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn total(&self) -> usize {
        self.cells.iter().map(|c| c.count).sum()
    }

    pub fn subject_total(&self, subject: Subject) -> usize {
        self.cells
            .iter()
            .filter(|c| c.subject == subject)
            .map(|c| c.count)
            .sum()
    }

    pub fn count(&self, subject: Subject, difficulty: Difficulty) -> usize {
        self.cells
            .iter()
            .find(|c| c.subject == subject && c.difficulty == difficulty)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    fn push_subject(&mut self, subject: Subject, count: usize, mix: DifficultyMix) {
        for (difficulty, n) in mix.split(count) {
            self.cells.push(DistributionCell {
                subject,
                difficulty,
                count: n,
            });
        }
    }
}

/// Canonical full-paper question counts per subject.
pub fn full_paper_table(track: Track) -> &'static [(Subject, usize)] {
    match track {
        Track::Neet => &[
            (Subject::Physics, 45),
            (Subject::Chemistry, 45),
            (Subject::Biology, 90),
        ],
        Track::Jee => &[
            (Subject::Physics, 60),
            (Subject::Chemistry, 60),
            (Subject::Mathematics, 60),
        ],
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DistributionPlanner;

impl DistributionPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Even split across the track's subjects. Integer division: any
    /// remainder is dropped rather than handed to a subject.
    pub fn plan(&self, track: Track, total: usize, level: Option<ProficiencyLevel>) -> Distribution {
        let subjects = track.subjects();
        let mut distribution = Distribution::default();
        if subjects.is_empty() {
            log::warn!("Track {} has no subjects configured", track);
            return distribution;
        }

        let per_subject = total / subjects.len();
        let mix = DifficultyMix::for_level(level);
        for &subject in subjects {
            distribution.push_subject(subject, per_subject, mix);
        }
        distribution
    }

    /// Same as [`plan`](Self::plan) for a track given by name; an unknown
    /// name yields an empty distribution.
    pub fn plan_by_name(
        &self,
        track_name: &str,
        total: usize,
        level: Option<ProficiencyLevel>,
    ) -> Distribution {
        match Track::parse(track_name) {
            Some(track) => self.plan(track, total, level),
            None => {
                log::warn!("Unknown track '{}', planning an empty test", track_name);
                Distribution::default()
            }
        }
    }

    pub fn plan_full_paper(&self, track: Track) -> Distribution {
        let table = full_paper_table(track);
        let total = table.iter().map(|&(_, count)| count).sum();
        self.plan_paper(track, total)
    }

    /// The full-paper table scaled down to `total` questions, keeping each
    /// subject's share. Per-subject counts are floored.
    pub fn plan_paper(&self, track: Track, total: usize) -> Distribution {
        let table = full_paper_table(track);
        let paper_total: usize = table.iter().map(|&(_, count)| count).sum();
        let mut distribution = Distribution::default();
        if paper_total == 0 {
            return distribution;
        }
        for &(subject, count) in table {
            distribution.push_subject(subject, count * total / paper_total, DifficultyMix::DEFAULT);
        }
        distribution
    }

    /// All `total` questions go to one subject. A subject the track does not
    /// offer yields an empty distribution.
    pub fn plan_subject(
        &self,
        track: Track,
        subject: Subject,
        total: usize,
        level: Option<ProficiencyLevel>,
    ) -> Distribution {
        let mut distribution = Distribution::default();
        if !track.offers(subject) {
            log::warn!("{} is not part of the {} track", subject, track);
            return distribution;
        }
        distribution.push_subject(subject, total, DifficultyMix::for_level(level));
        distribution
    }
}
