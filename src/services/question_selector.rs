use rand::{seq::SliceRandom, Rng};
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    config::Config,
    errors::AppResult,
    models::domain::{Difficulty, QuestionId, QuestionRecord, Subject, Track},
    repositories::{QuestionFilter, QuestionRepository},
    services::question_generator::{GenerationRequest, QuestionGenerator},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
    /// Minimum share of the requested count a generated batch must reach to
    /// be used at all.
    pub generation_success_threshold: f64,
    /// Fall back to any difficulty when the exact cell has nothing left.
    pub relax_difficulty: bool,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            generation_success_threshold: 0.7,
            relax_difficulty: true,
        }
    }
}

impl SelectionPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            generation_success_threshold: config.generation_success_threshold,
            relax_difficulty: config.relax_difficulty_fallback,
        }
    }

    fn accepts(&self, produced: usize, requested: usize) -> bool {
        produced as f64 >= requested as f64 * self.generation_success_threshold
    }
}

pub struct QuestionSelector {
    repository: Arc<dyn QuestionRepository>,
    generator: Option<Arc<dyn QuestionGenerator>>,
    policy: SelectionPolicy,
}

impl QuestionSelector {
    pub fn new(
        repository: Arc<dyn QuestionRepository>,
        generator: Option<Arc<dyn QuestionGenerator>>,
        policy: SelectionPolicy,
    ) -> Self {
        Self {
            repository,
            generator,
            policy,
        }
    }

    pub fn repository(&self) -> &Arc<dyn QuestionRepository> {
        &self.repository
    }

    /// Picks up to `count` questions for one (subject, difficulty) cell,
    /// never returning an id in `exclude`. Generated questions are tried
    /// first; the repository fills whatever is still missing. A short or
    /// empty result is not an error.
    pub async fn select<R: Rng + ?Sized>(
        &self,
        subject: Subject,
        track: Track,
        difficulty: Difficulty,
        count: usize,
        exclude: &HashSet<QuestionId>,
        rng: &mut R,
    ) -> AppResult<Vec<QuestionRecord>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut selected = self
            .try_generate(subject, track, difficulty, count, exclude)
            .await;
        let generated = selected.len();

        let remaining = count - selected.len();
        if remaining == 0 {
            return Ok(selected);
        }

        let mut taken: HashSet<QuestionId> = exclude.clone();
        taken.extend(selected.iter().map(|q| q.id));

        let exact = QuestionFilter::for_track(track)
            .with_subject(subject)
            .with_difficulty(difficulty);
        let mut pool = self.available(&exact, &taken).await?;

        if pool.is_empty() && generated == 0 && self.policy.relax_difficulty {
            log::warn!(
                "No {} {} {} questions left, relaxing difficulty",
                track,
                subject,
                difficulty
            );
            let relaxed = QuestionFilter::for_track(track).with_subject(subject);
            pool = self.available(&relaxed, &taken).await?;
        }

        pool.shuffle(rng);
        pool.truncate(remaining);
        selected.extend(pool);

        log::debug!(
            "Selected {}/{} {} {} {} questions ({} generated)",
            selected.len(),
            count,
            track,
            subject,
            difficulty,
            generated
        );

        Ok(selected)
    }

    /// Random draw straight from the repository, used for topic- and
    /// chapter-scoped picks that bypass the generator.
    pub async fn draw<R: Rng + ?Sized>(
        &self,
        filter: &QuestionFilter,
        count: usize,
        exclude: &HashSet<QuestionId>,
        rng: &mut R,
    ) -> AppResult<Vec<QuestionRecord>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut pool = self.available(filter, exclude).await?;
        pool.shuffle(rng);
        pool.truncate(count);
        Ok(pool)
    }

    async fn available(
        &self,
        filter: &QuestionFilter,
        exclude: &HashSet<QuestionId>,
    ) -> AppResult<Vec<QuestionRecord>> {
        let mut questions = self.repository.find_questions(filter).await?;
        questions.retain(|q| !exclude.contains(&q.id));
        Ok(questions)
    }

    /// Returns the generated batch only if it clears the success threshold;
    /// a failed or short batch yields nothing.
    async fn try_generate(
        &self,
        subject: Subject,
        track: Track,
        difficulty: Difficulty,
        count: usize,
        exclude: &HashSet<QuestionId>,
    ) -> Vec<QuestionRecord> {
        let Some(generator) = &self.generator else {
            return Vec::new();
        };

        let request = GenerationRequest::new(track, subject, difficulty, count);
        let batch = match generator.generate(&request).await {
            Ok(batch) => batch,
            Err(e) => {
                log::warn!(
                    "Question generator failed for {} {} {}: {}; using repository",
                    track,
                    subject,
                    difficulty,
                    e
                );
                return Vec::new();
            }
        };

        if !self.policy.accepts(batch.len(), count) {
            log::warn!(
                "Generator produced only {}/{} {} {} {} questions, discarding batch",
                batch.len(),
                count,
                track,
                subject,
                difficulty
            );
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut accepted: Vec<QuestionRecord> = batch
            .into_iter()
            .filter(|q| q.subject == subject && !exclude.contains(&q.id) && seen.insert(q.id))
            .collect();
        accepted.truncate(count);
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GenerationError;
    use crate::repositories::question_repository::MockQuestionRepository;
    use crate::services::question_generator::MockQuestionGenerator;
    use crate::test_utils::fixtures::{generated_questions, question, question_bank};
    use rand::{rngs::StdRng, SeedableRng};

    fn repository_over(bank: Vec<QuestionRecord>) -> Arc<dyn QuestionRepository> {
        let mut repo = MockQuestionRepository::new();
        repo.expect_find_questions()
            .returning(move |filter| Ok(bank.iter().filter(|q| filter.matches(q)).cloned().collect()));
        Arc::new(repo)
    }

    fn generator_producing(n: usize) -> Arc<dyn QuestionGenerator> {
        let mut generator = MockQuestionGenerator::new();
        generator
            .expect_generate()
            .returning(move |request| Ok(generated_questions(request, n)));
        Arc::new(generator)
    }

    fn failing_generator() -> Arc<dyn QuestionGenerator> {
        let mut generator = MockQuestionGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(GenerationError::Provider("quota exceeded".to_string())));
        Arc::new(generator)
    }

    #[tokio::test]
    async fn failing_generator_falls_back_to_repository() {
        let selector = QuestionSelector::new(
            repository_over(question_bank(Track::Neet, 6)),
            Some(failing_generator()),
            SelectionPolicy::default(),
        );
        let mut rng = StdRng::seed_from_u64(7);

        let picked = selector
            .select(Subject::Physics, Track::Neet, Difficulty::Easy, 5, &HashSet::new(), &mut rng)
            .await
            .expect("selection should succeed");

        assert_eq!(picked.len(), 5);
        assert!(picked.iter().all(|q| !q.id.is_transient()));
        assert!(picked
            .iter()
            .all(|q| q.subject == Subject::Physics && q.difficulty == Difficulty::Easy));
    }

    #[tokio::test]
    async fn batch_at_threshold_is_topped_up_from_repository() {
        let selector = QuestionSelector::new(
            repository_over(question_bank(Track::Neet, 6)),
            Some(generator_producing(7)),
            SelectionPolicy::default(),
        );
        let mut rng = StdRng::seed_from_u64(7);

        let picked = selector
            .select(Subject::Chemistry, Track::Neet, Difficulty::Medium, 10, &HashSet::new(), &mut rng)
            .await
            .expect("selection should succeed");

        assert_eq!(picked.len(), 10);
        assert_eq!(picked.iter().filter(|q| q.id.is_transient()).count(), 7);
    }

    #[tokio::test]
    async fn batch_below_threshold_is_discarded_entirely() {
        let selector = QuestionSelector::new(
            repository_over(question_bank(Track::Neet, 12)),
            Some(generator_producing(6)),
            SelectionPolicy::default(),
        );
        let mut rng = StdRng::seed_from_u64(7);

        let picked = selector
            .select(Subject::Biology, Track::Neet, Difficulty::Hard, 10, &HashSet::new(), &mut rng)
            .await
            .expect("selection should succeed");

        assert_eq!(picked.len(), 10);
        assert!(picked.iter().all(|q| !q.id.is_transient()));
    }

    #[tokio::test]
    async fn excluded_ids_are_never_returned() {
        let bank = question_bank(Track::Jee, 4);
        let exclude: HashSet<QuestionId> = bank
            .iter()
            .filter(|q| q.subject == Subject::Mathematics && q.difficulty == Difficulty::Easy)
            .take(3)
            .map(|q| q.id)
            .collect();
        let selector = QuestionSelector::new(repository_over(bank), None, SelectionPolicy::default());
        let mut rng = StdRng::seed_from_u64(1);

        let picked = selector
            .select(Subject::Mathematics, Track::Jee, Difficulty::Easy, 4, &exclude, &mut rng)
            .await
            .expect("selection should succeed");

        assert_eq!(picked.len(), 1);
        assert!(!exclude.contains(&picked[0].id));
    }

    #[tokio::test]
    async fn empty_difficulty_cell_relaxes_to_any_difficulty() {
        let bank = vec![
            question(1, Subject::Physics, Track::Jee, Difficulty::Easy, "Motion"),
            question(2, Subject::Physics, Track::Jee, Difficulty::Medium, "Optics"),
            question(3, Subject::Chemistry, Track::Jee, Difficulty::Hard, "Bonding"),
        ];
        let selector = QuestionSelector::new(repository_over(bank), None, SelectionPolicy::default());
        let mut rng = StdRng::seed_from_u64(3);

        let picked = selector
            .select(Subject::Physics, Track::Jee, Difficulty::Hard, 5, &HashSet::new(), &mut rng)
            .await
            .expect("selection should succeed");

        assert_eq!(picked.len(), 2);
        assert!(picked.iter().all(|q| q.subject == Subject::Physics));
    }

    #[tokio::test]
    async fn relaxation_can_be_disabled() {
        let bank = vec![question(1, Subject::Physics, Track::Jee, Difficulty::Easy, "Motion")];
        let policy = SelectionPolicy {
            relax_difficulty: false,
            ..SelectionPolicy::default()
        };
        let selector = QuestionSelector::new(repository_over(bank), None, policy);
        let mut rng = StdRng::seed_from_u64(3);

        let picked = selector
            .select(Subject::Physics, Track::Jee, Difficulty::Hard, 5, &HashSet::new(), &mut rng)
            .await
            .expect("selection should succeed");

        assert!(picked.is_empty());
    }

    #[tokio::test]
    async fn zero_count_touches_no_source() {
        let repo = MockQuestionRepository::new();
        let generator = MockQuestionGenerator::new();
        let selector = QuestionSelector::new(
            Arc::new(repo),
            Some(Arc::new(generator)),
            SelectionPolicy::default(),
        );
        let mut rng = StdRng::seed_from_u64(3);

        let picked = selector
            .select(Subject::Physics, Track::Neet, Difficulty::Easy, 0, &HashSet::new(), &mut rng)
            .await
            .expect("selection should succeed");

        assert!(picked.is_empty());
    }

    #[tokio::test]
    async fn same_seed_gives_same_selection() {
        let bank = question_bank(Track::Neet, 20);
        let selector = QuestionSelector::new(repository_over(bank), None, SelectionPolicy::default());

        let mut first_rng = StdRng::seed_from_u64(42);
        let mut second_rng = StdRng::seed_from_u64(42);
        let first = selector
            .select(Subject::Physics, Track::Neet, Difficulty::Medium, 5, &HashSet::new(), &mut first_rng)
            .await
            .expect("selection should succeed");
        let second = selector
            .select(Subject::Physics, Track::Neet, Difficulty::Medium, 5, &HashSet::new(), &mut second_rng)
            .await
            .expect("selection should succeed");

        let ids = |qs: &[QuestionRecord]| qs.iter().map(|q| q.id).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }
}
