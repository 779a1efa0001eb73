use exam_prep_engine::{
    app_state::AppState,
    config::Config,
    errors::AppResult,
    models::domain::{Difficulty, ExamPreset, Track},
    repositories::QuestionFilter,
};

#[tokio::main]
async fn main() -> AppResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    let state = AppState::new(config).await?;
    state.db.health_check().await?;

    log::info!(
        "Exam engine ready on database '{}' (generator {})",
        state.db.db_name(),
        if state.config.generator_enabled() { "on" } else { "off" }
    );

    for track in [Track::Neet, Track::Jee] {
        for preset in ExamPreset::for_track(track) {
            log::info!(
                "{}: {} questions in {} minutes",
                preset.name,
                preset.question_count,
                preset.duration_minutes
            );
        }

        for &subject in track.subjects() {
            for difficulty in Difficulty::ALL {
                let filter = QuestionFilter::for_track(track)
                    .with_subject(subject)
                    .with_difficulty(difficulty);
                let count = state.question_repository.count_questions(&filter).await?;
                if count == 0 {
                    log::warn!("{} {} {}: no questions stored", track, subject, difficulty);
                } else {
                    log::info!("{} {} {}: {} questions", track, subject, difficulty, count);
                }
            }
        }
    }

    Ok(())
}
