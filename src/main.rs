use std::sync::Arc;

use jobboard::notifications::{PermissionStatus, StaticPermissions};
use jobboard::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "jobboard=debug,sqlx=warn".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // No device to prompt from here.
    let notifications = Arc::new(StaticPermissions::new(
        PermissionStatus::Granted,
        PermissionStatus::Granted,
    ));
    let app_state = AppState::init(notifications).await?;

    app_state.jobs.initialize().await?;
    app_state.jobs.fetch_global_skills_and_locations().await?;

    // Optional free-text query: `jobboard rust`
    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if !query.is_empty() {
        app_state.jobs.set_search_query(&query);
    }

    let state = app_state.jobs.snapshot();
    tracing::info!(
        jobs = state.jobs.len(),
        shown = state.filtered_jobs.len(),
        skills = state.global_skills.len(),
        locations = state.global_locations.len(),
        "job board loaded"
    );
    for job in &state.filtered_jobs {
        println!(
            "{}\t{} | {} | {} | {} applicant(s)",
            job.id,
            job.title,
            job.company_name,
            job.location,
            job.candidates.len()
        );
    }

    Ok(())
}
