pub mod bracket;
pub mod config;
pub mod detection;
pub mod progression;
pub mod ranking;
pub mod rounds;
pub mod types;

pub use bracket::{generate, generate_seeded, generate_with};
pub use config::{load_config, save_config, AppConfig, ConfigError};
pub use detection::{DartDetection, DetectionClient, DetectionError};
pub use progression::{report_result, start_match};
pub use ranking::{final_ranking, round_robin_standings, PlayerStanding};
pub use rounds::rounds_of;
pub use types::{
    BracketError, BracketFormat, BracketSide, BracketStatus, Match, MatchScore, MatchStatus,
    Player, Round, TournamentBracket,
};

use std::fs;
use std::path::PathBuf;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize tracing with file + stderr-friendly output. Keep the
/// returned guard alive for as long as logs should be flushed.
pub fn init_tracing() -> Option<WorkerGuard> {
    let logs_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("logs");
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "engine.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .try_init()
        .is_ok();
    if !installed {
        return None;
    }
    info!("dart tournament engine tracing initialized");
    Some(guard)
}
