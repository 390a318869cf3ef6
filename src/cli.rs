use clap::Parser;
use std::path::PathBuf;

use crate::config::PlayerConfig;

/// Play a generated lesson while reporting learner attention.
#[derive(Debug, Parser)]
#[command(name = "lesson-player")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON config file (defaults to ./lesson-player.json when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Lesson to play
    #[arg(long)]
    pub lesson_id: Option<String>,

    /// Backend base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Milliseconds between attention reports
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// File holding the bearer token (otherwise LESSON_PLAYER_TOKEN is used)
    #[arg(long)]
    pub token_file: Option<PathBuf>,

    /// Use a synthetic camera and detector instead of real hardware
    #[arg(long)]
    pub simulate: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Flags take precedence over file and environment values.
    pub fn apply(&self, config: &mut PlayerConfig) {
        if let Some(lesson_id) = &self.lesson_id {
            config.lesson_id = lesson_id.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(interval_ms) = self.interval_ms {
            config.telemetry.interval_ms = interval_ms;
        }
    }
}
