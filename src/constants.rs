// Application-wide constants in one place for easy tuning

use std::time::Duration;

pub const APP_ID: &str = "com.github.matinee";

// Window title shown when nothing is loaded
pub const DEFAULT_WINDOW_TITLE: &str = "Matinee";

// === Position polling ===
// The progress slider covers 0.0..=1.0, so 100ms keeps it visually
// continuous without hammering the pipeline with queries
pub const POSITION_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

// How long after a user seek before timer updates may touch the slider again
pub const SEEK_SETTLE_DELAY: Duration = Duration::from_millis(100);

// === File chooser ===
pub const MEDIA_FILE_PATTERNS: &[&str] = &[
    "*.mp4", "*.avi", "*.mpg", "*.wmv", "*.mkv", "*.webm", "*.mp3", "*.wav", "*.flac", "*.ogg",
];
