mod commenter;
mod enrich;
pub mod error;
pub mod platform;
pub mod progress;
pub mod run;
pub mod schedule;
pub mod score;
pub mod scrape;
pub mod select;

pub use error::CuratorError;
pub use progress::{
    ProgressHandle, ProgressStatus, RunProgress, TaskEntry, TaskStatus, TASK_DONE,
    TASK_INITIALIZING,
};
pub use run::{Curator, CuratorOptions};
pub use schedule::{
    next_run_time, start_scheduler, DEFAULT_INTERVAL_HOURS, SETTING_SCHEDULE_ENABLED,
    SETTING_SCHEDULE_INTERVAL_HOURS,
};
pub use score::{score, LOOKBACK_HOURS, MIN_COMMENTS};
pub use scrape::scrape_profile;
pub use select::{select, MAX_GLOBAL_POSTS, MAX_POSTS_PER_PROFILE};
