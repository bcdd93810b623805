//! CLI command implementations

pub mod config;
pub mod get;
pub mod names;
pub mod release;
pub mod status;

pub use config::execute as config;
pub use get::execute as get;
pub use names::execute as names;
pub use release::execute as release;
pub use status::execute as status;

use indicatif::{ProgressBar, ProgressStyle};

pub(crate) fn create_progress_bar(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
