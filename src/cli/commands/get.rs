//! Get command - load an image from its cache volume

use crate::cli::args::ImageArgs;
use crate::cli::commands::create_progress_bar;
use crate::config::Config;
use crate::error::PdCacheResult;
use crate::orchestrator::CacheOrchestrator;
use console::style;

/// Execute the get command
pub async fn execute(args: ImageArgs, config: &Config) -> PdCacheResult<()> {
    let orchestrator = CacheOrchestrator::from_config(config);
    let names = orchestrator.names(&args.image)?;

    let pb = create_progress_bar(&format!("Acquiring volume {}...", names.volume));
    let result = orchestrator.acquire(&args.image).await;
    pb.finish_and_clear();

    match result {
        Ok(()) => {
            println!(
                "{} Image {} loaded from {}",
                style("✓").green(),
                style(&names.image_id).cyan(),
                names.volume
            );
            Ok(())
        }
        Err(e) if e.is_not_populated() => {
            println!(
                "{} Volume {} created and mounted read-write at {}",
                style("!").yellow(),
                style(&names.volume).cyan(),
                names.mount_path.display()
            );
            Err(e)
        }
        Err(e) => Err(e),
    }
}
