//! Release command - save an image to its volume and detach it

use crate::cli::args::ImageArgs;
use crate::cli::commands::create_progress_bar;
use crate::config::Config;
use crate::error::PdCacheResult;
use crate::orchestrator::CacheOrchestrator;
use console::style;

/// Execute the release command
pub async fn execute(args: ImageArgs, config: &Config) -> PdCacheResult<()> {
    let orchestrator = CacheOrchestrator::from_config(config);
    let names = orchestrator.names(&args.image)?;

    let pb = create_progress_bar(&format!("Saving {} to {}...", names.image_id, names.volume));
    let result = orchestrator.release(&args.image).await;
    pb.finish_and_clear();
    result?;

    println!(
        "{} Image {} saved to {} and volume released",
        style("✓").green(),
        style(&names.image_id).cyan(),
        names.volume
    );
    Ok(())
}
