//! Status command - show what is known about an image's cache volume

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::error::PdCacheResult;
use crate::orchestrator::{CacheOrchestrator, CacheStatus};
use console::style;

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> PdCacheResult<()> {
    let orchestrator = CacheOrchestrator::from_config(config);
    let status = orchestrator.status(&args.image).await?;

    match args.format {
        OutputFormat::Table => print_status_table(&status),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Plain => print_status_plain(&status),
    }

    Ok(())
}

fn flag(value: bool) -> String {
    if value {
        style("yes").green().to_string()
    } else {
        style("no").dim().to_string()
    }
}

fn print_status_table(status: &CacheStatus) {
    println!("{:<12} {}", "IMAGE", status.names.image_id);
    println!("{:<12} {}", "VOLUME", status.names.volume);
    println!("{:<12} {}", "MOUNT PATH", status.names.mount_path.display());
    println!("{:<12} {}", "DEVICE", status.device.display());
    println!("{:<12} {}", "EXISTS", flag(status.exists));
    println!("{:<12} {}", "ATTACHED", flag(status.attached));
    println!("{:<12} {}", "MOUNTED", flag(status.mounted));
}

fn print_status_plain(status: &CacheStatus) {
    println!("exists={}", status.exists);
    println!("attached={}", status.attached);
    println!("mounted={}", status.mounted);
}
