//! Names command - print derived volume name and mount path

use crate::cli::args::{NamesArgs, OutputFormat};
use crate::config::Config;
use crate::error::PdCacheResult;
use crate::naming::CacheNames;

/// Execute the names command
pub async fn execute(args: NamesArgs, config: &Config) -> PdCacheResult<()> {
    let names = CacheNames::derive(&config.mount.base_dir, &args.image)?;

    match args.format {
        OutputFormat::Table => {
            println!("{:<12} {}", "VOLUME", names.volume);
            println!("{:<12} {}", "MOUNT PATH", names.mount_path.display());
            println!("{:<12} {}", "IMAGE FILE", names.image_file().display());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
        OutputFormat::Plain => {
            println!("{}", names.volume);
            println!("{}", names.mount_path.display());
        }
    }

    Ok(())
}
