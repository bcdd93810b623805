//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{PdCacheError, PdCacheResult};
use console::style;
use std::path::PathBuf;

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
) -> PdCacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> PdCacheResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> PdCacheResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        println!(
            "{} Config already exists at {} (use --force to overwrite)",
            style("!").yellow(),
            path.display()
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    println!(
        "{} Configuration initialized at {}",
        style("✓").green(),
        path.display()
    );
    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> PdCacheResult<()> {
    let mut config = config.clone();
    apply_value(&mut config, key, value)?;

    manager.save(&config).await?;
    println!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}

/// Set a dot-separated key on the config
fn apply_value(config: &mut Config, key: &str, value: &str) -> PdCacheResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => config.general.log_format = value.to_string(),
        ["general", "audit_log"] => config.general.audit_log = parse_bool(value)?,

        ["disk", "tool"] => config.disk.tool = value.to_string(),
        ["disk", "zone"] => config.disk.zone = value.to_string(),
        ["disk", "size_gb"] => config.disk.size_gb = parse_u32(value)?,
        ["disk", "device_prefix"] => config.disk.device_prefix = value.to_string(),
        ["disk", "device_dir"] => config.disk.device_dir = PathBuf::from(value),
        ["disk", "instance"] => config.disk.instance = Some(value.to_string()),
        ["disk", "not_found_patterns"] => config.disk.not_found_patterns = split_list(value),
        ["disk", "not_found_exit_codes"] => {
            config.disk.not_found_exit_codes = split_list(value)
                .iter()
                .map(|code| parse_i32(code))
                .collect::<PdCacheResult<_>>()?;
        }

        ["mount", "base_dir"] => config.mount.base_dir = PathBuf::from(value),
        ["mount", "fs_type"] => config.mount.fs_type = value.to_string(),
        ["mount", "format_helper"] => config.mount.format_helper = value.to_string(),
        ["mount", "mkfs_command"] => config.mount.mkfs_command = value.to_string(),
        ["mount", "mount_bin"] => config.mount.mount_bin = value.to_string(),
        ["mount", "umount_bin"] => config.mount.umount_bin = value.to_string(),
        ["mount", "mounts_table"] => config.mount.mounts_table = PathBuf::from(value),

        ["image", "tool"] => config.image.tool = value.to_string(),
        ["image", "shell"] => config.image.shell = value.to_string(),

        ["exec", "timeout_secs"] => config.exec.timeout_secs = u64::from(parse_u32(value)?),

        _ => {
            return Err(PdCacheError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "general.audit_log",
    "disk.tool",
    "disk.zone",
    "disk.size_gb",
    "disk.device_prefix",
    "disk.device_dir",
    "disk.instance",
    "disk.not_found_patterns",
    "disk.not_found_exit_codes",
    "mount.base_dir",
    "mount.fs_type",
    "mount.format_helper",
    "mount.mkfs_command",
    "mount.mount_bin",
    "mount.umount_bin",
    "mount.mounts_table",
    "image.tool",
    "image.shell",
    "exec.timeout_secs",
];

fn parse_bool(value: &str) -> PdCacheResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(PdCacheError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u32(value: &str) -> PdCacheResult<u32> {
    value
        .parse()
        .map_err(|_| PdCacheError::User(format!("Invalid number: {}", value)))
}

fn parse_i32(value: &str) -> PdCacheResult<i32> {
    value
        .parse()
        .map_err(|_| PdCacheError::User(format!("Invalid exit code: {}", value)))
}

/// Comma-separated list; empty items are dropped so "" clears the list
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
