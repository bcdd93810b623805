//! pdcache - persistent-disk cache for container images
//!
//! Keeps a container image on a cloud volume named after the image ID.
//! The first host to ask for an image provisions and formats the volume and
//! fills it; later hosts attach it read-only and load the image from it.

pub mod audit;
pub mod cli;
pub mod config;
pub mod disk;
pub mod error;
pub mod exec;
pub mod host;
pub mod image;
pub mod mount;
pub mod naming;
pub mod orchestrator;

#[cfg(test)]
mod testing;

pub use error::{PdCacheError, PdCacheResult};
pub use orchestrator::{CacheOrchestrator, CacheStatus};
