//! Recording fakes for the executor and host seams

use crate::error::{PdCacheError, PdCacheResult};
use crate::exec::{command_line, CommandExecutor};
use crate::host::Host;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

enum Response {
    Fail { code: i32, output: String },
    Timeout,
}

/// Executor that records every command line and fails on request
#[derive(Default)]
pub struct FakeExecutor {
    calls: Mutex<Vec<String>>,
    rules: Vec<(String, Response)>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every command whose line contains `needle`
    pub fn fail_on(mut self, needle: &str, code: i32, output: &str) -> Self {
        self.rules.push((
            needle.to_string(),
            Response::Fail {
                code,
                output: output.to_string(),
            },
        ));
        self
    }

    /// Time out every command whose line contains `needle`
    pub fn timeout_on(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), Response::Timeout));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, needle: &str) -> bool {
        self.calls().iter().any(|c| c.contains(needle))
    }

    /// Index of the first call containing each needle, in order
    pub fn positions(&self, needles: &[&str]) -> Vec<Option<usize>> {
        let calls = self.calls();
        needles
            .iter()
            .map(|n| calls.iter().position(|c| c.contains(n)))
            .collect()
    }
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
    async fn run(&self, program: &str, args: &[String]) -> PdCacheResult<String> {
        let line = command_line(program, args);
        self.calls.lock().unwrap().push(line.clone());

        match self.rules.iter().find(|(needle, _)| line.contains(needle.as_str())) {
            Some((_, Response::Fail { code, output })) => Err(PdCacheError::CommandExit {
                command: line,
                code: Some(*code),
                output: output.clone(),
            }),
            Some((_, Response::Timeout)) => Err(PdCacheError::CommandTimeout {
                command: line,
                secs: 1,
            }),
            None => Ok(String::new()),
        }
    }
}

/// Host with scripted device and mount state
pub struct FakeHost {
    name: String,
    devices: Mutex<HashSet<PathBuf>>,
    mounted: Mutex<HashSet<PathBuf>>,
    dirs: Mutex<HashSet<PathBuf>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            name: "cache-host-1".to_string(),
            devices: Mutex::new(HashSet::new()),
            mounted: Mutex::new(HashSet::new()),
            dirs: Mutex::new(HashSet::new()),
        }
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(self, device: impl Into<PathBuf>) -> Self {
        self.devices.lock().unwrap().insert(device.into());
        self
    }

    pub fn with_mount(self, path: impl Into<PathBuf>) -> Self {
        self.mounted.lock().unwrap().insert(path.into());
        self
    }

    pub fn has_dir(&self, path: &Path) -> bool {
        self.dirs.lock().unwrap().contains(path)
    }
}

#[async_trait]
impl Host for FakeHost {
    fn hostname(&self) -> PdCacheResult<String> {
        Ok(self.name.clone())
    }

    async fn device_present(&self, device: &Path) -> bool {
        self.devices.lock().unwrap().contains(device)
    }

    async fn is_mounted(&self, mount_path: &Path) -> PdCacheResult<bool> {
        Ok(self.mounted.lock().unwrap().contains(mount_path))
    }

    async fn create_mount_dir(&self, path: &Path) -> PdCacheResult<()> {
        self.dirs.lock().unwrap().insert(path.to_path_buf());
        Ok(())
    }

    async fn remove_mount_dir(&self, path: &Path) -> PdCacheResult<()> {
        self.dirs.lock().unwrap().remove(path);
        Ok(())
    }
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_host_defaults_to_empty_state() {
        let host = FakeHost::default();
        assert_eq!(host.hostname().unwrap(), "cache-host-1");
        assert!(!host.device_present(Path::new("/dev/x")).await);
        assert!(!host.is_mounted(Path::new("/mnt/x")).await.unwrap());
        assert!(!host.has_dir(Path::new("/mnt/x")));
    }
}
