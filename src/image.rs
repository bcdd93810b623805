//! Image save/load through the external image tool

use crate::config::schema::ImageConfig;
use crate::error::PdCacheResult;
use crate::exec::CommandExecutor;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Moves an image between the image store and a mounted volume
pub struct ImageTransfer {
    exec: Arc<dyn CommandExecutor>,
    config: ImageConfig,
}

impl ImageTransfer {
    pub fn new(exec: Arc<dyn CommandExecutor>, config: ImageConfig) -> Self {
        Self { exec, config }
    }

    /// Write `<tool> save <image>` to `<mount_path>/<image>`
    pub async fn save_to(&self, image_id: &str, mount_path: &Path) -> PdCacheResult<()> {
        let file = mount_path.join(image_id);
        info!("Saving image {} to {}", image_id, file.display());

        let script = format!(
            "{} save {} > {}",
            self.config.tool,
            shell_quote(image_id),
            shell_quote(&file.display().to_string())
        );
        self.shell(script).await
    }

    /// Pipe `<mount_path>/<image>` into `<tool> load`
    pub async fn load_from(&self, image_id: &str, mount_path: &Path) -> PdCacheResult<()> {
        let file = mount_path.join(image_id);
        info!("Loading image {} from {}", image_id, file.display());

        let script = format!(
            "cat {} | {} load",
            shell_quote(&file.display().to_string()),
            self.config.tool
        );
        self.shell(script).await
    }

    async fn shell(&self, script: String) -> PdCacheResult<()> {
        self.exec
            .run(&self.config.shell, &["-c".to_string(), script])
            .await?;
        Ok(())
    }
}

/// Quote a value for POSIX `sh`
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeExecutor;

    #[test]
    fn quotes_single_quotes() {
        assert_eq!(shell_quote("abc"), "'abc'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote("a b;rm -rf /"), "'a b;rm -rf /'");
    }

    #[tokio::test]
    async fn save_redirects_into_mount_path() {
        let exec = Arc::new(FakeExecutor::new());
        let transfer = ImageTransfer::new(exec.clone(), ImageConfig::default());

        transfer
            .save_to("sha256:abc", Path::new("/docker-pds/d-abc"))
            .await
            .unwrap();

        assert_eq!(
            exec.calls(),
            vec!["sh -c docker save 'sha256:abc' > '/docker-pds/d-abc/sha256:abc'"]
        );
    }

    #[tokio::test]
    async fn load_pipes_file_into_tool() {
        let exec = Arc::new(FakeExecutor::new());
        let config = ImageConfig {
            tool: "podman".to_string(),
            shell: "/bin/sh".to_string(),
        };
        let transfer = ImageTransfer::new(exec.clone(), config);

        transfer.load_from("abc", Path::new("/pds/d-abc")).await.unwrap();

        assert_eq!(exec.calls(), vec!["/bin/sh -c cat '/pds/d-abc/abc' | podman load"]);
    }

    #[tokio::test]
    async fn load_failure_propagates() {
        let exec = Arc::new(FakeExecutor::new().fail_on("load", 1, "open /pds/x: no such file"));
        let transfer = ImageTransfer::new(exec.clone(), ImageConfig::default());

        assert!(transfer.load_from("x", Path::new("/pds")).await.is_err());
    }
}
