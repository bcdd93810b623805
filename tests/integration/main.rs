//! Integration tests for pdcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    const ID: &str = "4e38e38c8ce0b8d9041a9c4fefe786631d1416225e13b0bfe8cfa2321aec4bba";

    fn pdcache(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("pdcache");
        cmd.env("PDCACHE_CONFIG", temp.path().join("config.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        pdcache(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("persistent-disk cache"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        pdcache(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("pdcache"));
    }

    #[test]
    fn names_prints_volume_and_mount_path() {
        let temp = TempDir::new().unwrap();
        let volume = format!("d-{}", &ID[..60]);
        pdcache(&temp)
            .args(["names", ID, "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains(volume.clone()))
            .stdout(predicate::str::contains(format!("/docker-pds/{volume}")));
    }

    #[test]
    fn short_image_id_is_rejected() {
        let temp = TempDir::new().unwrap();
        pdcache(&temp)
            .args(["names", "abc123"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("too short"));
    }

    #[test]
    fn config_path_honours_env() {
        let temp = TempDir::new().unwrap();
        pdcache(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        pdcache(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[disk]"));
    }

    #[test]
    fn config_set_then_show() {
        let temp = TempDir::new().unwrap();
        pdcache(&temp)
            .args(["config", "set", "disk.zone", "europe-west4-a"])
            .assert()
            .success();
        pdcache(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("europe-west4-a"));
    }
}

#[cfg(unix)]
mod workflow_tests {
    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const ID: &str = "4e38e38c8ce0b8d9041a9c4fefe786631d1416225e13b0bfe8cfa2321aec4bba";

    /// Fake toolchain: every tool appends its arguments to `calls.log`
    struct Sandbox {
        temp: TempDir,
    }

    impl Sandbox {
        fn new(disk_exists: bool) -> Self {
            let temp = TempDir::new().unwrap();
            let root = temp.path();
            let log = root.join("calls.log");

            let getdisk = if disk_exists {
                "exit 0"
            } else {
                "echo \"The resource 'disks/$3' was not found\"; exit 1"
            };
            write_script(
                &root.join("disk-tool"),
                &format!(
                    "echo \"disk $*\" >> '{log}'\ncase \"$1\" in getdisk) {getdisk};; esac\nexit 0\n",
                    log = log.display()
                ),
            );
            for tool in ["format-helper", "mount", "umount"] {
                write_script(
                    &root.join(tool),
                    &format!("echo \"{tool} $*\" >> '{}'\nexit 0\n", log.display()),
                );
            }
            write_script(
                &root.join("image-tool"),
                &format!(
                    "cat > /dev/null\necho \"image $*\" >> '{}'\nexit 0\n",
                    log.display()
                ),
            );
            fs::write(root.join("mounts"), "").unwrap();

            let config = format!(
                r#"
[general]
audit_log = false

[disk]
tool = "{root}/disk-tool"
device_dir = "{root}/dev"
instance = "test-host"

[mount]
base_dir = "{root}/pds"
format_helper = "{root}/format-helper"
mount_bin = "{root}/mount"
umount_bin = "{root}/umount"
mounts_table = "{root}/mounts"

[image]
tool = "{root}/image-tool"

[exec]
timeout_secs = 30
"#,
                root = root.display()
            );
            fs::write(root.join("config.toml"), config).unwrap();

            Self { temp }
        }

        fn root(&self) -> &Path {
            self.temp.path()
        }

        fn mount_path(&self) -> PathBuf {
            self.root().join("pds").join(format!("d-{}", &ID[..60]))
        }

        fn calls(&self) -> Vec<String> {
            fs::read_to_string(self.root().join("calls.log"))
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }

        fn command(&self) -> assert_cmd::Command {
            let mut cmd = cargo_bin_cmd!("pdcache");
            cmd.env("PDCACHE_CONFIG", self.root().join("config.toml"));
            cmd
        }
    }

    fn write_script(path: &Path, body: &str) {
        fs::write(path, format!("#!/bin/sh\n{body}")).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn get_provisions_missing_volume_and_reports_not_populated() {
        let sandbox = Sandbox::new(false);

        sandbox
            .command()
            .args(["get", ID])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("does not contain image"));

        let calls = sandbox.calls();
        assert_eq!(calls.len(), 4, "{calls:?}");
        assert!(calls[0].starts_with("disk getdisk"));
        assert!(calls[1].starts_with("disk adddisk --zone=us-central1-a --size=5"));
        assert!(calls[2].contains("mode=rw test-host"));
        assert!(calls[3].starts_with("format-helper -m mkfs.ext4 -F"));
        assert!(sandbox.mount_path().is_dir());
    }

    #[test]
    fn get_reuses_existing_volume() {
        let sandbox = Sandbox::new(true);
        fs::create_dir_all(sandbox.mount_path()).unwrap();
        fs::write(sandbox.mount_path().join(ID), b"image bytes").unwrap();

        sandbox.command().args(["get", ID]).assert().success();

        let calls = sandbox.calls();
        assert_eq!(calls.len(), 4, "{calls:?}");
        assert!(calls[0].starts_with("disk getdisk"));
        assert!(calls[1].contains("mode=ro test-host"));
        assert!(calls[2].starts_with("mount -t ext4 -o ro"));
        assert_eq!(calls[3], "image load");
    }

    #[test]
    fn release_saves_and_detaches() {
        let sandbox = Sandbox::new(true);
        fs::create_dir_all(sandbox.mount_path()).unwrap();

        sandbox.command().args(["release", ID]).assert().success();

        let calls = sandbox.calls();
        assert_eq!(calls.len(), 2, "{calls:?}");
        assert!(calls[0].starts_with("image save"));
        assert!(calls[1].starts_with("disk detachdisk"));
        assert!(sandbox.mount_path().join(ID).exists());
    }
}
