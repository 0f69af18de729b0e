//! Self-replacement of the running executable.
//!
//! A running Windows executable cannot overwrite itself. The new build is
//! staged in the temp dir and a detached batch script waits for this process
//! to exit before copying it into place.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::UpdateInfo;
use crate::shell::{CommandRunner, Invocation};

/// Copy attempts the watcher script makes before giving up.
const COPY_ATTEMPTS: u32 = 3;

/// Files produced while preparing an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUpdate {
    pub staged_exe: PathBuf,
    pub script: PathBuf,
}

/// Copy the released executable to `temp_dir` as `update_<stamp>.exe`.
pub fn stage_executable(source: &Path, temp_dir: &Path, stamp: i64) -> Result<PathBuf> {
    let staged = temp_dir.join(format!("update_{}.exe", stamp));
    fs::copy(source, &staged).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            source.display(),
            staged.display()
        )
    })?;
    Ok(staged)
}

/// Batch script that swaps the executable once `pid` has exited.
pub fn watcher_script(staged: &Path, target: &Path, pid: u32) -> String {
    let staged = staged.display();
    let target = target.display();
    let lines = [
        "@echo off".to_string(),
        "title Updating provisioner".to_string(),
        ":wait".to_string(),
        format!("tasklist /FI \"PID eq {pid}\" 2>nul | find \"{pid}\" >nul"),
        "if %errorlevel% equ 0 (".to_string(),
        "    timeout /t 1 /nobreak >nul".to_string(),
        "    goto wait".to_string(),
        ")".to_string(),
        "set attempts=0".to_string(),
        ":copy".to_string(),
        "set /a attempts+=1".to_string(),
        format!("copy /y \"{staged}\" \"{target}\" >nul 2>&1"),
        "if %errorlevel% neq 0 (".to_string(),
        format!("    if %attempts% lss {COPY_ATTEMPTS} ("),
        "        timeout /t 3 /nobreak >nul".to_string(),
        "        goto copy".to_string(),
        "    )".to_string(),
        "    echo Update failed: could not replace the executable.".to_string(),
        "    timeout /t 10 /nobreak >nul".to_string(),
        ")".to_string(),
        format!("del /q \"{staged}\" 2>nul"),
        "del \"%~f0\"".to_string(),
    ];
    // cmd.exe expects CRLF line endings.
    lines.join("\r\n") + "\r\n"
}

/// Stage the new build and launch the watcher script detached.
///
/// The caller must exit promptly afterwards; the script waits for it.
pub fn apply_update(info: &UpdateInfo, runner: &dyn CommandRunner) -> Result<StagedUpdate> {
    let target = std::env::current_exe().context("Cannot locate the running executable")?;
    let staged = prepare_update(info, &target, &std::env::temp_dir(), std::process::id())?;

    runner
        .spawn_detached(&Invocation::program(
            "cmd.exe",
            ["/c".to_string(), staged.script.display().to_string()],
        ))
        .context("Failed to launch the update script")?;

    tracing::info!(
        "Update to {} staged at {}",
        info.latest,
        staged.staged_exe.display()
    );
    Ok(staged)
}

/// Stage the executable and write the watcher script into `temp_dir`.
pub fn prepare_update(
    info: &UpdateInfo,
    target: &Path,
    temp_dir: &Path,
    pid: u32,
) -> Result<StagedUpdate> {
    let stamp = chrono::Utc::now().timestamp();
    let staged_exe = stage_executable(&info.executable, temp_dir, stamp)?;

    let script = temp_dir.join(format!("updater_{}.bat", stamp));
    fs::write(&script, watcher_script(&staged_exe, target, pid))
        .with_context(|| format!("Failed to write {}", script.display()))?;

    Ok(StagedUpdate { staged_exe, script })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn info(executable: PathBuf) -> UpdateInfo {
        UpdateInfo {
            current: "1.0.0".into(),
            latest: "1.1.0".into(),
            executable,
            update_available: true,
        }
    }

    #[test]
    fn script_waits_for_pid_then_replaces_and_cleans_up() {
        let script = watcher_script(
            Path::new(r"C:\Temp\update_1.exe"),
            Path::new(r"C:\Tools\provisioner.exe"),
            4242,
        );

        let wait = script.find("PID eq 4242").unwrap();
        let copy = script
            .find(r#"copy /y "C:\Temp\update_1.exe" "C:\Tools\provisioner.exe""#)
            .unwrap();
        let cleanup = script.find(r#"del /q "C:\Temp\update_1.exe""#).unwrap();
        assert!(wait < copy && copy < cleanup);
        assert!(script.contains("if %attempts% lss 3"));
        assert!(script.trim_end().ends_with("del \"%~f0\""));
        assert!(script.contains("\r\n"));
    }

    #[test]
    fn prepare_stages_exe_and_script() {
        let share = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        let released = share.path().join("Provisioner.exe");
        fs::write(&released, b"new build").unwrap();

        let staged = prepare_update(
            &info(released),
            Path::new("provisioner.exe"),
            temp.path(),
            1,
        )
        .unwrap();

        assert_eq!(fs::read(&staged.staged_exe).unwrap(), b"new build");
        let script = fs::read_to_string(&staged.script).unwrap();
        assert!(script.contains(&staged.staged_exe.display().to_string()));
    }

    #[test]
    fn missing_release_is_error() {
        let temp = TempDir::new().unwrap();
        let err = prepare_update(
            &info(temp.path().join("gone.exe")),
            Path::new("provisioner.exe"),
            temp.path(),
            1,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to copy"));
    }
}
