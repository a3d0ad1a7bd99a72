// ABOUTME: Locates agent executables on PATH and in common install directories.
// ABOUTME: Service managers often run with a trimmed PATH, so lookup falls back to known bin dirs.

use crate::backend::BackendKind;
use crate::env::Env;
use std::path::{Path, PathBuf};

/// Resolve `cmd` to an executable path.
///
/// Absolute paths are returned untouched. Otherwise PATH is searched, then
/// each of `fallback_dirs`. If nothing matches the bare name is returned so
/// the spawn error names what was attempted.
pub fn resolve_executable(cmd: &str, fallback_dirs: &[PathBuf]) -> PathBuf {
    let cmd = cmd.trim();
    if Path::new(cmd).is_absolute() {
        return PathBuf::from(cmd);
    }
    if let Ok(found) = which::which(cmd) {
        return found;
    }
    for dir in fallback_dirs {
        let candidate = dir.join(cmd);
        if is_executable(&candidate) {
            tracing::debug!(path = %candidate.display(), "Found executable outside PATH");
            return candidate;
        }
    }
    tracing::debug!(cmd, "Executable not found, using bare command name");
    PathBuf::from(cmd)
}

/// `/usr/local/bin`, `~/.local/bin`, `~/bin`
pub fn conventional_bin_dirs(env: &Env) -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from("/usr/local/bin")];
    if let Some(home) = env.home_dir() {
        dirs.push(home.join(".local/bin"));
        dirs.push(home.join("bin"));
    }
    dirs
}

/// Backends whose default executable is currently on PATH
pub fn detect_available_backends() -> Vec<(BackendKind, PathBuf)> {
    BackendKind::DETECTION_ORDER
        .into_iter()
        .filter_map(|kind| {
            which::which(kind.default_command())
                .ok()
                .map(|path| (kind, path))
        })
        .collect()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_is_kept() {
        let path = resolve_executable("/opt/agents/codex", &[]);
        assert_eq!(path, PathBuf::from("/opt/agents/codex"));
    }

    #[test]
    fn test_unknown_command_falls_back_to_name() {
        let path = resolve_executable("openab-no-such-binary-xyz", &[]);
        assert_eq!(path, PathBuf::from("openab-no-such-binary-xyz"));
    }

    #[test]
    fn test_conventional_dirs_use_home() {
        let env = Env::from_pairs([("HOME", "/home/bot")]);
        let dirs = conventional_bin_dirs(&env);
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/usr/local/bin"),
                PathBuf::from("/home/bot/.local/bin"),
                PathBuf::from("/home/bot/bin"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_fallback_dir_lookup_requires_exec_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let name = "openab-lookup-agent-7f3a";
        let candidate = dir.path().join(name);
        std::fs::write(&candidate, "#!/bin/sh\n").unwrap();

        let dirs = vec![dir.path().to_path_buf()];
        std::fs::set_permissions(&candidate, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(resolve_executable(name, &dirs), PathBuf::from(name));

        std::fs::set_permissions(&candidate, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(resolve_executable(name, &dirs), candidate);
    }
}
