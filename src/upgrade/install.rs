//! Copy a verified payload over the installation directory.
//!
//! Installation is not atomic: each existing file is deleted and then written
//! again, one file at a time. A failure part-way leaves earlier files replaced.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use super::download::CHECKSUM_ASSET;
use crate::core::{Result, UpdateError};

/// Permission bits for files that did not exist before.
pub const DEFAULT_INSTALL_MODE: u32 = 0o644;

/// Returns `true` for downloaded artifacts that must never be installed.
#[must_use]
pub fn is_release_artifact(name: &str) -> bool {
    name == CHECKSUM_ASSET
        || name.ends_with(".zip")
        || name.ends_with(".tar.gz")
        || name.ends_with(".tgz")
}

/// Copy every file under `payload_dir` into `target_dir`, keeping relative paths.
///
/// Archives and the checksum manifest are skipped at any depth. Files that
/// already exist keep their permission bits; new files get
/// [`DEFAULT_INSTALL_MODE`]. Returns the number of files installed.
///
/// # Errors
///
/// Returns [`UpdateError::Io`] for the first file that cannot be replaced.
pub async fn install(payload_dir: &Path, target_dir: &Path) -> Result<usize> {
    let payload_dir = payload_dir.to_path_buf();
    let target_dir = target_dir.to_path_buf();
    tokio::task::spawn_blocking(move || install_blocking(&payload_dir, &target_dir)).await?
}

fn install_blocking(payload_dir: &Path, target_dir: &Path) -> Result<usize> {
    let mut installed = 0;

    let walker = WalkDir::new(payload_dir).min_depth(1).into_iter().filter_entry(|entry| {
        !entry.file_name().to_str().is_some_and(is_release_artifact)
    });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(payload_dir).to_path_buf();
            let source = e.into_io_error().unwrap_or_else(|| std::io::Error::other("file system loop"));
            UpdateError::io("walk payload", &path, source)
        })?;

        let relative = entry.path().strip_prefix(payload_dir).unwrap_or(entry.path());
        let dest = target_dir.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&dest).map_err(|e| UpdateError::io("create directory", &dest, e))?;
        } else if file_type.is_file() {
            info!("Copy {} to {}", entry.path().display(), dest.display());
            install_file(entry.path(), &dest)?;
            installed += 1;
        } else {
            debug!("Skipping special file {}", entry.path().display());
        }
    }

    Ok(installed)
}

fn install_file(src: &Path, dest: &Path) -> Result<()> {
    let previous = match fs::metadata(dest) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(UpdateError::io("inspect installed file", dest, e)),
    };

    if previous.is_some() {
        fs::remove_file(dest).map_err(|e| UpdateError::io("remove installed file", dest, e))?;
    } else if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| UpdateError::io("create directory", parent, e))?;
    }

    fs::copy(src, dest).map_err(|e| UpdateError::io("copy payload file", dest, e))?;

    match previous {
        Some(permissions) => fs::set_permissions(dest, permissions)
            .map_err(|e| UpdateError::io("restore permissions", dest, e)),
        None => set_default_mode(dest),
    }
}

#[cfg(unix)]
fn set_default_mode(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(DEFAULT_INSTALL_MODE))
        .map_err(|e| UpdateError::io("set permissions", path, e))
}

#[cfg(not(unix))]
fn set_default_mode(_path: &Path) -> Result<()> {
    Ok(())
}

/// Directory of the running executable, after one level of symlink.
///
/// # Errors
///
/// Returns [`UpdateError::ProcessPath`] if the executable path cannot be
/// determined or inspected.
pub fn resolve_install_target() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| UpdateError::ProcessPath {
        reason: e.to_string(),
    })?;
    install_target_for(&exe)
}

/// Directory `exe` would be updated in.
///
/// If `exe` is a symlink, its target's directory is used; a relative target is
/// resolved against the link's own directory.
///
/// # Errors
///
/// Returns [`UpdateError::ProcessPath`] if `exe` cannot be inspected or has no parent.
pub fn install_target_for(exe: &Path) -> Result<PathBuf> {
    let process_error = |reason: String| UpdateError::ProcessPath {
        reason,
    };

    let metadata = fs::symlink_metadata(exe).map_err(|e| {
        process_error(format!("error getting information from {}: {e}", exe.display()))
    })?;

    let resolved = if metadata.file_type().is_symlink() {
        let target = fs::read_link(exe)
            .map_err(|e| process_error(format!("error reading link {}: {e}", exe.display())))?;
        if target.is_absolute() {
            target
        } else {
            exe.parent().map_or_else(|| target.clone(), |parent| parent.join(&target))
        }
    } else {
        exe.to_path_buf()
    };

    resolved
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| process_error(format!("{} has no parent directory", resolved.display())))
}
