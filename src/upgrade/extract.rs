//! Unpack the downloaded release package next to itself.
//!
//! Supported formats are `.zip` and gzip-compressed tarballs (`.tar.gz`, `.tgz`).
//! Entries are validated before anything is written: a single entry that would
//! land outside the archive's directory, that is neither a regular file nor a
//! directory, or that would replace a file already in that directory (the
//! archive itself, the checksum manifest) rejects the whole archive.
//!
//! Archive decoding is blocking work and runs on tokio's blocking pool.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::core::{Result, UpdateError};

/// Permission bits for entries that do not record any.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

const UNIX_FILE_TYPE_MASK: u32 = 0o170_000;
const UNIX_SYMLINK: u32 = 0o120_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    fn detect(path: &Path) -> Result<Self> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.ends_with(".zip") {
            Ok(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Ok(Self::TarGz)
        } else {
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| format!(".{ext}"))
                .unwrap_or_default();
            Err(UpdateError::UnsupportedFormat {
                extension,
            })
        }
    }
}

/// Extract `archive` into the directory that contains it.
///
/// Returns the number of entries written (files and directories).
///
/// # Errors
///
/// - [`UpdateError::UnsupportedFormat`] for anything but zip or tar+gzip
/// - [`UpdateError::PathTraversal`] if an entry name or the destination
///   directory contains a `..` component, or an entry name is absolute
/// - [`UpdateError::UnsupportedEntry`] for symlinks, devices and other special entries
/// - [`UpdateError::StagedFileOverwrite`] if a file entry targets a file that
///   already exists in the destination
/// - [`UpdateError::Archive`] / [`UpdateError::Io`] for corrupt archives or write failures
pub async fn extract(archive: &Path) -> Result<usize> {
    let archive = archive.to_path_buf();
    tokio::task::spawn_blocking(move || extract_archive(&archive)).await?
}

fn extract_archive(archive: &Path) -> Result<usize> {
    let format = ArchiveFormat::detect(archive)?;
    let dest = archive.parent().unwrap_or_else(|| Path::new("."));

    if dest.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(UpdateError::PathTraversal {
            entry: dest.display().to_string(),
        });
    }

    info!("Decompressing files");
    let count = match format {
        ArchiveFormat::Zip => extract_zip(archive, dest)?,
        ArchiveFormat::TarGz => extract_tar_gz(archive, dest)?,
    };
    info!("{} decompressed files from {}", count, archive.display());

    Ok(count)
}

/// Turn an entry name into a path relative to the destination.
///
/// `.` components are dropped; `..`, roots and drive prefixes are rejected.
fn sanitize_entry_name(name: &str) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(UpdateError::PathTraversal {
                    entry: name.to_string(),
                });
            }
        }
    }
    Ok(relative)
}

/// Reject a file entry that would replace a file already present in `dest`.
fn ensure_not_staged(dest: &Path, relative: &Path, name: &str) -> Result<()> {
    let path = dest.join(relative);
    match fs::symlink_metadata(&path) {
        Ok(meta) if !meta.is_dir() => Err(UpdateError::StagedFileOverwrite {
            entry: name.to_string(),
            path,
        }),
        _ => Ok(()),
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| UpdateError::io("open archive", path, e))
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| UpdateError::io("create directory", path, e))
}

fn write_entry(path: &Path, reader: &mut impl io::Read, mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }

    let mut out = File::create(path).map_err(|e| UpdateError::io("create extracted file", path, e))?;
    io::copy(reader, &mut out).map_err(|e| UpdateError::io("write extracted file", path, e))?;
    drop(out);

    set_mode(path, mode)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777))
        .map_err(|e| UpdateError::io("set permissions", path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

fn extract_zip(archive_path: &Path, dest: &Path) -> Result<usize> {
    let archive_error = |source| UpdateError::Archive {
        path: archive_path.to_path_buf(),
        source,
    };
    let mut archive = zip::ZipArchive::new(open(archive_path)?).map_err(archive_error)?;

    // Validate every entry before writing any of them.
    let mut plan = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(archive_error)?;
        let name = entry.name().to_string();
        let relative = sanitize_entry_name(&name)?;

        if let Some(mode) = entry.unix_mode()
            && mode & UNIX_FILE_TYPE_MASK == UNIX_SYMLINK
        {
            return Err(UpdateError::UnsupportedEntry {
                entry: name,
                kind: "symlink".to_string(),
            });
        }

        if !entry.is_dir() {
            if relative.as_os_str().is_empty() {
                return Err(UpdateError::PathTraversal {
                    entry: name,
                });
            }
            ensure_not_staged(dest, &relative, &name)?;
        }
        plan.push(relative);
    }

    for (index, relative) in plan.into_iter().enumerate() {
        let mut entry = archive.by_index(index).map_err(archive_error)?;
        let path = dest.join(&relative);

        if entry.is_dir() {
            debug!("Creating directory {}", path.display());
            create_dir(&path)?;
        } else {
            debug!("Extracting {}", path.display());
            let mode = entry.unix_mode().unwrap_or(DEFAULT_FILE_MODE);
            write_entry(&path, &mut entry, mode)?;
        }
    }

    Ok(archive.len())
}

fn tar_entries_error(archive: &Path) -> impl Fn(io::Error) -> UpdateError + '_ {
    move |e| UpdateError::io("read tar archive", archive, e)
}

fn open_tar(path: &Path) -> Result<tar::Archive<GzDecoder<File>>> {
    Ok(tar::Archive::new(GzDecoder::new(open(path)?)))
}

fn extract_tar_gz(archive_path: &Path, dest: &Path) -> Result<usize> {
    let read_error = tar_entries_error(archive_path);

    // First pass: headers only, so a bad entry late in the stream still
    // rejects the archive before anything is written.
    let mut archive = open_tar(archive_path)?;
    for entry in archive.entries().map_err(&read_error)? {
        let entry = entry.map_err(&read_error)?;
        let name = entry.path().map_err(&read_error)?.to_string_lossy().into_owned();
        let entry_type = entry.header().entry_type();

        if entry_type.is_pax_global_extensions() {
            continue;
        }
        let relative = sanitize_entry_name(&name)?;
        if !(entry_type.is_file() || entry_type.is_dir()) {
            return Err(UpdateError::UnsupportedEntry {
                entry: name,
                kind: format!("{entry_type:?}").to_lowercase(),
            });
        }
        if entry_type.is_file() {
            if relative.as_os_str().is_empty() {
                return Err(UpdateError::PathTraversal {
                    entry: name,
                });
            }
            ensure_not_staged(dest, &relative, &name)?;
        }
    }

    let mut count = 0;
    let mut archive = open_tar(archive_path)?;
    for entry in archive.entries().map_err(&read_error)? {
        let mut entry = entry.map_err(&read_error)?;
        let entry_type = entry.header().entry_type();
        if entry_type.is_pax_global_extensions() {
            continue;
        }

        let name = entry.path().map_err(&read_error)?.to_string_lossy().into_owned();
        let path = dest.join(sanitize_entry_name(&name)?);

        if entry_type.is_dir() {
            debug!("Creating directory {}", path.display());
            create_dir(&path)?;
        } else {
            debug!("Extracting {}", path.display());
            let mode = entry.header().mode().unwrap_or(DEFAULT_FILE_MODE);
            write_entry(&path, &mut entry, mode)?;
        }
        count += 1;
    }

    Ok(count)
}
