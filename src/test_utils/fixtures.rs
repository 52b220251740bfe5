//! Test fixtures for release packages
//!
//! Builders for zip and gzip-compressed tar archives, checksum manifests and
//! provider listing JSON. Archive entry names are written verbatim, so
//! fixtures can contain names like `../../evil` that archive builders would
//! normally refuse.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::json;
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;

/// What an [`ArchiveEntry`] holds.
#[derive(Clone, Debug)]
pub enum EntryKind {
    /// Regular file with contents and permission bits
    File {
        contents: Vec<u8>,
        mode: u32,
    },
    /// Directory
    Dir,
    /// Symbolic link pointing at `target`
    Symlink {
        target: String,
    },
}

/// One entry of a fixture archive.
#[derive(Clone, Debug)]
pub struct ArchiveEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl ArchiveEntry {
    /// Regular file entry
    pub fn file(name: &str, contents: &[u8], mode: u32) -> Self {
        Self {
            name: name.to_string(),
            kind: EntryKind::File {
                contents: contents.to_vec(),
                mode,
            },
        }
    }

    /// Directory entry
    pub fn dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: EntryKind::Dir,
        }
    }

    /// Symlink entry
    pub fn symlink(name: &str, target: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: EntryKind::Symlink {
                target: target.to_string(),
            },
        }
    }
}

/// Write a zip archive containing `entries` to `path`.
pub fn write_zip(path: &Path, entries: &[ArchiveEntry]) {
    let file = File::create(path).expect("create zip fixture");
    let mut writer = zip::ZipWriter::new(file);

    for entry in entries {
        match &entry.kind {
            EntryKind::File {
                contents,
                mode,
            } => {
                let options = SimpleFileOptions::default().unix_permissions(*mode);
                writer.start_file(entry.name.as_str(), options).expect("start zip entry");
                writer.write_all(contents).expect("write zip entry");
            }
            EntryKind::Dir => {
                let options = SimpleFileOptions::default().unix_permissions(0o755);
                writer.add_directory(entry.name.as_str(), options).expect("add zip directory");
            }
            EntryKind::Symlink {
                target,
            } => {
                let options = SimpleFileOptions::default();
                writer
                    .add_symlink(entry.name.as_str(), target.as_str(), options)
                    .expect("add zip symlink");
            }
        }
    }

    writer.finish().expect("finish zip fixture");
}

fn tar_header(name: &str, entry_type: tar::EntryType, size: u64, mode: u32) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    let raw = name.as_bytes();
    assert!(raw.len() < 100, "fixture entry names must fit the tar name field");
    header.as_old_mut().name[..raw.len()].copy_from_slice(raw);
    header.set_entry_type(entry_type);
    header.set_size(size);
    header.set_mode(mode);
    header.set_mtime(0);
    header
}

/// Write a gzip-compressed tar archive containing `entries` to `path`.
pub fn write_tar_gz(path: &Path, entries: &[ArchiveEntry]) {
    let file = File::create(path).expect("create tar fixture");
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    for entry in entries {
        match &entry.kind {
            EntryKind::File {
                contents,
                mode,
            } => {
                let mut header =
                    tar_header(&entry.name, tar::EntryType::Regular, contents.len() as u64, *mode);
                header.set_cksum();
                builder.append(&header, contents.as_slice()).expect("append tar file");
            }
            EntryKind::Dir => {
                let mut header = tar_header(&entry.name, tar::EntryType::Directory, 0, 0o755);
                header.set_cksum();
                builder.append(&header, std::io::empty()).expect("append tar directory");
            }
            EntryKind::Symlink {
                target,
            } => {
                let mut header = tar_header(&entry.name, tar::EntryType::Symlink, 0, 0o777);
                header.set_link_name(target).expect("set symlink target");
                header.set_cksum();
                builder.append(&header, std::io::empty()).expect("append tar symlink");
            }
        }
    }

    builder.into_inner().expect("finish tar").finish().expect("finish gzip");
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// `checksums.txt` content listing each `(file name, contents)` pair.
pub fn checksum_manifest(files: &[(&str, &[u8])]) -> String {
    files
        .iter()
        .map(|(name, contents)| format!("{}  {}\n", sha256_hex(contents), name))
        .collect()
}

/// GitHub listing JSON for `tags`, each with the given asset names served under `base_url`.
pub fn github_listing(base_url: &str, tags: &[&str], assets: &[&str]) -> serde_json::Value {
    let releases: Vec<_> = tags
        .iter()
        .map(|tag| {
            json!({
                "tag_name": tag,
                "body": format!("Release {tag}"),
                "published_at": "2024-05-01T10:00:00Z",
                "assets": assets
                    .iter()
                    .map(|name| json!({
                        "name": name,
                        "browser_download_url": format!("{base_url}/download/{tag}/{name}"),
                    }))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();
    serde_json::Value::Array(releases)
}

/// GitLab listing JSON for `tags`, each with the given asset links served under `base_url`.
pub fn gitlab_listing(base_url: &str, tags: &[&str], assets: &[&str]) -> serde_json::Value {
    let releases: Vec<_> = tags
        .iter()
        .map(|tag| {
            json!({
                "tag_name": tag,
                "description": format!("Release {tag}"),
                "released_at": "2024-05-01T10:00:00.000Z",
                "assets": {
                    "links": assets
                        .iter()
                        .map(|name| json!({
                            "name": name,
                            "url": format!("{base_url}/download/{tag}/{name}"),
                        }))
                        .collect::<Vec<_>>(),
                },
            })
        })
        .collect();
    serde_json::Value::Array(releases)
}
