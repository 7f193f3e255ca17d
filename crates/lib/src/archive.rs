//! Archive extraction for Maven distributions and assembled application zips.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("unsupported archive format: {0}")]
  Unsupported(PathBuf),

  #[error("unable to read archive {path}: {message}")]
  Read { path: PathBuf, message: String },

  #[error("io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Extract `archive_path` into `dest`, dropping the first `strip` path components of
/// every entry. Entries that become empty after stripping are skipped.
///
/// Supports `.tar.gz`, `.tgz`, `.tar` and `.zip`.
pub fn extract(archive_path: &Path, dest: &Path, strip: usize) -> Result<(), ArchiveError> {
  let name = archive_path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();

  fs::create_dir_all(dest).map_err(|source| ArchiveError::Io {
    path: dest.to_path_buf(),
    source,
  })?;

  if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
    let file = open(archive_path)?;
    unpack_tar(Archive::new(GzDecoder::new(BufReader::new(file))), archive_path, dest, strip)?;
  } else if name.ends_with(".tar") {
    let file = open(archive_path)?;
    unpack_tar(Archive::new(BufReader::new(file)), archive_path, dest, strip)?;
  } else if name.ends_with(".zip") {
    unpack_zip(archive_path, dest, strip)?;
  } else {
    return Err(ArchiveError::Unsupported(archive_path.to_path_buf()));
  }

  debug!(archive = ?archive_path, dest = ?dest, "extracted archive");
  Ok(())
}

fn open(path: &Path) -> Result<File, ArchiveError> {
  File::open(path).map_err(|source| ArchiveError::Io {
    path: path.to_path_buf(),
    source,
  })
}

fn stripped(path: &Path, strip: usize) -> Option<PathBuf> {
  let stripped: PathBuf = path.components().skip(strip).collect();
  (!stripped.as_os_str().is_empty()).then_some(stripped)
}

fn unpack_tar<R: std::io::Read>(
  mut archive: Archive<R>,
  archive_path: &Path,
  dest: &Path,
  strip: usize,
) -> Result<(), ArchiveError> {
  let read_err = |e: std::io::Error| ArchiveError::Read {
    path: archive_path.to_path_buf(),
    message: e.to_string(),
  };

  for entry in archive.entries().map_err(read_err)? {
    let mut entry = entry.map_err(read_err)?;
    let path = entry.path().map_err(read_err)?.into_owned();

    let Some(relative) = stripped(&path, strip) else {
      continue;
    };
    let dest_path = dest.join(&relative);

    if let Some(parent) = dest_path.parent() {
      fs::create_dir_all(parent).map_err(|source| ArchiveError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    // tar preserves the entry's mode bits on unix
    entry.unpack(&dest_path).map_err(|source| ArchiveError::Io {
      path: dest_path.clone(),
      source,
    })?;
  }

  Ok(())
}

fn unpack_zip(archive_path: &Path, dest: &Path, strip: usize) -> Result<(), ArchiveError> {
  let read_err = |e: zip::result::ZipError| ArchiveError::Read {
    path: archive_path.to_path_buf(),
    message: e.to_string(),
  };

  let file = open(archive_path)?;
  let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(read_err)?;

  for i in 0..archive.len() {
    let mut file = archive.by_index(i).map_err(read_err)?;

    let Some(path) = file.enclosed_name() else {
      return Err(ArchiveError::Read {
        path: archive_path.to_path_buf(),
        message: format!("invalid entry name {:?}", file.name()),
      });
    };

    let Some(relative) = stripped(&path, strip) else {
      continue;
    };
    let dest_path = dest.join(&relative);
    let io_err = |source| ArchiveError::Io {
      path: dest_path.clone(),
      source,
    };

    if file.is_dir() {
      fs::create_dir_all(&dest_path).map_err(io_err)?;
      continue;
    }

    if let Some(parent) = dest_path.parent() {
      fs::create_dir_all(parent).map_err(|source| ArchiveError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    let mut outfile = File::create(&dest_path).map_err(io_err)?;
    std::io::copy(&mut file, &mut outfile).map_err(io_err)?;

    #[cfg(unix)]
    {
      use std::os::unix::fs::PermissionsExt;
      if let Some(mode) = file.unix_mode() {
        fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode)).map_err(io_err)?;
      }
    }
  }

  Ok(())
}
