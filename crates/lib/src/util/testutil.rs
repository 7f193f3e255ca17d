//! Test utilities for mvnpack-lib.
//!
//! Builders for the archives the build consumes and produces: JAR/WAR files with
//! chosen entries, and `.tar.gz` distributions with a single top-level directory.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use zip::write::SimpleFileOptions;

/// Write a zip archive at `path` with the given `(name, content)` entries.
///
/// Names ending in `/` become directory entries.
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  let file = File::create(path).unwrap();
  let mut zip = zip::ZipWriter::new(file);
  let options = SimpleFileOptions::default();
  for (name, content) in entries {
    if name.ends_with('/') {
      zip.add_directory(*name, options).unwrap();
    } else {
      zip.start_file(*name, options).unwrap();
      zip.write_all(content.as_bytes()).unwrap();
    }
  }
  zip.finish().unwrap();
}

/// A JAR whose manifest names a main class.
pub fn write_executable_jar(path: &Path) {
  write_zip(
    path,
    &[(
      "META-INF/MANIFEST.MF",
      "Manifest-Version: 1.0\r\nMain-Class: com.example.Application\r\n",
    )],
  );
}

/// A JAR with a manifest but no main class (sources, javadoc, plain libraries).
pub fn write_plain_jar(path: &Path) {
  write_zip(path, &[("META-INF/MANIFEST.MF", "Manifest-Version: 1.0\r\n")]);
}

/// A WAR with a `WEB-INF/` directory entry.
pub fn write_war(path: &Path) {
  write_zip(path, &[("WEB-INF/", ""), ("WEB-INF/web.xml", "<web-app/>")]);
}

/// Write a `.tar.gz` at `path` whose entries all live under `top/`.
///
/// Each entry is `(relative name, content, mode)`.
pub fn write_tar_gz(path: &Path, top: &str, entries: &[(&str, &str, u32)]) {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  let file = File::create(path).unwrap();
  let encoder = GzEncoder::new(file, Compression::default());
  let mut builder = tar::Builder::new(encoder);
  for (name, content, mode) in entries {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(*mode);
    header.set_cksum();
    builder
      .append_data(&mut header, format!("{}/{}", top, name), content.as_bytes())
      .unwrap();
  }
  builder.into_inner().unwrap().finish().unwrap();
}

/// Write an executable shell script.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
  use std::os::unix::fs::PermissionsExt;
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}
