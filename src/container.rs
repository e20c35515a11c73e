//! Ebook container assembly.
//!
//! Stage 4 of the conversion pipeline. Each record is built in its own
//! [`Scratch`] directory: the template scaffold is copied in, the generated
//! pages, diagrams and manifests are written next to it, and the whole tree
//! is then serialized into a single zip archive.
//!
//! ## Archive Layout
//!
//! ```text
//! Test_Cup_1.epub
//! ├── mimetype                    # entry 0, stored (uncompressed)
//! ├── EPUB/Images/diagram_001.svg # everything else deflated, sorted walk order
//! ├── EPUB/Styles/style.css
//! ├── EPUB/Text/page_001.html
//! ├── EPUB/content.opf
//! ├── EPUB/toc.ncx
//! └── META-INF/container.xml
//! ```
//!
//! Readers identify the format by the bytes at a fixed offset of the archive,
//! which only holds when `mimetype` is the first entry and is not compressed.
//!
//! A failed write removes the partial archive, so an existing book is either
//! replaced by a complete one or deleted.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name of the format marker entry.
pub const MIMETYPE_FILE: &str = "mimetype";
/// Expected content of the format marker.
pub const MIMETYPE: &str = "application/epub+zip";
/// Directory of the generated pages inside the container.
pub const TEXT_DIR: &str = "EPUB/Text";
/// Directory of the generated diagrams inside the container.
pub const IMAGES_DIR: &str = "EPUB/Images";

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("scaffold has no mimetype file: {0}")]
    MissingMimetype(PathBuf),
}

/// Per-record working directory, removed when dropped.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create a scratch directory holding a copy of `scaffold`.
    ///
    /// Files whose scaffold-relative path (with `/` separators) appears in
    /// `skip` are not copied; these are template sources that get rendered
    /// instead.
    pub fn new(scaffold: &Path, skip: &[&str]) -> Result<Self, ContainerError> {
        let dir = tempfile::Builder::new().prefix("sgf2ebook-").tempdir()?;
        let marker = scaffold.join(MIMETYPE_FILE);
        if !marker.is_file() {
            return Err(ContainerError::MissingMimetype(scaffold.to_path_buf()));
        }
        if fs::read_to_string(&marker)?.trim_end() != MIMETYPE {
            tracing::warn!(path = %marker.display(), "unexpected mimetype content");
        }

        for (source, relative) in walk_files(scaffold)? {
            if skip.contains(&relative.as_str()) {
                continue;
            }
            let target = dir.path().join(&relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&source, &target)?;
            tracing::debug!(file = %relative, "copied scaffold file");
        }

        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a container-relative file inside the scratch directory.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write a generated file, creating parent directories as needed.
    pub fn write(&self, relative: &str, contents: &[u8]) -> Result<PathBuf, ContainerError> {
        let path = self.resolve(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Create a container-relative directory.
    pub fn prepare_dir(&self, relative: &str) -> Result<PathBuf, ContainerError> {
        let path = self.resolve(relative);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Serialize the scratch tree into a zip archive at `output`.
    ///
    /// Returns the number of entries written. A partially written archive is
    /// removed on failure.
    pub fn package(&self, output: &Path) -> Result<usize, ContainerError> {
        let root = self.dir.path();
        if !root.join(MIMETYPE_FILE).is_file() {
            return Err(ContainerError::MissingMimetype(root.to_path_buf()));
        }

        let file = File::create(output)?;
        match write_archive(root, file) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                let _ = fs::remove_file(output);
                Err(err)
            }
        }
    }
}

/// Write `mimetype` stored, then every other file deflated.
fn write_archive(root: &Path, file: File) -> Result<usize, ContainerError> {
    let mut zip = ZipWriter::new(file);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(MIMETYPE_FILE, stored)?;
    zip.write_all(&fs::read(root.join(MIMETYPE_FILE))?)?;
    let mut entries = 1;

    for (source, relative) in walk_files(root)? {
        if relative == MIMETYPE_FILE {
            continue;
        }
        zip.start_file(relative.as_str(), deflated)?;
        zip.write_all(&fs::read(&source)?)?;
        entries += 1;
    }
    zip.finish()?;
    Ok(entries)
}

/// Every regular file under `root` in sorted walk order, paired with its
/// root-relative path using `/` separators.
fn walk_files(root: &Path) -> Result<Vec<(PathBuf, String)>, ContainerError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| ContainerError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map(relative_name)
            .unwrap_or_default();
        files.push((entry.path().to_path_buf(), relative));
    }
    Ok(files)
}

fn relative_name(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
