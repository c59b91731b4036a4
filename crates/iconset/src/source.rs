//! Byte sources: where a bundle's files come from.
//!
//! A bundle origin is either a plain directory or a zip archive (`.zip` or
//! `.jisp`). Both are read through [`ByteSource`], keyed by the logical paths
//! that appear in the manifest.
//!
//! Inside an archive, files are looked up under a folder named after the
//! archive first (`smileys.jisp` → `smileys/icondef.xml`) and then at the
//! archive root.

use std::fs;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use iconset_core::logging::targets;

use crate::error::{IconsetError, IconsetErrorKind, IconsetResult};

/// File extensions recognised as bundle archives (compared case-insensitively).
pub const ARCHIVE_EXTENSIONS: &[&str] = &["jisp", "zip"];

/// Largest archive entry that will be decompressed.
pub const MAX_ENTRY_BYTES: u64 = 64 * 1024 * 1024;

/// Which kind of origin a source reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A directory on disk.
    Directory,
    /// A zip archive.
    Archive,
}

/// Read access to the files of one bundle origin.
pub trait ByteSource: std::fmt::Debug {
    /// Read the file at `path`, relative to the bundle root.
    fn read_file(&mut self, path: &str) -> IconsetResult<Vec<u8>>;

    /// The origin this source reads from.
    fn origin(&self) -> &Path;

    /// Directory or archive.
    fn kind(&self) -> SourceKind;
}

/// Open the right source for `origin`.
///
/// Directories are read directly. Any other path must carry one of the
/// [`ARCHIVE_EXTENSIONS`].
pub fn open_source(origin: &Path) -> IconsetResult<Box<dyn ByteSource>> {
    if origin.is_dir() {
        return Ok(Box::new(DirectorySource::new(origin)));
    }
    if is_archive_path(origin) {
        return Ok(Box::new(ArchiveSource::open(origin)?));
    }
    Err(IconsetError::new(
        IconsetErrorKind::UnsupportedSource,
        Some(origin.to_path_buf()),
        None,
    ))
}

/// Whether the path has an archive extension.
pub fn is_archive_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ARCHIVE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

// ============================================================================
// Directory
// ============================================================================

/// Reads files below a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The on-disk path a logical path maps to.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl ByteSource for DirectorySource {
    fn read_file(&mut self, path: &str) -> IconsetResult<Vec<u8>> {
        let full = self.resolve(path);
        fs::read(&full).map_err(|e| IconsetError::from_io(e, full))
    }

    fn origin(&self) -> &Path {
        &self.root
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Directory
    }
}

// ============================================================================
// Archive
// ============================================================================

/// Reads files from a zip archive.
pub struct ArchiveSource {
    path: PathBuf,
    /// Folder named after the archive's file stem.
    prefix: String,
    archive: zip::ZipArchive<BufReader<fs::File>>,
}

impl ArchiveSource {
    /// Open the archive at `path`.
    pub fn open(path: impl Into<PathBuf>) -> IconsetResult<Self> {
        let path = path.into();
        let file = fs::File::open(&path).map_err(|e| IconsetError::from_io(e, &path))?;
        let archive = zip::ZipArchive::new(BufReader::new(file)).map_err(|e| {
            IconsetError::new(
                IconsetErrorKind::Archive,
                Some(path.clone()),
                Some(Box::new(e)),
            )
        })?;

        let prefix = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path,
            prefix,
            archive,
        })
    }

    fn read_entry(&mut self, name: &str) -> IconsetResult<Option<Vec<u8>>> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => {
                return Err(IconsetError::new(
                    IconsetErrorKind::Archive,
                    Some(self.path.join(name)),
                    Some(Box::new(e)),
                ));
            }
        };

        let data = read_limited(&mut entry, MAX_ENTRY_BYTES)
            .map_err(|e| IconsetError::from_io(e, self.path.join(name)))?;
        Ok(Some(data))
    }
}

impl ByteSource for ArchiveSource {
    fn read_file(&mut self, path: &str) -> IconsetResult<Vec<u8>> {
        let path = path.trim_start_matches('/');

        if !self.prefix.is_empty() {
            let nested = format!("{}/{}", self.prefix, path);
            if let Some(data) = self.read_entry(&nested)? {
                return Ok(data);
            }
        }

        match self.read_entry(path)? {
            Some(data) => Ok(data),
            None => {
                tracing::trace!(target: targets::SOURCE, archive = %self.path.display(), path, "entry not in archive");
                Err(IconsetError::not_found(self.path.join(path)))
            }
        }
    }

    fn origin(&self) -> &Path {
        &self.path
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Archive
    }
}

/// Read `reader` to the end, failing with `InvalidData` past `limit` bytes.
fn read_limited(reader: impl Read, limit: u64) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut data)?;
    if data.len() as u64 > limit {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("entry larger than {limit} bytes"),
        ));
    }
    Ok(data)
}

impl std::fmt::Debug for ArchiveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveSource")
            .field("path", &self.path)
            .field("entries", &self.archive.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_archive_extension_detection() {
        assert!(is_archive_path(Path::new("smileys.jisp")));
        assert!(is_archive_path(Path::new("/x/Smileys.ZIP")));
        assert!(!is_archive_path(Path::new("smileys.tar")));
        assert!(!is_archive_path(Path::new("smileys")));
    }

    #[test]
    fn test_directory_source_reads_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/a.png"), b"abc").unwrap();

        let mut source = open_source(dir.path()).unwrap();
        assert_eq!(source.kind(), SourceKind::Directory);
        assert_eq!(source.read_file("img/a.png").unwrap(), b"abc");
        assert_eq!(source.read_file("/img/a.png").unwrap(), b"abc");
        assert!(source.read_file("missing.png").unwrap_err().is_not_found());
    }

    #[test]
    fn test_archive_prefers_stem_folder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faces.jisp");
        write_zip(
            &path,
            &[
                ("faces/icondef.xml", b"nested"),
                ("icondef.xml", b"root"),
                ("only-root.png", b"png"),
            ],
        );

        let mut source = open_source(&path).unwrap();
        assert_eq!(source.kind(), SourceKind::Archive);
        assert_eq!(source.origin(), path.as_path());
        assert_eq!(source.read_file("icondef.xml").unwrap(), b"nested");
        assert_eq!(source.read_file("only-root.png").unwrap(), b"png");
        assert!(source.read_file("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_unsupported_and_broken_sources() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("notes.txt");
        fs::write(&plain, b"hello").unwrap();
        let err = open_source(&plain).unwrap_err();
        assert_eq!(err.kind(), IconsetErrorKind::UnsupportedSource);

        let broken = dir.path().join("broken.zip");
        fs::write(&broken, b"not a zip").unwrap();
        let err = open_source(&broken).unwrap_err();
        assert_eq!(err.kind(), IconsetErrorKind::Archive);

        let missing = dir.path().join("missing.jisp");
        assert!(open_source(&missing).unwrap_err().is_not_found());
    }

    #[test]
    fn test_sources_are_debug() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faces.zip");
        write_zip(&path, &[("icondef.xml", b"root")]);

        let archive = open_source(&path).unwrap();
        assert!(format!("{archive:?}").contains("ArchiveSource"));
        let directory = open_source(dir.path()).unwrap();
        assert!(format!("{directory:?}").contains("DirectorySource"));
    }

    #[test]
    fn test_entry_reads_are_bounded() {
        assert_eq!(read_limited(&b"1234"[..], 4).unwrap(), b"1234");
        let err = read_limited(&b"12345"[..], 4).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(read_limited(std::io::repeat(0), 1024).is_err());
    }
}
