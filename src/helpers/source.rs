//! Input files held in memory for one import attempt

use crate::error::Gl860Error;
use crate::error::ResultMessage;
use sha2::Digest;
use sha2::Sha256;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// A spreadsheet read once from disk.
///
/// The bytes back both the content fingerprint and the workbook reader, so the
/// file is never opened twice for one import.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Final path component, used as `source_file` in the readings table
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Reads the whole file into memory.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<SourceFile, Gl860Error> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(Gl860Error::from)
            .with_prefix(&format!("Read '{}'", path.display()))?;
        Ok(SourceFile {
            path: path.to_path_buf(),
            name: file_name(path),
            bytes,
        })
    }

    /// Wraps bytes that did not come from disk.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> SourceFile {
        SourceFile {
            path: PathBuf::from(name),
            name: name.to_owned(),
            bytes,
        }
    }

    /// SHA-256 of the file content as lowercase hex.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }
}

/// Final path component, or the whole path when it has none.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_fingerprint_of_known_content() {
        let source = SourceFile::from_bytes("GL860_2508.xlsx", b"abc".to_vec());
        assert_eq!(
            source.fingerprint(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_tracks_content_not_name() {
        let first = SourceFile::from_bytes("GL860_2508.xlsx", vec![1, 2, 3]);
        let renamed = SourceFile::from_bytes("copy_2508.xlsx", vec![1, 2, 3]);
        let changed = SourceFile::from_bytes("GL860_2508.xlsx", vec![1, 2, 4]);
        assert_eq!(first.fingerprint(), renamed.fingerprint());
        assert_ne!(first.fingerprint(), changed.fingerprint());
    }

    #[test]
    fn test_read_from_disk() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("RAWDATA_2509.xlsx");
        fs::File::create(&path).unwrap().write_all(b"abc").unwrap();

        let source = SourceFile::read(&path).unwrap();
        assert_eq!(source.name, "RAWDATA_2509.xlsx");
        assert_eq!(source.bytes, b"abc");
    }

    #[test]
    fn test_read_missing_file_names_the_path() {
        let error = SourceFile::read("/nonexistent/RAWDATA_2509.xlsx").unwrap_err();
        assert!(error.to_string().contains("RAWDATA_2509.xlsx"));
    }
}
