//! On-disk layout for uploaded and processed images.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref UNSAFE_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
}

/// URL prefix the upload directory is served under.
pub const UPLOADS_URL_PREFIX: &str = "/static/uploads";

/// Prefix of the binarised copy written next to each upload.
pub const PROCESSED_PREFIX: &str = "processed_";

/// Reduce a client-supplied filename to a safe ASCII name.
///
/// Returns `None` when nothing usable is left.
pub fn secure_filename(name: &str) -> Option<String> {
    let ascii: String = name
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Directory holding uploads and their processed copies.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it does not exist.
    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)
    }

    pub fn original_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    pub fn processed_path(&self, filename: &str) -> PathBuf {
        self.root.join(format!("{PROCESSED_PREFIX}{filename}"))
    }

    /// Write an upload under its sanitised name. An existing file is replaced.
    pub fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<(String, PathBuf)> {
        let safe = secure_filename(filename).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("unusable filename: {filename:?}"))
        })?;

        self.ensure()?;
        let path = self.original_path(&safe);
        fs::write(&path, bytes)?;
        debug!("Saved upload {} ({} bytes)", path.display(), bytes.len());

        Ok((safe, path))
    }

    /// Public URL of a file stored in this directory.
    pub fn public_url(path: impl AsRef<Path>) -> String {
        let name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{UPLOADS_URL_PREFIX}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My Scan.png").as_deref(), Some("My_Scan.png"));
        assert_eq!(secure_filename("../../etc/passwd").as_deref(), Some("etc_passwd"));
        assert_eq!(secure_filename("C:\\temp\\x.jpg").as_deref(), Some("C_temp_x.jpg"));
        assert_eq!(secure_filename(".hidden").as_deref(), Some("hidden"));
        assert_eq!(secure_filename("नमस्ते.jpg").as_deref(), Some("jpg"));
        assert_eq!(secure_filename("a$b%c.png").as_deref(), Some("abc.png"));
        assert_eq!(secure_filename("..."), None);
        assert_eq!(secure_filename(""), None);
    }

    #[test]
    fn test_paths_and_urls() {
        let dir = UploadDir::new("static/uploads");
        assert_eq!(dir.original_path("a.png"), PathBuf::from("static/uploads/a.png"));
        assert_eq!(
            dir.processed_path("a.png"),
            PathBuf::from("static/uploads/processed_a.png")
        );
        assert_eq!(
            UploadDir::public_url(dir.processed_path("a.png")),
            "/static/uploads/processed_a.png"
        );
    }

    #[test]
    fn test_save_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = UploadDir::new(tmp.path().join("uploads"));

        let (name, path) = dir.save("sample page.png", b"first").unwrap();
        assert_eq!(name, "sample_page.png");
        dir.save("sample page.png", b"second").unwrap();

        assert_eq!(fs::read(path).unwrap(), b"second");
        assert!(dir.save("//", b"x").is_err());
    }
}
