//! Raw response archive
//!
//! Optionally mirrors every successful API body to disk, one file per
//! distinct URL:
//!
//! ```text
//! <root>/api/v1/courses/1/modules.json/default.json
//! <root>/api/v1/courses/1/modules.json/page%3D2%26per_page%3D10.json
//! ```

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::trace;
use url::{form_urlencoded, Url};

const EXTENSION: &str = ".json";

/// Writes response bodies under a root directory
#[derive(Debug, Clone)]
pub struct ResponseArchive {
    root: PathBuf,
}

impl ResponseArchive {
    /// Create an archive rooted at `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Archive root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File a response for `url` is stored in
    pub fn location(&self, url: &Url) -> PathBuf {
        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty() && *s != "." && *s != "..")
                    .collect()
            })
            .unwrap_or_default();

        let mut dir = self.root.clone();
        match segments.split_last() {
            Some((last, parents)) => {
                for segment in parents {
                    dir.push(segment);
                }
                dir.push(format!("{last}{EXTENSION}"));
            }
            None => dir.push(format!("index{EXTENSION}")),
        }

        let file = match url.query() {
            Some(query) if !query.is_empty() => {
                let escaped: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
                format!("{escaped}{EXTENSION}")
            }
            _ => format!("default{EXTENSION}"),
        };
        dir.join(file)
    }

    /// Write `body` for `url`, creating directories as needed
    pub async fn save(&self, url: &Url, body: &[u8]) -> Result<PathBuf> {
        let path = self.location(url);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, body).await?;
        trace!("Archived {} to {}", url, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod archive_tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_location_without_query() {
        let archive = ResponseArchive::new("/tmp/raw");
        let url = Url::parse("https://school.instructure.com/api/v1/courses").unwrap();
        assert_eq!(
            archive.location(&url),
            PathBuf::from("/tmp/raw/api/v1/courses.json/default.json")
        );
    }

    #[test]
    fn test_location_with_query() {
        let archive = ResponseArchive::new("/tmp/raw");
        let url =
            Url::parse("https://school.instructure.com/api/v1/courses/1/modules?page=2&per_page=10")
                .unwrap();
        assert_eq!(
            archive.location(&url),
            PathBuf::from("/tmp/raw/api/v1/courses/1/modules.json/page%3D2%26per_page%3D10.json")
        );
    }

    #[test]
    fn test_location_ignores_dot_segments() {
        let archive = ResponseArchive::new("/tmp/raw");
        let url = Url::parse("https://school.instructure.com/api/v1/%2E%2E/x").unwrap();
        let location = archive.location(&url);
        assert!(location.starts_with("/tmp/raw"));
    }

    #[tokio::test]
    async fn test_save_writes_body() {
        let dir = tempdir().unwrap();
        let archive = ResponseArchive::new(dir.path());
        let url = Url::parse("https://school.instructure.com/api/v1/courses?page=1").unwrap();

        let path = archive.save(&url, br#"[{"id":1}]"#).await.unwrap();
        assert!(path.starts_with(dir.path()));
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, r#"[{"id":1}]"#);
    }
}
