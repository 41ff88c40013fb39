//! Writes rendered redirect pages to disk.
//!
//! Layout under the output root:
//!
//! ```text
//! {path}/index.html   - one redirect page per entry
//! index/index.html    - list of entries flagged `index = true`
//! ```
//!
//! Directories are created as needed and pages are overwritten. Nothing is
//! ever deleted, so directories of entries removed from the config stay behind.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::redirect::{render_index, render_redirect_page, Redirects};

/// Directory holding the generated index page.
pub const INDEX_PATH: &str = "index";
/// File name written into every page directory.
pub const INDEX_FILE: &str = "index.html";

/// A filesystem operation failed; earlier pages are left as written.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of a successful [`write_site`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteSummary {
    /// Redirect pages written, not counting the index page.
    pub redirects: usize,
}

/// Render every entry plus the index page beneath `output_root`.
pub fn write_site(entries: &Redirects, output_root: &Path) -> Result<SiteSummary, SiteError> {
    for entry in entries.values() {
        let file = write_page(&output_root.join(entry.path()), &render_redirect_page(entry))?;
        debug!("Wrote {entry} to {}", file.display());
    }

    let index = write_page(&output_root.join(INDEX_PATH), &render_index(entries.values()))?;
    info!(
        "Wrote {} redirect page(s) and index {}",
        entries.len(),
        index.display()
    );

    Ok(SiteSummary {
        redirects: entries.len(),
    })
}

fn write_page(dir: &Path, contents: &str) -> Result<PathBuf, SiteError> {
    fs::create_dir_all(dir).map_err(|source| SiteError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let file = dir.join(INDEX_FILE);
    fs::write(&file, contents).map_err(|source| SiteError::Write {
        path: file.clone(),
        source,
    })?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::load_entries;

    const SAMPLE: &str = r#"
[foo]
title = "Foo"
url = "https://example.com"
index = true

["nested/bar"]
title = "Bar"
url = "https://bar.example.com"
"#;

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_write_site_layout() {
        let dir = tempfile::tempdir().unwrap();
        let entries = load_entries(SAMPLE).unwrap();
        let summary = write_site(&entries, dir.path()).unwrap();
        assert_eq!(summary.redirects, 2);

        let foo = read(dir.path().join("foo/index.html"));
        assert!(foo.contains("content=\"0; url=https://example.com\""));
        let bar = read(dir.path().join("nested/bar/index.html"));
        assert!(bar.contains("<title>Bar</title>"));
        let index = read(dir.path().join("index/index.html"));
        assert_eq!(index.matches("<li>").count(), 1);
    }

    #[test]
    fn test_write_site_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let entries = load_entries(SAMPLE).unwrap();

        write_site(&entries, dir.path()).unwrap();
        let first = [
            read(dir.path().join("foo/index.html")),
            read(dir.path().join("nested/bar/index.html")),
            read(dir.path().join("index/index.html")),
        ];
        write_site(&entries, dir.path()).unwrap();
        let second = [
            read(dir.path().join("foo/index.html")),
            read(dir.path().join("nested/bar/index.html")),
            read(dir.path().join("index/index.html")),
        ];
        assert_eq!(first, second);
    }

    #[test]
    fn test_write_site_overwrites_and_keeps_stale_pages() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("foo")).unwrap();
        fs::write(dir.path().join("foo/index.html"), "old").unwrap();
        fs::create_dir_all(dir.path().join("gone")).unwrap();
        fs::write(dir.path().join("gone/index.html"), "stale").unwrap();

        let entries = load_entries(SAMPLE).unwrap();
        write_site(&entries, dir.path()).unwrap();

        assert_ne!(read(dir.path().join("foo/index.html")), "old");
        assert_eq!(read(dir.path().join("gone/index.html")), "stale");
    }

    #[test]
    fn test_write_site_reports_failing_path() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the entry directory should go.
        fs::write(dir.path().join("foo"), "not a directory").unwrap();

        let entries = load_entries(SAMPLE).unwrap();
        let err = write_site(&entries, dir.path()).unwrap_err();
        assert!(matches!(err, SiteError::CreateDir { ref path, .. } if path.ends_with("foo")));
    }
}
