//! Redirect definitions and the pages rendered from them.
//!
//! `redirect.toml` maps a relative path to a redirect target:
//!
//! ```toml
//! [gh]
//! title = "GitHub"
//! url = "https://github.com/example"
//! index = true        # optional, default false
//! ```
//!
//! Entries keep the order they appear in the file. Using the path as the
//! table key makes paths unique; a repeated key is rejected by the parser.

use std::fmt;
use std::path::{Component, Path};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::warn;

use crate::config::ConfigError;
use crate::html::{attrs, document, Child, Node, Tag};

/// Title of the generated index page.
pub const INDEX_TITLE: &str = "xurtis.pw";

/// Loaded entries keyed by path, in file order.
pub type Redirects = IndexMap<String, RedirectEntry>;

/// A single redirect from `redirect.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectEntry {
    path: String,
    title: String,
    url: String,
    index: bool,
}

/// Table body as written in the file, before validation.
#[derive(Deserialize)]
struct RawEntry {
    title: Option<String>,
    url: Option<String>,
    #[serde(default)]
    index: bool,
}

impl RedirectEntry {
    pub fn new(
        path: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        index: bool,
    ) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            url: url.into(),
            index,
        }
    }

    fn from_raw(path: String, raw: RawEntry) -> Result<Self, ConfigError> {
        validate_path(&path)?;
        let title = raw.title.ok_or_else(|| ConfigError::MissingField {
            entry: path.clone(),
            field: "title",
        })?;
        let url = raw.url.ok_or_else(|| ConfigError::MissingField {
            entry: path.clone(),
            field: "url",
        })?;
        Ok(Self {
            path,
            title,
            url,
            index: raw.index,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the entry is listed on the index page.
    pub fn index(&self) -> bool {
        self.index
    }
}

impl fmt::Display for RedirectEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {} -> {}>", self.title, self.path, self.url)
    }
}

fn validate_path(path: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidPath {
        entry: path.to_string(),
        reason,
    };
    if path.trim().is_empty() {
        return Err(invalid("path is empty"));
    }
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("path escapes the output directory")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("path must be relative"))
            }
        }
    }
    if path == crate::site::INDEX_PATH {
        warn!("Redirect `{path}` shares its directory with the generated index page");
    }
    Ok(())
}

/// Parse a `redirect.toml` document.
pub fn load_entries(source: &str) -> Result<Redirects, ConfigError> {
    let raw: IndexMap<String, RawEntry> =
        toml::from_str(source).map_err(|source| ConfigError::Parse {
            origin: "redirect table".to_string(),
            source,
        })?;
    raw.into_iter()
        .map(|(path, raw)| RedirectEntry::from_raw(path.clone(), raw).map(|entry| (path, entry)))
        .collect()
}

/// Read and parse a redirect file.
pub fn load_file(path: &Path) -> Result<Redirects, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_entries(&content).map_err(|err| match err {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            origin: path.display().to_string(),
            source,
        },
        other => other,
    })
}

/// Page that immediately refreshes to `entry.url`.
pub fn render_redirect_page(entry: &RedirectEntry) -> String {
    document(vec![
        Node::element(
            Tag::Head,
            vec![
                Node::new(Tag::Meta, attrs([("charset", "utf-8")]), vec![]).into(),
                Node::new(
                    Tag::Meta,
                    attrs([
                        ("http-equiv", "Refresh".to_string()),
                        ("content", format!("0; url={}", entry.url)),
                    ]),
                    vec![],
                )
                .into(),
                Node::element(Tag::Title, vec![entry.title.as_str().into()]).into(),
            ],
        )
        .into(),
        Node::element(
            Tag::Body,
            vec![Node::element(
                Tag::Pre,
                vec![format!("Redirecting to: {}...", entry.title).into()],
            )
            .into()],
        )
        .into(),
    ])
}

/// `<span>path: <a ...>title</a></span>` for the index list.
pub fn render_link(entry: &RedirectEntry) -> Node {
    Node::element(
        Tag::Span,
        vec![
            format!("{}: ", entry.path).into(),
            Node::new(
                Tag::A,
                attrs([("href", entry.url.as_str()), ("title", entry.path.as_str())]),
                vec![entry.title.as_str().into()],
            )
            .into(),
        ],
    )
}

/// Index page listing every entry flagged with `index = true`, in input order.
pub fn render_index<'a>(entries: impl IntoIterator<Item = &'a RedirectEntry>) -> String {
    let items: Vec<Child> = entries
        .into_iter()
        .filter(|entry| entry.index)
        .map(|entry| Child::from(Node::element(Tag::Li, vec![render_link(entry).into()])))
        .collect();

    document(vec![
        Node::element(
            Tag::Head,
            vec![
                Node::new(Tag::Meta, attrs([("charset", "utf-8")]), vec![]).into(),
                Node::element(Tag::Title, vec![INDEX_TITLE.into()]).into(),
            ],
        )
        .into(),
        Node::element(Tag::Body, vec![Node::element(Tag::Ul, items).into()]).into(),
    ])
}
