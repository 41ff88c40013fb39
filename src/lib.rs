#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

//! linkrelay library - the building blocks behind the `gen-links` and
//! `revshell` binaries.
//!
//! - `html` - node tree and serializer for small static HTML documents
//! - `redirect` - `redirect.toml` loading and page rendering
//! - `site` - writes the rendered redirect pages to an output directory
//! - `config` - `revshell` configuration loading and the shared `ConfigError`
//! - `shell` - PTY allocation and shell spawning
//! - `relay` - duplex byte relay between a PTY and a TCP socket
//!
//! ## Architecture
//!
//! ```text
//! bin/gen_links.rs - redirect.toml → ./{path}/index.html + ./index/index.html
//! bin/revshell.rs  - connect, spawn shell on a PTY, relay until the shell exits
//! html.rs          - Tag, Node, make_node(), serialize(), document()
//! redirect.rs      - RedirectEntry, load_entries(), render_*()
//! site.rs          - write_site()
//! config.rs        - TOML + env-var configuration
//! shell/
//!   pty.rs         - allocate_pty(), spawn_shell_pty()
//! relay.rs         - Liveness, RelayChannel, connect(), supervise(), run()
//! ```

pub mod config;
pub mod html;
pub mod redirect;
pub mod relay;
pub mod shell;
pub mod site;

pub use config::{Config, ConfigError};
pub use html::{document, make_node, serialize, Node, Tag, UnknownTagError};
pub use redirect::{RedirectEntry, Redirects};
pub use relay::{Liveness, RelayChannel, RelayError};
pub use shell::pty::ProcessError;
pub use site::{write_site, SiteError};
