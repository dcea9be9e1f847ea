//! Public dataset shortcuts for Trawl.
//!
//! Before a source's live probe runs, the [`ShortcutLayer`] asks the
//! datasets bound to that source (Wayback CDX snapshots, crt.sh
//! certificates). Hits that mention the query satisfy the source and the
//! live probe is skipped. Every request goes through the shared
//! `FetchClient`.

pub mod crtsh;
pub mod error;
pub mod shortcut;
pub mod wayback;

pub use crtsh::CrtShShortcut;
pub use error::{DatasetError, Result};
pub use shortcut::{DatasetShortcut, ShortcutLayer, DATASET_TIMEOUT};
pub use wayback::{parse_cdx, WaybackShortcut};
