//! Helpers for turning on-disk bundle paths into public static URLs.
//!
//! The rewrite rule is shared by chunk lookups, file name lookups and the all-bundles listing,
//! so it lives here together with the path normalisation and the static directory search it
//! depends on.

mod normalise;
mod rewrite;
mod search;

pub use normalise::{filepath_to_uri, unixify};
pub use rewrite::{rewrite_bundle_path, static_url};
pub use search::find_static_file;
