//! Template helpers exposing bundle resolution to server-side templates.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::resolver::{BundleResolver, ResolvedBundle};
use crate::tracker::CompileWaiter;

/// Chunk name webpack assigns to a single unnamed entry point.
pub const DEFAULT_CHUNK: &str = "main";

/// Kind of HTML tag a bundle is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
  /// JavaScript, rendered as `<script>`.
  Script,
  /// CSS, rendered as `<link rel="stylesheet">`.
  Stylesheet,
}

fn tag_patterns() -> &'static [(TagKind, Regex)] {
  static PATTERNS: OnceLock<Vec<(TagKind, Regex)>> = OnceLock::new();
  PATTERNS
    .get_or_init(|| {
      vec![
        (
          TagKind::Script,
          Regex::new(r"(?i)\.m?js(\?[^/]*)?$").expect("invalid script regex"),
        ),
        (
          TagKind::Stylesheet,
          Regex::new(r"(?i)\.css(\?[^/]*)?$").expect("invalid stylesheet regex"),
        ),
      ]
    })
    .as_slice()
}

/// Decide how a bundle URL should be rendered, if at all.
pub fn tag_kind(url: &str) -> Option<TagKind> {
  tag_patterns()
    .iter()
    .find(|(_, pattern)| pattern.is_match(url))
    .map(|(kind, _)| *kind)
}

/// URL of a bundle by chunk name, defaulting to [`DEFAULT_CHUNK`].
pub fn simple_webpack_bundle<W: CompileWaiter>(
  resolver: &BundleResolver<W>,
  chunk_name: Option<&str>,
) -> Result<String> {
  resolver.resolve_by_chunk(chunk_name.unwrap_or(DEFAULT_CHUNK))
}

/// URL of a bundle by file name, including its extension.
pub fn simple_webpack_static<W: CompileWaiter>(
  resolver: &BundleResolver<W>,
  bundle_filename: &str,
) -> Result<String> {
  resolver.resolve_by_filename(bundle_filename)
}

/// Script and link tags for every bundle whose chunk is not listed in `exclude`.
pub fn simple_webpack_tags<W: CompileWaiter>(
  resolver: &BundleResolver<W>,
  exclude: &[&str],
) -> Result<String> {
  let bundles = resolver.resolve_all_chunks()?;
  Ok(render_tags(&bundles, exclude))
}

fn render_tags(bundles: &[ResolvedBundle], exclude: &[&str]) -> String {
  bundles
    .iter()
    .filter(|bundle| !exclude.contains(&bundle.chunk.as_str()))
    .filter_map(|bundle| match tag_kind(&bundle.url) {
      Some(TagKind::Script) => Some(format!(
        r#"<script type="text/javascript" src="{}"></script>"#,
        bundle.url
      )),
      Some(TagKind::Stylesheet) => Some(format!(
        r#"<link type="text/css" href="{}" rel="stylesheet">"#,
        bundle.url
      )),
      None => {
        debug!(chunk = %bundle.chunk, url = %bundle.url, "no tag for bundle type");
        None
      }
    })
    .collect::<Vec<_>>()
    .join("\n")
}
