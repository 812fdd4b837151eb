//! Source-map plumbing shared by the styles and scripts stages.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use parcel_sourcemap::{OriginalLocation, SourceMap};

/// Map-file path for an output at `rel` (relative to the destination root):
/// `<map_dir>/<rel>.map`.
pub(crate) fn map_sibling(map_dir: &Path, rel: &Path) -> PathBuf {
    let mut name = OsString::from(rel.as_os_str());
    name.push(".map");
    map_dir.join(PathBuf::from(name))
}

/// Relative URL from the output file at `rel` to its map file, suitable for
/// a `sourceMappingURL` footer.
pub(crate) fn map_url(map_dir: &Path, rel: &Path) -> String {
    let depth = rel.components().count().saturating_sub(1);
    let mut url = String::new();
    for _ in 0..depth {
        url.push_str("../");
    }
    url.push_str(&slashed(&map_sibling(map_dir, rel)));
    url
}

/// A version-3 source map that maps every output line straight back to the
/// same line of the single source. Used for the pass-through scripts stage.
pub(crate) fn identity_map(source_name: &str, content: &str) -> Result<String, String> {
    let mut map = SourceMap::new("/");
    let source = map.add_source(source_name);
    map.set_source_content(source as usize, content)
        .map_err(|e| e.to_string())?;

    for line in 0..content.lines().count() as u32 {
        map.add_mapping(
            line,
            0,
            Some(OriginalLocation {
                original_line: line,
                original_column: 0,
                source,
                name: None,
            }),
        );
    }

    map.to_json(None).map_err(|e| e.to_string())
}

/// Path rendered with forward slashes, the only separator valid in URLs.
pub(crate) fn slashed(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
