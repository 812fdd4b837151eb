//! Path sets: where each asset class reads from and writes to.
//!
//! A [`Paths`] value is constructed once at startup and passed explicitly to
//! every component; nothing mutates it during a session.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Overall source and output trees.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RootPaths {
    pub src: PathBuf,
    /// The deployable output tree; also the preview server's static root.
    pub dest: PathBuf,
}

impl Default for RootPaths {
    fn default() -> Self {
        Self {
            src: PathBuf::from("src"),
            dest: PathBuf::from("dist"),
        }
    }
}

/// Markup path set.
///
/// Only templates under `views` render to pages. Shared fragments live in
/// sibling directories under `src` and are reachable through includes alone.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkupPaths {
    pub src: PathBuf,
    pub dest: PathBuf,
    pub views: PathBuf,
}

impl Default for MarkupPaths {
    fn default() -> Self {
        Self {
            src: PathBuf::from("src/resources"),
            dest: PathBuf::from("dist"),
            views: PathBuf::from("src/resources/views"),
        }
    }
}

/// Path set for a compiled asset class (styles, scripts).
///
/// `map` is the source-map side directory, relative to `dest`.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetPaths {
    pub src: PathBuf,
    pub dest: PathBuf,
    #[serde(default = "default_map_dir")]
    pub map: PathBuf,
}

fn default_map_dir() -> PathBuf {
    PathBuf::from("maps")
}

/// Images are placed into `dest` by hand; no transform stage touches them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImagePaths {
    pub src: PathBuf,
    pub dest: PathBuf,
}

impl Default for ImagePaths {
    fn default() -> Self {
        Self {
            src: PathBuf::from("src/assets/images"),
            dest: PathBuf::from("dist/public/images"),
        }
    }
}

/// The full path-set configuration, one entry per asset class.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub root: RootPaths,
    pub markup: MarkupPaths,
    pub styles: AssetPaths,
    pub scripts: AssetPaths,
    pub images: ImagePaths,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            root: RootPaths::default(),
            markup: MarkupPaths::default(),
            styles: AssetPaths {
                src: PathBuf::from("src/assets/sass"),
                dest: PathBuf::from("dist/public/css"),
                map: PathBuf::from("maps"),
            },
            scripts: AssetPaths {
                src: PathBuf::from("src/assets/js"),
                dest: PathBuf::from("dist/public/js"),
                map: PathBuf::from("maps"),
            },
            images: ImagePaths::default(),
        }
    }
}

impl Paths {
    /// The default layout rooted at `base` instead of the working directory.
    pub fn rooted(base: &Path) -> Self {
        let defaults = Self::default();
        Self {
            root: RootPaths {
                src: base.join(defaults.root.src),
                dest: base.join(defaults.root.dest),
            },
            markup: MarkupPaths {
                src: base.join(defaults.markup.src),
                dest: base.join(defaults.markup.dest),
                views: base.join(defaults.markup.views),
            },
            styles: AssetPaths {
                src: base.join(defaults.styles.src),
                dest: base.join(defaults.styles.dest),
                map: defaults.styles.map,
            },
            scripts: AssetPaths {
                src: base.join(defaults.scripts.src),
                dest: base.join(defaults.scripts.dest),
                map: defaults.scripts.map,
            },
            images: ImagePaths {
                src: base.join(defaults.images.src),
                dest: base.join(defaults.images.dest),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_mirrors_source_tree() {
        let paths = Paths::default();

        assert_eq!(paths.root.dest, PathBuf::from("dist"));
        assert_eq!(paths.styles.src, PathBuf::from("src/assets/sass"));
        assert_eq!(paths.styles.dest, PathBuf::from("dist/public/css"));
        assert_eq!(paths.scripts.dest, PathBuf::from("dist/public/js"));
        assert_eq!(paths.markup.views, PathBuf::from("src/resources/views"));
    }

    #[test]
    fn rooted_prefixes_every_tree() {
        let paths = Paths::rooted(Path::new("/tmp/site"));

        assert_eq!(paths.root.dest, PathBuf::from("/tmp/site/dist"));
        assert_eq!(paths.markup.src, PathBuf::from("/tmp/site/src/resources"));
        assert_eq!(paths.images.dest, PathBuf::from("/tmp/site/dist/public/images"));
        // Map directories stay relative to their destination root.
        assert_eq!(paths.styles.map, PathBuf::from("maps"));
    }

    #[test]
    fn deserializes_partial_overrides() {
        let paths: Paths = toml::from_str(
            r#"
            [root]
            dest = "out"

            [styles]
            src = "styles"
            dest = "out/css"
            "#,
        )
        .unwrap();

        assert_eq!(paths.root.dest, PathBuf::from("out"));
        assert_eq!(paths.styles.src, PathBuf::from("styles"));
        // The map directory falls back even when its section is overridden.
        assert_eq!(paths.styles.map, PathBuf::from("maps"));
        // Untouched sections keep their defaults.
        assert_eq!(paths.scripts.dest, PathBuf::from("dist/public/js"));
    }
}
