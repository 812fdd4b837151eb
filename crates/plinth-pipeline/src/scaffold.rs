//! One-shot starter tree for a fresh project.

use std::fs;
use std::io;
use std::path::Path;

use crate::paths::Paths;

/// Writes the starter file set: entry scripts, entry stylesheets, one page
/// template, the shared fragments it includes, and a placeholder image.
///
/// Parent directories are created as needed; directories that already exist
/// are left alone. Existing files at the same paths are silently
/// overwritten — rerunning `setup` restores the starter set.
pub fn setup(paths: &Paths) -> io::Result<()> {
    create_file(&paths.scripts.src, "main.js", MAIN_JS)?;
    create_file(&paths.scripts.src, "home.js", HOME_JS)?;

    create_file(&paths.styles.src, "app.scss", APP_SCSS)?;
    create_file(&paths.styles.src, "base.scss", BASE_SCSS)?;

    create_file(&paths.markup.views, "index.j2", INDEX_PAGE)?;
    let common = paths.markup.src.join("common");
    create_file(&common, "_head.j2", HEAD_FRAGMENT)?;
    create_file(&common, "_header.j2", HEADER_FRAGMENT)?;
    create_file(&common, "_footer.j2", FOOTER_FRAGMENT)?;

    // Images are placed by hand; only the destination directory and a
    // placeholder are prepared.
    create_file(&paths.images.dest, "placeholder.svg", PLACEHOLDER_SVG)?;

    Ok(())
}

fn create_file(dir: &Path, name: &str, contents: &str) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join(name), contents)
}

const MAIN_JS: &str = "// JavaScript entry point\n";

const HOME_JS: &str = "// Home page JavaScript\n";

const APP_SCSS: &str = "// Sass entry point\n";

const BASE_SCSS: &str = "// Base styles\n";

const INDEX_PAGE: &str = r#"{% set page = {"body_class": "home"} %}
{% include "common/_head.j2" %}
{% include "common/_header.j2" %}
<main>
  Hello World
</main>
{% include "common/_footer.j2" %}
"#;

const HEAD_FRAGMENT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Site title</title>
  <link rel="stylesheet" href="./public/css/base.css">
  <link rel="stylesheet" href="./public/css/app.css">
</head>
{% if page.body_class == "home" %}
<body class="{{ page.body_class }}">
{% else %}
<body>
{% endif %}
"#;

const HEADER_FRAGMENT: &str = r#"<header>
  <h1>Header</h1>
</header>
"#;

const FOOTER_FRAGMENT: &str = r#"<footer>
  <p>&copy; Site name</p>
</footer>

<script src="./public/js/main.js"></script>
{% if page.body_class == "home" %}
<script src="./public/js/home.js"></script>
{% endif %}
</body>
</html>
"#;

const PLACEHOLDER_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"></svg>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Runner;
    use tempfile::tempdir;

    fn starter_files(paths: &Paths) -> Vec<std::path::PathBuf> {
        vec![
            paths.scripts.src.join("main.js"),
            paths.scripts.src.join("home.js"),
            paths.styles.src.join("app.scss"),
            paths.styles.src.join("base.scss"),
            paths.markup.views.join("index.j2"),
            paths.markup.src.join("common/_head.j2"),
            paths.markup.src.join("common/_header.j2"),
            paths.markup.src.join("common/_footer.j2"),
            paths.images.dest.join("placeholder.svg"),
        ]
    }

    #[test]
    fn creates_exactly_the_documented_file_set() {
        let temp = tempdir().unwrap();
        let paths = Paths::rooted(temp.path());

        setup(&paths).unwrap();

        for file in starter_files(&paths) {
            assert!(file.exists(), "missing {}", file.display());
        }

        let mut count = 0;
        for entry in walkdir::WalkDir::new(temp.path()) {
            if entry.unwrap().path().is_file() {
                count += 1;
            }
        }
        assert_eq!(count, 9);
    }

    #[test]
    fn rerunning_overwrites_without_error() {
        let temp = tempdir().unwrap();
        let paths = Paths::rooted(temp.path());

        setup(&paths).unwrap();

        let entry = paths.scripts.src.join("main.js");
        fs::write(&entry, "console.log('edited');\n").unwrap();

        setup(&paths).unwrap();

        let restored = fs::read_to_string(&entry).unwrap();
        assert_eq!(restored, MAIN_JS);
    }

    #[tokio::test]
    async fn the_starter_tree_builds_cleanly() {
        let temp = tempdir().unwrap();
        let paths = Paths::rooted(temp.path());

        setup(&paths).unwrap();
        let report = Runner::new(paths.clone()).run_all().await;

        assert_eq!(report.failed(), 0);
        let index = fs::read_to_string(paths.markup.dest.join("index.html")).unwrap();
        assert!(index.contains("<body class=\"home\">"));
        assert!(index.contains("home.js"));
        assert!(paths.styles.dest.join("app.css").exists());
        assert!(paths.scripts.dest.join("main.js").exists());
    }
}
