//! File watching and change reaction for the dev session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

use plinth_pipeline::{run_class, AssetClass, Paths};

use crate::websocket::ReloadHub;

/// A file-system change attributed to the asset class whose source root
/// contains it.
#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub class: AssetClass,
    pub path: PathBuf,
}

/// Watches the three asset-class source roots for the life of the session.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Subscribe to the styles, scripts, and markup source roots.
    ///
    /// A missing root is an immediate error: a subscription that can never
    /// fire should fail the session at start, not stay silent.
    pub fn new(
        paths: &Paths,
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let roots = [
            (AssetClass::Styles, paths.styles.src.clone()),
            (AssetClass::Scripts, paths.scripts.src.clone()),
            (AssetClass::Markup, paths.markup.src.clone()),
        ];

        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        // Canonicalize before watching so event paths and roots compare on
        // the same form.
        let mut class_roots = Vec::new();
        for (class, root) in roots {
            let canonical = std::fs::canonicalize(&root)?;
            watcher
                .watch(&canonical, RecursiveMode::Recursive)
                .map_err(std::io::Error::other)?;
            class_roots.push((class, canonical));
        }

        // Forward events onto the async side, coalescing rapid bursts.
        std::thread::spawn(move || {
            let debounce = Duration::from_millis(100);
            let mut last_forwarded: Option<Instant> = None;

            while let Ok(event) = sync_rx.recv() {
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    continue;
                }

                let now = Instant::now();
                if last_forwarded.is_some_and(|t| now.duration_since(t) < debounce) {
                    continue;
                }
                last_forwarded = Some(now);

                for path in event.paths {
                    if let Some(class) = classify(&class_roots, &path) {
                        let _ = async_tx.blocking_send(WatchEvent { class, path });
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Map a changed path to the asset class whose source root contains it.
fn classify(roots: &[(AssetClass, PathBuf)], path: &Path) -> Option<AssetClass> {
    roots
        .iter()
        .find(|(_, root)| path.starts_with(root))
        .map(|(class, _)| *class)
}

/// Spawn the change reactors: one task per asset class, plus a dispatcher
/// feeding them.
///
/// Within one reaction the transform stage runs to completion before the
/// reload signal fires, so reloading clients only ever see fully-written
/// output. Events for a class queue behind its in-flight job — jobs for one
/// class never overlap — while classes react independently of each other.
pub fn spawn_reactors(
    paths: &Paths,
    hub: &ReloadHub,
    mut events: async_mpsc::Receiver<WatchEvent>,
) {
    let mut queues: HashMap<AssetClass, async_mpsc::Sender<PathBuf>> = HashMap::new();

    for class in [AssetClass::Markup, AssetClass::Styles, AssetClass::Scripts] {
        let (tx, mut rx) = async_mpsc::channel::<PathBuf>(64);
        queues.insert(class, tx);

        let paths = paths.clone();
        let hub = hub.clone();
        tokio::spawn(async move {
            while let Some(path) = rx.recv().await {
                tracing::info!("{class} changed: {}", path.display());

                match run_class(&paths, class).await {
                    Ok(summary) => tracing::info!(
                        "{class}: {} written, {} failed",
                        summary.written,
                        summary.failed
                    ),
                    Err(e) => tracing::error!("{class} stage did not run: {e}"),
                }

                // Only after the stage settles; clients must not observe a
                // half-written output tree.
                hub.reload();
            }
        });
    }

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Some(queue) = queues.get(&event.class) {
                // A full queue means a burst of edits is already pending;
                // dropping the extra event loses nothing.
                let _ = queue.try_send(event.path);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn prepared_site(temp: &Path) -> Paths {
        let paths = Paths::rooted(temp);
        fs::create_dir_all(&paths.styles.src).unwrap();
        fs::create_dir_all(&paths.scripts.src).unwrap();
        fs::create_dir_all(&paths.markup.views).unwrap();
        paths
    }

    #[test]
    fn classifies_by_containing_root() {
        let styles = PathBuf::from("/site/src/assets/sass");
        let markup = PathBuf::from("/site/src/resources");
        let roots = vec![
            (AssetClass::Styles, styles.clone()),
            (AssetClass::Markup, markup),
        ];

        assert_eq!(
            classify(&roots, &styles.join("app.scss")),
            Some(AssetClass::Styles)
        );
        assert_eq!(
            classify(&roots, Path::new("/site/src/resources/views/index.j2")),
            Some(AssetClass::Markup)
        );
        assert_eq!(classify(&roots, Path::new("/site/readme.md")), None);
    }

    #[test]
    fn missing_roots_fail_subscription_at_start() {
        let temp = tempdir().unwrap();
        let paths = Paths::rooted(temp.path());

        assert!(FileWatcher::new(&paths).is_err());
    }

    #[tokio::test]
    async fn changes_surface_with_their_asset_class() {
        let temp = tempdir().unwrap();
        let paths = prepared_site(temp.path());

        let (watcher, mut rx) = FileWatcher::new(&paths).unwrap();

        // Give inotify time to set up
        tokio::time::sleep(Duration::from_millis(150)).await;

        fs::write(paths.styles.src.join("app.scss"), ".a { color: red; }\n").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await;
        drop(watcher);

        let event = event.expect("timeout waiting for watch event").unwrap();
        assert_eq!(event.class, AssetClass::Styles);
    }

    #[tokio::test]
    async fn reload_fires_only_after_the_stage_settles() {
        let temp = tempdir().unwrap();
        let paths = prepared_site(temp.path());
        fs::write(paths.styles.src.join("app.scss"), ".a { color: red; }\n").unwrap();

        let hub = ReloadHub::new();
        let mut reloads = hub.subscribe();
        let (events_tx, events_rx) = async_mpsc::channel(8);

        spawn_reactors(&paths, &hub, events_rx);
        events_tx
            .send(WatchEvent {
                class: AssetClass::Styles,
                path: paths.styles.src.join("app.scss"),
            })
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), reloads.recv())
            .await
            .expect("no reload signal")
            .unwrap();

        // The destination was rewritten before the signal fired.
        assert!(paths.styles.dest.join("app.css").exists());
    }
}
