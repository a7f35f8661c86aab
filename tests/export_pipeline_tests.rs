mod common;

use animeshare::config::ExportConfig;
use animeshare::export::{DownloadDir, ExportOutcome, ExportPipeline};
use animeshare::notify::Severity;
use animeshare::render::IDLE_LABEL;
use animeshare::share_list::lock;
use common::{entry, manager, MemoryFiles, MockClipboard, RecordingNotifier, StaticLoader, StubRasterizer};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tracing_test::traced_test;

struct Harness {
    notifier: Arc<RecordingNotifier>,
    loader: Arc<StaticLoader>,
    rasterizer: Arc<StubRasterizer>,
    clipboard: Arc<MockClipboard>,
    files: Arc<MemoryFiles>,
}

impl Harness {
    fn new(loader: StaticLoader, rasterizer: StubRasterizer, clipboard: MockClipboard) -> Self {
        Harness {
            notifier: Arc::new(RecordingNotifier::default()),
            loader: Arc::new(loader),
            rasterizer: Arc::new(rasterizer),
            clipboard: Arc::new(clipboard),
            files: Arc::new(MemoryFiles::default()),
        }
    }

    fn pipeline(&self, config: ExportConfig) -> ExportPipeline {
        ExportPipeline::new(
            config,
            self.loader.clone(),
            self.rasterizer.clone(),
            self.clipboard.clone(),
            self.files.clone(),
            self.notifier.clone(),
        )
    }
}

fn two_shows() -> Vec<animeshare::ShareEntry> {
    vec![
        entry("Show A", Some("https://img.example/a.jpg"), "2024-01-01", "20:00", "Story A"),
        entry("Show B", None, "2024-02-02", "21:00", "Story B"),
    ]
}

#[tokio::test]
async fn test_empty_list_never_rasterizes() {
    let harness = Harness::new(StaticLoader::default(), StubRasterizer::default(), MockClipboard::default());
    let (manager, _view) = manager(harness.notifier.clone());
    let shared = manager.into_shared();

    let outcome = harness.pipeline(ExportConfig::default()).run(&shared).await;

    assert_eq!(outcome, ExportOutcome::Empty);
    assert_eq!(harness.rasterizer.calls(), 0);
    assert_eq!(harness.notifier.count(Severity::Warning), 1);
    assert!(harness.clipboard.texts().is_empty());
}

#[tokio::test]
async fn test_clipboard_failure_saves_download_and_keeps_list() {
    let harness = Harness::new(
        StaticLoader::with(&["https://img.example/a.jpg"]),
        StubRasterizer::default(),
        MockClipboard::failing(true, false),
    );
    let (mut manager, _view) = manager(harness.notifier.clone());
    for e in two_shows() {
        manager.add(e).unwrap();
    }
    let shared = manager.into_shared();

    let outcome = harness.pipeline(ExportConfig::default()).run(&shared).await;

    let saved = harness.files.saved.lock().unwrap().clone();
    assert_eq!(saved.len(), 1);
    let (file_name, size) = &saved[0];
    assert!(file_name.starts_with("anime-share-list-"));
    assert!(file_name.ends_with(".png"));
    assert!(*size > 0);
    assert!(matches!(outcome, ExportOutcome::SavedFile { text_copied: true, .. }));

    let texts = harness.clipboard.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("Show A") && texts[0].contains("Story B"));

    let manager = lock(&shared);
    assert_eq!(manager.len(), 2);
    assert!(manager.trigger().enabled());
    assert_eq!(manager.trigger().label(), IDLE_LABEL);
}

#[tokio::test]
async fn test_download_tier_swallows_text_failure() {
    let harness = Harness::new(
        StaticLoader::default(),
        StubRasterizer::default(),
        MockClipboard::failing(true, true),
    );
    let (mut manager, _view) = manager(harness.notifier.clone());
    manager.add(entry("Solo", None, "", "", "")).unwrap();
    let shared = manager.into_shared();

    let outcome = harness.pipeline(ExportConfig::default()).run(&shared).await;

    assert!(matches!(outcome, ExportOutcome::SavedFile { text_copied: false, .. }));
    assert_eq!(harness.notifier.count(Severity::Error), 0);
}

#[tokio::test]
async fn test_download_to_directory() {
    let dir = tempdir().unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let clipboard = Arc::new(MockClipboard::failing(true, false));
    let pipeline = ExportPipeline::new(
        ExportConfig::default(),
        Arc::new(StaticLoader::default()),
        Arc::new(StubRasterizer::default()),
        clipboard,
        Arc::new(DownloadDir::new(dir.path().join("downloads"))),
        notifier.clone(),
    );
    let (mut manager, _view) = manager(notifier);
    manager.add(entry("Solo", None, "", "", "")).unwrap();
    let shared = manager.into_shared();

    let outcome = pipeline.run(&shared).await;

    let path = match outcome {
        ExportOutcome::SavedFile { path, .. } => path,
        other => panic!("expected a saved file, got {:?}", other),
    };
    let bytes = tokio::fs::read(&path).await.unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    assert!(path.starts_with(dir.path()));
}

#[tokio::test]
async fn test_rasterizer_failure_falls_back_to_text() {
    let harness = Harness::new(StaticLoader::default(), StubRasterizer::failing(), MockClipboard::default());
    let (mut manager, _view) = manager(harness.notifier.clone());
    for e in two_shows() {
        manager.add(e).unwrap();
    }
    let shared = manager.into_shared();

    let outcome = harness.pipeline(ExportConfig::default()).run(&shared).await;

    assert_eq!(outcome, ExportOutcome::TextFallback { copied: true });
    let texts = harness.clipboard.texts();
    assert_eq!(texts.len(), 1);
    for needle in ["Show A", "Story A", "Show B", "Story B"] {
        assert!(texts[0].contains(needle), "missing {}", needle);
    }
    assert_eq!(harness.clipboard.image_count(), 0);
    assert_eq!(harness.notifier.count(Severity::Error), 1);

    let manager = lock(&shared);
    assert!(manager.trigger().enabled());
    assert_eq!(manager.trigger().label(), IDLE_LABEL);
    assert_eq!(manager.len(), 2);
}

#[tokio::test]
async fn test_failed_download_routes_to_outer_handler() {
    let notifier = Arc::new(RecordingNotifier::default());
    let clipboard = Arc::new(MockClipboard::failing(true, false));
    let files = Arc::new(MemoryFiles {
        fail: true,
        ..Default::default()
    });
    let pipeline = ExportPipeline::new(
        ExportConfig::default(),
        Arc::new(StaticLoader::default()),
        Arc::new(StubRasterizer::default()),
        clipboard.clone(),
        files,
        notifier.clone(),
    );
    let (mut manager, _view) = manager(notifier.clone());
    manager.add(entry("Solo", None, "", "", "Only story")).unwrap();
    let shared = manager.into_shared();

    let outcome = pipeline.run(&shared).await;

    assert_eq!(outcome, ExportOutcome::TextFallback { copied: true });
    assert!(clipboard.texts()[0].contains("Only story"));
    assert!(!lock(&shared).trigger().busy);
}

#[tokio::test]
async fn test_busy_trigger_blocks_second_export() {
    let harness = Harness::new(StaticLoader::default(), StubRasterizer::default(), MockClipboard::default());
    let (mut manager, _view) = manager(harness.notifier.clone());
    manager.add(entry("Solo", None, "", "", "")).unwrap();
    manager.set_busy(true);
    let shared = manager.into_shared();

    let outcome = harness.pipeline(ExportConfig::default()).run(&shared).await;

    assert_eq!(outcome, ExportOutcome::Busy);
    assert_eq!(harness.rasterizer.calls(), 0);
    assert!(lock(&shared).trigger().busy, "a rejected trigger leaves the running export alone");
}

#[tokio::test]
#[traced_test]
async fn test_failed_and_slow_images_do_not_abort() {
    let mut loader = StaticLoader::with(&["https://img.example/ok.jpg"]);
    loader.delay = Some(Duration::from_millis(200));
    let harness = Harness::new(loader, StubRasterizer::default(), MockClipboard::default());
    let (mut manager, _view) = manager(harness.notifier.clone());
    manager.add(entry("Ok", Some("https://img.example/ok.jpg"), "", "", "")).unwrap();
    manager.add(entry("Missing", Some("https://img.example/404.jpg"), "", "", "")).unwrap();
    manager.add(entry("Placeholder", Some("無圖片"), "", "", "")).unwrap();
    manager.add(entry("Relative", Some("/static/a.jpg"), "", "", "")).unwrap();
    let shared = manager.into_shared();

    let config = ExportConfig {
        image_timeout_ms: 20,
        ..ExportConfig::default()
    };
    let outcome = harness.pipeline(config).run(&shared).await;

    assert_eq!(outcome, ExportOutcome::CopiedImage);
    let mut requested = harness.loader.requested();
    requested.sort();
    assert_eq!(requested, vec!["https://img.example/404.jpg", "https://img.example/ok.jpg"]);
    assert_eq!(*harness.rasterizer.seen_images.lock().unwrap(), 0);
    assert!(logs_contain("Image preload failed"));
}

#[tokio::test]
async fn test_end_to_end_add_remove_export() {
    let harness = Harness::new(StaticLoader::default(), StubRasterizer::default(), MockClipboard::default());
    let (mut manager, view) = manager(harness.notifier.clone());
    manager.add(entry("Show A", Some("url1"), "2024-01-01", "20:00", "Story A")).unwrap();
    manager.add(entry("Show B", None, "2024-02-02", "21:00", "Story B")).unwrap();

    assert_eq!(view.last().cards.len(), 2);
    assert!(manager.trigger().enabled());

    manager.remove_at(0).unwrap();
    let last = view.last();
    assert_eq!(last.cards.len(), 1);
    assert_eq!(last.cards[0].name, "Show B");

    let shared = manager.into_shared();
    let successes_before = harness.notifier.count(Severity::Success);
    let outcome = harness.pipeline(ExportConfig::default()).run(&shared).await;

    assert_eq!(outcome, ExportOutcome::CopiedImage);
    assert_eq!(lock(&shared).len(), 0);
    assert!(view.last().is_empty());
    assert_eq!(harness.notifier.count(Severity::Success) - successes_before, 1);
    assert_eq!(harness.clipboard.image_count(), 1);
    assert!(harness.loader.requested().is_empty());
}

#[tokio::test]
async fn test_rasterize_timeout_falls_back_to_text() {
    let harness = Harness::new(
        StaticLoader::default(),
        StubRasterizer::slow(Duration::from_millis(500)),
        MockClipboard::default(),
    );
    let (mut manager, _view) = manager(harness.notifier.clone());
    for e in two_shows() {
        manager.add(e).unwrap();
    }
    let shared = manager.into_shared();
    let config = ExportConfig {
        rasterize_timeout_ms: 20,
        ..ExportConfig::default()
    };

    let outcome = harness.pipeline(config).run(&shared).await;

    assert_eq!(outcome, ExportOutcome::TextFallback { copied: true });
    assert_eq!(harness.rasterizer.calls(), 1);
    assert_eq!(harness.clipboard.image_count(), 0);
    assert_eq!(harness.notifier.count(Severity::Error), 1);
    let manager = lock(&shared);
    assert_eq!(manager.len(), 2);
    assert!(manager.trigger().enabled());
    assert_eq!(manager.trigger().label(), IDLE_LABEL);
}

#[tokio::test]
async fn test_aborted_export_releases_trigger() {
    let harness = Harness::new(
        StaticLoader::default(),
        StubRasterizer::slow(Duration::from_secs(10)),
        MockClipboard::default(),
    );
    let (mut manager, _view) = manager(harness.notifier.clone());
    manager.add(entry("Show A", None, "", "", "")).unwrap();
    let shared = manager.into_shared();
    let pipeline = Arc::new(harness.pipeline(ExportConfig::default()));

    let task = {
        let pipeline = Arc::clone(&pipeline);
        let shared = Arc::clone(&shared);
        tokio::spawn(async move { pipeline.run(&shared).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(lock(&shared).trigger().busy);

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    let manager = lock(&shared);
    assert!(!manager.trigger().busy);
    assert!(manager.trigger().enabled());
    assert_eq!(manager.len(), 1);
}
