mod common;

use common::*;
use folio::config::CorpusConfig;
use folio::loader::load_corpus;
use folio::progress::NoProgress;

fn corpus_config(dir: &std::path::Path) -> CorpusConfig {
    CorpusConfig {
        clone_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

#[tokio::test]
async fn loads_one_document_per_repository() {
    let dir = tempfile::tempdir().unwrap();
    let discovery = StaticDiscovery::new(&["alpha", "beta"]);
    let sync = FakeSync::with_readmes(&[("alpha", "# Alpha"), ("beta", "# Beta")]);

    let corpus = load_corpus("dana", &corpus_config(dir.path()), &discovery, &sync, &NoProgress)
        .await
        .unwrap();

    assert_eq!(corpus.names(), vec!["alpha", "beta"]);
    assert_eq!(corpus.documents()[0].source, url("alpha"));
    assert_eq!(corpus.documents()[1].content, "# Beta");
    assert_eq!(discovery.calls(), 1);
}

#[tokio::test]
async fn reloading_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = corpus_config(dir.path());
    let discovery = StaticDiscovery::new(&["alpha", "beta"]);
    let sync = FakeSync::with_readmes(&[("alpha", "# Alpha"), ("beta", "# Beta")]);

    let first = load_corpus("dana", &config, &discovery, &sync, &NoProgress)
        .await
        .unwrap();
    let second = load_corpus("dana", &config, &discovery, &sync, &NoProgress)
        .await
        .unwrap();

    assert_eq!(first.documents(), second.documents());
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[tokio::test]
async fn failed_sync_skips_only_that_repository() {
    let dir = tempfile::tempdir().unwrap();
    let discovery = StaticDiscovery::new(&["alpha", "broken", "gamma"]);
    let sync = FakeSync::with_readmes(&[("alpha", "a"), ("broken", "b"), ("gamma", "c")])
        .failing("broken");

    let corpus = load_corpus("dana", &corpus_config(dir.path()), &discovery, &sync, &NoProgress)
        .await
        .unwrap();

    assert_eq!(corpus.names(), vec!["alpha", "gamma"]);
}

#[tokio::test]
async fn repository_without_document_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let discovery = StaticDiscovery::new(&["alpha", "bare"]);
    let sync = FakeSync::with_readmes(&[("alpha", "a")]);

    let corpus = load_corpus("dana", &corpus_config(dir.path()), &discovery, &sync, &NoProgress)
        .await
        .unwrap();

    assert_eq!(corpus.names(), vec!["alpha"]);
    assert!(dir.path().join("bare").is_dir());
}

#[tokio::test]
async fn custom_document_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = corpus_config(dir.path());
    config.document_file = ".origin".to_string();
    let discovery = StaticDiscovery::new(&["alpha"]);
    let sync = FakeSync::default();

    let corpus = load_corpus("dana", &config, &discovery, &sync, &NoProgress)
        .await
        .unwrap();

    assert_eq!(corpus.documents()[0].content, url("alpha"));
}

#[tokio::test]
async fn empty_discovery_gives_empty_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let discovery = StaticDiscovery::new(&[]);

    let corpus = load_corpus(
        "dana",
        &corpus_config(dir.path()),
        &discovery,
        &FakeSync::default(),
        &NoProgress,
    )
    .await
    .unwrap();

    assert!(corpus.is_empty());
}

#[tokio::test]
async fn duplicate_names_keep_the_first() {
    let dir = tempfile::tempdir().unwrap();
    let discovery = StaticDiscovery {
        urls: vec![
            url("alpha"),
            "https://github.com/someone-else/alpha.git".to_string(),
        ],
        calls: Default::default(),
    };
    let sync = FakeSync::with_readmes(&[("alpha", "first")]);

    let corpus = load_corpus("dana", &corpus_config(dir.path()), &discovery, &sync, &NoProgress)
        .await
        .unwrap();

    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus.documents()[0].source, url("alpha"));
    assert_eq!(sync.synced.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn stale_directories_are_left_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let stale = dir.path().join("retired");
    std::fs::create_dir_all(&stale).unwrap();
    std::fs::write(stale.join("README.md"), "# Retired").unwrap();

    let discovery = StaticDiscovery::new(&["alpha"]);
    let sync = FakeSync::with_readmes(&[("alpha", "a")]);

    let corpus = load_corpus("dana", &corpus_config(dir.path()), &discovery, &sync, &NoProgress)
        .await
        .unwrap();

    assert_eq!(corpus.names(), vec!["alpha"]);
    assert!(stale.join("README.md").is_file());
}

#[tokio::test]
async fn failed_sync_is_reported_as_stale() {
    let dir = tempfile::tempdir().unwrap();
    let config = corpus_config(dir.path());
    let sync = FakeSync::with_readmes(&[("alpha", "a"), ("beta", "b")]);
    load_corpus(
        "dana",
        &config,
        &StaticDiscovery::new(&["alpha", "beta"]),
        &sync,
        &NoProgress,
    )
    .await
    .unwrap();

    std::fs::create_dir_all(dir.path().join("retired")).unwrap();
    let sync = FakeSync::with_readmes(&[("alpha", "a"), ("beta", "b")]).failing("beta");
    let progress = RecordingProgress::default();
    let corpus = load_corpus(
        "dana",
        &config,
        &StaticDiscovery::new(&["alpha", "beta"]),
        &sync,
        &progress,
    )
    .await
    .unwrap();

    assert_eq!(corpus.names(), vec!["alpha"]);
    assert_eq!(progress.stale(), vec!["beta", "retired"]);
    assert!(dir.path().join("beta").join("README.md").is_file());
}

#[tokio::test]
async fn discovery_failure_falls_back_to_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = corpus_config(dir.path());

    // Populate the cache with a successful load first.
    let sync = FakeSync::with_readmes(&[("zeta", "# Zeta"), ("alpha", "# Alpha")]);
    load_corpus(
        "dana",
        &config,
        &StaticDiscovery::new(&["zeta", "alpha"]),
        &sync,
        &NoProgress,
    )
    .await
    .unwrap();

    let uncloned = dir.path().join("handmade");
    std::fs::create_dir_all(&uncloned).unwrap();
    std::fs::write(uncloned.join("README.md"), "# Handmade").unwrap();
    std::fs::create_dir_all(dir.path().join("empty")).unwrap();

    let corpus = load_corpus("dana", &config, &FailingDiscovery, &sync, &NoProgress)
        .await
        .unwrap();

    assert_eq!(corpus.names(), vec!["alpha", "handmade", "zeta"]);
    assert_eq!(corpus.documents()[0].source, url("alpha"));
    assert_eq!(
        corpus.documents()[1].source,
        uncloned.display().to_string()
    );
}

#[tokio::test]
async fn discovery_failure_with_no_cache_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = load_corpus(
        "dana",
        &corpus_config(&dir.path().join("fresh")),
        &FailingDiscovery,
        &FakeSync::default(),
        &NoProgress,
    )
    .await
    .unwrap();

    assert!(corpus.is_empty());
}

#[tokio::test]
async fn empty_owner_or_topic_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let discovery = StaticDiscovery::new(&["alpha"]);
    let sync = FakeSync::default();

    let err = load_corpus("  ", &corpus_config(dir.path()), &discovery, &sync, &NoProgress)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("owner"));

    let mut config = corpus_config(dir.path());
    config.topic = String::new();
    let err = load_corpus("dana", &config, &discovery, &sync, &NoProgress)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("topic"));

    assert_eq!(discovery.calls(), 0);
}
