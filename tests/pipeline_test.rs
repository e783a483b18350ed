mod common;

use std::fs;
use std::sync::Arc;

use common::{write_file, FakeCodec, STANDARD_PROFILE};
use heic2jpg::{
    pipeline, CancelToken, ColorMode, OutcomeStatus, ProgressReporter, RunConfig, Scheduler,
    SourceItem,
};

fn run_config(root: &std::path::Path) -> heic2jpg::RunConfigBuilder {
    RunConfig::builder()
        .add_root(root.to_path_buf())
        .num_workers(2)
        .quality(90)
        .color_mode(ColorMode::ConvertToStandard)
}

#[test]
fn test_mixed_batch() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_file(&root, "a.heic", b"IMG");
    write_file(&root, "b.heic", b"IMG;profile=display-p3");
    write_file(&root, "c.heic", b"garbage");
    write_file(&root, "notes.txt", b"not an image");

    let config = run_config(&root).build();
    let summary = pipeline::run(
        &config,
        Arc::new(FakeCodec::default()),
        CancelToken::new(),
        &ProgressReporter::disabled(),
    )
    .unwrap();

    assert_eq!(summary.discovered, 3);
    assert_eq!(summary.stats.converted, 2);
    assert_eq!(summary.stats.skipped, 0);
    assert_eq!(summary.stats.failed, 1);
    assert_eq!(summary.stats.not_attempted, 0);
    assert_ne!(summary.exit_code(), 0);
    assert!(!summary.cancelled);

    let mut tagged = b"JPEG;icc=".to_vec();
    tagged.extend_from_slice(STANDARD_PROFILE);
    for name in ["a", "b"] {
        assert!(!root.join(format!("{}.heic", name)).exists());
        assert_eq!(fs::read(root.join(format!("{}.jpg", name))).unwrap(), tagged);
    }

    assert_eq!(fs::read(root.join("c.heic")).unwrap(), b"garbage");
    assert!(!root.join("c.jpg").exists());
    assert_eq!(summary.stats.failures.len(), 1);
    assert_eq!(summary.stats.failures[0].path, root.join("c.heic"));
    assert!(summary.stats.failures[0].message.starts_with("decode error"));
    assert!(root.join("notes.txt").exists());
}

#[test]
fn test_existing_destination_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_file(&root, "a.heic", b"IMG");
    write_file(&root, "a.jpg", b"older conversion");

    let config = run_config(&root).overwrite(false).build();
    let summary = pipeline::run(
        &config,
        Arc::new(FakeCodec::default()),
        CancelToken::new(),
        &ProgressReporter::disabled(),
    )
    .unwrap();

    assert_eq!(summary.stats.skipped, 1);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(fs::read(root.join("a.heic")).unwrap(), b"IMG");
    assert_eq!(fs::read(root.join("a.jpg")).unwrap(), b"older conversion");
}

#[test]
fn test_overwrite_replaces_destination() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_file(&root, "a.heic", b"IMG");
    write_file(&root, "a.jpg", b"older conversion");

    let config = run_config(&root)
        .overwrite(true)
        .color_mode(ColorMode::Strip)
        .build();
    let summary = pipeline::run(
        &config,
        Arc::new(FakeCodec::default()),
        CancelToken::new(),
        &ProgressReporter::disabled(),
    )
    .unwrap();

    assert_eq!(summary.stats.converted, 1);
    assert_eq!(fs::read(root.join("a.jpg")).unwrap(), b"JPEG");
    assert!(!root.join("a.heic").exists());
}

#[test]
fn test_empty_encoder_output_keeps_source() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_file(&root, "a.heic", b"IMG");

    let config = run_config(&root).build();
    let summary = pipeline::run(
        &config,
        Arc::new(FakeCodec { empty_output: true }),
        CancelToken::new(),
        &ProgressReporter::disabled(),
    )
    .unwrap();

    assert_eq!(summary.stats.failed, 1);
    assert_eq!(summary.exit_code(), 2);
    assert_eq!(fs::read(root.join("a.heic")).unwrap(), b"IMG");
    assert!(!root.join("a.jpg").exists());
}

#[test]
fn test_corrupt_profile_keeps_original_profile() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_file(&root, "a.heic", b"IMG;profile=corrupt-icc");

    let config = run_config(&root).build();
    let summary = pipeline::run(
        &config,
        Arc::new(FakeCodec::default()),
        CancelToken::new(),
        &ProgressReporter::disabled(),
    )
    .unwrap();

    assert_eq!(summary.stats.converted, 1);
    assert_eq!(fs::read(root.join("a.jpg")).unwrap(), b"JPEG;icc=corrupt-icc");
}

#[test]
fn test_every_item_has_one_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    for i in 0..25 {
        let contents: &[u8] = if i % 5 == 0 { b"bad" } else { b"IMG" };
        write_file(&root, &format!("{:02}.HEIC", i), contents);
    }

    let config = run_config(&root).num_workers(4).build();
    let summary = pipeline::run(
        &config,
        Arc::new(FakeCodec::default()),
        CancelToken::new(),
        &ProgressReporter::disabled(),
    )
    .unwrap();

    assert_eq!(summary.discovered, 25);
    assert_eq!(summary.stats.completed(), 25);
    assert_eq!(summary.stats.converted, 20);
    assert_eq!(summary.stats.failed, 5);
}

#[test]
fn test_cancel_after_third_completion() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    let items: Vec<SourceItem> = (0..10)
        .map(|i| SourceItem::new(write_file(&root, &format!("{:02}.heic", i), b"IMG")))
        .collect();

    let cancel = CancelToken::new();
    let scheduler = Scheduler::new(
        1,
        Default::default(),
        Arc::new(FakeCodec::default()),
        cancel.clone(),
    )
    .unwrap();

    let mut outcomes = Vec::new();
    let not_attempted = scheduler.run(items, |outcome| {
        outcomes.push(outcome);
        if outcomes.len() == 3 {
            cancel.cancel();
        }
    });

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|o| o.status == OutcomeStatus::Converted));
    assert_eq!(not_attempted.len(), 7);
    for item in &not_attempted {
        assert_eq!(fs::read(&item.path).unwrap(), b"IMG");
        assert!(!item.destination().exists());
    }
}

#[test]
fn test_cancelled_run_reports_not_attempted() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    for i in 0..4 {
        write_file(&root, &format!("{}.heic", i), b"IMG");
    }

    let cancel = CancelToken::new();
    cancel.cancel();
    let config = run_config(&root).build();
    let summary = pipeline::run(
        &config,
        Arc::new(FakeCodec::default()),
        cancel,
        &ProgressReporter::disabled(),
    )
    .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.stats.not_attempted, 4);
    assert_eq!(summary.stats.completed(), 0);
    assert_eq!(summary.exit_code(), 0);
}

#[test]
fn test_no_readable_roots_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig::builder()
        .add_root(dir.path().join("missing"))
        .build();

    let result = pipeline::run(
        &config,
        Arc::new(FakeCodec::default()),
        CancelToken::new(),
        &ProgressReporter::disabled(),
    );
    assert!(result.is_err());
}

#[test]
fn test_unreadable_root_does_not_stop_others() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_file(&root, "a.heic", b"IMG");

    let config = RunConfig::builder()
        .add_root(root.clone())
        .add_root(root.join("missing"))
        .build();
    let summary = pipeline::run(
        &config,
        Arc::new(FakeCodec::default()),
        CancelToken::new(),
        &ProgressReporter::disabled(),
    )
    .unwrap();

    assert_eq!(summary.stats.converted, 1);
    assert_eq!(summary.discovery_errors.len(), 1);
}

#[test]
fn test_shared_destination_fails_both_sources() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_file(&root, "x.heic", b"IMG;profile=first");
    write_file(&root, "x.HEIF", b"IMG;profile=second");
    write_file(&root, "y.heic", b"IMG");

    let config = run_config(&root).overwrite(true).num_workers(1).build();
    let summary = pipeline::run(
        &config,
        Arc::new(FakeCodec::default()),
        CancelToken::new(),
        &ProgressReporter::disabled(),
    )
    .unwrap();

    assert_eq!(summary.discovered, 3);
    assert_eq!(summary.stats.converted, 1);
    assert_eq!(summary.stats.failed, 2);
    assert!(summary
        .stats
        .failures
        .iter()
        .all(|f| f.message == heic2jpg::discovery::DESTINATION_COLLISION));
    assert_eq!(fs::read(root.join("x.heic")).unwrap(), b"IMG;profile=first");
    assert_eq!(fs::read(root.join("x.HEIF")).unwrap(), b"IMG;profile=second");
    assert!(!root.join("x.jpg").exists());
    assert!(root.join("y.jpg").exists());
}

#[test]
fn test_source_that_is_its_own_destination_is_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let root = fs::canonicalize(dir.path()).unwrap();
    write_file(&root, "a.jpg", b"IMG");

    let extensions = ["jpg".to_string()].into_iter().collect();
    let config = run_config(&root)
        .extensions(extensions)
        .overwrite(true)
        .build();
    let summary = pipeline::run(
        &config,
        Arc::new(FakeCodec::default()),
        CancelToken::new(),
        &ProgressReporter::disabled(),
    )
    .unwrap();

    assert_eq!(summary.stats.failed, 1);
    assert_eq!(summary.stats.converted, 0);
    assert_eq!(fs::read(root.join("a.jpg")).unwrap(), b"IMG");
}
