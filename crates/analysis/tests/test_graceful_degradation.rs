//! The pipeline's defining property: total failure of the reasoning service
//! degrades the report to static-only instead of failing the run.

use kensa_analysis::{
    AnalysisConfig, AnalysisPipeline, MockProvider, PipelineError, SkipReason,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn three_file_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "auth.py",
        "password = \"hunter2-prod\"\ndef login(user):\n    return eval(user)\n",
    );
    write(
        dir.path(),
        "jobs.py",
        "for i in range(len(queue)):\n    process(queue[i])\n",
    );
    write(
        dir.path(),
        "util.py",
        "try:\n    risky()\nexcept:\n    pass\n",
    );
    dir
}

#[tokio::test]
async fn test_failing_ai_provider_yields_static_only_report() {
    let dir = three_file_repo();

    let pipeline = AnalysisPipeline::new(AnalysisConfig::default())
        .unwrap()
        .with_provider(Arc::new(MockProvider::failing()));
    let report = pipeline.run(dir.path()).await.unwrap();

    assert!(report.metadata.static_completed);
    assert!(!report.metadata.ai_completed);
    assert!(!report.issues.is_empty());
    assert!(report.issues.iter().all(|i| i.static_origin && !i.ai_origin));

    // Every file's AI verdict is individually accounted for.
    let ai_failures = report
        .metadata
        .files_skipped
        .iter()
        .filter(|s| s.reason == SkipReason::AiFailed)
        .count();
    assert_eq!(ai_failures, 3);
}

#[tokio::test]
async fn test_malformed_ai_responses_are_discarded_not_fatal() {
    let dir = three_file_repo();

    let pipeline = AnalysisPipeline::new(AnalysisConfig::default())
        .unwrap()
        .with_provider(Arc::new(MockProvider::malformed()));
    let report = pipeline.run(dir.path()).await.unwrap();

    assert!(report.metadata.static_completed);
    assert!(!report.metadata.ai_completed);
    assert!(!report.issues.is_empty());
}

#[tokio::test]
async fn test_disabled_ai_stage_never_blocks_progression() {
    let dir = three_file_repo();

    let mut config = AnalysisConfig::default();
    config.ai.enabled = false;
    let pipeline = AnalysisPipeline::new(config).unwrap();
    let report = pipeline.run(dir.path()).await.unwrap();

    assert!(report.metadata.static_completed);
    assert!(!report.metadata.ai_completed);
    assert!(!report.issues.is_empty());
    assert!(report
        .metadata
        .warnings
        .iter()
        .any(|w| w.contains("AI analysis disabled")));
}

#[tokio::test]
async fn test_empty_repository_produces_empty_report() {
    let dir = TempDir::new().unwrap();

    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let report = pipeline.run(dir.path()).await.unwrap();

    assert!(report.is_empty());
    assert_eq!(report.metadata.files_analyzed, 0);
    assert!(report.metadata.static_completed);
}

#[tokio::test]
async fn test_missing_root_is_fatal() {
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default()).unwrap();
    let result = pipeline.run(Path::new("/no/such/repo")).await;
    assert!(matches!(result, Err(PipelineError::NoFilesSelected(_))));
}

#[tokio::test]
async fn test_unparseable_file_degrades_not_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ok.py", "# TODO: tidy this module\n");
    write(dir.path(), "broken.py", "def broken(:\n    pass\n");

    let mut config = AnalysisConfig::default();
    config.ai.enabled = false;
    let pipeline = AnalysisPipeline::new(config).unwrap();
    let report = pipeline.run(dir.path()).await.unwrap();

    assert_eq!(report.metadata.files_analyzed, 2);
    assert!(report
        .metadata
        .warnings
        .iter()
        .any(|w| w.contains("broken.py") && w.contains("structural parse unavailable")));
}
