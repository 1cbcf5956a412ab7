// tests/test_enex_uploader.rs
//! End-to-end runs of the uploader over export files.

mod common;

use common::{key, write_export, FakeParent, FixtureNote, InMemoryWorkspace};
use enex2notion::{
    iter_notes, AppError, Destination, DoneLedger, EnexUploader, ImportMode, PageId, RetryPolicy,
    Rules,
};
use pretty_assertions::assert_eq;
use std::path::Path;

fn rules() -> Rules {
    Rules {
        mode: ImportMode::Page,
        ..Rules::default()
    }
}

fn uploader<'a>(workspace: &'a InMemoryWorkspace, root: &'a PageId, rules: Rules) -> EnexUploader<'a> {
    EnexUploader::new(
        Some(Destination { workspace, root }),
        rules,
        None,
        DoneLedger::in_memory(),
    )
}

fn note_pages(workspace: &InMemoryWorkspace, root: &PageId) -> Vec<String> {
    let notebooks = workspace.pages_under(&FakeParent::Page(key(root)));
    notebooks
        .iter()
        .flat_map(|notebook| workspace.pages_under(&FakeParent::Page(notebook.id.clone())))
        .map(|page| page.title)
        .collect()
}

fn two_notes(dir: &Path) -> std::path::PathBuf {
    write_export(
        dir,
        "Travel",
        &[
            FixtureNote::new("Paris", "<div>Eiffel tower</div>"),
            FixtureNote::new("Rome", "<div>Colosseum</div>"),
        ],
    )
}

#[tokio::test]
async fn uploads_notes_and_records_them() {
    let dir = tempfile::tempdir().unwrap();
    let export = two_notes(dir.path());
    let done_file = dir.path().join("done.txt");
    let workspace = InMemoryWorkspace::new();
    let root = workspace.add_workspace_page("Root");

    let mut run = EnexUploader::new(
        Some(Destination {
            workspace: &workspace,
            root: &root,
        }),
        rules(),
        None,
        DoneLedger::open(&done_file).unwrap(),
    );
    run.upload_notebook(&export).await.unwrap();

    assert_eq!(note_pages(&workspace, &root), vec!["Paris", "Rome"]);
    assert_eq!(run.summary().uploaded, 2);
    let ledger = std::fs::read_to_string(&done_file).unwrap();
    assert_eq!(ledger.lines().count(), 2);

    // a second run skips everything
    let mut rerun = EnexUploader::new(
        Some(Destination {
            workspace: &workspace,
            root: &root,
        }),
        rules(),
        None,
        DoneLedger::open(&done_file).unwrap(),
    );
    rerun.upload_notebook(&export).await.unwrap();
    assert_eq!(rerun.summary().uploaded, 0);
    assert_eq!(rerun.summary().already_done, 2);
    assert_eq!(workspace.count_calls("create_page"), 3);
}

#[tokio::test]
async fn duplicate_notes_upload_once() {
    let dir = tempfile::tempdir().unwrap();
    let note = FixtureNote::new("Paris", "<div>Eiffel tower</div>");
    let export = write_export(dir.path(), "Travel", &[note, FixtureNote::new("Paris", "<div>Eiffel tower</div>")]);
    let workspace = InMemoryWorkspace::new();
    let root = workspace.add_workspace_page("Root");

    let mut run = uploader(&workspace, &root, rules());
    run.upload_notebook(&export).await.unwrap();

    assert_eq!(note_pages(&workspace, &root), vec!["Paris"]);
    assert_eq!(run.summary().already_done, 1);
}

#[tokio::test]
async fn notebook_container_is_resolved_once() {
    let dir = tempfile::tempdir().unwrap();
    let export = two_notes(dir.path());
    let workspace = InMemoryWorkspace::new();
    let root = workspace.add_workspace_page("Root");

    let mut run = uploader(
        &workspace,
        &root,
        Rules {
            mode: ImportMode::Db,
            ..Rules::default()
        },
    );
    run.upload_notebook(&export).await.unwrap();

    assert_eq!(workspace.count_calls("list_children"), 1);
    assert_eq!(workspace.count_calls("create_database"), 1);
    let state = workspace.state();
    let rows = state
        .pages
        .iter()
        .filter(|page| matches!(page.parent, FakeParent::Database(_)))
        .count();
    assert_eq!(rows, 2);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let dir = tempfile::tempdir().unwrap();
    let export = write_export(dir.path(), "Travel", &[FixtureNote::new("Paris", "<div>x</div>")]);
    let workspace = InMemoryWorkspace::new();
    let root = workspace.add_workspace_page("Root");
    workspace.state().failing_appends = 2;

    let mut run = uploader(&workspace, &root, rules());
    run.upload_notebook(&export).await.unwrap();

    assert_eq!(note_pages(&workspace, &root), vec!["Paris"]);
    // two unfinished pages were created and removed before the third attempt
    assert_eq!(workspace.count_calls("delete_block"), 2);
    assert_eq!(run.summary().uploaded, 1);
}

#[tokio::test]
async fn exhausted_retries_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let export = two_notes(dir.path());
    let workspace = InMemoryWorkspace::new();
    let root = workspace.add_workspace_page("Root");
    workspace.state().failing_appends = 100;

    let mut run = uploader(&workspace, &root, rules());
    let err = run.upload_notebook(&export).await.unwrap_err();

    match err {
        AppError::UploadFailed { note, attempts, .. } => {
            assert_eq!(note, "Paris");
            assert_eq!(attempts, 5);
        }
        other => panic!("expected UploadFailed, got {:?}", other),
    }
    assert!(run.ledger().is_empty());
}

#[tokio::test]
async fn skipped_notes_are_not_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let export = two_notes(dir.path());
    let workspace = InMemoryWorkspace::new();
    let root = workspace.add_workspace_page("Root");
    // both attempts of the first note fail, the second note goes through
    workspace.state().failing_appends = 2;

    let mut run = uploader(
        &workspace,
        &root,
        Rules {
            retry: RetryPolicy::Bounded(2),
            skip_failed: true,
            ..rules()
        },
    );
    run.upload_notebook(&export).await.unwrap();

    assert_eq!(note_pages(&workspace, &root), vec!["Rome"]);
    assert_eq!(run.summary().failed, 1);
    assert_eq!(run.ledger().len(), 1);
}

#[tokio::test]
async fn container_failure_skips_notebook_when_asked() {
    let dir = tempfile::tempdir().unwrap();
    let export = two_notes(dir.path());
    let workspace = InMemoryWorkspace::new();
    let root = workspace.add_workspace_page("Root");
    workspace.state().failing_children = true;

    let mut strict = uploader(&workspace, &root, rules());
    let err = strict.upload_notebook(&export).await.unwrap_err();
    assert!(matches!(err, AppError::ContainerResolution { ref notebook, .. } if notebook == "Travel"));

    let mut lenient = uploader(
        &workspace,
        &root,
        Rules {
            skip_failed: true,
            ..rules()
        },
    );
    lenient.upload_notebook(&export).await.unwrap();
    assert_eq!(workspace.count_calls("create_page"), 0);
}

#[tokio::test]
async fn dry_run_only_parses() {
    let dir = tempfile::tempdir().unwrap();
    let export = two_notes(dir.path());
    write_export(dir.path(), "Empty", &[FixtureNote::new("Blank", "")]);

    let mut run = EnexUploader::new(None, rules(), None, DoneLedger::in_memory());
    run.upload_inputs(&[dir.path().to_path_buf()]).await.unwrap();

    let summary = run.summary();
    assert_eq!(summary.notebooks, 2);
    assert_eq!(summary.parsed_only, 2);
    assert_eq!(summary.empty, 1);
    assert_eq!(summary.uploaded, 0);
    assert!(run.ledger().is_empty());
    assert!(export.exists());
}

#[tokio::test]
async fn custom_tag_is_added_to_rows() {
    let dir = tempfile::tempdir().unwrap();
    let export = write_export(dir.path(), "Travel", &[FixtureNote::new("Paris", "<div>x</div>")]);
    let workspace = InMemoryWorkspace::new();
    let root = workspace.add_workspace_page("Root");

    let mut run = uploader(
        &workspace,
        &root,
        Rules {
            mode: ImportMode::Db,
            tag: Some("imported".to_string()),
            ..Rules::default()
        },
    );
    run.upload_notebook(&export).await.unwrap();

    let state = workspace.state();
    let row = state
        .pages
        .iter()
        .find(|page| page.title == "Paris")
        .unwrap();
    assert_eq!(row.properties["Tags"]["multi_select"][0]["name"], "imported");

    // fingerprints do not depend on tags
    let original = iter_notes(&export).unwrap().next().unwrap().unwrap();
    assert!(run.ledger().contains(original.fingerprint()));
}
