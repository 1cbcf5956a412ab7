// tests/test_block_upload.rs
//! Block tree upload against the in-memory workspace.

mod common;

use common::{block_text, block_type, key, InMemoryWorkspace};
use enex2notion::api::NotionWorkspace;
use enex2notion::{
    parse_note_blocks, AppError, Block, BlockCommon, BlockUploader, FileBlock, ImageBlock,
    MediaContent, NotionId, PageId, Resource, RichTextItem, Rules,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn text(value: &str) -> Block {
    Block::paragraph(vec![RichTextItem::plain_text(value)])
}

fn page(workspace: &InMemoryWorkspace) -> (PageId, NotionId) {
    let id = workspace.add_workspace_page("Target");
    let node = NotionId::from(&id);
    (id, node)
}

fn image(resource: &Arc<Resource>) -> Block {
    Block::Image(ImageBlock {
        common: BlockCommon::default(),
        media: MediaContent::attachment(resource.clone()),
    })
}

#[tokio::test]
async fn nested_children_are_appended_under_their_parent() {
    let workspace = InMemoryWorkspace::new();
    let (page_id, node) = page(&workspace);

    let mut parent = text("parent");
    parent.set_children(vec![text("child 1"), text("child 2")]);
    let blocks = vec![parent, text("sibling")];

    BlockUploader::new(&workspace).upload(&node, &blocks).await.unwrap();

    let top = workspace.blocks_under(&key(&page_id));
    let texts: Vec<String> = top.iter().map(block_text).collect();
    assert_eq!(texts, vec!["parent", "sibling"]);

    let nested: Vec<String> = workspace.blocks_under(&top[0].id).iter().map(block_text).collect();
    assert_eq!(nested, vec!["child 1", "child 2"]);
    assert!(workspace.blocks_under(&top[1].id).is_empty());
}

#[tokio::test]
async fn heading_children_become_following_siblings() {
    let workspace = InMemoryWorkspace::new();
    let (page_id, node) = page(&workspace);

    let mut heading = Block::heading(2, vec![RichTextItem::plain_text("Heading")]);
    heading.set_children(vec![text("under heading")]);

    BlockUploader::new(&workspace)
        .upload(&node, &[heading, text("after")])
        .await
        .unwrap();

    let top = workspace.blocks_under(&key(&page_id));
    let types: Vec<&str> = top.iter().map(block_type).collect();
    assert_eq!(types, vec!["heading_2", "paragraph", "paragraph"]);
    assert_eq!(block_text(&top[1]), "under heading");
    assert_eq!(workspace.count_calls("append_children"), 1);
}

#[tokio::test]
async fn tables_are_created_in_one_call() {
    let workspace = InMemoryWorkspace::new();
    let (page_id, node) = page(&workspace);
    let blocks = parse_note_blocks(
        "<en-note><table><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table></en-note>",
        &[],
        &Rules::default(),
    );

    BlockUploader::new(&workspace).upload(&node, &blocks).await.unwrap();

    assert_eq!(workspace.count_calls("append_children"), 1);
    let top = workspace.blocks_under(&key(&page_id));
    assert_eq!(top.len(), 1);
    let rows = top[0].payload["table"]["children"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(top[0].payload["table"]["table_width"], 2);
}

#[tokio::test]
async fn lines_indented_under_a_table_follow_it() {
    let workspace = InMemoryWorkspace::new();
    let (page_id, node) = page(&workspace);
    let blocks = parse_note_blocks(
        r#"<en-note><table><tr><td>a</td><td>b</td></tr></table><div style="padding-left:40px">after table</div><div style="padding-left:80px">deeper</div></en-note>"#,
        &[],
        &Rules::default(),
    );

    BlockUploader::new(&workspace).upload(&node, &blocks).await.unwrap();

    let top = workspace.blocks_under(&key(&page_id));
    let types: Vec<&str> = top.iter().map(block_type).collect();
    assert_eq!(types, vec!["table", "paragraph"]);
    assert_eq!(top[0].payload["table"]["children"].as_array().unwrap().len(), 1);
    assert_eq!(block_text(&top[1]), "after table");

    let nested: Vec<String> = workspace.blocks_under(&top[1].id).iter().map(block_text).collect();
    assert_eq!(nested, vec!["deeper"]);
}

#[tokio::test]
async fn long_sibling_lists_are_chunked() {
    let workspace = InMemoryWorkspace::new();
    let (page_id, node) = page(&workspace);
    let blocks: Vec<Block> = (0..250).map(|i| text(&format!("line {}", i))).collect();

    BlockUploader::new(&workspace).upload(&node, &blocks).await.unwrap();

    assert_eq!(workspace.count_calls("append_children"), 3);
    let top = workspace.blocks_under(&key(&page_id));
    assert_eq!(top.len(), 250);
    assert_eq!(block_text(&top[249]), "line 249");
}

#[tokio::test]
async fn resource_is_uploaded_once_per_note() {
    let workspace = InMemoryWorkspace::new();
    let (page_id, node) = page(&workspace);
    let resource = Arc::new(Resource::new(b"png bytes".to_vec(), "image/png", Some("a.png".into())));
    let file = Block::File(FileBlock {
        common: BlockCommon::default(),
        media: MediaContent::attachment(Arc::new(Resource::new(
            vec![0; 2000],
            "application/zip",
            Some("archive.zip".into()),
        ))),
    });

    let mut uploader = BlockUploader::new(&workspace);
    uploader
        .upload(&node, &[image(&resource), image(&resource), file])
        .await
        .unwrap();

    assert_eq!(workspace.count_calls("upload_file"), 2);
    let upload = &uploader.uploads()[&resource.md5];
    assert!(upload.file_id.is_some());

    let top = workspace.blocks_under(&key(&page_id));
    assert_eq!(
        top[0].payload["image"]["file_upload"]["id"],
        top[1].payload["image"]["file_upload"]["id"]
    );
    assert_eq!(top[2].payload["file"]["caption"][0]["text"]["content"], "2.0KB");
}

#[tokio::test]
async fn unexpected_file_url_is_fatal() {
    let workspace = InMemoryWorkspace::new();
    workspace.state().file_url_override = Some("https://example.com/file.png".to_string());
    let (_, node) = page(&workspace);
    let resource = Arc::new(Resource::new(b"png".to_vec(), "image/png", None));

    let err = BlockUploader::new(&workspace)
        .upload(&node, &[image(&resource)])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::FormatMismatch { .. }));
    assert!(err.is_fatal());
    assert_eq!(
        err.to_string(),
        "Uploaded file URL format changed: https://example.com/file.png"
    );
}

#[tokio::test]
async fn failed_append_is_reported() {
    let workspace = InMemoryWorkspace::new();
    workspace.state().failing_appends = 1;
    let (_, node) = page(&workspace);

    let result = BlockUploader::new(&workspace).upload(&node, &[text("x")]).await;
    assert!(result.is_err());

    // the workspace recovers for the next call
    workspace.authenticate().await.unwrap();
    BlockUploader::new(&workspace).upload(&node, &[text("x")]).await.unwrap();
}
