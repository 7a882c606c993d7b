//! End-to-end catalog tests
//!
//! Exercises folders, labels and tools together on a file-backed database.

use std::collections::HashSet;

use tempfile::TempDir;
use toolshed::AdminError;
use toolshed::catalog::ToolFilter;
use toolshed::error::Result;
use toolshed::registry::{ToolDefinition, ToolTree};
use toolshed::store::{Database, NewTool, ROOT_ID};
use toolshed::tools::McpRegistry;

fn open(temp_dir: &TempDir) -> Result<Database> {
    Database::open(&temp_dir.path().join("shed").join("toolshed.sqlite"))
}

/// Deleting a folder lifts its children and tools to the parent
#[test]
fn test_delete_folder_reparents_children_and_tools() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = open(&temp_dir)?;
    let folders = db.folders();
    let tools = db.tools();

    let a = folders.create("A", ROOT_ID)?;
    let b = folders.create("B", a)?;
    let t = tools.create(&NewTool::new("t").in_folder(b))?;
    let direct = tools.create(&NewTool::new("direct").in_folder(a))?;

    folders.delete(a)?;

    assert!(folders.get(a)?.is_none());
    assert_eq!(folders.get(b)?.unwrap().parent_id, Some(ROOT_ID));
    // tools in B stay put, tools directly in A move up
    assert_eq!(tools.get(t)?.unwrap().folder_id, b);
    assert_eq!(tools.get(direct)?.unwrap().folder_id, ROOT_ID);
    Ok(())
}

#[test]
fn test_nested_deletes_walk_tool_up_to_root() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = open(&temp_dir)?;

    let a = db.folders().create("A", ROOT_ID)?;
    let b = db.folders().create("B", a)?;
    let t = db.tools().create(&NewTool::new("t").in_folder(b))?;

    db.folders().delete(a)?;
    assert_eq!(db.folders().get(b)?.unwrap().parent_id, Some(ROOT_ID));

    db.folders().delete(b)?;
    assert_eq!(db.tools().get(t)?.unwrap().folder_id, ROOT_ID);
    Ok(())
}

#[test]
fn test_root_is_protected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = open(&temp_dir)?;

    for result in [db.folders().delete(ROOT_ID), db.labels().delete(ROOT_ID)] {
        assert!(matches!(result, Err(AdminError::ConstraintViolation(_))));
    }
    assert_eq!(db.folders().get(ROOT_ID)?.unwrap().name, "root");
    assert_eq!(db.labels().get(ROOT_ID)?.unwrap().name, "root");
    Ok(())
}

#[test]
fn test_cycle_moves_leave_tree_unchanged() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = open(&temp_dir)?;
    let labels = db.labels();

    let a = labels.create("a", ROOT_ID)?;
    let b = labels.create("b", a)?;
    let c = labels.create("c", b)?;
    let before = labels.list_all()?;

    for (node, target) in [(a, a), (a, b), (a, c), (b, c)] {
        let err = labels.move_to(node, target).unwrap_err();
        assert!(matches!(err, AdminError::InvalidOperation(_)));
    }
    assert_eq!(labels.list_all()?, before);
    Ok(())
}

#[test]
fn test_filter_by_label_csv() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = open(&temp_dir)?;
    let labels = db.labels();
    let tools = db.tools();

    let two = labels.create("two", ROOT_ID)?;
    let three = labels.create("three", ROOT_ID)?;
    let four = labels.create("four", ROOT_ID)?;
    let five = labels.create("five", ROOT_ID)?;
    assert_eq!((two, three, four, five), (2, 3, 4, 5));

    let t2 = tools.create(&NewTool::new("t2"))?;
    let t3 = tools.create(&NewTool::new("t3"))?;
    let t45 = tools.create(&NewTool::new("t45"))?;
    let t25 = tools.create(&NewTool::new("t25"))?;
    let untagged = tools.create(&NewTool::new("untagged"))?;
    tools.add_label(t2, two)?;
    tools.add_label(t3, three)?;
    tools.add_label(t45, four)?;
    tools.add_label(t45, five)?;
    tools.add_label(t25, two)?;
    tools.add_label(t25, five)?;

    let filter = ToolFilter::default().with_label_csv("2,5")?;
    let ids: HashSet<i64> = tools.search(&filter)?.into_iter().map(|v| v.tool.id).collect();
    assert_eq!(ids, HashSet::from([t2, t45, t25]));
    assert!(!ids.contains(&t3));
    assert!(!ids.contains(&untagged));
    Ok(())
}

#[test]
fn test_search_combines_text_path_and_labels() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = open(&temp_dir)?;

    let google = db.folders().create("Google", ROOT_ID)?;
    let mail = db.folders().create("Mail", google)?;
    let prod = db.labels().create("prod", ROOT_ID)?;

    let send = db
        .tools()
        .create(&NewTool::new("send_mail").with_description("Send a message").in_folder(mail))?;
    let archive = db.tools().create(&NewTool::new("archive").in_folder(mail))?;
    db.tools().create(&NewTool::new("send_sms"))?;
    db.tools().add_label(send, prod)?;
    db.tools().add_label(archive, prod)?;

    let filter = ToolFilter::default()
        .with_search("SEND")
        .with_folder_path("google / mail")
        .with_labels([prod]);
    let views = db.tools().search(&filter)?;
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].tool.id, send);
    assert_eq!(views[0].folder_path, "Google / Mail");
    assert_eq!(views[0].labels.len(), 1);
    assert_eq!(views[0].labels[0].name, "prod");
    Ok(())
}

#[test]
fn test_copies_shallow_folder_deep_tool() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = open(&temp_dir)?;

    let src = db.folders().create("src", ROOT_ID)?;
    db.folders().create("child", src)?;
    let dest = db.folders().create("dest", ROOT_ID)?;

    let folder_copy = db.folders().copy(src, dest)?;
    let copied = db.folders().get(folder_copy)?.unwrap();
    assert_ne!(folder_copy, src);
    assert_eq!(copied.name, "src (copy)");
    assert_eq!(copied.parent_id, Some(dest));
    assert!(db.folders().list_children(folder_copy)?.is_empty());

    let l1 = db.labels().create("l1", ROOT_ID)?;
    let l2 = db.labels().create("l2", ROOT_ID)?;
    let tool = db.tools().create(&NewTool::new("tool").in_folder(src))?;
    db.tools().add_label(tool, l1)?;
    db.tools().add_label(tool, l2)?;

    let tool_copy = db.tools().copy(tool, dest)?;
    let source_labels: HashSet<i64> = db.tools().list_labels(tool)?.iter().map(|l| l.id).collect();
    let copy_labels: HashSet<i64> = db.tools().list_labels(tool_copy)?.iter().map(|l| l.id).collect();
    assert_eq!(source_labels, copy_labels);
    assert_eq!(db.tools().get(tool_copy)?.unwrap().name, "tool (copy)");
    Ok(())
}

#[test]
fn test_add_label_twice_keeps_one_row() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = open(&temp_dir)?;

    let label = db.labels().create("x", ROOT_ID)?;
    let tool = db.tools().create(&NewTool::new("t"))?;
    db.tools().add_label(tool, label)?;
    db.tools().add_label(tool, label)?;

    let rows: i64 = db.connection().query_row(
        "SELECT COUNT(*) FROM tool_labels WHERE tool_id = ?1 AND label_id = ?2",
        [tool, label],
        |row| row.get(0),
    )?;
    assert_eq!(rows, 1);
    Ok(())
}

#[test]
fn test_state_persists_across_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;

    let (folder, tool) = {
        let db = open(&temp_dir)?;
        let folder = db.folders().create("kept", ROOT_ID)?;
        let tool = db.tools().create(&NewTool::new("kept_tool").in_folder(folder))?;
        (folder, tool)
    };

    let db = open(&temp_dir)?;
    assert_eq!(db.applied_migrations()?.len(), 2);
    assert_eq!(db.folders().get(folder)?.unwrap().name, "kept");
    assert_eq!(db.tools().get(tool)?.unwrap().folder_id, folder);
    Ok(())
}

#[test]
fn test_registry_tree_scenario() {
    let mut tree = ToolTree::discover(&[ToolDefinition::new("messaging", "Messaging").with_children(vec![
        ToolDefinition::new("echo", "Echo"),
        ToolDefinition::new("broadcast", "Broadcast"),
    ])]);

    assert!(tree.toggle("echo", false));
    assert_eq!(tree.label_path("echo"), vec!["Root", "Messaging", "Echo"]);
    assert!(!tree.toggle("missing", true));
}

#[test]
fn test_plugin_registry_echo() -> Result<()> {
    let registry = McpRegistry::with_builtins();
    let out = registry.call("example.echo", serde_json::json!({"msg": "hi"}))?;
    assert_eq!(out["echo"]["msg"], "hi");
    Ok(())
}
