//! Golden tests for brief
//!
//! These tests run the binary against a fixed fixture folder and pin:
//! - The exact export text in single-file and folder mode
//! - Stable file discovery order
//! - The rendered markup of annotation markers

use assert_cmd::Command;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Get the path to the fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Get the path to the sample folder
fn sample_folder() -> PathBuf {
    fixtures_dir().join("sample_folder")
}

/// Create a command rooted at the sample folder with a throwaway store
fn brief_cmd(store: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("brief"));
    cmd.env_remove("RUST_LOG")
        .arg("--root")
        .arg(sample_folder())
        .arg("--store")
        .arg(store);
    cmd
}

/// Parse JSONL output into a vector of JSON values
fn parse_jsonl(output: &str) -> Vec<Value> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str::<Value>(l).ok())
        .collect()
}

fn run_ok(cmd: &mut Command) -> String {
    let output = cmd.output().expect("failed to execute");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn store() -> TempDir {
    tempdir().expect("temp store")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Single File ====================

    #[test]
    fn golden_single_file_export() {
        let store = store();
        run_ok(brief_cmd(store.path()).args(["open", "intro.md"]));
        run_ok(brief_cmd(store.path()).args(["strike", "very very"]));
        run_ok(brief_cmd(store.path()).args([
            "comment",
            "reading annotator",
            "--note",
            "Say what it annotates",
        ]));

        let stdout = run_ok(brief_cmd(store.path()).arg("export"));
        assert_eq!(
            stdout,
            "<source>\n\
             Introduction\n\
             intro.md\n\
             </source>\n\
             \n\
             <annotations>\n\
             1. [DELETE] \"very very\"\n\
             2. [COMMENT on \"reading annotator\"] Say what it annotates\n\
             </annotations>\n\
             \n\
             Please apply these annotations to the source document.\n"
        );
    }

    #[test]
    fn golden_selection_across_list_items() {
        let store = store();
        run_ok(brief_cmd(store.path()).args(["open", "intro.md"]));
        let stdout = run_ok(brief_cmd(store.path()).args(["strike", "markdownrecord"]));
        let items = parse_jsonl(&stdout);
        assert_eq!(items[0]["excerpt"], "markdownrecord");

        let html = run_ok(brief_cmd(store.path()).arg("show"));
        assert!(html.contains(
            "<li>render <span class=\"ann-strikethrough\" data-ann-id=\"ann-1\">markdown</span></li>"
        ));
        assert!(html.contains(
            "<li><span class=\"ann-strikethrough\" data-ann-id=\"ann-1\">record</span> marks</li>"
        ));
    }

    // ==================== Folder ====================

    #[test]
    fn golden_folder_file_order() {
        let store = store();
        let stdout = run_ok(brief_cmd(store.path()).args(["folder", "--name", "Sample"]));
        let items = parse_jsonl(&stdout);
        assert_eq!(items[0]["data"]["files"], 2);
        assert_eq!(items[1]["data"]["document"], "guide/setup.md");

        let stdout = run_ok(brief_cmd(store.path()).arg("files"));
        let files = parse_jsonl(&stdout);
        let paths: Vec<&str> = files
            .iter()
            .filter_map(|v| v.get("path").and_then(|p| p.as_str()))
            .collect();
        assert_eq!(paths, vec!["guide/setup.md", "intro.md"]);
        assert_eq!(files[0]["meta"]["current"], true);
    }

    #[test]
    fn golden_folder_export() {
        let store = store();
        run_ok(brief_cmd(store.path()).args(["folder", "--name", "Sample"]));
        run_ok(brief_cmd(store.path()).args(["strike", "Install the tool, "]));
        run_ok(brief_cmd(store.path()).args(["go", "intro.md"]));
        run_ok(brief_cmd(store.path()).args(["comment", "two goals", "--note", "three?"]));

        let stdout = run_ok(brief_cmd(store.path()).arg("export"));
        assert_eq!(
            stdout,
            "<source>\n\
             Sample\n\
             </source>\n\
             \n\
             <annotations>\n\
             ## guide/setup.md\n\
             1. [DELETE] \"Install the tool, \"\n\
             \n\
             ## intro.md\n\
             2. [COMMENT on \"two goals\"] three?\n\
             </annotations>\n\
             \n\
             Please apply these annotations to the source documents.\n"
        );
    }

    #[test]
    fn golden_frontmatter_is_not_rendered() {
        let store = store();
        run_ok(brief_cmd(store.path()).args(["open", "guide/setup.md"]));
        let html = run_ok(brief_cmd(store.path()).arg("show"));
        assert!(!html.contains("title: Setup"));
        assert!(html.contains("<h1>Setup</h1>"));
    }

    #[test]
    fn golden_list_markdown_format() {
        let store = store();
        run_ok(brief_cmd(store.path()).args(["open", "intro.md"]));
        run_ok(brief_cmd(store.path()).args(["strike", "very very"]));

        let stdout = run_ok(brief_cmd(store.path()).args(["--format", "md", "list"]));
        assert!(stdout.starts_with("## Annotations\n\n"));
        assert!(stdout.contains("- `ann-1` delete \"very very\""));
    }
}
