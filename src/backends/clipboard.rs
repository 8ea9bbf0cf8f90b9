//! Clipboard sinks for the export text

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

/// Somewhere the export text can be copied to
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> io::Result<()>;
}

/// Writes to standard output, for piping into a system clipboard tool
#[derive(Debug, Default)]
pub struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", text)?;
        out.flush()
    }
}

/// Overwrites a file with the export text
#[derive(Debug, Clone)]
pub struct FileClipboard {
    path: PathBuf,
}

impl FileClipboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Clipboard for FileClipboard {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, text)
    }
}

/// Keeps the last copied text in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> io::Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}
