//! CLI module - Command-line interface definitions and handlers

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::warn;

use crate::backends::clipboard::{Clipboard, FileClipboard, StdoutClipboard};
use crate::cache::kv::FileStore;
use crate::cache::store::Persistence;
use crate::core::annotation::{AnnotationId, AnnotationKind};
use crate::core::model::ResultSet;
use crate::core::paths::store_dir;
use crate::core::render::{OutputFormat, RenderConfig, Renderer};
use crate::flows::commands::{self, parse_span, Target};
use crate::flows::session::Workspace;

/// brief - strike and comment rendered markdown, then export the marks as a change request.
#[derive(Parser, Debug)]
#[command(name = "brief")]
#[command(
    author,
    version,
    about,
    long_about = r#"brief renders a markdown document and lets you strike or comment on its text.

Annotations are stored under ROOT/.brief and re-applied whenever the document is
opened again. `export` prints the marks as a change request an AI agent can apply.

Listing commands print a ResultSet in the selected format (default: jsonl):
- jsonl: one JSON object per line
- json: a single JSON array
- md: human-friendly Markdown
- raw: excerpts only

Examples:
    brief open notes.md
    brief strike "some text"
    brief comment "First paragraph" --note "Needs a source"
    brief folder docs --name Docs
    brief go docs/intro.md
    brief export --out request.txt
"#
)]
pub struct Cli {
    /// Root directory for all operations.
    #[arg(
        long,
        global = true,
        default_value = ".",
        value_name = "ROOT",
        long_help = "Root directory for all operations (defaults to the current directory).\n\n\
Document paths are stored relative to this root."
    )]
    pub root: PathBuf,

    /// Directory holding persisted annotations.
    #[arg(
        long,
        global = true,
        env = "BRIEF_STORE",
        value_name = "DIR",
        long_help = "Directory holding persisted annotations (defaults to ROOT/.brief).\n\n\
One JSON file is written per storage key."
    )]
    pub store: Option<PathBuf>,

    /// Output format (jsonl/json/md/raw).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        long_help = "Select the output format for listing commands.\n\n\
Supported values:\n\
- jsonl (default)\n\
- json\n\
- md (markdown)\n\
- raw\n\n\
`export` and `show` always print plain text."
    )]
    pub format: String,

    /// Disable colored output (when applicable).
    #[arg(
        long,
        global = true,
        long_help = "Disable colored output. This is useful when piping to files or when your\n\
terminal does not support ANSI colors."
    )]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Reduce non-essential output: notifications are suppressed and only errors\n\
are logged. Results are still printed to stdout."
    )]
    pub quiet: bool,

    /// Verbose mode (more diagnostics).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Enable debug diagnostics on stderr. RUST_LOG overrides this when set."
    )]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(
        long,
        global = true,
        long_help = "Pretty-print JSON and JSONL output with indentation for human readability.\n\n\
Has no effect on md/raw formats."
    )]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which text an annotation applies to
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Quoted text to select.
    #[arg(
        value_name = "TEXT",
        required_unless_present = "at",
        long_help = "Text to select, matched against the rendered document text (markdown\n\
syntax removed). It may span formatting and paragraph boundaries."
    )]
    pub text: Option<String>,

    /// Which occurrence of TEXT to select (1-based).
    #[arg(long, default_value_t = 1, value_name = "N", conflicts_with = "at")]
    pub nth: usize,

    /// Select by character offsets instead of quoting.
    #[arg(
        long,
        value_name = "START:END",
        conflicts_with = "text",
        long_help = "Select the characters START..END (end exclusive) of the rendered\n\
document text instead of quoting."
    )]
    pub at: Option<String>,
}

impl TargetArgs {
    fn target(&self) -> Result<Target> {
        match (&self.at, &self.text) {
            (Some(span), _) => {
                let (start, end) = parse_span(span)?;
                Ok(Target::Span { start, end })
            }
            (None, Some(text)) => Ok(Target::Quote {
                text: text.clone(),
                nth: self.nth,
            }),
            (None, None) => anyhow::bail!("Provide TEXT or --at START:END"),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open one markdown file (single-file mode).
    #[command(
        long_about = "Open FILE in single-file mode. Annotations made on the same file are\n\
re-applied; opening a different file starts from an empty set and leaves folder\n\
mode.\n\n\
Examples:\n\
  brief open README.md\n"
    )]
    Open {
        /// Markdown file, relative to ROOT.
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Open every markdown file under a directory (folder mode).
    #[command(
        long_about = "Open every markdown file under DIR (default: ROOT) in folder mode.\n\
Files are discovered with .gitignore rules applied and listed in path order.\n\
Re-opening a folder with the same name keeps annotations of files still present.\n\n\
Examples:\n\
  brief folder docs --name Docs\n\
  brief folder --start guide/setup.md\n"
    )]
    Folder {
        /// Directory to open, relative to ROOT.
        #[arg(value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Folder name used in exports (default: the directory name).
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// File to show first (default: the first file).
        #[arg(long, value_name = "PATH")]
        start: Option<String>,
    },

    /// Switch to another file of the open folder.
    Go {
        /// File path as listed by `brief files`.
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Mark text for deletion.
    #[command(
        long_about = "Strike through the selected text. It is exported as a [DELETE] line.\n\n\
Examples:\n\
  brief strike \"very very\"\n\
  brief strike the --nth 3\n\
  brief strike --at 10:24\n"
    )]
    Strike {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Attach a comment to text.
    #[command(
        long_about = "Attach a comment to the selected text. It is exported as a\n\
[COMMENT on \"...\"] line. Leading and trailing whitespace of the note is removed.\n\n\
Examples:\n\
  brief comment \"First paragraph\" --note \"Needs a source\"\n"
    )]
    Comment {
        #[command(flatten)]
        target: TargetArgs,

        /// Comment text.
        #[arg(long, short = 'n', value_name = "NOTE")]
        note: String,
    },

    /// Change the text of a comment.
    Edit {
        /// Annotation id (`ann-3` or `3`).
        #[arg(value_name = "ID")]
        id: AnnotationId,

        /// New comment text.
        #[arg(long, short = 'n', value_name = "NOTE")]
        note: String,
    },

    /// Remove an annotation.
    Remove {
        /// Annotation id (`ann-3` or `3`).
        #[arg(value_name = "ID")]
        id: AnnotationId,
    },

    /// Remove every annotation of the open document.
    Clear,

    /// List annotations of the open document.
    List {
        /// In folder mode, list annotations of every file.
        #[arg(long)]
        all: bool,
    },

    /// List folder files with their annotation counts.
    Files,

    /// Print the change request for all annotations.
    #[command(
        long_about = "Print the annotations as a change request: a <source> block naming the\n\
document (or folder), numbered [DELETE] / [COMMENT] lines and a closing instruction.\n\
In folder mode, lines are grouped per file and numbered across files.\n\n\
Fails when there is nothing to export.\n\n\
Examples:\n\
  brief export | pbcopy\n\
  brief export --out request.txt\n"
    )]
    Export {
        /// Write to a file instead of stdout.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Print the rendered HTML with annotation markers.
    Show,

    /// Show the active mode, document and annotation counts.
    Status,
}

fn print_results(result_set: &ResultSet, config: RenderConfig) {
    let output = Renderer::with_config(config).render(result_set);
    if !output.is_empty() {
        println!("{}", output);
    }
}

pub fn run(cli: Cli) -> Result<()> {
    // Parse output format
    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    if cli.no_color {
        colored::control::set_override(false);
    }
    crate::logging::init(cli.verbose, cli.quiet, !cli.no_color);

    // Get absolute root path
    let root = cli.root.canonicalize().unwrap_or(cli.root);
    let store = cli.store.unwrap_or_else(|| store_dir(&root));

    let mut ws = Workspace::new(Persistence::new(FileStore::new(store)));
    if let Err(e) = ws.restore() {
        warn!(error = %e, "could not restore the previous session");
    }

    let result_set = match cli.command {
        Commands::Open { file } => commands::run_open(&mut ws, &root, &file)?,
        Commands::Folder { dir, name, start } => commands::run_folder(
            &mut ws,
            &root,
            dir.as_deref(),
            name.as_deref(),
            start.as_deref(),
        )?,
        Commands::Go { path } => commands::run_go(&mut ws, &path)?,
        Commands::Strike { target } => {
            commands::run_annotate(&mut ws, AnnotationKind::Strike, &target.target()?, None)?
        }
        Commands::Comment { target, note } => commands::run_annotate(
            &mut ws,
            AnnotationKind::Comment,
            &target.target()?,
            Some(&note),
        )?,
        Commands::Edit { id, note } => commands::run_edit(&mut ws, id, &note)?,
        Commands::Remove { id } => commands::run_remove(&mut ws, id)?,
        Commands::Clear => commands::run_clear(&mut ws)?,
        Commands::List { all } => commands::run_list(&ws, all)?,
        Commands::Files => commands::run_files(&ws)?,
        Commands::Status => commands::run_status(&ws)?,
        Commands::Show => {
            println!("{}", commands::run_show(&ws)?);
            return Ok(());
        }
        Commands::Export { out } => {
            let mut clipboard: Box<dyn Clipboard> = match out {
                Some(path) => Box::new(FileClipboard::new(root.join(path))),
                None => Box::new(StdoutClipboard),
            };
            let toast = commands::run_export(&mut ws, clipboard.as_mut())?;
            if !cli.quiet && !toast.is_empty() {
                eprintln!("{}", toast.green());
            }
            return Ok(());
        }
    };

    print_results(&result_set, render_config);
    Ok(())
}
