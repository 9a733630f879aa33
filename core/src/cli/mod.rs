pub mod commands;

use crate::error::Error;
use crate::paths::FileRole;
use crate::slice::Annotation;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "patchscope")]
#[command(author, version, about = "Slice JavaScript sources down to what a diff touched", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum AnnotateArg {
    Numbers,
    Markers,
    Plain,
}

impl From<AnnotateArg> for Annotation {
    fn from(arg: AnnotateArg) -> Self {
        match arg {
            AnnotateArg::Numbers => Annotation::LineNumbers,
            AnnotateArg::Markers => Annotation::EditMarkers,
            AnnotateArg::Plain => Annotation::Plain,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum RoleArg {
    Test,
    Source,
    Other,
}

impl From<RoleArg> for FileRole {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Test => FileRole::Test,
            RoleArg::Source => FileRole::Source,
            RoleArg::Other => FileRole::Other,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Slice one file down to the declarations a diff touched
    Slice {
        /// Pre-image of the file
        before: PathBuf,

        /// Unified diff for the file
        diff: PathBuf,

        /// Post-image of the file (rebuilt from the diff when omitted)
        #[arg(long)]
        after: Option<PathBuf>,

        /// Slice the post-image instead of the pre-image
        #[arg(long)]
        post: bool,

        /// How kept lines are prefixed
        #[arg(long)]
        annotate: Option<AnnotateArg>,

        /// JSON file with slice options; flags take precedence
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Slice every file of a multi-file diff against a checkout
    Patch {
        /// Unified diff spanning one or more files
        diff: PathBuf,

        /// Checkout holding the pre-images (defaults to current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Only show files with this role
        #[arg(long)]
        only: Option<RoleArg>,

        /// How kept lines are prefixed
        #[arg(long)]
        annotate: Option<AnnotateArg>,

        /// JSON file with the repository's file layout
        #[arg(long)]
        layout: Option<PathBuf>,
    },

    /// List test cases that are new or modified between two revisions
    ChangedTests {
        before: PathBuf,
        after: PathBuf,

        /// JSON file with suite and case callee names
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Append a code fragment to a file or inside its trailing suite
    Inject {
        file: PathBuf,

        /// File holding the fragment to insert
        fragment: PathBuf,

        /// Insert into the top-level suite with this description
        #[arg(long)]
        suite: Option<String>,

        /// Overwrite the file instead of printing the result
        #[arg(long, conflicts_with = "as_diff")]
        write: bool,

        /// Print the change as a unified diff
        #[arg(long)]
        as_diff: bool,
    },

    /// Show the file's preamble and its first few definitions
    Outline {
        file: PathBuf,

        /// Number of functions or classes to keep
        #[arg(long, default_value = "1")]
        limit: usize,
    },

    /// Show the scope enclosing a line
    Scope {
        file: PathBuf,

        /// 1-indexed line number
        line: usize,
    },
}

pub fn run(cli: Cli) -> Result<(), String> {
    let format = cli.format;

    let result = match cli.command {
        Commands::Slice {
            before,
            diff,
            after,
            post,
            annotate,
            config,
        } => commands::slice::run(
            &before,
            &diff,
            after.as_deref(),
            commands::slice::Overrides {
                post,
                annotate: annotate.map(Annotation::from),
            },
            config.as_deref(),
            format,
        ),
        Commands::Patch {
            diff,
            root,
            only,
            annotate,
            layout,
        } => commands::patch::run(
            &diff,
            &root.unwrap_or_else(|| PathBuf::from(".")),
            only.map(FileRole::from),
            annotate.map(Annotation::from),
            layout.as_deref(),
            format,
        ),
        Commands::ChangedTests {
            before,
            after,
            config,
        } => commands::changed_tests::run(&before, &after, config.as_deref(), format),
        Commands::Inject {
            file,
            fragment,
            suite,
            write,
            as_diff,
        } => commands::inject::run(&file, &fragment, suite.as_deref(), write, as_diff, format),
        Commands::Outline { file, limit } => commands::outline::run(&file, limit, format),
        Commands::Scope { file, line } => commands::scope::run(&file, line, format),
    };

    result.map_err(|e| render_error(&e, format))
}

/// JSON output keeps failures machine-readable too.
fn render_error(err: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => err.to_string(),
        OutputFormat::Json => serde_json::to_string(err).unwrap_or_else(|_| err.to_string()),
    }
}
