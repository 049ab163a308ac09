//! Markview - render markdown to HTML and manage review comments.
//!
//! # Usage
//!
//! ```bash
//! markview render README.md > readme.html
//! markview --standalone render README.md
//! markview outline README.md
//! markview comments add README.md --start 10 --end 24 --body "Reword this"
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use markview::app::{App, Model};
use markview::comments::scan_comments;
use markview::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    recent_files_path, save_config_flags,
};
use markview::document::escape;
use markview::perf;
use markview::pipeline::RenderOptions;
use markview::store::{JsonFileStore, RecentFiles};

/// Render markdown to HTML with source offsets and review comments
#[derive(Parser, Debug)]
#[command(name = "markview", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log timing of the render pipeline
    #[arg(long, global = true)]
    perf: bool,

    /// Do not prepend the front matter table
    #[arg(long, global = true)]
    no_front_matter: bool,

    /// Wrap rendered HTML in a complete page
    #[arg(long, global = true)]
    standalone: bool,

    /// Resolve relative image paths against DIR instead of the file's directory
    #[arg(long, global = true, value_name = "DIR")]
    image_base: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long, global = true)]
    save: bool,

    /// Clear saved defaults
    #[arg(long, global = true)]
    clear: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a markdown file to HTML
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write HTML here instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Print the heading outline
    Outline {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List or edit review comments
    Comments {
        #[command(subcommand)]
        action: CommentsAction,
    },
    /// Show recently opened files
    Recent {
        /// Forget all recent files
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CommentsAction {
    /// List comments with the text they cover
    List {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Comment on bytes START..END of the file
    Add {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        start: usize,
        #[arg(long)]
        end: usize,
        #[arg(long)]
        body: String,
    },
    /// Replace the body of a comment
    Update {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(value_name = "ID")]
        id: String,
        #[arg(long)]
        body: String,
    },
    /// Remove a comment, keeping the text it covered
    Delete {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(value_name = "ID")]
        id: String,
    },
}

fn render_options(flags: &ConfigFlags) -> RenderOptions {
    RenderOptions {
        image_base: flags.image_base.clone(),
        show_front_matter: !flags.no_front_matter,
        ..RenderOptions::default()
    }
}

fn standalone_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{body}</body>\n</html>\n",
        escape(title)
    )
}

fn open_model(app: &mut App<JsonFileStore>, file: &Path) -> Result<Model> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }
    Ok(app.open(file))
}

fn run_comments(app: &mut App<JsonFileStore>, action: CommentsAction) -> Result<()> {
    let mut out = std::io::stdout().lock();
    match action {
        CommentsAction::List { file } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            for span in scan_comments(&source) {
                let comment = &span.comment;
                writeln!(
                    out,
                    "{}\t{}\t{:?}",
                    comment.id,
                    comment.updated.to_rfc3339(),
                    &source[span.anchored_range()]
                )?;
                for line in comment.body.lines() {
                    writeln!(out, "    {line}")?;
                }
            }
        }
        CommentsAction::Add {
            file,
            start,
            end,
            body,
        } => {
            let mut model = open_model(app, &file)?;
            let comment = model
                .add_comment(start, end, &body)
                .context("Failed to add comment")?;
            writeln!(out, "{}", comment.id)?;
        }
        CommentsAction::Update { file, id, body } => {
            let mut model = open_model(app, &file)?;
            model
                .update_comment(&id, &body)
                .context("Failed to update comment")?;
        }
        CommentsAction::Delete { file, id } => {
            let mut model = open_model(app, &file)?;
            if !model.delete_comment(&id).context("Failed to delete comment")? {
                eprintln!("[warn] No comment {id} in {}", file.display());
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = ConfigFlags {
        perf: cli.perf,
        no_front_matter: cli.no_front_matter,
        standalone: cli.standalone,
        image_base: cli.image_base.clone(),
    };

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);
    perf::set_enabled(effective.perf);

    let recent = RecentFiles::load(JsonFileStore::new(recent_files_path()))
        .context("Failed to load recent files")?;
    let mut app = App::new(render_options(&effective), recent);

    match cli.command {
        Command::Render { file, output } => {
            let model = open_model(&mut app, &file)?;
            let mut html = model.document().html.clone();
            if effective.standalone {
                let title = file
                    .file_stem()
                    .map_or_else(|| "document".into(), |s| s.to_string_lossy());
                html = standalone_page(&title, &html);
            }
            match output {
                Some(path) => std::fs::write(&path, html)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => std::io::stdout().lock().write_all(html.as_bytes())?,
            }
        }
        Command::Outline { file } => {
            let model = open_model(&mut app, &file)?;
            let mut out = std::io::stdout().lock();
            for item in &model.document().outline {
                let indent = "  ".repeat(usize::from(item.level.saturating_sub(1)));
                writeln!(out, "{indent}{} (#{})", item.title, item.anchor_id)?;
            }
        }
        Command::Comments { action } => run_comments(&mut app, action)?,
        Command::Recent { reset } => {
            if reset {
                app.recent_mut().clear().context("Failed to clear recent files")?;
            }
            let mut out = std::io::stdout().lock();
            for path in app.recent_files() {
                writeln!(out, "{}", path.display())?;
            }
        }
    }
    Ok(())
}
