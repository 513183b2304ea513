use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use cli::drafts::{self, DraftView};
use cli::editor;
use scratchbook_core::config::ConfigFile;
use scratchbook_core::project::{FolderOutcome, ProjectData};
use scratchbook_core::save::{self, SaveOutcome, SkipReason};
use scratchbook_core::session::{self, ScratchBook, ScratchView};
use scratchbook_core::{classify, naming};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let book = ScratchBook::new(ConfigFile::new(cli.config.clone()));

    match cli.command {
        Commands::New { no_edit } => run_new(&book, no_edit),
        Commands::Save { input, json } => run_save(&book, input.as_deref(), json),
        Commands::Classify { input, json } => run_classify(input.as_deref(), json),
        Commands::CloseAll { json } => run_close_all(&book, json),
        Commands::Browse { limit, json } => run_browse(&book, limit, json),
        Commands::OpenFolder { project } => run_open_folder(&book, project.as_deref()),
        Commands::Config => run_config(&book),
    }
}

#[derive(Parser)]
#[command(name = "scratchbook")]
#[command(about = "Keep scratch buffers as timestamped files", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a new scratch buffer in $VISUAL/$EDITOR and save it on close
    New {
        /// Only create the draft and print its path
        #[arg(long, default_value_t = false)]
        no_edit: bool,
    },
    /// Save a file (or stdin) as a new scratch file
    Save {
        /// Input file; `-` or omitted reads stdin
        input: Option<PathBuf>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the detected content type
    Classify {
        /// Input file; `-` or omitted reads stdin
        input: Option<PathBuf>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Save and close every pending draft
    CloseAll {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// List saved scratch files, newest first
    Browse {
        /// Show at most this many entries
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the scratch folder, or add it to a JSON project file
    OpenFolder {
        /// Project file to add the folder to
        #[arg(long)]
        project: Option<PathBuf>,
    },
    /// Print the effective settings
    Config,
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(p) if p != Path::new("-") => {
            std::fs::read_to_string(p).with_context(|| format!("Failed to read {:?}", p))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn run_new(book: &ScratchBook<ConfigFile>, no_edit: bool) -> Result<()> {
    let folder = book.folder()?;
    let draft = drafts::create_draft(&folder)?;
    if no_edit {
        println!("{}", draft.display());
        return Ok(());
    }

    editor::edit(&draft).with_context(|| format!("Draft kept at {:?}", draft))?;

    let mut view = DraftView::open(0, &draft)?;
    session::prepare_new(&mut view);
    let outcome = book
        .on_pre_close(&mut view, &Local::now())
        .with_context(|| format!("Draft kept at {:?}", draft))?;
    match &outcome {
        SaveOutcome::Saved { path, tag } => {
            println!("saved {} ({})", path.display(), tag);
            view.close();
        }
        SaveOutcome::Updated { path } => {
            println!("updated {}", path.display());
            view.close();
        }
        SaveOutcome::Skipped {
            reason: SkipReason::BelowMinimum,
        } => {
            println!("nothing to save");
            view.close();
        }
        SaveOutcome::Skipped { .. } => {
            println!("auto-save on close is off; draft kept at {}", draft.display());
        }
    }
    Ok(())
}

fn run_save(book: &ScratchBook<ConfigFile>, input: Option<&Path>, json: bool) -> Result<()> {
    let text = read_input(input)?;
    let settings = book.settings()?;
    let outcome = save::save_text(&settings.save_config(), &text, &Local::now())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    match outcome {
        SaveOutcome::Saved { path, tag } => println!("saved {} ({})", path.display(), tag),
        SaveOutcome::Updated { path } => println!("updated {}", path.display()),
        SaveOutcome::Skipped { .. } => println!("nothing to save"),
    }
    Ok(())
}

fn run_classify(input: Option<&Path>, json: bool) -> Result<()> {
    let text = read_input(input)?;
    let result = classify(&text);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{} {}", result.tag, result.extension);
    }
    Ok(())
}

fn run_close_all(book: &ScratchBook<ConfigFile>, json: bool) -> Result<()> {
    let folder = book.folder()?;
    let mut views = drafts::pending_drafts(&folder)?;
    let pending = views.len();
    let summary = book.close_all(&mut views, &Local::now())?;
    info!(pending, closed = summary.closed, "close-all finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    for path in &summary.saved {
        println!("saved {}", path.display());
    }
    for view in &views {
        eprintln!("kept draft {}", view.draft_path().display());
    }
    println!("closed {} scratch draft(s)", summary.closed);
    Ok(())
}

fn run_browse(book: &ScratchBook<ConfigFile>, limit: Option<usize>, json: bool) -> Result<()> {
    let mut entries = book.browse(&Local::now())?;
    if let Some(n) = limit {
        entries.truncate(n);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("no saved scratch files found");
        return Ok(());
    }
    for e in &entries {
        println!("{}\t{}  ·  {}", e.file_name, e.age, e.preview);
    }
    Ok(())
}

fn run_open_folder(book: &ScratchBook<ConfigFile>, project: Option<&Path>) -> Result<()> {
    let Some(project_path) = project else {
        let folder = book.folder()?;
        naming::ensure_dir(&folder)?;
        println!("{}", folder.display());
        return Ok(());
    };

    let mut data = ProjectData::load(project_path)?;
    match book.open_folder(&mut data)? {
        FolderOutcome::Added => {
            data.save(project_path)?;
            println!("added scratch folder to {}", project_path.display());
        }
        FolderOutcome::AlreadyPresent => println!("already in {}", project_path.display()),
    }
    Ok(())
}

fn run_config(book: &ScratchBook<ConfigFile>) -> Result<()> {
    let settings = book.settings()?;
    print!("{}", settings.to_toml()?);
    Ok(())
}

