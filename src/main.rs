use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use noto::sync::HttpSyncClient;
use noto::{NewChecklistItem, NewNoteBlock, NewTagDef, Store, SyncPhase};

#[derive(Parser)]
#[command(name = "noto")]
#[command(about = "Offline-first notes and checklists with remote sync")]
struct Cli {
    /// Data directory holding state.json and auth.json
    #[arg(long, value_name = "DIR", default_value = ".noto")]
    data_dir: PathBuf,

    /// API root of the sync server
    #[arg(
        long,
        value_name = "URL",
        default_value = "http://localhost:4000/api/v1"
    )]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a checklist item
    Add {
        title: String,
        /// Item description (HTML)
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Add a note
    Note {
        title: String,
        /// Note body (HTML)
        #[arg(long, default_value = "")]
        html: String,
    },
    /// Print checklist items and notes
    List {
        /// Include archived entries
        #[arg(long)]
        archived: bool,
    },
    /// Toggle an item checked/unchecked
    Toggle {
        /// Checklist item id
        id: Uuid,
    },
    /// Revert the most recent undoable change
    Undo,
    /// Re-apply the most recently undone change
    Redo,
    /// Tag management
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// Write the full state as pretty JSON
    Export {
        /// Output file; stdout when omitted
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Replace the full state from an export file
    Import { file: PathBuf },
    /// Reconcile with the sync server and push local state
    Sync,
}

#[derive(Subcommand)]
enum TagCommands {
    /// Create a tag
    Add {
        title: String,
        /// Palette color key
        #[arg(long, value_name = "KEY")]
        color: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("noto=info")),
        )
        .init();

    let args = Cli::parse();
    let mut store = Store::open(&args.data_dir)
        .with_context(|| format!("could not open data directory {:?}", args.data_dir))?;

    match args.command {
        Commands::Add { title, description } => {
            let item = store.add_checklist_item(NewChecklistItem {
                title,
                description_html: description,
            })?;
            println!("added {}", item.id);
        }
        Commands::Note { title, html } => {
            let note = store.add_note(NewNoteBlock {
                title,
                html,
                content_json: None,
            })?;
            println!("added {}", note.id);
        }
        Commands::List { archived } => {
            let state = store.snapshot();
            println!("Checklist ({}):", state.checklist.len());
            for item in &state.checklist {
                if item.archived && !archived {
                    continue;
                }
                let mark = if item.checked { "x" } else { " " };
                println!("  [{mark}] {}  {}", item.id, item.title);
            }
            println!("Notes ({}):", state.notes.len());
            for note in &state.notes {
                if note.archived && !archived {
                    continue;
                }
                println!("      {}  {}", note.id, note.title);
            }
        }
        Commands::Toggle { id } => {
            store.toggle_checklist_item(id)?;
            println!("toggled {id}");
        }
        Commands::Undo => {
            if store.undo()? {
                println!("undone");
            } else {
                println!("nothing to undo");
            }
        }
        Commands::Redo => {
            if store.redo()? {
                println!("redone");
            } else {
                println!("nothing to redo");
            }
        }
        Commands::Tag { command } => match command {
            TagCommands::Add { title, color } => {
                let tag = store.add_tag(NewTagDef {
                    title,
                    color_key: color,
                })?;
                println!("added {}", tag.id);
            }
        },
        Commands::Export { out } => {
            let json = store.export_data()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, &json)
                        .with_context(|| format!("could not write {path:?}"))?;
                    println!("exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("could not read {file:?}"))?;
            store.import_data(&json)?;
            println!("imported {}", file.display());
        }
        Commands::Sync => {
            let backend = HttpSyncClient::new(&args.server, &args.data_dir)?;
            store.bootstrap(backend).await?;
            match store.sync_phase() {
                SyncPhase::Ready => {
                    store.flush_sync().await;
                    println!("synced");
                }
                _ => println!("sync unavailable, staying local"),
            }
        }
    }

    Ok(())
}
