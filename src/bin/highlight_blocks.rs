//! Build highlights for one document and print them as JSON
//!
//! Reads a block list and a document tree from disk, builds the highlight index and
//! prints either the derived block rows or the highlights the overlay would draw.
//!
//! Usage:
//!   cargo run --bin highlight_blocks -- --tree doc.tree.json --blocks doc.blocks.json
//!   cargo run --bin highlight_blocks -- --tree t.json --blocks b.json --select b3:p2 --selected-only
//!   cargo run --bin highlight_blocks -- --tree t.json --blocks b.json --rows

use block_highlighter::block::blocks_from_json;
use block_highlighter::session::{LoadStatus, ViewerSession};
use block_highlighter::{DocumentTree, Error, HighlighterConfig, Result};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

struct CliConfig {
    tree: PathBuf,
    blocks: PathBuf,
    config: Option<PathBuf>,
    select: Option<String>,
    selected_only: bool,
    rows: bool,
}

impl CliConfig {
    fn from_args() -> std::result::Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut tree = None;
        let mut blocks = None;
        let mut config = None;
        let mut select = None;
        let mut selected_only = false;
        let mut rows = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--tree" => {
                    i += 1;
                    tree = args.get(i).map(PathBuf::from);
                },
                "--blocks" => {
                    i += 1;
                    blocks = args.get(i).map(PathBuf::from);
                },
                "--config" => {
                    i += 1;
                    config = args.get(i).map(PathBuf::from);
                },
                "--select" => {
                    i += 1;
                    select = args.get(i).cloned();
                },
                "--selected-only" => {
                    selected_only = true;
                },
                "--rows" => {
                    rows = true;
                },
                other => {
                    return Err(format!("unknown argument: {}", other));
                },
            }
            i += 1;
        }

        Ok(Self {
            tree: tree.ok_or("--tree <path> is required")?,
            blocks: blocks.ok_or("--blocks <path> is required")?,
            config,
            select,
            selected_only,
            rows,
        })
    }

    fn document_id(&self) -> String {
        self.blocks
            .file_stem()
            .map(|s| s.to_string_lossy().trim_end_matches(".blocks").to_string())
            .unwrap_or_else(|| "document".to_string())
    }
}

fn read_blocks(cli: &CliConfig, document_id: &str) -> Result<Vec<block_highlighter::Block>> {
    let bytes = fs::read(&cli.blocks).map_err(|e| Error::BlockFetch {
        document_id: document_id.to_string(),
        reason: format!("{}: {}", cli.blocks.display(), e),
    })?;
    blocks_from_json(&bytes)
}

fn read_tree(cli: &CliConfig, document_id: &str) -> Result<DocumentTree> {
    let bytes = fs::read(&cli.tree).map_err(|e| Error::TreeFetch {
        document_id: document_id.to_string(),
        reason: format!("{}: {}", cli.tree.display(), e),
    })?;
    DocumentTree::from_slice(&bytes)
}

fn run(cli: &CliConfig) -> Result<serde_json::Value> {
    let config = match &cli.config {
        Some(path) => HighlighterConfig::from_path(path)?,
        None => HighlighterConfig::default(),
    };

    let document_id = cli.document_id();
    let mut session = ViewerSession::new(config);
    let ticket = session.begin_load(&document_id);
    let blocks = read_blocks(cli, &document_id);
    let tree = read_tree(cli, &document_id);
    session.finish_load(ticket, blocks, tree)?;

    if session.status() == &LoadStatus::Empty {
        return Ok(json!({
            "document": document_id,
            "message": session.status().message(),
            "highlights": [],
        }));
    }

    if let Some(id) = &cli.select {
        session.select(Some(id.as_str()))?;
    }
    session.set_show_all(!cli.selected_only);

    if cli.rows {
        return Ok(json!({
            "document": document_id,
            "selected": session.selected_id(),
            "blocks": session.highlight_index().derived_blocks(),
        }));
    }

    let visible = session.current_visible_highlights();
    Ok(json!({
        "document": document_id,
        "selected": session.selected_id(),
        "mode": session.visibility_mode(),
        "highlights": visible.highlights,
    }))
}

fn main() {
    env_logger::init();

    let cli = match CliConfig::from_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!(
                "Usage: highlight_blocks --tree <path> --blocks <path> [--config <path>] [--select <id>] [--selected-only] [--rows]"
            );
            std::process::exit(2);
        },
    };

    match run(&cli) {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            },
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        },
    }
}
