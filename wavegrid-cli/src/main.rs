mod args;
mod error;
mod paths;
mod table;

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use simplelog::{Config, LevelFilter, WriteLogger};
use wavegrid::column::FixedViewport;
use wavegrid::persist::{MemoryStorage, StateHandler, StateStorage, StorageKind, UrlStorage};
use wavegrid::prelude::*;
use wavegrid::sync::DebouncedSync;

use crate::args::Args;
use crate::error::CliError;

/// Quiet period before saved widget state is written to disk.
const STATE_FLUSH_DELAY: Duration = Duration::from_millis(250);

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    paths::rotate_logs();
    let file = paths::log_file().and_then(|path| {
        fs::create_dir_all(path.parent()?).ok()?;
        File::create(path).ok()
    });
    let result = match file {
        Some(file) => WriteLogger::init(level, Config::default(), file),
        None => WriteLogger::init(LevelFilter::Warn, Config::default(), std::io::stderr()),
    };
    if let Err(e) = result {
        eprintln!("Failed to initialize logger: {}", e);
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = fs::read_to_string(path).map_err(|e| CliError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| CliError::json(path, e))
}

fn load_config(args: &Args) -> Result<GridConfig, CliError> {
    if let Some(path) = &args.config {
        return read_json(path);
    }
    match paths::grid_config() {
        Some(path) if path.exists() => {
            info!("Using grid config {}", path.display());
            read_json(&path)
        }
        _ => Ok(GridConfig::new("grid")),
    }
}

/// Local widget state backed by a file between runs.
fn local_storage() -> Arc<MemoryStorage> {
    let storage = Arc::new(MemoryStorage::local());
    if let Some(saved) = paths::state_file().and_then(|path| fs::read_to_string(path).ok()) {
        storage.save(saved.trim());
    }
    storage
}

fn write_state_file(storage: &dyn StateStorage) {
    let Some(path) = paths::state_file() else { return };
    let result = match storage.load() {
        Some(encoded) => path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| fs::write(&path, encoded)),
        None if path.exists() => fs::remove_file(&path),
        None => Ok(()),
    };
    match result {
        Ok(()) => debug!("Widget state written to {}", path.display()),
        Err(e) => warn!("Failed to write widget state: {}", e),
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(&args)?;
    let rows: serde_json::Value = read_json(&args.rows)?;
    let name = config.name.clone().unwrap_or_else(|| "grid".to_string());

    let url_storage = args.state_url.as_deref().map(UrlStorage::parse).transpose()?.map(Arc::new);
    let storage: Arc<dyn StateStorage> = match &url_storage {
        Some(url) => url.clone(),
        None => local_storage(),
    };
    let session = Arc::new(SessionContext::with_state(|_| true, StateHandler::new(storage.clone())));
    if args.reset {
        session.state().clear();
    }

    let flush_storage = storage.clone();
    let sync = DebouncedSync::spawn(STATE_FLUSH_DELAY, move |widgets| {
        debug!("Flushing state for {} widgets", widgets.len());
        if flush_storage.kind() == StorageKind::Local {
            write_state_file(flush_storage.as_ref());
        }
    });

    let mut grid = Grid::from_value(config, rows)
        .with_viewport(&FixedViewport(args.width))
        .with_session(session.clone());
    if let Err(e) = grid.restore_state() {
        warn!("Ignoring saved state: {}", e);
    }

    if let Some((field, direction)) = &args.sort
        && !grid.sort_by(field, *direction)
    {
        eprintln!("Column '{}' is not sortable", field);
    }
    if let Some(size) = args.page_size {
        grid.set_page_size(size);
    }
    if let Some(page) = args.page {
        grid.go_to_page(page);
    }
    for id in &args.select {
        grid.click_row_control(id);
    }
    for id in &args.expand {
        grid.toggle_row_expansion(id)?;
    }
    if !args.toggle.is_empty() && grid.edit().mode() == EditMode::None {
        grid.set_edit_mode(EditMode::QuickEdit);
    }
    for (id, field) in &args.toggle {
        if !grid.toggle_checkbox(id, field)? {
            eprintln!("'{}' is not an editable checkbox column", field);
        }
    }

    for event in grid.drain_events() {
        debug!("{:?}", event);
    }
    print!("{}", table::draw(&grid.view()));

    if args.commit {
        for patch in grid.commit_edits() {
            println!("{}", serde_json::json!({"id": patch.id, "index": patch.index, "row": patch.row}));
        }
    }

    if grid.save_state() {
        sync.notify(name);
    }
    sync.shutdown().await;

    if let Some(url) = url_storage {
        println!("{}", url.url());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    init_logging(args.verbose);
    info!("wavegrid starting on {}", args.rows.display());

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
