//! # CLI Layer
//!
//! The only place that knows about terminal I/O, logging setup and process signals.
//!
//! 1. **Argument Parsing**: clap turns shell arguments into [`Commands`]
//! 2. **Context Setup**: configuration file, environment and flags become a
//!    [`PaperContext`] wrapped in the API facade
//! 3. **Dispatch**: each command calls one API method
//! 4. **Output Formatting**: `render` turns the `CmdResult` into text

use super::render;
use super::setup::{Cli, Commands};
use anyhow::Context;
use clap::Parser;
use paperstack::commands::scan::{ImageFileSource, ScanRequest};
use paperstack::commands::CmdResult;
use paperstack::config::PaperConfig;
use paperstack::store::FsBackend;
use paperstack::{PaperApi, PaperContext};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = PaperConfig::load(cli.config.as_deref())?;
    if let Some(workdir) = &cli.workdir {
        config.workdir = Some(workdir.clone());
    }
    debug!(workdir = %config.workdir().display(), "configuration loaded");

    let mut api = PaperApi::new(PaperContext::from_config(config));
    let command = cli.command.unwrap_or(Commands::Docs);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let listing = Listing::of(&command);
    let result = runtime.block_on(dispatch(&mut api, command))?;

    print_result(&result, listing, cli.json)
}

/// What part of a `CmdResult` a command prints besides its messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Listing {
    Documents,
    Pages,
    Texts,
    Nothing,
}

impl Listing {
    fn of(command: &Commands) -> Self {
        match command {
            Commands::Docs => Listing::Documents,
            Commands::Pages { .. } => Listing::Pages,
            Commands::Text { .. } => Listing::Texts,
            _ => Listing::Nothing,
        }
    }
}

/// Logs to stderr, `warn` by default and `debug` with `-v`. `RUST_LOG` wins when set.
fn init_logging(verbose: bool) {
    let default = if verbose { "paperstack=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Cancels the returned token on Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, finishing up...");
            child.cancel();
        }
    });
    token
}

async fn dispatch(api: &mut PaperApi<FsBackend>, command: Commands) -> anyhow::Result<CmdResult> {
    let result = match command {
        Commands::Scan {
            files,
            document,
            no_ocr,
            resolution,
        } => {
            let request = ScanRequest {
                document,
                pages: files.len(),
                skip_ocr: no_ocr,
            };
            let mut source = ImageFileSource::new(files, resolution);
            let cancel = cancel_on_interrupt();
            api.scan(&mut source, &request, &cancel).await?
        }
        Commands::Docs => api.list_documents()?,
        Commands::Pages { document } => api.list_pages(&document)?,
        Commands::Text { document, pages } => api.page_text(&document, &pages)?,
        Commands::Move { document, page, to } => api.move_page(&document, page, to)?,
        Commands::Delete { document, page } => api.delete_page(&document, page)?,
        Commands::Transfer {
            document,
            page,
            destination,
        } => api.transfer_page(&document, page, &destination)?,
        Commands::RedoOcr { document, pages } => {
            let cancel = cancel_on_interrupt();
            api.redo_ocr(&document, &pages, &cancel).await?
        }
        Commands::Thumbnail {
            document,
            page,
            width,
        } => api.thumbnail(&document, page, width)?,
    };
    Ok(result)
}

fn print_result(result: &CmdResult, listing: Listing, json: bool) -> anyhow::Result<()> {
    let mut out = String::new();
    if json {
        match listing {
            Listing::Documents => out.push_str(&render::render_json(&result.documents)?),
            Listing::Pages => out.push_str(&render::render_json(&result.listed_pages)?),
            Listing::Texts => out.push_str(&render::render_json(&result.texts)?),
            Listing::Nothing => {}
        }
    } else {
        match listing {
            Listing::Documents => out.push_str(&render::render_documents(&result.documents)),
            Listing::Pages => out.push_str(&render::render_pages(&result.listed_pages)),
            Listing::Texts => out.push_str(&render::render_texts(&result.texts)),
            Listing::Nothing => {}
        }
    }
    out.push_str(&render::render_paths(&result.paths));
    let messages = render::render_messages(&result.messages);
    if json {
        // Keep stdout parseable
        eprint!("{}", messages);
    } else {
        out.push_str(&messages);
    }
    print!("{}", out);
    Ok(())
}
