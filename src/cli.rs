//! CLI parsing and command dispatch.

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::{
    catalog::Catalog,
    commands,
    config::Config,
    error::Result,
    logging,
    paths::display_path,
    remote::GcsObject,
    sync::Synchronizer,
};

/// Parsed command line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "starli",
    version,
    about = "A CLI to generate boilerplate code for your project",
    long_about = "Starli lets you generate boilerplate code for your project via interactive \
                  prompts. You are able to select different frameworks, add libraries and other \
                  tools like linters."
)]
struct Cli {
    /// Config file (default is $HOME/.starli.yaml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Control colored output.
    #[arg(long, value_enum, default_value = "auto", global = true)]
    color: ColorMode,
    /// Enable verbose output.
    #[arg(long, global = true)]
    verbose: bool,
    /// Command to execute (defaults to generate).
    #[command(subcommand)]
    command: Option<Command>,
}

/// Supported color output modes.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorMode {
    /// Only colorize when stdout is a TTY.
    Auto,
    /// Always colorize output.
    Always,
    /// Never colorize output.
    Never,
}

// Commands are ordered alphabetically - maintain this order.
/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Delete the local specs cache.
    ClearCache,
    /// Generate a project from a template.
    #[command(alias = "new")]
    Generate {
        /// Template name (prompted when omitted).
        template: Option<String>,
        /// Directory to generate into (defaults to the project name).
        #[arg(long, short = 'd')]
        dir: Option<PathBuf>,
        /// Accept every default answer without prompting.
        #[arg(long, short = 'y')]
        yes: bool,
        /// Overwrite existing files.
        #[arg(long, short = 'f')]
        force: bool,
    },
    /// List available templates.
    #[command(alias = "ls")]
    List,
    /// Fetch the latest specs if they changed.
    Update,
}

/// How a command wants the specs cache prepared before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preflight {
    /// Install when missing, otherwise refresh in the background.
    EnsureFresh,
    /// Install when missing; the command refreshes itself.
    EnsurePresent,
    /// Leave the cache alone.
    Skip,
}

impl Command {
    /// Cache preparation needed by this command.
    fn preflight(&self) -> Preflight {
        match self {
            Self::ClearCache => Preflight::Skip,
            Self::Update => Preflight::EnsurePresent,
            Self::Generate { .. } | Self::List => Preflight::EnsureFresh,
        }
    }
}

/// Run the requested command.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);
    let color = cli.color.into_choice();

    let config = Config::load(cli.config.as_deref())?;
    if let Some(path) = config.source() {
        eprintln!("Using config file: {}", display_path(path));
    }

    let paths = config.cache_paths()?;
    let store = Arc::new(GcsObject::new(&config)?);
    let sync = Synchronizer::new(paths.clone(), store).with_color(color.enabled());
    let catalog = Catalog::new(&paths);

    let command = cli.command.unwrap_or(Command::Generate {
        template: None,
        dir: None,
        yes: false,
        force: false,
    });
    preflight(&sync, command.preflight()).await?;

    // Match arms are ordered alphabetically - maintain this order.
    match command {
        Command::ClearCache => commands::clear_cache::run(&sync, color).await,
        Command::Generate {
            template,
            dir,
            yes,
            force,
        } => commands::generate::run(&catalog, color, template, dir, yes, force).await,
        Command::List => commands::list::run(&catalog, color).await,
        Command::Update => commands::update::run(&sync).await,
    }
}

/// Make sure the specs cache is usable before a command runs.
async fn preflight(sync: &Synchronizer, mode: Preflight) -> Result<()> {
    if mode == Preflight::Skip {
        return Ok(());
    }
    if !sync.exists()? {
        return sync.install().await;
    }
    if mode == Preflight::EnsureFresh {
        // Never awaited; the command runs against the current cache.
        let _detached = sync.spawn_background_refresh();
        debug!("started background specs refresh");
    }
    Ok(())
}

impl ColorMode {
    /// Convert a CLI color mode into a color choice.
    fn into_choice(self) -> commands::ColorChoice {
        match self {
            Self::Auto => commands::ColorChoice::Auto,
            Self::Always => commands::ColorChoice::Always,
            Self::Never => commands::ColorChoice::Never,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Arc};

    use clap::{CommandFactory, Parser};
    use tokio::task;

    use super::{Cli, Command, Preflight, preflight};
    use crate::{
        error::Error,
        sync::Synchronizer,
        testutil::{ArchiveBuilder, CacheFixture, FakeStore, descriptor_json},
    };

    fn synchronizer(fixture: &CacheFixture, store: &Arc<FakeStore>) -> Synchronizer {
        Synchronizer::new(fixture.paths().clone(), store.clone()).quiet()
    }

    fn react_archive() -> Vec<u8> {
        ArchiveBuilder::new().template("react", "React").build()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_with_global_config() {
        let cli = Cli::try_parse_from([
            "starli",
            "generate",
            "react",
            "--yes",
            "--config",
            "/tmp/starli.yaml",
        ])
        .expect("parse");
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/starli.yaml")));
        match cli.command {
            Some(Command::Generate { template, yes, .. }) => {
                assert_eq!(template.as_deref(), Some("react"));
                assert!(yes);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn clear_cache_skips_preflight() {
        let cli = Cli::try_parse_from(["starli", "clear-cache"]).expect("parse");
        let command = cli.command.expect("command");
        assert_eq!(command.preflight(), Preflight::Skip);
        assert_eq!(Command::Update.preflight(), Preflight::EnsurePresent);
        assert_eq!(Command::List.preflight(), Preflight::EnsureFresh);
    }

    #[tokio::test]
    async fn missing_cache_is_installed_before_the_command() {
        let fixture = CacheFixture::new();
        let store = Arc::new(FakeStore::new("abc123", react_archive()));
        let sync = synchronizer(&fixture, &store);

        preflight(&sync, Preflight::EnsureFresh).await.expect("preflight");

        assert!(sync.exists().expect("exists"));
        assert_eq!(store.download_calls(), 1);
        assert_eq!(fixture.marker().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn failed_install_aborts_the_command() {
        let fixture = CacheFixture::new();
        let store = Arc::new(FakeStore::new("abc123", react_archive()));
        store.fail_download(true);
        let sync = synchronizer(&fixture, &store);

        let error = preflight(&sync, Preflight::EnsurePresent)
            .await
            .expect_err("preflight should fail");

        assert!(matches!(error, Error::RemoteDownloadFailed { .. }));
        assert!(!sync.exists().expect("exists"));
    }

    #[tokio::test]
    async fn background_refresh_failure_does_not_fail_the_command() {
        let fixture = CacheFixture::new()
            .with_template("react", &descriptor_json("React"))
            .with_marker("old");
        let store = Arc::new(FakeStore::new("new", react_archive()));
        store.fail_metadata(true);
        let sync = synchronizer(&fixture, &store);

        preflight(&sync, Preflight::EnsureFresh).await.expect("preflight");
        for _ in 0..10 {
            if store.metadata_calls() > 0 {
                break;
            }
            task::yield_now().await;
        }

        assert_eq!(store.metadata_calls(), 1);
        assert_eq!(store.download_calls(), 0);
        assert_eq!(fixture.marker().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn present_cache_is_not_reinstalled() {
        let fixture = CacheFixture::new()
            .with_template("react", &descriptor_json("React"))
            .with_marker("abc123");
        let store = Arc::new(FakeStore::new("abc123", react_archive()));
        let sync = synchronizer(&fixture, &store);

        preflight(&sync, Preflight::EnsurePresent).await.expect("preflight");

        assert_eq!(store.metadata_calls(), 0);
        assert_eq!(store.download_calls(), 0);
    }

    #[tokio::test]
    async fn skipped_preflight_leaves_the_remote_alone() {
        let fixture = CacheFixture::new();
        let store = Arc::new(FakeStore::new("abc123", react_archive()));
        let sync = synchronizer(&fixture, &store);

        preflight(&sync, Preflight::Skip).await.expect("preflight");

        assert_eq!(store.metadata_calls(), 0);
        assert_eq!(store.download_calls(), 0);
        assert!(!fixture.paths().root().exists());
    }
}
