//! Command execution.

use crate::cli::{ArtworkArgs, Cli, Command, ImportArgs, OutputFormat};
use crate::error::{CliError, CliResult};
use crate::render::{write_statuses, write_summary, JsonReport};
use std::io::Write;
use std::sync::Arc;
use streamstats_config::{Config, ConfigCache, ConfigLoader};
use streamstats_engine::{
    Aggregator, ArtworkCache, ArtworkCacheConfig, ArtworkQuery, CatalogSearch, DiskFile,
    FileSource, FilteredView, ImportBatch, ImportOptions, SessionStore, SpotifyClient,
};
use streamstats_i18n::Localizer;
use tokio_util::sync::CancellationToken;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Waits for the progress logger to drain. Its failure never fails the
/// import, but it is logged.
async fn finish_progress_log(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "Progress logger stopped abnormally");
            false
        }
    }
}

/// Everything a command needs: configuration, messages and session state.
pub struct App {
    config: ConfigCache,
    localizer: Localizer,
    store: Arc<SessionStore>,
    cancel: CancellationToken,
}

impl App {
    /// Builds the application from an already loaded configuration and the
    /// global flags.
    pub fn new(config: Config, cli: &Cli, cancel: CancellationToken) -> CliResult<Self> {
        let cache = ConfigCache::new(config);
        cache.modify(|config| {
            if let Some(locale) = &cli.locale {
                config.locale.clone_from(locale);
            }
            if let Some(timezone) = &cli.timezone {
                config.aggregation.timezone.clone_from(timezone);
            }
            if let Some(level) = &cli.log_level {
                config.logging.level.clone_from(level);
            }
            if let Command::Import(args) = &cli.command {
                if let Some(parallelism) = args.parallelism {
                    config.import.parallelism = parallelism;
                }
                if let Some(top) = args.top {
                    config.aggregation.top_limit = top;
                }
            }
        })?;

        let localizer = Localizer::new(&cache.get().locale)?;
        Ok(Self {
            config: cache,
            localizer,
            store: Arc::new(SessionStore::new()),
            cancel,
        })
    }

    /// Loads the configuration named by `--config` (or found by the usual
    /// resolution) and builds the application.
    pub fn load(cli: &Cli, cancel: CancellationToken) -> CliResult<Self> {
        let config = ConfigLoader::load(cli.config.as_deref())?;
        Self::new(config, cli, cancel)
    }

    /// Effective configuration.
    pub fn config(&self) -> Arc<Config> {
        self.config.get()
    }

    /// Session state shared by the commands.
    pub fn store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.store)
    }

    /// Runs the parsed command.
    pub async fn run<W: Write>(&self, command: &Command, out: &mut W) -> CliResult<()> {
        match command {
            Command::Import(args) => self.import(args, out).await,
            Command::Artwork(args) => {
                let search = SpotifyClient::from_config(&self.config().spotify)?;
                self.artwork(args, Arc::new(search), out).await
            }
            Command::Config => self.show_config(out),
        }
    }

    /// Imports the files, commits the result to the session store and prints
    /// the full or filtered summary.
    #[instrument(skip_all, fields(files = args.files.len()))]
    pub async fn import<W: Write>(&self, args: &ImportArgs, out: &mut W) -> CliResult<()> {
        let config = self.config();
        let aggregator = Aggregator::from_config(&config.aggregation, &self.localizer)?;
        let (mut batch, mut progress) =
            ImportBatch::new(ImportOptions::from_config(&config.import), aggregator.clone())
                .with_progress_reporting();

        let mut sources: Vec<Arc<dyn FileSource>> = Vec::with_capacity(args.files.len());
        for path in &args.files {
            sources.push(Arc::new(DiskFile::open(path).await));
        }
        batch.add_files(sources)?;

        let progress_log = tokio::spawn(async move {
            while let Some(update) = progress.recv().await {
                debug!(
                    index = update.index,
                    file = %update.file_name,
                    status = update.status.message_id(),
                    "File status changed"
                );
            }
        });

        let report = batch.run(&self.cancel).await;

        let Some(summary) = report.summary else {
            if args.format == OutputFormat::Text {
                write_statuses(out, batch.entries(), &self.localizer)?;
            }
            drop(batch);
            finish_progress_log(progress_log).await;
            return Err(CliError::NoData);
        };
        let revision = self.store.set_imported_data(summary, report.events);
        info!(revision, succeeded = report.succeeded, failed = report.failed, "Import committed");

        let dataset = self.store.working_dataset();
        let filter = args.filter();
        let view = FilteredView::compute(&dataset, &filter, &aggregator);

        match args.format {
            OutputFormat::Text => {
                write_statuses(out, batch.entries(), &self.localizer)?;
                writeln!(out)?;
                if filter.is_active() {
                    writeln!(
                        out,
                        "{}\n",
                        self.localizer.filter_matching(view.matching(), view.total_available)
                    )?;
                }
                if view.summary.is_empty() {
                    writeln!(out, "{}", self.localizer.format("import-no-data", None))?;
                } else {
                    write_summary(out, &view.summary, &self.localizer)?;
                }
            }
            OutputFormat::Json => {
                let report = JsonReport::new(batch.entries(), &view, &filter);
                serde_json::to_writer_pretty(&mut *out, &report)?;
                writeln!(out)?;
            }
        }

        drop(batch);
        finish_progress_log(progress_log).await;
        Ok(())
    }

    /// Resolves and prints the image of an artist or a track.
    pub async fn artwork<W: Write>(
        &self,
        args: &ArtworkArgs,
        search: Arc<dyn CatalogSearch>,
        out: &mut W,
    ) -> CliResult<()> {
        let config = self.config();
        let cache = ArtworkCache::new(
            ArtworkCacheConfig::from_config(&config.artwork, &config.spotify),
            search,
        );
        let query = match &args.track {
            Some(track) => ArtworkQuery::track(track, &args.artist),
            None => ArtworkQuery::artist(&args.artist),
        };

        match cache.lookup(&query, &self.cancel).await {
            Some(url) => writeln!(out, "{}", self.localizer.artwork_found(&url))?,
            None => writeln!(out, "{}", self.localizer.format("artwork-none", None))?,
        }
        debug!(stats = ?cache.stats().await, "Artwork cache statistics");
        Ok(())
    }

    /// Prints the effective configuration as YAML, without the access token.
    pub fn show_config<W: Write>(&self, out: &mut W) -> CliResult<()> {
        let mut config = Config::clone(&self.config());
        if config.spotify.access_token.is_some() {
            config.spotify.access_token = Some("***".to_string());
        }
        out.write_all(serde_yaml::to_string(&config)?.as_bytes())?;
        Ok(())
    }
}
