mod config_cmd;
mod output;
mod pipeline_cmd;
mod sessions_cmd;
mod watch_cmd;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pipeline_ui_api_client::{ApiClient, LiveOptions};
use pipeline_ui_core::{PipelineStatus, PipelineUiConfig};
use pipeline_ui_runtime_config::Settings;
use std::path::PathBuf;
use tokio::runtime::Runtime;

use config_cmd::ConfigArgs;
use output::OutputFormat;
use pipeline_cmd::StartArgs;
use sessions_cmd::{ListArgs, ShowArgs};
use watch_cmd::WatchEnd;

#[derive(Parser)]
#[command(
    name = "pipeline-ui",
    version,
    about = "Browse, start and approve agent pipeline runs"
)]
struct Cli {
    /// Backend base URL; overrides the settings file.
    #[arg(long, global = true)]
    server: Option<String>,

    /// Settings file to use instead of ~/.config/pipeline-ui/pipeline-ui.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive session browser (default)
    #[command(alias = "tui")]
    History {
        /// Follow this pipeline live on startup
        pipeline_id: Option<String>,
    },

    /// List recorded sessions
    Sessions(ListArgs),

    /// Show one session and its event timeline
    Show(ShowArgs),

    /// List pipelines currently running on the server
    Active {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Start a pipeline for a task
    Start(StartArgs),

    /// Stream a running pipeline's events
    Watch {
        pipeline_id: String,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Approve (or reject) a plan waiting on a running pipeline
    Approve {
        pipeline_id: String,

        #[arg(long)]
        reject: bool,

        #[arg(long)]
        feedback: Option<String>,
    },

    /// Resume a stored session waiting for approval
    Resume {
        /// Pick interactively when omitted
        pipeline_id: Option<String>,

        #[arg(long)]
        reject: bool,

        #[arg(long)]
        feedback: Option<String>,

        /// Follow the pipeline after resuming
        #[arg(long)]
        watch: bool,
    },

    /// Delete a session and its events
    Delete {
        pipeline_id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Check that the backend is reachable
    Health {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show or initialize settings
    Config(ConfigArgs),
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::History { pipeline_id: None });
    let global = GlobalArgs {
        server: cli.server,
        config: cli.config,
    };

    match command {
        // The TUI owns its runtime and logs to a file.
        Commands::History { pipeline_id } => pipeline_ui_tui::run(pipeline_ui_tui::RunOptions {
            settings: global.settings()?,
            watch: pipeline_id,
            log_file: None,
        }),
        Commands::Config(args) => {
            init_logging();
            config_cmd::run(args, global.config)
        }
        Commands::Sessions(args) => {
            let backend = Backend::connect(&global)?;
            let page_size = backend.settings.polling.page_size;
            backend
                .rt
                .block_on(sessions_cmd::list(&backend.client, &args, page_size))
        }
        Commands::Show(args) => {
            let backend = Backend::connect(&global)?;
            backend.rt.block_on(sessions_cmd::show(
                &backend.client,
                &args,
                &backend.config,
            ))
        }
        Commands::Active { format } => {
            let backend = Backend::connect(&global)?;
            backend
                .rt
                .block_on(pipeline_cmd::active(&backend.client, format))
        }
        Commands::Start(args) => {
            let backend = Backend::connect(&global)?;
            let pipeline_id = backend
                .rt
                .block_on(pipeline_cmd::start(&backend.client, &args))?;
            if args.watch {
                backend.watch(&pipeline_id, args.format == OutputFormat::Json)?;
            }
            Ok(())
        }
        Commands::Watch { pipeline_id, json } => {
            Backend::connect(&global)?.watch(&pipeline_id, json)
        }
        Commands::Approve {
            pipeline_id,
            reject,
            feedback,
        } => {
            let backend = Backend::connect(&global)?;
            backend.rt.block_on(pipeline_cmd::approve(
                &backend.client,
                &pipeline_id,
                reject,
                feedback,
            ))
        }
        Commands::Resume {
            pipeline_id,
            reject,
            feedback,
            watch,
        } => {
            let backend = Backend::connect(&global)?;
            let pipeline_id = backend.rt.block_on(pipeline_cmd::resume(
                &backend.client,
                pipeline_id,
                reject,
                feedback,
            ))?;
            if watch && !reject {
                backend.watch(&pipeline_id, false)?;
            }
            Ok(())
        }
        Commands::Delete { pipeline_id, yes } => {
            let backend = Backend::connect(&global)?;
            backend
                .rt
                .block_on(pipeline_cmd::delete(&backend.client, &pipeline_id, yes))
        }
        Commands::Health { format } => {
            let backend = Backend::connect(&global)?;
            backend
                .rt
                .block_on(pipeline_cmd::health(&backend.client, format))
        }
    }
}

struct GlobalArgs {
    server: Option<String>,
    config: Option<PathBuf>,
}

impl GlobalArgs {
    fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => pipeline_ui_runtime_config::load_from(path)?,
            None => pipeline_ui_runtime_config::load().context("load settings")?,
        };
        if let Some(server) = &self.server {
            settings.server.url = config_cmd::normalize_base_url(server)?;
        }
        Ok(settings)
    }
}

/// Everything a backend command needs.
struct Backend {
    settings: Settings,
    config: PipelineUiConfig,
    client: ApiClient,
    rt: Runtime,
}

impl Backend {
    fn connect(global: &GlobalArgs) -> Result<Self> {
        init_logging();
        let settings = global.settings()?;
        let config = settings.to_ui_config();
        let client = ApiClient::new(&config).context("build API client")?;
        let rt = Runtime::new().context("start tokio runtime")?;
        tracing::debug!(server = %config.api_base_url, "backend ready");
        Ok(Self {
            settings,
            config,
            client,
            rt,
        })
    }

    fn watch(&self, pipeline_id: &str, json: bool) -> Result<()> {
        let options = LiveOptions {
            auto_reconnect: self.settings.live.auto_reconnect,
            reconnect_interval: self.settings.live.reconnect_interval(),
        };
        let end = self.rt.block_on(watch_cmd::run(
            self.client.clone(),
            pipeline_id,
            &self.config,
            options,
            json,
        ))?;
        if end == WatchEnd::Finished(PipelineStatus::Failed) {
            bail!("pipeline {pipeline_id} failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::tempdir;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_opens_the_tui() {
        let cli = Cli::try_parse_from(["pipeline-ui"]).expect("parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn global_flags_work_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "pipeline-ui",
            "sessions",
            "--status",
            "waiting-approval",
            "--server",
            "http://ci:3000",
        ])
        .expect("parse");
        assert_eq!(cli.server.as_deref(), Some("http://ci:3000"));
        assert!(matches!(cli.command, Some(Commands::Sessions(_))));
    }

    #[test]
    fn server_flag_overrides_the_settings_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("pipeline-ui.toml");
        std::fs::write(&path, "[server]\nurl = \"http://from-file:3000\"\n").expect("write");

        let global = GlobalArgs {
            server: None,
            config: Some(path.clone()),
        };
        assert_eq!(
            global.settings().expect("settings").server.url,
            "http://from-file:3000"
        );

        let global = GlobalArgs {
            server: Some("https://override.example.com/".into()),
            config: Some(path),
        };
        assert_eq!(
            global.settings().expect("settings").server.url,
            "https://override.example.com"
        );
    }
}
