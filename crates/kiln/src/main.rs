//! Kiln CLI - static site asset builds, watch mode and live reload.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kiln_pipeline::{BuildMode, Pipeline, TaskName};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

use config::KilnConfig;

/// Environment variable selecting the build mode.
const MODE_ENV: &str = "KILN_ENV";

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Static site asset build pipeline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to kiln.toml config file
    #[arg(short, long, default_value = "kiln.toml", global = true)]
    config: PathBuf,

    /// Build mode, overrides KILN_ENV
    #[arg(short, long, global = true)]
    mode: Option<BuildMode>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Build everything, then watch and serve with live reload
    #[command(alias = "default")]
    Dev,

    /// Clean the output and build every task
    Build,

    /// Rebuild tasks as their sources change
    Watch,

    /// Serve the output with live reload
    Serve,

    /// Run a single task by name
    Run {
        /// Task name, e.g. styles or svgSymbols
        task: TaskName,
    },

    /// Scaffold a source tree in the current directory
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Render pages into HTML
    Views,

    /// Compile the stylesheet
    Styles,

    /// Bundle the scripts
    Scripts,

    /// Copy fonts
    Fonts,

    /// Copy (and in production, compress) images
    Images,

    /// Pack sprite images and write the style fragment
    Sprite,

    /// Combine SVG icons into a symbol document
    #[command(name = "svgSymbols", alias = "svg-symbols")]
    SvgSymbols,

    /// Copy misc assets to the output root
    Misc,

    /// Copy JSON fixtures
    Db,

    /// Remove the output directory
    Clean,
}

impl Commands {
    /// The task a per-task subcommand stands for.
    fn task(&self) -> Option<TaskName> {
        match self {
            Commands::Run { task } => Some(*task),
            Commands::Views => Some(TaskName::Views),
            Commands::Styles => Some(TaskName::Styles),
            Commands::Scripts => Some(TaskName::Scripts),
            Commands::Fonts => Some(TaskName::Fonts),
            Commands::Images => Some(TaskName::Images),
            Commands::Sprite => Some(TaskName::Sprite),
            Commands::SvgSymbols => Some(TaskName::SvgSymbols),
            Commands::Misc => Some(TaskName::Misc),
            Commands::Db => Some(TaskName::Db),
            Commands::Clean => Some(TaskName::Clean),
            Commands::Dev
            | Commands::Build
            | Commands::Watch
            | Commands::Serve
            | Commands::Init { .. } => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let mode = cli.mode.unwrap_or_else(|| {
        BuildMode::from_env_value(std::env::var(MODE_ENV).ok().as_deref())
    });
    let command = cli.command.unwrap_or(Commands::Dev);

    if let Commands::Init { yes } = command {
        return commands::init::run(&std::env::current_dir()?, yes).await;
    }

    let config = KilnConfig::load(&cli.config)?;
    let pipeline = Arc::new(Pipeline::new(config.build_config(&cli.config, mode)));
    tracing::debug!("Build mode: {}", mode);

    if let Some(task) = command.task() {
        return commands::run::run(&pipeline, task).await;
    }

    let server = config.server_config(&pipeline.config().output_dir);
    match command {
        Commands::Build => commands::build::run(&pipeline).await?,
        Commands::Watch => commands::watch::run(pipeline).await?,
        Commands::Serve => commands::serve::run(server).await?,
        _ => commands::dev::run(pipeline, server).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kiln").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_command_means_dev() {
        assert_eq!(parse(&[]).command, None);
        assert_eq!(parse(&["default"]).command, Some(Commands::Dev));
    }

    #[test]
    fn parses_global_flags_after_the_command() {
        let cli = parse(&["build", "--mode", "production", "-v", "-c", "site/kiln.toml"]);

        assert_eq!(cli.command, Some(Commands::Build));
        assert_eq!(cli.mode, Some(BuildMode::Production));
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("site/kiln.toml"));
    }

    #[test]
    fn task_subcommands_name_their_task() {
        assert_eq!(parse(&["styles"]).command.unwrap().task(), Some(TaskName::Styles));
        assert_eq!(
            parse(&["svgSymbols"]).command.unwrap().task(),
            Some(TaskName::SvgSymbols)
        );
        assert_eq!(
            parse(&["run", "svg-symbols"]).command.unwrap().task(),
            Some(TaskName::SvgSymbols)
        );
        assert_eq!(parse(&["watch"]).command.unwrap().task(), None);
    }

    #[test]
    fn rejects_unknown_task_and_mode() {
        assert!(Cli::try_parse_from(["kiln", "run", "lint"]).is_err());
        assert!(Cli::try_parse_from(["kiln", "--mode", "fast", "build"]).is_err());
    }
}
