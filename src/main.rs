mod action;
mod changes;
mod commands;
mod commits;
mod core;
mod release;
mod review;
mod story;
mod tracker;
mod ui;

use clap::{Parser, Subcommand};
use core::context::WorkflowContext;
use core::error::{FlowError, print_error};

/// Trunk-based release workflows that keep git and the issue tracker in step
#[derive(Parser)]
#[command(name = "trunkflow")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Show debug logs on stderr (RUST_LOG overrides)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Write trunkflow.toml and scaffold the story file
  Init {
    /// Overwrite an existing configuration without asking
    #[arg(short, long)]
    force: bool,
  },

  /// Move releases from trunk through staging to stable
  #[command(subcommand)]
  Release(ReleaseCommands),

  /// Work on individual stories
  #[command(subcommand)]
  Story(StoryCommands),
}

#[derive(Subcommand)]
enum ReleaseCommands {
  /// Cut the release branch from trunk and bump trunk to the next version
  Start,

  /// Promote the release branch to staging, tag it and stage its stories
  Stage,

  /// Point stable at the staged release and mark its stories released
  Deploy,

  /// Cherry-pick stories that landed on trunk onto the release branch
  CherryPick {
    /// Story ids to bring over
    #[arg(required = true)]
    stories: Vec<String>,
    /// Show the plan without changing anything
    #[arg(long)]
    dry_run: bool,
  },
}

#[derive(Subcommand)]
enum StoryCommands {
  /// Create the story branch from trunk and mark the story started
  Start {
    /// Story id
    id: String,
  },

  /// Mark a started story implemented
  Finish {
    /// Story id
    id: String,
  },

  /// List a story's changes and whether the release branch has them
  Changes {
    /// Story ids
    #[arg(required = true)]
    stories: Vec<String>,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  core::logging::init_logging(cli.verbose);

  // init runs before trunkflow.toml exists
  if let Commands::Init { force } = cli.command {
    if let Err(err) = commands::run_init(force) {
      handle_error(err);
    }
    return;
  }

  let repo_root = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => {
      eprintln!("Error: Failed to get current directory: {}", e);
      std::process::exit(1);
    }
  };

  // Build the context once: repository, git handle, configuration
  let ctx = match WorkflowContext::build(&repo_root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let result = match cli.command {
    Commands::Init { .. } => Ok(()),

    Commands::Release(release_cmd) => match release_cmd {
      ReleaseCommands::Start => commands::run_release_start(&ctx),
      ReleaseCommands::Stage => commands::run_release_stage(&ctx),
      ReleaseCommands::Deploy => commands::run_release_deploy(&ctx),
      ReleaseCommands::CherryPick { stories, dry_run } => commands::run_release_cherry_pick(&ctx, stories, dry_run),
    },

    Commands::Story(story_cmd) => match story_cmd {
      StoryCommands::Start { id } => commands::run_story_start(&ctx, id),
      StoryCommands::Finish { id } => commands::run_story_finish(&ctx, id),
      StoryCommands::Changes { stories, json } => commands::run_story_changes(&ctx, stories, json),
    },
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: FlowError) -> ! {
  tracing::debug!(error = ?err, "command failed");
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
