pub mod commands;
pub mod output;

use crate::errors::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::branch::BranchArgs;
use commands::series::SeriesArgs;
use commands::CountArgs;

#[derive(Parser)]
#[command(name = "pstack")]
#[command(about = "Manage stacks of patches on top of git branches")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a patch stack on the current branch
    Init,

    /// Branch operations: switch, create, clone, clean up, list, delete, rename
    Branch(BranchArgs),

    /// Create a new, empty patch on top of the stack
    New {
        /// Patch name (generated from the message when omitted)
        name: Option<String>,

        /// Patch message
        #[arg(long, short)]
        message: Option<String>,
    },

    /// Record working tree changes in the topmost patch
    Refresh,

    /// Apply unapplied patches onto the stack
    Push(CountArgs),

    /// Unapply patches from the top of the stack
    Pop(CountArgs),

    /// Permanently store the bottommost applied patches in branch history
    Commit(CountArgs),

    /// Print the patch series
    Series(SeriesArgs),

    /// Print the name of the topmost applied patch
    Top {
        /// Use this branch instead of the current one
        #[arg(long, short)]
        branch: Option<String>,
    },

    /// Delete patches from the stack
    Delete {
        /// Patches to delete
        #[arg(required = true)]
        patches: Vec<String>,

        /// Use this branch instead of the current one
        #[arg(long, short)]
        branch: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        self.setup_logging();

        match self.command {
            Commands::Init => commands::init::run().await,
            Commands::Branch(args) => commands::branch::run(args).await,
            Commands::New { name, message } => commands::new::run(name, message).await,
            Commands::Refresh => commands::refresh::run().await,
            Commands::Push(count) => commands::push::run(count).await,
            Commands::Pop(count) => commands::pop::run(count).await,
            Commands::Commit(count) => commands::commit::run(count).await,
            Commands::Series(args) => commands::series::run(args).await,
            Commands::Top { branch } => commands::series::top(branch).await,
            Commands::Delete { patches, branch } => {
                commands::delete::run(patches, branch).await
            }
            Commands::Completions { shell } => commands::completions::generate_completions(shell),
        }
    }

    fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        };

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time();

        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
            subscriber.with_ansi(false).init();
        } else {
            subscriber.init();
        }
    }
}
