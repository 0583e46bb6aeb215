use super::{stack_manager, target_branch};
use crate::errors::{Result, StackError};
use crate::stack::{SeriesFilter, Stack};
use clap::Args;

#[derive(Debug, Default, Args)]
pub struct SeriesArgs {
    /// Use this branch instead of the current one
    #[arg(long, short)]
    pub branch: Option<String>,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Do not prefix patch names with their state
    #[arg(long)]
    pub noprefix: bool,

    /// Print the number of patches instead of their names
    #[arg(long, short)]
    pub count: bool,

    /// Show the first line of each patch message
    #[arg(long, short)]
    pub description: bool,
}

#[derive(Debug, Clone, Copy, Default, Args)]
#[group(multiple = false)]
pub struct FilterArgs {
    /// Show applied patches only
    #[arg(long, short = 'A')]
    pub applied: bool,

    /// Show unapplied patches only
    #[arg(long, short = 'U')]
    pub unapplied: bool,

    /// Show all patches (default)
    #[arg(long, short = 'a')]
    pub all: bool,
}

impl FilterArgs {
    pub fn series_filter(&self) -> SeriesFilter {
        if self.applied {
            SeriesFilter::Applied
        } else if self.unapplied {
            SeriesFilter::Unapplied
        } else {
            SeriesFilter::All
        }
    }
}

/// Print the patch series of a branch
pub async fn run(args: SeriesArgs) -> Result<()> {
    let manager = stack_manager()?;
    let branch = target_branch(&manager, args.branch.clone())?;
    let stack = manager.load_stack(&branch)?;

    for line in render(&stack, &args) {
        println!("{}", line);
    }
    Ok(())
}

/// Print the topmost applied patch
pub async fn top(branch: Option<String>) -> Result<()> {
    let manager = stack_manager()?;
    let branch = target_branch(&manager, branch)?;

    match manager.top(&branch)? {
        Some(name) => {
            println!("{}", name);
            Ok(())
        }
        None => Err(StackError::validation("No patches applied")),
    }
}

/// Lines of `series` output: `+ ` applied, `> ` top, `- ` unapplied
pub fn render(stack: &Stack, args: &SeriesArgs) -> Vec<String> {
    let patches = stack.series.patches(args.filter.series_filter());
    if args.count {
        return vec![patches.len().to_string()];
    }

    let top = stack.series.top().map(|patch| patch.name.as_str());
    let width = patches.iter().map(|patch| patch.name.len()).max().unwrap_or(0);

    patches
        .into_iter()
        .map(|patch| {
            let prefix = if args.noprefix {
                ""
            } else if Some(patch.name.as_str()) == top {
                "> "
            } else if stack.series.is_applied(&patch.name) {
                "+ "
            } else {
                "- "
            };

            if args.description {
                format!("{}{:<width$} # {}", prefix, patch.name, patch.summary())
            } else {
                format!("{}{}", prefix, patch.name)
            }
        })
        .collect()
}
