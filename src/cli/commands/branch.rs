use super::branch_manager;
use crate::cli::output::Output;
use crate::errors::{Result, StackError};
use crate::stack::BranchManager;
use clap::Args;

#[derive(Debug, Args)]
pub struct BranchArgs {
    #[command(flatten)]
    pub action: BranchAction,

    /// Force cleanup or deletion even if the stack still has patches
    #[arg(long, short)]
    pub force: bool,

    /// Branch names and other arguments of the selected action
    pub args: Vec<String>,
}

/// What to do; at most one may be given, switching is the default
#[derive(Debug, Clone, Copy, Default, Args)]
#[group(multiple = false)]
pub struct BranchAction {
    /// Create and switch to a new branch: <name> [committish]
    #[arg(long, short)]
    pub create: bool,

    /// Clone the current branch with its stack: [name]
    #[arg(long)]
    pub clone: bool,

    /// Remove the stack of a branch: [branch]
    #[arg(long)]
    pub cleanup: bool,

    /// List branches
    #[arg(long, short)]
    pub list: bool,

    /// Delete a branch and its stack: <branch>
    #[arg(long)]
    pub delete: bool,

    /// Rename a branch: [old] <new>
    #[arg(long, short)]
    pub rename: bool,
}

pub async fn run(args: BranchArgs) -> Result<()> {
    let manager = branch_manager()?;
    execute(&manager, args)
}

fn execute(manager: &BranchManager, args: BranchArgs) -> Result<()> {
    let BranchArgs {
        action,
        force,
        args,
    } = args;

    if force && !(action.cleanup || action.delete) {
        return Err(StackError::validation(
            "--force only applies to --cleanup and --delete",
        ));
    }

    if action.create {
        let (name, committish) = match args.as_slice() {
            [name] => (name, None),
            [name, committish] => (name, Some(committish.as_str())),
            _ => return Err(StackError::invalid_arguments()),
        };
        manager.create(name, committish)?;
        Output::success(format!("Created and switched to branch \"{}\"", name));
    } else if action.clone {
        let new_name = match args.as_slice() {
            [] => None,
            [name] => Some(name.as_str()),
            _ => return Err(StackError::invalid_arguments()),
        };
        let clone = manager.clone_current(new_name)?;
        Output::success(format!("Cloned to and switched to branch \"{}\"", clone));
    } else if action.cleanup {
        let branch = manager.cleanup(&args, force)?;
        Output::success(format!("Cleaned up stack of \"{}\"", branch));
    } else if action.list {
        if !args.is_empty() {
            return Err(StackError::invalid_arguments());
        }
        for branch in manager.list()? {
            println!("{}", branch.list_line());
        }
    } else if action.delete {
        let [name] = args.as_slice() else {
            return Err(StackError::invalid_arguments());
        };
        manager.delete(name, force)?;
        Output::success(format!("Deleted branch \"{}\"", name));
    } else if action.rename {
        let (old, new) = manager.rename(&args)?;
        Output::success(format!("Renamed branch \"{}\" to \"{}\"", old, new));
    } else {
        match args.as_slice() {
            [] => println!("{}", manager.current()?),
            [name] => {
                manager.switch(name)?;
                Output::success(format!("Switched to branch \"{}\"", name));
            }
            _ => return Err(StackError::invalid_arguments()),
        }
    }

    Ok(())
}
