use super::stack_manager;
use crate::cli::output::Output;
use crate::errors::Result;

/// Create a new patch on the current branch
pub async fn run(name: Option<String>, message: Option<String>) -> Result<()> {
    let manager = stack_manager()?;
    let branch = manager.git_repo().get_current_branch()?;

    let patch = manager.new_patch(&branch, name.as_deref(), message.as_deref())?;

    Output::success(format!("Created patch \"{}\"", patch));
    Output::now_at(Some(&patch));
    Ok(())
}
