use super::stack_manager;
use crate::cli::output::Output;
use crate::errors::Result;

/// Fold working tree changes into the topmost patch
pub async fn run() -> Result<()> {
    let manager = stack_manager()?;
    let branch = manager.git_repo().get_current_branch()?;

    let changed = manager.refresh(&branch)?;
    let top = manager.top(&branch)?;
    let top = top.as_deref().unwrap_or_default();

    if changed {
        Output::success(format!("Refreshed \"{}\"", top));
    } else {
        Output::info(format!("Patch \"{}\" is already up to date", top));
    }
    Ok(())
}
