use super::{stack_manager, target_branch};
use crate::cli::output::Output;
use crate::errors::Result;

/// Delete patches from a stack
pub async fn run(patches: Vec<String>, branch: Option<String>) -> Result<()> {
    let manager = stack_manager()?;
    let branch = target_branch(&manager, branch)?;

    manager.delete_patches(&branch, &patches)?;

    for name in &patches {
        Output::sub_item(format!("Deleted \"{}\"", name));
    }
    Output::now_at(manager.top(&branch)?.as_deref());
    Ok(())
}
