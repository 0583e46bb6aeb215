use super::{stack_manager, CountArgs};
use crate::cli::output::Output;
use crate::errors::Result;

/// Unapply patches from the top of the current branch's stack
pub async fn run(count: CountArgs) -> Result<()> {
    let manager = stack_manager()?;
    let branch = manager.git_repo().get_current_branch()?;

    let popped = manager.pop(&branch, count.patch_count())?;
    for name in popped.iter().rev() {
        Output::sub_item(format!("Popped \"{}\"", name));
    }

    Output::now_at(manager.top(&branch)?.as_deref());
    Ok(())
}
