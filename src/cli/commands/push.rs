use super::{stack_manager, CountArgs};
use crate::cli::output::Output;
use crate::errors::{Result, StackError};

/// Apply unapplied patches onto the current branch
pub async fn run(count: CountArgs) -> Result<()> {
    let manager = stack_manager()?;
    let branch = manager.git_repo().get_current_branch()?;

    match manager.push(&branch, count.patch_count()) {
        Ok(pushed) => {
            for name in &pushed {
                Output::sub_item(format!("Pushed \"{}\"", name));
            }
            Output::now_at(manager.top(&branch)?.as_deref());
            Ok(())
        }
        Err(e @ StackError::ApplyConflict { .. }) => {
            Output::warning("Push stopped early; patches pushed before the conflict stay applied");
            Output::now_at(manager.top(&branch)?.as_deref());
            Output::tip("Remove or rework the conflicting patch, then push again");
            Err(e)
        }
        Err(e) => Err(e),
    }
}
