use super::{stack_manager, CountArgs};
use crate::cli::output::Output;
use crate::errors::Result;

/// Permanently store the bottommost applied patches
pub async fn run(count: CountArgs) -> Result<()> {
    let manager = stack_manager()?;
    let branch = manager.git_repo().get_current_branch()?;

    let committed = manager.commit(&branch, count.patch_count())?;
    Output::success(format!(
        "Committed {} patch{}",
        committed.len(),
        if committed.len() == 1 { "" } else { "es" }
    ));
    for name in &committed {
        Output::sub_item(name);
    }
    Ok(())
}
