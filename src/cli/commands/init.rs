use super::stack_manager;
use crate::cli::output::Output;
use crate::errors::Result;

/// Initialize a patch stack on the current branch
pub async fn run() -> Result<()> {
    let manager = stack_manager()?;
    let branch = manager.git_repo().get_current_branch()?;
    tracing::debug!("Initializing stack on '{}'", branch);

    manager.init(&branch)?;

    Output::success(format!("Initialized patch stack on \"{}\"", branch));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StackError;
    use crate::stack::StackManager;
    use crate::test_support::create_test_repo;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    #[tokio::test]
    #[serial]
    async fn test_init_in_git_repo() {
        let (_temp_dir, repo_path) = create_test_repo();

        let original_dir = env::current_dir().unwrap();
        env::set_current_dir(&repo_path).unwrap();
        let result = run().await;
        let again = run().await;
        env::set_current_dir(original_dir).unwrap();

        assert!(result.is_ok());
        assert!(matches!(again, Err(StackError::AlreadyInitialized(_))));
        assert!(StackManager::new(&repo_path)
            .unwrap()
            .exists("master")
            .unwrap());
    }

    #[tokio::test]
    #[serial]
    async fn test_init_outside_git_repo() {
        let temp_dir = TempDir::new().unwrap();

        let original_dir = env::current_dir().unwrap();
        env::set_current_dir(temp_dir.path()).unwrap();
        let result = run().await;
        env::set_current_dir(original_dir).unwrap();

        assert!(matches!(result, Err(StackError::Config(_))));
    }
}
