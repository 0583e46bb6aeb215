/// Patch stack error types
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// Git-related errors
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Branch management errors
    #[error("Branch error: {0}")]
    Branch(String),

    /// The branch does not exist
    #[error("Branch \"{0}\" does not exist")]
    NoSuchBranch(String),

    /// The operation needs a stack that the branch does not have
    #[error("{0}: branch not initialized")]
    NotInitialized(String),

    /// `init` on a branch that already carries a stack
    #[error("{0}: branch already initialized")]
    AlreadyInitialized(String),

    /// Cleanup refused because patches remain
    #[error("Cannot clean up: the series still contains patches")]
    NonEmptySeries,

    /// A patch could not be applied cleanly on top of the stack
    #[error("{patch}: patch does not apply cleanly ({})", files.join(", "))]
    ApplyConflict { patch: String, files: Vec<String> },

    /// A patch could not be popped because history diverged from the stack
    #[error("Cannot pop: {0}")]
    PopConflict(String),

    /// Argument shape or count violations
    #[error("{0}")]
    InvalidArguments(String),

    /// Tracked files have uncommitted modifications
    #[error("local changes in the tree; refresh or reset them first")]
    LocalChanges,

    /// Patch lookup failures
    #[error("Unknown patch name: \"{0}\"")]
    UnknownPatch(String),

    /// Patch names must be unique within a stack
    #[error("Patch \"{0}\" already exists")]
    DuplicatePatch(String),

    /// Branch HEAD and stack bookkeeping disagree
    #[error("Stack is inconsistent: {0}")]
    Inconsistent(String),

    /// Validation errors
    #[error("{0}")]
    Validation(String),
}

impl StackError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        StackError::Config(msg.into())
    }

    pub fn branch<S: Into<String>>(msg: S) -> Self {
        StackError::Branch(msg.into())
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        StackError::Validation(msg.into())
    }

    pub fn inconsistent<S: Into<String>>(msg: S) -> Self {
        StackError::Inconsistent(msg.into())
    }

    pub fn not_initialized<S: Into<String>>(branch: S) -> Self {
        StackError::NotInitialized(branch.into())
    }

    /// The canonical argument-count error
    pub fn invalid_arguments() -> Self {
        StackError::InvalidArguments("incorrect number of arguments".to_string())
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            StackError::ApplyConflict { .. } | StackError::PopConflict(_) => 3,
            _ => 1,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.exit_code() == 3
    }
}

pub type Result<T> = std::result::Result<T, StackError>;
