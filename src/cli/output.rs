use console::style;
use std::fmt::Display;

/// Status messages for the user.
///
/// Everything goes to stderr so that query output (`series`, `branch`,
/// `top`) on stdout stays machine-readable.
pub struct Output;

impl Output {
    /// Print a success message with checkmark
    pub fn success<T: Display>(message: T) {
        eprintln!("{} {}", style("✓").green(), message);
    }

    /// Print an error message with X mark
    pub fn error<T: Display>(message: T) {
        eprintln!("{} {}", style("error:").red().bold(), message);
    }

    pub fn warning<T: Display>(message: T) {
        eprintln!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info<T: Display>(message: T) {
        eprintln!("{} {}", style("ℹ").cyan(), message);
    }

    /// Print a sub-item with arrow prefix
    pub fn sub_item<T: Display>(message: T) {
        eprintln!("  {} {}", style("→").dim(), message);
    }

    /// Print a tip/suggestion
    pub fn tip<T: Display>(message: T) {
        eprintln!("{} {}", style("TIP:").cyan(), style(message).dim());
    }

    /// Report where the stack now stands
    pub fn now_at(top: Option<&str>) {
        match top {
            Some(name) => Self::info(format!("Now at patch \"{}\"", style(name).bold())),
            None => Self::info("No patches applied"),
        }
    }
}
