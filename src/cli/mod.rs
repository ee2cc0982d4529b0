pub mod ascii_preview;
pub mod password;
pub mod shell;

pub use ascii_preview::{AsciiRenderer, clear_screen, check_for_escape};
pub use password::read_password;
pub use shell::{confirm, parse_command, run_enroll_shell, ShellCommand};
