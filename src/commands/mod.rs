pub mod info;
pub mod merge;
pub mod pages;
pub mod split;

use crate::file_utils::output_file_name;
use crate::validation::MAX_FILE_SIZE;
use std::io::Write;
use std::path::PathBuf;

/// Settings shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub max_file_size: u64,
    pub quiet: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_file_size: MAX_FILE_SIZE,
            quiet: false,
        }
    }
}

/// Prints "<label>... NN%" on one stderr line, or nothing when quiet.
fn progress_printer(label: &'static str, quiet: bool) -> impl FnMut(u8) + Send {
    move |percent| {
        if quiet {
            return;
        }
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\r{}... {:>3}%", label, percent);
        if percent == 100 {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}

fn output_path(output: Option<&str>, default_stem: &str) -> PathBuf {
    PathBuf::from(output_file_name(output.unwrap_or_default(), default_stem))
}
