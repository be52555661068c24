//! Command-line interface for setlist-minder.
//!
//! A single run: discover the videos in a folder, build one playlist per
//! video, print a summary. Flags override values from the config file.

mod args;
mod run;

pub use args::Cli;
pub use run::cmd_run;
