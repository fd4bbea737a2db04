use clap::Args;

use crate::cli;

#[derive(Args, Debug)]
pub struct SharedOptions {
    /// Log each listed page and the upload
    #[clap(long, short='v')]
    pub verbose: bool,

    #[clap(flatten)]
    pub progress: cli::ArgProgress,
}

impl SharedOptions {
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }

    /// Logs go to stderr so a printed page on stdout stays clean
    pub fn init_logging(&self) {
        tracing_subscriber::fmt()
            .with_max_level(self.log_level())
            .with_writer(std::io::stderr)
            .init();
    }
}
