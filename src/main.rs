mod arguments;
mod cli;
mod config;
mod indexer;
mod listing;
mod render;
mod s3;
mod shared_options;
mod size;

use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() -> arguments::MainResult {
    let args = arguments::Arguments::parse();
    args.shared.init_logging();
    args.run().await
}
