use clap::Parser;

use crate::config::{self, IndexConfig};
use crate::shared_options::SharedOptions;
use crate::{indexer, s3};

pub(crate) fn clap3_help_style() -> clap::builder::Styles {
    use clap::builder::styling::AnsiColor;
    clap::builder::Styles::styled()
        .header(AnsiColor::Yellow.on_default())
        .usage(AnsiColor::Green.on_default())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Render an HTML directory index for an S3 prefix
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, styles = clap3_help_style())]
pub(crate) struct Arguments {
    /// The name of the S3 bucket
    #[clap(long)]
    pub bucket: Option<String>,

    /// The path within the bucket to list
    #[clap(long, default_value = "")]
    pub prefix: String,

    /// The title of the index page [default: "Index of /<prefix>"]
    #[clap(long)]
    pub title: Option<String>,

    /// List nested objects as files instead of grouping them into directories
    #[clap(long, short='r')]
    pub recursive: bool,

    /// Upload the page to <prefix>/index.html instead of printing it
    #[clap(long, short='u')]
    pub upload: bool,

    /// Base URL for entry links
    #[clap(long, default_value = "")]
    pub url: String,

    /// Page template
    #[clap(long, short='t', value_parser, value_hint=clap::ValueHint::FilePath, default_value = config::DEFAULT_TEMPLATE)]
    pub template: std::path::PathBuf,

    #[clap(long, short='R')]
    pub region: Option<String>,

    #[clap(long, short='e')]
    /// Use custom endpoint URL for other S3 implementations
    pub endpoint: Option<http::Uri>,

    #[clap(long)]
    /// Override config profile name
    pub profile: Option<String>,

    #[cfg(feature = "gen-completion")]
    /// Print shell completion and exit
    #[clap(long, value_enum, value_name = "SHELL")]
    pub generate_completion: Option<clap_complete::shells::Shell>,

    #[clap(flatten)]
    pub shared: SharedOptions,
}

#[derive(Debug)]
pub enum MainResult {
    Success,
    ErrorArguments,
    ErrorOperationFailed,
}

impl std::process::Termination for MainResult {
    fn report(self) -> std::process::ExitCode {
        match self {
            Self::Success => std::process::ExitCode::SUCCESS,
            Self::ErrorArguments => std::process::ExitCode::from(1),
            Self::ErrorOperationFailed => std::process::ExitCode::from(2),
        }
    }
}

impl Arguments {
    pub fn index_config(&self) -> Result<IndexConfig, (clap::error::ErrorKind, &'static str)> {
        let bucket = match self.bucket.as_deref() {
            Some(bucket) if !bucket.is_empty() => bucket,
            _ => return Err((clap::error::ErrorKind::MissingRequiredArgument, "--bucket <BUCKET> is required")),
        };
        Ok(IndexConfig::new(bucket, &self.prefix)
            .with_title(self.title.clone())
            .with_base_url(&self.url)
            .with_template(self.template.clone())
            .recursive(self.recursive)
            .upload(self.upload))
    }

    pub fn connect_options(&self) -> s3::ConnectOptions {
        s3::ConnectOptions {
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            profile: self.profile.clone(),
        }
    }

    pub(crate) async fn run(&self) -> MainResult {
        #[cfg(feature = "gen-completion")]
        if let Some(shell) = self.generate_completion {
            use clap::CommandFactory;
            clap_complete::generate(shell, &mut Arguments::command(), clap::crate_name!(), &mut std::io::stdout());
            return MainResult::Success;
        }

        let config = match self.index_config() {
            Ok(config) => config,
            Err(val_err) => {
                use clap::CommandFactory;
                let _ = Arguments::command()
                    .error(val_err.0, val_err.1)
                    .print();
                return MainResult::ErrorArguments;
            },
        };
        if self.shared.verbose {
            eprintln!("🏁 index 's3://{}/{}'", config.bucket, config.prefix);
        }

        let client = s3::init(self.connect_options()).await;
        indexer::run(&config, &client, &self.shared).await
    }
}

#[test]
fn test_command_definition() {
    use clap::CommandFactory;
    Arguments::command().debug_assert();
}

#[test]
fn test_missing_bucket_rejected() {
    let args = Arguments::try_parse_from(["s3-indexer", "--prefix", "docs"]).expect("parses");
    let (kind, _) = args.index_config().expect_err("bucket required");
    assert_eq!(kind, clap::error::ErrorKind::MissingRequiredArgument);

    let args = Arguments::try_parse_from(["s3-indexer", "--bucket", ""]).expect("parses");
    assert!(args.index_config().is_err());
}

#[tokio::test]
async fn test_missing_bucket_exits_before_connecting() {
    let args = Arguments::try_parse_from(["s3-indexer", "--upload"]).expect("parses");
    assert!(matches!(args.run().await, MainResult::ErrorArguments));
}

#[test]
fn test_flags_to_config() {
    let args = Arguments::try_parse_from([
        "s3-indexer", "--bucket", "releases", "--prefix", "/nightly/", "--title", "Nightly",
        "--recursive", "--upload", "--url", "https://dl.example.com/", "-t", "page.tmpl",
    ]).expect("parses");
    let config = args.index_config().expect("valid");
    assert_eq!(config.bucket, "releases");
    assert_eq!(config.prefix, "nightly");
    assert_eq!(config.title, "Nightly");
    assert!(config.recursive);
    assert!(config.upload);
    assert_eq!(config.base_url, "https://dl.example.com");
    assert_eq!(config.template_path, std::path::PathBuf::from("page.tmpl"));
    assert_eq!(config.index_key(), "nightly/index.html");
}

#[test]
fn test_defaults() {
    let args = Arguments::try_parse_from(["s3-indexer", "--bucket", "b"]).expect("parses");
    let config = args.index_config().expect("valid");
    assert_eq!(config.prefix, "");
    assert_eq!(config.title, "Index of /");
    assert!(!config.recursive);
    assert!(!config.upload);
    assert_eq!(config.template_path, std::path::PathBuf::from(config::DEFAULT_TEMPLATE));
}

#[test]
fn test_endpoint_parsed() {
    let args = Arguments::try_parse_from(["s3-indexer", "--bucket", "b", "-e", "http://localhost:9000"]).expect("parses");
    let options = args.connect_options();
    let endpoint = options.endpoint.expect("endpoint set");
    assert_eq!(endpoint.host(), Some("localhost"));
    assert_eq!(endpoint.port_u16(), Some(9000));
    assert!(options.region.is_none());
}
