use crate::arguments::MainResult;
use crate::cli;
use crate::config::IndexConfig;
use crate::listing::{Listing, Partitioner};
use crate::render::{self, Page, Renderer};
use crate::s3;
use crate::shared_options::SharedOptions;

#[derive (thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    S3(#[from] s3::Error),
    #[error(transparent)]
    Render(#[from] render::Error),
}

/// List, partition, render, then print or upload. Stops at the first error.
pub async fn run(config: &IndexConfig, client: &s3::Client, opts: &SharedOptions) -> MainResult {
    let output = cli::Output::new(&opts.progress);
    match index(config, client, &output).await {
        Ok(()) => MainResult::Success,
        Err(e) => {
            output.println_error(format_args!("{e}"));
            MainResult::ErrorOperationFailed
        },
    }
}

async fn index(config: &IndexConfig, client: &s3::Client, output: &cli::Output) -> Result<(), Error> {
    let renderer = Renderer::load(&config.template_path).await?;
    let listing = list(config, client, output).await?;
    let html = render_listing(config, &renderer, &listing)?;

    if !config.upload {
        println!("{html}");
        return Ok(());
    }

    let uri = upload(config, client, html).await?;
    output.println_done(format_args!("uploaded {} to {uri}", uri.filename().unwrap_or("index")));
    Ok(())
}

async fn upload(config: &IndexConfig, client: &s3::Client, html: String) -> Result<s3::Uri, s3::Error> {
    let uri = s3::Uri::new(&config.bucket, config.index_key());
    client.put_index(&uri, html).await?;
    Ok(uri)
}

async fn list(config: &IndexConfig, client: &s3::Client, output: &cli::Output) -> Result<Listing, s3::Error> {
    let uri = s3::Uri::new(&config.bucket, config.list_prefix());
    let update_fn = output.add("starting", uri.to_string());
    let mut partitioner = Partitioner::for_config(config);

    let totals = match client.list_objects(&uri, update_fn.clone(), |page| partitioner.add_page(page)).await {
        Ok(totals) => totals,
        Err(e) => {
            update_fn(cli::Update::Error(e.to_string()));
            return Err(e);
        },
    };
    update_fn(cli::Update::Finished());

    let listing = partitioner.finish();
    tracing::info!(
        pages = totals.pages,
        objects = totals.objects,
        directories = listing.directories.len(),
        files = listing.files.len(),
        recursive = config.recursive,
        "partitioned {uri}"
    );
    if listing.is_empty() {
        tracing::warn!("nothing to index under {uri}");
    }
    Ok(listing)
}

pub fn render_listing(config: &IndexConfig, renderer: &Renderer, listing: &Listing) -> Result<String, render::Error> {
    renderer.render(&Page {
        title: &config.title,
        bucket: &config.bucket,
        prefix: &config.prefix,
        directories: &listing.directories,
        files: &listing.files,
    })
}

#[test]
fn test_empty_listing_page() {
    let renderer = Renderer::from_source("{{ title }}|{{ directories|length }}|{{ files|length }}".to_owned())
        .expect("template parses");
    let config = IndexConfig::new("bucket", "/").with_title(Some("Root".to_owned()));
    let html = render_listing(&config, &renderer, &Listing::default()).expect("renders");
    assert_eq!(html, "Root|0|0");
}

#[test]
fn test_partitioned_listing_page() {
    let renderer = Renderer::from_source(
        "{% for d in directories %}[{{ d.name }}]{% endfor %}{% for f in files %}({{ f.name }} {{ f.size }}){% endfor %}".to_owned()
    ).expect("template parses");
    let config = IndexConfig::new("bucket", "");
    let mut partitioner = Partitioner::for_config(&config);
    partitioner.add_page(&[
        s3::ObjectSummary { key: "a/b.txt".to_owned(), size: 1, last_modified: None },
        s3::ObjectSummary { key: "a/c.txt".to_owned(), size: 1, last_modified: None },
        s3::ObjectSummary { key: "index.html".to_owned(), size: 1, last_modified: None },
        s3::ObjectSummary { key: "d.txt".to_owned(), size: 1_073_741_824, last_modified: None },
    ]);
    let html = render_listing(&config, &renderer, &partitioner.finish()).expect("renders");
    assert!(html.starts_with("[a"));
    assert_eq!(html.matches('[').count(), 1);
    assert!(html.ends_with("](d.txt 1.00 GB)"));
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::list_objects_v2::{ListObjectsV2Error, ListObjectsV2Output};
    use aws_sdk_s3::operation::put_object::PutObjectOutput;
    use aws_sdk_s3::types::Object;
    use aws_smithy_mocks::{mock, mock_client, RuleMode};

    use super::*;

    fn quiet_output() -> cli::Output {
        cli::Output::new(&cli::ArgProgress::off())
    }

    #[tokio::test]
    async fn test_pages_partitioned_together() {
        let first = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.prefix() == Some("docs/") && req.continuation_token().is_none())
            .then_output(|| ListObjectsV2Output::builder()
                .contents(Object::builder().key("docs/a/1.txt").size(1).build())
                .contents(Object::builder().key("docs/readme.md").size(1536).build())
                .is_truncated(true)
                .next_continuation_token("next")
                .build());
        let second = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.continuation_token() == Some("next"))
            .then_output(|| ListObjectsV2Output::builder()
                .contents(Object::builder().key("docs/a/2.txt").size(1).build())
                .contents(Object::builder().key("docs/index.html").size(1).build())
                .build());
        let client = s3::Client::from_sdk(mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&first, &second]));

        let config = IndexConfig::new("site", "docs");
        let listing = list(&config, &client, &quiet_output()).await.expect("listing succeeds");
        let directories: Vec<&str> = listing.directories.iter().map(|e| e.name.as_str()).collect();
        let files: Vec<&str> = listing.files.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(directories, vec!["a/"]);
        assert_eq!(files, vec!["readme.md"]);
    }

    #[tokio::test]
    async fn test_failed_page_yields_no_listing() {
        let first = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.continuation_token().is_none())
            .then_output(|| ListObjectsV2Output::builder()
                .contents(Object::builder().key("a.txt").size(1).build())
                .is_truncated(true)
                .next_continuation_token("next")
                .build());
        let second = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.continuation_token() == Some("next"))
            .then_error(|| ListObjectsV2Error::generic(ErrorMetadata::builder().code("AccessDenied").build()));
        let client = s3::Client::from_sdk(mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&first, &second]));

        let result = list(&IndexConfig::new("site", ""), &client, &quiet_output()).await;
        assert!(matches!(result, Err(s3::Error::List { .. })));
    }

    #[tokio::test]
    async fn test_upload_goes_to_prefix_index() {
        let put = mock!(aws_sdk_s3::Client::put_object)
            .match_requests(|req| req.bucket() == Some("site") && req.key() == Some("docs/v1/index.html"))
            .then_output(|| PutObjectOutput::builder().build());
        let client = s3::Client::from_sdk(mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&put]));

        let config = IndexConfig::new("site", "/docs/v1/").upload(true);
        let uri = upload(&config, &client, "<html></html>".to_owned()).await.expect("upload succeeds");
        assert_eq!(uri, s3::Uri::new("site", "docs/v1/index.html"));
        assert_eq!(put.num_calls(), 1);
    }
}
