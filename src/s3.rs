use aws_types::region::Region;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};

use crate::cli;

mod uri;

pub use uri::Uri;

pub const INDEX_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const INDEX_CONTENT_LANGUAGE: &str = "en";

pub struct Client {
    client: aws_sdk_s3::Client,
}

#[cfg(test)]
impl Client {
    pub fn from_sdk(client: aws_sdk_s3::Client) -> Client {
        Client { client }
    }
}

#[derive(Debug, Default)]
pub struct ConnectOptions {
    pub region: Option<String>,
    /// Custom endpoint for other S3 implementations, switches to path-style addressing
    pub endpoint: Option<http::Uri>,
    pub profile: Option<String>,
}

pub async fn init(options: ConnectOptions) -> Client {
    let provided_region = options.region.map(Region::new);
    let region_provider = RegionProviderChain::first_try(provided_region)
        .or_default_provider()
        .or_else("eu-west-1");
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
    if let Some(profile) = &options.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(endpoint) = &options.endpoint {
        loader = loader.endpoint_url(endpoint.to_string().trim_end_matches('/'));
    }
    let config = loader.load().await;

    let mut s3_config = aws_sdk_s3::config::Builder::from(&config);
    if options.endpoint.is_some() {
        s3_config = s3_config.force_path_style(true);
    }
    Client {
        client: aws_sdk_s3::Client::from_conf(s3_config.build()),
    }
}

#[derive (thiserror::Error, Debug)]
pub enum Error {
    #[error("listing {uri}: {source}")]
    List {
        uri: Uri,
        source: aws_sdk_s3::Error,
    },
    #[error("uploading {uri}: {source}")]
    Put {
        uri: Uri,
        source: aws_sdk_s3::Error,
    },
}

/// The fields of a listed object the index needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectSummary {
    fn from_object(object: aws_sdk_s3::types::Object) -> Option<ObjectSummary> {
        let key = object.key?;
        Some(ObjectSummary {
            key,
            size: object.size.unwrap_or(0).max(0) as u64,
            last_modified: object.last_modified.as_ref().and_then(to_chrono),
        })
    }
}

pub fn to_chrono(time: &aws_smithy_types::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListTotals {
    pub pages: usize,
    pub objects: usize,
}

impl Client {
    /// Pages through every object under `uri.key`, handing each page to
    /// `on_page` before requesting the next. The first failed request ends
    /// the listing.
    pub async fn list_objects(&self, uri: &Uri, update_fn: cli::ProgressFn, mut on_page: impl FnMut(&[ObjectSummary])) -> Result<ListTotals, Error> {
        let mut totals = ListTotals::default();
        let mut continuation_token: Option<String> = None;

        update_fn(cli::Update::State("listing"));
        loop {
            let mut request = self.client.list_objects_v2()
                .bucket(&uri.bucket)
                .prefix(&uri.key);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::List { uri: uri.clone(), source: e.into() })?;

            let page: Vec<ObjectSummary> = response.contents
                .unwrap_or_default()
                .into_iter()
                .filter_map(ObjectSummary::from_object)
                .collect();
            totals.pages += 1;
            totals.objects += page.len();
            tracing::debug!(page = totals.pages, objects = page.len(), "listed {uri}");
            update_fn(cli::Update::Listed { pages: totals.pages, objects: totals.objects });
            on_page(&page);

            match (response.is_truncated, response.next_continuation_token) {
                (Some(true), Some(token)) => continuation_token = Some(token),
                _ => break,
            }
        }
        Ok(totals)
    }

    pub async fn put_index(&self, uri: &Uri, html: String) -> Result<(), Error> {
        let length = html.len() as i64;
        tracing::debug!(bytes = length, "uploading {uri}");
        self.client.put_object()
            .bucket(&uri.bucket)
            .key(&uri.key)
            .body(ByteStream::from(html.into_bytes()))
            .content_type(INDEX_CONTENT_TYPE)
            .content_language(INDEX_CONTENT_LANGUAGE)
            .content_length(length)
            .send()
            .await
            .map_err(|e| Error::Put { uri: uri.clone(), source: e.into() })?;
        Ok(())
    }
}

#[test]
fn test_object_summary() {
    let object = aws_sdk_s3::types::Object::builder()
        .key("docs/a.txt")
        .size(1536)
        .last_modified(aws_smithy_types::DateTime::from_secs(1_700_000_000))
        .build();
    let summary = ObjectSummary::from_object(object).expect("has key");
    assert_eq!(summary.key, "docs/a.txt");
    assert_eq!(summary.size, 1536);
    assert_eq!(summary.last_modified, DateTime::from_timestamp(1_700_000_000, 0));
}

#[test]
fn test_object_without_key_skipped() {
    let object = aws_sdk_s3::types::Object::builder().size(3).build();
    assert!(ObjectSummary::from_object(object).is_none());
}

#[test]
fn test_missing_size_is_zero() {
    let object = aws_sdk_s3::types::Object::builder().key("k").build();
    let summary = ObjectSummary::from_object(object).expect("has key");
    assert_eq!(summary.size, 0);
    assert!(summary.last_modified.is_none());
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::list_objects_v2::{ListObjectsV2Error, ListObjectsV2Output};
    use aws_sdk_s3::operation::put_object::{PutObjectError, PutObjectOutput};
    use aws_sdk_s3::types::Object;
    use aws_smithy_mocks::{mock, mock_client, RuleMode};

    use super::*;

    fn quiet_progress() -> cli::ProgressFn {
        cli::Output::new(&cli::ArgProgress::off()).add("listing", "test".to_owned())
    }

    fn page(keys: &[&str]) -> aws_sdk_s3::operation::list_objects_v2::builders::ListObjectsV2OutputBuilder {
        keys.iter().fold(ListObjectsV2Output::builder(), |builder, key| {
            builder.contents(Object::builder().key(*key).size(1).build())
        })
    }

    #[tokio::test]
    async fn test_follows_continuation_tokens() {
        let first = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.bucket() == Some("site") && req.prefix() == Some("docs/") && req.continuation_token().is_none())
            .then_output(|| page(&["docs/a.txt", "docs/b.txt"]).is_truncated(true).next_continuation_token("page-2").build());
        let second = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.continuation_token() == Some("page-2"))
            .then_output(|| page(&["docs/c.txt"]).is_truncated(false).build());
        let client = Client::from_sdk(mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&first, &second]));

        let mut pages: Vec<Vec<String>> = vec![];
        let totals = client.list_objects(&Uri::new("site", "docs/"), quiet_progress(), |objects| {
            pages.push(objects.iter().map(|o| o.key.clone()).collect());
        }).await.expect("listing succeeds");

        assert_eq!(pages, vec![vec!["docs/a.txt", "docs/b.txt"], vec!["docs/c.txt"]]);
        assert_eq!(totals, ListTotals { pages: 2, objects: 3 });
        assert_eq!(first.num_calls(), 1);
        assert_eq!(second.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_truncated_without_token_stops() {
        let only = mock!(aws_sdk_s3::Client::list_objects_v2)
            .then_output(|| page(&["a"]).is_truncated(true).build());
        let client = Client::from_sdk(mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&only]));

        let totals = client.list_objects(&Uri::new("site", ""), quiet_progress(), |_| {})
            .await
            .expect("listing succeeds");
        assert_eq!(totals.pages, 1);
        assert_eq!(only.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_page_ends_listing() {
        let first = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.continuation_token().is_none())
            .then_output(|| page(&["a"]).is_truncated(true).next_continuation_token("page-2").build());
        let second = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.continuation_token() == Some("page-2"))
            .then_error(|| ListObjectsV2Error::generic(ErrorMetadata::builder().code("AccessDenied").build()));
        let client = Client::from_sdk(mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&first, &second]));

        let mut seen = 0;
        let result = client.list_objects(&Uri::new("site", ""), quiet_progress(), |objects| seen += objects.len()).await;

        match result {
            Err(Error::List { uri, .. }) => assert_eq!(uri, Uri::new("site", "")),
            other => panic!("expected a list error, got {other:?}"),
        }
        assert_eq!(seen, 1);
        assert_eq!(second.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_put_index_request() {
        let put = mock!(aws_sdk_s3::Client::put_object)
            .match_requests(|req| {
                req.bucket() == Some("site")
                    && req.key() == Some("docs/index.html")
                    && req.content_type() == Some("text/html; charset=utf-8")
                    && req.content_language() == Some("en")
                    && req.content_length() == Some(13)
                    && req.body().bytes() == Some(b"<p>hello</p>\n".as_slice())
            })
            .then_output(|| PutObjectOutput::builder().build());
        let client = Client::from_sdk(mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&put]));

        client.put_index(&Uri::new("site", "docs/index.html"), "<p>hello</p>\n".to_owned())
            .await
            .expect("upload matches");
        assert_eq!(put.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_put_error_not_retried() {
        let put = mock!(aws_sdk_s3::Client::put_object)
            .then_error(|| PutObjectError::generic(ErrorMetadata::builder().code("AccessDenied").build()));
        let client = Client::from_sdk(mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&put]));

        let result = client.put_index(&Uri::new("site", "index.html"), "<html></html>".to_owned()).await;
        assert!(matches!(result, Err(Error::Put { .. })));
        assert_eq!(put.num_calls(), 1);
    }
}
