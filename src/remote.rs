//! Anonymous access to the specs archive in object storage.

use std::result::Result as StdResult;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::{
    config::Config,
    error::{Error, Result},
};

/// User agent sent with storage requests.
const USER_AGENT: &str = concat!("starli/", env!("CARGO_PKG_VERSION"));

/// Read-only view of the single remote object backing the specs cache.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Human-readable location of the object, for messages.
    fn location(&self) -> String;

    /// Fetch the current entity tag of the object.
    async fn etag(&self) -> Result<String>;

    /// Download the full object contents.
    async fn download(&self) -> Result<Vec<u8>>;
}

/// Object metadata returned by the storage JSON API.
#[derive(Debug, Deserialize)]
struct ObjectMetadata {
    /// Entity tag of the current object generation.
    etag: String,
}

/// Google Cloud Storage object accessed without credentials.
#[derive(Debug, Clone)]
pub struct GcsObject {
    /// HTTP client carrying the request deadline.
    client: Client,
    /// Metadata endpoint for the object.
    metadata_url: Url,
    /// Media download endpoint for the object.
    media_url: Url,
    /// `gs://` style location for messages.
    location: String,
}

impl GcsObject {
    /// Build a client for the bucket and object named in the config.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| Error::RemoteClientInitFailed {
                message: error.to_string(),
            })?;

        let metadata_url = object_url(config.storage_url(), config.bucket(), config.object())?;
        let mut media_url = metadata_url.clone();
        media_url.query_pairs_mut().append_pair("alt", "media");

        Ok(Self {
            client,
            metadata_url,
            media_url,
            location: format!("gs://{}/{}", config.bucket(), config.object()),
        })
    }

    /// Issue a GET and require a success status.
    async fn get(&self, url: &Url) -> StdResult<Response, String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|error| error.to_string())?;
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err("object not found".to_string()),
            status => Err(format!("storage returned {status}")),
        }
    }
}

#[async_trait]
impl RemoteStore for GcsObject {
    fn location(&self) -> String {
        self.location.clone()
    }

    async fn etag(&self) -> Result<String> {
        let failed = |message: String| Error::RemoteMetadataFetchFailed {
            url: self.metadata_url.to_string(),
            message,
        };
        let response = self.get(&self.metadata_url).await.map_err(failed)?;
        let metadata: ObjectMetadata = response
            .json()
            .await
            .map_err(|error| failed(error.to_string()))?;
        Ok(metadata.etag)
    }

    async fn download(&self) -> Result<Vec<u8>> {
        let failed = |message: String| Error::RemoteDownloadFailed {
            url: self.media_url.to_string(),
            message,
        };
        let response = self.get(&self.media_url).await.map_err(failed)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|error| failed(error.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Build the JSON API URL for an object, escaping the object name.
fn object_url(base: &Url, bucket: &str, object: &str) -> Result<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|()| Error::RemoteClientInitFailed {
            message: format!("storage URL cannot be a base: {base}"),
        })?
        .pop_if_empty()
        .extend(["storage", "v1", "b", bucket, "o", object]);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    use super::{GcsObject, RemoteStore, object_url};
    use crate::{config::Config, error::Error};

    const OBJECT_PATH: &str = "/storage/v1/b/starli-cli.appspot.com/o/specs.tar";

    fn config_for(server: &MockServer) -> Config {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("starli.yaml");
        fs::write(&path, format!("storage_url: {}\n", server.uri())).expect("write config");
        Config::load_with(&path, true, |_| None).expect("config")
    }

    #[test]
    fn escapes_object_names() {
        let base = url::Url::parse("https://storage.googleapis.com").expect("url");
        let url = object_url(&base, "bucket", "nested/specs.tar").expect("object url");
        assert_eq!(
            url.as_str(),
            "https://storage.googleapis.com/storage/v1/b/bucket/o/nested%2Fspecs.tar"
        );
    }

    #[tokio::test]
    async fn fetches_etag_from_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(OBJECT_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "name": "specs.tar", "etag": "abc123" })),
            )
            .mount(&server)
            .await;

        let object = GcsObject::new(&config_for(&server)).expect("client");
        assert_eq!(object.etag().await.expect("etag"), "abc123");
    }

    #[tokio::test]
    async fn downloads_media() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(OBJECT_PATH))
            .and(query_param("alt", "media"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tar bytes".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let object = GcsObject::new(&config_for(&server)).expect("client");
        assert_eq!(object.download().await.expect("download"), b"tar bytes");
    }

    #[tokio::test]
    async fn maps_missing_object_to_metadata_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(OBJECT_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let object = GcsObject::new(&config_for(&server)).expect("client");
        let error = object.etag().await.expect_err("etag should fail");
        assert!(matches!(error, Error::RemoteMetadataFetchFailed { .. }));
        let error = object.download().await.expect_err("download should fail");
        assert!(matches!(error, Error::RemoteDownloadFailed { .. }));
    }
}
