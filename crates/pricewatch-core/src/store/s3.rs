use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::Error;
use crate::store::ObjectStore;

/// S3-compatible store (MinIO deployments set `endpoint_url`). The SDK is
/// async; a small owned current-thread runtime gives the pipeline the same
/// synchronous surface as the local backend.
pub struct S3Store {
    client: Client,
    bucket: String,
    runtime: Runtime,
}

impl S3Store {
    pub fn new(config: &StorageConfig) -> Result<Self, Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Storage(format!("failed to start storage runtime: {e}")))?;

        let credentials = Credentials::new(
            config.key.clone(),
            config.secret.clone(),
            None,
            None,
            "pricewatch_static",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = runtime.block_on(loader.load());
        // MinIO serves buckets on the path, not as subdomains.
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            runtime,
        })
    }

    fn is_not_found(message: &str) -> bool {
        message.contains("NoSuchKey") || message.contains("NotFound")
    }
}

impl ObjectStore for S3Store {
    fn exists(&self, key: &str) -> Result<bool, Error> {
        let result = self.runtime.block_on(
            self.client
                .head_object()
                .bucket(&self.bucket)
                .key(key)
                .send(),
        );
        match result {
            Ok(_) => Ok(true),
            Err(e) if Self::is_not_found(&e.to_string()) => Ok(false),
            Err(e) => Err(Error::Storage(format!("s3 head_object {key}: {e}"))),
        }
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let result = self.runtime.block_on(
            self.client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send(),
        );
        let response = match result {
            Ok(r) => r,
            Err(e) if Self::is_not_found(&e.to_string()) => return Ok(None),
            Err(e) => return Err(Error::Storage(format!("s3 get_object {key}: {e}"))),
        };

        let data = self
            .runtime
            .block_on(response.body.collect())
            .map_err(|e| Error::Storage(format!("s3 collect body for {key}: {e}")))?;
        Ok(Some(data.into_bytes().to_vec()))
    }

    fn put(&self, key: &str, data: &[u8]) -> Result<(), Error> {
        self.runtime
            .block_on(
                self.client
                    .put_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .body(ByteStream::from(data.to_vec()))
                    .send(),
            )
            .map_err(|e| Error::Storage(format!("s3 put_object {key}: {e}")))?;
        debug!("stored s3://{}/{} ({} bytes)", self.bucket, key, data.len());
        Ok(())
    }
}
