//! Client construction and account-level operations.

use std::sync::Arc;

use bucketkit_auth::{CredentialRegistry, Signer};
use bucketkit_xml::{ListAllMyBucketsResult, parse_timestamp};
use tracing::debug;

use crate::bucket::Bucket;
use crate::config::ClientConfig;
use crate::error::S3Error;
use crate::request::Request;
use crate::response::SUCCESS;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{AccountInfo, AccountOwner, BucketSummary};

/// Resolves `bucket/key` paths into [`Bucket`] handles.
pub trait BucketFactory {
    /// Parse `path` as `bucket[/key...]`. Blank segments are dropped.
    fn bucket(&self, path: &str) -> Result<Bucket, S3Error>;
}

/// Builds clients that share one transport and one credential registry.
#[derive(Debug)]
pub struct ClientFactory {
    registry: CredentialRegistry,
    config: Arc<ClientConfig>,
    transport: Arc<dyn HttpTransport>,
}

impl ClientFactory {
    /// Create a factory backed by [`ReqwestTransport`].
    pub fn new(config: ClientConfig) -> Result<Self, S3Error> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a factory over a custom transport.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            registry: CredentialRegistry::new(),
            config: Arc::new(config),
            transport,
        }
    }

    /// The configuration handed to every client.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The credential registry.
    #[must_use]
    pub fn registry(&self) -> &CredentialRegistry {
        &self.registry
    }

    /// A client for a credential pair. Pairs are memoized in the registry.
    pub fn client(&self, access_key: &str, secret_key: &str) -> Result<S3Client, S3Error> {
        let credentials = self.registry.get_or_create(access_key, secret_key)?;
        Ok(S3Client::new(
            credentials,
            Arc::clone(&self.transport),
            Arc::clone(&self.config),
        ))
    }
}

/// A signed S3 client.
#[derive(Debug, Clone)]
pub struct S3Client {
    signer: Arc<dyn Signer>,
    transport: Arc<dyn HttpTransport>,
    config: Arc<ClientConfig>,
}

impl S3Client {
    /// Create a client from its parts.
    #[must_use]
    pub fn new(
        signer: Arc<dyn Signer>,
        transport: Arc<dyn HttpTransport>,
        config: Arc<ClientConfig>,
    ) -> Self {
        Self {
            signer,
            transport,
            config,
        }
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start a request signed by this client.
    #[must_use]
    pub fn request(&self) -> Request {
        Request::new(
            Arc::clone(&self.signer),
            Arc::clone(&self.transport),
            Arc::clone(&self.config),
        )
    }

    /// Whether the service root answers `200`.
    pub async fn test(&self) -> bool {
        let response = self.request().response().await;
        if let Some(error) = &response.error {
            debug!(%error, "connectivity check failed");
        }
        response.is_accepted(SUCCESS)
    }

    /// Account owner and bucket list.
    pub async fn info(&self) -> Result<AccountInfo, S3Error> {
        let response = self.request().response().await.ok()?;
        let result: ListAllMyBucketsResult = response.xml()?;

        let buckets = result
            .buckets
            .into_iter()
            .map(|entry| {
                let created =
                    parse_timestamp(&entry.creation_date).map_err(S3Error::InvalidTimestamp)?;
                Ok(BucketSummary {
                    name: entry.name,
                    created,
                })
            })
            .collect::<Result<Vec<_>, S3Error>>()?;

        Ok(AccountInfo {
            owner: AccountOwner {
                id: result.owner.id,
                name: result.owner.display_name,
            },
            buckets,
        })
    }

    /// Names of every bucket owned by the account.
    pub async fn buckets(&self) -> Result<Vec<String>, S3Error> {
        let info = self.info().await?;
        Ok(info.buckets.into_iter().map(|bucket| bucket.name).collect())
    }

    /// A handle on `bucket[/key...]`.
    pub fn bucket(&self, path: &str) -> Result<Bucket, S3Error> {
        Bucket::parse(self.clone(), path)
    }
}

impl BucketFactory for S3Client {
    fn bucket(&self, path: &str) -> Result<Bucket, S3Error> {
        S3Client::bucket(self, path)
    }
}
