//! AWS S3 store implementation
//!
//! Object reads and writes go through `object_store::aws::AmazonS3`, one
//! client per bucket. Bucket creation and ownership controls are
//! control-plane calls object_store does not offer, so they use aws-sdk-s3.
//!
//! Credentials come from the AWS SDK default chain, optionally narrowed to a
//! named profile from configuration, and are shared with object_store
//! through a credential provider adapter. Nothing is written to the process
//! environment.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{ProvideCredentials, Region, SharedCredentialsProvider};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, ObjectOwnership, OwnershipControls,
    OwnershipControlsRule,
};
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder, AwsCredential};
use object_store::{Attribute, Attributes, CredentialProvider, ObjectStore, PutOptions};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

use crate::config::AwsConfig;
use crate::errors::{MarketError, Result};
use crate::store::{object_path, ObjectStoreClient};

/// The region S3 refuses as an explicit location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// AWS S3 store
pub struct S3Store {
    config: AwsConfig,
    client: aws_sdk_s3::Client,
    credentials: Option<SharedCredentialsProvider>,
    buckets: Mutex<HashMap<String, Arc<AmazonS3>>>,
}

impl S3Store {
    /// Create a new S3 store from explicit configuration
    pub async fn new(config: &AwsConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        // S3-compatible endpoints (MinIO, localstack) need path-style addressing
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        info!(region = %config.region, profile = ?config.profile, "S3 store initialized");

        Ok(Self {
            config: config.clone(),
            client: aws_sdk_s3::Client::from_conf(s3_config),
            credentials: sdk_config.credentials_provider(),
            buckets: Mutex::new(HashMap::new()),
        })
    }

    /// Get (or build) the object_store client for a bucket
    fn bucket(&self, bucket: &str) -> Result<Arc<AmazonS3>> {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(store) = buckets.get(bucket) {
            return Ok(store.clone());
        }

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_region(&self.config.region);

        if let Some(credentials) = &self.credentials {
            builder = builder.with_credentials(Arc::new(SdkCredentials(credentials.clone())));
        }

        // Configure endpoint (for S3-compatible services like MinIO)
        if let Some(endpoint) = &self.config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        if self.config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = Arc::new(builder.build()?);
        buckets.insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

#[async_trait]
impl ObjectStoreClient for S3Store {
    fn name(&self) -> &'static str {
        "s3"
    }

    fn region(&self) -> Option<String> {
        Some(self.config.region.clone())
    }

    async fn create_container(&self, container: &str) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(container);
        if self.config.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(
                        self.config.region.as_str(),
                    ))
                    .build(),
            );
        }

        request.send().await.map_err(|e| MarketError::Provisioning {
            container: container.to_string(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

        info!(bucket = %container, region = %self.config.region, "Created bucket");
        Ok(())
    }

    async fn set_writer_owns_objects(&self, container: &str) -> Result<()> {
        let provisioning = |message: String| MarketError::Provisioning {
            container: container.to_string(),
            message,
        };

        let rule = OwnershipControlsRule::builder()
            .object_ownership(ObjectOwnership::ObjectWriter)
            .build()
            .map_err(|e| provisioning(e.to_string()))?;
        let controls = OwnershipControls::builder()
            .rules(rule)
            .build()
            .map_err(|e| provisioning(e.to_string()))?;

        self.client
            .put_bucket_ownership_controls()
            .bucket(container)
            .ownership_controls(controls)
            .send()
            .await
            .map_err(|e| provisioning(DisplayErrorContext(&e).to_string()))?;

        debug!(bucket = %container, "Set ObjectWriter ownership");
        Ok(())
    }

    async fn put(
        &self,
        container: &str,
        key: &str,
        content: Bytes,
        content_type: &str,
    ) -> Result<()> {
        let store = self.bucket(container)?;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let mut opts = PutOptions::default();
        opts.attributes = attributes;

        store
            .put_opts(&object_path(key), content.into(), opts)
            .await
            .map_err(|e| MarketError::from_store(e, container, key))?;
        Ok(())
    }

    async fn get(&self, container: &str, key: &str) -> Result<Bytes> {
        let store = self.bucket(container)?;
        info!(bucket = %container, key = %key, "fetching");
        let data = store
            .get(&object_path(key))
            .await
            .map_err(|e| MarketError::from_store(e, container, key))?;
        let bytes = data
            .bytes()
            .await
            .map_err(|e| MarketError::from_store(e, container, key))?;
        Ok(bytes)
    }
}

/// Serves AWS SDK credentials to object_store
#[derive(Debug)]
struct SdkCredentials(SharedCredentialsProvider);

#[async_trait]
impl CredentialProvider for SdkCredentials {
    type Credential = AwsCredential;

    async fn get_credential(&self) -> object_store::Result<Arc<AwsCredential>> {
        let credentials = self
            .0
            .provide_credentials()
            .await
            .map_err(|e| object_store::Error::Generic {
                store: "S3",
                source: Box::new(e),
            })?;

        Ok(Arc::new(AwsCredential {
            key_id: credentials.access_key_id().to_string(),
            secret_key: credentials.secret_access_key().to_string(),
            token: credentials.session_token().map(str::to_string),
        }))
    }
}
