use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::application::errors::GatewayError;
use crate::application::ports::ObjectStore;
use crate::application::use_cases::{
    BucketListing, BucketRegistry, CopyObjectRequest, CopyObjectUseCase, DeleteObjectUseCase,
    GetObjectOutput, GetObjectRequest, GetObjectUseCase, ListBucketsUseCase, ListObjectsRequest,
    ListObjectsResponse, ListObjectsUseCase, ObjectAttrsUseCase, PutObjectRequest,
    PutObjectUseCase,
};
use crate::config::Config;
use crate::domain::value_objects::AttrMap;

/// In-process entry point for the protocol layer.
///
/// Owns the bucket registry (and with it the root pool handle) plus one
/// instance of every use case, all sharing the injected store.
pub struct Gateway {
    registry: Arc<BucketRegistry>,
    list_buckets_use_case: Arc<ListBucketsUseCase>,
    list_objects_use_case: Arc<ListObjectsUseCase>,
    put_use_case: Arc<PutObjectUseCase>,
    get_use_case: Arc<GetObjectUseCase>,
    copy_use_case: Arc<CopyObjectUseCase>,
    delete_use_case: Arc<DeleteObjectUseCase>,
    attrs_use_case: Arc<ObjectAttrsUseCase>,
}

impl Gateway {
    /// Validate the configuration, open (or create) the root pool and wire
    /// the use cases.
    pub async fn initialize(
        config: &Config,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Self, GatewayError> {
        config.validate().map_err(GatewayError::InvalidArgument)?;

        let registry = Arc::new(BucketRegistry::open(Arc::clone(&store), &config.root_pool).await?);

        let get_use_case = Arc::new(GetObjectUseCase::new(Arc::clone(&store)));
        let put_use_case = Arc::new(PutObjectUseCase::new(Arc::clone(&store)));
        let copy_use_case = Arc::new(CopyObjectUseCase::new(
            Arc::clone(&get_use_case),
            Arc::clone(&put_use_case),
        ));

        let gateway = Self {
            list_buckets_use_case: Arc::new(ListBucketsUseCase::new(
                Arc::clone(&store),
                config.root_pool.clone(),
            )),
            list_objects_use_case: Arc::new(ListObjectsUseCase::with_batch_size(
                Arc::clone(&store),
                config.list_batch_size,
            )),
            delete_use_case: Arc::new(DeleteObjectUseCase::new(Arc::clone(&store))),
            attrs_use_case: Arc::new(ObjectAttrsUseCase::new(store, Arc::clone(&registry))),
            registry,
            put_use_case,
            get_use_case,
            copy_use_case,
        };

        info!(
            root_pool = %config.root_pool,
            list_batch_size = config.list_batch_size,
            "Gateway initialized"
        );
        Ok(gateway)
    }

    pub async fn create_bucket(
        &self,
        name: &str,
        attrs: &AttrMap,
        owner: Option<u64>,
    ) -> Result<(), GatewayError> {
        self.registry.create_bucket(name, attrs, owner).await
    }

    pub async fn delete_bucket(&self, name: &str) -> Result<(), GatewayError> {
        self.registry.delete_bucket(name).await
    }

    pub async fn get_bucket_attrs(&self, name: &str) -> Result<AttrMap, GatewayError> {
        self.registry.bucket_attrs(name).await
    }

    pub async fn list_buckets(&self) -> Result<BucketListing, GatewayError> {
        self.list_buckets_use_case.execute().await
    }

    pub async fn list_objects(
        &self,
        request: &ListObjectsRequest,
    ) -> Result<ListObjectsResponse, GatewayError> {
        self.list_objects_use_case.execute(request).await
    }

    pub async fn put_object(
        &self,
        request: PutObjectRequest,
    ) -> Result<Option<DateTime<Utc>>, GatewayError> {
        self.put_use_case.execute(request).await
    }

    pub async fn get_object(
        &self,
        request: &GetObjectRequest,
    ) -> Result<GetObjectOutput, GatewayError> {
        self.get_use_case.execute(request).await
    }

    pub async fn copy_object(
        &self,
        request: CopyObjectRequest,
    ) -> Result<Option<DateTime<Utc>>, GatewayError> {
        self.copy_use_case.execute(request).await
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), GatewayError> {
        self.delete_use_case.execute(bucket, key).await
    }

    /// Read one attribute; an empty `key` addresses the bucket itself
    pub async fn get_attr(&self, bucket: &str, key: &str, name: &str) -> Result<Bytes, GatewayError> {
        self.attrs_use_case.get_attr(bucket, key, name).await
    }

    /// Write one attribute; an empty `key` addresses the bucket itself
    pub async fn set_attr(
        &self,
        bucket: &str,
        key: &str,
        name: &str,
        value: Bytes,
    ) -> Result<(), GatewayError> {
        self.attrs_use_case.set_attr(bucket, key, name, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockObjectStore, PoolHandle, StoreError};

    #[tokio::test]
    async fn test_initialize_rejects_invalid_config() {
        let mut mock_store = MockObjectStore::new();
        mock_store.expect_open_pool().times(0);

        let config = Config {
            list_batch_size: 0,
            ..Config::default()
        };
        let result = Gateway::initialize(&config, Arc::new(mock_store)).await;

        assert!(matches!(result, Err(GatewayError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_initialize_opens_configured_root_pool() {
        let mut mock_store = MockObjectStore::new();
        mock_store
            .expect_open_pool()
            .withf(|name| name == ".meta")
            .times(1)
            .returning(|name| Ok(PoolHandle::new(1, name)));
        mock_store.expect_close_pool().return_const(());
        mock_store
            .expect_list_pools()
            .returning(|| Ok(vec![".meta".to_string(), "b1".to_string()]));

        let config = Config {
            root_pool: ".meta".to_string(),
            ..Config::default()
        };
        let gateway = Gateway::initialize(&config, Arc::new(mock_store))
            .await
            .unwrap();

        let names: Vec<String> = gateway
            .list_buckets()
            .await
            .unwrap()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, vec!["b1".to_string()]);
    }

    #[tokio::test]
    async fn test_initialize_surfaces_store_failure() {
        let mut mock_store = MockObjectStore::new();
        mock_store
            .expect_open_pool()
            .returning(|_| Err(StoreError::Cancelled("shutdown".to_string())));

        let result = Gateway::initialize(&Config::default(), Arc::new(mock_store)).await;

        assert!(matches!(result, Err(GatewayError::Cancelled(_))));
    }
}
