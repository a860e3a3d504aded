use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::application::errors::GatewayError;
use crate::application::use_cases::{
    ByteRange, GetObjectRequest, GetObjectUseCase, PutObjectRequest, PutObjectUseCase,
};
use crate::domain::value_objects::{AttrMap, Preconditions};

#[derive(Debug, Clone)]
pub struct CopyObjectRequest {
    pub src_bucket: String,
    pub src_key: String,
    pub dst_bucket: String,
    pub dst_key: String,
    /// Evaluated against the source object
    pub preconditions: Preconditions,
    /// Placed on the destination on top of the source's attributes
    pub attrs: AttrMap,
}

/// Use case: copy an object, carrying its attributes along.
///
/// The whole source is read (with preconditions) before the destination is
/// touched, so a failed read never leaves a partial destination behind.
pub struct CopyObjectUseCase {
    get_use_case: Arc<GetObjectUseCase>,
    put_use_case: Arc<PutObjectUseCase>,
}

impl CopyObjectUseCase {
    pub fn new(get_use_case: Arc<GetObjectUseCase>, put_use_case: Arc<PutObjectUseCase>) -> Self {
        Self {
            get_use_case,
            put_use_case,
        }
    }

    /// Returns the destination's modification time
    pub async fn execute(
        &self,
        request: CopyObjectRequest,
    ) -> Result<Option<DateTime<Utc>>, GatewayError> {
        // 1. Read source
        let source = self
            .get_use_case
            .execute(
                &GetObjectRequest::new(request.src_bucket.as_str(), request.src_key.as_str())
                    .with_range(ByteRange::full())
                    .with_preconditions(request.preconditions),
            )
            .await?;

        // 2. Explicit attributes win over the source's
        let mut attrs = source.attrs.unwrap_or_default();
        attrs.extend(request.attrs);

        // 3. Write destination
        info!(
            src = %format!("{}/{}", request.src_bucket, request.src_key),
            dst = %format!("{}/{}", request.dst_bucket, request.dst_key),
            "Copying object"
        );
        self.put_use_case
            .execute(PutObjectRequest {
                bucket: request.dst_bucket,
                key: request.dst_key,
                data: source.data.unwrap_or_default(),
                attrs,
                want_mtime: true,
            })
            .await
    }
}
