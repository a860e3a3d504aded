//! Conditional evaluator
//!
//! Applies modification-time and entity-tag preconditions to an object that
//! has already been stat'ed. Checks run in a fixed order and stop at the first
//! failure; nothing here mutates the object.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::application::errors::{ErrorDescriptor, GatewayError};
use crate::application::ports::{ObjectStore, PoolHandle};
use crate::domain::value_objects::{etag_from_attr, Preconditions, ETAG_ATTR};

/// Time-based checks. `unmodified-since` is compared against its own
/// threshold.
pub fn check_times(mtime: DateTime<Utc>, pre: &Preconditions) -> Result<(), ErrorDescriptor> {
    if let Some(since) = pre.modified_since {
        if mtime < since {
            return Err(ErrorDescriptor::not_modified());
        }
    }

    if let Some(since) = pre.unmodified_since {
        if mtime >= since {
            return Err(ErrorDescriptor::precondition_failed());
        }
    }

    Ok(())
}

/// Etag checks against the stored entity tag
pub fn check_etag(stored: &str, pre: &Preconditions) -> Result<(), ErrorDescriptor> {
    if let Some(expected) = pre.if_match.as_deref() {
        if expected != stored {
            return Err(ErrorDescriptor::precondition_failed());
        }
    }

    if let Some(rejected) = pre.if_none_match.as_deref() {
        if rejected == stored {
            return Err(ErrorDescriptor::precondition_failed());
        }
    }

    Ok(())
}

/// Run every check for `key`, fetching the etag only when an etag condition
/// is present. A failed etag fetch is returned as-is.
pub async fn evaluate(
    store: &dyn ObjectStore,
    pool: &PoolHandle,
    bucket: &str,
    key: &str,
    mtime: DateTime<Utc>,
    pre: &Preconditions,
) -> Result<(), GatewayError> {
    if pre.is_empty() {
        return Ok(());
    }

    check_times(mtime, pre).map_err(GatewayError::PreconditionFailed)?;

    if !pre.needs_etag() {
        return Ok(());
    }

    let raw = store
        .get_xattr(pool, key, ETAG_ATTR)
        .await
        .map_err(|e| GatewayError::from_object(bucket, key, e))?;
    let stored = etag_from_attr(&raw, raw.len());
    debug!(bucket, key, etag = %stored, "Evaluating etag preconditions");

    check_etag(&stored, pre).map_err(GatewayError::PreconditionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockObjectStore, StoreError};
    use bytes::Bytes;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_no_preconditions_pass() {
        assert!(check_times(t0(), &Preconditions::default()).is_ok());
        assert!(check_etag("abc", &Preconditions::default()).is_ok());
    }

    #[test]
    fn test_modified_since_after_mtime_is_not_modified() {
        let pre = Preconditions {
            modified_since: Some(t0() + Duration::seconds(1)),
            ..Default::default()
        };
        let err = check_times(t0(), &pre).unwrap_err();
        assert_eq!(err.status, 304);
        assert_eq!(err.code, "PreconditionFailed");
    }

    #[test]
    fn test_modified_since_at_mtime_passes() {
        let pre = Preconditions {
            modified_since: Some(t0()),
            ..Default::default()
        };
        assert!(check_times(t0(), &pre).is_ok());
    }

    #[test]
    fn test_unmodified_since_uses_its_own_threshold() {
        // modified-since alone would pass here; only the unmodified-since
        // value may decide the 412.
        let pre = Preconditions {
            modified_since: Some(t0() - Duration::days(1)),
            unmodified_since: Some(t0() + Duration::seconds(1)),
            ..Default::default()
        };
        assert!(check_times(t0(), &pre).is_ok());

        let pre = Preconditions {
            unmodified_since: Some(t0()),
            ..Default::default()
        };
        assert_eq!(check_times(t0(), &pre).unwrap_err().status, 412);
    }

    #[test]
    fn test_modified_since_checked_first() {
        let pre = Preconditions {
            modified_since: Some(t0() + Duration::seconds(1)),
            unmodified_since: Some(t0()),
            ..Default::default()
        };
        assert_eq!(check_times(t0(), &pre).unwrap_err().status, 304);
    }

    #[test]
    fn test_if_match() {
        let pre = Preconditions {
            if_match: Some("wrong".to_string()),
            ..Default::default()
        };
        assert_eq!(check_etag("abc", &pre).unwrap_err().status, 412);

        let pre = Preconditions {
            if_match: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(check_etag("abc", &pre).is_ok());
    }

    #[test]
    fn test_if_none_match() {
        let pre = Preconditions {
            if_none_match: Some("abc".to_string()),
            ..Default::default()
        };
        assert_eq!(check_etag("abc", &pre).unwrap_err().status, 412);

        let pre = Preconditions {
            if_none_match: Some("other".to_string()),
            ..Default::default()
        };
        assert!(check_etag("abc", &pre).is_ok());
    }

    #[tokio::test]
    async fn test_evaluate_skips_etag_fetch_without_etag_conditions() {
        let mut mock_store = MockObjectStore::new();
        mock_store.expect_get_xattr().times(0);

        let pool = PoolHandle::new(1, "b1");
        let result = evaluate(&mock_store, &pool, "b1", "k1", t0(), &Preconditions::default())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_evaluate_fetches_etag() {
        let mut mock_store = MockObjectStore::new();
        mock_store
            .expect_get_xattr()
            .withf(|_, key, name| key == "k1" && name == ETAG_ATTR)
            .times(1)
            .returning(|_, _, _| Ok(Bytes::from_static(b"abc\0")));

        let pool = PoolHandle::new(1, "b1");
        let pre = Preconditions {
            if_match: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(evaluate(&mock_store, &pool, "b1", "k1", t0(), &pre)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_evaluate_propagates_etag_fetch_failure() {
        let mut mock_store = MockObjectStore::new();
        mock_store
            .expect_get_xattr()
            .times(1)
            .returning(|_, _, name| Err(StoreError::NoSuchAttribute(name.to_string())));

        let pool = PoolHandle::new(1, "b1");
        let pre = Preconditions {
            if_none_match: Some("abc".to_string()),
            ..Default::default()
        };
        let result = evaluate(&mock_store, &pool, "b1", "k1", t0(), &pre).await;
        assert!(matches!(result, Err(GatewayError::NoSuchAttribute(_))));
    }

    #[tokio::test]
    async fn test_evaluate_time_failure_skips_etag() {
        let mut mock_store = MockObjectStore::new();
        mock_store.expect_get_xattr().times(0);

        let pool = PoolHandle::new(1, "b1");
        let pre = Preconditions {
            modified_since: Some(t0() + Duration::seconds(1)),
            if_match: Some("abc".to_string()),
            ..Default::default()
        };
        let result = evaluate(&mock_store, &pool, "b1", "k1", t0(), &pre).await;
        match result {
            Err(GatewayError::PreconditionFailed(d)) => assert_eq!(d.status, 304),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
