use log::{info, warn};
use logrestore_models::core::{LIST_PAGE_LIMIT, ListingMode, TimeWindow};
use logrestore_oci::{ListObjectsRequest, ObjectPages, ObjectStore};

use crate::error::{RestoreError, Result};

/// Names of archive objects under `prefix` created strictly inside `window`,
/// in listing order.
pub fn find_archive_log_objects<S>(
    store: &S,
    namespace: &str,
    bucket: &str,
    prefix: &str,
    window: &TimeWindow,
    listing: ListingMode,
) -> Result<Vec<String>>
where
    S: ObjectStore + ?Sized,
{
    store
        .get_bucket(namespace, bucket)
        .map_err(|source| RestoreError::Bucket {
            bucket: bucket.to_string(),
            source,
        })?;

    let request = ListObjectsRequest {
        namespace: namespace.to_string(),
        bucket: bucket.to_string(),
        prefix: prefix.to_string(),
        limit: LIST_PAGE_LIMIT,
        start: None,
    };
    let pages = ObjectPages::new(store, request, listing == ListingMode::AllPages);

    let mut listed = 0usize;
    let mut targets = Vec::new();
    for page in pages {
        let page = page.map_err(|source| RestoreError::Listing {
            bucket: bucket.to_string(),
            source,
        })?;

        if listing == ListingMode::SinglePage {
            if let Some(next) = &page.next_start_with {
                warn!(
                    "Bucket {} has more than {} object(s) under '{}'; objects from '{}' on are not considered (use --all-pages)",
                    bucket, LIST_PAGE_LIMIT, prefix, next
                );
            }
        }

        listed += page.objects.len();
        targets.extend(
            page.objects
                .into_iter()
                .filter(|object| object.time_created.is_some_and(|time| window.contains(time)))
                .map(|object| object.name),
        );
    }

    info!(
        "Selected {} of {} object(s) under '{}' created between {} and {}",
        targets.len(),
        listed,
        prefix,
        window.start,
        window.end
    );
    Ok(targets)
}
