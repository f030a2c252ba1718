//! Builds a [`PostOffice`] from validated configuration.

use std::sync::Arc;

use tracing::info;

use crate::config::OfficeConfig;
use crate::core::{EventSink, OfficeError, PostOffice};

/// Validate `cfg` and assemble the facility, reporting events to `events`.
///
/// # Errors
///
/// [`OfficeError::InvalidConfig`] when validation fails.
pub fn build_office(
    cfg: &OfficeConfig,
    events: Arc<dyn EventSink>,
) -> Result<Arc<PostOffice>, OfficeError> {
    cfg.validate().map_err(OfficeError::InvalidConfig)?;

    let office = PostOffice::new(
        cfg.capacity,
        cfg.worker_count,
        cfg.millis_per_minute,
        events,
    );
    info!(
        capacity = cfg.capacity,
        worker_count = cfg.worker_count,
        millis_per_minute = cfg.millis_per_minute,
        "post office assembled"
    );
    Ok(Arc::new(office))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NullEventSink;

    #[test]
    fn test_build_rejects_zero_workers() {
        let cfg = OfficeConfig::default().with_worker_count(0);
        let err = build_office(&cfg, Arc::new(NullEventSink)).err();
        assert!(matches!(err, Some(OfficeError::InvalidConfig(_))));
    }

    #[test]
    fn test_build_sizes_primitives() {
        let cfg = OfficeConfig::default().with_capacity(4).with_worker_count(2);
        let office = build_office(&cfg, Arc::new(NullEventSink)).unwrap();
        assert_eq!(office.gate().capacity(), 4);
        assert_eq!(office.worker_count(), 2);
        assert_eq!(office.pool().worker_count(), 2);
    }
}
