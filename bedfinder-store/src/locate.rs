//! Origin resolution for "find nearest hospital".

use std::time::Duration;

use async_trait::async_trait;
use bedfinder_core::{BedFinderError, Coordinate, SearchConfig};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::contracts::GeolocationProvider;

/// A provider that always reports the same point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLocation(pub Coordinate);

#[async_trait]
impl GeolocationProvider for FixedLocation {
    async fn current_location(&self) -> Result<Coordinate, BedFinderError> {
        Ok(self.0)
    }
}

/// A provider that always fails, e.g. when the user declined the permission prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct NoLocation(pub BedFinderError);

#[async_trait]
impl GeolocationProvider for NoLocation {
    async fn current_location(&self) -> Result<Coordinate, BedFinderError> {
        Err(self.0.clone())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OriginSource {
    Device,
    Fallback,
}

/// The origin a radius search actually used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedOrigin {
    pub coordinate: Coordinate,
    pub source: OriginSource,
    /// Why the device location was not used, for display at the UI boundary.
    pub fallback_reason: Option<String>,
}

/// Ask the provider for a location, giving up after `timeout`.
///
/// A timeout or an out-of-range reading is reported as `LocationUnavailable`.
pub async fn acquire_location(
    provider: &dyn GeolocationProvider,
    timeout: Duration,
) -> Result<Coordinate, BedFinderError> {
    let coordinate = tokio::time::timeout(timeout, provider.current_location())
        .await
        .map_err(|_| {
            BedFinderError::LocationUnavailable(format!(
                "no position within {} ms",
                timeout.as_millis()
            ))
        })??;

    coordinate
        .validate()
        .map_err(|err| BedFinderError::LocationUnavailable(err.to_string()))?;
    Ok(coordinate)
}

/// Device location when available, otherwise the configured fallback origin.
///
/// Only geolocation failures trigger the fallback; anything else is returned.
pub async fn resolve_origin(
    provider: &dyn GeolocationProvider,
    config: &SearchConfig,
) -> Result<ResolvedOrigin, BedFinderError> {
    let timeout = Duration::from_millis(config.geolocation_timeout_ms);
    match acquire_location(provider, timeout).await {
        Ok(coordinate) => Ok(ResolvedOrigin {
            coordinate,
            source: OriginSource::Device,
            fallback_reason: None,
        }),
        Err(err @ (BedFinderError::PermissionDenied | BedFinderError::LocationUnavailable(_))) => {
            warn!("falling back to default search origin: {err}");
            config.fallback_origin.validate()?;
            Ok(ResolvedOrigin {
                coordinate: config.fallback_origin,
                source: OriginSource::Fallback,
                fallback_reason: Some(err.user_message()),
            })
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowLocation;

    #[async_trait]
    impl GeolocationProvider for SlowLocation {
        async fn current_location(&self) -> Result<Coordinate, BedFinderError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Coordinate {
                latitude: 0.0,
                longitude: 0.0,
            })
        }
    }

    fn config(timeout_ms: u64) -> SearchConfig {
        SearchConfig {
            geolocation_timeout_ms: timeout_ms,
            ..SearchConfig::default()
        }
    }

    #[tokio::test]
    async fn device_location_is_preferred() {
        let here = Coordinate::new(19.076, 72.8777).unwrap();
        let origin = resolve_origin(&FixedLocation(here), &config(1_000)).await.unwrap();
        assert_eq!(origin.coordinate, here);
        assert_eq!(origin.source, OriginSource::Device);
        assert!(origin.fallback_reason.is_none());
    }

    #[tokio::test]
    async fn denied_permission_falls_back() {
        let cfg = config(1_000);
        let origin = resolve_origin(&NoLocation(BedFinderError::PermissionDenied), &cfg)
            .await
            .unwrap();
        assert_eq!(origin.coordinate, cfg.fallback_origin);
        assert_eq!(origin.source, OriginSource::Fallback);
        assert!(origin.fallback_reason.unwrap().contains("browser settings"));
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let err = acquire_location(&SlowLocation, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, BedFinderError::LocationUnavailable(_)));

        let origin = resolve_origin(&SlowLocation, &config(20)).await.unwrap();
        assert_eq!(origin.source, OriginSource::Fallback);
    }

    #[tokio::test]
    async fn out_of_range_reading_is_unavailable() {
        let bogus = FixedLocation(Coordinate {
            latitude: 91.0,
            longitude: 0.0,
        });
        assert!(matches!(
            acquire_location(&bogus, Duration::from_millis(100)).await,
            Err(BedFinderError::LocationUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn unrelated_errors_are_not_masked() {
        let provider = NoLocation(BedFinderError::StoreUnavailable("x".to_string()));
        assert!(matches!(
            resolve_origin(&provider, &config(100)).await,
            Err(BedFinderError::StoreUnavailable(_))
        ));
    }
}
