//! Great-circle distance helpers.

use crate::error::BedFinderError;
use crate::model::Coordinate;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two valid coordinates.
pub fn distance_km(a: Coordinate, b: Coordinate) -> Result<f64, BedFinderError> {
    a.validate()?;
    b.validate()?;
    if a == b {
        return Ok(0.0);
    }

    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (dlng / 2.0).sin().powi(2);
    // rounding can push h just past 1 for antipodal points
    let h = h.clamp(0.0, 1.0);
    Ok(2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt()))
}

/// True iff `point` lies within `radius_km` of `origin` (inclusive).
pub fn is_within_radius(
    origin: Coordinate,
    point: Coordinate,
    radius_km: f64,
) -> Result<bool, BedFinderError> {
    check_radius(radius_km)?;
    Ok(distance_km(origin, point)? <= radius_km)
}

pub(crate) fn check_radius(radius_km: f64) -> Result<(), BedFinderError> {
    if radius_km.is_finite() && radius_km > 0.0 {
        Ok(())
    } else {
        Err(BedFinderError::InvalidRadius(radius_km))
    }
}
