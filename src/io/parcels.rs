//! Parcel collection boundary.
//!
//! The survey polygons live in an external collection with their own
//! attribute schema; sources normalize whatever they hold into `Parcel`
//! records ({POINT_ID, LC1, LU1} plus geometry) and answer
//! bounding-rectangle queries.

use geo::Intersects;

use crate::types::{BoundingBox, Parcel, PipelineResult};

/// Capability interface over the polygon collection.
pub trait ParcelSource {
    /// Parcels whose geometry intersects the given bounds.
    fn query_bounds(&self, bounds: &BoundingBox) -> PipelineResult<Vec<Parcel>>;
}

/// Parcel source over a fixed in-memory collection.
pub struct InMemoryParcelSource {
    parcels: Vec<Parcel>,
}

impl InMemoryParcelSource {
    pub fn new(parcels: Vec<Parcel>) -> Self {
        Self { parcels }
    }
}

impl ParcelSource for InMemoryParcelSource {
    fn query_bounds(&self, bounds: &BoundingBox) -> PipelineResult<Vec<Parcel>> {
        let rect = bounds.to_rect().to_polygon();
        let matches: Vec<Parcel> = self
            .parcels
            .iter()
            .filter(|p| p.geometry.intersects(&rect))
            .cloned()
            .collect();
        log::info!(
            "Parcel query matched {} of {} parcels",
            matches.len(),
            self.parcels.len()
        );
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, MultiPolygon, Polygon};

    fn parcel(point_id: i64, lon: f64, lat: f64) -> Parcel {
        let ring = LineString::from(vec![
            (lon, lat),
            (lon + 0.01, lat),
            (lon + 0.01, lat + 0.01),
            (lon, lat + 0.01),
            (lon, lat),
        ]);
        Parcel {
            point_id,
            lc1: "B11".to_string(),
            lu1: "U111".to_string(),
            stratum: None,
            geometry: MultiPolygon(vec![Polygon::new(ring, vec![])]),
        }
    }

    #[test]
    fn test_bounds_query_filters_spatially() {
        let source = InMemoryParcelSource::new(vec![
            parcel(1, 5.0, 55.0),
            parcel(2, 30.0, 55.0),
            parcel(3, 5.0, 40.0),
        ]);

        let matches = source
            .query_bounds(&BoundingBox::new(0.0, 48.0, 13.0, 70.0))
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].point_id, 1);
    }

    #[test]
    fn test_empty_bounds_match_nothing() {
        let source = InMemoryParcelSource::new(vec![parcel(1, 5.0, 55.0)]);
        let matches = source
            .query_bounds(&BoundingBox::new(100.0, -10.0, 101.0, -9.0))
            .unwrap();
        assert!(matches.is_empty());
    }
}
