//! Stratum assignment and spatial partitioning of parcel collections.
//!
//! Parcels are tagged with a coarse climatic stratum by intersection against
//! the Mediterranean reference geometry, then split into per-rectangle
//! subsets for independent sampling and export. All transformations are
//! pure: a tagged parcel is a new value, never an in-place edit of a shared
//! collection.

use geo::{EuclideanDistance, Intersects, MultiPolygon};

use crate::config::RegionRect;
use crate::types::{BoundingBox, Parcel};

/// Stratum id for parcels touching the Mediterranean reference geometry.
pub const STRATUM_MEDITERRANEAN: u8 = 2;
/// Stratum id for everything else.
pub const STRATUM_NORTHERN: u8 = 1;

/// Dissolve the reference rectangles into one multipolygon.
pub fn reference_geometry(rects: &[BoundingBox]) -> MultiPolygon<f64> {
    MultiPolygon(rects.iter().map(|b| b.to_rect().to_polygon()).collect())
}

/// Tag a parcel with its stratum: Mediterranean when its geometry intersects
/// the reference or comes within `tolerance` of it. The tolerance absorbs
/// coordinate precision noise for parcels sitting exactly on a rectangle
/// boundary.
pub fn assign_stratum(parcel: Parcel, reference: &MultiPolygon<f64>, tolerance: f64) -> Parcel {
    let stratum = if within_tolerance(&parcel.geometry, reference, tolerance) {
        STRATUM_MEDITERRANEAN
    } else {
        STRATUM_NORTHERN
    };
    Parcel {
        stratum: Some(stratum),
        ..parcel
    }
}

fn within_tolerance(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>, tolerance: f64) -> bool {
    if a.intersects(b) {
        return true;
    }
    a.0.iter()
        .any(|pa| b.0.iter().any(|pb| pa.euclidean_distance(pb) <= tolerance))
}

/// Keep only parcels tagged with the given stratum.
pub fn filter_stratum(parcels: Vec<Parcel>, stratum: u8) -> Vec<Parcel> {
    parcels
        .into_iter()
        .filter(|p| p.stratum == Some(stratum))
        .collect()
}

/// Split parcels into one subset per region rectangle. A parcel joins every
/// rectangle its geometry intersects; with overlapping rectangles it is
/// duplicated into each, which is accepted behavior, not deduplicated here.
/// A parcel intersecting no rectangle appears in no subset.
pub fn partition_by_regions(
    parcels: &[Parcel],
    regions: &[RegionRect],
) -> Vec<(String, Vec<Parcel>)> {
    regions
        .iter()
        .map(|region| {
            let rect = region.bounds.to_rect().to_polygon();
            let members: Vec<Parcel> = parcels
                .iter()
                .filter(|p| p.geometry.intersects(&rect))
                .cloned()
                .collect();
            log::debug!("Region {}: {} parcels", region.label, members.len());
            (region.label.clone(), members)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn square(point_id: i64, lon: f64, lat: f64, side: f64) -> Parcel {
        let ring = LineString::from(vec![
            (lon, lat),
            (lon + side, lat),
            (lon + side, lat + side),
            (lon, lat + side),
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

    fn reference() -> MultiPolygon<f64> {
        reference_geometry(&[BoundingBox::new(0.0, 32.0, 13.0, 48.0)])
    }

    #[test]
    fn test_intersecting_parcel_is_mediterranean() {
        let parcel = assign_stratum(square(1, 5.0, 40.0, 0.01), &reference(), 1e-5);
        assert_eq!(parcel.stratum, Some(STRATUM_MEDITERRANEAN));
    }

    #[test]
    fn test_disjoint_parcel_is_northern() {
        let parcel = assign_stratum(square(2, 5.0, 55.0, 0.01), &reference(), 1e-5);
        assert_eq!(parcel.stratum, Some(STRATUM_NORTHERN));
    }

    #[test]
    fn test_boundary_parcel_within_tolerance_is_mediterranean() {
        // Sits 5e-6 north of the reference edge at lat 48
        let parcel = assign_stratum(square(3, 5.0, 48.000005, 0.01), &reference(), 1e-5);
        assert_eq!(parcel.stratum, Some(STRATUM_MEDITERRANEAN));

        let parcel = assign_stratum(square(4, 5.0, 48.000005, 0.01), &reference(), 1e-7);
        assert_eq!(parcel.stratum, Some(STRATUM_NORTHERN));
    }

    #[test]
    fn test_filter_stratum_excludes_other_strata() {
        let reference = reference();
        let parcels: Vec<Parcel> = vec![square(1, 5.0, 40.0, 0.01), square(2, 5.0, 55.0, 0.01)]
            .into_iter()
            .map(|p| assign_stratum(p, &reference, 1e-5))
            .collect();

        let northern = filter_stratum(parcels, STRATUM_NORTHERN);
        assert_eq!(northern.len(), 1);
        assert_eq!(northern[0].point_id, 2);
    }

    #[test]
    fn test_partition_assigns_by_intersection() {
        let regions = vec![
            RegionRect::new("west", 0.0, 48.0, 13.0, 70.0),
            RegionRect::new("east", 13.0, 48.0, 23.5, 70.0),
        ];
        let parcels = vec![
            square(1, 5.0, 55.0, 0.01),
            square(2, 20.0, 55.0, 0.01),
            // Straddles the shared meridian: lands in both subsets
            square(3, 12.995, 55.0, 0.01),
            // South of both rectangles: lands in neither
            square(4, 5.0, 40.0, 0.01),
        ];

        let subsets = partition_by_regions(&parcels, &regions);
        let ids = |label: &str| -> Vec<i64> {
            subsets
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, ps)| ps.iter().map(|p| p.point_id).collect())
                .unwrap()
        };
        assert_eq!(ids("west"), vec![1, 3]);
        assert_eq!(ids("east"), vec![2, 3]);
        assert!(subsets.iter().all(|(_, ps)| !ps.iter().any(|p| p.point_id == 4)));
    }
}
