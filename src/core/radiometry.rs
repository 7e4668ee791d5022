//! Radiometric domain conversions between dB and linear power.
//!
//! Backscatter is stored and displayed in dB but is physically additive only
//! in linear units, so every averaging step is bracketed by these two
//! conversions. Both are NaN-preserving: no-data pixels stay no-data.

use crate::types::{Band, ImageRecord};

/// Per-pixel `10^(x/10)`.
pub fn db_to_linear(band: &Band) -> Band {
    band.mapv(|x| {
        if x.is_finite() {
            10f32.powf(x / 10.0)
        } else {
            f32::NAN
        }
    })
}

/// Per-pixel `10 * log10(x)`. Non-positive power has no dB representation
/// and maps to no-data.
pub fn linear_to_db(band: &Band) -> Band {
    band.mapv(|x| {
        if x.is_finite() && x > 0.0 {
            10.0 * x.log10()
        } else {
            f32::NAN
        }
    })
}

/// Convert every band of a record to linear power. Acquisition timestamp,
/// mode and grid pass through untouched.
pub fn record_to_linear(record: &ImageRecord) -> ImageRecord {
    ImageRecord {
        acquired: record.acquired,
        mode: record.mode,
        polarizations: record.polarizations.clone(),
        bands: record
            .bands
            .iter()
            .map(|(&pol, band)| (pol, db_to_linear(band)))
            .collect(),
        geo: record.geo.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_known_values() {
        let db = array![[0.0f32, 10.0, -10.0]];
        let lin = db_to_linear(&db);
        assert_relative_eq!(lin[[0, 0]], 1.0, epsilon = 1e-6);
        assert_relative_eq!(lin[[0, 1]], 10.0, epsilon = 1e-5);
        assert_relative_eq!(lin[[0, 2]], 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_round_trip() {
        let db = array![[-25.0f32, -17.3, -5.0, 0.0, 4.99]];
        let back = linear_to_db(&db_to_linear(&db));
        for (a, b) in db.iter().zip(back.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-4);
        }

        let lin = array![[0.003f32, 0.05, 1.0, 3.2]];
        let back = db_to_linear(&linear_to_db(&lin));
        for (a, b) in lin.iter().zip(back.iter()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_nan_and_nonpositive_become_nodata() {
        let lin = array![[0.0f32, -1.0, f32::NAN]];
        let db = linear_to_db(&lin);
        assert!(db.iter().all(|x| x.is_nan()));

        let db = array![[f32::NAN]];
        assert!(db_to_linear(&db)[[0, 0]].is_nan());
    }

    #[test]
    fn test_record_conversion_preserves_timestamp() {
        use crate::types::{AcquisitionMode, GeoTransform, Polarization};
        use std::collections::HashMap;

        let acquired = "2018-01-05T05:30:00Z".parse().unwrap();
        let mut bands = HashMap::new();
        bands.insert(Polarization::VV, array![[-10.0f32]]);
        let record = ImageRecord {
            acquired,
            mode: AcquisitionMode::IW,
            polarizations: vec![Polarization::VV],
            bands,
            geo: GeoTransform::north_up(0.0, 0.0, 1.0),
        };

        let linear = record_to_linear(&record);
        assert_eq!(linear.acquired, acquired);
        assert_relative_eq!(
            linear.bands[&Polarization::VV][[0, 0]],
            0.1,
            epsilon = 1e-6
        );
    }
}
