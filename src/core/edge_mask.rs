//! Edge-artifact masking for GRD backscatter scenes.
//!
//! Scene borders carry corrupted pixels from the instrument's ramp-up and
//! antenna pattern cut-off. Those artifacts are isolated or degenerate once
//! the scene is quantized: they form tiny equal-value connected components,
//! while genuine terrain quantizes into large coherent regions. The mask
//! keeps a pixel only when its component clears a minimum size.
//!
//! The filter is a heuristic; occasional false positives and negatives on
//! component boundaries are accepted.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::types::{Band, ImageRecord, PipelineError, PipelineResult};

/// Edge-mask parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeMaskParams {
    /// Lower clamp of the quantization range, dB
    pub scale_min_db: f32,
    /// Upper clamp of the quantization range, dB
    pub scale_max_db: f32,
    /// Minimum connected-component size for a pixel to stay valid.
    /// A tunable threshold, not a domain constant.
    pub min_region_px: usize,
}

impl Default for EdgeMaskParams {
    fn default() -> Self {
        Self {
            scale_min_db: -25.0,
            scale_max_db: 5.0,
            min_region_px: 100,
        }
    }
}

/// Masks edge artifacts out of an acquisition using its reference channel.
pub struct EdgeMasker {
    params: EdgeMaskParams,
}

impl EdgeMasker {
    pub fn new(params: EdgeMaskParams) -> Self {
        Self { params }
    }

    /// Compute the validity mask from the record's first channel and apply
    /// it to every channel: invalid pixels become NaN across the record.
    pub fn apply(&self, record: &ImageRecord) -> PipelineResult<ImageRecord> {
        let reference_pol = *record.polarizations.first().ok_or_else(|| {
            PipelineError::Processing("cannot mask a record with no channels".to_string())
        })?;
        let reference = record.band(reference_pol).ok_or_else(|| {
            PipelineError::Processing(format!(
                "reference channel {} missing from record bands",
                reference_pol
            ))
        })?;

        let mask = self.validity_mask(reference);
        let masked_pixels = mask.iter().filter(|&&v| v == 0).count();
        log::debug!(
            "Edge mask for {} drops {} of {} pixels",
            record.acquired,
            masked_pixels,
            mask.len()
        );

        let bands = record
            .bands
            .iter()
            .map(|(&pol, band)| {
                let mut out = band.clone();
                out.zip_mut_with(&mask, |v, &keep| {
                    if keep == 0 {
                        *v = f32::NAN;
                    }
                });
                (pol, out)
            })
            .collect();

        Ok(ImageRecord {
            acquired: record.acquired,
            mode: record.mode,
            polarizations: record.polarizations.clone(),
            bands,
            geo: record.geo.clone(),
        })
    }

    /// Binary validity mask (1 = keep) from one channel: clamp to the
    /// quantization range, quantize to 8 bit, label 4-connected components
    /// of equal value, keep components of at least `min_region_px` pixels.
    pub fn validity_mask(&self, band: &Band) -> Array2<u8> {
        let quantized = self.quantize(band);
        let (labels, sizes) = label_components(&quantized);

        Array2::from_shape_fn(band.dim(), |idx| match labels[idx] {
            Some(label) if sizes[label] >= self.params.min_region_px => 1,
            _ => 0,
        })
    }

    /// Rescale [scale_min_db, scale_max_db] to [0, 1], clamped, then to
    /// 8-bit levels. Non-finite input has no level.
    fn quantize(&self, band: &Band) -> Array2<Option<u8>> {
        let lo = self.params.scale_min_db;
        let span = self.params.scale_max_db - lo;
        band.mapv(|x| {
            if x.is_finite() {
                let unit = ((x - lo) / span).clamp(0.0, 1.0);
                Some((unit * 255.0).round() as u8)
            } else {
                None
            }
        })
    }
}

/// Label 4-connected components of equal quantized value. Returns per-pixel
/// component ids (None for unquantized pixels) and per-component pixel
/// counts.
fn label_components(quantized: &Array2<Option<u8>>) -> (Array2<Option<usize>>, Vec<usize>) {
    let (rows, cols) = quantized.dim();
    let mut labels: Array2<Option<usize>> = Array2::from_elem((rows, cols), None);
    let mut sizes = Vec::new();
    let mut stack = Vec::new();

    for r in 0..rows {
        for c in 0..cols {
            let value = match quantized[[r, c]] {
                Some(v) => v,
                None => continue,
            };
            if labels[[r, c]].is_some() {
                continue;
            }

            let label = sizes.len();
            sizes.push(0);
            stack.push((r, c));
            labels[[r, c]] = Some(label);

            while let Some((pr, pc)) = stack.pop() {
                sizes[label] += 1;
                let mut visit = |nr: usize, nc: usize| {
                    if labels[[nr, nc]].is_none() && quantized[[nr, nc]] == Some(value) {
                        labels[[nr, nc]] = Some(label);
                        stack.push((nr, nc));
                    }
                };
                if pr > 0 {
                    visit(pr - 1, pc);
                }
                if pr + 1 < rows {
                    visit(pr + 1, pc);
                }
                if pc > 0 {
                    visit(pr, pc - 1);
                }
                if pc + 1 < cols {
                    visit(pr, pc + 1);
                }
            }
        }
    }

    (labels, sizes)
}
