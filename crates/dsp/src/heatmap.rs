// Copyright 2025-2026 CEMAXECUTER LLC

//! Range-azimuth heatmap: angle FFT across virtual antennas, then nearest
//! neighbour resampling of the (range, angle) surface onto a Cartesian grid.

use ndarray::Array2;

use mw_protocol::AntennaGeometry;

use crate::error::ConfigError;
use crate::fft::AngleFft;
use crate::samples::ComplexSampleMatrix;

/// Metres per range bin for the demo chirp profile: 3e8 * 5500 / (2 * 68e12 * 256).
pub const RANGE_IDX_TO_METERS: f64 = 0.047392004;
pub const NUM_ANGLE_BINS: usize = 64;

/// Angle FFT size and output raster, fixed when the transform is built.
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub num_angle_bins: usize,
    pub range_idx_to_meters: f64,
    /// Grid spans x in [-range_width, range_width].
    pub range_width: f64,
    /// Grid spans y in [0, range_depth].
    pub range_depth: f64,
    pub grid_points_x: usize,
    pub grid_points_y: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            num_angle_bins: NUM_ANGLE_BINS,
            range_idx_to_meters: RANGE_IDX_TO_METERS,
            range_width: 3.0,
            range_depth: 3.0,
            grid_points_x: 50,
            grid_points_y: 50,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_angle_bins < 2 || self.num_angle_bins % 2 != 0 {
            return Err(ConfigError::AngleBins(self.num_angle_bins));
        }
        if self.grid_points_x == 0 || self.grid_points_y == 0 {
            return Err(ConfigError::GridPoints {
                x: self.grid_points_x,
                y: self.grid_points_y,
            });
        }
        for (name, value) in [
            ("range_idx_to_meters", self.range_idx_to_meters),
            ("range_width", self.range_width),
            ("range_depth", self.range_depth),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Extent { name, value });
            }
        }
        Ok(())
    }

    /// Sine of each retained angle bin: (j - (N/2 - 1)) / (N/2) for j in 0..N-1.
    pub fn angle_sines(&self) -> Vec<f64> {
        let half = (self.num_angle_bins / 2) as f64;
        (0..self.num_angle_bins - 1)
            .map(|j| (j as f64 - (half - 1.0)) / half)
            .collect()
    }
}

/// Magnitudes on a uniform raster. `values[[row, col]]` sits at `(x[col], y[row])`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub values: Array2<f64>,
}

impl HeatmapGrid {
    /// Largest value and its (x, y) position.
    pub fn peak(&self) -> Option<(f64, f64, f64)> {
        self.values
            .indexed_iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|((row, col), &v)| (v, self.x[col], self.y[row]))
    }
}

fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (stop - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Index of the nearest point to every grid cell, row-major over (y, x).
/// Ties go to the lowest point index.
fn nearest_neighbours(points: &[(f64, f64)], gx: &[f64], gy: &[f64]) -> Vec<usize> {
    let mut by_x: Vec<usize> = (0..points.len()).collect();
    by_x.sort_by(|&a, &b| points[a].0.total_cmp(&points[b].0).then(a.cmp(&b)));
    let xs: Vec<f64> = by_x.iter().map(|&i| points[i].0).collect();

    let mut out = Vec::with_capacity(gx.len() * gy.len());
    for &y in gy {
        for &x in gx {
            let start = xs.partition_point(|&px| px < x);
            let mut best = (f64::INFINITY, usize::MAX);

            let mut consider = |k: usize| -> bool {
                let dx = xs[k] - x;
                if dx * dx > best.0 {
                    return false;
                }
                let p = by_x[k];
                let dy = points[p].1 - y;
                let d2 = dx * dx + dy * dy;
                if d2 < best.0 || (d2 == best.0 && p < best.1) {
                    best = (d2, p);
                }
                true
            };

            for k in start..xs.len() {
                if !consider(k) {
                    break;
                }
            }
            for k in (0..start).rev() {
                if !consider(k) {
                    break;
                }
            }
            out.push(best.1);
        }
    }
    out
}

/// Angle FFT plus polar-to-Cartesian resampling for one geometry and grid.
/// The nearest-neighbour map is computed once at construction.
pub struct HeatmapTransform {
    geometry: AntennaGeometry,
    config: GridConfig,
    fft: AngleFft,
    x: Vec<f64>,
    y: Vec<f64>,
    /// Per grid cell, flat index `range_bin * (N - 1) + angle` into the surface.
    nearest: Vec<usize>,
}

impl HeatmapTransform {
    pub fn new(geometry: AntennaGeometry, config: GridConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let sines = config.angle_sines();
        let points: Vec<(f64, f64)> = (0..geometry.num_range_bins)
            .flat_map(|r| {
                let range = r as f64 * config.range_idx_to_meters;
                sines
                    .iter()
                    .map(move |&s| (range * s, range * (1.0 - s * s).sqrt()))
            })
            .collect();

        let x = linspace(-config.range_width, config.range_width, config.grid_points_x);
        let y = linspace(0.0, config.range_depth, config.grid_points_y);
        let nearest = nearest_neighbours(&points, &x, &y);

        log::debug!(
            "heatmap transform: {} range bins x {} angles -> {}x{} grid",
            geometry.num_range_bins,
            sines.len(),
            x.len(),
            y.len()
        );

        Ok(Self {
            geometry,
            fft: AngleFft::new(config.num_angle_bins),
            config,
            x,
            y,
            nearest,
        })
    }

    pub fn geometry(&self) -> &AntennaGeometry {
        &self.geometry
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Range x angle magnitude surface, shape (range bins, N - 1).
    ///
    /// Column `j` is the angle whose sine is `angle_sines()[j]`. The
    /// lowest shifted bin has no valid arcsine and is dropped.
    pub fn range_azimuth(&mut self, samples: &ComplexSampleMatrix) -> Array2<f64> {
        let n = self.config.num_angle_bins;
        let num_bins = samples.num_range_bins();
        let mut surface = Array2::zeros((num_bins, n - 1));
        let mut shifted = vec![0.0f64; n];

        for (r, column) in samples.data().columns().into_iter().enumerate() {
            let spectrum = self.fft.process_padded(column.iter().copied());

            // Centre zero angle: shifted[k] = |spectrum[(k + N/2) mod N]|
            for (k, slot) in shifted.iter_mut().enumerate() {
                *slot = spectrum[(k + n / 2) % n].norm();
            }

            // Drop shifted bin 0 and mirror so the column index runs left to right
            for j in 0..n - 1 {
                surface[[r, j]] = shifted[n - 1 - j];
            }
        }

        surface
    }

    pub fn apply(&mut self, samples: &ComplexSampleMatrix) -> HeatmapGrid {
        let flat = self.range_azimuth(samples).into_raw_vec();
        let nx = self.x.len();

        // Cells whose nearest point is past the decoded range bins stay at zero
        let values = Array2::from_shape_fn((self.y.len(), nx), |(row, col)| {
            flat.get(self.nearest[row * nx + col]).copied().unwrap_or(0.0)
        });

        HeatmapGrid {
            x: self.x.clone(),
            y: self.y.clone(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn ramp_samples(geometry: &AntennaGeometry, range_bin: usize, bin: f64, amp: f64) -> ComplexSampleMatrix {
        let mut data = Array2::zeros((geometry.num_virtual_antennas(), geometry.num_range_bins));
        for a in 0..geometry.num_virtual_antennas() {
            let phase = 2.0 * std::f64::consts::PI * bin * a as f64 / NUM_ANGLE_BINS as f64;
            data[[a, range_bin]] = Complex64::from_polar(amp, phase);
        }
        ComplexSampleMatrix::from_array(data)
    }

    fn argmax(values: impl Iterator<Item = f64>) -> usize {
        values
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn test_angle_sines() {
        let s = GridConfig::default().angle_sines();
        assert_eq!(s.len(), 63);
        assert!((s[0] + 31.0 / 32.0).abs() < 1e-12);
        assert_eq!(s[31], 0.0);
        assert!((s[62] - 31.0 / 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(-1.0, 1.0, 3), vec![-1.0, 0.0, 1.0]);
        assert_eq!(linspace(0.0, 5.0, 1), vec![0.0]);
        let l = linspace(0.0, 3.0, 50);
        assert_eq!(l.len(), 50);
        assert!((l[49] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_input_zero_output() {
        let g = AntennaGeometry::default();
        let mut t = HeatmapTransform::new(g, GridConfig::default()).unwrap();
        let grid = t.apply(&ComplexSampleMatrix::zeros(&g));

        assert_eq!(grid.values.dim(), (50, 50));
        assert_eq!(grid.x.len(), 50);
        assert_eq!(grid.y.len(), 50);
        assert!(grid.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_broadside_target_surface() {
        let g = AntennaGeometry::new(2, 4, 16);
        let mut t = HeatmapTransform::new(g, GridConfig::default()).unwrap();
        let surface = t.range_azimuth(&ramp_samples(&g, 5, 0.0, 1000.0));

        assert_eq!(surface.dim(), (16, 63));
        let row = surface.row(5);
        assert_eq!(argmax(row.iter().copied()), 31);
        assert!((row[31] - 8000.0).abs() < 1e-6);
        assert!(surface.row(4).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_phase_ramp_maps_to_negative_angle() {
        let g = AntennaGeometry::new(2, 4, 16);
        let mut t = HeatmapTransform::new(g, GridConfig::default()).unwrap();
        let surface = t.range_azimuth(&ramp_samples(&g, 3, 4.0, 100.0));

        let row = surface.row(3);
        assert_eq!(argmax(row.iter().copied()), 27);
        assert!((row[27] - 800.0).abs() < 1e-6);
    }

    #[test]
    fn test_broadside_target_on_grid() {
        let g = AntennaGeometry::new(2, 4, 32);
        let config = GridConfig {
            range_idx_to_meters: 0.1,
            range_width: 1.0,
            range_depth: 2.0,
            grid_points_x: 21,
            grid_points_y: 21,
            ..GridConfig::default()
        };
        let mut t = HeatmapTransform::new(g, config).unwrap();
        let grid = t.apply(&ramp_samples(&g, 10, 0.0, 1000.0));

        let (peak, x, y) = grid.peak().unwrap();
        assert!((peak - 8000.0).abs() < 1e-6);
        assert!(x.abs() < 1e-9);
        assert!((y - 1.0).abs() < 1e-9);
        assert!((grid.values[[10, 10]] - 8000.0).abs() < 1e-6);
        assert!(grid.values.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_nearest_neighbour_ties() {
        let points = vec![(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)];
        let nn = nearest_neighbours(&points, &[0.4, 0.5, 0.9], &[0.0]);
        assert_eq!(nn, vec![0, 0, 1]);
    }

    #[test]
    fn test_invalid_config() {
        let g = AntennaGeometry::default();
        let bad = GridConfig {
            num_angle_bins: 63,
            ..GridConfig::default()
        };
        assert!(matches!(HeatmapTransform::new(g, bad), Err(ConfigError::AngleBins(63))));

        let bad = GridConfig {
            grid_points_y: 0,
            ..GridConfig::default()
        };
        assert!(HeatmapTransform::new(g, bad).is_err());

        let bad = GridConfig {
            range_depth: -1.0,
            ..GridConfig::default()
        };
        assert!(matches!(
            HeatmapTransform::new(g, bad),
            Err(ConfigError::Extent { name: "range_depth", .. })
        ));
    }
}
