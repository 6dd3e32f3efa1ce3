//! Closed-form alpha matting
//!
//! Implements the matting Laplacian of
//!
//! **"A Closed-Form Solution to Natural Image Matting"**
//! Levin, Lischinski, Weiss. IEEE TPAMI 30(2), 2008.
//!
//! Alpha is assumed to be a local affine function of the color inside every
//! small window, `α_i ≈ a_kᵀ I_i + b_k`, which yields a quadratic cost
//! `αᵀ L α`. The trimap pins the known pixels through a soft constraint, and
//! the unknown pixels come from solving
//!
//! ```text
//! (L + λ D) α = λ D t
//! ```
//!
//! where `D` is diagonal with 1 on known pixels and `t` is 1 on foreground.
//!
//! `L` is never materialized. Following He, Sun and Tang, "Fast Matting Using
//! Large Kernel Matting Laplacian Matrices" (CVPR 2010), the product `L p`
//! is evaluated with a handful of box filters:
//!
//! ```text
//! a_k = Δ_k⁻¹ (mean_k(I p) - μ_k mean_k(p))      Δ_k = Σ_k + ε / |w_k| · U
//! b_k = mean_k(p) - a_kᵀ μ_k
//! (L p)_i = Σ_{k ∋ i} (p_i - a_kᵀ I_i - b_k)
//! ```
//!
//! The system is solved with Jacobi-preconditioned conjugate gradient.

use crate::cutout::box_filter::{box_mean, window_area};
use crate::error::SolverError;
use crate::Image;
use image::{Luma, Rgb};
use itertools::izip;

/// Trimap values above this are treated as definite foreground
const FOREGROUND_LEVEL: f32 = 0.9;
/// Trimap values below this are treated as definite background
const BACKGROUND_LEVEL: f32 = 0.1;

/// Estimates an alpha matte from an image and a trimap
///
/// Both inputs are normalized to `[0, 1]`. Implementations report
/// value-domain problems (degenerate trimaps, unstable systems) as
/// [`SolverError`] instead of panicking, so that callers can fall back to a
/// cheaper cutout.
pub trait AlphaEstimator {
    fn estimate_alpha(
        &self,
        image: &Image<Rgb<f32>>,
        trimap: &Image<Luma<f32>>,
    ) -> Result<Image<Luma<f32>>, SolverError>;
}

/// Closed-form matting solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedFormAlpha {
    /// Regularization of the per-window color covariance
    pub epsilon: f32,
    /// Window radius; 1 gives the classic 3x3 windows
    pub radius: u32,
    /// Weight of the trimap constraint
    pub lambda: f32,
    /// Upper bound on conjugate gradient iterations
    pub max_iterations: usize,
    /// Relative residual at which conjugate gradient stops
    pub tolerance: f32,
}

impl Default for ClosedFormAlpha {
    fn default() -> Self {
        Self {
            epsilon: 1e-7,
            radius: 1,
            lambda: 100.0,
            max_iterations: 10_000,
            tolerance: 1e-6,
        }
    }
}

impl ClosedFormAlpha {
    #[must_use]
    pub const fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    #[must_use]
    pub const fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    #[must_use]
    pub const fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda;
        self
    }

    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl AlphaEstimator for ClosedFormAlpha {
    fn estimate_alpha(
        &self,
        image: &Image<Rgb<f32>>,
        trimap: &Image<Luma<f32>>,
    ) -> Result<Image<Luma<f32>>, SolverError> {
        if image.dimensions() != trimap.dimensions() {
            return Err(SolverError::DimensionMismatch {
                image: image.dimensions(),
                trimap: trimap.dimensions(),
            });
        }
        let (width, height) = image.dimensions();

        let (known, target) = split_trimap(trimap)?;

        let laplacian = MattingLaplacian::new(image, self.radius, f64::from(self.epsilon))?;

        let lambda = f64::from(self.lambda);
        let weight: Vec<f64> = known.iter().map(|&k| if k { lambda } else { 0.0 }).collect();
        let rhs: Vec<f64> = izip!(&weight, &target).map(|(w, t)| w * t).collect();
        let inverse_diagonal: Vec<f64> = izip!(&laplacian.area, &weight)
            .map(|(a, w)| 1.0 / (a + w))
            .collect();
        let initial: Vec<f64> = trimap.as_raw().iter().map(|&v| f64::from(v)).collect();

        let system = |x: &[f64]| -> Result<Vec<f64>, SolverError> {
            let lx = laplacian.apply(x)?;
            Ok(izip!(lx, &weight, x).map(|(l, w, x)| l + w * x).collect())
        };

        let solution = conjugate_gradient(
            system,
            &rhs,
            initial,
            &inverse_diagonal,
            self.max_iterations,
            f64::from(self.tolerance),
        )?;

        if solution.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NonFinite);
        }

        let alpha = solution
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0) as f32)
            .collect();
        Image::from_raw(width, height, alpha).ok_or(SolverError::NonFinite)
    }
}

/// Splits a normalized trimap into the known-pixel flags and their targets
fn split_trimap(trimap: &Image<Luma<f32>>) -> Result<(Vec<bool>, Vec<f64>), SolverError> {
    let mut has_foreground = false;
    let mut has_background = false;
    let mut has_unknown = false;

    let (known, target) = trimap
        .as_raw()
        .iter()
        .map(|&v| {
            if v > FOREGROUND_LEVEL {
                has_foreground = true;
                (true, 1.0)
            } else if v < BACKGROUND_LEVEL {
                has_background = true;
                (true, 0.0)
            } else {
                has_unknown = true;
                (false, 0.0)
            }
        })
        .unzip();

    if !has_foreground {
        return Err(SolverError::NoForeground);
    }
    if !has_background {
        return Err(SolverError::NoBackground);
    }
    if !has_unknown {
        return Err(SolverError::NoUnknownRegion);
    }

    Ok((known, target))
}

/// Matrix-free matting Laplacian over one image
struct MattingLaplacian {
    width: u32,
    height: u32,
    radius: u32,
    channels: [Vec<f64>; 3],
    means: [Vec<f64>; 3],
    /// Upper triangle of `Δ_k⁻¹`: xx, xy, xz, yy, yz, zz
    inverse: Vec<[f64; 6]>,
    /// Number of windows containing each pixel
    area: Vec<f64>,
}

impl MattingLaplacian {
    fn new(image: &Image<Rgb<f32>>, radius: u32, epsilon: f64) -> Result<Self, SolverError> {
        let (width, height) = image.dimensions();
        let channels: [Vec<f64>; 3] = [0usize, 1, 2].map(|c| {
            image
                .pixels()
                .map(|p| f64::from(p[c]))
                .collect::<Vec<f64>>()
        });
        let area: Vec<f64> = window_area(width, height, radius)
            .as_raw()
            .iter()
            .map(|&v| f64::from(v))
            .collect();

        let mean = |plane: &[f64]| box_mean(plane, width, height, radius);
        let product =
            |a: &[f64], b: &[f64]| -> Vec<f64> { izip!(a, b).map(|(x, y)| x * y).collect() };

        let means = [
            mean(&channels[0])?,
            mean(&channels[1])?,
            mean(&channels[2])?,
        ];

        let [r, g, b] = &channels;
        let second_moments = [
            mean(&product(r, r))?,
            mean(&product(r, g))?,
            mean(&product(r, b))?,
            mean(&product(g, g))?,
            mean(&product(g, b))?,
            mean(&product(b, b))?,
        ];

        let inverse = (0..area.len())
            .map(|k| {
                let [mr, mg, mb] = [means[0][k], means[1][k], means[2][k]];
                let regularization = epsilon / area[k];
                let covariance = [
                    second_moments[0][k] - mr * mr + regularization,
                    second_moments[1][k] - mr * mg,
                    second_moments[2][k] - mr * mb,
                    second_moments[3][k] - mg * mg + regularization,
                    second_moments[4][k] - mg * mb,
                    second_moments[5][k] - mb * mb + regularization,
                ];
                invert_symmetric_3x3(covariance)
            })
            .collect::<Result<Vec<_>, SolverError>>()?;

        Ok(Self {
            width,
            height,
            radius,
            channels,
            means,
            inverse,
            area,
        })
    }

    fn mean(&self, plane: &[f64]) -> Result<Vec<f64>, SolverError> {
        Ok(box_mean(plane, self.width, self.height, self.radius)?)
    }

    /// Computes `L p`
    fn apply(&self, p: &[f64]) -> Result<Vec<f64>, SolverError> {
        let [r, g, b] = &self.channels;
        let p_mean = self.mean(p)?;
        let weighted =
            |channel: &[f64]| -> Vec<f64> { izip!(channel, p).map(|(i, p)| i * p).collect() };
        let ip_mean = [
            self.mean(&weighted(r))?,
            self.mean(&weighted(g))?,
            self.mean(&weighted(b))?,
        ];

        let n = p.len();
        let mut a = [vec![0.0; n], vec![0.0; n], vec![0.0; n]];
        let mut offset = vec![0.0; n];

        for k in 0..n {
            let mu = [self.means[0][k], self.means[1][k], self.means[2][k]];
            let v = [
                ip_mean[0][k] - mu[0] * p_mean[k],
                ip_mean[1][k] - mu[1] * p_mean[k],
                ip_mean[2][k] - mu[2] * p_mean[k],
            ];
            let [xx, xy, xz, yy, yz, zz] = self.inverse[k];
            let ak = [
                xx * v[0] + xy * v[1] + xz * v[2],
                xy * v[0] + yy * v[1] + yz * v[2],
                xz * v[0] + yz * v[1] + zz * v[2],
            ];

            a[0][k] = ak[0];
            a[1][k] = ak[1];
            a[2][k] = ak[2];
            offset[k] = p_mean[k] - (ak[0] * mu[0] + ak[1] * mu[1] + ak[2] * mu[2]);
        }

        let a_mean = [self.mean(&a[0])?, self.mean(&a[1])?, self.mean(&a[2])?];
        let offset_mean = self.mean(&offset)?;

        // Σ over the windows containing i equals area_i times their mean
        Ok(izip!(
            p,
            &self.area,
            r,
            g,
            b,
            &a_mean[0],
            &a_mean[1],
            &a_mean[2],
            &offset_mean
        )
        .map(|(p, area, r, g, b, ar, ag, ab, bm)| area * (p - (ar * r + ag * g + ab * b + bm)))
        .collect())
    }
}

fn invert_symmetric_3x3(m: [f64; 6]) -> Result<[f64; 6], SolverError> {
    let [a, b, c, d, e, f] = m;

    let cofactor_xx = d * f - e * e;
    let cofactor_xy = c * e - b * f;
    let cofactor_xz = b * e - c * d;
    let determinant = a * cofactor_xx + b * cofactor_xy + c * cofactor_xz;

    if !determinant.is_finite() || determinant <= 0.0 {
        return Err(SolverError::NonFinite);
    }

    let inv = 1.0 / determinant;
    Ok([
        cofactor_xx * inv,
        cofactor_xy * inv,
        cofactor_xz * inv,
        (a * f - c * c) * inv,
        (b * c - a * e) * inv,
        (a * d - b * b) * inv,
    ])
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    izip!(a, b).map(|(x, y)| x * y).sum()
}

/// Preconditioned conjugate gradient for a symmetric positive definite system
fn conjugate_gradient<F>(
    system: F,
    rhs: &[f64],
    mut x: Vec<f64>,
    inverse_diagonal: &[f64],
    max_iterations: usize,
    tolerance: f64,
) -> Result<Vec<f64>, SolverError>
where
    F: Fn(&[f64]) -> Result<Vec<f64>, SolverError>,
{
    let rhs_norm = dot(rhs, rhs).sqrt();
    if rhs_norm == 0.0 {
        return Ok(vec![0.0; rhs.len()]);
    }

    let ax = system(&x)?;
    let mut residual: Vec<f64> = izip!(rhs, ax).map(|(b, ax)| b - ax).collect();
    let mut z: Vec<f64> = izip!(&residual, inverse_diagonal).map(|(r, m)| r * m).collect();
    let mut direction = z.clone();
    let mut rz = dot(&residual, &z);

    let mut relative = dot(&residual, &residual).sqrt() / rhs_norm;
    for _ in 0..max_iterations {
        if relative < tolerance {
            return Ok(x);
        }

        let ap = system(&direction)?;
        let pap = dot(&direction, &ap);
        if !pap.is_finite() || !rz.is_finite() {
            return Err(SolverError::NonFinite);
        }
        if pap <= 0.0 {
            break;
        }

        let step = rz / pap;
        for (xi, pi) in x.iter_mut().zip(&direction) {
            *xi += step * pi;
        }
        for (ri, api) in residual.iter_mut().zip(&ap) {
            *ri -= step * api;
        }

        z = izip!(&residual, inverse_diagonal).map(|(r, m)| r * m).collect();
        let rz_next = dot(&residual, &z);
        let beta = rz_next / rz;
        rz = rz_next;
        for (pi, zi) in direction.iter_mut().zip(&z) {
            *pi = zi + beta * *pi;
        }

        relative = dot(&residual, &residual).sqrt() / rhs_norm;
    }

    if relative < tolerance {
        Ok(x)
    } else {
        Err(SolverError::NotConverged {
            iterations: max_iterations,
            residual: relative as f32,
        })
    }
}
