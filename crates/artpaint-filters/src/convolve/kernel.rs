//! Fixed-point (Q15) convolution kernels.

use crate::buffer::{try_alloc, BufferError};

/// Number of fractional bits in a kernel weight.
pub const FIXED_SHIFT: u32 = 15;

/// Fixed-point representation of 1.0.
pub const FIXED_ONE: i32 = 1 << FIXED_SHIFT;

/// Kernel weight that a Gaussian tap must fall to at the kernel radius.
///
/// With `weight(i) = 2^(-p * i^2)` and `p = -ln(cutoff) / (r^2 * ln 2)`
/// the outermost tap is exactly `cutoff` of the centre tap.
pub const GAUSSIAN_CUTOFF: f64 = 0.004;

/// A symmetric 1-D convolution kernel with Q15 weights.
///
/// `weights` has `2 * radius + 1` entries that always sum to exactly
/// [`FIXED_ONE`]: the quantization residual is folded into the centre tap
/// so that a flat field is reproduced bit-for-bit.
///
/// Constructors allocate through the fallible allocator, so an absurd
/// radius comes back as [`BufferError::OutOfMemory`] instead of aborting.
///
/// # Example
///
/// ```
/// use artpaint_filters::Kernel;
///
/// let kernel = Kernel::gaussian(4.0).unwrap();
/// assert_eq!(kernel.radius(), 4);
/// assert_eq!(kernel.weights().iter().sum::<i32>(), 32768);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    radius: i32,
    weights: Vec<i32>,
}

/// Largest tap radius whose `2 * radius + 1` still fits an `i32`.
const MAX_TAP_RADIUS: usize = (i32::MAX as usize - 1) / 2;

impl Kernel {
    /// The one-tap kernel that leaves its input unchanged.
    pub fn identity() -> Self {
        Self {
            radius: 0,
            weights: vec![FIXED_ONE],
        }
    }

    /// Gaussian falloff reaching [`GAUSSIAN_CUTOFF`] at `radius`.
    ///
    /// Radii below 1 (and NaN) yield the identity kernel, making the blur
    /// a no-op rather than an error.
    pub fn gaussian(radius: f32) -> Result<Self, BufferError> {
        Self::gaussian_within(radius, MAX_TAP_RADIUS)
    }

    /// Like [`gaussian`](Self::gaussian), but with at most `reach` taps on
    /// each side. The falloff is still computed for the full `radius`; only
    /// the tails beyond `reach` are dropped before normalization.
    ///
    /// ```
    /// use artpaint_filters::Kernel;
    ///
    /// let kernel = Kernel::gaussian_within(1.0e9, 3).unwrap();
    /// assert_eq!(kernel.radius(), 3);
    /// ```
    pub fn gaussian_within(radius: f32, reach: usize) -> Result<Self, BufferError> {
        if radius.is_nan() || radius < 1.0 {
            return Ok(Self::identity());
        }
        // Saturating float conversion: infinity lands on `usize::MAX`.
        let r = (radius.floor() as usize).min(reach).min(MAX_TAP_RADIUS);
        let radius = radius as f64;
        let p = -GAUSSIAN_CUTOFF.ln() / (radius * radius * std::f64::consts::LN_2);

        let mut real = try_alloc(2 * r + 1, 0.0f64)?;
        for (tap, w) in real.iter_mut().enumerate() {
            let i = tap as f64 - r as f64;
            *w = (-p * i * i).exp2();
        }
        Self::from_real_weights(&real)
    }

    /// Uniform (box) kernel covering `2 * radius + 1` taps.
    pub fn box_filter(radius: i32) -> Result<Self, BufferError> {
        if radius < 1 {
            return Ok(Self::identity());
        }
        let taps = 2 * (radius as usize).min(MAX_TAP_RADIUS) + 1;
        Self::from_real_weights(&try_alloc(taps, 1.0f64)?)
    }

    /// Normalize arbitrary non-negative weights to sum 1.0 and quantize them
    /// to Q15, pushing the rounding residual into the centre tap.
    ///
    /// # Panics (debug only)
    ///
    /// Debug-asserts an odd number of taps and non-negative weights.
    pub fn from_real_weights(real: &[f64]) -> Result<Self, BufferError> {
        debug_assert!(real.len() % 2 == 1, "kernel needs an odd number of taps");
        debug_assert!(real.iter().all(|&w| w >= 0.0));

        let total: f64 = real.iter().sum();
        if real.is_empty() || total <= 0.0 {
            return Ok(Self::identity());
        }

        let mut weights = try_alloc(real.len(), 0i32)?;
        for (q, &w) in weights.iter_mut().zip(real) {
            *q = (w / total * FIXED_ONE as f64).round() as i32;
        }
        let center = weights.len() / 2;
        let residual = FIXED_ONE - weights.iter().sum::<i32>();
        weights[center] += residual;

        Ok(Self {
            radius: center as i32,
            weights,
        })
    }

    /// Number of taps on each side of the centre.
    #[inline]
    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// All `2 * radius + 1` weights, left to right.
    #[inline]
    pub fn weights(&self) -> &[i32] {
        &self.weights
    }

    /// Number of taps.
    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always false; a kernel has at least its centre tap.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// True for the one-tap kernel, which callers can skip entirely.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.radius == 0
    }
}
