//! This module contains the closed-form least-squares regressions used by the
//! guidance engines to extrapolate statistics against the objective value.
//!
//! Fitting never fails. Degenerate inputs produce a flat line rather than an
//! error, as a rough extrapolation is more useful to the engines than none.

use serde::Serialize;

/// A line `y = c0 + c1 * x` fitted by ordinary least squares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct LinearFit {
    /// The intercept.
    pub c0: f64,

    /// The slope.
    pub c1: f64,
}

impl LinearFit {
    /// Constructs a line from its coefficients.
    #[must_use]
    pub fn new(c0: f64, c1: f64) -> Self {
        Self { c0, c1 }
    }

    /// Constructs the horizontal line `y = value`.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(value, 0.0)
    }

    /// Fits a line through the `(x, y)` points.
    ///
    /// With no points the fit is `y = 0`. If the points do not determine a
    /// slope (a single point, or all points sharing an `x`), the slope is zero
    /// and the intercept is the mean of the `y` values.
    #[must_use]
    pub fn fit(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut n = 0.0;
        let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
        for (x, y) in points {
            n += 1.0;
            sum_x += x;
            sum_y += y;
            sum_xy += x * y;
            sum_xx += x * x;
        }

        if n == 0.0 {
            return Self::default();
        }

        let denominator = n * sum_xx - sum_x * sum_x;
        let c1 = if denominator.abs() <= f64::EPSILON * (n * sum_xx).abs().max(1.0) {
            0.0
        } else {
            (n * sum_xy - sum_x * sum_y) / denominator
        };
        let c0 = (sum_y - c1 * sum_x) / n;

        Self { c0, c1 }
    }

    /// Evaluates the line at `x`.
    #[must_use]
    pub fn at(&self, x: f64) -> f64 {
        self.c0 + self.c1 * x
    }
}

/// A pair of lines fitted separately to negative and non-negative `x` values,
/// used where the objective value changes meaning across zero.
///
/// When the data only has one sign, both halves are the same line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SplitFit {
    /// The line used for `x < 0`.
    pub negative: LinearFit,

    /// The line used for `x >= 0`.
    pub positive: LinearFit,

    /// Whether the two halves were fitted separately.
    pub split: bool,
}

impl SplitFit {
    /// Fits the `(x, y)` points, splitting on the sign of `x` when both signs
    /// are present.
    #[must_use]
    pub fn fit(points: &[(f64, f64)]) -> Self {
        let has_negative = points.iter().any(|(x, _)| *x < 0.0);
        let has_positive = points.iter().any(|(x, _)| *x >= 0.0);

        if has_negative && has_positive {
            let negative = LinearFit::fit(points.iter().copied().filter(|(x, _)| *x < 0.0));
            let positive = LinearFit::fit(points.iter().copied().filter(|(x, _)| *x >= 0.0));
            Self {
                negative,
                positive,
                split: true,
            }
        } else {
            let shared = LinearFit::fit(points.iter().copied());
            Self {
                negative: shared,
                positive: shared,
                split:    false,
            }
        }
    }

    /// Evaluates the half of the fit that applies to `x`.
    #[must_use]
    pub fn at(&self, x: f64) -> f64 {
        if x < 0.0 {
            self.negative.at(x)
        } else {
            self.positive.at(x)
        }
    }
}
