//! Curve fitting and crossing search on sampled data.

/// `n` evenly spaced values from `a` to `b` inclusive.
pub fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![a],
        _ => {
            let dx = (b - a) / (n - 1) as f64;
            (0..n).map(|i| if i == n - 1 { b } else { a + dx * i as f64 }).collect()
        }
    }
}

/// Piecewise-linear interpolant through points sorted by abscissa.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseLinear {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl PiecewiseLinear {
    /// `None` unless both slices have the same length, at least two points
    /// and strictly increasing abscissae.
    pub fn new(xs: &[f64], ys: &[f64]) -> Option<Self> {
        if xs.len() != ys.len() || xs.len() < 2 || xs.windows(2).any(|w| !(w[1] > w[0])) {
            return None;
        }
        Some(Self { xs: xs.to_vec(), ys: ys.to_vec() })
    }

    /// Value at `x`, held constant beyond the end points.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }
        let i = self.xs.partition_point(|&xi| xi <= x);
        let (x0, x1) = (self.xs[i - 1], self.xs[i]);
        let (y0, y1) = (self.ys[i - 1], self.ys[i]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    pub fn resample(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|&x| self.eval(x)).collect()
    }
}

/// Point where two curves meet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub x: f64,
    pub y: f64,
}

/// First sign change of `a - b` along a shared grid, refined by linear
/// interpolation inside the bracketing cell.
pub fn first_crossing(grid: &[f64], a: &[f64], b: &[f64]) -> Option<Crossing> {
    let n = grid.len().min(a.len()).min(b.len());
    let diff = |i: usize| a[i] - b[i];
    for i in 0..n {
        let d1 = diff(i);
        if d1 == 0.0 {
            return Some(Crossing { x: grid[i], y: a[i] });
        }
        if i == 0 {
            continue;
        }
        let d0 = diff(i - 1);
        if d0 * d1 < 0.0 {
            let w = d0 / (d0 - d1);
            return Some(Crossing {
                x: grid[i - 1] + w * (grid[i] - grid[i - 1]),
                y: a[i - 1] + w * (a[i] - a[i - 1]),
            });
        }
    }
    None
}

/// Fit both point sets, resample onto `resample_points` values spanning the
/// abscissae and return their first crossing.
pub fn curve_intersection(xs: &[f64], a: &[f64], b: &[f64], resample_points: usize) -> Option<Crossing> {
    let fa = PiecewiseLinear::new(xs, a)?;
    let fb = PiecewiseLinear::new(xs, b)?;
    let grid = linspace(xs[0], xs[xs.len() - 1], resample_points);
    first_crossing(&grid, &fa.resample(&grid), &fb.resample(&grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linspace_hits_both_ends() {
        let g = linspace(50.0, 63.0, 4);
        assert_eq!(g.len(), 4);
        assert_eq!(g[0], 50.0);
        assert_eq!(g[3], 63.0);
        assert_relative_eq!(g[1], 50.0 + 13.0 / 3.0);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
    }

    #[test]
    fn interpolant_rejects_bad_input() {
        assert!(PiecewiseLinear::new(&[0.0], &[1.0]).is_none());
        assert!(PiecewiseLinear::new(&[0.0, 1.0], &[1.0]).is_none());
        assert!(PiecewiseLinear::new(&[1.0, 1.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn interpolant_holds_ends() {
        let f = PiecewiseLinear::new(&[0.0, 1.0, 3.0], &[0.0, 2.0, 0.0]).unwrap();
        assert_eq!(f.eval(-1.0), 0.0);
        assert_eq!(f.eval(5.0), 0.0);
        assert_relative_eq!(f.eval(0.5), 1.0);
        assert_relative_eq!(f.eval(2.0), 1.0);
    }

    #[test]
    fn crossing_of_opposite_trends() {
        // continued falls, aborted rises, like a balanced-field sweep
        let xs = [30.0, 40.0, 50.0, 60.0];
        let falling = [2000.0, 1800.0, 1600.0, 1400.0];
        let rising = [400.0, 800.0, 1200.0, 1600.0];
        let c = curve_intersection(&xs, &falling, &rising, 1000).unwrap();
        // 2000 - 20 (x - 30) = 400 + 40 (x - 30)  =>  x = 30 + 1600 / 60
        assert_relative_eq!(c.x, 30.0 + 1600.0 / 60.0, epsilon = 1e-9);
        assert_relative_eq!(c.y, 2000.0 - 20.0 * (c.x - 30.0), epsilon = 1e-9);
    }

    #[test]
    fn parallel_curves_never_cross() {
        let xs = [0.0, 1.0, 2.0];
        assert!(curve_intersection(&xs, &[3.0, 2.0, 1.0], &[1.0, 0.5, 0.0], 100).is_none());
    }

    #[test]
    fn touching_at_a_grid_node_counts() {
        let grid = [0.0, 1.0, 2.0];
        let c = first_crossing(&grid, &[2.0, 1.0, 0.0], &[0.0, 1.0, 2.0]).unwrap();
        assert_eq!(c, Crossing { x: 1.0, y: 1.0 });
    }
}
