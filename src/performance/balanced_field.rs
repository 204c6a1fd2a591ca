use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Branch, PerformanceError, Result};
use crate::performance::config::BalancedFieldSettings;
use crate::performance::intersection::{curve_intersection, linspace, PiecewiseLinear};
use crate::performance::takeoff::{run_aborted_takeoff, run_continued_takeoff, TakeoffCase};

/// Distances of the two branches for one failure speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FailureSpeedSweepPoint {
    pub failure_speed: f64,      // m/s
    pub continued_distance: f64, // m
    pub aborted_distance: f64,   // m
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancedField {
    /// Decision speed, m/s
    pub v1: f64,
    /// Balanced field length, m
    pub field_length: f64,
    pub sweep: Vec<FailureSpeedSweepPoint>,
}

/// Decision speed and balanced field length.
///
/// Failure speeds are swept from `lower_speed_factor * Vs` to the rotation
/// speed. Every continued and aborted run is independent and they execute in
/// parallel; results are collected in sweep order, so the outcome does not
/// depend on scheduling.
pub fn compute_balanced_field_length(
    case: &TakeoffCase<'_>,
    settings: &BalancedFieldSettings,
) -> Result<BalancedField> {
    settings.validate()?;
    let speeds = case.validate(None)?;
    let v_min = settings.lower_speed_factor * speeds.stall;
    let v_max = speeds.rotation;
    if v_min >= v_max {
        return Err(PerformanceError::config(format!(
            "sweep lower bound {:.3} m/s is not below the rotation speed {:.3} m/s",
            v_min, v_max
        )));
    }

    let mut continued_case = *case;
    continued_case.convergence = if settings.pitch_convergence {
        Some(case.convergence.unwrap_or_default())
    } else {
        None
    };
    let mut aborted_case = *case;
    aborted_case.convergence = None;

    let failure_speeds = linspace(v_min, v_max, settings.sweep_points);
    let runs: Vec<(f64, Branch)> = failure_speeds
        .iter()
        .flat_map(|&vf| [(vf, Branch::Continue), (vf, Branch::Abort)])
        .collect();

    let distances = runs
        .par_iter()
        .map(|&(vf, branch)| {
            let result = match branch {
                Branch::Continue => run_continued_takeoff(&continued_case, Some(vf)),
                Branch::Abort => run_aborted_takeoff(&aborted_case, vf),
            };
            result
                .map(|r| r.summary.ground_distance)
                .map_err(|source| PerformanceError::SweepRun { failure_speed: vf, branch, source: Box::new(source) })
        })
        .collect::<Vec<Result<f64>>>()
        .into_iter()
        .collect::<Result<Vec<f64>>>()?;

    let sweep: Vec<FailureSpeedSweepPoint> = failure_speeds
        .iter()
        .zip(distances.chunks_exact(2))
        .map(|(&failure_speed, d)| FailureSpeedSweepPoint {
            failure_speed,
            continued_distance: d[0],
            aborted_distance: d[1],
        })
        .collect();
    for p in &sweep {
        log::debug!(
            "V_EF = {:.2} m/s: continued {:.1} m, aborted {:.1} m",
            p.failure_speed,
            p.continued_distance,
            p.aborted_distance
        );
    }

    let continued: Vec<f64> = sweep.iter().map(|p| p.continued_distance).collect();
    let aborted: Vec<f64> = sweep.iter().map(|p| p.aborted_distance).collect();
    let Some(crossing) = curve_intersection(&failure_speeds, &continued, &aborted, settings.resample_points)
    else {
        return Err(PerformanceError::NoIntersectionFound {
            v_min,
            v_max,
            dominant: dominant_branch(&failure_speeds, &continued, &aborted),
        });
    };

    log::info!("balanced field: V1 = {:.2} m/s, length = {:.1} m", crossing.x, crossing.y);
    Ok(BalancedField { v1: crossing.x, field_length: crossing.y, sweep })
}

/// Branch whose fitted distance is longer on average over the sweep.
fn dominant_branch(xs: &[f64], continued: &[f64], aborted: &[f64]) -> Branch {
    let mean = |ys: &[f64]| match PiecewiseLinear::new(xs, ys) {
        Some(f) => {
            let grid = linspace(xs[0], xs[xs.len() - 1], 64);
            f.resample(&grid).iter().sum::<f64>() / grid.len() as f64
        }
        None => ys.iter().sum::<f64>() / ys.len().max(1) as f64,
    };
    if mean(continued) >= mean(aborted) {
        Branch::Continue
    } else {
        Branch::Abort
    }
}
