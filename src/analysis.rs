/// End-of-run reporting over the aligned series.
///
/// Everything here consumes only [`AlignedObservation`]s. The persisted
/// stores remain the real analysis surface; this summary exists so a run's
/// log already answers the first question anyone asks of the data.
use crate::logging::{self, DataSource};
use crate::model::AlignedObservation;
use crate::pollutants::{self, POLLUTANT_REGISTRY, Pollutant};

// ---------------------------------------------------------------------------
// Scalar statistics
// ---------------------------------------------------------------------------

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

/// Pearson correlation of two equal-length series. `None` when the series
/// are shorter than two points or either side has zero variance.
pub fn correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some(cov / denom)
}

/// Least-squares fit of `y` against `x`. `None` when the series are
/// shorter than two points or `x` has zero variance.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        cov += dx * (yi - mean_y);
        var_x += dx * dx;
    }

    if var_x == 0.0 {
        return None;
    }
    let slope = cov / var_x;
    Some(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

// ---------------------------------------------------------------------------
// Per-pollutant associations
// ---------------------------------------------------------------------------

/// How one pollutant moves with the monthly affected area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollutantAssociation {
    pub pollutant: Pollutant,
    /// Months where both the area and this pollutant carry a value.
    pub months: usize,
    pub correlation: Option<f64>,
    /// Concentration regressed on area.
    pub fit: Option<LinearFit>,
}

/// Computes the association of every registry pollutant with the monthly
/// affected area, pairwise over the months where the pollutant is
/// non-missing.
pub fn associations(observations: &[AlignedObservation]) -> Vec<PollutantAssociation> {
    POLLUTANT_REGISTRY
        .iter()
        .map(|spec| {
            let (areas, concentrations): (Vec<f64>, Vec<f64>) = observations
                .iter()
                .filter_map(|obs| obs.pollution.get(spec.pollutant).map(|v| (obs.area_ha, v)))
                .unzip();
            PollutantAssociation {
                pollutant: spec.pollutant,
                months: areas.len(),
                correlation: correlation(&areas, &concentrations),
                fit: linear_fit(&areas, &concentrations),
            }
        })
        .collect()
}

/// Logs the end-of-run summary: aligned coverage plus one line per
/// pollutant.
pub fn log_summary(observations: &[AlignedObservation]) {
    let Some((first, last)) = observations.first().zip(observations.last()) else {
        logging::warn(
            DataSource::System,
            Some("analysis"),
            "no aligned months, skipping the summary",
        );
        return;
    };

    logging::info(
        DataSource::System,
        Some("analysis"),
        &format!(
            "{} aligned months, {} through {}",
            observations.len(),
            first.month,
            last.month
        ),
    );

    for assoc in associations(observations) {
        let name = pollutants::spec_for(assoc.pollutant).canonical_name;
        let line = match (assoc.correlation, assoc.fit) {
            (Some(r), Some(fit)) => format!(
                "{}: r={:+.3} over {} months, slope {:+.5} per ha",
                name, r, assoc.months, fit.slope
            ),
            _ => format!("{}: insufficient data ({} months)", name, assoc.months),
        };
        logging::info(DataSource::System, Some("analysis"), &line);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
