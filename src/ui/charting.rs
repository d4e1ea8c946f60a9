/// Compute X (rounds) and Y (score) bounds for the results chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let highest_score = points.iter().map(|&(_, score)| score).fold(0.0, f64::max);
    let last_round = points.last().map_or(1.0, |&(round, _)| round).max(1.0);

    (last_round, highest_score.max(1.0).round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
