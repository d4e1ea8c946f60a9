/// Score after a given round, as plotted on the results chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScorePoint {
    pub round: f64,
    pub score: f64,
}

impl ScorePoint {
    pub fn new(round: u32, score: u64) -> Self {
        Self {
            round: f64::from(round),
            score: score as f64,
        }
    }
}

impl From<ScorePoint> for (f64, f64) {
    fn from(p: ScorePoint) -> Self {
        (p.round, p.score)
    }
}
