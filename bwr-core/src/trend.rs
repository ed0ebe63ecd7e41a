use serde::{Deserialize, Serialize};

/// A server-computed linear fit of one point's series.
///
/// `mm_per_year` is taken as the server reports it. The time-step duration
/// behind it is not known to the client, so it is never recomputed here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendStatistic {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub mm_per_year: f64,
}

impl TrendStatistic {
    /// Check the fit is usable: finite fields and `r_squared` in `[0, 1]`.
    pub fn is_valid(&self) -> bool {
        self.slope.is_finite()
            && self.intercept.is_finite()
            && self.mm_per_year.is_finite()
            && (0.0..=1.0).contains(&self.r_squared)
    }
}
