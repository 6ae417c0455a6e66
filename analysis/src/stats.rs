use statrs::{
    distribution::{ContinuousCDF, StudentsT},
    statistics::Statistics,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

/// Per-group statistics of one value column
/// `std` and `ci` need at least two samples
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub ci: Option<Interval>,
}

impl Stats {
    pub fn from_samples(samples: &[f64], confidence: f64) -> Self {
        let count = samples.len();

        if count == 0 {
            return Self {
                count,
                mean: None,
                std: None,
                ci: None,
            };
        }

        let mean = samples.iter().mean();
        // unbiased (n - 1), NaN below two samples
        let std = Some(samples.iter().std_dev()).filter(|std| !std.is_nan());
        let ci = std.and_then(|std| t_interval(mean, std, count, confidence));

        Self {
            count,
            mean: Some(mean),
            std,
            ci,
        }
    }
}

/// two-sided Student-t interval around `mean`
pub fn t_interval(mean: f64, std: f64, count: usize, confidence: f64) -> Option<Interval> {
    if count < 2 {
        return None;
    }

    let distribution = StudentsT::new(0.0, 1.0, (count - 1) as f64).ok()?;
    let quantile = distribution.inverse_cdf(0.5 + confidence / 2.0);
    let half_width = quantile * std / (count as f64).sqrt();

    Some(Interval {
        lower: mean - half_width,
        upper: mean + half_width,
    })
}
