use storepulse_common::ReviewRecord;

/// Local sentiment aggregated from buyer reviews.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalAggregate {
    /// 0..100 scale, `None` when there are no reviews.
    pub score: Option<f64>,
    pub count: usize,
    /// Mean star rating, 0.0 when there are no reviews.
    pub average_rating: f64,
}

/// Compute local sentiment from 1-5 star reviews.
pub fn aggregate(reviews: &[ReviewRecord]) -> LocalAggregate {
    if reviews.is_empty() {
        return LocalAggregate {
            score: None,
            count: 0,
            average_rating: 0.0,
        };
    }

    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    let average_rating = f64::from(sum) / reviews.len() as f64;

    LocalAggregate {
        score: Some(average_rating / 5.0 * 100.0),
        count: reviews.len(),
        average_rating,
    }
}
