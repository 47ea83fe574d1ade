//! # Ratings
//!
//! Star ratings from 1 to 5, one row per submission.
//!
//! The server owns the truth: averages come from `AVG()` over every stored row.
//! Clients update their cached aggregate optimistically with a running average
//! and then overwrite it with whatever the server answers.
//!
//! A school nobody has rated yet lists with [`DEFAULT_AVERAGE`] and a count of
//! zero. Since the count is zero, the default carries no weight in the first
//! optimistic update.
use serde_json::Value;
use thiserror::Error;

use crate::models::RatingSummary;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const DEFAULT_AVERAGE: f64 = 3.0;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Rating must be a number between 1 and 5")]
pub struct InvalidRating;

/// Accepts a JSON number or numeric string in `[1, 5]` and rounds it to the
/// nearest whole star, halves rounding up.
pub fn parse_rating(value: &Value) -> Result<u8, InvalidRating> {
    let numeric = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or(InvalidRating)?;

    if !numeric.is_finite() || numeric < f64::from(MIN_RATING) || numeric > f64::from(MAX_RATING)
    {
        return Err(InvalidRating);
    }

    Ok(numeric.round() as u8)
}

pub fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Folds one new rating into a cached aggregate without asking the server.
pub fn optimistic_average(previous: RatingSummary, rating: u8) -> RatingSummary {
    let previous_count = previous.rating_count.max(0);
    let rating_count = previous_count + 1;
    let total = previous.avg_rating * previous_count as f64 + f64::from(rating);

    RatingSummary {
        avg_rating: round_two(total / rating_count as f64),
        rating_count,
    }
}

/// Aggregate over a complete set of ratings, `None` when there are none.
///
/// Rounded in exact hundredths, halves up, the way `ROUND(AVG(..), 2)` treats
/// the decimal MySQL averages into.
pub fn summarize(ratings: &[u8]) -> Option<RatingSummary> {
    if ratings.is_empty() {
        return None;
    }

    let count = ratings.len() as u64;
    let total: u64 = ratings.iter().map(|&r| u64::from(r)).sum();
    let hundredths = (total * 200 + count) / (2 * count);

    Some(RatingSummary {
        avg_rating: hundredths as f64 / 100.0,
        rating_count: count as i64,
    })
}

/// Listing aggregate, falling back to [`DEFAULT_AVERAGE`] for unrated schools.
pub fn listing_summary(ratings: &[u8]) -> RatingSummary {
    summarize(ratings).unwrap_or(RatingSummary {
        avg_rating: DEFAULT_AVERAGE,
        rating_count: 0,
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!(1), 1)]
    #[case(json!(5), 5)]
    #[case(json!(4.5), 5)]
    #[case(json!(2.49), 2)]
    #[case(json!("3"), 3)]
    #[case(json!(" 4 "), 4)]
    fn test_parse_rating_accepts(#[case] value: Value, #[case] expected: u8) {
        assert_eq!(parse_rating(&value), Ok(expected));
    }

    #[rstest]
    #[case(json!(0))]
    #[case(json!(0.99))]
    #[case(json!(5.01))]
    #[case(json!(-3))]
    #[case(json!("five"))]
    #[case(json!(""))]
    #[case(json!(null))]
    #[case(json!(true))]
    #[case(json!([4]))]
    fn test_parse_rating_rejects(#[case] value: Value) {
        assert_eq!(parse_rating(&value), Err(InvalidRating));
    }

    #[test]
    fn test_invalid_rating_message() {
        assert_eq!(
            InvalidRating.to_string(),
            "Rating must be a number between 1 and 5"
        );
    }

    #[test]
    fn test_round_two() {
        assert_eq!(round_two(3.333_333), 3.33);
        assert_eq!(round_two(4.666_666), 4.67);
        assert_eq!(round_two(2.0), 2.0);
    }

    #[test]
    fn test_optimistic_first_rating_ignores_default() {
        let unrated = RatingSummary {
            avg_rating: DEFAULT_AVERAGE,
            rating_count: 0,
        };

        let updated = optimistic_average(unrated, 5);

        assert_eq!(updated.avg_rating, 5.0);
        assert_eq!(updated.rating_count, 1);
    }

    #[test]
    fn test_optimistic_running_average() {
        let current = RatingSummary {
            avg_rating: 4.0,
            rating_count: 2,
        };

        let updated = optimistic_average(current, 1);

        assert_eq!(updated.avg_rating, 3.0);
        assert_eq!(updated.rating_count, 3);
    }

    #[test]
    fn test_optimistic_matches_server_for_exact_history() {
        let history = [5, 4, 4];
        let mut running = listing_summary(&[]);
        for rating in history {
            running = optimistic_average(running, rating);
        }

        assert_eq!(Some(running), summarize(&history));
    }

    #[test]
    fn test_summarize_rounds_exact_halves_up() {
        let mut ratings = vec![1u8; 199];
        ratings.push(2);

        let summary = summarize(&ratings).unwrap();

        assert_eq!(summary.avg_rating, 1.01);
        assert_eq!(summary.rating_count, 200);
    }

    #[rstest]
    #[case(&[5, 4, 4], 4.33)]
    #[case(&[5, 5, 4], 4.67)]
    #[case(&[1, 2], 1.5)]
    #[case(&[3], 3.0)]
    fn test_summarize_averages(#[case] ratings: &[u8], #[case] expected: f64) {
        assert_eq!(summarize(ratings).unwrap().avg_rating, expected);
    }

    #[test]
    fn test_listing_summary_defaults() {
        assert_eq!(
            listing_summary(&[]),
            RatingSummary {
                avg_rating: 3.0,
                rating_count: 0,
            }
        );
        assert_eq!(listing_summary(&[1, 2]).avg_rating, 1.5);
        assert_eq!(summarize(&[]), None);
    }
}
