//! District → tract → county aggregation
//!
//! Tracts take the allocated-population-weighted mean of their assigned
//! districts; counties take the population-weighted mean of their tracts,
//! with the untracted remainder of a county resolved by its coverage class.

pub mod county;
pub mod tract;

pub use county::{aggregate_counties};
pub use tract::aggregate_tracts;

/// Weighted mean of (value, weight) pairs
///
/// Falls back to the simple mean when the weights sum to zero, so areas with
/// no recorded population still contribute their spending.
pub(crate) fn weighted_mean(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.is_empty() {
        return None;
    }
    let total_weight: f64 = pairs.iter().map(|(_, w)| w).sum();
    if total_weight != 0.0 && total_weight.is_finite() {
        let weighted: f64 = pairs.iter().map(|(v, w)| v * w).sum();
        Some(weighted / total_weight)
    } else {
        Some(pairs.iter().map(|(v, _)| v).sum::<f64>() / pairs.len() as f64)
    }
}

/// Logical AND of flag vectors; an empty input gives `None`
pub(crate) fn and_flags<'a, I>(flags: I) -> Option<Vec<bool>>
where
    I: IntoIterator<Item = &'a [bool]>,
{
    flags.into_iter().fold(None, |acc: Option<Vec<bool>>, next| match acc {
        None => Some(next.to_vec()),
        Some(mut acc) => {
            for (a, n) in acc.iter_mut().zip(next) {
                *a &= *n;
            }
            Some(acc)
        }
    })
}
