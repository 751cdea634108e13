//! Exception evaluation for reminder delivery
//!
//! Decides, for a candidate calendar date, whether an otherwise-due
//! occurrence is suppressed. Pure and reentrant; the delivery scheduler
//! calls it concurrently for many notifications at once.
//!
//! - **Version**: 1.0.0
//! - **Since**: 2.0.0

use chrono::{Datelike, NaiveDate, Weekday};

use super::ExclusionRule;

/// Whether `candidate` is suppressed by `rule`
///
/// True when the rule excludes weekends and the candidate falls on
/// Saturday or Sunday, or when any skip entry matches
/// `(candidate - day) mod frequency == 0` in whole days. The modular
/// test makes each entry periodic in both directions, so an anchor in
/// the future suppresses matching dates before it as well.
pub fn is_excluded(rule: &ExclusionRule, candidate: NaiveDate) -> bool {
    if rule.weekends && matches!(candidate.weekday(), Weekday::Sat | Weekday::Sun) {
        return true;
    }

    rule.skip_days.iter().any(|skip| {
        // frequency 0 can only arrive via a corrupted store; matches nothing
        skip.frequency > 0
            && (candidate - skip.day).num_days().rem_euclid(i64::from(skip.frequency)) == 0
    })
}
