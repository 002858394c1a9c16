//! Maps a plan duration and a start instant to the subscription's end instant.

use chrono::{DateTime, Duration, Months, Utc};

use crate::{entities::subscription_plan::PlanDuration, errors::ServiceError};

/// Computes when a subscription period started at `start` ends.
///
/// Daily and weekly periods are fixed day offsets; monthly periods use
/// calendar arithmetic, preserving the day-of-month and clamping to the last
/// valid day when the next month is shorter.
pub fn compute_end(
    start: DateTime<Utc>,
    duration: PlanDuration,
) -> Result<DateTime<Utc>, ServiceError> {
    let end = match duration {
        PlanDuration::Daily => start.checked_add_signed(Duration::days(1)),
        PlanDuration::Weekly => start.checked_add_signed(Duration::days(7)),
        PlanDuration::Monthly => start.checked_add_months(Months::new(1)),
    };

    end.ok_or_else(|| {
        ServiceError::InternalError(format!(
            "subscription end out of representable range (start {start}, {duration})"
        ))
    })
}
