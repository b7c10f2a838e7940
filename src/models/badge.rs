//! Badge awards derived from streak metrics.
//!
//! Badges are stateless: every call re-evaluates all thresholds against the
//! current metrics, so the awarded set needs no storage and can never drift
//! out of sync with the activity log. The set only grows as metrics grow.
//! Responses carry badges as their display labels.

use std::fmt;

use crate::models::StreakReport;

/// A named achievement unlocked by crossing a completed-day or
/// streak-length threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    /// First completed day
    Welcome,
    /// 7 completed days
    Beginner,
    /// 30 completed days
    ConsistentPlayer,
    /// Every full month of completed days (n = days / 30)
    Month(u32),
    /// A 30-day streak
    Monthly,
    /// 365 completed days, or a 365-day streak
    YearlySportsFreak,
}

impl Badge {
    /// Evaluate all thresholds against a streak report.
    ///
    /// Awards are cumulative: a user qualifying for several badges holds
    /// all of them at once, ordered from oldest threshold to newest.
    pub fn evaluate(report: &StreakReport) -> Vec<Badge> {
        let total = report.total_completed_days;
        let longest = report.longest_streak;

        let mut badges = Vec::new();

        if total >= 1 {
            badges.push(Badge::Welcome);
        }
        if total >= 7 {
            badges.push(Badge::Beginner);
        }
        if total >= 30 {
            badges.push(Badge::ConsistentPlayer);
        }
        if total > 0 && total % 30 == 0 {
            badges.push(Badge::Month(total / 30));
        }
        if longest >= 30 {
            badges.push(Badge::Monthly);
        }
        if total >= 365 || longest >= 365 {
            badges.push(Badge::YearlySportsFreak);
        }

        badges
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Badge::Welcome => write!(f, "Welcome Batch"),
            Badge::Beginner => write!(f, "Beginner Batch"),
            Badge::ConsistentPlayer => write!(f, "Consistent Player Batch"),
            Badge::Month(n) => write!(f, "Month {} Batch", n),
            Badge::Monthly => write!(f, "Monthly Batch"),
            Badge::YearlySportsFreak => write!(f, "Yearly Sports Freak Batch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(total: u32, longest: u32) -> StreakReport {
        StreakReport {
            current_streak: longest.min(total),
            longest_streak: longest,
            total_completed_days: total,
            missing_days: 0,
        }
    }

    #[test]
    fn test_no_activity_no_badges() {
        assert!(Badge::evaluate(&report(0, 0)).is_empty());
    }

    #[test]
    fn test_first_day_welcome() {
        assert_eq!(Badge::evaluate(&report(1, 1)), vec![Badge::Welcome]);
    }

    #[test]
    fn test_beginner_at_seven() {
        let before = Badge::evaluate(&report(6, 3));
        let after = Badge::evaluate(&report(7, 3));

        assert!(!before.contains(&Badge::Beginner));
        assert!(after.contains(&Badge::Beginner));
        // Monotone: nothing held before disappears
        for badge in &before {
            assert!(after.contains(badge), "lost {:?}", badge);
        }
    }

    #[test]
    fn test_thirty_days_awards_stack() {
        let badges = Badge::evaluate(&report(30, 5));
        assert_eq!(
            badges,
            vec![
                Badge::Welcome,
                Badge::Beginner,
                Badge::ConsistentPlayer,
                Badge::Month(1),
            ]
        );
    }

    #[test]
    fn test_month_badge_multiples() {
        assert!(Badge::evaluate(&report(60, 10)).contains(&Badge::Month(2)));
        assert!(Badge::evaluate(&report(90, 10)).contains(&Badge::Month(3)));
        assert!(!Badge::evaluate(&report(61, 10))
            .iter()
            .any(|b| matches!(b, Badge::Month(_))));
    }

    #[test]
    fn test_monthly_from_streak_length() {
        let badges = Badge::evaluate(&report(40, 30));
        assert!(badges.contains(&Badge::Monthly));

        let badges = Badge::evaluate(&report(40, 29));
        assert!(!badges.contains(&Badge::Monthly));
    }

    #[test]
    fn test_yearly_from_either_metric() {
        assert!(Badge::evaluate(&report(365, 10)).contains(&Badge::YearlySportsFreak));
        assert!(Badge::evaluate(&report(400, 365)).contains(&Badge::YearlySportsFreak));
        // Not duplicated when both thresholds hit
        let both = Badge::evaluate(&report(365, 365));
        assert_eq!(
            both.iter()
                .filter(|b| **b == Badge::YearlySportsFreak)
                .count(),
            1
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(Badge::Welcome.to_string(), "Welcome Batch");
        assert_eq!(Badge::Month(4).to_string(), "Month 4 Batch");
        assert_eq!(
            Badge::YearlySportsFreak.to_string(),
            "Yearly Sports Freak Batch"
        );
    }
}
