//! Pure progression math: badge tiers and course completion.
//!
//! Nothing here touches the database, callers feed in sums and counts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BadgeTier {
    pub name: String,
    pub min_points: i64,
}

impl BadgeTier {
    pub fn new<S: Into<String>>(name: S, min_points: i64) -> Self {
        Self {
            name: name.into(),
            min_points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BadgeProgress {
    pub points: i64,
    pub current: Option<BadgeTier>,
    pub next: Option<BadgeTier>,
    /// Percentage toward `next`, in `[0, 100]`.
    pub progress: f64,
}

impl BadgeProgress {
    /// Locates `points` among `tiers`.
    ///
    /// The current tier is the highest threshold not exceeding `points`, the next tier is the
    /// one after it. Without a current tier the distance is measured from zero. Past the last
    /// tier the progress is 100, with no tiers at all it is 0.
    pub fn compute(points: i64, tiers: &[BadgeTier]) -> Self {
        let mut ordered: Vec<&BadgeTier> = tiers.iter().collect();
        ordered.sort_by_key(|t| t.min_points);

        let position = ordered.iter().rposition(|t| t.min_points <= points);
        let current = position.map(|i| ordered[i]);
        let next = match position {
            Some(i) => ordered.get(i + 1).copied(),
            None => ordered.first().copied(),
        };

        let progress = match (current, next) {
            (_, None) if ordered.is_empty() => 0.0,
            (_, None) => 100.0,
            (current, Some(next)) => {
                let floor = current.map(|c| c.min_points).unwrap_or(0);
                let span = next.min_points - floor;
                if span <= 0 {
                    100.0
                } else {
                    let ratio = (points - floor) as f64 / span as f64 * 100.0;
                    ratio.clamp(0.0, 100.0)
                }
            }
        };

        Self {
            points,
            current: current.cloned(),
            next: next.cloned(),
            progress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    YetToStart,
    InProgress,
    Completed,
}

impl ProgressStatus {
    pub fn from_percentage(percentage: i32) -> Self {
        match percentage {
            p if p >= 100 => Self::Completed,
            p if p <= 0 => Self::YetToStart,
            _ => Self::InProgress,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YetToStart => "YET_TO_START",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }
}

impl From<&str> for ProgressStatus {
    fn from(value: &str) -> Self {
        match value {
            "COMPLETED" => Self::Completed,
            "IN_PROGRESS" => Self::InProgress,
            _ => Self::YetToStart,
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-number completion, floored so 100 is reached only when every lesson is done.
pub fn completion_percentage(completed: i64, total: i64) -> i32 {
    if total <= 0 || completed <= 0 {
        return 0;
    }
    let completed = completed.min(total);
    (completed * 100 / total) as i32
}

/// Quiz pass check on integer percentages, `total == 0` never passes.
pub fn quiz_passed(score: i64, total: i64, pass_percentage: i32) -> bool {
    if total <= 0 {
        return false;
    }
    score * 100 >= i64::from(pass_percentage) * total
}

#[cfg(test)]
mod test {
    use super::*;

    fn tiers() -> Vec<BadgeTier> {
        vec![
            BadgeTier::new("Bronze", 100),
            BadgeTier::new("Silver", 300),
            BadgeTier::new("Gold", 600),
        ]
    }

    #[test]
    fn no_badges_defined() {
        let p = BadgeProgress::compute(250, &[]);
        assert_eq!(p.current, None);
        assert_eq!(p.next, None);
        assert_eq!(p.progress, 0.0);
    }

    #[test]
    fn below_first_threshold_measures_from_zero() {
        let p = BadgeProgress::compute(25, &tiers());
        assert_eq!(p.current, None);
        assert_eq!(p.next.unwrap().name, "Bronze");
        assert_eq!(p.progress, 25.0);
    }

    #[test]
    fn between_thresholds() {
        let p = BadgeProgress::compute(200, &tiers());
        assert_eq!(p.current.unwrap().name, "Bronze");
        assert_eq!(p.next.unwrap().name, "Silver");
        assert_eq!(p.progress, 50.0);
    }

    #[test]
    fn exactly_on_threshold_unlocks_it() {
        let p = BadgeProgress::compute(300, &tiers());
        assert_eq!(p.current.unwrap().name, "Silver");
        assert_eq!(p.next.unwrap().name, "Gold");
        assert_eq!(p.progress, 0.0);
    }

    #[test]
    fn past_last_threshold_is_complete() {
        let p = BadgeProgress::compute(9_000, &tiers());
        assert_eq!(p.current.unwrap().name, "Gold");
        assert_eq!(p.next, None);
        assert_eq!(p.progress, 100.0);
    }

    #[test]
    fn unsorted_input_is_ordered_first() {
        let mut shuffled = tiers();
        shuffled.reverse();
        assert_eq!(
            BadgeProgress::compute(450, &shuffled),
            BadgeProgress::compute(450, &tiers())
        );
    }

    #[test]
    fn zero_threshold_badge_is_current_immediately() {
        let tiers = vec![BadgeTier::new("Newcomer", 0), BadgeTier::new("Explorer", 50)];
        let p = BadgeProgress::compute(0, &tiers);
        assert_eq!(p.current.unwrap().name, "Newcomer");
        assert_eq!(p.progress, 0.0);
    }

    #[test]
    fn negative_points_clamp_to_zero_progress() {
        let p = BadgeProgress::compute(-40, &tiers());
        assert_eq!(p.progress, 0.0);
    }

    #[test]
    fn completion_is_floored() {
        assert_eq!(completion_percentage(0, 3), 0);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 66);
        assert_eq!(completion_percentage(3, 3), 100);
        assert_eq!(completion_percentage(199, 200), 99);
    }

    #[test]
    fn completion_without_lessons_is_zero() {
        assert_eq!(completion_percentage(0, 0), 0);
        assert_eq!(completion_percentage(4, 0), 0);
    }

    #[test]
    fn completion_never_exceeds_hundred() {
        assert_eq!(completion_percentage(5, 3), 100);
    }

    #[test]
    fn completion_is_monotonic() {
        let total = 7;
        let mut last = 0;
        for done in 0..=total {
            let now = completion_percentage(done, total);
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn status_follows_percentage() {
        assert_eq!(ProgressStatus::from_percentage(0), ProgressStatus::YetToStart);
        assert_eq!(ProgressStatus::from_percentage(1), ProgressStatus::InProgress);
        assert_eq!(ProgressStatus::from_percentage(99), ProgressStatus::InProgress);
        assert_eq!(ProgressStatus::from_percentage(100), ProgressStatus::Completed);
        assert_eq!(ProgressStatus::from("COMPLETED"), ProgressStatus::Completed);
        assert_eq!(ProgressStatus::InProgress.to_string(), "IN_PROGRESS");
    }

    #[test]
    fn quiz_pass_threshold_is_inclusive() {
        assert!(quiz_passed(3, 5, 60));
        assert!(!quiz_passed(2, 5, 60));
        assert!(quiz_passed(0, 5, 0));
        assert!(!quiz_passed(0, 0, 0));
    }
}
