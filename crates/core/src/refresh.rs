use chrono::{DateTime, Duration, Utc};

// Minimum interval between user-triggered refreshes, to respect the upstream
// provider's rate limits. The scheduled batch run is not gated.
const DEFAULT_COOLDOWN_MINUTES: i64 = 15;

pub fn cooldown_from_env() -> Duration {
    let minutes = std::env::var("REFRESH_COOLDOWN_MINUTES")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|m| *m >= 0)
        .unwrap_or(DEFAULT_COOLDOWN_MINUTES);
    Duration::minutes(minutes)
}

/// Pure gate for the manually-triggered refresh path. A ticker that has
/// never been refreshed (no metadata row yet) may always refresh.
pub fn can_refresh(
    last_updated: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> bool {
    match last_updated {
        None => true,
        Some(t) => now - t > cooldown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn denies_within_cooldown() {
        let now = t0() + Duration::minutes(14);
        assert!(!can_refresh(Some(t0()), now, Duration::minutes(15)));
    }

    #[test]
    fn allows_after_cooldown() {
        let now = t0() + Duration::minutes(16);
        assert!(can_refresh(Some(t0()), now, Duration::minutes(15)));
    }

    #[test]
    fn denies_exactly_at_cooldown_boundary() {
        let now = t0() + Duration::minutes(15);
        assert!(!can_refresh(Some(t0()), now, Duration::minutes(15)));
    }

    #[test]
    fn always_allows_first_ever_refresh() {
        assert!(can_refresh(None, t0(), Duration::minutes(15)));
    }
}
