//! Time utilities and constants for goldrate.

use chrono::{Duration, Local};

/// Timing constants shared by the resolver and the dashboard.
pub mod constants {
    use super::Duration;

    /// Per-request timeout for every outbound fetch (10 seconds).
    pub fn fetch_timeout() -> Duration {
        Duration::seconds(10)
    }

    /// Default dashboard refresh interval (5 minutes).
    pub fn refresh_interval() -> Duration {
        Duration::minutes(5)
    }

    /// Shortest refresh interval the dashboard accepts (60 seconds).
    pub fn min_refresh_interval() -> Duration {
        Duration::seconds(60)
    }

    /// Longest refresh interval the dashboard accepts (10 minutes).
    pub fn max_refresh_interval() -> Duration {
        Duration::minutes(10)
    }
}

/// Local wall-clock stamp in the `YYYY-MM-DD HH:MM` form shown next to prices.
pub fn local_stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M").to_string()
}

/// Duration extensions for convenient construction.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_stamp_shape() {
        let stamp = local_stamp();
        assert_eq!(stamp.len(), 16);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[10..11], " ");
    }

    #[test]
    fn test_negative_duration_as_std_is_zero() {
        assert_eq!(Duration::seconds(-5).as_std(), std::time::Duration::ZERO);
        assert_eq!(
            constants::fetch_timeout().as_std(),
            std::time::Duration::from_secs(10)
        );
    }
}
