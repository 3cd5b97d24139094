//! Score calculation for popped runs
//!
//! Given `total` tokens removed in one pop and minimum run length `min`:
//! - nothing popped scores nothing
//! - exactly `min` scores `min`
//! - anything longer scores `min + 2^(total - min)`

/// Score delta for one pop event
pub fn calculate_score(total: usize, min: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let base = min as u32;
    if total <= min {
        // 2^(negative) truncates away
        return base;
    }
    let bonus = 1u32.checked_shl((total - min) as u32).unwrap_or(u32::MAX);
    base.saturating_add(bonus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_table() {
        assert_eq!(calculate_score(0, 5), 0);
        assert_eq!(calculate_score(5, 5), 5);
        assert_eq!(calculate_score(6, 5), 7);
        assert_eq!(calculate_score(7, 5), 9);
        assert_eq!(calculate_score(9, 5), 21);
        assert_eq!(calculate_score(10, 5), 37);
    }

    #[test]
    fn test_score_saturates() {
        assert_eq!(calculate_score(200, 5), u32::MAX);
    }
}
