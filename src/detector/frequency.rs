//! Frequency detector.
//!
//! Flags a category whose observed share over the full window falls well
//! below its expected share, voting for reversion toward the mean.

use crate::domain::{Category, Outcome};

use super::{tail, Detection, DetectorKind};

const WINDOW: usize = 20;

/// Expected share for primary and secondary outcomes, in percent.
const EXPECTED_MAJOR: f64 = 42.5;
/// Expected share for neutral outcomes, in percent.
const EXPECTED_NEUTRAL: f64 = 15.0;
/// A major category must fall this many points below expectation to fire.
const MAJOR_TOLERANCE: f64 = 10.0;
/// Neutral tolerance is tighter since its expected share is small.
const NEUTRAL_TOLERANCE: f64 = 5.0;

pub fn detect(chronological: &[Outcome]) -> Option<Detection> {
    let recent = tail(chronological, WINDOW);
    let total = recent.len() as f64;

    let share = |category: Category| {
        let count = recent
            .iter()
            .filter(|outcome| outcome.category() == category)
            .count();
        count as f64 / total * 100.0
    };

    for category in [Category::Primary, Category::Secondary] {
        let observed = share(category);
        if observed < EXPECTED_MAJOR - MAJOR_TOLERANCE {
            let deficit = (EXPECTED_MAJOR - observed).abs();
            return Some(Detection::new(
                DetectorKind::Frequency,
                category,
                55.0 + deficit,
                format!("frequency: {category} under-represented ({observed:.1}% vs {EXPECTED_MAJOR}%)"),
            ));
        }
    }

    let observed = share(Category::Neutral);
    if observed < EXPECTED_NEUTRAL - NEUTRAL_TOLERANCE {
        let deficit = (EXPECTED_NEUTRAL - observed).abs();
        return Some(Detection::new(
            DetectorKind::Frequency,
            Category::Neutral,
            45.0 + 2.0 * deficit,
            format!(
                "frequency: {} under-represented ({observed:.1}% vs {EXPECTED_NEUTRAL}%)",
                Category::Neutral
            ),
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn outcomes(rolls: &[u8]) -> Vec<Outcome> {
        rolls
            .iter()
            .enumerate()
            .map(|(i, &roll)| Outcome::new(format!("game-{i}"), Utc::now(), roll))
            .collect()
    }

    #[test]
    fn fires_for_starved_primary() {
        // 20 rounds, 2 primary (10%), 15 secondary, 3 neutral
        let mut rolls = vec![1, 1];
        rolls.extend([2; 15]);
        rolls.extend([0; 3]);
        let window = outcomes(&rolls);

        let detection = detect(&window).unwrap();
        assert_eq!(detection.predicted, Category::Primary);
        // 55 + (42.5 - 10) = 87.5
        assert!((detection.confidence - 87.5).abs() < 1e-9);
    }

    #[test]
    fn primary_checked_before_secondary() {
        // Both majors starved by an all-neutral window; primary wins the tie
        let window = outcomes(&[0; 20]);
        let detection = detect(&window).unwrap();
        assert_eq!(detection.predicted, Category::Primary);
    }

    #[test]
    fn fires_for_missing_neutral() {
        // Balanced majors, zero neutral: 45 + 2*15 = 75
        let mut rolls = vec![1; 10];
        rolls.extend([2; 10]);
        let window = outcomes(&rolls);

        let detection = detect(&window).unwrap();
        assert_eq!(detection.predicted, Category::Neutral);
        assert!((detection.confidence - 75.0).abs() < 1e-9);
    }

    #[test]
    fn silent_when_shares_are_near_expected() {
        // 8 primary (40%), 9 secondary (45%), 3 neutral (15%)
        let mut rolls = vec![1; 8];
        rolls.extend([2; 9]);
        rolls.extend([0; 3]);
        let window = outcomes(&rolls);

        assert!(detect(&window).is_none());
    }

    #[test]
    fn confidence_is_clamped_to_ceiling() {
        // Zero secondary with plenty of primary: deficit 42.5 -> 97.5 pre-clamp
        let mut rolls = vec![1; 17];
        rolls.extend([0; 3]);
        let window = outcomes(&rolls);

        let detection = detect(&window).unwrap();
        assert_eq!(detection.predicted, Category::Secondary);
        assert!(detection.confidence <= 95.0);
    }
}
