//! Keystroke planning with variable speed and occasional self-corrected
//! typos. A plan replays through the browser driver one key at a time.

use rand::Rng;
use std::time::Duration;

use crate::timing::uniform_ms;

/// Chance that a wrong character is typed and corrected before an intended
/// character.
const TYPO_PROBABILITY: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
}

/// One key press, with the pause to observe before pressing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    pub key: Key,
    pub delay: Duration,
}

/// Plan the keystrokes that type `text`. Each intended character is
/// preceded by a 50-200 ms pause. With probability 0.03 a wrong lowercase
/// character slips in first (50-150 ms), sits for 200-500 ms, and is
/// deleted; typing resumes after a further 100-300 ms. The rendered end
/// state always equals `text`.
pub fn plan_typing<R: Rng + ?Sized>(rng: &mut R, text: &str) -> Vec<Keystroke> {
    let mut plan = Vec::with_capacity(text.chars().count());
    for c in text.chars() {
        let mut char_delay = uniform_ms(rng, 50, 200);
        if rng.gen_bool(TYPO_PROBABILITY) {
            let wrong = (b'a' + rng.gen_range(0..26)) as char;
            plan.push(Keystroke {
                key: Key::Char(wrong),
                delay: uniform_ms(rng, 50, 150),
            });
            plan.push(Keystroke {
                key: Key::Backspace,
                delay: uniform_ms(rng, 200, 500),
            });
            // Recovery pause folds into the intended character's delay.
            char_delay += uniform_ms(rng, 100, 300);
        }
        plan.push(Keystroke {
            key: Key::Char(c),
            delay: char_delay,
        });
    }
    plan
}

/// Fold a plan down to the text it leaves in the field.
pub fn rendered_text(plan: &[Keystroke]) -> String {
    let mut out = String::new();
    for stroke in plan {
        match stroke.key {
            Key::Char(c) => out.push(c),
            Key::Backspace => {
                out.pop();
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_rendered_text_matches_input() {
        let mut rng = StdRng::seed_from_u64(99);
        // Enough runs over a long-ish text that typo injection fires many
        // times across the sample.
        let text = "Hi Jordan, I came across your profile and would love to connect.";
        for _ in 0..500 {
            let plan = plan_typing(&mut rng, text);
            assert_eq!(rendered_text(&plan), text);
        }
    }

    #[test]
    fn test_typos_are_injected_and_corrected() {
        let mut rng = StdRng::seed_from_u64(3);
        let text = "a".repeat(2_000);
        let plan = plan_typing(&mut rng, &text);
        let backspaces = plan
            .iter()
            .filter(|k| k.key == Key::Backspace)
            .count();
        assert!(backspaces > 0, "no typos injected across 2000 chars");
        assert!(plan.len() == text.len() + 2 * backspaces);
        assert_eq!(rendered_text(&plan), text);
    }

    #[test]
    fn test_delays_within_expected_envelope() {
        let mut rng = StdRng::seed_from_u64(11);
        let plan = plan_typing(&mut rng, &"x".repeat(1_000));
        for stroke in &plan {
            assert!(stroke.delay >= Duration::from_millis(50));
            // Worst case: per-char 200 ms plus a 300 ms recovery pause.
            assert!(stroke.delay <= Duration::from_millis(500));
        }
    }

    #[test]
    fn test_empty_text_yields_empty_plan() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(plan_typing(&mut rng, "").is_empty());
    }
}
