//! Korean grammatical particles tolerated after a Hangul keyword.
//!
//! Particles fuse directly onto the word they mark (`사과` + `는` →
//! `사과는`), so a Hangul keyword has to accept a short run of them before
//! the word boundary check.

use std::cmp::Reverse;
use std::sync::LazyLock;

/// Maximum number of particles that may be stacked after a keyword.
pub const MAX_STACKED_PARTICLES: usize = 3;

/// Recognized particles, in declaration order.
///
/// Compound forms are listed next to the shorter forms they extend; the
/// matcher never relies on this order, it uses [`particles_longest_first`].
pub const KOREAN_PARTICLES: &[&str] = &[
    "께서",
    "에서부터",
    "으로부터",
    "로부터",
    "에게서",
    "한테서",
    "으로써",
    "로써",
    "으로서",
    "로서",
    "이라고는",
    "라고는",
    "이라고",
    "라고",
    "이나마",
    "나마",
    "이라도",
    "라도",
    "이든지",
    "든지",
    "이든",
    "든",
    "이랑",
    "랑",
    "이나",
    "나",
    "이며",
    "하며",
    "하고",
    "이자",
    "자",
    "에게",
    "한테",
    "에서",
    "으로",
    "로",
    "까지",
    "부터",
    "밖에",
    "뿐",
    "조차",
    "마저",
    "마다",
    "만큼",
    "쯤",
    "씩",
    "만치",
    "같이",
    "처럼",
    "대로",
    "보다",
    "커녕",
    "도",
    "만",
    "의",
    "과",
    "와",
    "을",
    "를",
    "은",
    "는",
    "이",
    "가",
    "에",
    "께",
];

/// Particles as char sequences, longest first.
///
/// The sort is stable, so particles of equal length keep declaration order.
static LONGEST_FIRST: LazyLock<Vec<Vec<char>>> = LazyLock::new(|| {
    let mut particles: Vec<Vec<char>> = KOREAN_PARTICLES
        .iter()
        .map(|p| p.chars().collect())
        .collect();
    particles.sort_by_key(|p| Reverse(p.len()));
    particles
});

/// Returns the particle table ordered for matching.
pub fn particles_longest_first() -> &'static [Vec<char>] {
    &LONGEST_FIRST
}

/// Returns `true` if `c` is a precomposed Hangul syllable (`가`..=`힣`).
#[must_use]
pub fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_first_is_sorted() {
        let particles = particles_longest_first();
        assert_eq!(particles.len(), KOREAN_PARTICLES.len());
        for pair in particles.windows(2) {
            assert!(pair[0].len() >= pair[1].len());
        }
        assert_eq!(particles[0].len(), 4);
    }

    #[test]
    fn test_equal_length_keeps_declaration_order() {
        let four: Vec<String> = particles_longest_first()
            .iter()
            .filter(|p| p.len() == 4)
            .map(|p| p.iter().collect())
            .collect();
        assert_eq!(four, vec!["에서부터", "으로부터", "이라고는"]);
    }

    #[test]
    fn test_compound_precedes_its_suffix() {
        let particles = particles_longest_first();
        let pos = |s: &str| {
            let target: Vec<char> = s.chars().collect();
            particles.iter().position(|p| *p == target)
        };
        assert!(pos("께서") < pos("께"));
        assert!(pos("으로부터") < pos("로부터"));
        assert!(pos("로부터") < pos("로"));
    }

    #[test]
    fn test_hangul_detection() {
        assert!(is_hangul_syllable('가'));
        assert!(is_hangul_syllable('힣'));
        assert!(!is_hangul_syllable('ㄱ'));
        assert!(!is_hangul_syllable('a'));
        assert!(!is_hangul_syllable('漢'));
    }
}
