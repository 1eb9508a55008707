//! Keyword pattern compilation.
//!
//! A keyword compiles to one of two matchers, chosen by script:
//!
//! - **Plain word**: case-insensitive whole-word match. The keyword text is
//!   found with a literal regex; the word boundaries on each side are checked
//!   by hand.
//! - **Agglutinative**: for keywords containing Hangul syllables. The keyword
//!   may be followed by up to [`MAX_STACKED_PARTICLES`] particles, and the
//!   whole span must not touch a word character on either side.
//!
//! ```text
//! 사과는 맛있다      사과 + 는         match
//! 사과에서부터도     사과 + 에서부터 + 도 match
//! 사과주스           사과 + 주스       no match (주 is not a particle)
//! 빨간사과           간 + 사과         no match (word character before)
//! ```
//!
//! Particle stacking is an explicit depth-bounded search over the particle
//! table in longest-first order, so a compound particle such as `께서` is
//! always tried before `께`.
//!
//! All modes share one notion of a word character (`is_word_char`):
//! Unicode alphanumerics plus `_`, the same set as Python's `\w`. The regex
//! crate's `\b` also counts combining marks, connector punctuation and
//! joiners, so it is not used.

use super::particles::{MAX_STACKED_PARTICLES, is_hangul_syllable, particles_longest_first};
use regex::{Regex, RegexBuilder};
use std::ops::Range;

/// Matching strategy selected for a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Whole-word, case-insensitive.
    PlainWord,
    /// Keyword plus up to three fused particles.
    Agglutinative,
}

/// A compiled keyword matcher.
///
/// Compilation is pure: the same keyword text always yields a matcher with
/// identical behavior, and compilation never fails.
#[derive(Debug, Clone)]
pub struct KeywordPattern {
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// Case-insensitive literal search; boundaries are checked per candidate.
    Word(Regex),
    /// Plain-word scan used when the regex exceeds the engine's size limits.
    LiteralWord(Vec<char>),
    Agglutinative(Vec<char>),
}

impl KeywordPattern {
    /// Compiles a keyword into a matcher.
    #[must_use]
    pub fn compile(keyword: &str) -> Self {
        let matcher = if keyword.chars().any(is_hangul_syllable) {
            Matcher::Agglutinative(keyword.chars().collect())
        } else {
            match RegexBuilder::new(&regex::escape(keyword))
                .case_insensitive(true)
                .build()
            {
                Ok(re) => Matcher::Word(re),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        keyword_chars = keyword.chars().count(),
                        "Keyword regex rejected, falling back to literal word scan"
                    );
                    Matcher::LiteralWord(keyword.chars().collect())
                },
            }
        };

        Self { matcher }
    }

    /// Returns the strategy selected at compile time.
    #[must_use]
    pub const fn mode(&self) -> MatchMode {
        match self.matcher {
            Matcher::Word(_) | Matcher::LiteralWord(_) => MatchMode::PlainWord,
            Matcher::Agglutinative(_) => MatchMode::Agglutinative,
        }
    }

    /// Returns `true` if the keyword occurs anywhere in `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Returns the byte range of the first valid occurrence.
    ///
    /// For agglutinative keywords the range covers the keyword plus any
    /// stacked particles.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<Range<usize>> {
        match &self.matcher {
            Matcher::Word(re) => {
                let mut from = 0;
                while let Some(m) = re.find_at(text, from) {
                    if is_byte_boundary(text, m.start()) && is_byte_boundary(text, m.end()) {
                        return Some(m.range());
                    }
                    // Retry one char further on so overlapping candidates are seen.
                    match text[m.start()..].chars().next() {
                        Some(c) => from = m.start() + c.len_utf8(),
                        None => break,
                    }
                }
                None
            },
            Matcher::LiteralWord(keyword) => {
                let chars = IndexedText::new(text);
                chars
                    .occurrences(keyword)
                    .find(|&start| {
                        chars.is_word_boundary(start) && chars.is_word_boundary(start + keyword.len())
                    })
                    .map(|start| chars.byte_range(start, start + keyword.len()))
            },
            Matcher::Agglutinative(keyword) => {
                let chars = IndexedText::new(text);
                chars.occurrences(keyword).find_map(|start| {
                    if chars.word_before(start) {
                        return None;
                    }
                    stack_particles(&chars.chars, start + keyword.len(), 0)
                        .map(|end| chars.byte_range(start, end))
                })
            },
        }
    }
}

/// Consumes up to [`MAX_STACKED_PARTICLES`] particles from `pos`, then
/// requires a non-word character (or end of text).
///
/// Returns the end position of the first accepted span. Longer particles are
/// tried first; a shorter one is only tried when the longer choice cannot be
/// completed.
fn stack_particles(chars: &[char], pos: usize, depth: usize) -> Option<usize> {
    if depth < MAX_STACKED_PARTICLES {
        let rest = &chars[pos..];
        for particle in particles_longest_first() {
            if !rest.starts_with(particle) {
                continue;
            }
            if let Some(end) = stack_particles(chars, pos + particle.len(), depth + 1) {
                return Some(end);
            }
        }
    }

    match chars.get(pos) {
        Some(&c) if is_word_char(c) => None,
        _ => Some(pos),
    }
}

/// Text split into chars with their byte offsets.
struct IndexedText<'a> {
    text: &'a str,
    offsets: Vec<usize>,
    chars: Vec<char>,
}

impl<'a> IndexedText<'a> {
    fn new(text: &'a str) -> Self {
        let (offsets, chars): (Vec<usize>, Vec<char>) = text.char_indices().unzip();
        Self {
            text,
            offsets,
            chars,
        }
    }

    /// Char positions where `keyword` occurs, ignoring case.
    fn occurrences<'k>(&'k self, keyword: &'k [char]) -> impl Iterator<Item = usize> + 'k {
        let last = self.chars.len().checked_sub(keyword.len());
        last.into_iter().flat_map(move |last| {
            (0..=last).filter(move |&i| {
                keyword
                    .iter()
                    .zip(&self.chars[i..])
                    .all(|(&k, &c)| chars_eq_ignore_case(k, c))
            })
        })
    }

    fn word_before(&self, pos: usize) -> bool {
        pos > 0 && is_word_char(self.chars[pos - 1])
    }

    fn word_at(&self, pos: usize) -> bool {
        self.chars.get(pos).is_some_and(|&c| is_word_char(c))
    }

    fn is_word_boundary(&self, pos: usize) -> bool {
        self.word_before(pos) != self.word_at(pos)
    }

    fn byte_range(&self, start: usize, end: usize) -> Range<usize> {
        let byte = |i: usize| self.offsets.get(i).copied().unwrap_or(self.text.len());
        byte(start)..byte(end)
    }
}

/// Word characters: Unicode alphanumerics and underscore.
///
/// This matches Python's `\w` for `str` patterns. Combining marks, connector
/// punctuation other than `_`, and zero-width joiners are not word
/// characters.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Word boundary at byte offset `pos` of `text`.
fn is_byte_boundary(text: &str, pos: usize) -> bool {
    let before = text[..pos].chars().next_back().is_some_and(is_word_char);
    let after = text[pos..].chars().next().is_some_and(is_word_char);
    before != after
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("cat", "Cat!" => true ; "capitalized with punctuation")]
    #[test_case("cat", "a cat." => true ; "inside sentence")]
    #[test_case("cat", "category" => false ; "prefix of longer word")]
    #[test_case("cat", "bobcat" => false ; "suffix of longer word")]
    #[test_case("cat", "cat_food" => false ; "underscore is a word character")]
    #[test_case("sale", "big SALE today" => true ; "upper case text")]
    #[test_case("sale", "wholesale prices" => false ; "embedded")]
    #[test_case("big sale", "a Big Sale!" => true ; "multi word keyword")]
    #[test_case("café", "le café." => true ; "non ascii latin")]
    #[test_case("v1.2", "release v1.2 is out" => true ; "regex metacharacters are literal")]
    #[test_case("v1.2", "release v1x2 is out" => false ; "dot is not a wildcard")]
    fn test_plain_word(keyword: &str, text: &str) -> bool {
        let pattern = KeywordPattern::compile(keyword);
        assert_eq!(pattern.mode(), MatchMode::PlainWord);
        pattern.is_match(text)
    }

    #[test_case("사과", "사과" => true ; "bare keyword")]
    #[test_case("사과", "사과는 맛있다" => true ; "topic particle")]
    #[test_case("사과", "사과를." => true ; "object particle then punctuation")]
    #[test_case("사과", "(사과)" => true ; "bracketed")]
    #[test_case("사과", "사과주스" => false ; "word forming suffix")]
    #[test_case("사과", "빨간사과는" => false ; "word character before")]
    #[test_case("사과", "사과에서부터도만" => true ; "three stacked particles")]
    #[test_case("사과", "사과에게도만은" => false ; "four stacked particles")]
    #[test_case("사과", "사과주스와 사과는" => true ; "second occurrence matches")]
    #[test_case("세일", "세일이에요" => false ; "unrecognized ending")]
    #[test_case("세일", "오늘 세일!" => true ; "exclamation after keyword")]
    #[test_case("AI팀", "ai팀은 회의 중" => true ; "latin part ignores case")]
    #[test_case("선생님", "선생님께서 오셨다" => true ; "compound honorific particle")]
    fn test_agglutinative(keyword: &str, text: &str) -> bool {
        let pattern = KeywordPattern::compile(keyword);
        assert_eq!(pattern.mode(), MatchMode::Agglutinative);
        pattern.is_match(text)
    }

    #[test]
    fn test_longest_particle_wins_span() {
        let pattern = KeywordPattern::compile("선생님");
        let text = "선생님께서 오셨다";
        let span = pattern.find(text).expect("match");
        assert_eq!(&text[span], "선생님께서");
    }

    #[test]
    fn test_backtracks_to_shorter_particle() {
        // "이나마" leaves "다" behind; "이나" + "마다" completes the span.
        let pattern = KeywordPattern::compile("버스");
        let text = "버스이나마다 가요";
        let span = pattern.find(text).expect("match");
        assert_eq!(&text[span], "버스이나마다");
    }

    #[test]
    fn test_find_reports_byte_range_after_multibyte_prefix() {
        let pattern = KeywordPattern::compile("세일");
        let text = "오늘 세일은 끝";
        let span = pattern.find(text).expect("match");
        assert_eq!(&text[span], "세일은");
    }

    #[test]
    fn test_keyword_longer_than_text() {
        assert!(!KeywordPattern::compile("사과나무").is_match("사과"));
        assert!(!KeywordPattern::compile("category").is_match("cat"));
    }

    #[test]
    fn test_compile_is_idempotent() {
        let a = KeywordPattern::compile("사과");
        let b = KeywordPattern::compile("사과");
        for text in ["사과는", "사과주스", "", "사과 사과를", "xx사과"] {
            assert_eq!(a.is_match(text), b.is_match(text), "{text}");
            assert_eq!(a.find(text), b.find(text), "{text}");
        }
    }

    #[test]
    fn test_literal_fallback_matches_word_semantics() {
        let chars: Vec<char> = "cat".chars().collect();
        let pattern = KeywordPattern {
            matcher: Matcher::LiteralWord(chars),
        };
        assert_eq!(pattern.mode(), MatchMode::PlainWord);
        assert!(pattern.is_match("a Cat!"));
        assert!(!pattern.is_match("category"));
        assert!(!pattern.is_match("bobcat"));
    }

    #[test_case("cat", "cat\u{301}" => true ; "combining mark after keyword")]
    #[test_case("cat", "cat\u{200D}" => true ; "zero width joiner after keyword")]
    #[test_case("cat", "\u{203F}cat" => true ; "connector punctuation before keyword")]
    #[test_case("사과", "사과\u{200D}" => true ; "zero width joiner after hangul keyword")]
    #[test_case("사과", "\u{203F}사과는" => true ; "connector punctuation before hangul keyword")]
    #[test_case("cat", "cat\u{0663}" => false ; "arabic digit is a word character")]
    fn test_word_characters_agree_across_modes(keyword: &str, text: &str) -> bool {
        let compiled = KeywordPattern::compile(keyword);
        if compiled.mode() == MatchMode::PlainWord {
            let literal = KeywordPattern {
                matcher: Matcher::LiteralWord(keyword.chars().collect()),
            };
            assert_eq!(compiled.find(text), literal.find(text), "{text:?}");
        }
        compiled.is_match(text)
    }

    #[test]
    fn test_overlapping_candidates_are_retried() {
        let pattern = KeywordPattern::compile("a-a");
        assert_eq!(pattern.find("a-a-a x"), Some(0..3));
        assert_eq!(pattern.find("ba-a-a"), Some(3..6));
    }

    #[test]
    fn test_long_particle_run_is_bounded() {
        let pattern = KeywordPattern::compile("사과");
        let text = format!("사과{}", "이".repeat(10_000));
        assert!(!pattern.is_match(&text));
    }
}
