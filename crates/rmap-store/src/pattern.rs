//! Redis-style glob matching for key enumeration.
//!
//! Supported syntax:
//! - `*` matches any run of bytes, including none
//! - `?` matches exactly one byte
//! - `[abc]` matches one listed byte, `[^abc]` one unlisted byte
//! - `[a-z]` matches one byte in the range (reversed ranges are accepted)
//! - `\x` matches `x` literally, inside or outside a class
//!
//! Matching is byte-wise, as in Redis.

/// Returns `true` if `text` matches the glob `pattern`.
///
/// # Examples
///
/// ```
/// use rmap_store::glob_match;
///
/// assert!(glob_match("repo:*", "repo:rust-lang/rust"));
/// assert!(glob_match("h?llo", "hallo"));
/// assert!(!glob_match("h[^e]llo", "hello"));
/// ```
pub fn glob_match(pattern: &str, text: &str) -> bool {
    matches(pattern.as_bytes(), text.as_bytes())
}

fn matches(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    // Pattern index after the last `*` and the text index it resumes from.
    let mut resume: Option<(usize, usize)> = None;

    while p < pattern.len() || t < text.len() {
        if p < pattern.len() {
            if pattern[p] == b'*' {
                while pattern.get(p) == Some(&b'*') {
                    p += 1;
                }
                if p == pattern.len() {
                    return true;
                }
                resume = Some((p, t));
                continue;
            }
            if let Some(rest) = match_one(&pattern[p..], text.get(t).copied()) {
                p = pattern.len() - rest.len();
                t += 1;
                continue;
            }
        }
        match resume {
            Some((star, from)) if from < text.len() => {
                resume = Some((star, from + 1));
                p = star;
                t = from + 1;
            }
            _ => return false,
        }
    }
    true
}

/// Match one non-`*` token at the head of `pattern` against `byte`.
/// Returns the pattern remaining after the token.
fn match_one(pattern: &[u8], byte: Option<u8>) -> Option<&[u8]> {
    let byte = byte?;
    match pattern {
        [b'?', rest @ ..] => Some(rest),
        [b'[', class @ ..] => {
            let (hit, after) = match_class(class, byte);
            hit.then_some(after)
        }
        [b'\\', escaped, rest @ ..] => (*escaped == byte).then_some(rest),
        [literal, rest @ ..] => (*literal == byte).then_some(rest),
        [] => None,
    }
}

/// Match one byte against a class body (the part after `[`). Returns the
/// outcome and the pattern remaining after the closing `]`.
fn match_class(mut class: &[u8], byte: u8) -> (bool, &[u8]) {
    let negate = class.first() == Some(&b'^');
    if negate {
        class = &class[1..];
    }

    let mut hit = false;
    loop {
        match class {
            // An unterminated class ends with the pattern.
            [] => break,
            [b']', rest @ ..] => {
                class = rest;
                break;
            }
            [b'\\', escaped, rest @ ..] => {
                hit |= *escaped == byte;
                class = rest;
            }
            [lo, b'-', hi, rest @ ..] if *hi != b']' => {
                let (lo, hi) = if lo <= hi { (*lo, *hi) } else { (*hi, *lo) };
                hit |= (lo..=hi).contains(&byte);
                class = rest;
            }
            [single, rest @ ..] => {
                hit |= *single == byte;
                class = rest;
            }
        }
    }
    (hit != negate, class)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    #[test]
    fn star_matches_everything() {
        assert!(glob_match("*", ""));
        assert!(glob_match("*", "anything at all"));
        assert!(glob_match("**", "x"));
    }

    #[test]
    fn literal_must_match_exactly() {
        assert!(glob_match("repo", "repo"));
        assert!(!glob_match("repo", "repos"));
        assert!(!glob_match("repos", "repo"));
    }

    #[test]
    fn star_in_the_middle() {
        assert!(glob_match("issue:*:open", "issue:42:open"));
        assert!(glob_match("issue:*:open", "issue::open"));
        assert!(!glob_match("issue:*:open", "issue:42:closed"));
    }

    #[test]
    fn question_mark_is_one_byte() {
        assert!(glob_match("c?t", "cat"));
        assert!(!glob_match("c?t", "ct"));
        assert!(!glob_match("c?t", "coat"));
    }

    #[test]
    fn classes_and_ranges() {
        assert!(glob_match("v[12]", "v1"));
        assert!(!glob_match("v[12]", "v3"));
        assert!(glob_match("v[0-9]", "v7"));
        assert!(glob_match("v[9-0]", "v7"));
        assert!(!glob_match("v[^0-9]", "v7"));
        assert!(glob_match("v[^0-9]", "vx"));
    }

    #[test]
    fn escapes_are_literal() {
        assert!(glob_match(r"a\*b", "a*b"));
        assert!(!glob_match(r"a\*b", "axxb"));
        assert!(glob_match(r"[\]]", "]"));
    }

    #[test]
    fn stars_backtrack_to_the_last_star() {
        assert!(glob_match("*a*b", "xaxxab"));
        assert!(glob_match("a*?c", "abbc"));
        assert!(!glob_match("a*?c", "ac"));
        assert!(glob_match("*[0-9]", "key9"));
        assert!(!glob_match("*:x*:y", "a:x:b"));
    }

    #[test]
    fn many_stars_on_a_long_key_finish_quickly() {
        let key = "a".repeat(4000);
        let started = Instant::now();
        assert!(!glob_match("*a*a*a*a*a*a*a*a*a*a*a*a*b", &key));
        assert!(glob_match("*a*a*a*a*a*a*a*a*a*a*a*a*", &key));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn unterminated_class_runs_to_end() {
        assert!(glob_match("[ab", "a"));
        assert!(!glob_match("[ab", "c"));
    }
}
