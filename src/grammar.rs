//! User syntax grammars.
//!
//! The default grammar is the Network Access Identifier of
//! [RFC 7542 §2.1](https://www.rfc-editor.org/rfc/rfc7542#section-2.1),
//! restricted to alphanumerics and high-order octets:
//!
//! ```text
//! string   = 1*( ALPHA / DIGIT / %x80-FF )
//! username = string *( "." string )
//! rtext    = ALPHA / DIGIT / %x80-FF
//! label    = rtext [ *( rtext / "-" ) rtext ]
//! realm    = label 1*( "." label )
//! nai      = username [ "@" realm ] / "@" realm
//! ```
//!
//! Matching is done on octets. Anything at or above `0x80` is accepted as an
//! opaque identifier character; multi-byte UTF-8 sequences are not inspected.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::bytes::Regex;

use crate::error::Error;

// ── Grammar fragments ─────────────────────────────────────────────────────────

const RTEXT: &str = r"[A-Za-z0-9\x80-\xFF]";

fn nai_pattern() -> String {
    let string = format!("{RTEXT}+");
    let username = format!("{string}(?:\\.{string})*");
    let label = format!("{RTEXT}(?:(?:{RTEXT}|-)*{RTEXT})?");
    let realm = format!("{label}(?:\\.{label})+");
    // `(?-u)` makes the byte classes match raw octets rather than code points.
    format!(r"(?-u)\A(?:{username}(?:@{realm})?|@{realm})\z")
}

// ── Grammar ───────────────────────────────────────────────────────────────────

/// A compiled, anchored user syntax.
///
/// Built once when the middleware is configured and shared read-only by every
/// request afterwards. Cloning is cheap.
#[derive(Clone)]
pub struct Grammar {
    regex: Regex,
}

impl Grammar {
    /// The Network Access Identifier grammar.
    pub fn nai() -> Self {
        static NAI: OnceLock<Grammar> = OnceLock::new();
        NAI.get_or_init(|| Grammar {
            regex: Regex::new(&nai_pattern()).expect("NAI grammar must compile"),
        })
        .clone()
    }

    /// Compiles a caller-supplied pattern.
    ///
    /// The pattern always has to match the entire candidate; it is wrapped in
    /// `\A(?:…)\z` so a bare `[a-z]+` does not accept `"abc:def"`. The pattern
    /// must compile on its own first, so an unbalanced `)` cannot close the
    /// anchoring group early.
    pub fn new(pattern: &str) -> Result<Self, Error> {
        Regex::new(pattern)?;
        let regex = Regex::new(&format!(r"\A(?:{pattern})\z"))?;
        Ok(Self { regex })
    }

    /// Whether `candidate` conforms to this grammar, in its entirety.
    pub fn matches(&self, candidate: impl AsRef<[u8]>) -> bool {
        self.regex.is_match(candidate.as_ref())
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::nai()
    }
}

impl FromStr for Grammar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Grammar").field(&self.as_str()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nai(s: &str) -> bool {
        Grammar::nai().matches(s)
    }

    #[test]
    fn plain_usernames() {
        assert!(nai("john"));
        assert!(nai("John42"));
        assert!(nai("john.doe"));
        assert!(nai("a.b.c"));
    }

    #[test]
    fn usernames_with_realm() {
        assert!(nai("john@example.com"));
        assert!(nai("john.doe@mail.example.com"));
        assert!(nai("john@ex-ample.co-uk.org"));
        assert!(nai("x@a.b"));
    }

    #[test]
    fn bare_realm() {
        assert!(nai("@example.com"));
        assert!(!nai("@example"));
        assert!(!nai("@"));
    }

    #[test]
    fn realm_needs_two_labels() {
        assert!(!nai("john@example"));
        assert!(!nai("john@"));
    }

    #[test]
    fn hyphens_only_inside_labels() {
        assert!(!nai("john@-example.com"));
        assert!(!nai("john@example-.com"));
        assert!(!nai("john@example.com-"));
        assert!(nai("john@e-x-a.com"));
        // usernames never carry a hyphen
        assert!(!nai("jo-hn"));
    }

    #[test]
    fn dots_must_separate() {
        assert!(!nai(".john"));
        assert!(!nai("john."));
        assert!(!nai("jo..hn"));
        assert!(!nai("john@example..com"));
        assert!(!nai("john@.example.com"));
    }

    #[test]
    fn empty_and_punctuation_rejected() {
        assert!(!nai(""));
        assert!(!nai("john doe"));
        assert!(!nai("john:secret"));
        assert!(!nai("john%41"));
        assert!(!nai("john@example.com\n"));
        assert!(!nai("john@@example.com"));
    }

    #[test]
    fn high_octets_are_opaque() {
        assert!(nai("jøhn"));
        assert!(nai("jøhn@exåmple.com"));
        // not valid UTF-8, still accepted octet-wise
        assert!(Grammar::nai().matches(b"j\xff\x80hn"));
        assert!(Grammar::nai().matches(b"@\xc3\xa5.org"));
    }

    #[test]
    fn matching_is_repeatable() {
        let grammar = Grammar::nai();
        for candidate in ["john", "j@x", "@a.b", ""] {
            assert_eq!(grammar.matches(candidate), grammar.matches(candidate));
        }
    }

    #[test]
    fn custom_grammar_is_anchored() {
        let grammar = Grammar::new("[a-z]+").unwrap();
        assert!(grammar.matches("john"));
        assert!(!grammar.matches("john1"));
        assert!(!grammar.matches("1john"));
        assert!(!grammar.matches(""));
    }

    #[test]
    fn custom_grammar_alternation_stays_anchored() {
        let grammar: Grammar = "a|b".parse().unwrap();
        assert!(grammar.matches("a"));
        assert!(!grammar.matches("ab"));
        assert!(!grammar.matches("xb"));
    }

    #[test]
    fn custom_grammar_may_accept_empty() {
        let grammar = Grammar::new("[a-z]*").unwrap();
        assert!(grammar.matches(""));
    }

    #[test]
    fn invalid_custom_grammar() {
        let err = Grammar::new("[a-z").unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
        assert!(err.to_string().starts_with("invalid user syntax"));
    }

    #[test]
    fn unbalanced_group_cannot_escape_anchors() {
        assert!(matches!(Grammar::new("a)|(b"), Err(Error::Syntax(_))));
        assert!(matches!(Grammar::new(")(?:"), Err(Error::Syntax(_))));
    }

    #[test]
    fn default_is_nai() {
        assert_eq!(Grammar::default().as_str(), Grammar::nai().as_str());
    }
}
