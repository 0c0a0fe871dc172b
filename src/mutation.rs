//! Mutation Rule Module
//!
//! Parses resistance mutation rules into position/residue assertions.
//!
//! # Rule Format
//! A rule is one or more tokens joined by `+`, each shaped `RefPosAlt`:
//! - `Ref`: reference amino acid (single letter, not checked against the sequence)
//! - `Pos`: 1-based position in the protein sequence
//! - `Alt`: expected (resistant) amino acid
//!
//! Examples: `F264L` (single), `K272M+F264L` (combination)

use std::fmt;

use crate::error::ScreenError;

// ============================================================================
// Assertion
// ============================================================================

/// One position/residue claim parsed from a rule token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    /// Token as written in the catalog (e.g. "F264L").
    pub token: String,
    /// Reference amino acid (leading character).
    pub reference: char,
    /// Position in protein sequence (1-based, never 0).
    pub position: usize,
    /// Expected amino acid (trailing character).
    pub expected: char,
}

impl Assertion {
    /// Parses a single `RefPosAlt` token.
    ///
    /// # Examples
    /// ```
    /// use resmut::mutation::Assertion;
    ///
    /// let a = Assertion::parse("F264L").unwrap();
    /// assert_eq!(a.reference, 'F');
    /// assert_eq!(a.position, 264);
    /// assert_eq!(a.expected, 'L');
    /// ```
    pub fn parse(token: &str) -> Result<Self, ScreenError> {
        let chars: Vec<char> = token.chars().collect();

        // Minimum length: 3 (e.g., "A1B")
        if chars.len() < 3 {
            return Err(ScreenError::invalid_rule(
                token,
                "expected <ref><position><alt>, token too short",
            ));
        }

        let reference = chars[0];
        let expected = chars[chars.len() - 1];

        let pos_str: String = chars[1..chars.len() - 1].iter().collect();
        let position: usize = pos_str.parse().map_err(|_| {
            ScreenError::invalid_rule(token, format!("position '{}' is not a number", pos_str))
        })?;

        if position == 0 {
            return Err(ScreenError::invalid_rule(token, "positions are 1-based"));
        }

        Ok(Self {
            token: token.to_string(),
            reference,
            position,
            expected,
        })
    }

    /// 0-based index into the residue string.
    pub fn index(&self) -> usize {
        self.position.saturating_sub(1)
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

// ============================================================================
// Mutation Spec
// ============================================================================

/// A resistance rule: every assertion must hold for the rule to be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationSpec {
    assertions: Vec<Assertion>,
}

impl MutationSpec {
    /// Parses a rule such as `F264L` or `K272M+F264L`.
    ///
    /// The whole rule is rejected if any token is malformed.
    pub fn parse(rule: &str) -> Result<Self, ScreenError> {
        let assertions = rule
            .split('+')
            .map(Assertion::parse)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| match e {
                ScreenError::InvalidRule { rule: token, reason } if token != rule => {
                    ScreenError::invalid_rule(rule, format!("token '{}': {}", token, reason))
                }
                other => other,
            })?;

        Ok(Self { assertions })
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    /// True when the rule has more than one assertion.
    pub fn is_combination(&self) -> bool {
        self.assertions.len() > 1
    }

    /// Tokens joined by `+` in catalog order.
    pub fn name(&self) -> String {
        self.assertions
            .iter()
            .map(|a| a.token.as_str())
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl fmt::Display for MutationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Parses every rule, stopping at the first malformed one.
pub fn parse_rules<I, S>(rules: I) -> Result<Vec<MutationSpec>, ScreenError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    rules
        .into_iter()
        .map(|r| MutationSpec::parse(r.as_ref()))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
