//! Mutation Evaluation Module
//!
//! Checks each assertion of a [`MutationSpec`] against a residue string and
//! aggregates the result. Only the residue at the asserted position matters;
//! the reference residue in the rule is never compared.
//!
//! The outcome is kept structured here. The human-readable evidence note is
//! produced separately by [`crate::note`].

use crate::error::ScreenError;
use crate::mutation::{Assertion, MutationSpec};
use crate::note;

// ============================================================================
// Outcomes
// ============================================================================

/// What was found at one asserted position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionOutcome {
    /// Expected residue present.
    Match,
    /// A different residue was found.
    Mismatch(char),
    /// Position lies past the end of the sequence (carries sequence length).
    OutOfRange(usize),
}

impl AssertionOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, AssertionOutcome::Match)
    }
}

/// Handling of positions beyond the end of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionPolicy {
    /// Record the assertion as not detected and explain it in the note.
    #[default]
    Report,
    /// Fail the evaluation with [`ScreenError::PositionOutOfRange`].
    Strict,
}

/// Result of evaluating one spec against one sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Spec display name (tokens joined by `+`).
    pub name: String,
    /// True only if every assertion matched.
    pub detected: bool,
    /// Per-assertion outcomes in spec order.
    pub outcomes: Vec<(Assertion, AssertionOutcome)>,
    /// Evidence note in the historical wording.
    pub note: String,
}

impl Evaluation {
    /// Tokens whose assertion did not hold, in spec order.
    pub fn failed_tokens(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| !o.is_match())
            .map(|(a, _)| a.token.as_str())
    }

    /// Number of assertions that fell outside the sequence.
    pub fn out_of_range_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, AssertionOutcome::OutOfRange(_)))
            .count()
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Looks up the residue at one assertion's position.
pub fn check_assertion(assertion: &Assertion, residues: &str) -> AssertionOutcome {
    match residues.chars().nth(assertion.index()) {
        Some(found) if found == assertion.expected => AssertionOutcome::Match,
        Some(found) => AssertionOutcome::Mismatch(found),
        None => AssertionOutcome::OutOfRange(residues.chars().count()),
    }
}

/// Evaluates a spec against a sequence.
///
/// Single-assertion specs and combinations share the same detection rule
/// (logical AND over assertions); they differ only in how the note is worded.
///
/// # Arguments
/// * `spec` - Parsed mutation rule
/// * `seq_id` - Sequence identifier, used only in strict-mode errors
/// * `residues` - Residue string of the sequence
/// * `policy` - Out-of-range handling
///
/// # Examples
/// ```
/// use resmut::evaluate::{evaluate, PositionPolicy};
/// use resmut::mutation::MutationSpec;
///
/// let spec = MutationSpec::parse("M2K").unwrap();
/// let eval = evaluate(&spec, "seqA", "MKFL", PositionPolicy::Report).unwrap();
/// assert!(eval.detected);
/// assert_eq!(eval.note, "Detected mutation: M2K");
/// ```
pub fn evaluate(
    spec: &MutationSpec,
    seq_id: &str,
    residues: &str,
    policy: PositionPolicy,
) -> Result<Evaluation, ScreenError> {
    let mut outcomes = Vec::with_capacity(spec.assertions().len());

    for assertion in spec.assertions() {
        let outcome = check_assertion(assertion, residues);
        if let (AssertionOutcome::OutOfRange(length), PositionPolicy::Strict) = (outcome, policy) {
            return Err(ScreenError::PositionOutOfRange {
                sequence: seq_id.to_string(),
                rule: assertion.token.clone(),
                position: assertion.position,
                length,
            });
        }
        outcomes.push((assertion.clone(), outcome));
    }

    let detected = outcomes.iter().all(|(_, o)| o.is_match());
    let note = if spec.is_combination() {
        note::combination_note(&outcomes, detected)
    } else {
        let (assertion, outcome) = &outcomes[0];
        note::assertion_note(assertion, outcome)
    };

    Ok(Evaluation {
        name: spec.name(),
        detected,
        outcomes,
        note,
    })
}

// ============================================================================
// Tests
// ============================================================================
