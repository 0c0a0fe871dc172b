//! Evidence note wording.
//!
//! Downstream audit tooling parses these strings, so the wording is fixed.

use crate::evaluate::AssertionOutcome;
use crate::mutation::Assertion;

/// Note for one assertion.
pub fn assertion_note(assertion: &Assertion, outcome: &AssertionOutcome) -> String {
    match outcome {
        AssertionOutcome::Match => format!("Detected mutation: {}", assertion.token),
        AssertionOutcome::Mismatch(found) => format!(
            "Mutation {} not detected. Found {} at position {}.",
            assertion.token, found, assertion.position
        ),
        AssertionOutcome::OutOfRange(length) => format!(
            "Mutation {} not detected. Position {} is out of range for sequence of length {}.",
            assertion.token, assertion.position, length
        ),
    }
}

/// Note for a combination: every assertion's note, then a summary line.
///
/// Line breaks collapse to single spaces and any `..` runs are dropped.
pub fn combination_note(outcomes: &[(Assertion, AssertionOutcome)], detected: bool) -> String {
    let mut note = String::new();
    for (assertion, outcome) in outcomes {
        note.push_str(&assertion_note(assertion, outcome));
        note.push('\n');
    }

    let summary = if detected {
        let tokens: Vec<&str> = outcomes.iter().map(|(a, _)| a.token.as_str()).collect();
        format!("All mutations detected: {}", tokens.join(" "))
    } else {
        let tokens: Vec<&str> = outcomes
            .iter()
            .filter(|(_, o)| !o.is_match())
            .map(|(a, _)| a.token.as_str())
            .collect();
        format!("Mutations not detected: {}", tokens.join(" "))
    };
    note.push_str(&summary);
    note.push('\n');

    collapse(&note)
}

fn collapse(note: &str) -> String {
    note.trim()
        .replace('\n', " ")
        .replace("..", "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(token: &str, outcome: AssertionOutcome) -> (Assertion, AssertionOutcome) {
        (Assertion::parse(token).unwrap(), outcome)
    }

    #[test]
    fn test_assertion_note_wording() {
        let (a, _) = pair("F264L", AssertionOutcome::Match);
        assert_eq!(
            assertion_note(&a, &AssertionOutcome::Match),
            "Detected mutation: F264L"
        );
        assert_eq!(
            assertion_note(&a, &AssertionOutcome::Mismatch('F')),
            "Mutation F264L not detected. Found F at position 264."
        );
        assert_eq!(
            assertion_note(&a, &AssertionOutcome::OutOfRange(100)),
            "Mutation F264L not detected. Position 264 is out of range for sequence of length 100."
        );
    }

    #[test]
    fn test_combination_note_lists_only_failures() {
        let outcomes = vec![
            pair("K272M", AssertionOutcome::Mismatch('K')),
            pair("F264L", AssertionOutcome::Match),
            pair("N262Y", AssertionOutcome::Mismatch('N')),
        ];
        assert_eq!(
            combination_note(&outcomes, false),
            "Mutation K272M not detected. Found K at position 272. \
             Detected mutation: F264L \
             Mutation N262Y not detected. Found N at position 262. \
             Mutations not detected: K272M N262Y"
        );
    }

    #[test]
    fn test_collapse_removes_double_dots() {
        assert_eq!(collapse(" a..\nb...\n"), "a b.");
        assert_eq!(collapse("x\n\ny"), "x  y");
    }

    #[test]
    fn test_mismatch_on_dot_residue() {
        // A lone '.' residue does not form ".." and is kept.
        let outcomes = vec![
            pair("M2K", AssertionOutcome::Match),
            pair("F3Q", AssertionOutcome::Mismatch('.')),
        ];
        assert_eq!(
            combination_note(&outcomes, false),
            "Detected mutation: M2K Mutation F3Q not detected. Found . at position 3. \
             Mutations not detected: F3Q"
        );
    }
}
