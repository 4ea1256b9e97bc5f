//! Append-only provenance history.

use crate::error::{ProvenanceError, Result};
use crate::step::ProvenanceStep;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The ordered history of a value, oldest step first.
///
/// A history always holds at least one step and only ever grows. Clones share
/// their buffer until one of them appends; `append` copies a shared buffer
/// before pushing, so diverged histories never observe each other's steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ProvenanceStep>", into = "Vec<ProvenanceStep>")]
pub struct Provenance {
    steps: Arc<Vec<ProvenanceStep>>,
}

#[allow(clippy::len_without_is_empty)]
impl Provenance {
    /// Start a history with its original step.
    pub fn new(step: ProvenanceStep) -> Self {
        Self {
            steps: Arc::new(vec![step]),
        }
    }

    /// Build a history from existing steps, oldest first.
    pub fn from_steps(steps: Vec<ProvenanceStep>) -> Result<Self> {
        if steps.is_empty() {
            return Err(ProvenanceError::EmptyHistory);
        }
        Ok(Self {
            steps: Arc::new(steps),
        })
    }

    /// Append a step. Amortized O(1); copies the buffer first if it is
    /// shared with a clone.
    pub fn append(&mut self, step: ProvenanceStep) {
        Arc::make_mut(&mut self.steps).push(step);
    }

    /// The most recent step.
    pub fn current(&self) -> &ProvenanceStep {
        // never empty: every constructor checks
        &self.steps[self.steps.len() - 1]
    }

    /// The first step.
    pub fn original(&self) -> &ProvenanceStep {
        &self.steps[0]
    }

    /// Step at `index`; negative indices count back from the end.
    pub fn get(&self, index: isize) -> Result<&ProvenanceStep> {
        let len = self.steps.len();
        let resolved = if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs()).filter(|i| *i < len)
        };
        resolved
            .and_then(|i| self.steps.get(i))
            .ok_or(ProvenanceError::HistoryIndex { index, len })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[ProvenanceStep] {
        &self.steps
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProvenanceStep> {
        self.steps.iter()
    }

    /// `self`'s steps followed by the steps of `later` that `self` does not
    /// already hold as a common prefix. `later`'s current step is always
    /// appended, so merging a history with itself adds exactly one step.
    pub(crate) fn concat_unshared(&self, later: &Provenance) -> Provenance {
        let shared = self
            .steps
            .iter()
            .zip(later.steps.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let start = shared.min(later.len() - 1);

        let mut steps = Vec::with_capacity(self.len() + later.len() - start);
        steps.extend(self.steps.iter().cloned());
        steps.extend(later.steps[start..].iter().cloned());
        Provenance {
            steps: Arc::new(steps),
        }
    }

    /// `self`'s steps followed by `later`'s, with `later`'s final step
    /// replaced by `last`.
    pub(crate) fn concat_restamped(&self, later: &Provenance, last: ProvenanceStep) -> Provenance {
        let mut steps = Vec::with_capacity(self.len() + later.len());
        steps.extend(self.steps.iter().cloned());
        steps.extend(later.steps[..later.len() - 1].iter().cloned());
        steps.push(last);
        Provenance {
            steps: Arc::new(steps),
        }
    }
}

impl TryFrom<Vec<ProvenanceStep>> for Provenance {
    type Error = ProvenanceError;

    fn try_from(steps: Vec<ProvenanceStep>) -> Result<Self> {
        Provenance::from_steps(steps)
    }
}

impl From<Provenance> for Vec<ProvenanceStep> {
    fn from(provenance: Provenance) -> Self {
        Arc::unwrap_or_clone(provenance.steps)
    }
}

impl<'a> IntoIterator for &'a Provenance {
    type Item = &'a ProvenanceStep;
    type IntoIter = std::slice::Iter<'a, ProvenanceStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(category: &str) -> ProvenanceStep {
        ProvenanceStep::new(category).unwrap()
    }

    fn categories(provenance: &Provenance) -> Vec<&str> {
        provenance.iter().map(|s| s.category()).collect()
    }

    #[test]
    fn test_new_has_one_step() {
        let provenance = Provenance::new(step("defaults"));
        assert_eq!(provenance.len(), 1);
        assert_eq!(provenance.original(), provenance.current());
    }

    #[test]
    fn test_from_steps_rejects_empty() {
        assert_eq!(
            Provenance::from_steps(Vec::new()).unwrap_err(),
            ProvenanceError::EmptyHistory
        );
    }

    #[test]
    fn test_append_and_accessors() {
        let mut provenance = Provenance::new(step("a"));
        provenance.append(step("b"));
        provenance.append(step("c"));

        assert_eq!(provenance.len(), 3);
        assert_eq!(provenance.original().category(), "a");
        assert_eq!(provenance.current().category(), "c");
        assert_eq!(categories(&provenance), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_negative_indexing() {
        let mut provenance = Provenance::new(step("a"));
        provenance.append(step("b"));
        provenance.append(step("c"));

        assert_eq!(provenance.get(0).unwrap().category(), "a");
        assert_eq!(provenance.get(2).unwrap().category(), "c");
        assert_eq!(provenance.get(-1).unwrap().category(), "c");
        assert_eq!(provenance.get(-3).unwrap().category(), "a");
    }

    #[test]
    fn test_index_out_of_range() {
        let provenance = Provenance::new(step("a"));

        assert_eq!(
            provenance.get(1).unwrap_err(),
            ProvenanceError::HistoryIndex { index: 1, len: 1 }
        );
        assert_eq!(
            provenance.get(-2).unwrap_err(),
            ProvenanceError::HistoryIndex { index: -2, len: 1 }
        );
        assert!(provenance.get(isize::MIN).is_err());
    }

    #[test]
    fn test_clones_diverge_on_append() {
        let mut first = Provenance::new(step("a"));
        let mut second = first.clone();

        first.append(step("b"));
        second.append(step("c"));

        assert_eq!(categories(&first), vec!["a", "b"]);
        assert_eq!(categories(&second), vec!["a", "c"]);
    }

    #[test]
    fn test_concat_restamped() {
        let mut base = Provenance::new(step("defaults"));
        base.append(step("defaults"));
        let mut later = Provenance::new(step("user"));
        later.append(step("env"));

        let merged = base.concat_restamped(&later, later.current().derive("merge"));
        assert_eq!(merged.len(), 4);
        assert_eq!(categories(&merged), vec!["defaults", "defaults", "user", "env"]);
        assert_eq!(merged.current().modified_by(), Some("merge"));
        // inputs untouched
        assert_eq!(later.current().modified_by(), None);
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_concat_unshared() {
        let mut history = Provenance::new(step("defaults"));
        history.append(step("user"));

        // a history merged with itself gains only its current step
        let doubled = history.concat_unshared(&history);
        assert_eq!(categories(&doubled), vec!["defaults", "user", "user"]);
        let again = doubled.concat_unshared(&doubled);
        assert_eq!(again.len(), 4);

        // a history that extends a shared prefix contributes its new steps
        let mut extended = history.clone();
        extended.append(step("env"));
        let merged = history.concat_unshared(&extended);
        assert_eq!(categories(&merged), vec!["defaults", "user", "env"]);

        // unrelated histories are concatenated whole
        let other = Provenance::new(step("cli"));
        let merged = history.concat_unshared(&other);
        assert_eq!(categories(&merged), vec!["defaults", "user", "cli"]);
    }

    #[test]
    fn test_serde_rejects_empty_history() {
        let provenance = Provenance::new(step("a"));
        let json = serde_json::to_string(&provenance).unwrap();
        assert!(json.starts_with('['));

        let back: Provenance = serde_json::from_str(&json).unwrap();
        assert_eq!(back, provenance);

        assert!(serde_json::from_str::<Provenance>("[]").is_err());
    }
}
