//! Category hierarchies and provenance-preserving merges.
//!
//! A [`HierarchyConfig`] totally orders a set of named categories by
//! priority. A [`HierarchyManager`] uses that order to merge wrapped trees:
//! mappings merge key by key, everything else is resolved as a whole by
//! comparing the current category of each side.
//!
//! # History linearization
//!
//! For a conflicting pair `(base, override)` the result's history is:
//!
//! - override wins: `base ++ override`, with override's last step
//!   re-recorded as modified by `"merge"`
//! - same category: `base` followed by the steps of `override` past their
//!   common prefix, and at least override's current step
//! - base wins: `base` plus a `"shadowed"` step whose choose history records
//!   both candidates
//!
//! Two mappings that are merged key by key take the same history, except
//! that a winning base records a plain `"merge"` step: nothing was rejected.
//!
//! So histories only ever grow, and a value's original step stays the base's.

use crate::error::{ProvenanceError, Result};
use crate::provenance::Provenance;
use crate::step::ChooseRecord;
use crate::value::{ValueKind, WrappedValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// `modified_by` of the step recorded when an override replaces a value.
pub const MODIFIED_BY_MERGE: &str = "merge";

/// `modified_by` of the step recorded when a higher-priority base value
/// rejects an override.
pub const MODIFIED_BY_SHADOWED: &str = "shadowed";

/// `modified_by` of the step recorded by [`HierarchyManager::choose`].
pub const MODIFIED_BY_CHOOSE: &str = "choose";

/// A named category and its priority. Higher priorities win.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLevel {
    pub name: String,
    pub priority: i64,
}

impl CategoryLevel {
    pub fn new(name: impl Into<String>, priority: i64) -> Self {
        Self {
            name: name.into(),
            priority,
        }
    }
}

/// A validated total order over categories.
///
/// Names are unique and non-empty, priorities are distinct. Levels are kept
/// sorted from lowest to highest priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CategoryLevel>", into = "Vec<CategoryLevel>")]
pub struct HierarchyConfig {
    levels: Vec<CategoryLevel>,
    index: HashMap<String, i64>,
}

impl HierarchyConfig {
    pub fn new(levels: impl IntoIterator<Item = CategoryLevel>) -> Result<Self> {
        let mut levels: Vec<CategoryLevel> = levels.into_iter().collect();
        let mut index = HashMap::with_capacity(levels.len());
        let mut by_priority: HashMap<i64, &str> = HashMap::with_capacity(levels.len());

        for level in &levels {
            if level.name.trim().is_empty() {
                return Err(ProvenanceError::EmptyCategory);
            }
            if index.insert(level.name.clone(), level.priority).is_some() {
                return Err(ProvenanceError::DuplicateCategory(level.name.clone()));
            }
            if let Some(first) = by_priority.insert(level.priority, &level.name) {
                return Err(ProvenanceError::PriorityConflict {
                    first: first.to_string(),
                    second: level.name.clone(),
                    priority: level.priority,
                });
            }
        }

        levels.sort_by_key(|level| level.priority);
        Ok(Self { levels, index })
    }

    /// Build a hierarchy from names listed lowest priority first.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .zip(0i64..)
                .map(|(name, priority)| CategoryLevel::new(name, priority)),
        )
    }

    pub fn priority(&self, category: &str) -> Option<i64> {
        self.index.get(category).copied()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.index.contains_key(category)
    }

    /// Levels from lowest to highest priority.
    pub fn levels(&self) -> &[CategoryLevel] {
        &self.levels
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|level| level.name.as_str())
    }
}

impl TryFrom<Vec<CategoryLevel>> for HierarchyConfig {
    type Error = ProvenanceError;

    fn try_from(levels: Vec<CategoryLevel>) -> Result<Self> {
        HierarchyConfig::new(levels)
    }
}

impl From<HierarchyConfig> for Vec<CategoryLevel> {
    fn from(config: HierarchyConfig) -> Self {
        config.levels
    }
}

/// Which side of a conflicting pair was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Winner {
    Base,
    Override,
}

/// Merges wrapped trees according to a [`HierarchyConfig`].
///
/// Merging never mutates its inputs: both trees are borrowed and the result
/// is a fresh tree.
#[derive(Debug, Clone)]
pub struct HierarchyManager {
    config: HierarchyConfig,
    shadow_audit: bool,
}

impl HierarchyManager {
    pub fn new(config: HierarchyConfig) -> Self {
        Self {
            config,
            shadow_audit: true,
        }
    }

    /// Shorthand for a manager over [`HierarchyConfig::from_names`].
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::new(HierarchyConfig::from_names(names)?))
    }

    /// Whether a rejected override leaves a `"shadowed"` step in the kept
    /// value's history (default: on).
    pub fn with_shadow_audit(mut self, enabled: bool) -> Self {
        self.shadow_audit = enabled;
        self
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    fn priority(&self, category: &str) -> Result<i64> {
        self.config
            .priority(category)
            .ok_or_else(|| ProvenanceError::UnknownCategory(category.to_string()))
    }

    /// Compare two categories by priority.
    pub fn compare(&self, a: &str, b: &str) -> Result<Ordering> {
        Ok(self.priority(a)?.cmp(&self.priority(b)?))
    }

    /// Merge `override_value` onto `base`.
    ///
    /// Both trees are checked for unregistered categories before anything is
    /// merged.
    pub fn merge(&self, base: &WrappedValue, override_value: &WrappedValue) -> Result<WrappedValue> {
        self.check_categories(base)?;
        self.check_categories(override_value)?;
        self.merge_node(base, override_value)
    }

    /// Left fold of [`merge`](Self::merge) over `values`.
    pub fn merge_all<'a, I>(&self, values: I) -> Result<WrappedValue>
    where
        I: IntoIterator<Item = &'a WrappedValue>,
    {
        let mut values = values.into_iter();
        let first = values.next().ok_or(ProvenanceError::NothingToMerge)?;
        self.check_categories(first)?;

        let mut merged = first.clone();
        for value in values {
            merged = self.merge(&merged, value)?;
        }
        Ok(merged)
    }

    /// Pick the alternative with the highest-priority current category.
    ///
    /// Ties go to the later alternative. The result keeps the winner's
    /// history plus one `"choose"` step listing every alternative.
    pub fn choose<'a, I>(&self, alternatives: I) -> Result<WrappedValue>
    where
        I: IntoIterator<Item = &'a WrappedValue>,
    {
        let alternatives: Vec<&WrappedValue> = alternatives.into_iter().collect();

        let mut selected: Option<(usize, i64)> = None;
        for (i, candidate) in alternatives.iter().enumerate() {
            let priority = self.priority(candidate.provenance().current().category())?;
            if selected.is_none_or(|(_, best)| priority >= best) {
                selected = Some((i, priority));
            }
        }
        let (selected, _) = selected.ok_or(ProvenanceError::NothingToMerge)?;

        let records = alternatives
            .iter()
            .enumerate()
            .map(|(i, candidate)| ChooseRecord {
                step: candidate.provenance().current().clone(),
                value: candidate.to_string(),
                selected: i == selected,
            })
            .collect();

        let winner = alternatives[selected];
        let step = winner
            .provenance()
            .current()
            .derive(MODIFIED_BY_CHOOSE)
            .with_choose_history(records);

        let mut result = winner.clone();
        result.provenance_mut().append(step);
        Ok(result)
    }

    fn check_categories(&self, value: &WrappedValue) -> Result<()> {
        self.priority(value.provenance().current().category())?;
        match value.kind() {
            ValueKind::Mapping(entries) => entries
                .values()
                .try_for_each(|child| self.check_categories(child)),
            ValueKind::Sequence(items) => items
                .iter()
                .try_for_each(|child| self.check_categories(child)),
            ValueKind::Scalar(_) => Ok(()),
        }
    }

    fn merge_node(&self, base: &WrappedValue, override_value: &WrappedValue) -> Result<WrappedValue> {
        match (base.kind(), override_value.kind()) {
            (ValueKind::Mapping(base_entries), ValueKind::Mapping(override_entries)) => {
                let mut entries = IndexMap::with_capacity(base_entries.len());
                for (key, base_child) in base_entries {
                    let child = match override_entries.get(key) {
                        Some(override_child) => self.merge_node(base_child, override_child)?,
                        None => base_child.clone(),
                    };
                    entries.insert(key.clone(), child);
                }
                for (key, override_child) in override_entries {
                    if !base_entries.contains_key(key) {
                        entries.insert(key.clone(), override_child.clone());
                    }
                }

                let provenance = self.resolve_mapping(base, override_value)?;
                Ok(WrappedValue::mapping(entries, provenance))
            }
            _ => {
                let (winner, provenance) = self.resolve(base, override_value)?;
                let kept = match winner {
                    Winner::Base => base,
                    Winner::Override => override_value,
                };
                Ok(kept.clone().with_provenance(provenance))
            }
        }
    }

    /// History of a deep-merged mapping. Both sides contributed entries, so
    /// neither is recorded as rejected: a higher base gains a plain
    /// `"merge"` step instead of a shadowed one.
    fn resolve_mapping(
        &self,
        base: &WrappedValue,
        override_value: &WrappedValue,
    ) -> Result<Provenance> {
        let base_history = base.provenance();
        let ordering = self.compare(
            base_history.current().category(),
            override_value.provenance().current().category(),
        )?;

        if ordering == Ordering::Greater {
            let mut history = base_history.clone();
            history.append(base_history.current().derive(MODIFIED_BY_MERGE));
            return Ok(history);
        }
        let (_, history) = self.resolve(base, override_value)?;
        Ok(history)
    }

    fn resolve(
        &self,
        base: &WrappedValue,
        override_value: &WrappedValue,
    ) -> Result<(Winner, Provenance)> {
        let base_history = base.provenance();
        let override_history = override_value.provenance();

        let ordering = self.compare(
            base_history.current().category(),
            override_history.current().category(),
        )?;

        match ordering {
            Ordering::Less => {
                let last = override_history.current().derive(MODIFIED_BY_MERGE);
                Ok((
                    Winner::Override,
                    base_history.concat_restamped(override_history, last),
                ))
            }
            Ordering::Equal => Ok((
                Winner::Override,
                base_history.concat_unshared(override_history),
            )),
            Ordering::Greater => {
                let mut history = base_history.clone();
                if self.shadow_audit {
                    let kept = base_history.current();
                    let step = kept.derive(MODIFIED_BY_SHADOWED).with_choose_history(vec![
                        ChooseRecord {
                            step: kept.clone(),
                            value: base.to_string(),
                            selected: true,
                        },
                        ChooseRecord {
                            step: override_history.current().clone(),
                            value: override_value.to_string(),
                            selected: false,
                        },
                    ]);
                    history.append(step);
                }
                Ok((Winner::Base, history))
            }
        }
    }
}
