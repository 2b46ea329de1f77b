//! # Label resolution
//! Labels are declared as `name:` on their own line and collected in a single forward
//! pass before execution starts. Names are case-insensitive.

use alloc::{collections::BTreeMap, string::String};
use log::debug;

use crate::{program::Line, LabelTarget};

/// Mapping from uppercase label names to the index of the line a jump lands on.
///
/// Built once per program and never modified while it runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelTable {
    targets: BTreeMap<String, usize>,
}
impl LabelTable {
    /// Collects every label of the given lines. When a name is declared twice, the
    /// last declaration wins.
    /// # Example
    /// ```rust
    /// # use opasm::*;
    /// let lines = tokenize("A:\nB\nC:\nD", &Dialect::REGISTER);
    /// let labels = LabelTable::resolve(&lines, LabelTarget::NextLine);
    /// assert_eq!(labels.get("a"), Some(1));
    /// assert_eq!(labels.get("C"), Some(3));
    /// assert_eq!(labels.get("B"), None);
    /// ```
    pub fn resolve(lines: &[Line], target: LabelTarget) -> Self {
        let mut targets = BTreeMap::new();
        for line in lines {
            let Some(name) = line.label_name() else {
                continue;
            };
            let destination = match target {
                LabelTarget::Label => line.index,
                LabelTarget::NextLine => line.index + 1,
            };
            if let Some(previous) = targets.insert(name, destination) {
                debug!(
                    "label `{}` redeclared, {previous} replaced by {destination}",
                    line.text
                );
            }
        }
        Self { targets }
    }

    /// Returns where a jump to the given label lands, if it was declared.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.targets.get(&name.to_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.targets
            .iter()
            .map(|(name, &target)| (name.as_str(), target))
    }
}
