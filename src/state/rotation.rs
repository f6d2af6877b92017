//! Anti-repeat bookkeeping for the task pool.
//!
//! `RotationLedger` remembers which prompts were served since the last reset
//! of a category. `CooldownLedger` throttles custom prompts, both per prompt
//! and category-wide.

use crate::types::{Category, Prompt};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct RotationLedger {
    used: HashMap<Category, HashSet<String>>,
}

impl RotationLedger {
    /// Prompts from `pool` not yet served in this rotation
    pub fn available<'a>(&self, category: Category, pool: &'a [Prompt]) -> Vec<&'a Prompt> {
        let used = self.used.get(&category);
        pool.iter()
            .filter(|p| !used.is_some_and(|u| u.contains(&p.text)))
            .collect()
    }

    pub fn record(&mut self, category: Category, text: &str) {
        self.used
            .entry(category)
            .or_default()
            .insert(text.to_string());
    }

    pub fn clear(&mut self, category: Category) {
        if let Some(used) = self.used.get_mut(&category) {
            used.clear();
        }
    }

    /// Drop a single prompt (used when a custom prompt is deleted)
    pub fn forget(&mut self, category: Category, text: &str) {
        if let Some(used) = self.used.get_mut(&category) {
            used.remove(text);
        }
    }

    pub fn contains(&self, category: Category, text: &str) -> bool {
        self.used
            .get(&category)
            .is_some_and(|used| used.contains(text))
    }

    pub fn used_count(&self, category: Category) -> usize {
        self.used.get(&category).map_or(0, HashSet::len)
    }

    pub fn reset(&mut self) {
        self.used.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct CooldownLedger {
    /// Rounds left before a custom prompt may be served again (<= 0 means eligible)
    prompts: HashMap<(Category, String), i32>,
    /// Rounds left during which no custom prompt of the category may be served
    suppression: HashMap<Category, u32>,
}

impl CooldownLedger {
    /// Count the category-wide suppression down by one, stopping at zero
    pub fn decay_suppression(&mut self, category: Category) {
        if let Some(rounds) = self.suppression.get_mut(&category) {
            *rounds = rounds.saturating_sub(1);
        }
    }

    pub fn suppression(&self, category: Category) -> u32 {
        self.suppression.get(&category).copied().unwrap_or(0)
    }

    pub fn suppress(&mut self, category: Category, rounds: u32) {
        self.suppression.insert(category, rounds);
    }

    pub fn cooldown(&self, category: Category, text: &str) -> i32 {
        self.prompts
            .get(&(category, text.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_eligible(&self, category: Category, text: &str) -> bool {
        self.cooldown(category, text) <= 0
    }

    /// Put a freshly served custom prompt on cooldown
    pub fn arm(&mut self, category: Category, text: &str, rounds: i32) {
        self.prompts.insert((category, text.to_string()), rounds);
    }

    /// Count every listed custom prompt down by one; values may go negative
    pub fn tick_customs<'a>(
        &mut self,
        category: Category,
        customs: impl IntoIterator<Item = &'a Prompt>,
    ) {
        for prompt in customs {
            *self
                .prompts
                .entry((category, prompt.text.clone()))
                .or_insert(0) -= 1;
        }
    }

    pub fn forget(&mut self, category: Category, text: &str) {
        self.prompts.remove(&(category, text.to_string()));
    }

    pub fn reset(&mut self) {
        self.prompts.clear();
        self.suppression.clear();
    }
}
