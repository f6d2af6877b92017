use super::rotation::{CooldownLedger, RotationLedger};
use super::GameSession;
use crate::catalog::Catalog;
use crate::config::GameConfig;
use crate::events::GameEvent;
use crate::types::*;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Built-in and custom prompts plus the ledgers that decide which one comes next
#[derive(Debug, Clone)]
pub struct TaskPool {
    builtins: Vec<Prompt>,
    customs: Vec<Prompt>,
    rotation: RotationLedger,
    cooldowns: CooldownLedger,
    custom_cooldown_rounds: i32,
    suppression_min: u32,
    suppression_max: u32,
}

impl TaskPool {
    pub fn from_catalog(catalog: &Catalog, config: &GameConfig) -> Self {
        let builtins = catalog
            .entries()
            .iter()
            .map(|e| Prompt::new(e.category, e.text.clone(), PromptOrigin::BuiltIn))
            .collect();

        Self {
            builtins,
            customs: Vec::new(),
            rotation: RotationLedger::default(),
            cooldowns: CooldownLedger::default(),
            custom_cooldown_rounds: config.custom_cooldown_rounds,
            suppression_min: config.suppression_min,
            suppression_max: config.suppression_max.max(config.suppression_min),
        }
    }

    /// Hand out the next prompt for `requested`.
    ///
    /// In shuffle mode the category is a coin flip and `requested` is ignored.
    /// An eligible custom prompt wins whenever the category is not suppressed;
    /// otherwise a built-in prompt not yet served in this rotation is used.
    pub fn resolve<R: Rng + ?Sized>(
        &mut self,
        requested: Category,
        shuffle: bool,
        rng: &mut R,
    ) -> ResolvedPrompt {
        let category = if shuffle {
            Category::random(rng)
        } else {
            requested
        };

        self.cooldowns.decay_suppression(category);

        let custom_pick = if self.cooldowns.suppression(category) == 0 {
            let eligible: Vec<&Prompt> = self
                .customs
                .iter()
                .filter(|p| p.category == category)
                .filter(|p| self.cooldowns.is_eligible(category, &p.text))
                .collect();
            eligible.choose(rng).map(|p| (*p).clone())
        } else {
            None
        };

        let chosen = match custom_pick {
            Some(prompt) => {
                self.cooldowns
                    .arm(category, &prompt.text, self.custom_cooldown_rounds);
                let rounds = rng.random_range(self.suppression_min..=self.suppression_max);
                self.cooldowns.suppress(category, rounds);
                tracing::debug!(%category, suppression = rounds, "Serving custom prompt");
                prompt
            }
            None => {
                self.cooldowns.tick_customs(
                    category,
                    self.customs.iter().filter(|p| p.category == category),
                );
                self.pick_builtin(category, rng)
            }
        };

        self.rotation.record(category, &chosen.text);

        ResolvedPrompt {
            category,
            text: chosen.text,
            origin: chosen.origin,
        }
    }

    fn pick_builtin<R: Rng + ?Sized>(&mut self, category: Category, rng: &mut R) -> Prompt {
        let pool: Vec<Prompt> = self
            .builtins
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect();

        if self.rotation.available(category, &pool).is_empty() {
            tracing::debug!(%category, "All built-in prompts served, starting a new rotation");
            self.rotation.clear(category);
        }

        let available = self.rotation.available(category, &pool);
        match available.choose(rng) {
            Some(prompt) => (*prompt).clone(),
            // Unreachable with a catalog built by `Catalog::from_entries`
            None => Prompt::new(category, String::new(), PromptOrigin::BuiltIn),
        }
    }

    /// Add a user prompt; blank text and duplicates within the category are ignored
    pub fn add_custom(&mut self, category: Category, text: &str) -> Option<Prompt> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if self
            .customs
            .iter()
            .any(|p| p.category == category && p.text == text)
        {
            return None;
        }

        let prompt = Prompt::new(category, text, PromptOrigin::Custom);
        self.customs.push(prompt.clone());
        Some(prompt)
    }

    /// Remove a user prompt by id. Built-in prompts cannot be removed.
    pub fn remove_custom(&mut self, id: &str) -> Option<Prompt> {
        let pos = self.customs.iter().position(|p| p.id == id)?;
        let prompt = self.customs.remove(pos);
        self.rotation.forget(prompt.category, &prompt.text);
        self.cooldowns.forget(prompt.category, &prompt.text);
        Some(prompt)
    }

    pub fn clear_custom(&mut self) {
        self.customs.clear();
        self.reset_ledgers();
    }

    pub fn reset_ledgers(&mut self) {
        self.rotation.reset();
        self.cooldowns.reset();
    }

    pub fn builtins(&self, category: Category) -> Vec<&Prompt> {
        self.builtins
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    pub fn customs(&self, category: Category) -> Vec<&Prompt> {
        self.customs
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    pub fn rotation(&self) -> &RotationLedger {
        &self.rotation
    }

    pub fn cooldowns(&self) -> &CooldownLedger {
        &self.cooldowns
    }
}

impl GameSession {
    /// Add a custom prompt to the pool
    pub async fn add_custom_prompt(&self, category: Category, text: &str) -> Option<Prompt> {
        let prompt = self.pool.write().await.add_custom(category, text)?;
        tracing::info!(%category, id = %prompt.id, "Added custom prompt");
        self.emit(GameEvent::CustomPromptAdded {
            prompt: prompt.clone(),
        });
        Some(prompt)
    }

    /// Remove a custom prompt by id
    /// Returns true if the prompt was found and removed
    pub async fn remove_custom_prompt(&self, id: &str) -> bool {
        let removed = self.pool.write().await.remove_custom(id);
        match removed {
            Some(prompt) => {
                tracing::info!(id = %prompt.id, "Removed custom prompt");
                self.emit(GameEvent::CustomPromptRemoved { id: prompt.id });
                true
            }
            None => false,
        }
    }

    /// Custom prompts of one category
    pub async fn custom_prompts(&self, category: Category) -> Vec<Prompt> {
        self.pool
            .read()
            .await
            .customs(category)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Resolve a prompt outside of the round flow (no stats, no round update)
    pub async fn resolve_prompt(&self, category: Category, shuffle: bool) -> ResolvedPrompt {
        let mut pool = self.pool.write().await;
        let mut rng = rand::rng();
        pool.resolve(category, shuffle, &mut rng)
    }
}
