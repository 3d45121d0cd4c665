use crate::models::GeneratedPersona;

pub const MIN_AGENTS: usize = 1;
pub const MAX_AGENTS: usize = 5;
pub const DEFAULT_AGENTS: usize = 3;

/// Which generated personas will be deployed as agents.
///
/// `selected` keeps click order and never grows past `agent_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaSelection {
    agent_count: usize,
    persona_count: usize,
    selected: Vec<usize>,
}

pub fn clamp_agent_count(n: usize) -> usize {
    n.clamp(MIN_AGENTS, MAX_AGENTS)
}

impl PersonaSelection {
    pub fn new(agent_count: usize, persona_count: usize) -> Self {
        Self {
            agent_count: clamp_agent_count(agent_count),
            persona_count,
            selected: Vec::new(),
        }
    }

    /// Seeds the selection from the upstream's recommendation, dropping
    /// out-of-range and repeated indices.
    pub fn from_recommended(recommended: &[usize], persona_count: usize, agent_count: usize) -> Self {
        let mut selection = Self::new(agent_count, persona_count);
        for &index in recommended {
            if selection.selected.len() == selection.agent_count {
                break;
            }
            if index < persona_count && !selection.selected.contains(&index) {
                selection.selected.push(index);
            }
        }
        selection
    }

    /// Every persona in order, capped at `agent_count`, as used when a saved
    /// swarm is launched directly.
    pub fn first_n(persona_count: usize, agent_count: usize) -> Self {
        let mut selection = Self::new(agent_count, persona_count);
        selection.selected = (0..persona_count.min(selection.agent_count)).collect();
        selection
    }

    /// Deselects a selected persona unconditionally; selects an unselected one
    /// only while there is room. Returns whether anything changed.
    pub fn toggle(&mut self, index: usize) -> bool {
        if let Some(pos) = self.selected.iter().position(|&i| i == index) {
            self.selected.remove(pos);
            return true;
        }
        if index < self.persona_count && self.selected.len() < self.agent_count {
            self.selected.push(index);
            return true;
        }
        false
    }

    /// Tops the selection up from `order` until it is complete.
    pub fn fill_from(&mut self, order: &[usize]) {
        for &index in order {
            if self.is_complete() {
                break;
            }
            if !self.is_selected(index) {
                self.toggle(index);
            }
        }
    }

    pub fn set_agent_count(&mut self, n: usize) {
        self.agent_count = clamp_agent_count(n);
        self.selected.truncate(self.agent_count);
    }

    pub fn agent_count(&self) -> usize {
        self.agent_count
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Whether clicking `index` would do anything
    pub fn can_toggle(&self, index: usize) -> bool {
        self.is_selected(index) || self.selected.len() < self.agent_count
    }

    pub fn is_complete(&self) -> bool {
        self.selected.len() == self.agent_count
    }

    pub fn remaining(&self) -> usize {
        self.agent_count - self.selected.len()
    }
}

/// Card order on the selection page: recommended personas first, then by
/// relevance, highest first. Ties keep generation order.
pub fn display_order(personas: &[GeneratedPersona], recommended: &[usize]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..personas.len()).collect();
    order.sort_by(|&a, &b| {
        recommended
            .contains(&b)
            .cmp(&recommended.contains(&a))
            .then_with(|| {
                personas[b]
                    .relevance_score
                    .partial_cmp(&personas[a].relevance_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
    order
}
