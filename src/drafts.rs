use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::GeneratedPersona;
use crate::selection::PersonaSelection;

pub const MAX_DRAFTS: usize = 64;

/// What happens once the persona selection is complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftPurpose {
    Test,
    Swarm { name: String, description: String },
}

impl DraftPurpose {
    pub fn is_swarm(&self) -> bool {
        matches!(self, DraftPurpose::Swarm { .. })
    }
}

/// Personas between generation and launch (or saving as a swarm).
#[derive(Debug, Clone)]
pub struct Draft {
    pub purpose: DraftPurpose,
    pub target_url: String,
    pub user_description: String,
    pub use_uxagent: bool,
    pub timeout_minutes: Option<u32>,
    pub personas: Vec<GeneratedPersona>,
    pub recommended: Vec<usize>,
    pub selection_reasoning: Option<String>,
    pub warning: Option<String>,
    pub selection: PersonaSelection,
}

/// In-process drafts, oldest evicted first once `MAX_DRAFTS` is reached.
pub struct DraftStore {
    next_id: AtomicU64,
    drafts: Mutex<VecDeque<(String, Draft)>>,
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            drafts: Mutex::new(VecDeque::new()),
        }
    }

    pub fn insert(&self, draft: Draft) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let generator = block_id::BlockId::new(block_id::Alphabet::alphanumeric(), 4817, 6);
        let id = generator
            .encode_string(n)
            .unwrap_or_else(|| format!("d{}", n));

        let mut drafts = self.lock();
        while drafts.len() >= MAX_DRAFTS {
            if let Some((evicted, _)) = drafts.pop_front() {
                tracing::debug!("evicting draft {}", evicted);
            }
        }
        drafts.push_back((id.clone(), draft));
        id
    }

    pub fn get(&self, id: &str) -> Option<Draft> {
        self.lock()
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, d)| d.clone())
    }

    /// Applies `f` to the draft and returns its result, or None if the draft is gone.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut Draft) -> R) -> Option<R> {
        let mut drafts = self.lock();
        drafts.iter_mut().find(|(k, _)| k == id).map(|(_, d)| f(d))
    }

    pub fn remove(&self, id: &str) -> Option<Draft> {
        let mut drafts = self.lock();
        let pos = drafts.iter().position(|(k, _)| k == id)?;
        drafts.remove(pos).map(|(_, d)| d)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<(String, Draft)>> {
        // a panic while holding the lock leaves plain data behind; keep serving it
        self.drafts.lock().unwrap_or_else(|e| e.into_inner())
    }
}
