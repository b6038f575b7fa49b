use std::collections::HashMap;
use std::sync::Arc;

use super::{ActionHook, FilterHook, HookEvent};

/// Hooks registered per event, kept in registration order.
#[derive(Default)]
pub struct HookRegistry {
    filters: HashMap<HookEvent, Vec<Arc<dyn FilterHook>>>,
    actions: HashMap<HookEvent, Vec<Arc<dyn ActionHook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_filter(&mut self, event: HookEvent, hook: Arc<dyn FilterHook>) {
        self.filters.entry(event).or_default().push(hook);
    }

    pub fn register_action(&mut self, event: HookEvent, hook: Arc<dyn ActionHook>) {
        self.actions.entry(event).or_default().push(hook);
    }

    pub fn filters(&self, event: &HookEvent) -> &[Arc<dyn FilterHook>] {
        self.filters.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn actions(&self, event: &HookEvent) -> &[Arc<dyn ActionHook>] {
        self.actions.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(event, hook name)` pairs, sorted, for startup logging.
    pub fn describe(&self) -> Vec<(String, &'static str)> {
        let mut entries: Vec<(String, &'static str)> = self
            .filters
            .iter()
            .flat_map(|(event, hooks)| hooks.iter().map(move |h| (event.to_string(), h.name())))
            .chain(
                self.actions
                    .iter()
                    .flat_map(|(event, hooks)| hooks.iter().map(move |h| (event.to_string(), h.name()))),
            )
            .collect();
        entries.sort();
        entries
    }
}
