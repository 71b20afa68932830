// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ReturnState;

/// Activation hook for views living on a [`NavigationStack`].
pub trait NavigationAware {
    type Outcome;

    /// `state` is what the view is being handed (`None` on a fresh navigate).
    /// `parent` is the state stored with the entry now on top of the stack.
    fn on_navigated_to(
        &mut self,
        state: Option<ReturnState>,
        parent: Option<&ReturnState>,
    ) -> Self::Outcome;
}

struct Entry<V> {
    view: V,
    state: Option<ReturnState>,
}

type Listener<V> = Box<dyn FnMut(&V)>;

pub struct NavigationStack<V> {
    current: Option<V>,
    entries: Vec<Entry<V>>,
    listeners: Vec<Listener<V>>,
}

impl<V> Default for NavigationStack<V> {
    fn default() -> Self {
        Self {
            current: None,
            entries: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

impl<V: NavigationAware> NavigationStack<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes the current view (if any) with `return_state`, then activates
    /// `view` with no state.
    pub fn navigate(&mut self, view: V, return_state: Option<ReturnState>) -> V::Outcome {
        let Self {
            current,
            entries,
            listeners,
        } = self;
        if let Some(previous) = current.take() {
            entries.push(Entry {
                view: previous,
                state: return_state,
            });
        }
        let view = current.insert(view);
        for listener in listeners.iter_mut() {
            listener(&*view);
        }
        let parent = entries.last().and_then(|entry| entry.state.as_ref());
        view.on_navigated_to(None, parent)
    }

    /// Pops the top entry and reactivates it with `state_override`, falling
    /// back to the state stored with it. Returns `None` when the stack is
    /// empty, leaving the current view untouched.
    pub fn go_back(&mut self, state_override: Option<ReturnState>) -> Option<V::Outcome> {
        let Self {
            current,
            entries,
            listeners,
        } = self;
        let entry = entries.pop()?;
        let state = state_override.or(entry.state);
        let view = current.insert(entry.view);
        for listener in listeners.iter_mut() {
            listener(&*view);
        }
        let parent = entries.last().and_then(|entry| entry.state.as_ref());
        Some(view.on_navigated_to(state, parent))
    }
}

impl<V> NavigationStack<V> {
    pub fn current(&self) -> Option<&V> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut V> {
        self.current.as_mut()
    }

    pub fn current_return_state(&self) -> Option<&ReturnState> {
        self.entries.last().and_then(|entry| entry.state.as_ref())
    }

    /// Number of stacked entries below the current view.
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&V) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Current view first, then the stacked views from the top down.
    pub fn views(&self) -> impl Iterator<Item = &V> {
        self.current
            .iter()
            .chain(self.entries.iter().rev().map(|entry| &entry.view))
    }

    pub fn views_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.current
            .iter_mut()
            .chain(self.entries.iter_mut().rev().map(|entry| &mut entry.view))
    }
}
