// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use ducomm_app::{
    Action, Completion, Delivery, Effect, Lane, NavRequest, NavigationStack, Outcome, Request,
    ReturnState, Target, View, ViewError, ViewEvent, ViewFactory, ViewId,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::Backend;

type EventListener = Box<dyn FnMut(ViewId, ViewEvent)>;

/// What a finished task sends back. `completion` is `None` when the task was
/// cancelled before its work finished.
#[derive(Debug)]
struct Envelope {
    view: ViewId,
    lane: Lane,
    generation: u64,
    completion: Option<Completion>,
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    token: CancellationToken,
}

/// Hosts the navigation stack and runs view effects on tokio tasks.
///
/// Every (view, lane) pair has at most one live task. Starting new work on a
/// lane cancels the previous task, and views leaving the stack have all of
/// their lanes cancelled. Completions are applied one at a time from
/// [`Shell::next_delivery`].
pub struct Shell<B> {
    backend: Arc<B>,
    factory: ViewFactory,
    stack: NavigationStack<View>,
    in_flight: HashMap<(ViewId, Lane), InFlight>,
    sender: mpsc::UnboundedSender<Envelope>,
    receiver: mpsc::UnboundedReceiver<Envelope>,
    outstanding: usize,
    event_listeners: Vec<EventListener>,
}

impl<B: Backend> Shell<B> {
    pub fn new(backend: Arc<B>, factory: ViewFactory) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            backend,
            factory,
            stack: NavigationStack::new(),
            in_flight: HashMap::new(),
            sender,
            receiver,
            outstanding: 0,
            event_listeners: Vec::new(),
        }
    }

    pub fn current(&self) -> Option<&View> {
        self.stack.current()
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// Live views, current first.
    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.stack.views()
    }

    pub fn factory(&self) -> &ViewFactory {
        &self.factory
    }

    /// Tasks started but not yet delivered.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn subscribe_navigation(&mut self, listener: impl FnMut(&View) + 'static) {
        self.stack.subscribe(listener);
    }

    pub fn subscribe_events(&mut self, listener: impl FnMut(ViewId, ViewEvent) + 'static) {
        self.event_listeners.push(Box::new(listener));
    }

    /// Navigates to a fresh agencies list on top of whatever is showing.
    pub fn open_agencies(&mut self) -> ViewId {
        let (id, outcome) = self.open(Target::Agencies, None);
        self.apply(id, outcome);
        id
    }

    pub fn dispatch(&mut self, action: Action) {
        let Some(view) = self.stack.current_mut() else {
            debug!(?action, "no current view for action");
            return;
        };
        let id = view.id();
        let outcome = view.handle(action);
        self.apply(id, outcome);
    }

    /// Waits for one task to finish and applies it. Returns false when
    /// nothing is outstanding.
    pub async fn next_delivery(&mut self) -> bool {
        if self.outstanding == 0 {
            return false;
        }
        let Some(envelope) = self.receiver.recv().await else {
            return false;
        };
        self.outstanding -= 1;
        self.receive(envelope);
        true
    }

    /// Applies deliveries until no task is outstanding, including the ones
    /// started along the way.
    pub async fn run_until_idle(&mut self) {
        while self.next_delivery().await {}
    }

    fn receive(&mut self, envelope: Envelope) {
        let Envelope {
            view,
            lane,
            generation,
            completion,
        } = envelope;
        if self
            .in_flight
            .get(&(view, lane))
            .is_some_and(|task| task.generation == generation)
        {
            self.in_flight.remove(&(view, lane));
        }

        let Some(completion) = completion else {
            debug!(%view, lane = lane.as_str(), generation, "cancelled task finished");
            return;
        };
        let Some(target) = self.stack.views_mut().find(|live| live.id() == view) else {
            debug!(%view, lane = lane.as_str(), generation, "dropping delivery for closed view");
            return;
        };
        let outcome = target.deliver(Delivery {
            view,
            generation,
            completion,
        });
        self.apply(view, outcome);
    }

    /// Applies an outcome and any outcomes produced by the navigation it
    /// requests, in order.
    fn apply(&mut self, view: ViewId, outcome: Outcome) {
        let mut queue = VecDeque::from([(view, outcome)]);
        while let Some((view, outcome)) = queue.pop_front() {
            let Outcome {
                events,
                effects,
                navigation,
            } = outcome;
            for event in events {
                for listener in &mut self.event_listeners {
                    listener(view, event);
                }
            }
            for effect in effects {
                self.start(view, effect);
            }

            let Some(navigation) = navigation else {
                continue;
            };
            if self.current_id() != Some(view) {
                debug!(%view, ?navigation, "ignoring navigation from background view");
                continue;
            }
            if let Some(next) = self.navigate(navigation) {
                queue.push_back(next);
            }
        }
    }

    fn navigate(&mut self, request: NavRequest) -> Option<(ViewId, Outcome)> {
        match request {
            NavRequest::Open {
                target,
                return_state,
            } => Some(self.open(target, return_state)),
            NavRequest::Back(state) => {
                let leaving = self.current_id()?;
                let Some(outcome) = self.stack.go_back(state) else {
                    debug!(view = %leaving, "back requested at the root");
                    return None;
                };
                self.close(leaving);
                let id = self.current_id()?;
                info!(from = %leaving, to = %id, depth = self.stack.depth(), "navigated back");
                Some((id, outcome))
            }
        }
    }

    fn open(&mut self, target: Target, return_state: Option<ReturnState>) -> (ViewId, Outcome) {
        let view = self.factory.build(target);
        let id = view.id();
        info!(
            view = %id,
            kind = view.kind().as_str(),
            depth = self.stack.depth(),
            "navigating"
        );
        let outcome = self.stack.navigate(view, return_state);
        (id, outcome)
    }

    fn current_id(&self) -> Option<ViewId> {
        self.stack.current().map(View::id)
    }

    fn start(&mut self, view: ViewId, effect: Effect) {
        let Effect {
            generation,
            request,
        } = effect;
        let lane = request.lane();
        if let Some(previous) = self.in_flight.remove(&(view, lane)) {
            debug!(
                %view,
                lane = lane.as_str(),
                generation = previous.generation,
                "cancelling superseded task"
            );
            previous.token.cancel();
        }
        if matches!(request, Request::Cancel(_)) {
            return;
        }

        let token = CancellationToken::new();
        self.in_flight.insert(
            (view, lane),
            InFlight {
                generation,
                token: token.clone(),
            },
        );
        self.outstanding += 1;

        let backend = Arc::clone(&self.backend);
        let sender = self.sender.clone();
        tokio::spawn(async move {
            let completion = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                completion = perform(backend.as_ref(), request, token.clone()) => completion,
            };
            let envelope = Envelope {
                view,
                lane,
                generation,
                completion,
            };
            if sender.send(envelope).is_err() {
                debug!(%view, lane = lane.as_str(), "shell gone before delivery");
            }
        });
    }

    fn close(&mut self, view: ViewId) {
        self.in_flight.retain(|(owner, lane), task| {
            if *owner != view {
                return true;
            }
            debug!(%view, lane = lane.as_str(), "cancelling task of closed view");
            task.token.cancel();
            false
        });
    }
}

impl<B> Drop for Shell<B> {
    fn drop(&mut self) {
        for task in self.in_flight.values() {
            task.token.cancel();
        }
    }
}

async fn perform<B: Backend>(
    backend: &B,
    request: Request,
    cancel: CancellationToken,
) -> Option<Completion> {
    let completion = match request {
        Request::DebounceRefresh { delay } => {
            tokio::time::sleep(delay).await;
            Completion::DebounceElapsed
        }
        Request::FetchAgencies(query) => Completion::Agencies(
            backend
                .list_agencies(query, cancel)
                .await
                .map_err(view_error),
        ),
        Request::LoadAgency(id) => {
            Completion::Agency(backend.get_agency(id).await.map_err(view_error))
        }
        Request::UpdateAgency { id, update } => {
            Completion::Updated(backend.update_agency(id, update).await.map_err(view_error))
        }
        Request::CreateAgency(agency) => {
            Completion::Created(backend.create_agency(agency).await.map_err(view_error))
        }
        Request::DeleteAgency(id) => {
            Completion::Deleted(backend.delete_agency(id).await.map_err(view_error))
        }
        Request::LookupScope => Completion::Scope(
            backend
                .current_dispatch_center(cancel)
                .await
                .map_err(view_error),
        ),
        Request::Cancel(_) => return None,
    };
    Some(completion)
}

fn view_error(error: anyhow::Error) -> ViewError {
    ViewError::from_anyhow(&error)
}
