//! Per-resource client state: the last body the server sent, a loading flag and
//! the last error message.
//!
//! Every request runs as a spawned task owned by the store and carries a
//! generation token. Starting a load supersedes whatever is in flight, a save is
//! refused while anything is in flight, and dropping the store aborts the
//! outstanding task so a view that is gone never receives a late update.

use std::future::Future;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;

use crate::api::{ApiError, ConsoleClient, Prompts, Resource, Writable};
use crate::models::Prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Save,
}

/// What a finished request did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    Loaded,
    LoadFailed(String),
    Saved,
    SaveFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("a request for the {0} is still in progress")]
    Busy(&'static str),
    #[error("the {0} has not been loaded yet")]
    NotLoaded(&'static str),
    #[error("{0}")]
    Failed(String),
}

type Delivery<T> = (u64, Result<T, ApiError>);

struct InFlight<T> {
    operation: Operation,
    generation: u64,
    rx: oneshot::Receiver<Delivery<T>>,
    task: JoinHandle<()>,
}

impl<T> Drop for InFlight<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct ResourceStore<R: Resource> {
    client: ConsoleClient,
    data: Option<R::Body>,
    loading: bool,
    saving: bool,
    error: Option<String>,
    generation: u64,
    in_flight: Option<InFlight<R::Body>>,
}

impl<R: Resource> ResourceStore<R> {
    pub fn new(client: ConsoleClient) -> Self {
        Self {
            client,
            data: None,
            loading: false,
            saving: false,
            error: None,
            generation: 0,
            in_flight: None,
        }
    }

    /// A store that already holds `body`, as if a load had just succeeded.
    pub fn preloaded(client: ConsoleClient, body: R::Body) -> Self {
        let mut store = Self::new(client);
        store.data = Some(R::normalize(body));
        store
    }

    pub fn data(&self) -> Option<&R::Body> {
        self.data.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The last loaded body. Full-replacement writes are built from it, so
    /// there is nothing to build from before a load has succeeded.
    pub fn loaded(&self) -> Result<&R::Body, StoreError> {
        self.data.as_ref().ok_or(StoreError::NotLoaded(R::NAME))
    }

    pub fn ensure_idle(&self) -> Result<(), StoreError> {
        if self.is_busy() {
            return Err(StoreError::Busy(R::NAME));
        }
        Ok(())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Issues a read. Any request still in flight is aborted and its response
    /// will never be applied.
    pub fn start_load(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            tracing::debug!(
                resource = R::NAME,
                generation = previous.generation,
                operation = ?previous.operation,
                "superseded by a new load"
            );
            self.saving = false;
        }

        self.generation += 1;
        self.loading = true;
        self.error = None;

        let client = self.client.clone();
        self.dispatch(Operation::Load, async move { client.fetch::<R>().await });
    }

    /// Alias of [`start_load`](Self::start_load) for the retry action.
    pub fn start_refetch(&mut self) {
        self.start_load();
    }

    pub async fn load(&mut self) -> Result<(), StoreError> {
        self.start_load();
        self.finish(Operation::Load).await
    }

    pub async fn refetch(&mut self) -> Result<(), StoreError> {
        self.load().await
    }

    /// Applies the in-flight response if it has arrived. Never blocks.
    pub fn poll(&mut self) -> Option<Settled> {
        let flight = self.in_flight.as_mut()?;
        let received = match flight.rx.try_recv() {
            Ok(delivery) => Some(delivery),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => None,
        };
        let flight = self.in_flight.take()?;
        self.complete(flight.operation, flight.generation, received)
    }

    /// Waits for the in-flight response and applies it.
    pub async fn settle(&mut self) -> Option<Settled> {
        let flight = self.in_flight.as_mut()?;
        let received = (&mut flight.rx).await.ok();
        let flight = self.in_flight.take()?;
        self.complete(flight.operation, flight.generation, received)
    }

    async fn finish(&mut self, operation: Operation) -> Result<(), StoreError> {
        match self.settle().await {
            Some(Settled::Loaded) | Some(Settled::Saved) => Ok(()),
            Some(Settled::LoadFailed(message)) | Some(Settled::SaveFailed(message)) => {
                Err(StoreError::Failed(message))
            }
            None => Err(StoreError::Failed(format!(
                "{operation:?} of the {} did not complete",
                R::NAME
            ))),
        }
    }

    fn dispatch<F>(&mut self, operation: Operation, request: F)
    where
        F: Future<Output = Result<R::Body, ApiError>> + Send + 'static,
    {
        let generation = self.generation;
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let result = request.await;
            let _ = tx.send((generation, result));
        });

        tracing::debug!(resource = R::NAME, generation, ?operation, "request started");
        self.in_flight = Some(InFlight {
            operation,
            generation,
            rx,
            task,
        });
    }

    fn complete(
        &mut self,
        operation: Operation,
        generation: u64,
        received: Option<Delivery<R::Body>>,
    ) -> Option<Settled> {
        let result = match received {
            Some((token, _)) if token != self.generation || generation != self.generation => {
                tracing::debug!(resource = R::NAME, token, current = self.generation, "discarding stale response");
                return None;
            }
            Some((_, result)) => result.map_err(|e| e.to_string()),
            None => Err("the request was interrupted before it completed".to_string()),
        };

        let settled = match (operation, result) {
            (Operation::Load, Ok(body)) => {
                self.data = Some(R::normalize(body));
                self.error = None;
                tracing::info!(resource = R::NAME, generation, "loaded");
                Settled::Loaded
            }
            (Operation::Load, Err(message)) => {
                self.data = None;
                self.error = Some(message.clone());
                tracing::warn!(resource = R::NAME, generation, error = %message, "load failed");
                Settled::LoadFailed(message)
            }
            (Operation::Save, Ok(body)) => {
                self.data = Some(R::normalize(body));
                self.error = None;
                tracing::info!(resource = R::NAME, generation, "saved");
                Settled::Saved
            }
            (Operation::Save, Err(message)) => {
                self.error = Some(message.clone());
                tracing::warn!(resource = R::NAME, generation, error = %message, "save failed");
                Settled::SaveFailed(message)
            }
        };

        match operation {
            Operation::Load => self.loading = false,
            Operation::Save => self.saving = false,
        }
        Some(settled)
    }
}

impl<R: Writable> ResourceStore<R> {
    /// Issues a full-replacement write. Refused while another request is in
    /// flight; local data is untouched until the server answers.
    pub fn start_save(&mut self, body: R::Body) -> Result<(), StoreError> {
        self.ensure_idle()?;

        self.generation += 1;
        self.saving = true;

        let client = self.client.clone();
        self.dispatch(Operation::Save, async move { client.replace::<R>(&body).await });
        Ok(())
    }

    pub async fn save(&mut self, body: R::Body) -> Result<(), StoreError> {
        self.start_save(body)?;
        self.finish(Operation::Save).await
    }
}

impl ResourceStore<Prompts> {
    /// Saves `prompts` inside a copy of the last-loaded collection whose update
    /// time is refreshed to now.
    pub fn start_save_prompts(&mut self, prompts: Vec<Prompt>) -> Result<(), StoreError> {
        let collection = self.loaded()?.with_prompts(prompts, Utc::now());
        self.start_save(collection)
    }

    pub async fn save_prompts(&mut self, prompts: Vec<Prompt>) -> Result<(), StoreError> {
        self.start_save_prompts(prompts)?;
        self.finish(Operation::Save).await
    }

    pub fn prompts(&self) -> &[Prompt] {
        self.data().map(|c| c.prompts.as_slice()).unwrap_or(&[])
    }
}
