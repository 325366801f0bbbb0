use serde::Serialize;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use super::error::ClassifierError;
use crate::pipelines::classification::{RankDepth, TextClassificationModel};
use crate::pipelines::utils::{describe_device, DeviceRequest, DeviceSelectable};

/// Where the shared model is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

enum Slot<M> {
    Unloaded,
    Loading,
    Ready(Arc<M>),
    Failed(String),
}

impl<M> Slot<M> {
    fn state(&self) -> ResourceState {
        match self {
            Slot::Unloaded => ResourceState::Unloaded,
            Slot::Loading => ResourceState::Loading,
            Slot::Ready(_) => ResourceState::Ready,
            Slot::Failed(_) => ResourceState::Failed,
        }
    }
}

/// Owns the single shared model instance and its state transitions.
///
/// Transitions are `Unloaded -> Loading -> Ready | Failed` on [`start`] and
/// `any -> Unloaded` on [`stop`]. Readers call [`acquire`], which hands out
/// the model only while `Ready`. In-flight work keeps its own `Arc`, so a
/// concurrent `stop` never pulls the model out from under a running request.
///
/// [`start`]: ResourceLifecycleManager::start
/// [`stop`]: ResourceLifecycleManager::stop
/// [`acquire`]: ResourceLifecycleManager::acquire
pub struct ResourceLifecycleManager<M: TextClassificationModel> {
    options: M::Options,
    device_request: DeviceRequest,
    slot: RwLock<Slot<M>>,
    transitions: tokio::sync::Mutex<()>,
}

impl<M: TextClassificationModel> DeviceSelectable for ResourceLifecycleManager<M> {
    fn device_request_mut(&mut self) -> &mut DeviceRequest {
        &mut self.device_request
    }
}

impl<M: TextClassificationModel> ResourceLifecycleManager<M> {
    pub fn new(options: M::Options) -> Self {
        Self {
            options,
            device_request: DeviceRequest::Default,
            slot: RwLock::new(Slot::Unloaded),
            transitions: tokio::sync::Mutex::new(()),
        }
    }

    /// Load and warm up the model. Calling it while `Ready` is a no-op.
    ///
    /// A failed load leaves the manager `Failed` with the cause recorded and
    /// returns the error; the process stays up and readers keep getting
    /// `ResourceUnavailable`.
    pub async fn start(&self) -> anyhow::Result<()> {
        let _transition = self.transitions.lock().await;
        if self.state() == ResourceState::Ready {
            return Ok(());
        }

        let guard = LoadingGuard::enter(self);
        let options = self.options.clone();
        tracing::info!(?options, "loading classification model");

        match self.load(options).await {
            Ok(model) => {
                tracing::info!(
                    device = %describe_device(model.device()),
                    num_labels = model.metadata().num_labels,
                    "classification model ready"
                );
                guard.finish(Slot::Ready(model));
                Ok(())
            }
            Err(e) => {
                tracing::error!("failed to load classification model: {e:#}");
                guard.finish(Slot::Failed(format!("{e:#}")));
                Err(e)
            }
        }
    }

    async fn load(&self, options: M::Options) -> anyhow::Result<Arc<M>> {
        let device = self.device_request.resolve()?;
        let model = Arc::new(M::new(options, device).await?);

        // One throwaway pass so the first real request doesn't pay for kernel
        // compilation and allocator warm-up.
        let warm = Arc::clone(&model);
        tokio::task::spawn_blocking(move || warm.rank(&["warm-up"], RankDepth::Top(1)))
            .await
            .map_err(|e| anyhow::anyhow!(e))??;
        Ok(model)
    }

    /// Release the model. Safe to call in any state, any number of times.
    pub async fn stop(&self) {
        let _transition = self.transitions.lock().await;
        let previous = std::mem::replace(&mut *self.write_slot(), Slot::Unloaded);
        if let Slot::Ready(model) = previous {
            let in_flight = Arc::strong_count(&model) - 1;
            if in_flight > 0 {
                tracing::info!(in_flight, "model released; in-flight requests finish first");
            }
            drop(model);
            tracing::info!("classification model unloaded");
        }
    }

    /// Shared handle to the model, or `ResourceUnavailable` unless `Ready`.
    pub fn acquire(&self) -> Result<Arc<M>, ClassifierError> {
        match &*self.read_slot() {
            Slot::Ready(model) => Ok(Arc::clone(model)),
            other => Err(ClassifierError::ResourceUnavailable {
                state: other.state(),
            }),
        }
    }

    pub fn state(&self) -> ResourceState {
        self.read_slot().state()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ResourceState::Ready
    }

    /// Cause of the last failed load, if the manager is `Failed`.
    pub fn failure(&self) -> Option<String> {
        match &*self.read_slot() {
            Slot::Failed(cause) => Some(cause.clone()),
            _ => None,
        }
    }

    fn read_slot(&self) -> std::sync::RwLockReadGuard<'_, Slot<M>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slot(&self) -> std::sync::RwLockWriteGuard<'_, Slot<M>> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// Marks the slot `Loading` for the duration of a load. If the load future is
// dropped before finishing, the slot ends up `Failed` instead of stuck.
struct LoadingGuard<'a, M: TextClassificationModel> {
    manager: &'a ResourceLifecycleManager<M>,
    done: bool,
}

impl<'a, M: TextClassificationModel> LoadingGuard<'a, M> {
    fn enter(manager: &'a ResourceLifecycleManager<M>) -> Self {
        *manager.write_slot() = Slot::Loading;
        Self {
            manager,
            done: false,
        }
    }

    fn finish(mut self, slot: Slot<M>) {
        *self.manager.write_slot() = slot;
        self.done = true;
    }
}

impl<M: TextClassificationModel> Drop for LoadingGuard<'_, M> {
    fn drop(&mut self) {
        if !self.done {
            *self.manager.write_slot() = Slot::Failed("model load was cancelled".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display_and_serialize_lowercase() {
        assert_eq!(ResourceState::Ready.to_string(), "ready");
        assert_eq!(ResourceState::Unloaded.to_string(), "unloaded");
        assert_eq!(
            serde_json::to_string(&ResourceState::Failed).unwrap(),
            "\"failed\""
        );
    }
}
