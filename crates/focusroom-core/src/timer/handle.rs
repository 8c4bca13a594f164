//! EngineHandle - client interface to a spawned [`TimerEngine`](super::TimerEngine).

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::events::Event;

/// Requests accepted by the engine loop.
#[derive(Debug)]
pub enum EngineCommand {
    Start { reply: oneshot::Sender<Option<Event>> },
    Pause { reply: oneshot::Sender<Option<Event>> },
    Reset { reply: oneshot::Sender<Option<Event>> },
    Skip { reply: oneshot::Sender<Option<Event>> },
    Snapshot { reply: oneshot::Sender<Event> },
    Shutdown,
}

/// Cloneable handle for driving a running engine.
///
/// When the last handle is dropped the engine shuts down.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
    events: broadcast::Sender<Event>,
}

impl EngineHandle {
    pub(crate) fn new(tx: mpsc::Sender<EngineCommand>, events: broadcast::Sender<Event>) -> Self {
        Self { tx, events }
    }

    pub async fn start(&self) -> Result<Option<Event>> {
        self.request(|reply| EngineCommand::Start { reply }).await
    }

    pub async fn pause(&self) -> Result<Option<Event>> {
        self.request(|reply| EngineCommand::Pause { reply }).await
    }

    pub async fn reset(&self) -> Result<Option<Event>> {
        self.request(|reply| EngineCommand::Reset { reply }).await
    }

    pub async fn skip(&self) -> Result<Option<Event>> {
        self.request(|reply| EngineCommand::Skip { reply }).await
    }

    pub async fn snapshot(&self) -> Result<Event> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| CoreError::EngineStopped)
    }

    /// Ask the loop to exit. Its schedule is cancelled and state flushed.
    pub async fn shutdown(&self) -> Result<()> {
        debug!("EngineHandle::shutdown: called");
        self.send(EngineCommand::Shutdown).await
    }

    /// Receive every event the engine produces from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<Option<Event>>) -> EngineCommand,
    ) -> Result<Option<Event>> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await.map_err(|_| CoreError::EngineStopped)
    }

    async fn send(&self, command: EngineCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| CoreError::EngineStopped)
    }
}
