use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::event::Event;
use super::sink::{EventSink, StdOutSink};

/// Fans events out from an unbounded flume channel to a set of sinks.
///
/// Producers hold cheap sender clones from [`get_sender`](Self::get_sender);
/// a single background listener task drains the channel and hands each event
/// to every registered sink in order.
pub struct EventBus {
    sender: flume::Sender<Event>,
    receiver: flume::Receiver<Event>,
    sinks: SharedSinks,
    listener: Mutex<Option<Listener>>,
}

type SharedSinks = Arc<Mutex<Vec<Box<dyn EventSink>>>>;

struct Listener {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_sink(StdOutSink::default())
    }
}

impl EventBus {
    /// Bus with a single sink.
    pub fn with_sink<S: EventSink + 'static>(sink: S) -> Self {
        Self::with_sinks(vec![Box::new(sink)])
    }

    /// Bus with an arbitrary set of sinks.
    pub fn with_sinks(sinks: Vec<Box<dyn EventSink>>) -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            sender,
            receiver,
            sinks: Arc::new(Mutex::new(sinks)),
            listener: Mutex::new(None),
        }
    }

    /// Register another sink. Takes effect for events delivered after the
    /// call, even while the listener is running.
    pub fn add_sink<S: EventSink + 'static>(&self, sink: S) {
        self.sinks.lock().unwrap().push(Box::new(sink));
    }

    /// A sender clone for producers (node contexts, the runner).
    pub fn get_sender(&self) -> flume::Sender<Event> {
        self.sender.clone()
    }

    /// Start the background delivery task. Idempotent; a second call while a
    /// listener is alive does nothing.
    pub fn listen_for_events(&self) {
        let mut slot = self.listener.lock().expect("listener poisoned");
        if slot.is_some() {
            return;
        }

        let receiver = self.receiver.clone();
        let sinks = Arc::clone(&self.sinks);
        let (shutdown, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    incoming = receiver.recv_async() => {
                        let Ok(event) = incoming else { break };
                        let mut sinks = sinks.lock().unwrap();
                        for sink in sinks.iter_mut() {
                            if let Err(error) = sink.handle(&event) {
                                tracing::warn!(%error, "event sink failed");
                            }
                        }
                    }
                }
            }
        });

        *slot = Some(Listener { shutdown, task });
    }

    /// Signal the listener to stop and wait for it to finish.
    pub async fn stop_listener(&self) {
        let listener = self.listener.lock().expect("listener poisoned").take();
        if let Some(listener) = listener {
            let _ = listener.shutdown.send(());
            let _ = listener.task.await;
        }
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        // Cannot await here; signal and detach.
        if let Ok(mut slot) = self.listener.lock() {
            if let Some(listener) = slot.take() {
                let _ = listener.shutdown.send(());
                listener.task.abort();
            }
        }
    }
}
