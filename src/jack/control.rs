//! JACK server lifecycle and statistics
//!
//! Every call is dispatched on its own task and answered with exactly one
//! [`StatusReply`] on the reply channel, carrying either the value or the
//! error. Replies of concurrent calls may arrive in any order; each is
//! tagged with its field.

use serde::Serialize;
use std::future::Future;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, trace};

use super::ControlError;

/// Status query, also naming the field its answer updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StatusField {
    IsStarted,
    IsRealtime,
    StartServer,
    StopServer,
    Latency,
    Load,
    Period,
    SampleRate,
    Xruns,
}

impl StatusField {
    pub fn name(self) -> &'static str {
        match self {
            StatusField::IsStarted => "is_started",
            StatusField::IsRealtime => "is_realtime",
            StatusField::StartServer => "start_server",
            StatusField::StopServer => "stop_server",
            StatusField::Latency => "latency",
            StatusField::Load => "load",
            StatusField::Period => "period",
            StatusField::SampleRate => "samplerate",
            StatusField::Xruns => "xruns",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatusValue {
    Flag(bool),
    Count(u32),
    Real(f64),
    Done,
}

#[derive(Debug)]
pub struct StatusReply {
    pub field: StatusField,
    pub outcome: Result<StatusValue, ControlError>,
}

/// Transport for lifecycle and statistics calls
pub trait ControlBackend: Clone + Send + Sync + 'static {
    fn call(
        &self,
        field: StatusField,
    ) -> impl Future<Output = Result<StatusValue, ControlError>> + Send;
}

pub struct ServerControl<B> {
    backend: B,
    replies: UnboundedSender<StatusReply>,
}

impl<B: ControlBackend> ServerControl<B> {
    pub fn new(backend: B, replies: UnboundedSender<StatusReply>) -> Self {
        Self { backend, replies }
    }

    pub fn is_started(&self) {
        self.dispatch(StatusField::IsStarted);
    }

    pub fn is_realtime(&self) {
        self.dispatch(StatusField::IsRealtime);
    }

    pub fn start(&self) {
        self.dispatch(StatusField::StartServer);
    }

    pub fn stop(&self) {
        self.dispatch(StatusField::StopServer);
    }

    /// Latency in milliseconds
    pub fn get_latency(&self) {
        self.dispatch(StatusField::Latency);
    }

    /// DSP load in percent
    pub fn get_load(&self) {
        self.dispatch(StatusField::Load);
    }

    /// Buffer size in frames
    pub fn get_period(&self) {
        self.dispatch(StatusField::Period);
    }

    pub fn get_sample_rate(&self) {
        self.dispatch(StatusField::SampleRate);
    }

    pub fn get_xruns(&self) {
        self.dispatch(StatusField::Xruns);
    }

    /// Fire the call without waiting; the answer arrives on the reply channel
    fn dispatch(&self, field: StatusField) {
        let backend = self.backend.clone();
        let replies = self.replies.clone();
        trace!(name = field.name(), "Dispatching async call");

        tokio::spawn(async move {
            let outcome = backend.call(field).await;
            if let Err(e) = &outcome {
                error!(name = field.name(), error = %e, "Async call failed");
            }
            // Receiver gone means nobody cares about the answer any more
            let _ = replies.send(StatusReply { field, outcome });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    #[derive(Clone, Default)]
    struct FakeControl {
        answers: Arc<HashMap<StatusField, StatusValue>>,
        calls: Arc<Mutex<Vec<StatusField>>>,
    }

    impl ControlBackend for FakeControl {
        async fn call(&self, field: StatusField) -> Result<StatusValue, ControlError> {
            self.calls.lock().unwrap().push(field);
            self.answers
                .get(&field)
                .copied()
                .ok_or_else(|| ControlError::Remote(format!("{} not available", field.name())))
        }
    }

    fn fake(answers: &[(StatusField, StatusValue)]) -> FakeControl {
        FakeControl {
            answers: Arc::new(answers.iter().copied().collect()),
            calls: Arc::default(),
        }
    }

    #[tokio::test]
    async fn test_each_call_gets_exactly_one_tagged_reply() {
        let backend = fake(&[
            (StatusField::SampleRate, StatusValue::Count(48000)),
            (StatusField::Period, StatusValue::Count(256)),
            (StatusField::Latency, StatusValue::Real(10.7)),
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let control = ServerControl::new(backend.clone(), tx);

        control.get_sample_rate();
        control.get_period();
        control.get_latency();
        drop(control);

        let mut replies = HashMap::new();
        while let Some(reply) = rx.recv().await {
            assert!(replies.insert(reply.field, reply.outcome.unwrap()).is_none());
        }
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[&StatusField::SampleRate], StatusValue::Count(48000));
        assert_eq!(replies[&StatusField::Period], StatusValue::Count(256));
        assert_eq!(backend.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_call_delivers_only_the_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let control = ServerControl::new(fake(&[]), tx);

        control.get_xruns();
        drop(control);

        let reply = rx.recv().await.unwrap();
        assert_eq!(reply.field, StatusField::Xruns);
        assert!(matches!(reply.outcome, Err(ControlError::Remote(_))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_lifecycle_calls_map_to_fields() {
        let backend = fake(&[
            (StatusField::StartServer, StatusValue::Done),
            (StatusField::StopServer, StatusValue::Done),
        ]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let control = ServerControl::new(backend, tx);

        control.stop();
        assert_eq!(rx.recv().await.unwrap().field, StatusField::StopServer);
        control.start();
        let reply = rx.recv().await.unwrap();
        assert_eq!(reply.field, StatusField::StartServer);
        assert_eq!(reply.outcome.unwrap(), StatusValue::Done);
    }

    #[test]
    fn test_field_names() {
        assert_eq!(StatusField::SampleRate.name(), "samplerate");
        assert_eq!(StatusField::Period.name(), "period");
        assert_eq!(StatusField::IsStarted.name(), "is_started");
    }
}
