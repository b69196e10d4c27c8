//! Session state shown to the user: last applied preset and the latest
//! status values reported by the JACK server

use std::collections::BTreeMap;
use tracing::info;

use crate::jack::{StatusField, StatusReply, StatusValue};

const NO_STATUS: &str = "No status available.";
const STOPPED: &str = "JACK server stopped.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Stopped,
}

#[derive(Debug)]
pub struct JackStatus {
    /// Name of the last successfully applied preset
    pub active_preset: Option<String>,
    fields: BTreeMap<StatusField, StatusValue>,
    summary: String,
}

impl Default for JackStatus {
    fn default() -> Self {
        Self {
            active_preset: None,
            fields: BTreeMap::new(),
            summary: NO_STATUS.to_string(),
        }
    }
}

impl JackStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.flag(StatusField::IsStarted).unwrap_or(false)
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn fields(&self) -> BTreeMap<String, StatusValue> {
        self.fields
            .iter()
            .map(|(field, value)| (field.name().to_string(), *value))
            .collect()
    }

    /// Take an async reply; errors were already logged where the call failed
    pub fn receive(&mut self, reply: StatusReply) -> Option<Transition> {
        match reply.outcome {
            Ok(value) => self.update(reply.field, value),
            Err(_) => None,
        }
    }

    pub fn update(&mut self, field: StatusField, value: StatusValue) -> Option<Transition> {
        let mut transition = None;

        if field == StatusField::IsStarted && self.fields.get(&field) != Some(&value) {
            if value == StatusValue::Flag(true) {
                info!("JACK server started.");
                transition = Some(Transition::Started);
            } else {
                info!("JACK server stopped.");
                self.summary = STOPPED.to_string();
                transition = Some(Transition::Stopped);
            }
        }

        self.fields.insert(field, value);

        if self.is_started() {
            self.summary = self.render().unwrap_or_else(|| NO_STATUS.to_string());
        }

        transition
    }

    fn flag(&self, field: StatusField) -> Option<bool> {
        match self.fields.get(&field)? {
            StatusValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    fn count(&self, field: StatusField) -> Option<u32> {
        match self.fields.get(&field)? {
            StatusValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    fn real(&self, field: StatusField) -> Option<f64> {
        match self.fields.get(&field)? {
            StatusValue::Real(x) => Some(*x),
            _ => None,
        }
    }

    fn render(&self) -> Option<String> {
        let rate = self.count(StatusField::SampleRate)?;
        let period = self.count(StatusField::Period)?;
        let latency = self.real(StatusField::Latency)?;
        let load = self.real(StatusField::Load)?;
        let xruns = self.count(StatusField::Xruns)?;
        let realtime = if self.flag(StatusField::IsRealtime).unwrap_or(false) {
            "yes"
        } else {
            "no"
        };

        let header = match &self.active_preset {
            Some(preset) => format!("[{preset}]"),
            None => "Unknown configuration".to_string(),
        };

        Some(format!(
            "{header}\n{rate} Hz / {period} frames ({latency:.1} ms)\nRT: {realtime} load: {}% xruns: {xruns}",
            load.trunc()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jack::ControlError;

    fn started_with_stats() -> JackStatus {
        let mut status = JackStatus::new();
        status.update(StatusField::IsStarted, StatusValue::Flag(true));
        // Replies arrive in arbitrary order
        status.update(StatusField::Xruns, StatusValue::Count(2));
        status.update(StatusField::Latency, StatusValue::Real(10.666));
        status.update(StatusField::IsRealtime, StatusValue::Flag(true));
        status.update(StatusField::Load, StatusValue::Real(3.9));
        status.update(StatusField::Period, StatusValue::Count(256));
        status.update(StatusField::SampleRate, StatusValue::Count(48000));
        status
    }

    #[test]
    fn test_initial_state() {
        let status = JackStatus::new();
        assert!(!status.is_started());
        assert_eq!(status.summary(), "No status available.");
    }

    #[test]
    fn test_start_stop_transitions() {
        let mut status = JackStatus::new();
        assert_eq!(
            status.update(StatusField::IsStarted, StatusValue::Flag(true)),
            Some(Transition::Started)
        );
        assert_eq!(status.update(StatusField::IsStarted, StatusValue::Flag(true)), None);
        assert_eq!(
            status.update(StatusField::IsStarted, StatusValue::Flag(false)),
            Some(Transition::Stopped)
        );
        assert_eq!(status.summary(), "JACK server stopped.");
    }

    #[test]
    fn test_summary_needs_all_fields() {
        let mut status = JackStatus::new();
        status.update(StatusField::IsStarted, StatusValue::Flag(true));
        status.update(StatusField::SampleRate, StatusValue::Count(48000));
        assert_eq!(status.summary(), "No status available.");
    }

    #[test]
    fn test_summary_with_unknown_configuration() {
        let status = started_with_stats();
        assert_eq!(
            status.summary(),
            "Unknown configuration\n48000 Hz / 256 frames (10.7 ms)\nRT: yes load: 3% xruns: 2"
        );
    }

    #[test]
    fn test_summary_names_active_preset() {
        let mut status = started_with_stats();
        status.active_preset = Some("Studio".to_string());
        status.update(StatusField::Xruns, StatusValue::Count(0));
        assert!(status.summary().starts_with("[Studio]\n"));
        assert!(status.summary().ends_with("xruns: 0"));
    }

    #[test]
    fn test_error_reply_changes_nothing() {
        let mut status = started_with_stats();
        let before = status.summary().to_string();

        let transition = status.receive(StatusReply {
            field: StatusField::IsStarted,
            outcome: Err(ControlError::Remote("gone".into())),
        });
        assert_eq!(transition, None);
        assert!(status.is_started());
        assert_eq!(status.summary(), before);
    }

    #[test]
    fn test_fields_are_keyed_by_name() {
        let status = started_with_stats();
        let fields = status.fields();
        assert_eq!(fields["samplerate"], StatusValue::Count(48000));
        assert_eq!(fields["is_started"], StatusValue::Flag(true));
    }
}
