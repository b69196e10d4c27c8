//! QjackCtl setting names mapped onto JACK parameter addresses

use crate::schema::Component;

/// Lower-cased QjackCtl name, target component, JACK parameter name
const ALIASES: &[(&str, Component, &str)] = &[
    ("realtime", Component::Engine, "realtime"),
    ("priority", Component::Engine, "realtime-priority"),
    ("verbose", Component::Engine, "verbose"),
    ("timeout", Component::Engine, "client-timeout"),
    ("portmax", Component::Engine, "port-max"),
    ("samplerate", Component::Driver, "rate"),
    ("frames", Component::Driver, "period"),
    ("periods", Component::Driver, "nperiods"),
    ("interface", Component::Driver, "device"),
    ("indevice", Component::Driver, "capture"),
    ("outdevice", Component::Driver, "playback"),
    ("chan", Component::Driver, "channels"),
    ("inlatency", Component::Driver, "input-latency"),
    ("outlatency", Component::Driver, "output-latency"),
    ("mididriver", Component::Driver, "midi"),
];

/// Resolve a lower-cased QjackCtl setting name
///
/// Names without an alias are driver parameters of the same name.
pub fn resolve(setting: &str) -> (Component, &str) {
    ALIASES
        .iter()
        .find(|(alias, _, _)| *alias == setting)
        .map(|(_, component, name)| (*component, *name))
        .unwrap_or((Component::Driver, setting))
}
