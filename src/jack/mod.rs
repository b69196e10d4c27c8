//! Control and configure a JACK server via D-Bus
//!
//! Two clients share one remote controller object:
//! - [`ServerControl`]: lifecycle and statistics, answered asynchronously
//!   through a reply channel
//! - [`ServerConfig`]: feature-gated parameter reads and writes

pub mod configure;
pub mod control;
#[cfg(test)]
pub mod mock;
pub mod proxy;

pub use configure::{ConfigureBackend, ParamWrite, ServerConfig};
pub use control::{ControlBackend, ServerControl, StatusField, StatusReply, StatusValue};
pub use proxy::JackBus;

/// Failure talking to the JACK controller
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("D-Bus call failed: {0}")]
    Bus(#[source] zbus::Error),
    /// The controller answered with a D-Bus error reply
    #[error("JACK controller error: {0}")]
    Remote(String),
    #[error("unexpected parameter value {0}")]
    UnexpectedValue(String),
}

impl From<zbus::Error> for ControlError {
    fn from(e: zbus::Error) -> Self {
        match e {
            zbus::Error::MethodError(name, description, _) => {
                Self::Remote(description.unwrap_or_else(|| name.to_string()))
            }
            other => Self::Bus(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbus::message::Message;
    use zbus::names::ErrorName;

    #[test]
    fn test_error_reply_becomes_remote() {
        let call = Message::method_call("/org/jackaudio/Controller", "StartServer")
            .unwrap()
            .build(&())
            .unwrap();
        let name = ErrorName::try_from("org.jackaudio.Error.Generic").unwrap();

        let error = ControlError::from(zbus::Error::MethodError(
            name.clone().into(),
            Some("Failed to start server".to_string()),
            call.clone(),
        ));
        assert!(matches!(&error, ControlError::Remote(m) if m == "Failed to start server"));

        let error = ControlError::from(zbus::Error::MethodError(name.into(), None, call));
        assert!(matches!(&error, ControlError::Remote(m) if m == "org.jackaudio.Error.Generic"));
    }

    #[test]
    fn test_transport_error_stays_bus() {
        let error = ControlError::from(zbus::Error::Failure("no bus".into()));
        assert!(matches!(error, ControlError::Bus(_)));
    }
}
