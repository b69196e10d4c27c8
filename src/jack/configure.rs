//! Feature-gated access to JACK engine and driver parameters
//!
//! The parameter set depends on the active driver backend, so every read and
//! write is preceded by an existence check. Writing a parameter the backend
//! does not declare is a no-op. Transport failures never reach the caller;
//! they turn into the fallback value or `false`.

use tracing::{debug, warn};

use super::ControlError;
use crate::schema::Component;
use crate::types::ParamValue;

/// Transport for the hierarchical parameter tree
///
/// Parameters are addressed by a path such as `["driver", "rate"]`.
#[allow(async_fn_in_trait)]
pub trait ConfigureBackend {
    /// Child names declared below `path`
    async fn list_container(&self, path: &[&str]) -> Result<Vec<String>, ControlError>;
    async fn read_value(&self, path: &[&str]) -> Result<ParamValue, ControlError>;
    async fn write_value(&self, path: &[&str], value: &ParamValue) -> Result<(), ControlError>;
    async fn reset_value(&self, path: &[&str]) -> Result<(), ControlError>;
}

impl<T: ConfigureBackend + ?Sized> ConfigureBackend for &T {
    async fn list_container(&self, path: &[&str]) -> Result<Vec<String>, ControlError> {
        (**self).list_container(path).await
    }

    async fn read_value(&self, path: &[&str]) -> Result<ParamValue, ControlError> {
        (**self).read_value(path).await
    }

    async fn write_value(&self, path: &[&str], value: &ParamValue) -> Result<(), ControlError> {
        (**self).write_value(path, value).await
    }

    async fn reset_value(&self, path: &[&str]) -> Result<(), ControlError> {
        (**self).reset_value(path).await
    }
}

/// What became of a parameter write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamWrite {
    Written,
    /// Unsupported by the driver or already at the requested value
    Unchanged,
    Failed,
}

pub struct ServerConfig<B> {
    backend: B,
}

impl<B: ConfigureBackend> ServerConfig<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Whether the component currently declares the parameter
    pub async fn feature_exists(&self, component: Component, name: &str) -> bool {
        match self.backend.list_container(&[component.as_str()]).await {
            Ok(features) => features.iter().any(|feature| feature == name),
            Err(e) => {
                debug!(%component, error = %e, "Could not read parameter container");
                false
            }
        }
    }

    /// Current server value, or `fallback` if unsupported or unreadable
    pub async fn get_parameter(
        &self,
        component: Component,
        name: &str,
        fallback: Option<ParamValue>,
    ) -> Option<ParamValue> {
        if !self.feature_exists(component, name).await {
            return fallback;
        }

        match self.backend.read_value(&[component.as_str(), name]).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(%component, parameter = name, error = %e, "Failed to read parameter");
                fallback
            }
        }
    }

    /// Write a parameter
    ///
    /// With `optional` set the current value is read first and the write is
    /// skipped when it already matches. Returns true only if a write was
    /// issued and succeeded.
    pub async fn set_parameter(
        &self,
        component: Component,
        name: &str,
        value: &ParamValue,
        optional: bool,
    ) -> bool {
        self.write_parameter(component, name, value, optional).await == ParamWrite::Written
    }

    /// Like [`set_parameter`](Self::set_parameter), telling a skipped write
    /// apart from a failed one
    pub async fn write_parameter(
        &self,
        component: Component,
        name: &str,
        value: &ParamValue,
        optional: bool,
    ) -> ParamWrite {
        if !self.feature_exists(component, name).await {
            debug!(%component, parameter = name, "Parameter not supported by current driver");
            return ParamWrite::Unchanged;
        }

        let path = [component.as_str(), name];
        if optional {
            match self.backend.read_value(&path).await {
                Ok(current) if current.same_as(value) => {
                    debug!(%component, parameter = name, %value, "Parameter unchanged");
                    return ParamWrite::Unchanged;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(%component, parameter = name, error = %e, "Failed to read current value");
                    return ParamWrite::Failed;
                }
            }
        }

        match self.backend.write_value(&path, value).await {
            Ok(()) => {
                debug!(%component, parameter = name, %value, "Parameter set");
                ParamWrite::Written
            }
            Err(e) => {
                warn!(%component, parameter = name, %value, error = %e, "Failed to set parameter");
                ParamWrite::Failed
            }
        }
    }

    /// Restore the server default; true if the reset went through
    pub async fn reset_parameter(&self, component: Component, name: &str) -> bool {
        match self.backend.reset_value(&[component.as_str(), name]).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%component, parameter = name, error = %e, "Failed to reset parameter");
                false
            }
        }
    }
}
