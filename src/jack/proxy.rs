//! D-Bus proxies for the JACK controller object

use anyhow::{Context, Result};
use tracing::info;
use zbus::Connection;
use zbus::zvariant::Value;

use super::configure::ConfigureBackend;
use super::control::{ControlBackend, StatusField, StatusValue};
use super::ControlError;
use crate::constants::jack::{CONTROLLER_PATH, SERVICE};
use crate::types::ParamValue;

#[zbus::proxy(
    interface = "org.jackaudio.JackControl",
    default_service = "org.jackaudio.service",
    default_path = "/org/jackaudio/Controller"
)]
pub trait JackControl {
    fn is_started(&self) -> zbus::Result<bool>;
    fn is_realtime(&self) -> zbus::Result<bool>;
    fn start_server(&self) -> zbus::Result<()>;
    fn stop_server(&self) -> zbus::Result<()>;
    fn get_latency(&self) -> zbus::Result<f64>;
    fn get_load(&self) -> zbus::Result<f64>;
    fn get_buffer_size(&self) -> zbus::Result<u32>;
    fn get_sample_rate(&self) -> zbus::Result<u32>;
    fn get_xruns(&self) -> zbus::Result<u32>;

    #[zbus(signal)]
    fn server_started(&self) -> zbus::Result<()>;

    #[zbus(signal)]
    fn server_stopped(&self) -> zbus::Result<()>;
}

#[zbus::proxy(
    interface = "org.jackaudio.Configure",
    default_service = "org.jackaudio.service",
    default_path = "/org/jackaudio/Controller"
)]
pub trait Configure {
    /// Returns (is leaf, child names)
    fn read_container(&self, parent: &[&str]) -> zbus::Result<(bool, Vec<String>)>;

    /// Returns (is set, default value, current value)
    fn get_parameter_value(
        &self,
        parameter: &[&str],
    ) -> zbus::Result<(bool, zbus::zvariant::OwnedValue, zbus::zvariant::OwnedValue)>;

    fn set_parameter_value(&self, parameter: &[&str], value: &Value<'_>) -> zbus::Result<()>;

    fn reset_parameter_value(&self, parameter: &[&str]) -> zbus::Result<()>;
}

/// Both proxies bound to one session bus connection
pub struct JackBus {
    pub control: JackControlProxy<'static>,
    pub configure: ConfigureProxy<'static>,
}

impl JackBus {
    pub async fn connect(connection: &Connection) -> Result<Self> {
        let control = JackControlProxy::new(connection)
            .await
            .context("Failed to create JackControl proxy")?;
        let configure = ConfigureProxy::new(connection)
            .await
            .context("Failed to create Configure proxy")?;
        info!(service = SERVICE, path = CONTROLLER_PATH, "Connected to JACK controller");
        Ok(Self { control, configure })
    }
}

impl ControlBackend for JackControlProxy<'static> {
    async fn call(&self, field: StatusField) -> Result<StatusValue, ControlError> {
        let value = match field {
            StatusField::IsStarted => StatusValue::Flag(self.is_started().await?),
            StatusField::IsRealtime => StatusValue::Flag(self.is_realtime().await?),
            StatusField::StartServer => {
                self.start_server().await?;
                StatusValue::Done
            }
            StatusField::StopServer => {
                self.stop_server().await?;
                StatusValue::Done
            }
            StatusField::Latency => StatusValue::Real(self.get_latency().await?),
            StatusField::Load => StatusValue::Real(self.get_load().await?),
            StatusField::Period => StatusValue::Count(self.get_buffer_size().await?),
            StatusField::SampleRate => StatusValue::Count(self.get_sample_rate().await?),
            StatusField::Xruns => StatusValue::Count(self.get_xruns().await?),
        };
        Ok(value)
    }
}

fn to_variant(value: &ParamValue) -> Value<'_> {
    match value {
        ParamValue::Bool(b) => Value::Bool(*b),
        ParamValue::Int32(i) => Value::I32(*i),
        ParamValue::UInt32(u) => Value::U32(*u),
        ParamValue::Byte(b) => Value::U8(*b),
        ParamValue::Str(s) => Value::from(s.as_str()),
    }
}

fn from_variant(value: &Value<'_>) -> Result<ParamValue, ControlError> {
    match value {
        Value::Bool(b) => Ok(ParamValue::Bool(*b)),
        Value::I32(i) => Ok(ParamValue::Int32(*i)),
        Value::U32(u) => Ok(ParamValue::UInt32(*u)),
        Value::U8(b) => Ok(ParamValue::Byte(*b)),
        Value::Str(s) => Ok(ParamValue::Str(s.as_str().to_string())),
        other => Err(ControlError::UnexpectedValue(format!("{other:?}"))),
    }
}

impl ConfigureBackend for ConfigureProxy<'static> {
    async fn list_container(&self, path: &[&str]) -> Result<Vec<String>, ControlError> {
        let (_leaf, children) = self.read_container(path).await?;
        Ok(children)
    }

    async fn read_value(&self, path: &[&str]) -> Result<ParamValue, ControlError> {
        let (_is_set, _default, current) = self.get_parameter_value(path).await?;
        from_variant(&current)
    }

    async fn write_value(&self, path: &[&str], value: &ParamValue) -> Result<(), ControlError> {
        self.set_parameter_value(path, &to_variant(value)).await?;
        Ok(())
    }

    async fn reset_value(&self, path: &[&str]) -> Result<(), ControlError> {
        self.reset_parameter_value(path).await?;
        Ok(())
    }
}
