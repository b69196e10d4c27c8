//! Apply a parsed preset to the JACK server
//!
//! Every parameter in the schema is visited, engine before driver. A
//! parameter the preset leaves out is reset to the server default; the others
//! are coerced and written only when they differ from the server's value.
//! Individual failures are logged and do not stop the remaining parameters.

use serde::Serialize;
use tracing::warn;

use crate::config::PresetSettings;
use crate::jack::{ConfigureBackend, ParamWrite, ServerConfig};
use crate::schema::{Component, settings_for};
use crate::types::SettingValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// New value written
    Applied,
    /// Not written: unsupported by the driver or already equal
    Unchanged,
    Reset,
    /// Value could not be coerced
    Skipped,
    /// Reading, writing or resetting failed on the server
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingOutcome {
    pub component: Component,
    pub name: &'static str,
    pub outcome: Outcome,
}

pub struct PresetApplier<'a, B> {
    config: &'a ServerConfig<B>,
}

impl<'a, B: ConfigureBackend> PresetApplier<'a, B> {
    pub fn new(config: &'a ServerConfig<B>) -> Self {
        Self { config }
    }

    pub async fn apply(&self, settings: &PresetSettings) -> Vec<SettingOutcome> {
        let mut outcomes = Vec::new();

        for component in Component::ALL {
            for descriptor in settings_for(component) {
                let value = settings
                    .get(component, descriptor.name)
                    .unwrap_or(&SettingValue::Absent);

                let outcome = match descriptor.coerce(value) {
                    Ok(None) => {
                        if self.config.reset_parameter(component, descriptor.name).await {
                            Outcome::Reset
                        } else {
                            Outcome::Failed
                        }
                    }
                    Ok(Some(coerced)) => match self
                        .config
                        .write_parameter(component, descriptor.name, &coerced, true)
                        .await
                    {
                        ParamWrite::Written => Outcome::Applied,
                        ParamWrite::Unchanged => Outcome::Unchanged,
                        ParamWrite::Failed => Outcome::Failed,
                    },
                    Err(e) => {
                        warn!(setting = descriptor.name, %value, error = %e, "Unknown type for setting");
                        Outcome::Skipped
                    }
                };

                outcomes.push(SettingOutcome {
                    component,
                    name: descriptor.name,
                    outcome,
                });
            }
        }

        outcomes
    }
}

/// Number of settings that ended with the given outcome
pub fn count(outcomes: &[SettingOutcome], outcome: Outcome) -> usize {
    outcomes.iter().filter(|o| o.outcome == outcome).count()
}
