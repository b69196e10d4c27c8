//! In-memory JACK configure backend for tests

use std::cell::RefCell;
use std::collections::HashMap;

use super::configure::ConfigureBackend;
use super::ControlError;
use crate::schema::Component;
use crate::types::ParamValue;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(String),
    Read(String),
    Write(String, ParamValue),
    Reset(String),
}

/// Records every call; parameters are addressed as `component/name`
#[derive(Debug, Default)]
pub struct MockConfigure {
    containers: HashMap<String, Vec<String>>,
    values: RefCell<HashMap<String, ParamValue>>,
    pub calls: RefCell<Vec<Call>>,
    /// Every call fails, as if the service were gone
    pub unreachable: bool,
    /// Reads and listings work, writes and resets fail
    pub read_only: bool,
}

impl MockConfigure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a supported parameter with its current server value
    pub fn feature(mut self, component: Component, name: &str, current: ParamValue) -> Self {
        self.containers
            .entry(component.as_str().to_string())
            .or_default()
            .push(name.to_string());
        self.values
            .get_mut()
            .insert(format!("{component}/{name}"), current);
        self
    }

    pub fn value(&self, path: &str) -> Option<ParamValue> {
        self.values.borrow().get(path).cloned()
    }

    pub fn writes(&self) -> Vec<(String, ParamValue)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Write(path, value) => Some((path.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn resets(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Reset(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    fn check(&self, writing: bool) -> Result<(), ControlError> {
        if self.unreachable || (writing && self.read_only) {
            return Err(ControlError::Remote("org.jackaudio.service unavailable".into()));
        }
        Ok(())
    }
}

impl ConfigureBackend for MockConfigure {
    async fn list_container(&self, path: &[&str]) -> Result<Vec<String>, ControlError> {
        let path = path.join("/");
        self.calls.borrow_mut().push(Call::List(path.clone()));
        self.check(false)?;
        Ok(self.containers.get(&path).cloned().unwrap_or_default())
    }

    async fn read_value(&self, path: &[&str]) -> Result<ParamValue, ControlError> {
        let path = path.join("/");
        self.calls.borrow_mut().push(Call::Read(path.clone()));
        self.check(false)?;
        self.value(&path)
            .ok_or_else(|| ControlError::Remote(format!("no parameter {path}")))
    }

    async fn write_value(&self, path: &[&str], value: &ParamValue) -> Result<(), ControlError> {
        let path = path.join("/");
        self.calls
            .borrow_mut()
            .push(Call::Write(path.clone(), value.clone()));
        self.check(true)?;
        self.values.borrow_mut().insert(path, value.clone());
        Ok(())
    }

    async fn reset_value(&self, path: &[&str]) -> Result<(), ControlError> {
        self.calls.borrow_mut().push(Call::Reset(path.join("/")));
        self.check(true)
    }
}
