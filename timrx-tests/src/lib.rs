//! Spying register client shared by the integration tests.
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use parking_lot::Mutex;
use timrx_core::{ClientError, ConnectOptions, Connector, RegisterClient, Value};

/// One remote procedure call as seen by the spy
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Write {
        service: String,
        register: String,
        channel: Option<u32>,
        value: Value,
    },
    Read {
        service: String,
        register: String,
        channel: Option<u32>,
    },
    Disconnect,
}

impl Call {
    pub fn register(&self) -> Option<&str> {
        match self {
            Call::Write { register, .. } | Call::Read { register, .. } => Some(register),
            Call::Disconnect => None,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, Call::Write { .. })
    }
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<Call>,
    registers: HashMap<(String, Option<u32>), Value>,
    failing: HashSet<String>,
    sticky: HashMap<String, u32>,
    refuse_connect: bool,
    connections: usize,
    options: Option<ConnectOptions>,
}

/// Records every remote call and keeps written values.
///
/// Clones share their state, so a test keeps one handle while the driver owns
/// the connector.
#[derive(Debug, Clone, Default)]
pub struct Spy {
    inner: Arc<Mutex<Inner>>,
}

impl Spy {
    pub fn new() -> Spy {
        Spy::default()
    }

    /// Make every call to `register` fail with a remote error
    pub fn fail(&self, register: &str) {
        self.inner.lock().failing.insert(register.to_string());
    }

    /// Make `register` always read back `value`, whatever was written
    pub fn stick(&self, register: &str, value: u32) {
        self.inner.lock().sticky.insert(register.to_string(), value);
    }

    /// Refuse new connections
    pub fn refuse_connect(&self, refuse: bool) {
        self.inner.lock().refuse_connect = refuse;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    pub fn clear(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn connections(&self) -> usize {
        self.inner.lock().connections
    }

    /// Options of the last connection attempt
    pub fn options(&self) -> Option<ConnectOptions> {
        self.inner.lock().options.clone()
    }

    /// Registers touched in call order
    pub fn registers(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|call| call.register().map(str::to_string))
            .collect()
    }

    fn write(
        &self,
        service: &str,
        register: &str,
        channel: Option<u32>,
        value: Value,
    ) -> Result<(), ClientError> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::Write {
            service: service.to_string(),
            register: register.to_string(),
            channel,
            value,
        });
        if inner.failing.contains(register) {
            return Err(ClientError::Remote(-2));
        }
        inner.registers.insert((register.to_string(), channel), value);
        Ok(())
    }

    fn read(
        &self,
        service: &str,
        register: &str,
        channel: Option<u32>,
    ) -> Result<Option<Value>, ClientError> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::Read {
            service: service.to_string(),
            register: register.to_string(),
            channel,
        });
        if inner.failing.contains(register) {
            return Err(ClientError::Remote(-2));
        }
        if let Some(value) = inner.sticky.get(register) {
            return Ok(Some(Value::UInt32(*value)));
        }
        Ok(inner.registers.get(&(register.to_string(), channel)).copied())
    }
}

impl RegisterClient for Spy {
    fn write_u32(&mut self, service: &str, register: &str, value: u32) -> Result<(), ClientError> {
        Spy::write(self, service, register, None, value.into())
    }

    fn read_u32(&mut self, service: &str, register: &str) -> Result<u32, ClientError> {
        Ok(Spy::read(self, service, register, None)?
            .and_then(|value| value.as_u32())
            .unwrap_or(0))
    }

    fn write_channel_u32(
        &mut self,
        service: &str,
        register: &str,
        channel: u32,
        value: u32,
    ) -> Result<(), ClientError> {
        Spy::write(self, service, register, Some(channel), value.into())
    }

    fn read_channel_u32(
        &mut self,
        service: &str,
        register: &str,
        channel: u32,
    ) -> Result<u32, ClientError> {
        Ok(Spy::read(self, service, register, Some(channel))?
            .and_then(|value| value.as_u32())
            .unwrap_or(0))
    }

    fn write_f64(&mut self, service: &str, register: &str, value: f64) -> Result<(), ClientError> {
        Spy::write(self, service, register, None, value.into())
    }

    fn read_f64(&mut self, service: &str, register: &str) -> Result<f64, ClientError> {
        Ok(Spy::read(self, service, register, None)?
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0))
    }

    fn disconnect(&mut self) {
        self.inner.lock().calls.push(Call::Disconnect);
    }
}

impl Connector for Spy {
    type Client = Spy;

    fn connect(&self, options: &ConnectOptions) -> Result<Spy, ClientError> {
        let mut inner = self.inner.lock();
        inner.options = Some(options.clone());
        if inner.refuse_connect {
            return Err(ClientError::Transport);
        }
        inner.connections += 1;
        Ok(self.clone())
    }
}
