//! # Simulated Register Service
//!
//! An in-memory register bank standing in for the remote hardware-access service.
//! Every written register keeps its value; status registers start out healthy.
//!
//! ## Example Usage
//!
//! ```ignore
//! use timrx_driver::driver::Builder;
//!
//! let sim = SimConnector::new();
//! let driver = Builder::new().unit_number(3).build(sim.clone())?;
//! ```
use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use timrx_core::{ClientError, ConnectOptions, Connector, RegisterClient, Value};

/// Register values reported before anything is written
const PRESETS: [(&str, u32); 3] = [
    ("link_status", 1),
    ("rxen_status", 1),
    ("ref_clk_locked", 1),
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RegisterKey {
    service: String,
    register: String,
    channel: Option<u32>,
}

impl RegisterKey {
    fn new(service: &str, register: &str, channel: Option<u32>) -> RegisterKey {
        RegisterKey {
            service: service.to_string(),
            register: register.to_string(),
            channel,
        }
    }
}

#[derive(Debug, Default)]
struct RegisterBank {
    registers: HashMap<RegisterKey, Value>,
    calls: usize,
}

impl RegisterBank {
    fn write(&mut self, key: RegisterKey, value: Value) {
        log::trace!(
            "sim: {}/{}[{:?}] <- {}",
            key.service,
            key.register,
            key.channel,
            value
        );
        self.calls += 1;
        self.registers.insert(key, value);
    }

    fn read(&mut self, key: &RegisterKey) -> Option<Value> {
        self.calls += 1;
        let value = self.registers.get(key).copied().or_else(|| {
            PRESETS
                .iter()
                .find(|(register, _)| *register == key.register)
                .map(|(_, value)| Value::UInt32(*value))
        });
        log::trace!(
            "sim: {}/{}[{:?}] -> {:?}",
            key.service,
            key.register,
            key.channel,
            value
        );
        value
    }
}

/// Opens clients sharing one simulated register bank.
#[derive(Debug, Clone, Default)]
pub struct SimConnector {
    bank: Arc<Mutex<RegisterBank>>,
}

impl SimConnector {
    pub fn new() -> SimConnector {
        SimConnector::default()
    }

    /// Current content of a register, bypassing any driver
    pub fn peek(&self, service: &str, register: &str, channel: Option<u32>) -> Option<Value> {
        self.bank
            .lock()
            .registers
            .get(&RegisterKey::new(service, register, channel))
            .copied()
    }

    /// Number of remote procedure calls executed so far
    pub fn calls(&self) -> usize {
        self.bank.lock().calls
    }
}

impl Connector for SimConnector {
    type Client = SimClient;

    fn connect(&self, options: &ConnectOptions) -> Result<SimClient, ClientError> {
        log::debug!("sim: accepting connection to {}", options);
        Ok(SimClient {
            bank: Arc::clone(&self.bank),
        })
    }
}

/// Client of the simulated register bank
pub struct SimClient {
    bank: Arc<Mutex<RegisterBank>>,
}

impl SimClient {
    fn read_u32_at(
        &mut self,
        service: &str,
        register: &str,
        channel: Option<u32>,
    ) -> Result<u32, ClientError> {
        match self
            .bank
            .lock()
            .read(&RegisterKey::new(service, register, channel))
        {
            Some(Value::UInt32(value)) => Ok(value),
            Some(Value::Float64(_)) => Err(ClientError::Remote(-1)),
            None => Ok(0),
        }
    }
}

impl RegisterClient for SimClient {
    fn write_u32(&mut self, service: &str, register: &str, value: u32) -> Result<(), ClientError> {
        self.bank
            .lock()
            .write(RegisterKey::new(service, register, None), value.into());
        Ok(())
    }

    fn read_u32(&mut self, service: &str, register: &str) -> Result<u32, ClientError> {
        self.read_u32_at(service, register, None)
    }

    fn write_channel_u32(
        &mut self,
        service: &str,
        register: &str,
        channel: u32,
        value: u32,
    ) -> Result<(), ClientError> {
        self.bank
            .lock()
            .write(RegisterKey::new(service, register, Some(channel)), value.into());
        Ok(())
    }

    fn read_channel_u32(
        &mut self,
        service: &str,
        register: &str,
        channel: u32,
    ) -> Result<u32, ClientError> {
        self.read_u32_at(service, register, Some(channel))
    }

    fn write_f64(&mut self, service: &str, register: &str, value: f64) -> Result<(), ClientError> {
        self.bank
            .lock()
            .write(RegisterKey::new(service, register, None), value.into());
        Ok(())
    }

    fn read_f64(&mut self, service: &str, register: &str) -> Result<f64, ClientError> {
        match self
            .bank
            .lock()
            .read(&RegisterKey::new(service, register, None))
        {
            Some(Value::Float64(value)) => Ok(value),
            Some(Value::UInt32(_)) => Err(ClientError::Remote(-1)),
            None => Ok(0.0),
        }
    }

    fn disconnect(&mut self) {
        log::debug!("sim: client disconnected");
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    fn options() -> ConnectOptions {
        ConnectOptions {
            endpoint: "sim".to_string(),
            verbosity: 0,
            log_sink: "stdout".to_string(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn status_registers_start_healthy() {
        let mut client = SimConnector::new().connect(&options()).unwrap();
        let service = "HALCS1:DEVIO:LNLS_AFC_TIMING0";
        assert_eq!(client.read_u32(service, "link_status"), Ok(1));
        assert_eq!(client.read_u32(service, "rtm_n1"), Ok(0));
    }

    #[test]
    fn clients_share_the_bank() {
        let sim = SimConnector::new();
        let mut first = sim.connect(&options()).unwrap();
        let mut second = sim.connect(&options()).unwrap();

        first.write_channel_u32("S", "amc_en", 3, 1).unwrap();
        assert_eq!(second.read_channel_u32("S", "amc_en", 3), Ok(1));
        assert_eq!(second.read_channel_u32("S", "amc_en", 2), Ok(0));
        assert_eq!(sim.peek("S", "amc_en", Some(3)), Some(Value::UInt32(1)));
        assert_eq!(sim.calls(), 3);
    }

    #[test]
    fn kind_mismatch_is_a_remote_error() {
        let mut client = SimConnector::new().connect(&options()).unwrap();
        client.write_f64("S", "phase", 0.5).unwrap();
        assert_eq!(client.read_u32("S", "phase"), Err(ClientError::Remote(-1)));
        assert_eq!(client.read_f64("S", "phase"), Ok(0.5));
    }
}
