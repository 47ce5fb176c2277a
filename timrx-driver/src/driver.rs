use std::{collections::HashMap, time::Duration};

use parking_lot::Mutex;
use timrx_core::{
    ConnectOptions, Connector, Readback, RegisterClient, Value, ValueKind,
    error::Error,
    naming::ServiceNaming,
    registry::FunctionRegistry,
    synth::{FXTAL_HZ, Si57x, SynthesizerSetting},
};

use crate::catalog::{self, Param, Pll};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Name under which the host registers the driver
    pub port_name: String,
    /// Address of the remote register service
    pub endpoint: String,
    /// Logical timing receiver number, 1 to 24
    pub unit_number: u32,
    pub verbosity: u32,
    pub log_sink: String,
    /// Timeout of a single remote call
    pub timeout: Duration,
    /// Number of addresses (channels) the driver serves
    pub max_addr: u32,
    /// Crystal frequency of the synthesizers
    pub fxtal: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port_name: "TIMRX".to_string(),
            endpoint: "ipc:///tmp/malamute".to_string(),
            unit_number: 1,
            verbosity: 0,
            log_sink: "stdout".to_string(),
            timeout: Duration::from_secs(1),
            max_addr: 8,
            fxtal: FXTAL_HZ,
        }
    }
}

impl Config {
    fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            endpoint: self.endpoint.clone(),
            verbosity: self.verbosity,
            log_sink: self.log_sink.clone(),
            timeout: self.timeout,
        }
    }
}

/// Builder to create a [Driver] instance and modify configuration options
///
/// # Example
///
/// ```ignore
/// use timrx_driver::driver::Builder;
/// use std::time::Duration;
///
/// let driver = Builder::new()
///     .unit_number(3)
///     .endpoint("tcp://10.0.18.35:8978")
///     .timeout(Duration::from_millis(500))
///     .build(my_connector)?;
/// ```
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    pub fn port_name(mut self, name: impl Into<String>) -> Self {
        self.config.port_name = name.into();
        self
    }

    /// Set the address of the remote register service
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Select the timing receiver to drive
    pub fn unit_number(mut self, unit: u32) -> Self {
        self.config.unit_number = unit;
        self
    }

    pub fn verbosity(mut self, verbosity: u32) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    pub fn log_sink(mut self, sink: impl Into<String>) -> Self {
        self.config.log_sink = sink.into();
        self
    }

    /// Set the timeout of a single remote call
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the number of addresses. Valid addresses are `0..max_addr`.
    pub fn max_addr(mut self, max_addr: u32) -> Self {
        self.config.max_addr = max_addr;
        self
    }

    /// Use a calibrated synthesizer crystal frequency
    pub fn fxtal(mut self, fxtal: f64) -> Self {
        self.config.fxtal = fxtal;
        self
    }

    /// Build the driver and open the initial connection
    pub fn build<K: Connector>(self, connector: K) -> Result<Driver<K>, Error> {
        Driver::new(connector, self.config)
    }
}

/// Register contents and output frequency a synthesizer reported after a write.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrequencyReadback {
    pub setting: SynthesizerSetting,
    pub frequency: f64,
}

struct State<C> {
    client: Option<C>,
    cache: HashMap<(Param, u32), Value>,
}

impl<C> State<C> {
    fn cached(&self, param: Param, address: u32) -> Value {
        self.cache
            .get(&(param, address))
            .copied()
            .unwrap_or(Value::zero(param.kind()))
    }

    fn cached_u32(&self, param: Param, address: u32) -> u32 {
        self.cached(param, address).as_u32().unwrap_or(0)
    }
}

/// Driver for one timing receiver.
///
/// The driver holds the last value written to each parameter and address. Reads
/// go to the hardware where a read procedure exists and fall back to that
/// stored value otherwise.
///
/// All calls take the connection lock for their whole duration, so a driver can
/// be shared between threads.
pub struct Driver<K: Connector> {
    config: Config,
    naming: ServiceNaming,
    registry: FunctionRegistry,
    synthesizer: Si57x,
    connector: K,
    state: Mutex<State<K::Client>>,
}

impl<K: Connector> Driver<K> {
    /// Validate the configuration, bind all parameters and connect.
    pub fn new(connector: K, config: Config) -> Result<Driver<K>, Error> {
        let naming = ServiceNaming::new(config.unit_number)?;
        let registry = FunctionRegistry::from_bindings(catalog::bindings())?;
        let synthesizer = Si57x::with_fxtal(config.fxtal)?;
        log::debug!(
            "{}: bound {} parameters for board {} core {}",
            config.port_name,
            registry.len(),
            naming.board(),
            naming.core()
        );

        let client = Self::open(&connector, &config)?;
        Ok(Driver {
            naming,
            registry,
            synthesizer,
            connector,
            state: Mutex::new(State {
                client: Some(client),
                cache: HashMap::new(),
            }),
            config,
        })
    }

    fn open(connector: &K, config: &Config) -> Result<K::Client, Error> {
        let options = config.connect_options();
        match connector.connect(&options) {
            Ok(client) => {
                log::info!("{}: connected to {}", config.port_name, options);
                Ok(client)
            }
            Err(source) => {
                log::error!(
                    "{}: could not connect to {}: {}",
                    config.port_name,
                    options.endpoint,
                    source
                );
                Err(Error::ConnectFailed {
                    endpoint: options.endpoint,
                    source,
                })
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn naming(&self) -> &ServiceNaming {
        &self.naming
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().client.is_some()
    }

    /// Open a new client if the driver is disconnected.
    pub fn connect(&self) -> Result<(), Error> {
        let mut state = self.state.lock();
        if state.client.is_none() {
            state.client = Some(Self::open(&self.connector, &self.config)?);
        }
        Ok(())
    }

    /// Release the client. Hardware-backed parameters fail until [Driver::connect] succeeds.
    pub fn disconnect(&self) {
        let mut state = self.state.lock();
        if let Some(mut client) = state.client.take() {
            client.disconnect();
            log::info!("{}: disconnected", self.config.port_name);
        }
    }

    /// Write the bits of `value` selected by `mask`.
    ///
    /// The bits outside `mask` keep their stored value. Only the masked bits are
    /// sent to the hardware. The stored value is updated even if the hardware
    /// write fails.
    pub fn write_u32(
        &self,
        param: Param,
        address: u32,
        value: u32,
        mask: u32,
    ) -> Result<(), Error> {
        self.check_access(param, address, ValueKind::UInt32)?;
        let mut state = self.state.lock();

        let stored = (state.cached_u32(param, address) & !mask) | (value & mask);
        state.cache.insert((param, address), Value::UInt32(stored));
        log::trace!("{}[{}] = {:#x} (mask {:#x})", param, address, stored, mask);

        self.write_hardware(&mut state, param, address, Value::UInt32(stored & mask))
    }

    /// Read the bits selected by `mask`, from the hardware where possible.
    pub fn read_u32(&self, param: Param, address: u32, mask: u32) -> Result<u32, Error> {
        self.check_access(param, address, ValueKind::UInt32)?;
        let mut state = self.state.lock();

        let value = match self.read_hardware(&mut state, param, address)? {
            Readback::Hardware(value) => value.as_u32().unwrap_or(0),
            Readback::Disabled => state.cached_u32(param, address),
        };
        Ok(value & mask)
    }

    /// Write a floating-point parameter.
    ///
    /// Writing the frequency of a synthesizer computes and writes its registers,
    /// see [Driver::set_frequency]. Synthesizer frequencies only exist at address 0.
    pub fn write_f64(&self, param: Param, address: u32, value: f64) -> Result<(), Error> {
        self.check_access(param, address, ValueKind::Float64)?;
        if let Some(pll) = Pll::from_frequency(param) {
            return self.set_frequency(pll, value).map(|_| ());
        }

        let mut state = self.state.lock();
        state.cache.insert((param, address), Value::Float64(value));
        self.write_hardware(&mut state, param, address, Value::Float64(value))
    }

    pub fn read_f64(&self, param: Param, address: u32) -> Result<f64, Error> {
        self.check_access(param, address, ValueKind::Float64)?;
        let mut state = self.state.lock();

        let value = match self.read_hardware(&mut state, param, address)? {
            Readback::Hardware(value) => value.as_f64().unwrap_or(0.0),
            Readback::Disabled => state.cached(param, address).as_f64().unwrap_or(0.0),
        };
        Ok(value)
    }

    /// Program a synthesizer to output `frequency` (in Hz).
    ///
    /// Writes N1, HS_DIV, RFREQ low and RFREQ high in that order, then reads
    /// all four back. The values read back and the frequency they encode are
    /// stored and returned. Nothing is written if `frequency` is out of reach.
    pub fn set_frequency(&self, pll: Pll, frequency: f64) -> Result<FrequencyReadback, Error> {
        let setting = self.synthesizer.compute_settings(frequency)?;
        let registers = pll.registers();
        let values = [
            setting.n1,
            setting.hs_div,
            setting.rfreq_lo,
            setting.rfreq_hi,
        ];

        // Only confirmed values are stored, a failed sequence leaves the store untouched
        let mut state = self.state.lock();
        for (param, value) in registers.into_iter().zip(values) {
            self.write_hardware(&mut state, param, 0, Value::UInt32(value))?;
        }

        let mut confirmed = [0; 4];
        for (slot, param) in confirmed.iter_mut().zip(registers) {
            *slot = match self.read_hardware(&mut state, param, 0)? {
                Readback::Hardware(value) => value.as_u32().unwrap_or(0),
                Readback::Disabled => state.cached_u32(param, 0),
            };
        }
        let [n1, hs_div, rfreq_lo, rfreq_hi] = confirmed;
        let confirmed = SynthesizerSetting {
            n1,
            hs_div,
            rfreq_lo,
            rfreq_hi,
        };
        let actual = self.synthesizer.compute_frequency(&confirmed)?;

        for (param, value) in registers.into_iter().zip([n1, hs_div, rfreq_lo, rfreq_hi]) {
            state.cache.insert((param, 0), Value::UInt32(value));
        }
        state
            .cache
            .insert((pll.frequency(), 0), Value::Float64(actual));

        if confirmed != setting {
            log::warn!(
                "{}: {} synthesizer reads back {:?}, expected {:?}",
                self.config.port_name,
                pll,
                confirmed,
                setting
            );
        }
        log::info!(
            "{}: {} synthesizer set to {} Hz (requested {} Hz)",
            self.config.port_name,
            pll,
            actual,
            frequency
        );
        Ok(FrequencyReadback {
            setting: confirmed,
            frequency: actual,
        })
    }

    fn check_access(&self, param: Param, address: u32, kind: ValueKind) -> Result<(), Error> {
        if address >= self.config.max_addr {
            return Err(Error::InvalidAddress {
                address,
                max: self.config.max_addr,
            });
        }
        if Pll::from_frequency(param).is_some() && address != 0 {
            return Err(Error::InvalidAddress { address, max: 1 });
        }
        if param.kind() != kind {
            return Err(Error::ValueKind {
                id: param.id(),
                expected: param.kind(),
                got: kind,
            });
        }
        Ok(())
    }

    fn write_hardware(
        &self,
        state: &mut State<K::Client>,
        param: Param,
        address: u32,
        value: Value,
    ) -> Result<(), Error> {
        let Some(client) = state.client.as_mut() else {
            return self.unbound_or_disconnected(param).map(|_| ());
        };
        self.registry
            .dispatch_write(client, &self.naming, param.id(), address, value)
    }

    fn read_hardware(
        &self,
        state: &mut State<K::Client>,
        param: Param,
        address: u32,
    ) -> Result<Readback, Error> {
        let Some(client) = state.client.as_mut() else {
            return self.unbound_or_disconnected(param);
        };
        self.registry
            .dispatch_read(client, &self.naming, param.id(), address)
    }

    fn unbound_or_disconnected(&self, param: Param) -> Result<Readback, Error> {
        if self.registry.lookup(param.id()).is_some() {
            log::debug!("{}: {} needs a connection", self.config.port_name, param);
            return Err(Error::Disconnected);
        }
        Ok(Readback::Disabled)
    }
}

impl<K: Connector> Drop for Driver<K> {
    fn drop(&mut self) {
        if let Some(mut client) = self.state.get_mut().client.take() {
            client.disconnect();
        }
    }
}
