//! Typed dispatch from parameters to remote register procedures.
//!
//! Each parameter with a hardware counterpart is bound to exactly one [`CallShape`].
//! The shape fixes how the parameter is marshalled to the remote side: as a plain
//! 32-bit value, as a 32-bit value of one channel, or as a 64-bit float. Callers
//! never need to know the shape; [`FunctionRegistry::dispatch_write`] and
//! [`FunctionRegistry::dispatch_read`] resolve it.
use std::{
    collections::{HashMap, hash_map::Entry},
    fmt::Debug,
};

use crate::{
    ClientError, ParameterId, Readback, RegisterClient, Value, ValueKind,
    error::Error,
    naming::{ServiceNaming, channel_index},
};

pub type WriteU32Fn = fn(&mut dyn RegisterClient, &str, u32) -> Result<(), ClientError>;
pub type ReadU32Fn = fn(&mut dyn RegisterClient, &str) -> Result<u32, ClientError>;
pub type WriteChannelFn = fn(&mut dyn RegisterClient, &str, u32, u32) -> Result<(), ClientError>;
pub type ReadChannelFn = fn(&mut dyn RegisterClient, &str, u32) -> Result<u32, ClientError>;
pub type WriteF64Fn = fn(&mut dyn RegisterClient, &str, f64) -> Result<(), ClientError>;
pub type ReadF64Fn = fn(&mut dyn RegisterClient, &str) -> Result<f64, ClientError>;

/// Call signature of the remote procedures bound to one parameter.
///
/// `service` is the base name of the remote service; the fully qualified name is
/// built per call. A missing `write` or `read` function means the register cannot
/// be accessed in that direction.
#[derive(Copy, Clone)]
pub enum CallShape {
    PlainInt32 {
        service: &'static str,
        register: &'static str,
        write: Option<WriteU32Fn>,
        read: Option<ReadU32Fn>,
    },
    ChannelInt32 {
        service: &'static str,
        register: &'static str,
        write: Option<WriteChannelFn>,
        read: Option<ReadChannelFn>,
    },
    PlainFloat64 {
        service: &'static str,
        register: &'static str,
        write: Option<WriteF64Fn>,
        read: Option<ReadF64Fn>,
    },
}

impl CallShape {
    /// Base name of the remote service
    pub fn service(&self) -> &'static str {
        match self {
            CallShape::PlainInt32 { service, .. }
            | CallShape::ChannelInt32 { service, .. }
            | CallShape::PlainFloat64 { service, .. } => service,
        }
    }

    /// Name of the remote register, used for diagnostics
    pub fn register(&self) -> &'static str {
        match self {
            CallShape::PlainInt32 { register, .. }
            | CallShape::ChannelInt32 { register, .. }
            | CallShape::PlainFloat64 { register, .. } => register,
        }
    }

    /// The kind of value the shape marshals
    pub fn value_kind(&self) -> ValueKind {
        match self {
            CallShape::PlainInt32 { .. } | CallShape::ChannelInt32 { .. } => ValueKind::UInt32,
            CallShape::PlainFloat64 { .. } => ValueKind::Float64,
        }
    }

    pub fn is_writable(&self) -> bool {
        match self {
            CallShape::PlainInt32 { write, .. } => write.is_some(),
            CallShape::ChannelInt32 { write, .. } => write.is_some(),
            CallShape::PlainFloat64 { write, .. } => write.is_some(),
        }
    }

    pub fn is_readable(&self) -> bool {
        match self {
            CallShape::PlainInt32 { read, .. } => read.is_some(),
            CallShape::ChannelInt32 { read, .. } => read.is_some(),
            CallShape::PlainFloat64 { read, .. } => read.is_some(),
        }
    }

    /// Short name of the shape
    pub fn name(&self) -> &'static str {
        match self {
            CallShape::PlainInt32 { .. } => "PlainInt32",
            CallShape::ChannelInt32 { .. } => "ChannelInt32",
            CallShape::PlainFloat64 { .. } => "PlainFloat64",
        }
    }
}

impl Debug for CallShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(self.name())
            .field("service", &self.service())
            .field("register", &self.register())
            .field("write", &self.is_writable())
            .field("read", &self.is_readable())
            .finish()
    }
}

/// Hardware bindings of all parameters of a driver.
///
/// Parameters absent from the registry are software-only. Reading them yields
/// [`Readback::Disabled`] and writing them is a no-op.
#[derive(Debug, Default, Clone)]
pub struct FunctionRegistry {
    bindings: HashMap<ParameterId, CallShape>,
}

impl FunctionRegistry {
    pub fn new() -> FunctionRegistry {
        FunctionRegistry::default()
    }

    /// Build a registry from an explicit list of bindings.
    pub fn from_bindings(
        bindings: impl IntoIterator<Item = (ParameterId, CallShape)>,
    ) -> Result<FunctionRegistry, Error> {
        let mut registry = FunctionRegistry::new();
        for (id, shape) in bindings {
            registry.register(id, shape)?;
        }
        Ok(registry)
    }

    /// Bind `id` to `shape`. A second binding for the same id is rejected and the
    /// first one stays in place.
    pub fn register(&mut self, id: ParameterId, shape: CallShape) -> Result<(), Error> {
        match self.bindings.entry(id) {
            Entry::Occupied(_) => Err(Error::DuplicateBinding(id)),
            Entry::Vacant(entry) => {
                log::trace!("Binding parameter {} to {:?}", id, shape);
                entry.insert(shape);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, id: ParameterId) -> Option<&CallShape> {
        self.bindings.get(&id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterId, &CallShape)> {
        self.bindings.iter().map(|(id, shape)| (*id, shape))
    }

    /// Write `value` to the hardware register bound to `id`.
    ///
    /// Unbound parameters and parameters without a write function succeed without
    /// a remote call.
    pub fn dispatch_write(
        &self,
        client: &mut dyn RegisterClient,
        naming: &ServiceNaming,
        id: ParameterId,
        address: u32,
        value: Value,
    ) -> Result<(), Error> {
        let Some(shape) = self.lookup(id) else {
            log::debug!("No hardware binding for parameter {}", id);
            return Ok(());
        };
        check_kind(id, shape, value)?;

        let result = match (*shape, value) {
            (
                CallShape::PlainInt32 {
                    service,
                    write: Some(write),
                    ..
                },
                Value::UInt32(value),
            ) => {
                let target = naming.service_name(address, service)?;
                log::debug!("Write {} = {} on {}", shape.register(), value, target);
                write(client, &target, value).map_err(|e| (target, e))
            }
            (
                CallShape::ChannelInt32 {
                    service,
                    write: Some(write),
                    ..
                },
                Value::UInt32(value),
            ) => {
                let target = naming.service_name(address, service)?;
                let channel = channel_index(address);
                log::debug!(
                    "Write {}[{}] = {} on {}",
                    shape.register(),
                    channel,
                    value,
                    target
                );
                write(client, &target, channel, value).map_err(|e| (target, e))
            }
            (
                CallShape::PlainFloat64 {
                    service,
                    write: Some(write),
                    ..
                },
                Value::Float64(value),
            ) => {
                let target = naming.service_name(address, service)?;
                log::debug!("Write {} = {} on {}", shape.register(), value, target);
                write(client, &target, value).map_err(|e| (target, e))
            }
            _ => {
                log::debug!("Parameter {} has no hardware write function", id);
                return Ok(());
            }
        };

        result.map_err(|(service, source)| {
            log::error!(
                "Failure executing write of {} for service {}, value = {}: {}",
                shape.register(),
                service,
                value,
                source
            );
            Error::HardwareAccessFailed {
                service,
                register: shape.register(),
                source,
            }
        })
    }

    /// Read the hardware register bound to `id`.
    ///
    /// Unbound parameters and parameters without a read function report
    /// [`Readback::Disabled`].
    pub fn dispatch_read(
        &self,
        client: &mut dyn RegisterClient,
        naming: &ServiceNaming,
        id: ParameterId,
        address: u32,
    ) -> Result<Readback, Error> {
        let Some(shape) = self.lookup(id) else {
            log::debug!("No hardware binding for parameter {}", id);
            return Ok(Readback::Disabled);
        };

        let result = match *shape {
            CallShape::PlainInt32 {
                service,
                read: Some(read),
                ..
            } => {
                let target = naming.service_name(address, service)?;
                read(client, &target)
                    .map(Value::UInt32)
                    .map_err(|e| (target, e))
            }
            CallShape::ChannelInt32 {
                service,
                read: Some(read),
                ..
            } => {
                let target = naming.service_name(address, service)?;
                read(client, &target, channel_index(address))
                    .map(Value::UInt32)
                    .map_err(|e| (target, e))
            }
            CallShape::PlainFloat64 {
                service,
                read: Some(read),
                ..
            } => {
                let target = naming.service_name(address, service)?;
                read(client, &target)
                    .map(Value::Float64)
                    .map_err(|e| (target, e))
            }
            _ => {
                log::debug!("Parameter {} has no hardware read function", id);
                return Ok(Readback::Disabled);
            }
        };

        match result {
            Ok(value) => {
                log::trace!("Read {}[{}] = {}", shape.register(), address, value);
                Ok(Readback::Hardware(value))
            }
            Err((service, source)) => {
                log::error!(
                    "Failure executing read of {} for service {}: {}",
                    shape.register(),
                    service,
                    source
                );
                Err(Error::HardwareAccessFailed {
                    service,
                    register: shape.register(),
                    source,
                })
            }
        }
    }
}

fn check_kind(id: ParameterId, shape: &CallShape, value: Value) -> Result<(), Error> {
    if shape.value_kind() != value.kind() {
        return Err(Error::ValueKind {
            id,
            expected: shape.value_kind(),
            got: value.kind(),
        });
    }
    Ok(())
}
