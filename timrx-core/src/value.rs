use std::fmt::Display;

/// Key of one hardware-backed attribute.
///
/// Ids are handed out once when the driver builds its parameter table and stay
/// valid for the lifetime of the process.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ParameterId(u32);

impl ParameterId {
    pub const fn new(id: u32) -> ParameterId {
        ParameterId(id)
    }

    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl Display for ParameterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of value a parameter carries.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ValueKind {
    UInt32,
    Float64,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::UInt32 => write!(f, "UInt32"),
            ValueKind::Float64 => write!(f, "Float64"),
        }
    }
}

/// Value passed through the dispatch layer.
///
/// Callers fill the box according to the kind the parameter was declared with.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    UInt32(u32),
    Float64(f64),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::UInt32(_) => ValueKind::UInt32,
            Value::Float64(_) => ValueKind::Float64,
        }
    }

    /// A zeroed value of the given kind
    pub fn zero(kind: ValueKind) -> Value {
        match kind {
            ValueKind::UInt32 => Value::UInt32(0),
            ValueKind::Float64 => Value::Float64(0.0),
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::UInt32(value) => Some(*value),
            Value::Float64(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(value) => Some(*value),
            Value::UInt32(_) => None,
        }
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInt32(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::UInt32(value) => write!(f, "{}", value),
            Value::Float64(value) => write!(f, "{}", value),
        }
    }
}

/// Outcome of a dispatched read.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Readback {
    /// The value was read from the hardware.
    Hardware(Value),
    /// The parameter has no hardware accessor. The caller should use its own stored copy.
    Disabled,
}

#[test]
fn value_kinds() {
    assert_eq!(Value::from(3_u32).kind(), ValueKind::UInt32);
    assert_eq!(Value::from(3.0).kind(), ValueKind::Float64);
    assert_eq!(Value::zero(ValueKind::Float64), Value::Float64(0.0));
    assert_eq!(Value::UInt32(7).as_f64(), None);
}
