//! Read-only inspection of component state.
//!
//! Queries never mutate emulation state, so they are safe to make from a
//! debugger between quanta or from a test after any step.

use std::fmt;

/// A value returned from a state query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// Several values, e.g. a pair of controller latches.
    List(Vec<Value>),
}

impl Value {
    /// Widen any integer value to `u64`.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Bool(v) => Some(u64::from(v)),
            Value::U8(v) => Some(u64::from(v)),
            Value::U16(v) => Some(u64::from(v)),
            Value::U32(v) => Some(u64::from(v)),
            Value::U64(v) => Some(v),
            Value::List(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "${v:02X}"),
            Value::U16(v) => write!(f, "${v:04X}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

/// A component whose state can be inspected by dotted path.
pub trait Observable {
    /// Query a property, e.g. `irq`, `ram.$0200` or `timing.line`.
    ///
    /// Returns `None` for an unknown path.
    fn query(&self, path: &str) -> Option<Value>;

    /// Paths accepted by [`query`](Self::query). Placeholders are written
    /// in angle brackets.
    fn query_paths(&self) -> &'static [&'static str];
}

/// Parse an address written as `0x1234`, `$1234` or decimal.
#[must_use]
pub fn parse_address(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix('$') {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        assert_eq!(Value::U8(0x0A).to_string(), "$0A");
        assert_eq!(Value::U16(0x7F00).to_string(), "$7F00");
        assert_eq!(
            Value::List(vec![Value::U8(0xFF), Value::Bool(true)]).to_string(),
            "[$FF, true]"
        );
    }

    #[test]
    fn address_forms() {
        assert_eq!(parse_address("0x7f00"), Some(0x7F00));
        assert_eq!(parse_address("$0200"), Some(0x0200));
        assert_eq!(parse_address("512"), Some(512));
        assert_eq!(parse_address("zz"), None);
    }
}
