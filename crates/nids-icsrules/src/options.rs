//! ICS-specific rule options
//!
//! The ICS vocabulary lives in a dotted `modbus.*` namespace, so no ICS
//! keyword can ever shadow a generic one: dispatch tries this table first
//! and falls back to the generic grammar for everything else.

use serde::{Deserialize, Serialize};

/// Inclusive value range; a single value is `min == max`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange {
    pub min: u16,
    pub max: u16,
}

impl ValueRange {
    pub fn single(value: u16) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn contains(&self, value: u16) -> bool {
        self.min <= value && value <= self.max
    }

    /// Does `[start, end]` intersect this range?
    pub fn overlaps(&self, start: u16, end: u16) -> bool {
        self.min <= end && start <= self.max
    }
}

/// One `modbus.*` option.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModbusOption {
    /// `modbus.func`: function code, by number or mnemonic.
    Function(u8),
    /// `modbus.unit`: MBAP unit identifier.
    Unit(u8),
    /// `modbus.addr`: coil/register address constraint.
    Address(ValueRange),
    /// `modbus.value`: written-value constraint.
    Value(ValueRange),
}

impl ModbusOption {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Function(_) => "modbus.func",
            Self::Unit(_) => "modbus.unit",
            Self::Address(_) => "modbus.addr",
            Self::Value(_) => "modbus.value",
        }
    }
}

/// Mnemonic names accepted by `modbus.func`.
pub(crate) fn function_code_from_name(name: &str) -> Option<u8> {
    let code = match name {
        "read_coils" => 1,
        "read_discrete_inputs" => 2,
        "read_holding_registers" => 3,
        "read_input_registers" => 4,
        "write_single_coil" => 5,
        "write_single_register" => 6,
        "read_exception_status" => 7,
        "diagnostics" => 8,
        "get_comm_event_counter" => 11,
        "get_comm_event_log" => 12,
        "write_multiple_coils" => 15,
        "write_multiple_registers" => 16,
        "report_server_id" => 17,
        "read_file_record" => 20,
        "write_file_record" => 21,
        "mask_write_register" => 22,
        "read_write_multiple_registers" => 23,
        "read_fifo_queue" => 24,
        "encapsulated_interface_transport" => 43,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_overlap() {
        let range = ValueRange { min: 10, max: 20 };
        assert!(range.contains(10));
        assert!(range.contains(20));
        assert!(!range.contains(21));
        assert!(range.overlaps(0, 10));
        assert!(range.overlaps(20, 30));
        assert!(!range.overlaps(21, 30));
    }

    #[test]
    fn mnemonics_map_to_codes() {
        assert_eq!(function_code_from_name("read_coils"), Some(1));
        assert_eq!(function_code_from_name("write_multiple_registers"), Some(16));
        assert_eq!(function_code_from_name("bogus"), None);
    }
}
