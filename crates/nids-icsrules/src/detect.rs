//! Stateless rule-to-packet applicability
//!
//! Header match (protocol, addresses, ports, direction) plus the Modbus
//! argument constraints against the decoded PDU. No flow state and no
//! payload-content evaluation happen here; that belongs to a full matcher.

use nids_decode::decoders::{ModbusReqData, ModbusReqHeader, ModbusRspData, ModbusRspHeader};
use nids_decode::{ApplicationLayer, Packet};
use nids_rules::Action;

use crate::options::ModbusOption;
use crate::rule::IcsRule;

/// Outcome of checking one rule (or a rule set) against a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectResult {
    Hit(Action),
    Miss,
}

pub trait Detect {
    fn detect(&self, packet: &Packet<'_>) -> DetectResult;
}

impl Detect for IcsRule {
    fn detect(&self, packet: &Packet<'_>) -> DetectResult {
        if !self.header.matches(packet) {
            return DetectResult::Miss;
        }
        if self.args.iter().all(|arg| arg.matches(packet)) {
            DetectResult::Hit(self.action())
        } else {
            DetectResult::Miss
        }
    }
}

impl ModbusOption {
    /// Does the decoded packet satisfy this constraint? Rules with Modbus
    /// arguments only ever hit decoded Modbus layers.
    pub fn matches(&self, packet: &Packet<'_>) -> bool {
        match packet.application() {
            Some(ApplicationLayer::ModbusReq(req)) => self.matches_req(req),
            Some(ApplicationLayer::ModbusRsp(rsp)) => self.matches_rsp(rsp),
            _ => false,
        }
    }

    fn matches_req(&self, req: &ModbusReqHeader<'_>) -> bool {
        match self {
            Self::Function(code) => req.function_code == *code,
            Self::Unit(unit) => req.mbap.unit_id == *unit,
            Self::Address(range) => match (req.start_address(), req.end_address()) {
                (Some(start), Some(end)) => range.overlaps(start, end),
                _ => false,
            },
            Self::Value(range) => match &req.data {
                ModbusReqData::WriteSingleCoil { output_value, .. } => {
                    range.contains(*output_value)
                }
                ModbusReqData::WriteSingleRegister { register_value, .. } => {
                    range.contains(*register_value)
                }
                ModbusReqData::WriteMultipleRegisters { values, .. }
                | ModbusReqData::ReadWriteMultipleRegisters {
                    write_values: values,
                    ..
                } => values.iter().any(|v| range.contains(*v)),
                _ => false,
            },
        }
    }

    fn matches_rsp(&self, rsp: &ModbusRspHeader<'_>) -> bool {
        match self {
            // exception responses still carry the request's function code
            Self::Function(code) => rsp.function_code & 0x7f == *code,
            Self::Unit(unit) => rsp.mbap.unit_id == *unit,
            Self::Address(range) => match &rsp.data {
                ModbusRspData::WriteSingleCoil { output_address, .. } => {
                    range.contains(*output_address)
                }
                ModbusRspData::WriteSingleRegister {
                    register_address, ..
                } => range.contains(*register_address),
                ModbusRspData::WriteMultipleCoils {
                    start_address,
                    output_count,
                }
                | ModbusRspData::WriteMultipleRegisters {
                    start_address,
                    register_count: output_count,
                } => range.overlaps(
                    *start_address,
                    start_address.saturating_add(output_count.saturating_sub(1)),
                ),
                ModbusRspData::MaskWriteRegister { ref_address, .. } => {
                    range.contains(*ref_address)
                }
                _ => false,
            },
            Self::Value(range) => match &rsp.data {
                ModbusRspData::WriteSingleCoil { output_value, .. } => {
                    range.contains(*output_value)
                }
                ModbusRspData::WriteSingleRegister { register_value, .. } => {
                    range.contains(*register_value)
                }
                ModbusRspData::ReadHoldingRegisters { values }
                | ModbusRspData::ReadInputRegisters { values } => {
                    values.iter().any(|v| range.contains(*v))
                }
                _ => false,
            },
        }
    }
}
