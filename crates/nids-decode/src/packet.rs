//! Layered packet representation

use std::net::IpAddr;

use crate::layer::{ApplicationLayer, LinkLayer, NetworkLayer, TransportLayer};
use crate::mac::MacAddress;
use crate::protocol::{ApplicationNaiveProtocol, ProtocolType};

/// One decoded layer, tagged with its protocol.
#[derive(Debug, PartialEq, Clone)]
pub enum Layer<'a> {
    Link(LinkLayer),
    Network(NetworkLayer<'a>),
    Transport(TransportLayer<'a>),
    Application(ApplicationLayer<'a>),
}

impl Layer<'_> {
    pub fn protocol_type(&self) -> ProtocolType {
        match self {
            Layer::Link(l) => ProtocolType::Link(l.protocol()),
            Layer::Network(l) => ProtocolType::Network(l.protocol()),
            Layer::Transport(l) => ProtocolType::Transport(l.protocol()),
            Layer::Application(l) => ProtocolType::Application(l.protocol()),
        }
    }
}

/// Decoding knobs, caller-supplied per decode call.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct DecodeOptions {
    /// Stop after decoding this protocol's layer, keeping the rest as
    /// payload.
    pub stop: Option<ProtocolType>,
    /// Verify IPv4 header checksums. Off for captures taken with checksum
    /// offload enabled.
    pub verify_checksums: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            stop: None,
            verify_checksums: true,
        }
    }
}

/// A decoded packet: layers in stack order plus the undecoded tail.
///
/// Invariant: layer stack ranks never decrease, and only link-level layers
/// repeat (VLAN stacking). A packet may terminate early but never out of
/// order. `payload` holds whatever no decoder claimed; `app_hint` is a
/// heuristic label for it, never a decoded fact.
#[derive(Debug, PartialEq, Clone)]
pub struct Packet<'a> {
    pub layers: Vec<Layer<'a>>,
    pub payload: &'a [u8],
    pub app_hint: Option<ApplicationNaiveProtocol>,
}

impl<'a> Packet<'a> {
    pub fn link(&self) -> Option<&LinkLayer> {
        self.layers.iter().find_map(|l| match l {
            Layer::Link(link) => Some(link),
            _ => None,
        })
    }

    pub fn network(&self) -> Option<&NetworkLayer<'a>> {
        self.layers.iter().find_map(|l| match l {
            Layer::Network(net) => Some(net),
            _ => None,
        })
    }

    pub fn transport(&self) -> Option<&TransportLayer<'a>> {
        self.layers.iter().find_map(|l| match l {
            Layer::Transport(t) => Some(t),
            _ => None,
        })
    }

    pub fn application(&self) -> Option<&ApplicationLayer<'a>> {
        self.layers.iter().find_map(|l| match l {
            Layer::Application(app) => Some(app),
            _ => None,
        })
    }

    pub fn src_mac(&self) -> Option<&MacAddress> {
        self.link().and_then(|l| l.src_mac())
    }

    pub fn dst_mac(&self) -> Option<&MacAddress> {
        self.link().and_then(|l| l.dst_mac())
    }

    pub fn src_ip(&self) -> Option<IpAddr> {
        self.network().and_then(|n| n.src_ip())
    }

    pub fn dst_ip(&self) -> Option<IpAddr> {
        self.network().and_then(|n| n.dst_ip())
    }

    pub fn src_port(&self) -> Option<u16> {
        self.transport().and_then(|t| t.src_port())
    }

    pub fn dst_port(&self) -> Option<u16> {
        self.transport().and_then(|t| t.dst_port())
    }

    /// The application protocol as a naive label: the decoded layer's if one
    /// exists, otherwise the heuristic guess for the payload.
    pub fn app_protocol(&self) -> Option<ApplicationNaiveProtocol> {
        self.application()
            .map(|app| app.protocol().into())
            .or(self.app_hint)
    }

    /// Protocol tags of the decoded layers, in stack order.
    pub fn protocol_types(&self) -> impl Iterator<Item = ProtocolType> + '_ {
        self.layers.iter().map(Layer::protocol_type)
    }

    pub fn has_protocol(&self, protocol: ProtocolType) -> bool {
        self.protocol_types().any(|p| p == protocol)
    }
}
