//! Ethernet II ether type.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ethernet II payload type (the 16-bit field after the source MAC).
///
/// Values below [`EtherType::MIN_ETHER_II`] are 802.3 length fields,
/// not ether types.
///
/// # Examples
///
/// ```
/// use l2switch_types::EtherType;
///
/// let lldp: EtherType = "lldp".parse().unwrap();
/// assert_eq!(lldp, EtherType::LLDP);
///
/// let ipv4: EtherType = "0x0800".parse().unwrap();
/// assert_eq!(ipv4.to_string(), "0x0800");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EtherType(u16);

impl EtherType {
    /// Internet Protocol version 4.
    pub const IPV4: EtherType = EtherType(0x0800);
    /// Address Resolution Protocol.
    pub const ARP: EtherType = EtherType(0x0806);
    /// IEEE 802.1Q VLAN tag.
    pub const VLAN: EtherType = EtherType(0x8100);
    /// Internet Protocol version 6.
    pub const IPV6: EtherType = EtherType(0x86dd);
    /// Link Layer Discovery Protocol.
    pub const LLDP: EtherType = EtherType(0x88cc);

    /// Smallest value interpreted as an ether type rather than a length.
    pub const MIN_ETHER_II: u16 = 0x0600;

    /// Creates an ether type from its raw value.
    pub const fn new(value: u16) -> Self {
        EtherType(value)
    }

    /// Returns the raw 16-bit value.
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true if the value is an Ethernet II type (not an 802.3 length).
    pub const fn is_ether_ii(&self) -> bool {
        self.0 >= Self::MIN_ETHER_II
    }

    /// Returns a short protocol name for well-known types.
    pub const fn name(&self) -> Option<&'static str> {
        match self.0 {
            0x0800 => Some("ipv4"),
            0x0806 => Some("arp"),
            0x8100 => Some("vlan"),
            0x86dd => Some("ipv6"),
            0x88cc => Some("lldp"),
            _ => None,
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

impl FromStr for EtherType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ipv4" => Ok(EtherType::IPV4),
            "arp" => Ok(EtherType::ARP),
            "vlan" => Ok(EtherType::VLAN),
            "ipv6" => Ok(EtherType::IPV6),
            "lldp" => Ok(EtherType::LLDP),
            other => {
                let digits = other.strip_prefix("0x").unwrap_or(other);
                u16::from_str_radix(digits, 16)
                    .map(EtherType)
                    .map_err(|_| ParseError::InvalidEtherType(s.to_string()))
            }
        }
    }
}

impl From<u16> for EtherType {
    fn from(value: u16) -> Self {
        EtherType(value)
    }
}

impl From<EtherType> for u16 {
    fn from(ether_type: EtherType) -> u16 {
        ether_type.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_well_known_values() {
        assert_eq!(EtherType::IPV4.as_u16(), 0x0800);
        assert_eq!(EtherType::IPV6.as_u16(), 0x86dd);
        assert_eq!(EtherType::LLDP.as_u16(), 0x88cc);
        assert_eq!(EtherType::LLDP.name(), Some("lldp"));
        assert_eq!(EtherType::new(0x1234).name(), None);
    }

    #[test]
    fn test_parse_names_and_hex() {
        assert_eq!("IPv6".parse::<EtherType>().unwrap(), EtherType::IPV6);
        assert_eq!("0x88cc".parse::<EtherType>().unwrap(), EtherType::LLDP);
        assert_eq!("0806".parse::<EtherType>().unwrap(), EtherType::ARP);
        assert!("bogus".parse::<EtherType>().is_err());
    }

    #[test]
    fn test_display_is_padded_hex() {
        assert_eq!(EtherType::IPV4.to_string(), "0x0800");
        assert_eq!(EtherType::LLDP.to_string(), "0x88cc");
    }

    #[test]
    fn test_length_field_is_not_ether_ii() {
        assert!(!EtherType::new(0x05dc).is_ether_ii());
        assert!(EtherType::IPV4.is_ether_ii());
    }
}
