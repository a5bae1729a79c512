//! MAC address type with byte and integral representations.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 48-bit Ethernet MAC address.
///
/// The address is stored as its six wire bytes. The integral form
/// ([`MacAddress::to_u64`]) places the first wire byte in the most
/// significant position, so `aa:bb:cc:dd:ee:ff` is `0xAABBCCDDEEFF`.
///
/// # Examples
///
/// ```
/// use l2switch_types::MacAddress;
///
/// let mac: MacAddress = "00:11:22:33:44:55".parse().unwrap();
/// assert_eq!(mac.to_u64(), 0x0011_2233_4455);
/// assert_eq!(MacAddress::from_u64(0x0011_2233_4455).unwrap(), mac);
///
/// // Also supports hyphen-separated format
/// let mac2: MacAddress = "00-11-22-33-44-55".parse().unwrap();
/// assert_eq!(mac, mac2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// The broadcast MAC address (FF:FF:FF:FF:FF:FF).
    pub const BROADCAST: MacAddress = MacAddress([0xff; 6]);

    /// The zero/null MAC address (00:00:00:00:00:00).
    pub const ZERO: MacAddress = MacAddress([0; 6]);

    /// Largest value representable by a 48-bit address.
    pub const MAX_U64: u64 = 0xffff_ffff_ffff;

    /// Creates a new MAC address from raw bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// Creates a MAC address from its 48-bit integral form.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` has any of its upper 16 bits set.
    pub fn from_u64(value: u64) -> Result<Self, ParseError> {
        if value > Self::MAX_U64 {
            return Err(ParseError::MacOutOfRange(value));
        }
        let b = value.to_be_bytes();
        Ok(MacAddress([b[2], b[3], b[4], b[5], b[6], b[7]]))
    }

    /// Returns the 48-bit integral form of this address.
    pub const fn to_u64(&self) -> u64 {
        let b = self.0;
        u64::from_be_bytes([0, 0, b[0], b[1], b[2], b[3], b[4], b[5]])
    }

    /// Returns the raw bytes of the MAC address.
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns true if this is a multicast address.
    ///
    /// A multicast address has the least significant bit of the first octet set.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Returns true if this is a unicast address.
    pub const fn is_unicast(&self) -> bool {
        !self.is_multicast()
    }

    /// Returns true if this is the all-ones broadcast address.
    pub const fn is_broadcast(&self) -> bool {
        self.to_u64() == Self::MAX_U64
    }

    /// Returns true if this is the zero address.
    pub const fn is_zero(&self) -> bool {
        self.to_u64() == 0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Support both colon and hyphen separators
        let separator = if s.contains(':') { ':' } else { '-' };

        let parts: Vec<&str> = s.split(separator).collect();
        if parts.len() != 6 {
            return Err(ParseError::InvalidMacAddress(s.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() || part.len() > 2 {
                return Err(ParseError::InvalidMacAddress(s.to_string()));
            }
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| ParseError::InvalidMacAddress(s.to_string()))?;
        }

        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<u64> for MacAddress {
    type Error = ParseError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        MacAddress::from_u64(value)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

impl From<MacAddress> for u64 {
    fn from(mac: MacAddress) -> u64 {
        mac.to_u64()
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

impl From<MacAddress> for [u8; 6] {
    fn from(mac: MacAddress) -> [u8; 6] {
        mac.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_colon_format() {
        let mac: MacAddress = "00:11:22:33:44:55".parse().unwrap();
        assert_eq!(mac.as_bytes(), &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    }

    #[test]
    fn test_parse_hyphen_format() {
        let mac: MacAddress = "AA-BB-CC-DD-EE-FF".parse().unwrap();
        assert_eq!(mac.as_bytes(), &[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    }

    #[test]
    fn test_display() {
        let mac = MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_integral_form_is_big_endian() {
        let mac = MacAddress::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(mac.to_u64(), 0xaabb_ccdd_eeff);
        assert_eq!(MacAddress::from_u64(0xaabb_ccdd_eeff).unwrap(), mac);
        assert_eq!(u64::from(MacAddress::ZERO), 0);
    }

    #[test]
    fn test_from_u64_rejects_wide_values() {
        assert_eq!(
            MacAddress::from_u64(0x1_0000_0000_0000),
            Err(ParseError::MacOutOfRange(0x1_0000_0000_0000))
        );
        assert!(MacAddress::from_u64(MacAddress::MAX_U64).is_ok());
    }

    #[test]
    fn test_broadcast() {
        assert!(MacAddress::BROADCAST.is_broadcast());
        assert!(MacAddress::BROADCAST.is_multicast());
        assert!(!MacAddress::ZERO.is_broadcast());
        assert_eq!(MacAddress::BROADCAST.to_u64(), 0xffff_ffff_ffff);

        let almost: MacAddress = "ff:ff:ff:ff:ff:fe".parse().unwrap();
        assert!(!almost.is_broadcast());
    }

    #[test]
    fn test_multicast() {
        let multicast: MacAddress = "01:80:c2:00:00:0e".parse().unwrap();
        assert!(multicast.is_multicast());

        let unicast: MacAddress = "00:11:22:33:44:55".parse().unwrap();
        assert!(unicast.is_unicast());
    }

    #[test]
    fn test_invalid_format() {
        assert!("invalid".parse::<MacAddress>().is_err());
        assert!("00:11:22:33:44".parse::<MacAddress>().is_err());
        assert!("00:11:22:33:44:55:66".parse::<MacAddress>().is_err());
        assert!("gg:11:22:33:44:55".parse::<MacAddress>().is_err());
        assert!("000:11:22:33:44:5".parse::<MacAddress>().is_err());
    }
}
