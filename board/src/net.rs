use core::fmt::{Display, Formatter};
use core::str::FromStr;

use thiserror::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum MacAddressError {
    #[error("a mac address is {} bytes", MacAddress::LEN)]
    Length,
    #[error("malformed mac address")]
    Format,
}

/// An IEEE 802 MAC-48 address.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MacAddress([u8; MacAddress::LEN]);

impl MacAddress {
    pub const LEN: usize = 6;
    pub const ZERO: Self = Self([0; Self::LEN]);

    #[must_use]
    pub const fn new(octets: [u8; Self::LEN]) -> Self {
        Self(octets)
    }

    #[must_use]
    pub const fn octets(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0; Self::LEN]
    }

    #[must_use]
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Usable as a station address: neither all zeroes nor multicast.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.is_zero() && !self.is_multicast()
    }
}

impl TryFrom<&[u8]> for MacAddress {
    type Error = MacAddressError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        value
            .try_into()
            .map(Self)
            .map_err(|_| MacAddressError::Length)
    }
}

/// Parses `xx:xx:xx:xx:xx:xx`.
impl FromStr for MacAddress {
    type Err = MacAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0; Self::LEN];
        let mut parts = s.split(':');
        for octet in &mut octets {
            let part = parts.next().ok_or(MacAddressError::Length)?;
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(MacAddressError::Format);
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| MacAddressError::Format)?;
        }
        if parts.next().is_some() {
            return Err(MacAddressError::Length);
        }
        Ok(Self(octets))
    }
}

impl Display for MacAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn parse() {
        let mac: MacAddress = "00:04:4B:aa:0b:c".parse().unwrap();
        assert_eq!(mac.octets(), &[0x00, 0x04, 0x4b, 0xaa, 0x0b, 0x0c]);
        assert_eq!(mac.to_string(), "00:04:4b:aa:0b:0c");

        assert_eq!("00:04:4b:aa:bb".parse::<MacAddress>(), Err(MacAddressError::Length));
        assert_eq!(
            "00:04:4b:aa:bb:cc:dd".parse::<MacAddress>(),
            Err(MacAddressError::Length)
        );
        assert_eq!(
            "00:04:4b:aa:bb:xx".parse::<MacAddress>(),
            Err(MacAddressError::Format)
        );
        assert_eq!(
            "00:04:4b:aa::cc".parse::<MacAddress>(),
            Err(MacAddressError::Format)
        );
        assert_eq!(
            "00:04:4b:aa:bb:+c".parse::<MacAddress>(),
            Err(MacAddressError::Format)
        );
    }

    #[test]
    fn from_bytes() {
        let raw = [0x02, 0, 0, 0, 0, 1];
        assert_eq!(MacAddress::try_from(&raw[..]), Ok(MacAddress::new(raw)));
        assert_eq!(
            MacAddress::try_from(&raw[..5]),
            Err(MacAddressError::Length)
        );
    }

    #[test]
    fn validity() {
        assert!(!MacAddress::ZERO.is_valid());
        assert!(!MacAddress::new([0x01, 0, 0x5e, 0, 0, 1]).is_valid());
        assert!(MacAddress::new([0x00, 0x04, 0x4b, 0, 0, 1]).is_valid());
    }
}
