//! Host fingerprinting for profile records.
//!
//! A profile measured on one machine must never steer another: the prefs
//! file keys every record by a fingerprint of the architecture, OS, and
//! detected extension set. Same machine, same fingerprint, across runs and
//! reboots; different extension set (new machine, VM migration, microcode
//! update) means a fresh record and the old one is simply ignored.

use core::fmt;

use vlk_platform::CapabilitySet;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(hash: u64, bytes: &[u8]) -> u64 {
  let mut h = hash;
  for &b in bytes {
    h ^= u64::from(b);
    h = h.wrapping_mul(FNV_PRIME);
  }
  h
}

/// Stable fingerprint of one host configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HostId(u64);

impl HostId {
  /// Fingerprint a capability snapshot. FNV-1a over arch, OS, and the raw
  /// extension bits.
  #[must_use]
  pub fn of(caps: &CapabilitySet) -> Self {
    let mut h = FNV_OFFSET;
    h = fnv1a(h, std::env::consts::ARCH.as_bytes());
    h = fnv1a(h, std::env::consts::OS.as_bytes());
    h = fnv1a(h, &caps.exts().bits().to_le_bytes());
    Self(h)
  }

  /// Fingerprint of the running host's detected capabilities.
  #[must_use]
  pub fn current() -> Self {
    Self::of(&vlk_platform::detect())
  }
}

impl fmt::Display for HostId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:016x}", self.0)
  }
}
