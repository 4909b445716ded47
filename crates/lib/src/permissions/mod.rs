//! Bitmask permission model attached to every user record.
//!
//! A user carries two independent 64-bit masks:
//!
//! * **permissions**: each bit is a capability toggle
//! * **flags**: each bit is a boolean attribute that is not a capability
//!
//! The two masks live in separate fields so an edit to one bit space can never
//! leak into the other. Bit indices are taken as `i64` because they usually come
//! straight from operator input; anything outside `0..64` is rejected with
//! [`PermissionError::BitIndexOutOfRange`].

mod errors;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use errors::PermissionError;

/// Number of addressable bits in each mask.
pub const MAX_BITS: u32 = u64::BITS;

/// Selects which of the two masks an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskKind {
    /// The capability mask
    Permission,
    /// The attribute mask
    Flag,
}

impl fmt::Display for MaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskKind::Permission => f.write_str("permission"),
            MaskKind::Flag => f.write_str("flag"),
        }
    }
}

/// Raw mask helpers shared by both bit spaces.
pub mod mask {
    use super::{MAX_BITS, MaskKind, PermissionError};

    /// Returns whether bit `index` is set. Indices outside `0..64` are never set.
    pub fn has_bit(mask: u64, index: i64) -> bool {
        match u32::try_from(index) {
            Ok(i) if i < MAX_BITS => mask & (1u64 << i) != 0,
            _ => false,
        }
    }

    /// Validates that `index` addresses a bit of a `kind` mask.
    pub fn check_index(kind: MaskKind, index: i64) -> Result<u32, PermissionError> {
        match u32::try_from(index) {
            Ok(i) if i < MAX_BITS => Ok(i),
            _ => Err(PermissionError::BitIndexOutOfRange { kind, index }),
        }
    }

    /// Returns `mask` with bit `index` set to `value`.
    ///
    /// The input is never modified; on error the caller keeps its old mask.
    pub fn with_bit(
        kind: MaskKind,
        mask: u64,
        index: i64,
        value: bool,
    ) -> Result<u64, PermissionError> {
        let bit = 1u64 << check_index(kind, index)?;
        Ok(if value { mask | bit } else { mask & !bit })
    }
}

/// Permission and flag masks for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions {
    /// Capability mask
    pub permissions: u64,
    /// Attribute mask
    pub flags: u64,
}

impl Permissions {
    /// Create a model from raw masks.
    pub fn new(permissions: u64, flags: u64) -> Self {
        Self { permissions, flags }
    }

    /// Returns the raw mask selected by `kind`.
    pub fn mask(&self, kind: MaskKind) -> u64 {
        match kind {
            MaskKind::Permission => self.permissions,
            MaskKind::Flag => self.flags,
        }
    }

    /// Returns whether bit `index` of the selected mask is set.
    pub fn has(&self, kind: MaskKind, index: i64) -> bool {
        mask::has_bit(self.mask(kind), index)
    }

    /// Sets or clears bit `index` of the selected mask and returns the new mask.
    pub fn set(&mut self, kind: MaskKind, index: i64, value: bool) -> Result<u64, PermissionError> {
        let slot = match kind {
            MaskKind::Permission => &mut self.permissions,
            MaskKind::Flag => &mut self.flags,
        };
        *slot = mask::with_bit(kind, *slot, index, value)?;
        Ok(*slot)
    }

    pub fn has_permission(&self, index: i64) -> bool {
        self.has(MaskKind::Permission, index)
    }

    pub fn set_permission(&mut self, index: i64, value: bool) -> Result<u64, PermissionError> {
        self.set(MaskKind::Permission, index, value)
    }

    pub fn has_flag(&self, index: i64) -> bool {
        self.has(MaskKind::Flag, index)
    }

    pub fn set_flag(&mut self, index: i64, value: bool) -> Result<u64, PermissionError> {
        self.set(MaskKind::Flag, index, value)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "perms=0x{:016x} flags=0x{:016x}",
            self.permissions, self.flags
        )
    }
}
