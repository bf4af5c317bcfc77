//! Identifier types.
//!
//! Everything that can cross into a host that only speaks double-precision
//! numbers is a fixed-width integer newtype here, with lossless `f64`
//! conversions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest integer an `f64` represents exactly (2^53).
///
/// Engine-issued handles never exceed this value.
pub const MAX_BOUNDARY_HANDLE: u64 = 1 << 53;

fn integral_from_f64(value: f64, max: u64) -> Option<u64> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > max as f64 {
        return None;
    }
    Some(value as u64)
}

/// Operating-system process identifier.
///
/// `pid_t` on Unix and `DWORD` on Windows both fit in a `u32`, which in turn
/// fits exactly in an `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcId(u32);

impl ProcId {
    /// Failure sentinel. No call ever targets process 0.
    pub const INVALID: ProcId = ProcId(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u32 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.0)
    }

    /// Converts a boundary value back, rejecting anything that is not an
    /// exact non-negative integer in range.
    pub fn from_f64(value: f64) -> Option<Self> {
        integral_from_f64(value, u64::from(u32::MAX)).map(|raw| Self(raw as u32))
    }
}

impl From<u32> for ProcId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ProcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Common behavior of engine-issued handles.
pub trait Handle: Copy + Eq + std::hash::Hash + fmt::Display {
    const INVALID: Self;

    fn from_raw(raw: u64) -> Self;

    fn as_raw(self) -> u64;

    fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    fn to_f64(self) -> f64 {
        self.as_raw() as f64
    }

    fn from_f64(value: f64) -> Option<Self> {
        integral_from_f64(value, MAX_BOUNDARY_HANDLE).map(Self::from_raw)
    }
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl Handle for $name {
            const INVALID: Self = Self(0);

            fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            fn as_raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

define_handle!(
    /// Reference to a child started by the engine. Distinct from its [`ProcId`].
    ProcessHandle,
    "process"
);

define_handle!(
    /// Reference to a registry-owned process list snapshot.
    ListHandle,
    "list"
);

define_handle!(
    /// Reference to a registry-owned process info snapshot.
    InfoHandle,
    "info"
);

/// Opaque identifier of a top-level GUI window.
///
/// The decimal rendering of the native handle (an X11 window id or a
/// Windows `HWND`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    pub fn from_native(handle: usize) -> Self {
        Self(handle.to_string())
    }

    /// The native handle this id was made from, if it is well formed.
    pub fn native(&self) -> Option<usize> {
        self.0.trim().parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for WindowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WindowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
