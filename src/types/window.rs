use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Length of a rolling accumulation window, in months.
///
/// Always at least one month. Serializes as a plain integer so configuration files
/// can list windows as `[1, 3, 12]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct WindowLength(NonZeroU32);

impl WindowLength {
    /// Returns `None` for a zero-month window.
    pub fn new(months: u32) -> Option<Self> {
        NonZeroU32::new(months).map(Self)
    }

    pub fn months(self) -> u32 {
        self.0.get()
    }

    pub(crate) fn as_usize(self) -> usize {
        self.0.get() as usize
    }
}

impl TryFrom<u32> for WindowLength {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        WindowLength::new(value).ok_or_else(|| "window length must be at least one month".into())
    }
}

impl From<WindowLength> for u32 {
    fn from(value: WindowLength) -> Self {
        value.months()
    }
}

impl fmt::Display for WindowLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}
