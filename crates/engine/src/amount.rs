use std::{fmt, str::FromStr};

use crate::EngineError;

/// Whole-number amount as written in the ledger.
///
/// The ledger has no currency and no minor units: `120` means 120 元. The
/// value is signed because a budget can be exceeded, in which case the
/// remaining amount is negative.
///
/// # Examples
///
/// ```rust
/// use engine::Amount;
///
/// let amount: Amount = "2880".parse().unwrap();
/// assert_eq!(amount.value(), 2880);
/// assert_eq!(amount.to_string(), "2880");
/// assert_eq!(amount.grouped().to_string(), "2,880");
/// ```
///
/// Only an optional sign followed by ASCII digits is accepted:
///
/// ```rust
/// use engine::Amount;
///
/// assert!("12.5".parse::<Amount>().is_err());
/// assert!("1,000".parse::<Amount>().is_err());
/// assert!("abc".parse::<Amount>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Display adapter that groups thousands with `,` (`-1234567` renders as
    /// `-1,234,567`).
    #[must_use]
    pub fn grouped(self) -> Grouped {
        Grouped(self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// See [`Amount::grouped`].
#[derive(Clone, Copy, Debug)]
pub struct Grouped(Amount);

impl fmt::Display for Grouped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0.0;
        let digits = value.unsigned_abs().to_string();

        let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
        if value < 0 {
            out.push('-');
        }
        for (idx, ch) in digits.chars().enumerate() {
            if idx > 0 && (digits.len() - idx) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }

        f.write_str(&out)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl FromStr for Amount {
    type Err = EngineError;

    /// Parses an integer amount.
    ///
    /// Accepts an optional leading `+`/`-` and ASCII digits only. Decimals,
    /// thousand separators, inner whitespace and values outside `i64` are
    /// rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(s.to_string());

        let digits = s
            .strip_prefix('-')
            .or_else(|| s.strip_prefix('+'))
            .unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        s.parse::<i64>().map(Amount).map_err(|_| invalid())
    }
}
