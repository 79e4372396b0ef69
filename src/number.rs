//! Locale conventions for reading currency-formatted prices.
//!
//! Prices in the sales export are strings such as `"$1,234.56"`. How the digits
//! are grouped and which character separates the fraction depends on the locale
//! the export was produced in, so the convention is passed around as a
//! [`NumberFormat`] value instead of being read from process-wide state.

use std::fmt;
use std::str::FromStr;

/// Separator conventions used to turn a price string into a number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumberFormat {
    name: String,
    currency_symbol: String,
    grouping_separators: Vec<char>,
    decimal_separator: char,
}

impl NumberFormat {
    /// Creates a custom convention.
    pub fn new(
        name: impl Into<String>,
        currency_symbol: impl Into<String>,
        grouping_separators: impl Into<Vec<char>>,
        decimal_separator: char,
    ) -> Self {
        Self {
            name: name.into(),
            currency_symbol: currency_symbol.into(),
            grouping_separators: grouping_separators.into(),
            decimal_separator,
        }
    }

    /// `1,234.56`
    pub fn en_us() -> Self {
        Self::new("en_US", "$", vec![','], '.')
    }

    /// `1.234,56`
    pub fn de_de() -> Self {
        Self::new("de_DE", "$", vec!['.'], ',')
    }

    /// `1 234,56`, grouped with a narrow no-break space or a plain space.
    pub fn fr_fr() -> Self {
        Self::new("fr_FR", "$", vec!['\u{202f}', '\u{a0}', ' '], ',')
    }

    /// The POSIX convention: no grouping, `.` as decimal separator.
    pub fn posix() -> Self {
        Self::new("C", "$", Vec::new(), '.')
    }

    /// Name of the convention, e.g. `en_US`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the currency symbol and returns the updated convention.
    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    /// Converts a currency-formatted price into a number.
    ///
    /// Surrounding whitespace and the currency symbol are removed from both ends,
    /// every grouping separator is deleted and the decimal separator is mapped to
    /// `.` before the text is parsed. Grouping positions are not validated.
    /// Negative and non-finite values are rejected.
    pub fn parse_price(&self, text: &str) -> Result<f64, PriceParseError> {
        let mut trimmed = text.trim();
        if !self.currency_symbol.is_empty() {
            while let Some(rest) = trimmed.strip_prefix(self.currency_symbol.as_str()) {
                trimmed = rest;
            }
            while let Some(rest) = trimmed.strip_suffix(self.currency_symbol.as_str()) {
                trimmed = rest;
            }
        }
        let trimmed = trimmed.trim();

        if trimmed.is_empty() {
            return Err(PriceParseError::new(text, "no digits"));
        }

        let normalized: String = trimmed
            .chars()
            .filter(|ch| !self.grouping_separators.contains(ch))
            .map(|ch| if ch == self.decimal_separator { '.' } else { ch })
            .collect();

        let value: f64 = normalized.parse().map_err(|_| {
            PriceParseError::new(text, format!("not a number under the {} convention", self.name))
        })?;

        if !value.is_finite() {
            Err(PriceParseError::new(text, "value is not finite"))
        } else if value < 0.0 {
            Err(PriceParseError::new(text, "price is negative"))
        } else {
            Ok(value)
        }
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::en_us()
    }
}

impl fmt::Display for NumberFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for NumberFormat {
    type Err = UnknownLocale;

    /// Accepts `en_US`, `de_DE`, `fr_FR`, `C` and `POSIX`, optionally followed by
    /// an encoding suffix such as `.UTF-8`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let base = value.split('.').next().unwrap_or_default();
        match base.replace('-', "_").as_str() {
            "en_US" => Ok(Self::en_us()),
            "de_DE" => Ok(Self::de_de()),
            "fr_FR" => Ok(Self::fr_fr()),
            "C" | "POSIX" => Ok(Self::posix()),
            _ => Err(UnknownLocale(value.to_string())),
        }
    }
}

/// A price string that could not be read under the configured convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceParseError {
    input: String,
    reason: String,
}

impl PriceParseError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// The price text as it appeared in the input.
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl fmt::Display for PriceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse price {:?}: {}", self.input, self.reason)
    }
}

impl std::error::Error for PriceParseError {}

/// Locale name with no known number convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownLocale(pub String);

impl fmt::Display for UnknownLocale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported locale {:?}; expected one of en_US, de_DE, fr_FR, C",
            self.0
        )
    }
}

impl std::error::Error for UnknownLocale {}
