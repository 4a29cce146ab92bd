use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Reporting currency; amounts are converted from USD by a fixed factor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Currency {
    #[default]
    Usd,
    Bdt,
}

impl Currency {
    /// Units of this currency per US dollar.
    pub fn rate(&self) -> f64 {
        match self {
            Currency::Usd => 1.0,
            Currency::Bdt => 110.0,
        }
    }

    pub fn from_usd(&self, amount: f64) -> f64 {
        amount * self.rate()
    }
}
