use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use enumset::{EnumSet, EnumSetType};
use serde::Serialize;

/// S2 control types a resource manager may be steered with.
#[derive(Debug, EnumSetType, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlType {
    PowerEnvelopeBasedControl,
    PowerProfileBasedControl,
    OperationModeBasedControl,

    /// FRBC.
    FillRateBasedControl,

    DemandDrivenBasedControl,

    /// Spelled the way the protocol spells it.
    #[serde(rename = "NOT_CONTROLABLE")]
    NotControlable,

    NoSelection,
}

impl ControlType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PowerEnvelopeBasedControl => "POWER_ENVELOPE_BASED_CONTROL",
            Self::PowerProfileBasedControl => "POWER_PROFILE_BASED_CONTROL",
            Self::OperationModeBasedControl => "OPERATION_MODE_BASED_CONTROL",
            Self::FillRateBasedControl => "FILL_RATE_BASED_CONTROL",
            Self::DemandDrivenBasedControl => "DEMAND_DRIVEN_BASED_CONTROL",
            Self::NotControlable => "NOT_CONTROLABLE",
            Self::NoSelection => "NO_SELECTION",
        }
    }
}

impl Display for ControlType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("`{0}` is not a known control type")]
pub struct InvalidControlType(pub String);

impl FromStr for ControlType {
    type Err = InvalidControlType;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        EnumSet::<Self>::all()
            .iter()
            .find(|control_type| control_type.as_str() == name)
            .ok_or_else(|| InvalidControlType(name.to_string()))
    }
}
