use crate::simulation_engine::directions::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Different types of vehicles in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleKind {
    Normal,
    Priority,
}

impl fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            VehicleKind::Normal => "normal",
            VehicleKind::Priority => "priority",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown vehicle type {0:?}")]
pub struct ParseVehicleKindError(pub String);

impl FromStr for VehicleKind {
    type Err = ParseVehicleKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(VehicleKind::Normal),
            "priority" => Ok(VehicleKind::Priority),
            other => Err(ParseVehicleKindError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VehicleError {
    #[error("source and destination must differ (both {0})")]
    SameSourceDestination(Direction),
}

/// A vehicle approaching the intersection. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub kind: VehicleKind,
    pub source: Direction,
    pub destination: Direction,
}

impl Vehicle {
    /// Builds a vehicle, rejecting a destination equal to the source.
    pub fn new(
        kind: VehicleKind,
        source: Direction,
        destination: Direction,
    ) -> Result<Self, VehicleError> {
        if source == destination {
            return Err(VehicleError::SameSourceDestination(source));
        }
        Ok(Self {
            kind,
            source,
            destination,
        })
    }

    pub fn is_priority(&self) -> bool {
        self.kind == VehicleKind::Priority
    }
}

/// The wire representation used in snapshot records:
/// `type: <kind>\nsource: <dir>\ndestination: <dir>\n`.
impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "type: {}\nsource: {}\ndestination: {}\n",
            self.kind, self.source, self.destination
        )
    }
}
