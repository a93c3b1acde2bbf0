use serde::{Deserialize, Serialize};

use crate::simulation_engine::directions::{Direction, ParseDirectionError};
use crate::simulation_engine::lights::LightColor;
use crate::simulation_engine::vehicles::{
    ParseVehicleKindError, Vehicle, VehicleError, VehicleKind,
};

/// One direction's view at the end of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionSnapshot {
    pub direction: Direction,
    pub light: LightColor,
    pub vehicles: Vec<Vehicle>,
}

/// A vehicle that left the intersection during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crossing {
    pub direction: Direction,
    pub vehicle: Vehicle,
}

/// Full per-tick state published by the coordinator. Only the direction
/// records travel on the wire; crossings are for in-process observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    pub directions: Vec<DirectionSnapshot>,
    pub crossings: Vec<Crossing>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("malformed snapshot record: {0:?}")]
    MalformedRecord(String),
    #[error("unknown light digit {0:?}")]
    UnknownLightDigit(String),
    #[error(transparent)]
    Direction(#[from] ParseDirectionError),
    #[error(transparent)]
    VehicleKind(#[from] ParseVehicleKindError),
    #[error(transparent)]
    Vehicle(#[from] VehicleError),
}

/// Encodes one direction record:
/// `direction : <dir>; light : <0|1>; vehicles : [<repr>, ...].\n`.
pub fn encode_direction_record(snapshot: &DirectionSnapshot) -> String {
    let vehicles = snapshot
        .vehicles
        .iter()
        .map(Vehicle::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "direction : {}; light : {}; vehicles : [{}].\n",
        snapshot.direction,
        snapshot.light.wire_digit(),
        vehicles
    )
}

/// Encodes a full snapshot as one record per direction.
pub fn encode_snapshot(snapshot: &Snapshot) -> String {
    snapshot
        .directions
        .iter()
        .map(encode_direction_record)
        .collect()
}

/// Decodes one direction record produced by [`encode_direction_record`].
pub fn decode_direction_record(record: &str) -> Result<DirectionSnapshot, WireError> {
    let malformed = || WireError::MalformedRecord(record.to_string());

    let body = record.trim_end_matches('\n');
    let rest = body.strip_prefix("direction : ").ok_or_else(malformed)?;
    let (direction, rest) = rest.split_once("; light : ").ok_or_else(malformed)?;
    let (light, rest) = rest.split_once("; vehicles : [").ok_or_else(malformed)?;
    let inner = rest.strip_suffix("].").ok_or_else(malformed)?;

    let direction: Direction = direction.parse()?;
    let light = match light {
        "0" => LightColor::Red,
        "1" => LightColor::Green,
        other => return Err(WireError::UnknownLightDigit(other.to_string())),
    };

    let mut vehicles = Vec::new();
    if !inner.is_empty() {
        // Vehicle reprs end with a newline, so the list separator shows
        // up as "\n, " between entries.
        for chunk in inner.split("\n, ") {
            vehicles.push(decode_vehicle(chunk)?);
        }
    }

    Ok(DirectionSnapshot {
        direction,
        light,
        vehicles,
    })
}

/// Decodes the three-line vehicle repr
/// `type: <kind>\nsource: <dir>\ndestination: <dir>`.
pub fn decode_vehicle(text: &str) -> Result<Vehicle, WireError> {
    let mut lines = text.lines();
    let kind: VehicleKind = wire_field(&mut lines, "type", text)?.parse()?;
    let source: Direction = wire_field(&mut lines, "source", text)?.parse()?;
    let destination: Direction = wire_field(&mut lines, "destination", text)?.parse()?;
    Ok(Vehicle::new(kind, source, destination)?)
}

fn wire_field<'a>(
    lines: &mut std::str::Lines<'a>,
    key: &str,
    whole: &str,
) -> Result<&'a str, WireError> {
    lines
        .next()
        .and_then(|line| line.strip_prefix(key))
        .and_then(|rest| rest.strip_prefix(": "))
        .ok_or_else(|| WireError::MalformedRecord(whole.to_string()))
}
