use crate::simulation_engine::directions::Direction;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// The possible states for a traffic light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightColor {
    Red,
    Green,
}

impl LightColor {
    pub const fn toggled(self) -> LightColor {
        match self {
            LightColor::Red => LightColor::Green,
            LightColor::Green => LightColor::Red,
        }
    }

    /// Digit used on the snapshot wire: red is `0`, green is `1`.
    pub const fn wire_digit(self) -> char {
        match self {
            LightColor::Red => '0',
            LightColor::Green => '1',
        }
    }
}

/// The current regime of the light controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    Normal,
    Priority(Direction),
}

/// The four light colors, always updated as a whole so readers never
/// observe a half-flipped intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionState {
    colors: [LightColor; 4],
}

impl IntersectionState {
    pub fn all_red() -> Self {
        Self {
            colors: [LightColor::Red; 4],
        }
    }

    /// Entry state of the normal cycle: North/South green, East/West red.
    pub fn normal_entry() -> Self {
        let mut state = Self::all_red();
        state.set_pair(Direction::North, LightColor::Green);
        state
    }

    pub fn color(&self, direction: Direction) -> LightColor {
        self.colors[direction.index()]
    }

    pub fn green_directions(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|d| self.color(*d) == LightColor::Green)
            .collect()
    }

    /// Sets a direction and its opposite to the same color.
    pub fn set_pair(&mut self, direction: Direction, color: LightColor) {
        self.colors[direction.index()] = color;
        self.colors[direction.opposite().index()] = color;
    }

    /// Swaps the green axis in the normal cycle.
    pub fn flip_axes(&mut self) {
        let north_south = self.color(Direction::North).toggled();
        self.set_pair(Direction::North, north_south);
        self.set_pair(Direction::East, north_south.toggled());
    }

    /// Priority regime state: everything red except the given direction.
    pub fn set_priority(&mut self, direction: Direction) {
        self.colors = [LightColor::Red; 4];
        self.colors[direction.index()] = LightColor::Green;
    }
}

/// Single-writer shared light state: the light controller writes, the
/// coordinator and snapshot consumers read.
pub type SharedLights = Arc<Mutex<IntersectionState>>;

pub fn new_shared() -> SharedLights {
    Arc::new(Mutex::new(IntersectionState::normal_entry()))
}
