// simulation_engine/mod.rs
pub mod clock;
pub mod coordinator;
pub mod directions;
pub mod generator;
pub mod lights;
pub mod vehicles;
