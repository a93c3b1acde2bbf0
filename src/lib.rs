pub mod communication;
pub mod control_system;
pub mod global_variables;
pub mod simulation_engine;
