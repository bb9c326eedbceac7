//! Scenario tests crossing module boundaries

mod collision_scenarios;
mod spatial_scenarios;
