//! Window scheduling core for a university project-lifecycle portal.
//!
//! `models` defines the window domain types, `workflow` fixes the stage
//! ordering, and `rules` holds the pure validators (overlap, sequence,
//! open-window queries) that gate coordinator actions. `db` and `report`
//! wrap the rules for the Postgres-backed CLI.

pub mod db;
pub mod models;
pub mod report;
pub mod rules;
pub mod workflow;
