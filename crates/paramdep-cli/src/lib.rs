//! Library half of the `paramdep` command: logging setup and report building.

pub mod logging;
pub mod report;
