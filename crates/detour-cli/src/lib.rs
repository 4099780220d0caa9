//! Detour CLI - command line route planning.
//!
//! Binaries:
//! - plan_route: plan one trip against OSRM, TomTom or the offline provider

pub mod feed;
pub mod report;

pub use feed::load_hazards;
pub use report::render_report;
