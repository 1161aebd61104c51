#![forbid(unsafe_code)]

//! CADRA — Complex Active Directory Risk Assessment.
//!
//! Scores one AD principal two ways over a BloodHound-style property graph:
//! an ADASS severity score derived from its own attributes, and a
//! qualitative likelihood×impact permission risk derived from its outbound
//! paths. See [`driver::assess`] for the single entry point that ties the
//! whole pipeline together.

pub mod core;
pub mod driver;
pub mod engine;
pub mod graph;
pub mod logger;
pub mod model;
pub mod prelude;
pub mod report;
