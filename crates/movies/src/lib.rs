//! Sample movie catalogue mapped with `fieldmap-core`.
//!
//! Two shapes of the same domain:
//! - [`simple`]: a flat movie whose rule table is declared in TOML and
//!   round-trips in both directions.
//! - [`detailed`]: a movie with a nested director, soundtrack and awards,
//!   flattened into a mostly-string DTO with formatted dates and numbers,
//!   defaults, ignored fields and a delegated award mapper.

pub mod detailed;
pub mod simple;
