//! Short Circuit: a route planner for a universe stitched together from
//! permanent stargates and transient wormhole connections.
//!
//! Chain data flows from external map sources (`upstream`) into the
//! connection database, the solar map materializes a routable graph from
//! it, and `navigation` answers restricted shortest-path queries.

pub mod chain;
pub mod config;
pub mod error;
pub mod evedb;
pub mod map;
pub mod navigation;
pub mod upstream;
pub mod util;
pub mod worker;

#[cfg(test)]
pub(crate) mod testkit;

pub const USER_AGENT: &str = concat!(
    "Short Circuit v",
    env!("CARGO_PKG_VERSION"),
    "; +https://github.com/shortcircuit/shortcircuit"
);
