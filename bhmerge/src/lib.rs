//! Black-hole merger extraction for the FLARES zoom regions.
//!
//! Per region: merger lines from the `blackhole_details` logs are parsed
//! ([`logs`]), snapped onto the snapshot grid ([`bucketing`]), and for every
//! snapshot with mergers the black-hole entries of the subfind particle
//! catalogs are gathered ([`catalog`]) so they can be matched to host halos.
//! [`pipeline`] drives the stages and writes through an [`store::ArrayStore`].

pub mod bucketing;
pub mod catalog;
pub mod config;
pub mod layout;
pub mod logs;
pub mod pipeline;
pub mod store;
