//! Test doubles for the store traits

pub mod mocks;

pub use mocks::{
    MockDestinationStats, MockDestinationStore, MockGeometrySource, MockSourceStore,
};
