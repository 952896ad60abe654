//! Shared helpers for the integration and end-to-end tests
#![allow(dead_code)]

pub mod images;
pub mod mocks;
