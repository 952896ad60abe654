/// Domain layer for SPDX graph construction and provenance correlation
///
/// Pure business logic: no file system, network or console access.
pub mod domain;
pub mod policies;
pub mod services;
