//! Cross-crate scenarios.

#[cfg(test)]
mod fixtures;

mod delivery;
mod liveness;
mod recovery;
