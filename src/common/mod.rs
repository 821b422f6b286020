//! Common, shared types.

pub mod layers;
pub mod side;
pub mod state;

#[cfg(test)]
pub mod test_utils;
