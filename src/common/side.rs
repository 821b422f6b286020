//! Spawn sides and spawn regions.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Which half of the top edge an entity entered from. Side enemies toggle
/// this when they bounce off the playfield edge.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn flipped(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Axis-aligned rectangle enemies are placed inside, uniformly at random.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnRegion {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl SpawnRegion {
    pub fn sample(&self, rng: &mut impl Rng) -> Vec2 {
        Vec2::new(
            rng.gen_range(self.x_min..=self.x_max),
            rng.gen_range(self.y_min..=self.y_max),
        )
    }

    pub fn is_valid(&self) -> bool {
        self.x_min <= self.x_max && self.y_min <= self.y_max
    }
}
