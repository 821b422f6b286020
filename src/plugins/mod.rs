//! Feature plugins.

use bevy::prelude::*;

pub mod collision;
pub mod core;
pub mod effects;
pub mod enemies;
pub mod hud;
pub mod lifecycle;
pub mod physics;
pub mod player;
pub mod pool;
pub mod projectiles;
pub mod waves;

// Render-only
pub mod camera;

/// Register gameplay plugins that work in headless tests.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    physics::plugin(app);
    crate::tasks::plugin(app);
    pool::plugin(app);
    player::plugin(app);
    enemies::plugin(app);
    projectiles::plugin(app);
    effects::plugin(app);
    collision::plugin(app);
    waves::plugin(app);
    hud::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    camera::plugin(app);
}
