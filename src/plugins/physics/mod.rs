//! Physics setup: Avian with gravity off. Everything in this game moves by
//! velocity alone; contacts are sensor events, never dynamic response.

use avian2d::prelude::*;
use bevy::prelude::*;

pub fn plugin(app: &mut App) {
    app.add_plugins(PhysicsPlugins::default())
        .insert_resource(Gravity(Vec2::ZERO));
}
