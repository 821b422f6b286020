//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `sky_squadron::game::configure_headless` to install gameplay plugins.

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use sky_squadron::persistence::HighScoreStore;

pub fn app_headless() -> App {
    let mut app = App::new();

    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));

    // Point the score store at a scratch file so headless runs never write
    // into the crate working directory.
    app.insert_resource(HighScoreStore::new(std::env::temp_dir().join(format!(
        "sky_squadron_headless_{}.ron",
        std::process::id()
    ))));

    sky_squadron::game::configure_headless(&mut app);
    app
}
