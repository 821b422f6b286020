//! Shared resources every gameplay plugin reads: config, the event bus, the
//! object pool, the seeded spawn RNG and the score store.

use std::path::Path;

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{DEFAULT_CONFIG_PATH, GameConfig};
use crate::events::EventBus;
use crate::persistence::HighScoreStore;
use crate::plugins::pool::ObjectPool;

pub const SCORE_FILE: &str = "sky_squadron_score.ron";

/// Deterministic RNG for spawn placement and cosmetic rolls. Seeded from
/// config so a match replays identically.
#[derive(Resource)]
pub struct SpawnRng(pub ChaCha8Rng);

pub fn plugin(app: &mut App) {
    let config = GameConfig::load_or_default(Path::new(DEFAULT_CONFIG_PATH))
        .expect("invalid game configuration");

    // A pre-inserted store wins; test harnesses point it at a scratch file
    // so runs never write next to the crate.
    if !app.world().contains_resource::<HighScoreStore>() {
        app.insert_resource(HighScoreStore::new(SCORE_FILE));
    }

    app.insert_resource(ClearColor(Color::srgb(0.04, 0.05, 0.12)))
        .insert_resource(SpawnRng(ChaCha8Rng::seed_from_u64(config.rng_seed)))
        .insert_resource(ObjectPool::new(config.pools.clone()))
        .init_resource::<EventBus>()
        .insert_resource(config);
}
