//! Game tuning loaded from a RON file, with compiled-in defaults.
//!
//! The config file is optional: a missing file falls back to
//! [`GameConfig::default`], but a file that exists and fails to parse or
//! validate is a startup error. All gameplay systems read tuning through the
//! [`GameConfig`] resource rather than scattered constants.

use std::fs;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::side::SpawnRegion;
use crate::plugins::enemies::EnemyKind;
use crate::plugins::pool::{PoolSpec, PoolTag};

pub const DEFAULT_CONFIG_PATH: &str = "sky_squadron.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Playfield limits, in world units centered on the origin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Bounds {
    pub fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(self.x_min, self.x_max)
    }

    pub fn clamp_y(&self, y: f32) -> f32 {
        y.clamp(self.y_min, self.y_max)
    }

    pub fn contains(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= self.x_min - margin
            && pos.x <= self.x_max + margin
            && pos.y >= self.y_min - margin
            && pos.y <= self.y_max + margin
    }

    fn is_valid(&self) -> bool {
        self.x_min < self.x_max && self.y_min < self.y_max
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WinRules {
    /// Score at which the match is won.
    pub score: i32,
    /// Survival time, in seconds, at which the match is won.
    pub time_secs: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub lives: i32,
    pub speed: f32,
    pub fire_cooldown: f32,
    pub shot_speed: f32,
    pub shot_damage: i32,
    pub respawn_wait: f32,
    pub start_x: f32,
    pub start_y: f32,
}

impl PlayerConfig {
    pub fn start(&self) -> Vec2 {
        Vec2::new(self.start_x, self.start_y)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnemyStats {
    pub health: i32,
    pub speed_x: f32,
    pub speed_y: f32,
    pub fire_cooldown: f32,
    pub max_shots: u32,
    pub score_value: i32,
    pub shot_damage: i32,
}

impl EnemyStats {
    pub fn speed(&self) -> Vec2 {
        Vec2::new(self.speed_x, self.speed_y)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnemyRoster {
    pub column: EnemyStats,
    pub side: EnemyStats,
    /// Seconds after activation before a column enemy reverses its descent.
    pub column_flip_after: f32,
    /// Downward speed of side enemy shots.
    pub side_shot_speed: f32,
}

impl EnemyRoster {
    pub fn stats(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Column => &self.column,
            EnemyKind::Side => &self.side,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WaveConfig {
    pub kind: EnemyKind,
    pub left_region: SpawnRegion,
    pub right_region: SpawnRegion,
    /// Delay before the first spawn of the first cycle.
    pub first_wait: f32,
    /// Spawns on the majority side per cycle. The minority side gets one.
    pub wave_count: u32,
    pub spawn_wait: f32,
    pub wave_wait: f32,
    /// Majority side for the first cycle. Flips every cycle after.
    pub left_majority: bool,
}

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub rng_seed: u64,
    pub bounds: Bounds,
    pub win: WinRules,
    pub player: PlayerConfig,
    pub enemies: EnemyRoster,
    pub pools: Vec<PoolSpec>,
    pub waves: Vec<WaveConfig>,
    pub shot_lifetime: f32,
    pub explosion_lifetime: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rng_seed: 7,
            bounds: Bounds {
                x_min: -600.0,
                x_max: 600.0,
                y_min: -340.0,
                y_max: 340.0,
            },
            win: WinRules {
                score: 100,
                time_secs: 120.0,
            },
            player: PlayerConfig {
                lives: 3,
                speed: 420.0,
                fire_cooldown: 0.25,
                shot_speed: 700.0,
                shot_damage: 1,
                respawn_wait: 2.0,
                start_x: 0.0,
                start_y: -280.0,
            },
            enemies: EnemyRoster {
                column: EnemyStats {
                    health: 1,
                    speed_x: 60.0,
                    speed_y: -160.0,
                    fire_cooldown: 1.2,
                    max_shots: 3,
                    score_value: 10,
                    shot_damage: 1,
                },
                side: EnemyStats {
                    health: 2,
                    speed_x: 140.0,
                    speed_y: -40.0,
                    fire_cooldown: 1.6,
                    max_shots: 2,
                    score_value: 20,
                    shot_damage: 1,
                },
                column_flip_after: 2.5,
                side_shot_speed: 260.0,
            },
            pools: vec![
                PoolSpec { tag: PoolTag::ColumnEnemy, initial: 10, expand: true },
                PoolSpec { tag: PoolTag::SideEnemy, initial: 6, expand: true },
                PoolSpec { tag: PoolTag::PlayerShot, initial: 12, expand: true },
                PoolSpec { tag: PoolTag::EnemyShot, initial: 10, expand: true },
                PoolSpec { tag: PoolTag::Explosion, initial: 8, expand: true },
            ],
            waves: vec![
                WaveConfig {
                    kind: EnemyKind::Side,
                    left_region: SpawnRegion {
                        x_min: -560.0,
                        x_max: -480.0,
                        y_min: 120.0,
                        y_max: 300.0,
                    },
                    right_region: SpawnRegion {
                        x_min: 480.0,
                        x_max: 560.0,
                        y_min: 120.0,
                        y_max: 300.0,
                    },
                    first_wait: 2.0,
                    wave_count: 2,
                    spawn_wait: 1.4,
                    wave_wait: 4.0,
                    left_majority: true,
                },
                WaveConfig {
                    kind: EnemyKind::Column,
                    left_region: SpawnRegion {
                        x_min: -420.0,
                        x_max: -120.0,
                        y_min: 310.0,
                        y_max: 330.0,
                    },
                    right_region: SpawnRegion {
                        x_min: 120.0,
                        x_max: 420.0,
                        y_min: 310.0,
                        y_max: 330.0,
                    },
                    first_wait: 4.0,
                    wave_count: 3,
                    spawn_wait: 0.9,
                    wave_wait: 5.0,
                    left_majority: true,
                },
            ],
            shot_lifetime: 2.5,
            explosion_lifetime: 0.6,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !self.bounds.is_valid() {
            return invalid("bounds must have min < max on both axes".into());
        }
        if self.player.lives <= 0 {
            return invalid("player lives must be positive".into());
        }
        if self.player.fire_cooldown <= 0.0 {
            return invalid("player fire_cooldown must be positive".into());
        }
        if self.win.score <= 0 || self.win.time_secs <= 0.0 {
            return invalid("win thresholds must be positive".into());
        }
        if self.shot_lifetime <= 0.0 || self.explosion_lifetime <= 0.0 {
            return invalid("pooled lifetimes must be positive".into());
        }
        for stats in [&self.enemies.column, &self.enemies.side] {
            if stats.health <= 0 {
                return invalid("enemy health must be positive".into());
            }
            if stats.fire_cooldown <= 0.0 {
                return invalid("enemy fire_cooldown must be positive".into());
            }
        }

        let mut seen_tags = Vec::new();
        for spec in &self.pools {
            if spec.initial == 0 {
                return invalid(format!("pool {:?} must preallocate at least one slot", spec.tag));
            }
            if seen_tags.contains(&spec.tag) {
                return invalid(format!("duplicate pool spec for {:?}", spec.tag));
            }
            seen_tags.push(spec.tag);
        }

        for (i, wave) in self.waves.iter().enumerate() {
            if wave.wave_count == 0 {
                return invalid(format!("wave {i}: wave_count must be at least 1"));
            }
            if wave.first_wait < 0.0 {
                return invalid(format!("wave {i}: first_wait must not be negative"));
            }
            if wave.spawn_wait <= 0.0 || wave.wave_wait <= 0.0 {
                return invalid(format!("wave {i}: spawn_wait and wave_wait must be positive"));
            }
            if !wave.left_region.is_valid() || !wave.right_region.is_valid() {
                return invalid(format!("wave {i}: spawn regions must have min <= max"));
            }
            if !seen_tags.contains(&wave.kind.pool_tag()) {
                return invalid(format!("wave {i}: no pool spec for {:?}", wave.kind.pool_tag()));
            }
        }

        Ok(())
    }

    /// Load from `path` if it exists, else fall back to defaults. A present
    /// but malformed file is an error, not a fallback.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let text = fs::read_to_string(path)?;
            ron::from_str(&text)?
        } else {
            debug!("no config at {}, using defaults", path.display());
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }
}
