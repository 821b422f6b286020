//! Combat bookkeeping components shared by the player and pooled enemies.

use std::time::Duration;

use bevy::prelude::*;

/// Hit points with the value stamped at activation.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Health {
    pub hp: i32,
    pub initial: i32,
}

impl Health {
    pub fn full(initial: i32) -> Self {
        Self { hp: initial, initial }
    }

    pub fn damage(&mut self, amount: i32) {
        self.hp -= amount;
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }
}

/// Cooldown gate between shots.
#[derive(Component, Debug)]
pub struct FireControl {
    timer: Timer,
}

impl FireControl {
    /// Starts cold: the first shot waits a full cooldown.
    pub fn new(cooldown: f32) -> Self {
        Self {
            timer: Timer::from_seconds(cooldown, TimerMode::Once),
        }
    }

    /// Starts hot: the first shot is available immediately.
    pub fn ready_now(cooldown: f32) -> Self {
        let mut control = Self::new(cooldown);
        control.timer.tick(Duration::from_secs_f32(cooldown));
        control
    }

    pub fn tick(&mut self, delta: Duration) {
        self.timer.tick(delta);
    }

    pub fn is_ready(&self) -> bool {
        self.timer.is_finished()
    }

    pub fn restart(&mut self) {
        self.timer.reset();
    }
}

/// Caps how many shots an enemy fires during one activation.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShotBudget {
    fired: u32,
    max: u32,
}

impl ShotBudget {
    pub fn new(max: u32) -> Self {
        Self { fired: 0, max }
    }

    pub fn try_spend(&mut self) -> bool {
        if self.fired < self.max {
            self.fired += 1;
            true
        } else {
            false
        }
    }

    pub fn remaining(&self) -> u32 {
        self.max - self.fired
    }
}
