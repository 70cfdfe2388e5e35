use std::collections::HashMap;

use crate::{config, terrain::Heightmap};

/// Rev gain per tick at full throttle.
const THROTTLE_REVS: f32 = 100.0;
/// Fraction of revs kept each tick, internal engine friction.
const REV_DAMPING: f32 = 0.98;
/// Converts drivetrain force into lost revs.
const FORCE_REV_COST: f32 = 200.0;
const TORQUE_SCALE: f32 = 10.0;
const GRAVITY: f32 = 5.0;
const ROLLING_FRICTION: f32 = 500.0;
const BRAKE_FRICTION: f32 = 1000.0;
const STATIC_FRICTION: f32 = 0.005;
const STATIC_BRAKE: f32 = 0.05;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Gear {
    #[default]
    Neutral,
    Reverse,
    First,
    Second,
    Third,
}

impl Gear {
    pub fn ratio(self) -> f32 {
        match self {
            Self::Neutral => 0.0,
            Self::Reverse => -0.001,
            Self::First => 0.001,
            Self::Second => 0.005,
            Self::Third => 0.01,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Neutral => "N",
            Self::Reverse => "R",
            Self::First => "1",
            Self::Second => "2",
            Self::Third => "3",
        }
    }
}

pub struct Engine {
    pub revs: f32,
    pub max_revs: f32,
    pub throttle: f32,
    pub clutch: f32,
    pub gear: Gear,
}

impl Engine {
    pub fn new(config: &config::Engine) -> Self {
        Self {
            revs: 0.0,
            max_revs: config.max_revs,
            throttle: 0.0,
            clutch: 1.0,
            gear: Gear::Neutral,
        }
    }

    pub fn set_throttle(&mut self, throttle: f32) {
        self.throttle = throttle.clamp(0.0, 1.0);
    }

    pub fn set_gear(&mut self, gear: Gear) {
        if gear != self.gear {
            log::debug!("Gear {} -> {}", self.gear.label(), gear.label());
            self.gear = gear;
        }
    }

    /// Load on the engine when it drives the wheels at `speed`; positive
    /// pushes the bus forward. Revs are adjusted for the load and throttle.
    pub fn drive(&mut self, speed: f32) -> f32 {
        let ratio = self.gear.ratio();
        let engine_speed = self.revs * ratio * self.clutch;
        let speed_delta = engine_speed - speed;
        let torque = if ratio != 0.0 {
            (1.0 / ratio * self.clutch * TORQUE_SCALE).abs()
        } else {
            0.0
        };
        let force = speed_delta * torque;

        self.revs -= force.abs() / FORCE_REV_COST;
        self.revs += self.throttle * THROTTLE_REVS;
        self.revs *= REV_DAMPING;
        self.revs = self.revs.clamp(0.0, self.max_revs);
        force
    }

    /// Engine sound volume, `[0, 1]`.
    pub fn volume(&self) -> f32 {
        if self.max_revs > 0.0 {
            (self.revs / self.max_revs).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

pub struct Bus {
    pub pos: f32,
    pub speed: f32,
    pub angle: f32,
    pub altitude: i32,
    pub mass: f32,
    pub body_size: [f32; 2],
    /// Wheel x relative to the body centre, back then front.
    pub wheels: [f32; 2],
    pub wheel_radius: f32,
    pub seats: Vec<f32>,
    /// Seat offset of every passenger aboard, by person index.
    pub people: HashMap<usize, f32>,
}

impl Bus {
    pub fn new(config: &config::Bus, pos: f32) -> Self {
        let half_width = 0.5 * config.body_size[0];
        Self {
            pos,
            speed: 0.0,
            angle: 0.0,
            altitude: 0,
            mass: config.mass,
            body_size: config.body_size,
            wheels: [
                config.back_wheel - half_width,
                config.front_wheel - half_width,
            ],
            wheel_radius: config.wheel_radius,
            seats: config.seats.clone(),
            people: HashMap::new(),
        }
    }

    pub fn wheelbase(&self) -> f32 {
        self.wheels[1] - self.wheels[0]
    }

    pub fn is_stopped(&self) -> bool {
        self.speed == 0.0
    }

    /// Rests the body on the terrain under both wheels. The wheel positions
    /// are taken level with the body, not re-projected for the tilt.
    pub fn settle(&mut self, heightmap: &Heightmap) {
        let back = heightmap.sample(self.pos + self.wheels[0]) as f32;
        let front = heightmap.sample(self.pos + self.wheels[1]) as f32;
        let wheelbase = self.wheelbase();
        self.angle = if wheelbase > 0.0 {
            ((front - back) / wheelbase).clamp(-1.0, 1.0).asin()
        } else {
            0.0
        };
        self.altitude = (0.5 * (front + back)).floor() as i32;
    }

    /// Advances one tick under the engine's drive and the brake.
    pub fn step(&mut self, engine: &mut Engine, brake: f32) {
        let force = engine.drive(self.speed);

        let mut accel = -self.angle.clamp(-1.0, 1.0).asin() * GRAVITY;
        accel += force / self.mass;
        accel -= self.speed * ROLLING_FRICTION / self.mass;
        accel -= BRAKE_FRICTION * brake * self.speed / self.mass;
        self.speed += accel;

        if self.speed != 0.0 {
            let static_brake = (STATIC_BRAKE * brake + STATIC_FRICTION) / self.speed;
            if static_brake.abs() > self.speed.abs() {
                self.speed = 0.0;
            } else {
                self.speed -= static_brake;
            }
        }

        self.pos += self.speed;
    }

    pub fn free_seats(&self) -> Vec<f32> {
        self.seats
            .iter()
            .copied()
            .filter(|seat| !self.people.values().any(|taken| taken == seat))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus() -> Bus {
        Bus::new(&config::Bus::default(), 500.0)
    }

    fn engine() -> Engine {
        Engine::new(&config::Engine::default())
    }

    #[test]
    fn coasting_in_neutral_stops_without_overshoot() {
        let mut bus = bus();
        let mut engine = engine();
        bus.speed = 12.0;
        let mut last = bus.speed;
        let mut stopped_at = None;
        for tick in 0..2000 {
            bus.step(&mut engine, 0.0);
            assert!(bus.speed >= 0.0);
            assert!(bus.speed <= last);
            if bus.speed == 0.0 && stopped_at.is_none() {
                stopped_at = Some(tick);
            }
            if stopped_at.is_some() {
                assert_eq!(bus.speed, 0.0);
            }
            last = bus.speed;
        }
        assert!(stopped_at.is_some());
        assert_eq!(engine.revs, 0.0);
    }

    #[test]
    fn braking_stops_sooner() {
        let ticks_to_stop = |brake: f32| {
            let mut bus = bus();
            let mut engine = engine();
            bus.speed = 12.0;
            (0..5000)
                .position(|_| {
                    bus.step(&mut engine, brake);
                    bus.is_stopped()
                })
                .unwrap()
        };
        assert!(ticks_to_stop(1.0) < ticks_to_stop(0.0));
    }

    #[test]
    fn throttle_raises_steady_revs() {
        let steady_revs = |throttle: f32| {
            let mut bus = bus();
            let mut engine = engine();
            engine.set_gear(Gear::First);
            engine.set_throttle(throttle);
            for _ in 0..3000 {
                bus.step(&mut engine, 0.0);
            }
            engine.revs
        };
        let revs = [0.2, 0.4, 0.6, 0.8, 1.0].map(steady_revs);
        for pair in revs.windows(2) {
            assert!(pair[1] > pair[0], "{:?}", revs);
        }
        assert!(revs[4] <= engine().max_revs);
    }

    #[test]
    fn gears_drive_in_their_direction() {
        for (gear, forward) in [(Gear::First, true), (Gear::Third, true), (Gear::Reverse, false)] {
            let mut bus = bus();
            let mut engine = engine();
            engine.set_gear(gear);
            engine.set_throttle(1.0);
            for _ in 0..300 {
                bus.step(&mut engine, 0.0);
            }
            assert_eq!(bus.pos > 500.0, forward, "{:?}", gear);
        }
    }

    #[test]
    fn neutral_has_no_torque() {
        let mut engine = engine();
        engine.revs = 3000.0;
        assert_eq!(engine.drive(5.0), 0.0);
        assert!(engine.revs < 3000.0);
    }

    #[test]
    fn revs_are_capped() {
        let mut engine = engine();
        engine.max_revs = 1000.0;
        engine.set_throttle(1.0);
        for _ in 0..500 {
            engine.drive(0.0);
        }
        assert_eq!(engine.revs, 1000.0);
        assert_eq!(engine.volume(), 1.0);
    }

    #[test]
    fn settles_on_slope() {
        let heightmap = Heightmap::from_samples((0..400).collect(), 1);
        let mut bus = bus();
        bus.pos = 200.0;
        bus.settle(&heightmap);
        // one unit of rise per unit of run under the wheels
        assert!((bus.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-3);
        assert_eq!(bus.altitude, 200);

        let flat = Heightmap::flat(400, 5);
        bus.settle(&flat);
        assert_eq!(bus.angle, 0.0);
        assert_eq!(bus.altitude, 0);
    }

    #[test]
    fn uphill_slows_the_bus() {
        let heightmap = Heightmap::from_samples((0..2000).map(|i| i / 10).collect(), 1);
        let mut climbing = bus();
        climbing.pos = 1000.0;
        climbing.speed = 5.0;
        climbing.settle(&heightmap);
        assert!(climbing.angle > 0.0);
        climbing.step(&mut engine(), 0.0);

        let mut level = bus();
        level.speed = 5.0;
        level.step(&mut engine(), 0.0);
        assert!(climbing.speed < level.speed);
    }
}
