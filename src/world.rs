use std::fmt;

use rand::SeedableRng as _;
use rand_chacha::ChaCha8Rng;

use crate::{
    config::Config,
    physics::{Bus, Engine, Gear},
    route::{self, Person, Stop},
    scene::Scenery,
    terrain::Heightmap,
};

const THROTTLE_STEP: f32 = 0.1;

/// Player input, applied to the world as soon as it arrives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Control {
    ThrottleUp,
    ThrottleDown,
    Gear(Gear),
    Brake(bool),
}

/// End of run summary. Lower scores are better.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub elapsed: f32,
    pub overdue: f32,
    pub undelivered: usize,
    pub score: u32,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Time taken: {:.1}s", self.elapsed)?;
        writeln!(f, "Overdue: {:.1}s", self.overdue)?;
        writeln!(f, "Undelivered passengers: {}", self.undelivered)?;
        write!(f, "Score: {}", self.score)
    }
}

/// Dashboard readout.
#[derive(Clone, Debug, PartialEq)]
pub struct Instruments {
    pub speed: i32,
    pub revs: i32,
    pub gear: Gear,
    pub throttle: f32,
    pub next_stop: usize,
    /// Seconds until the next stop is due, negative once late.
    pub due_in: i32,
    pub aboard: usize,
    pub delivered: usize,
}

impl fmt::Display for Instruments {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Speed {} | Revs {} | Gear {} | Throttle {:.0}% | Stop {} due in {}s | Aboard {} | Delivered {}",
            self.speed,
            self.revs,
            self.gear.label(),
            self.throttle * 100.0,
            self.next_stop,
            self.due_in,
            self.aboard,
            self.delivered,
        )
    }
}

pub struct World {
    pub heightmap: Heightmap,
    pub bus: Bus,
    pub engine: Engine,
    pub stops: Vec<Stop>,
    pub people: Vec<Person>,
    pub scenery: Vec<Scenery>,
    pub brake: f32,
    /// Simulated seconds since the start of the run.
    pub elapsed: f32,
    tick_seconds: f32,
    rng: ChaCha8Rng,
}

impl World {
    pub fn new(config: &Config) -> Self {
        let rng = match config.seed {
            Some(seed) => {
                log::info!("Using seed {}", seed);
                ChaCha8Rng::seed_from_u64(seed)
            }
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: &Config, mut rng: ChaCha8Rng) -> Self {
        let heightmap =
            Heightmap::generate(config.terrain.length, config.terrain.resolution, &mut rng);
        let stops = route::generate_stops(&config.route, heightmap.span());
        let people = route::generate_people(&config.route, &stops, &mut rng);
        let scenery = Scenery::scatter(&config.scenery, &mut rng);
        let mut world = Self::from_parts(config, heightmap, stops, people, rng);
        world.scenery = scenery;
        world
    }

    /// Builds a world around a prepared map and route. The bus starts
    /// parked at the first stop.
    pub fn from_parts(
        config: &Config,
        heightmap: Heightmap,
        stops: Vec<Stop>,
        people: Vec<Person>,
        rng: ChaCha8Rng,
    ) -> Self {
        let start = stops.first().map_or(0.0, |stop| stop.pos);
        let mut bus = Bus::new(&config.bus, start);
        bus.settle(&heightmap);
        Self {
            heightmap,
            bus,
            engine: Engine::new(&config.engine),
            stops,
            people,
            scenery: Vec::new(),
            brake: 0.0,
            elapsed: 0.0,
            tick_seconds: config.tick_seconds(),
            rng,
        }
    }

    pub fn apply(&mut self, control: Control) {
        match control {
            // the held brake pins the throttle closed
            Control::ThrottleUp | Control::ThrottleDown if self.brake > 0.0 => {}
            Control::ThrottleUp => {
                self.engine.set_throttle(self.engine.throttle + THROTTLE_STEP);
            }
            Control::ThrottleDown => {
                self.engine.set_throttle(self.engine.throttle - THROTTLE_STEP);
            }
            Control::Gear(gear) => self.engine.set_gear(gear),
            Control::Brake(true) => {
                self.brake = 1.0;
                self.engine.throttle = 0.0;
                self.engine.clutch = 0.0;
            }
            Control::Brake(false) => {
                self.brake = 0.0;
                self.engine.clutch = 1.0;
            }
        }
    }

    /// Advances the simulation by one tick. Returns the final report once
    /// the bus stands at the last stop.
    pub fn tick(&mut self) -> Option<Report> {
        profiling::scope!("tick");
        self.bus.settle(&self.heightmap);
        self.bus.step(&mut self.engine, self.brake);

        let mut finished = false;
        if self.bus.is_stopped() {
            route::board(&mut self.bus, &self.people, &mut self.rng);
            route::alight(&mut self.bus, &mut self.people);
            route::arrive(&mut self.stops, self.bus.pos, self.elapsed);
            finished = !self.stops.is_empty() && self.current_stop() + 1 == self.stops.len();
        }
        route::carry(&self.bus, &mut self.people);
        self.elapsed += self.tick_seconds;

        if finished {
            let report = self.report();
            log::info!("Reached the last stop, score {}", report.score);
            Some(report)
        } else {
            None
        }
    }

    pub fn current_stop(&self) -> usize {
        route::current_stop(&self.stops, self.bus.pos)
    }

    pub fn next_stop(&self) -> usize {
        route::next_stop(&self.stops, self.current_stop())
    }

    pub fn report(&self) -> Report {
        let overdue = route::overdue(&self.stops);
        let undelivered = route::undelivered(&self.people);
        Report {
            elapsed: self.elapsed,
            overdue,
            undelivered,
            score: route::score(overdue, undelivered),
        }
    }

    pub fn instruments(&self) -> Instruments {
        let next_stop = self.next_stop();
        let due_in = self
            .stops
            .get(next_stop)
            .map_or(0.0, |stop| stop.scheduled - self.elapsed);
        Instruments {
            speed: self.bus.speed.round() as i32,
            revs: self.engine.revs.round() as i32,
            gear: self.engine.gear,
            throttle: self.engine.throttle,
            next_stop,
            due_in: due_in.round() as i32,
            aboard: self.bus.people.len(),
            delivered: self.people.len() - route::undelivered(&self.people),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Seeded world on level ground, so a parked bus stays put.
    fn world() -> World {
        let config = Config {
            seed: Some(9),
            ..Default::default()
        };
        let mut world = World::new(&config);
        world.heightmap = Heightmap::flat(config.terrain.length, config.terrain.resolution);
        world.bus.settle(&world.heightmap);
        world
    }

    #[test]
    fn generated_world_is_consistent() {
        let world = world();
        let config = Config::default();
        assert_eq!(world.heightmap.len(), config.terrain.length);
        assert_eq!(world.stops.len(), config.route.stop_count);
        assert!(config.route.people.contains(&world.people.len()));
        assert!(config.scenery.count.contains(&world.scenery.len()));
        assert_eq!(world.bus.pos, world.stops[0].pos);
        assert_eq!(world.current_stop(), 0);
        assert_eq!(world.next_stop(), 1);
    }

    #[test]
    fn seeded_worlds_match() {
        let (a, b) = (world(), world());
        assert_eq!(a.people, b.people);
        assert_eq!(a.scenery, b.scenery);
    }

    #[test]
    fn brake_disengages_the_clutch() {
        let mut world = world();
        world.apply(Control::ThrottleUp);
        world.apply(Control::ThrottleUp);
        assert!((world.engine.throttle - 0.2).abs() < 1e-6);
        world.apply(Control::Brake(true));
        assert_eq!((world.brake, world.engine.throttle, world.engine.clutch), (1.0, 0.0, 0.0));
        world.apply(Control::Brake(false));
        assert_eq!((world.brake, world.engine.clutch), (0.0, 1.0));
        assert_eq!(world.engine.throttle, 0.0);
    }

    #[test]
    fn held_brake_keeps_the_throttle_closed() {
        let mut world = world();
        world.apply(Control::Brake(true));
        world.apply(Control::ThrottleUp);
        assert_eq!(world.engine.throttle, 0.0);
        world.tick();
        assert_eq!(world.engine.revs, 0.0);
        world.apply(Control::Brake(false));
        world.apply(Control::ThrottleUp);
        assert!((world.engine.throttle - 0.1).abs() < 1e-6);
    }

    #[test]
    fn throttle_is_clamped() {
        let mut world = world();
        for _ in 0..15 {
            world.apply(Control::ThrottleUp);
        }
        assert_eq!(world.engine.throttle, 1.0);
        for _ in 0..15 {
            world.apply(Control::ThrottleDown);
        }
        assert_eq!(world.engine.throttle, 0.0);
    }

    #[test]
    fn first_stop_is_reached_on_time() {
        let mut world = world();
        assert!(world.tick().is_none());
        assert_eq!(world.stops[0].arrival, Some(0.0));
        assert!(world.elapsed > 0.0);
    }

    #[test]
    fn instruments_count_down() {
        let mut world = world();
        let before = world.instruments();
        assert_eq!(before.due_in, 20);
        for _ in 0..60 {
            world.tick();
        }
        let after = world.instruments();
        assert_eq!(after.due_in, 18);
        assert_eq!(after.gear, Gear::Neutral);
        assert!(after.to_string().contains("Gear N"));
    }
}
