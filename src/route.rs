//! Stops along the road and the people travelling between them.
//!
//! Everything here happens while the bus stands still: people within
//! [`BOARDING_DISTANCE`] get on or off, and the stop within
//! [`STOP_DISTANCE`] counts as reached.

use rand::{seq::SliceRandom as _, Rng};

use crate::{config, physics::Bus};

pub const BOARDING_DISTANCE: f32 = 100.0;
pub const STOP_DISTANCE: f32 = 200.0;
/// Score penalty for each passenger left undelivered.
pub const UNDELIVERED_PENALTY: u32 = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct Stop {
    pub pos: f32,
    /// Seconds since the start of the run.
    pub scheduled: f32,
    pub arrival: Option<f32>,
}

impl Stop {
    pub fn arrived(&self) -> bool {
        self.arrival.is_some()
    }

    /// Seconds the arrival came after the schedule, zero when on time or
    /// not yet arrived.
    pub fn overdue(&self) -> f32 {
        self.arrival
            .map_or(0.0, |arrival| (arrival - self.scheduled).max(0.0))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Person {
    pub start: f32,
    pub end: f32,
    pub pos: f32,
    pub delivered: bool,
}

impl Person {
    pub fn new(start: f32, end: f32) -> Self {
        Self {
            start,
            end,
            pos: start,
            delivered: false,
        }
    }
}

/// Stops spread evenly over `span`, one every `interval` scheduled seconds.
pub fn generate_stops(config: &config::Route, span: f32) -> Vec<Stop> {
    let count = config.stop_count;
    (0..count)
        .map(|index| Stop {
            pos: span * (index as f32 + 0.5) / count as f32,
            scheduled: index as f32 * config.stop_interval,
            arrival: None,
        })
        .collect()
}

/// Random riders, each going forward from one stop to a later one.
pub fn generate_people(config: &config::Route, stops: &[Stop], rng: &mut impl Rng) -> Vec<Person> {
    if stops.len() < 2 || config.people.is_empty() {
        return Vec::new();
    }
    let count = rng.gen_range(config.people.clone());
    let mut people = Vec::with_capacity(count);
    while people.len() < count {
        let from = rng.gen_range(0..stops.len());
        let to = rng.gen_range(0..stops.len());
        if from >= to {
            continue;
        }
        people.push(Person::new(stops[from].pos, stops[to].pos));
    }
    log::info!("Generated {} people over {} stops", people.len(), stops.len());
    people
}

/// Moves everyone aboard along with their seat.
pub fn carry(bus: &Bus, people: &mut [Person]) {
    for (&index, &seat) in bus.people.iter() {
        if let Some(person) = people.get_mut(index) {
            person.pos = bus.pos + seat;
        }
    }
}

/// Lets waiting people on. With every seat taken, newcomers share offset 0.
pub fn board(bus: &mut Bus, people: &[Person], rng: &mut impl Rng) {
    for (index, person) in people.iter().enumerate() {
        if person.delivered || bus.people.contains_key(&index) {
            continue;
        }
        if (person.pos - bus.pos).abs() >= BOARDING_DISTANCE
            || (bus.pos - person.end).abs() < BOARDING_DISTANCE
        {
            continue;
        }
        let seat = match bus.free_seats().choose(rng) {
            Some(&seat) => seat,
            None => {
                log::warn!("No free seat for person {}, standing", index);
                0.0
            }
        };
        log::debug!("Person {} boards at {:.0}, seat {}", index, bus.pos, seat);
        bus.people.insert(index, seat);
    }
}

/// Lets people off at their destination. Returns how many got off.
pub fn alight(bus: &mut Bus, people: &mut [Person]) -> usize {
    let arrived = bus
        .people
        .keys()
        .copied()
        .filter(|&index| {
            people
                .get(index)
                .map_or(true, |person| (person.end - bus.pos).abs() < BOARDING_DISTANCE)
        })
        .collect::<Vec<_>>();
    for &index in arrived.iter() {
        bus.people.remove(&index);
        if let Some(person) = people.get_mut(index) {
            log::debug!("Person {} delivered at {:.0}", index, bus.pos);
            person.delivered = true;
        }
    }
    arrived.len()
}

/// Index of the last stop within [`STOP_DISTANCE`] of `pos`.
pub fn stop_at(stops: &[Stop], pos: f32) -> Option<usize> {
    stops
        .iter()
        .rposition(|stop| (stop.pos - pos).abs() < STOP_DISTANCE)
}

/// The stop the bus is at, falling back to the first one.
pub fn current_stop(stops: &[Stop], pos: f32) -> usize {
    stop_at(stops, pos).unwrap_or(0)
}

pub fn next_stop(stops: &[Stop], current: usize) -> usize {
    (current + 1).min(stops.len().saturating_sub(1))
}

/// Records the first arrival at the stop by `pos`, if any.
pub fn arrive(stops: &mut [Stop], pos: f32, elapsed: f32) -> Option<usize> {
    let index = stop_at(stops, pos)?;
    let stop = &mut stops[index];
    if stop.arrival.is_none() {
        log::debug!(
            "Arrived at stop {} after {:.1}s, scheduled {:.1}s",
            index,
            elapsed,
            stop.scheduled
        );
        stop.arrival = Some(elapsed);
    }
    Some(index)
}

pub fn overdue(stops: &[Stop]) -> f32 {
    stops.iter().map(Stop::overdue).sum()
}

pub fn undelivered(people: &[Person]) -> usize {
    people.iter().filter(|person| !person.delivered).count()
}

/// Lower is better.
pub fn score(overdue: f32, undelivered: usize) -> u32 {
    undelivered as u32 * UNDELIVERED_PENALTY + overdue.round() as u32
}
