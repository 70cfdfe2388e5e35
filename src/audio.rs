use crate::physics::Engine;

/// Audio contract: a looping engine sound whose volume follows the revs.
pub trait EngineSound {
    fn set_volume(&mut self, volume: f32);
}

/// Sink for builds without an audio device. Keeps the last volume so the
/// loop can still report it.
#[derive(Debug, Default)]
pub struct Muted {
    pub volume: f32,
    logged: f32,
}

impl EngineSound for Muted {
    fn set_volume(&mut self, volume: f32) {
        if (volume - self.logged).abs() >= 0.1 {
            log::trace!("Engine volume {:.2}", volume);
            self.logged = volume;
        }
        self.volume = volume;
    }
}

pub fn follow_engine(sound: &mut impl EngineSound, engine: &Engine) {
    sound.set_volume(engine.volume());
}
