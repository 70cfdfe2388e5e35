use rand::{seq::SliceRandom as _, Rng};

const SLOPE_STEPS: [f32; 3] = [-0.1, 0.0, 0.1];
const SLOPE_DAMPING: f32 = 0.99;

/// Side-view terrain profile, one height per `resolution` world units.
#[derive(Clone, Debug)]
pub struct Heightmap {
    samples: Vec<i32>,
    resolution: u32,
}

impl Heightmap {
    /// Damped random walk: the slope drifts by a small random step each
    /// sample and decays towards flat, so hills roll instead of wandering off.
    pub fn generate(length: usize, resolution: u32, rng: &mut impl Rng) -> Self {
        profiling::scope!("generate terrain");
        let length = length.max(1);
        let mut samples = Vec::with_capacity(length);
        let mut slope = 0.0f32;
        let mut height = 0.0f32;
        for _ in 0..length {
            samples.push(height.floor() as i32);
            slope += SLOPE_STEPS.choose(rng).copied().unwrap_or_default();
            slope *= SLOPE_DAMPING;
            height += slope;
        }
        log::info!(
            "Generated terrain of {} samples, heights {:?}..{:?}",
            length,
            samples.iter().min(),
            samples.iter().max()
        );
        Self::from_samples(samples, resolution)
    }

    pub fn from_samples(samples: Vec<i32>, resolution: u32) -> Self {
        assert!(!samples.is_empty(), "heightmap needs at least one sample");
        Self {
            samples,
            resolution: resolution.max(1),
        }
    }

    pub fn flat(length: usize, resolution: u32) -> Self {
        Self::from_samples(vec![0; length.max(1)], resolution)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn span(&self) -> f32 {
        (self.samples.len() * self.resolution as usize) as f32
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    /// Height at world position `x`. Queries outside the map clamp to the
    /// first or last sample.
    pub fn sample(&self, x: f32) -> i32 {
        let index = (x / self.resolution as f32).floor();
        let last = self.samples.len() - 1;
        let index = if index.is_nan() || index < 0.0 {
            0
        } else {
            (index as usize).min(last)
        };
        self.samples[index]
    }
}
