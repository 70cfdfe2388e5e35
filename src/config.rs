use std::{fs, ops::Range, path::Path};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Window {
    pub title: String,
    pub size: [u32; 2],
}

impl Default for Window {
    fn default() -> Self {
        Self {
            title: "Bus Driver".to_string(),
            size: [1280, 700],
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Terrain {
    pub length: usize,
    pub resolution: u32,
}

impl Default for Terrain {
    fn default() -> Self {
        Self {
            length: 2000,
            resolution: 5,
        }
    }
}

impl Terrain {
    /// Horizontal extent of the heightmap in world units.
    pub fn span(&self) -> f32 {
        (self.length * self.resolution as usize) as f32
    }
}

/// Bus body and wheel geometry. Wheel offsets are measured from the left
/// edge of the body, the way they are laid out on the bus image.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Bus {
    pub mass: f32,
    pub body_size: [f32; 2],
    pub back_wheel: f32,
    pub front_wheel: f32,
    pub wheel_radius: f32,
    pub seats: Vec<f32>,
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            mass: 10000.0,
            body_size: [240.0, 90.0],
            back_wheel: 45.0,
            front_wheel: 195.0,
            wheel_radius: 18.0,
            seats: vec![-80.0, -55.0, -30.0, -5.0, 20.0, 45.0, 70.0],
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Engine {
    pub max_revs: f32,
}

impl Default for Engine {
    fn default() -> Self {
        Self { max_revs: 5000.0 }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Route {
    pub stop_count: usize,
    /// Scheduled travel time between consecutive stops, in seconds.
    pub stop_interval: f32,
    pub people: Range<usize>,
}

impl Default for Route {
    fn default() -> Self {
        Self {
            stop_count: 5,
            stop_interval: 20.0,
            people: 5..11,
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Scenery {
    pub count: Range<usize>,
    pub x: Range<i32>,
    pub y: Range<i32>,
    pub z: Range<u32>,
    pub radius: Range<u32>,
}

impl Default for Scenery {
    fn default() -> Self {
        Self {
            count: 0..301,
            x: -1000..10001,
            y: 0..1001,
            z: 1..11,
            radius: 5..21,
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: Window,
    pub tick_rate: u32,
    pub seed: Option<u64>,
    pub terrain: Terrain,
    pub bus: Bus,
    pub engine: Engine,
    pub route: Route,
    pub scenery: Scenery,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: Window::default(),
            tick_rate: 30,
            seed: None,
            terrain: Terrain::default(),
            bus: Bus::default(),
            engine: Engine::default(),
            route: Route::default(),
            scenery: Scenery::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&bytes).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, ron::error::SpannedError> {
        ron::de::from_bytes(bytes)
    }

    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}
