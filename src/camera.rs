use nalgebra::{Point2, Vector2};

use crate::scene::Rgb;

/// Colours of the depth layers, nearest first.
pub const PALETTE: [Rgb; 10] = [
    [255, 0, 0],
    [180, 75, 0],
    [120, 120, 0],
    [75, 180, 0],
    [0, 255, 0],
    [0, 180, 75],
    [0, 120, 120],
    [0, 75, 180],
    [0, 0, 255],
    [0, 0, 120],
];

/// Colour of the depth layer `z` falls into.
pub fn depth_colour(z: f32) -> Rgb {
    let layer = (z.max(1.0) as usize).min(PALETTE.len());
    PALETTE[layer - 1]
}

/// Where an entity lives in the world. `z` is the parallax factor:
/// 1 moves with the camera, larger values move proportionally less.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

pub trait Anchored {
    fn anchor(&self) -> Anchor;
}

#[derive(Debug)]
pub struct Projected<T> {
    pub item: T,
    pub screen: Point2<f32>,
    pub z: f32,
}

pub struct Camera {
    /// Camera offset added to every world position before the depth division.
    pub pos: Vector2<f32>,
    pub screen_size: [u32; 2],
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: Vector2::zeros(),
            screen_size: [1280, 700],
        }
    }
}

impl Camera {
    pub fn screen_center(&self) -> Point2<f32> {
        Point2::new(
            (self.screen_size[0] / 2) as f32,
            (self.screen_size[1] / 2) as f32,
        )
    }

    pub fn screen_pos(&self, anchor: Anchor) -> Point2<f32> {
        let center = self.screen_center();
        let z = anchor.z.max(1.0);
        Point2::new(
            center.x + (self.pos.x + anchor.x) / z,
            center.y - (anchor.y + self.pos.y) / z,
        )
    }

    /// Resolves screen positions and orders entities back to front, so
    /// drawing them in sequence lets near entities cover far ones.
    /// Entities at equal depth keep their input order.
    pub fn project<T: Anchored>(&self, entities: impl IntoIterator<Item = T>) -> Vec<Projected<T>> {
        let mut projected = entities
            .into_iter()
            .map(|item| {
                let anchor = item.anchor();
                Projected {
                    screen: self.screen_pos(anchor),
                    z: anchor.z,
                    item,
                }
            })
            .collect::<Vec<_>>();
        projected.sort_by(|a, b| b.z.total_cmp(&a.z));
        projected
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.screen_size = [width, height];
    }
}
