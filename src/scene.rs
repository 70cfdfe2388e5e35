//! Turns the world into simple 2D shapes.

use nalgebra::{Point2, Rotation2, Vector2};
use rand::Rng;

use crate::{
    camera::{depth_colour, Anchor, Anchored, Camera},
    config,
    route::{Person, Stop},
    world::World,
};

pub type Rgb = [u8; 3];

const SKY: Rgb = [200, 225, 255];
const GROUND: Rgb = [70, 120, 50];
const BUS_BODY: Rgb = [240, 190, 20];
const BUS_WINDOW: Rgb = [150, 200, 230];
const WHEEL: Rgb = [30, 30, 30];
const POLE: Rgb = [90, 90, 90];
const SIGN_WAITING: Rgb = [220, 60, 40];
const SIGN_REACHED: Rgb = [40, 170, 60];
const PERSON_WAITING: Rgb = [40, 60, 200];
const PERSON_DELIVERED: Rgb = [120, 120, 120];

/// Render contract: everything the scene needs from a drawing surface.
pub trait Canvas {
    fn size(&self) -> [u32; 2];
    fn clear(&mut self, colour: Rgb);
    fn fill_rect(&mut self, min: Point2<f32>, max: Point2<f32>, colour: Rgb);
    fn fill_circle(&mut self, center: Point2<f32>, radius: f32, colour: Rgb);
    /// Fills a convex polygon.
    fn fill_polygon(&mut self, points: &[Point2<f32>], colour: Rgb);
    /// Fills column `x` from `top` down to the bottom edge.
    fn fill_column(&mut self, x: u32, top: f32, colour: Rgb);
}

/// Background decoration on a parallax layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Scenery {
    pub x: f32,
    pub y: f32,
    pub z: u32,
    pub radius: u32,
}

impl Scenery {
    pub fn scatter(config: &config::Scenery, rng: &mut impl Rng) -> Vec<Self> {
        if config.count.is_empty()
            || config.x.is_empty()
            || config.y.is_empty()
            || config.z.is_empty()
            || config.radius.is_empty()
        {
            return Vec::new();
        }
        let count = rng.gen_range(config.count.clone());
        (0..count)
            .map(|_| Self {
                x: rng.gen_range(config.x.clone()) as f32,
                y: rng.gen_range(config.y.clone()) as f32,
                z: rng.gen_range(config.z.clone()).max(1),
                radius: rng.gen_range(config.radius.clone()),
            })
            .collect()
    }
}

/// Anything placed in the world and drawn through the parallax camera.
#[derive(Clone, Copy, Debug)]
pub enum Drawable<'a> {
    Stop { stop: &'a Stop, ground: f32 },
    Person { person: &'a Person, ground: f32 },
    Scenery(&'a Scenery),
}

impl Anchored for Drawable<'_> {
    fn anchor(&self) -> Anchor {
        match *self {
            Self::Stop { stop, ground } => Anchor {
                x: stop.pos,
                y: ground,
                z: 1.0,
            },
            Self::Person { person, ground } => Anchor {
                x: person.pos,
                y: ground,
                z: 1.0,
            },
            Self::Scenery(scenery) => Anchor {
                x: scenery.x,
                y: scenery.y,
                z: scenery.z as f32,
            },
        }
    }
}

impl Drawable<'_> {
    /// Everything in the world that goes through the camera.
    pub fn collect(world: &World) -> Vec<Drawable<'_>> {
        // passengers show through the window
        let seat_height =
            world.bus.altitude as f32 + world.bus.wheel_radius + 0.45 * world.bus.body_size[1];
        let stops = world.stops.iter().map(|stop| Drawable::Stop {
            stop,
            ground: world.heightmap.sample(stop.pos) as f32,
        });
        let people = world.people.iter().enumerate().map(|(index, person)| {
            let ground = if world.bus.people.contains_key(&index) {
                seat_height
            } else {
                world.heightmap.sample(person.pos) as f32
            };
            Drawable::Person { person, ground }
        });
        let scenery = world.scenery.iter().map(Drawable::Scenery);
        scenery.chain(stops).chain(people).collect()
    }

    /// Draws with the anchor at `screen`.
    pub fn render(&self, canvas: &mut impl Canvas, screen: Point2<f32>) {
        match *self {
            Self::Stop { stop, .. } => {
                canvas.fill_rect(
                    screen + Vector2::new(-2.0, -70.0),
                    screen + Vector2::new(2.0, 0.0),
                    POLE,
                );
                let sign = if stop.arrived() {
                    SIGN_REACHED
                } else {
                    SIGN_WAITING
                };
                canvas.fill_rect(
                    screen + Vector2::new(-14.0, -90.0),
                    screen + Vector2::new(14.0, -70.0),
                    sign,
                );
            }
            Self::Person { person, .. } => {
                let colour = if person.delivered {
                    PERSON_DELIVERED
                } else {
                    PERSON_WAITING
                };
                canvas.fill_rect(screen + Vector2::new(-4.0, -20.0), screen, colour);
                canvas.fill_circle(screen + Vector2::new(0.0, -25.0), 5.0, colour);
            }
            Self::Scenery(scenery) => {
                canvas.fill_circle(screen, scenery.radius as f32, depth_colour(scenery.z as f32));
            }
        }
    }
}

/// Draws the whole world with the camera following the bus.
pub fn draw(world: &World, camera: &mut Camera, canvas: &mut impl Canvas) {
    profiling::scope!("draw");
    let [width, height] = canvas.size();
    camera.resize(width, height);
    camera.pos = Vector2::new(-world.bus.pos, -(world.bus.altitude as f32));

    canvas.clear(SKY);
    let projected = camera.project(Drawable::collect(world));
    let near_start = projected.partition_point(|p| p.z > 1.0);
    for p in projected[..near_start].iter() {
        p.item.render(canvas, p.screen);
    }
    draw_terrain(world, camera, canvas);
    draw_bus(world, camera, canvas);
    for p in projected[near_start..].iter() {
        p.item.render(canvas, p.screen);
    }
}

/// Terrain silhouette, one column per screen pixel.
fn draw_terrain(world: &World, camera: &Camera, canvas: &mut impl Canvas) {
    let center = camera.screen_center();
    for x in 0..canvas.size()[0] {
        let world_x = x as f32 + 0.5 - center.x - camera.pos.x;
        let height = world.heightmap.sample(world_x) as f32;
        canvas.fill_column(x, center.y - (height + camera.pos.y), GROUND);
    }
}

fn draw_bus(world: &World, camera: &Camera, canvas: &mut impl Canvas) {
    let bus = &world.bus;
    let origin = camera.screen_pos(Anchor {
        x: bus.pos,
        y: bus.altitude as f32,
        z: 1.0,
    });
    let rotation = Rotation2::new(bus.angle);
    // local coordinates are y-up, the screen is y-down
    let to_screen = |local: Vector2<f32>| {
        let v = rotation * local;
        origin + Vector2::new(v.x, -v.y)
    };
    let outline = |min: Vector2<f32>, max: Vector2<f32>| {
        [
            to_screen(min),
            to_screen(Vector2::new(max.x, min.y)),
            to_screen(max),
            to_screen(Vector2::new(min.x, max.y)),
        ]
    };

    let [width, height] = bus.body_size;
    let bottom = bus.wheel_radius;
    canvas.fill_polygon(
        &outline(
            Vector2::new(-0.5 * width, bottom),
            Vector2::new(0.5 * width, bottom + height),
        ),
        BUS_BODY,
    );
    canvas.fill_polygon(
        &outline(
            Vector2::new(-0.45 * width, bottom + 0.45 * height),
            Vector2::new(0.45 * width, bottom + 0.85 * height),
        ),
        BUS_WINDOW,
    );
    for &wheel in bus.wheels.iter() {
        canvas.fill_circle(to_screen(Vector2::new(wheel, bottom)), bus.wheel_radius, WHEEL);
    }
}

/// Software canvas holding one 4-byte pixel per screen position.
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
    /// Store pixels blue first, for surfaces that expect it.
    pub bgra: bool,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 4]; (width * height) as usize],
            bgra: false,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize((width * height) as usize, [0; 4]);
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let [c0, c1, c2, _] = self.pixels[(y * self.width + x) as usize];
        Some(if self.bgra { [c2, c1, c0] } else { [c0, c1, c2] })
    }

    fn encode(&self, [r, g, b]: Rgb) -> [u8; 4] {
        if self.bgra {
            [b, g, r, 0xFF]
        } else {
            [r, g, b, 0xFF]
        }
    }

    /// Pixel index range covering `[min, max)` on one axis, clipped to `limit`.
    fn span(min: f32, max: f32, limit: u32) -> std::ops::Range<u32> {
        let start = min.round().clamp(0.0, limit as f32) as u32;
        let end = max.round().clamp(0.0, limit as f32) as u32;
        start..end.max(start)
    }

    fn fill_pixels(
        &mut self,
        min: Point2<f32>,
        max: Point2<f32>,
        colour: Rgb,
        inside: impl Fn(Point2<f32>) -> bool,
    ) {
        let value = self.encode(colour);
        let xs = Self::span(min.x, max.x, self.width);
        for y in Self::span(min.y, max.y, self.height) {
            let row = (y * self.width) as usize;
            for x in xs.clone() {
                if inside(Point2::new(x as f32 + 0.5, y as f32 + 0.5)) {
                    self.pixels[row + x as usize] = value;
                }
            }
        }
    }
}

impl Canvas for Framebuffer {
    fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    fn clear(&mut self, colour: Rgb) {
        let value = self.encode(colour);
        self.pixels.fill(value);
    }

    fn fill_rect(&mut self, min: Point2<f32>, max: Point2<f32>, colour: Rgb) {
        self.fill_pixels(min, max, colour, |_| true);
    }

    fn fill_circle(&mut self, center: Point2<f32>, radius: f32, colour: Rgb) {
        let extent = Vector2::new(radius, radius);
        self.fill_pixels(center - extent, center + extent, colour, |p| {
            (p - center).norm_squared() <= radius * radius
        });
    }

    fn fill_polygon(&mut self, points: &[Point2<f32>], colour: Rgb) {
        if points.len() < 3 {
            return;
        }
        let mut min = points[0];
        let mut max = points[0];
        for p in points.iter() {
            min = min.inf(p);
            max = max.sup(p);
        }
        // twice the signed area, used to walk every outline the same way round
        let winding: f32 = points
            .iter()
            .zip(points.iter().cycle().skip(1))
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum();
        if winding == 0.0 {
            return;
        }
        let orient = winding.signum();
        self.fill_pixels(min, max, colour, |p| {
            points
                .iter()
                .zip(points.iter().cycle().skip(1))
                .all(|(&a, &b)| {
                    let edge = (b - a) * orient;
                    let to_p = p - a;
                    let cross = edge.x * to_p.y - edge.y * to_p.x;
                    // centres exactly on an edge go to the upward and rightward edges only
                    let owns_edge = edge.y < 0.0 || (edge.y == 0.0 && edge.x > 0.0);
                    cross > 0.0 || (cross == 0.0 && owns_edge)
                })
        });
    }

    fn fill_column(&mut self, x: u32, top: f32, colour: Rgb) {
        if x >= self.width {
            return;
        }
        let value = self.encode(colour);
        for y in Self::span(top, self.height as f32, self.height) {
            self.pixels[(y * self.width + x) as usize] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, route, terrain::Heightmap};
    use rand::SeedableRng as _;
    use rand_chacha::ChaCha8Rng;

    const RED: Rgb = [255, 0, 0];

    fn count(fb: &Framebuffer, colour: Rgb) -> usize {
        let [w, h] = fb.size();
        (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .filter(|&(x, y)| fb.pixel(x, y) == Some(colour))
            .count()
    }

    #[test]
    fn rects_are_clipped() {
        let mut fb = Framebuffer::new(10, 10);
        fb.fill_rect(Point2::new(-5.0, 8.0), Point2::new(3.0, 20.0), RED);
        assert_eq!(count(&fb, RED), 6);
        assert_eq!(fb.pixel(2, 9), Some(RED));
        assert_eq!(fb.pixel(3, 9), Some([0, 0, 0]));
        assert_eq!(fb.pixel(10, 0), None);
    }

    #[test]
    fn channel_order() {
        let mut fb = Framebuffer::new(1, 1);
        fb.bgra = true;
        fb.clear([1, 2, 3]);
        assert_eq!(fb.as_bytes(), &[3, 2, 1, 0xFF]);
        assert_eq!(fb.pixel(0, 0), Some([1, 2, 3]));
    }

    #[test]
    fn shapes_cover_their_area() {
        let mut fb = Framebuffer::new(100, 100);
        fb.fill_circle(Point2::new(50.0, 50.0), 10.0, RED);
        let area = count(&fb, RED) as f32;
        assert!((area - std::f32::consts::PI * 100.0).abs() < 20.0, "{}", area);

        fb.clear([0; 3]);
        let square = [
            Point2::new(50.0, 30.0),
            Point2::new(70.0, 50.0),
            Point2::new(50.0, 70.0),
            Point2::new(30.0, 50.0),
        ];
        fb.fill_polygon(&square, RED);
        assert_eq!(count(&fb, RED), 800);
        assert_eq!(fb.pixel(50, 50), Some(RED));
        assert_eq!(fb.pixel(32, 32), Some([0; 3]));

        // the same outline wound the other way covers the same pixels
        fb.clear([0; 3]);
        let mut reversed = square;
        reversed.reverse();
        fb.fill_polygon(&reversed, RED);
        assert_eq!(count(&fb, RED), 800);
    }

    #[test]
    fn adjacent_polygons_share_edges_once() {
        const GREEN: Rgb = [0, 255, 0];
        let mut fb = Framebuffer::new(20, 20);
        let left = [
            Point2::new(2.0, 2.0),
            Point2::new(10.0, 2.0),
            Point2::new(10.0, 12.0),
            Point2::new(2.0, 12.0),
        ];
        let right = [
            Point2::new(10.0, 2.0),
            Point2::new(18.0, 2.0),
            Point2::new(18.0, 12.0),
            Point2::new(10.0, 12.0),
        ];
        fb.fill_polygon(&left, RED);
        fb.fill_polygon(&right, GREEN);
        assert_eq!(count(&fb, RED), 80);
        assert_eq!(count(&fb, GREEN), 80);

        fb.clear([0; 3]);
        let upper = [
            Point2::new(2.0, 2.0),
            Point2::new(18.0, 2.0),
            Point2::new(2.0, 18.0),
        ];
        let lower = [
            Point2::new(18.0, 2.0),
            Point2::new(18.0, 18.0),
            Point2::new(2.0, 18.0),
        ];
        fb.fill_polygon(&upper, RED);
        let upper_area = count(&fb, RED);
        fb.fill_polygon(&lower, GREEN);
        assert_eq!(count(&fb, RED), upper_area);
        assert_eq!(upper_area + count(&fb, GREEN), 256);
    }

    #[test]
    fn columns_fill_to_the_bottom() {
        let mut fb = Framebuffer::new(4, 10);
        fb.fill_column(1, 6.0, RED);
        fb.fill_column(2, -3.0, RED);
        fb.fill_column(3, 20.0, RED);
        assert_eq!(count(&fb, RED), 4 + 10);
        assert_eq!(fb.pixel(1, 5), Some([0; 3]));
        assert_eq!(fb.pixel(1, 6), Some(RED));
    }

    #[test]
    fn scatter_respects_ranges() {
        let config = config::Scenery::default();
        let scenery = Scenery::scatter(&config, &mut ChaCha8Rng::seed_from_u64(1));
        for item in scenery.iter() {
            assert!((1..=10).contains(&item.z));
            assert!((5..=20).contains(&item.radius));
        }
        let empty = config::Scenery {
            count: 0..0,
            ..Default::default()
        };
        assert!(Scenery::scatter(&empty, &mut ChaCha8Rng::seed_from_u64(1)).is_empty());
    }

    #[test]
    fn scene_puts_ground_below_sky() {
        let config = Config::default();
        let heightmap = Heightmap::flat(400, 5);
        let stops = route::generate_stops(&config.route, heightmap.span());
        let people = vec![Person::new(stops[0].pos, stops[1].pos)];
        let world = World::from_parts(
            &config,
            heightmap,
            stops,
            people,
            ChaCha8Rng::seed_from_u64(0),
        );

        let mut fb = Framebuffer::new(320, 200);
        let mut camera = Camera::default();
        draw(&world, &mut camera, &mut fb);
        assert_eq!(camera.screen_size, [320, 200]);
        assert_eq!(fb.pixel(0, 0), Some(SKY));
        assert_eq!(fb.pixel(0, 199), Some(GROUND));
        // the bus sits in the middle of the screen, just above the ground
        assert_eq!(fb.pixel(100, 60), Some(BUS_BODY));
        assert!(count(&fb, WHEEL) > 0);
    }

    #[test]
    fn far_scenery_goes_behind() {
        let config = Config::default();
        let mut world = World::from_parts(
            &config,
            Heightmap::flat(100, 5),
            Vec::new(),
            Vec::new(),
            ChaCha8Rng::seed_from_u64(0),
        );
        world.scenery = vec![Scenery { x: 0.0, y: -20.0, z: 2, radius: 5 }];
        let drawables = Drawable::collect(&world);
        assert_eq!(drawables.len(), 1);
        let mut fb = Framebuffer::new(100, 100);
        draw(&world, &mut Camera::default(), &mut fb);
        // sits below the horizon, so the ground covers it
        assert_eq!(count(&fb, depth_colour(2.0)), 0);
    }
}
