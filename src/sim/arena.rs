//! Minimal deterministic world for headless play and tests
//!
//! Point-mass balls under gravity and linear damping, bouncing off static boxes:
//! the four boundary walls, the basket rims and the platform. The basket sensor
//! reports overlap without blocking. Real hosts plug in their own engine through
//! [`PhysicsWorld`]; this one only has to be good enough to drive the game loop.

use std::collections::HashSet;

use glam::Vec2;

use super::collision::{ball_box_collision, reflect_velocity};
use super::physics::{BodyId, Category, ContactEvent, PhysicsWorld, SceneBodies, StepWorld};
use super::state::Playfield;
use crate::tuning::Tuning;

/// Physics scale: 150 points per meter
pub const POINTS_PER_METER: f32 = 150.0;
/// Earth gravity in points/s²
pub const GRAVITY: f32 = -9.8 * POINTS_PER_METER;

const LINEAR_DAMPING: f32 = 0.1;
/// Impacts slower than this stick instead of bouncing
const REST_SPEED: f32 = 30.0;
/// Tangential speed kept per step while touching a surface
const ROLLING_FRICTION: f32 = 0.985;
/// Contact shell so resting bodies stay in contact between steps
const CONTACT_SLOP: f32 = 0.5;

const WALL_RESTITUTION: f32 = 0.7;
const RIM_RESTITUTION: f32 = 0.5;
const PLATFORM_RESTITUTION: f32 = 0.9;

#[derive(Debug, Clone)]
struct BallBody {
    id: BodyId,
    position: Vec2,
    velocity: Vec2,
    radius: f32,
    dynamic: bool,
}

impl BallBody {
    fn mass(&self) -> f32 {
        let r = self.radius / POINTS_PER_METER;
        std::f32::consts::PI * r * r
    }
}

/// Static box, possibly one part of a compound body
#[derive(Debug, Clone)]
struct BoxShape {
    shape: u32,
    owner: BodyId,
    /// Offset from the owner's anchor
    offset: Vec2,
    center: Vec2,
    half_extents: Vec2,
    category: Category,
    sensor: bool,
    restitution: f32,
}

/// Headless stand-in for the host physics engine
#[derive(Debug, Clone)]
pub struct ArenaWorld {
    next_id: u32,
    balls: Vec<BallBody>,
    boxes: Vec<BoxShape>,
    /// (ball, shape) pairs currently in contact
    touching: HashSet<(BodyId, u32)>,
    bodies: SceneBodies,
}

impl ArenaWorld {
    /// Build walls, platform and basket for a playfield
    pub fn new(field: Playfield, tuning: &Tuning) -> Self {
        let mut world = Self {
            next_id: 1,
            balls: Vec::new(),
            boxes: Vec::new(),
            touching: HashSet::new(),
            bodies: SceneBodies {
                basket: BodyId(0),
                platform: BodyId(0),
            },
        };
        let scale = field.scale();
        let (w, h) = (field.width, field.height);
        let t = tuning.wall_thickness;

        // Floor, ceiling, left, right
        for (center, half) in [
            (Vec2::new(w / 2.0, t / 2.0), Vec2::new(w / 2.0, t / 2.0)),
            (Vec2::new(w / 2.0, h - t / 2.0), Vec2::new(w / 2.0, t / 2.0)),
            (Vec2::new(t / 2.0, h / 2.0), Vec2::new(t / 2.0, h / 2.0)),
            (Vec2::new(w - t / 2.0, h / 2.0), Vec2::new(t / 2.0, h / 2.0)),
        ] {
            let id = world.alloc_id();
            world.add_box(id, center, Vec2::ZERO, half, Category::Wall, false, WALL_RESTITUTION);
        }

        let platform = world.alloc_id();
        let platform_half = Vec2::new(tuning.platform_width, tuning.platform_height) * scale / 2.0;
        world.add_box(
            platform,
            field.anchor(Vec2::new(0.5, 0.5)),
            Vec2::ZERO,
            platform_half,
            Category::Platform,
            false,
            PLATFORM_RESTITUTION,
        );

        let basket = world.alloc_id();
        let anchor = field.anchor(Vec2::new(0.85, 0.8));
        let size = tuning.basket_size * scale;
        let rim_offset = size / 2.0 * 0.7;
        for x in [-rim_offset, rim_offset] {
            world.add_box(
                basket,
                anchor,
                Vec2::new(x, size * 0.3),
                Vec2::splat(5.0),
                Category::Wall,
                false,
                RIM_RESTITUTION,
            );
        }
        // Scoring sensor sits low so the ball has to drop all the way in
        world.add_box(
            basket,
            anchor,
            Vec2::new(0.0, -size * 0.2),
            Vec2::new(size * 0.2, 2.5),
            Category::Basket,
            true,
            0.0,
        );

        world.bodies = SceneBodies { basket, platform };
        world
    }

    pub fn bodies(&self) -> SceneBodies {
        self.bodies
    }

    pub fn ball_count(&self) -> usize {
        self.balls.len()
    }

    fn alloc_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn add_box(
        &mut self,
        owner: BodyId,
        anchor: Vec2,
        offset: Vec2,
        half_extents: Vec2,
        category: Category,
        sensor: bool,
        restitution: f32,
    ) {
        let shape = self.boxes.len() as u32;
        self.boxes.push(BoxShape {
            shape,
            owner,
            offset,
            center: anchor + offset,
            half_extents,
            category,
            sensor,
            restitution,
        });
    }

    fn ball(&self, body: BodyId) -> Option<&BallBody> {
        self.balls.iter().find(|b| b.id == body)
    }

    fn ball_mut(&mut self, body: BodyId) -> Option<&mut BallBody> {
        self.balls.iter_mut().find(|b| b.id == body)
    }
}

impl PhysicsWorld for ArenaWorld {
    fn spawn_ball(&mut self, position: Vec2, radius: f32) -> BodyId {
        let id = self.alloc_id();
        self.balls.push(BallBody {
            id,
            position,
            velocity: Vec2::ZERO,
            radius,
            dynamic: false,
        });
        id
    }

    fn remove_body(&mut self, body: BodyId) {
        self.balls.retain(|b| b.id != body);
        self.touching.retain(|(ball, _)| *ball != body);
    }

    fn set_dynamic(&mut self, body: BodyId, dynamic: bool) {
        if let Some(ball) = self.ball_mut(body) {
            ball.dynamic = dynamic;
            if !dynamic {
                ball.velocity = Vec2::ZERO;
            }
        }
    }

    fn apply_impulse(&mut self, body: BodyId, impulse: Vec2) {
        if let Some(ball) = self.ball_mut(body) {
            if ball.dynamic {
                ball.velocity += impulse / ball.mass();
            }
        }
    }

    fn set_position(&mut self, body: BodyId, position: Vec2) {
        if let Some(ball) = self.ball_mut(body) {
            ball.position = position;
            return;
        }
        for shape in self.boxes.iter_mut().filter(|s| s.owner == body) {
            shape.center = position + shape.offset;
        }
    }

    fn position(&self, body: BodyId) -> Option<Vec2> {
        if let Some(ball) = self.ball(body) {
            return Some(ball.position);
        }
        self.boxes
            .iter()
            .find(|s| s.owner == body)
            .map(|s| s.center - s.offset)
    }

    fn velocity(&self, body: BodyId) -> Option<Vec2> {
        if let Some(ball) = self.ball(body) {
            return Some(ball.velocity);
        }
        self.boxes.iter().any(|s| s.owner == body).then_some(Vec2::ZERO)
    }
}

impl StepWorld for ArenaWorld {
    fn step(&mut self, dt: f32) -> Vec<ContactEvent> {
        let mut contacts = Vec::new();

        for ball in self.balls.iter_mut().filter(|b| b.dynamic) {
            ball.velocity.y += GRAVITY * dt;
            ball.velocity *= 1.0 / (1.0 + LINEAR_DAMPING * dt);
            ball.position += ball.velocity * dt;

            for shape in &self.boxes {
                let key = (ball.id, shape.shape);
                let hit = ball_box_collision(
                    ball.position,
                    ball.radius + CONTACT_SLOP,
                    shape.center,
                    shape.half_extents,
                );
                if !hit.hit {
                    self.touching.remove(&key);
                    continue;
                }
                let began = self.touching.insert(key);

                if shape.sensor {
                    if began {
                        contacts.push(ContactEvent::new(
                            Category::Ball,
                            shape.category,
                            hit.point,
                            ball.velocity,
                        ));
                    }
                    continue;
                }

                let vn = ball.velocity.dot(hit.normal);
                if began && vn < 0.0 {
                    contacts.push(ContactEvent::new(
                        Category::Ball,
                        shape.category,
                        hit.point,
                        ball.velocity,
                    ));
                }
                if vn < -REST_SPEED {
                    ball.velocity = reflect_velocity(ball.velocity, hit.normal, shape.restitution);
                } else if vn < 0.0 {
                    ball.velocity -= vn * hit.normal;
                }

                let normal_part = ball.velocity.dot(hit.normal) * hit.normal;
                ball.velocity = normal_part + (ball.velocity - normal_part) * ROLLING_FRICTION;

                let penetration = hit.penetration - CONTACT_SLOP;
                if penetration > 0.0 {
                    ball.position += hit.normal * penetration;
                }
            }
        }

        contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn world() -> ArenaWorld {
        ArenaWorld::new(Playfield::default(), &Tuning::default())
    }

    fn run(world: &mut ArenaWorld, seconds: f32) -> Vec<ContactEvent> {
        let steps = (seconds / SIM_DT) as usize;
        (0..steps).flat_map(|_| world.step(SIM_DT)).collect()
    }

    #[test]
    fn test_new_ball_is_pinned() {
        let mut w = world();
        let ball = w.spawn_ball(Vec2::new(100.0, 400.0), 20.0);
        w.apply_impulse(ball, Vec2::new(0.0, 80.0));
        assert!(run(&mut w, 1.0).is_empty());
        assert_eq!(w.position(ball), Some(Vec2::new(100.0, 400.0)));
        assert_eq!(w.velocity(ball), Some(Vec2::ZERO));
    }

    #[test]
    fn test_impulse_scales_with_mass() {
        let mut w = world();
        let ball = w.spawn_ball(Vec2::new(100.0, 400.0), 20.0);
        w.set_dynamic(ball, true);
        w.apply_impulse(ball, Vec2::new(80.0, 0.0));
        let v = w.velocity(ball).unwrap();
        let mass = std::f32::consts::PI * (20.0 / POINTS_PER_METER).powi(2);
        assert!((v.x - 80.0 / mass).abs() < 1e-2);
    }

    #[test]
    fn test_dropped_ball_hits_floor_then_settles() {
        let mut w = world();
        let ball = w.spawn_ball(Vec2::new(100.0, 250.0), 20.0);
        w.set_dynamic(ball, true);
        let contacts = run(&mut w, 10.0);

        let first = contacts.first().expect("ball should reach the floor");
        assert!(first.is_between(Category::Ball, Category::Wall));
        assert!((first.point.y - 10.0).abs() < 1.0);
        assert!(first.relative_velocity.y < 0.0);

        let speed = w.velocity(ball).unwrap().length();
        assert!(speed < crate::consts::SETTLE_SPEED, "speed {}", speed);
        assert!(w.position(ball).unwrap().y > 25.0);
    }

    #[test]
    fn test_fast_ball_reports_floor_contact_at_face() {
        let mut w = world();
        let ball = w.spawn_ball(Vec2::new(100.0, 30.0), 20.0);
        w.set_dynamic(ball, true);
        let mass = std::f32::consts::PI * (20.0 / POINTS_PER_METER).powi(2);
        // One step ends with the center inside the upper half of the floor
        w.apply_impulse(ball, Vec2::new(0.0, -2600.0 * mass));

        let contacts = w.step(SIM_DT);
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].is_between(Category::Ball, Category::Wall));
        assert!((contacts[0].point.y - 10.0).abs() < 1e-3, "point {:?}", contacts[0].point);
        assert!(w.position(ball).unwrap().y > 25.0);
        assert!(w.velocity(ball).unwrap().y > 0.0);
    }

    #[test]
    fn test_sensor_reports_once_while_falling_through() {
        let mut w = world();
        let basket = w.bodies().basket;
        let anchor = w.position(basket).unwrap();
        let ball = w.spawn_ball(anchor + Vec2::new(0.0, 10.0), 20.0);
        w.set_dynamic(ball, true);

        let contacts = run(&mut w, 0.5);
        let sensor: Vec<_> = contacts
            .iter()
            .filter(|c| c.is_between(Category::Ball, Category::Basket))
            .collect();
        assert_eq!(sensor.len(), 1);
        assert!(sensor[0].relative_velocity.y < 0.0);
    }

    #[test]
    fn test_moving_compound_body() {
        let mut w = world();
        let basket = w.bodies().basket;
        w.set_position(basket, Vec2::new(200.0, 400.0));
        assert_eq!(w.position(basket), Some(Vec2::new(200.0, 400.0)));
        assert_eq!(w.velocity(basket), Some(Vec2::ZERO));
        assert_eq!(w.velocity(BodyId(999)), None);
    }

    #[test]
    fn test_remove_body() {
        let mut w = world();
        let ball = w.spawn_ball(Vec2::new(100.0, 400.0), 20.0);
        assert_eq!(w.ball_count(), 1);
        w.remove_body(ball);
        assert_eq!(w.ball_count(), 0);
        assert_eq!(w.position(ball), None);
    }
}
