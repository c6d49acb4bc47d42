//! Circle versus axis-aligned box contacts
//!
//! Used by [`super::arena::ArenaWorld`] for walls, rims, the platform and the
//! basket sensor.

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Closest point on the box (if hit)
    pub point: Vec2,
    /// Surface normal pointing toward the ball center
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check a ball against a box given by center and half extents
pub fn ball_box_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    center: Vec2,
    half_extents: Vec2,
) -> CollisionResult {
    let min = center - half_extents;
    let max = center + half_extents;
    let closest = ball_pos.clamp(min, max);
    let delta = ball_pos - closest;
    let dist = delta.length();

    if dist >= ball_radius {
        return CollisionResult::miss();
    }

    if dist > 1e-4 {
        return CollisionResult {
            hit: true,
            point: closest,
            normal: delta / dist,
            penetration: ball_radius - dist,
        };
    }

    // Center inside the box: push out through the nearest face
    let to_min = ball_pos - min;
    let to_max = max - ball_pos;
    let faces = [
        (to_min.x, Vec2::NEG_X),
        (to_max.x, Vec2::X),
        (to_min.y, Vec2::NEG_Y),
        (to_max.y, Vec2::Y),
    ];
    let (depth, normal) = faces
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .unwrap_or((0.0, Vec2::Y));
    CollisionResult {
        hit: true,
        point: ball_pos + normal * depth,
        normal,
        penetration: depth + ball_radius,
    }
}

/// Bounce velocity off a surface with restitution `e`
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return velocity;
    }
    velocity - (1.0 + restitution) * vn * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ball_above_floor() {
        let floor_center = Vec2::new(195.0, 5.0);
        let half = Vec2::new(195.0, 5.0);

        let result = ball_box_collision(Vec2::new(100.0, 50.0), 20.0, floor_center, half);
        assert!(!result.hit);

        let result = ball_box_collision(Vec2::new(100.0, 25.0), 20.0, floor_center, half);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::Y);
        assert!((result.point.y - 10.0).abs() < 1e-4);
        assert!((result.penetration - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_center_inside_box_uses_nearest_face() {
        let result = ball_box_collision(Vec2::new(0.0, 4.0), 2.0, Vec2::ZERO, Vec2::new(10.0, 5.0));
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::Y);
        assert!((result.point.y - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_reflect_velocity() {
        let v = reflect_velocity(Vec2::new(3.0, -10.0), Vec2::Y, 0.5);
        assert!((v.x - 3.0).abs() < 1e-4);
        assert!((v.y - 5.0).abs() < 1e-4);

        // Already separating: unchanged
        let v = reflect_velocity(Vec2::new(0.0, 4.0), Vec2::Y, 0.5);
        assert_eq!(v, Vec2::new(0.0, 4.0));
    }
}
