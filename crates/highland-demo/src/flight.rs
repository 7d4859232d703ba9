//! Scripted camera path over the terrain.

use glam::Vec3;
use highland_render::Camera;
use highland_world::TerrainWorld;

/// Height kept above the ground under the camera.
const CLEARANCE: f32 = 40.0;
/// How far ahead of the camera the view target sits.
const LOOK_AHEAD: f32 = 120.0;

/// Flies a camera in a straight line, following the terrain height.
pub struct FlyOver {
    start: Vec3,
    direction: Vec3,
    speed: f32,
}

impl FlyOver {
    /// Fly from `start` along the horizontal `heading`, `speed` units per frame.
    pub fn new(start: Vec3, heading: Vec3, speed: f32) -> Self {
        let direction = Vec3::new(heading.x, 0.0, heading.z)
            .try_normalize()
            .unwrap_or(Vec3::Z);
        Self {
            start,
            direction,
            speed,
        }
    }

    /// Place `camera` at its position for `frame`, looking ahead and slightly down.
    pub fn place(&self, camera: &mut Camera, world: &TerrainWorld, frame: u64) {
        let ground = |p: Vec3| world.field().sample(p.x as f64, p.z as f64) as f32;

        let mut position = self.start + self.direction * (self.speed * frame as f32);
        position.y = ground(position) + CLEARANCE;

        let mut target = position + self.direction * LOOK_AHEAD;
        target.y = ground(target);

        camera.position = position;
        camera.look_at(target);
    }
}
