/*!
The rigid body world.

One aggregate owns every body: the three static boundaries, the single kinematic platform and
the dynamic projectiles. All mutation goes through `&mut self`, so a step can never observe a
half-applied change.

Step pipeline (`PhysicsWorld::step`)
1. Validate `dt`.
2. Derive the platform's velocity from its pending target pose.
3. Integrate gravity into projectile velocities, remembering what they entered the step with.
4. Broad phase over loosened AABBs, then parry2d contact queries.
5. Sequential-impulse velocity solve.
6. Integrate positions; the platform lands exactly on its target.
7. Project out residual penetration.
*/

use crate::body::{BodyId, Boundary, ControlledBody, FreeBody, FreeBodyDesc};
use crate::collision::settings::{
    CONTACT_SKIN, POSITION_ITERATIONS, VELOCITY_ITERATIONS, restitution_threshold,
};
use crate::collision::{
    ColliderOwner, ColliderProxy, ContactPoint, Material, Pose, SolverBody, SolverContact, Vec2,
    VelocityParams, candidate_pairs, contacts_for_pairs, motion_bound, resolve_penetration,
    solve_velocities,
};
use crate::constants::{
    BOUNDARY_FRICTION, BOUNDARY_RESTITUTION, BOUNDARY_THICKNESS, GRAVITY, OUT_OF_BOUNDS_MARGIN,
    PLATFORM_FRICTION, PLATFORM_HEIGHT, PLATFORM_RESTITUTION, PLATFORM_WIDTH, PLAYFIELD_HEIGHT,
    PLAYFIELD_WIDTH,
};
use crate::error::SimError;
use crate::utils::{angle_delta, wrap_angle};

/// Everything the world needs to build itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldSettings {
    pub width: f32,
    pub height: f32,
    /// Signed vertical acceleration; negative pulls toward the floor.
    pub gravity: f32,
    pub boundary_material: Material,
    pub boundary_thickness: f32,
    /// Full platform width and height.
    pub platform_size: Vec2,
    pub platform_material: Material,
    pub out_of_bounds_margin: f32,
    pub solver_iterations: u32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            width: PLAYFIELD_WIDTH,
            height: PLAYFIELD_HEIGHT,
            gravity: GRAVITY,
            boundary_material: Material::new(BOUNDARY_FRICTION, BOUNDARY_RESTITUTION),
            boundary_thickness: BOUNDARY_THICKNESS,
            platform_size: Vec2::new(PLATFORM_WIDTH, PLATFORM_HEIGHT),
            platform_material: Material::new(PLATFORM_FRICTION, PLATFORM_RESTITUTION),
            out_of_bounds_margin: OUT_OF_BOUNDS_MARGIN,
            solver_iterations: VELOCITY_ITERATIONS,
        }
    }
}

impl WorldSettings {
    pub fn validate(&self) -> Result<(), SimError> {
        let positive = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(SimError::InvalidConfig(format!(
                    "{name} must be finite and positive, got {v}"
                )))
            }
        };
        positive("playfield width", self.width)?;
        positive("playfield height", self.height)?;
        positive("boundary thickness", self.boundary_thickness)?;
        positive("platform width", self.platform_size.x)?;
        positive("platform height", self.platform_size.y)?;
        if !self.gravity.is_finite() {
            return Err(SimError::InvalidConfig(format!(
                "gravity must be finite, got {}",
                self.gravity
            )));
        }
        if !(self.out_of_bounds_margin.is_finite() && self.out_of_bounds_margin >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "out-of-bounds margin must be finite and non-negative, got {}",
                self.out_of_bounds_margin
            )));
        }
        if !self.boundary_material.is_valid() || !self.platform_material.is_valid() {
            return Err(SimError::InvalidConfig(
                "boundary and platform friction must be >= 0 and restitution within [0, 1]".into(),
            ));
        }
        if self.solver_iterations == 0 {
            return Err(SimError::InvalidConfig(
                "solver iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Platform pose at initialization and after a reset: playfield center, level.
    pub fn default_platform_position(&self) -> Vec2 {
        Vec2::new(0.5 * self.width, 0.5 * self.height)
    }
}

/// Diagnostics from a single step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepStats {
    /// Contacts reported by the narrow phase.
    pub contacts: usize,
    /// Contacts that ended the solve pushing the bodies apart.
    pub engaged: usize,
    /// Deepest overlap found before positional correction.
    pub max_penetration: f32,
}

pub struct PhysicsWorld {
    settings: WorldSettings,
    boundaries: [Boundary; 3],
    platform: ControlledBody,
    bodies: Vec<FreeBody>,
    next_id: u64,
    elapsed: f64,
}

impl PhysicsWorld {
    /// Build a world with default materials and sizes.
    pub fn initialize(width: f32, height: f32, gravity: f32) -> Result<Self, SimError> {
        Self::with_settings(WorldSettings {
            width,
            height,
            gravity,
            ..WorldSettings::default()
        })
    }

    pub fn with_settings(settings: WorldSettings) -> Result<Self, SimError> {
        settings.validate()?;
        let boundaries = Boundary::enclosing(
            settings.width,
            settings.height,
            settings.boundary_thickness,
            settings.boundary_material,
        );
        let platform = ControlledBody::new(
            settings.default_platform_position(),
            0.5 * settings.platform_size,
            settings.platform_material,
        );
        log::info!(
            "physics world initialized: {}x{} gravity {}",
            settings.width,
            settings.height,
            settings.gravity
        );
        Ok(Self {
            settings,
            boundaries,
            platform,
            bodies: Vec::new(),
            next_id: 1,
            elapsed: 0.0,
        })
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    pub fn platform(&self) -> &ControlledBody {
        &self.platform
    }

    /// Live projectiles in insertion order.
    pub fn bodies(&self) -> &[FreeBody] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&FreeBody> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Simulated seconds since initialization or the last reset.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Request the platform pose to be reached at the end of the next step.
    ///
    /// A later call before the step replaces the earlier request. Non-finite input is ignored
    /// and the platform holds its current pose.
    pub fn drive_controlled_body(&mut self, position: Vec2, orientation: f32) {
        if !(position.iter().all(|v| v.is_finite()) && orientation.is_finite()) {
            log::warn!("ignoring non-finite platform target {position:?} / {orientation}");
            return;
        }
        self.platform.target = Some(Pose::new(position, wrap_angle(orientation)));
    }

    pub fn add_body(&mut self, desc: FreeBodyDesc) -> Result<BodyId, SimError> {
        desc.validate()?;
        let id = BodyId(self.next_id);
        self.next_id += 1;
        self.bodies.push(FreeBody::from_desc(id, &desc));
        log::debug!("body {id} added at ({:.1}, {:.1})", desc.position.x, desc.position.y);
        Ok(id)
    }

    /// Remove a projectile. Unknown ids are a no-op.
    pub fn remove_body(&mut self, id: BodyId) -> Option<FreeBody> {
        let index = self.bodies.iter().position(|b| b.id == id)?;
        Some(self.bodies.remove(index))
    }

    /// Projectiles whose center is further than the margin outside the playfield, below the
    /// floor or beyond either side. Above the open top is never out of bounds.
    pub fn bodies_out_of_bounds(&self) -> Vec<BodyId> {
        let margin = self.settings.out_of_bounds_margin;
        let width = self.settings.width;
        self.bodies
            .iter()
            .filter(|b| {
                let p = b.position;
                !(p.x.is_finite() && p.y.is_finite())
                    || p.y < -margin
                    || p.x < -margin
                    || p.x > width + margin
            })
            .map(|b| b.id)
            .collect()
    }

    /// Drop every projectile and return the platform to its default pose.
    ///
    /// Boundaries are untouched and ids keep counting up, so an id from before the reset can
    /// never name a new body.
    pub fn reset(&mut self) {
        self.bodies.clear();
        self.platform = ControlledBody::new(
            self.settings.default_platform_position(),
            self.platform.half_extents,
            self.platform.material,
        );
        self.elapsed = 0.0;
        log::info!("physics world reset");
    }

    /// Advance the world by `dt` seconds.
    ///
    /// Fails with `InvalidTimestep` for non-finite or non-positive `dt`, leaving the world
    /// exactly as it was.
    pub fn step(&mut self, dt: f32) -> Result<StepStats, SimError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidTimestep(dt));
        }

        // Kinematic platform velocity from the pose change requested for this step.
        let target = self.platform.target.take().unwrap_or(self.platform.pose());
        self.platform.linear_velocity = (target.translation - self.platform.position) / dt;
        self.platform.angular_velocity = angle_delta(self.platform.angle, target.angle) / dt;

        let gravity = Vec2::new(0.0, self.settings.gravity);
        let entry_velocities: Vec<Vec2> = self.bodies.iter().map(|b| b.velocity).collect();
        for body in self.bodies.iter_mut() {
            body.previous_position = body.position;
            body.velocity += gravity * dt;
        }

        // Contacts at the start-of-step poses, predicted over the step.
        let proxies = self.collect_proxies(dt);
        let pairs = candidate_pairs(&proxies);
        let contacts = contacts_for_pairs(&proxies, &pairs, CONTACT_SKIN);
        let solver_contacts: Vec<SolverContact> =
            contacts.iter().map(|c| self.solver_contact(c)).collect();

        let mut solver_bodies = self.solver_bodies();
        for (slot, entry) in solver_bodies.iter_mut().zip(&entry_velocities) {
            *slot = slot.with_entry_velocity(*entry);
        }
        let params = VelocityParams {
            dt,
            iterations: self.settings.solver_iterations,
            restitution_threshold: restitution_threshold(self.settings.gravity, dt),
        };
        let engaged = solve_velocities(&mut solver_bodies, &solver_contacts, &params);

        for (body, solved) in self.bodies.iter_mut().zip(solver_bodies.iter()) {
            body.velocity = solved.linvel;
            body.angular_velocity = solved.angvel;
            body.position += body.velocity * dt;
            body.angle = wrap_angle(body.angle + body.angular_velocity * dt);
        }
        self.platform.position = target.translation;
        self.platform.angle = target.angle;

        let max_penetration = self.project_penetration();

        self.elapsed += f64::from(dt);
        log::trace!(
            "step {:.4}s: {} bodies, {} contacts ({} engaged), max penetration {:.3}",
            self.elapsed,
            self.bodies.len(),
            contacts.len(),
            engaged,
            max_penetration
        );

        Ok(StepStats {
            contacts: contacts.len(),
            engaged,
            max_penetration,
        })
    }

    /// Positional correction passes. Returns the deepest overlap seen on the first pass.
    fn project_penetration(&mut self) -> f32 {
        let mut first_pass_depth = None;
        for _ in 0..POSITION_ITERATIONS {
            let proxies = self.collect_proxies(0.0);
            let pairs = candidate_pairs(&proxies);
            let contacts = contacts_for_pairs(&proxies, &pairs, 0.0);
            let solver_contacts: Vec<SolverContact> =
                contacts.iter().map(|c| self.solver_contact(c)).collect();

            let mut solver_bodies = self.solver_bodies();
            let depth = resolve_penetration(&mut solver_bodies, &solver_contacts);
            first_pass_depth.get_or_insert(depth);

            for (body, solved) in self.bodies.iter_mut().zip(solver_bodies.iter()) {
                body.position = solved.center;
            }
        }
        first_pass_depth.unwrap_or(0.0)
    }

    /// Proxies for every collider; `dt` scales the motion bound used to loosen them.
    fn collect_proxies(&self, dt: f32) -> Vec<ColliderProxy> {
        let mut proxies = Vec::with_capacity(self.bodies.len() + 1 + self.boundaries.len());
        for (i, body) in self.bodies.iter().enumerate() {
            proxies.push(ColliderProxy::new(
                ColliderOwner::Free(i),
                body.shape(),
                body.pose(),
                motion_bound(body.velocity, 0.0, body.radius, dt),
                CONTACT_SKIN,
            ));
        }
        proxies.push(ColliderProxy::new(
            ColliderOwner::Platform,
            self.platform.shape(),
            self.platform.pose(),
            motion_bound(
                self.platform.linear_velocity,
                self.platform.angular_velocity,
                self.platform.bounding_radius(),
                dt,
            ),
            CONTACT_SKIN,
        ));
        for (i, boundary) in self.boundaries.iter().enumerate() {
            proxies.push(ColliderProxy::new(
                ColliderOwner::Boundary(i),
                boundary.shape(),
                boundary.pose(),
                0.0,
                CONTACT_SKIN,
            ));
        }
        proxies
    }

    /// Solver slots: projectiles first (same indices as `bodies`), then the platform, then
    /// the boundaries.
    fn solver_bodies(&self) -> Vec<SolverBody> {
        let mut out = Vec::with_capacity(self.bodies.len() + 1 + self.boundaries.len());
        out.extend(self.bodies.iter().map(|b| {
            SolverBody::dynamic(b.position, b.velocity, b.angular_velocity, b.mass, b.inertia())
        }));
        out.push(SolverBody::kinematic(
            self.platform.position,
            self.platform.linear_velocity,
            self.platform.angular_velocity,
        ));
        out.extend(self.boundaries.iter().map(|b| SolverBody::fixed(b.center)));
        out
    }

    fn solver_index(&self, owner: ColliderOwner) -> usize {
        match owner {
            ColliderOwner::Free(i) => i,
            ColliderOwner::Platform => self.bodies.len(),
            ColliderOwner::Boundary(i) => self.bodies.len() + 1 + i,
        }
    }

    fn material_of(&self, owner: ColliderOwner) -> Material {
        match owner {
            ColliderOwner::Free(i) => self.bodies[i].material,
            ColliderOwner::Platform => self.platform.material,
            ColliderOwner::Boundary(i) => self.boundaries[i].material,
        }
    }

    fn solver_contact(&self, c: &ContactPoint) -> SolverContact {
        SolverContact {
            a: self.solver_index(c.a),
            b: self.solver_index(c.b),
            normal: c.normal,
            point: c.point.coords,
            dist: c.dist,
            material: self.material_of(c.a).combine(&self.material_of(c.b)),
        }
    }
}
