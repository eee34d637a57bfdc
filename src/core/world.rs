use crate::bodies::RigidBody;
use crate::collision::{collide, ContactSolver};
use crate::constraints::Joint;
use crate::core::{
    BodyHandle, BodyStorage, EventQueue, JointHandle, JointStorage, SimulationConfig, StepStats,
    Storage, WorldEvent,
};
use crate::math::{Vec2, EPSILON};
use crate::scene::SceneDef;
use crate::Result;

use std::collections::BTreeMap;
use std::time::Instant;

/// Hook invoked once per live contact manifold after the position solver.
/// It sees solver state read-only and cannot reach world topology.
pub type PostSolveHook = Box<dyn FnMut(&ContactSolver)>;

/// The space owns all bodies, joints and persistent contact manifolds and
/// advances them through fixed time steps.
///
/// Body and joint tables iterate in id order everywhere the solver touches
/// them; with identical inputs a step therefore produces identical outputs.
pub struct Space {
    /// All rigid bodies in the space
    bodies: BodyStorage<RigidBody>,

    /// All joints in the space
    joints: JointStorage<Box<dyn Joint>>,

    /// Persistent contact solvers, keyed by canonically-ordered shape ids
    contact_solvers: BTreeMap<(u32, u32), ContactSolver>,

    /// Configuration for the simulation
    config: SimulationConfig,

    /// Queue of world events
    events: EventQueue,

    /// Stats for the most recent step
    stats: StepStats,

    /// Number of completed steps; also the broad-phase pair watermark
    step_count: u64,

    /// Monotonic shape id counter, reset by `clear`
    next_shape_id: u32,

    post_solve: Option<PostSolveHook>,
}

impl Space {
    /// Creates a new space with default settings
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates a new space with the given configuration
    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            bodies: BodyStorage::new(),
            joints: JointStorage::new(),
            contact_solvers: BTreeMap::new(),
            config,
            events: EventQueue::new(),
            stats: StepStats::default(),
            step_count: 0,
            next_shape_id: 1,
            post_solve: None,
        }
    }

    /// Returns a reference to the simulation configuration
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Returns a mutable reference to the simulation configuration
    pub fn config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    /// Sets the gravity for the simulation
    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
    }

    /// Returns the current gravity
    pub fn gravity(&self) -> Vec2 {
        self.config.gravity
    }

    /// Returns the number of completed steps
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Returns the stats of the most recent step
    pub fn stats(&self) -> &StepStats {
        &self.stats
    }

    /// Returns a reference to the event queue
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Returns a mutable reference to the event queue (for draining)
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Registers the post-solve hook, replacing any previous one
    pub fn set_post_solve<F>(&mut self, hook: F)
    where
        F: FnMut(&ContactSolver) + 'static,
    {
        self.post_solve = Some(Box::new(hook));
    }

    /// Removes the post-solve hook
    pub fn clear_post_solve(&mut self) {
        self.post_solve = None;
    }

    /// Adds a rigid body to the space and returns its handle
    pub fn add_body(&mut self, mut body: RigidBody) -> BodyHandle {
        for shape in &mut body.shapes {
            if shape.id == 0 {
                shape.id = self.next_shape_id;
                self.next_shape_id += 1;
            }
        }
        body.sync_transform();
        body.cache_data();

        let handle = self.bodies.add(body);
        self.events.push(WorldEvent::BodyAdded(handle));
        handle
    }

    /// Removes a rigid body; all joints attached to it are removed as well
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody> {
        let joint_handles: Vec<JointHandle> =
            self.bodies.get_body(handle)?.joint_handles().collect();
        for jh in joint_handles {
            let _ = self.remove_joint(jh);
        }

        self.contact_solvers
            .retain(|_, s| s.body1 != handle && s.body2 != handle);

        self.events.push(WorldEvent::BodyRemoved(handle));
        Ok(self.bodies.remove(handle).unwrap())
    }

    /// Gets a reference to a rigid body by its handle
    pub fn get_body(&self, handle: BodyHandle) -> Result<&RigidBody> {
        self.bodies.get_body(handle)
    }

    /// Gets a mutable reference to a rigid body by its handle
    pub fn get_body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody> {
        self.bodies.get_body_mut(handle)
    }

    /// Iterates bodies in id order
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.bodies.iter()
    }

    /// Returns the number of bodies in the space
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Adds a joint and wakes both endpoints
    pub fn add_joint(&mut self, joint: Box<dyn Joint>) -> JointHandle {
        let endpoints = [joint.body1(), joint.body2()];
        let handle = self.joints.add(joint);

        for h in endpoints {
            if let Some(body) = self.bodies.get_mut(h) {
                body.joints.insert(handle);
                let was_asleep = !body.is_awake() && !body.is_static();
                body.set_awake(true);
                if was_asleep {
                    self.events.push(WorldEvent::BodyWoke(h));
                }
            }
        }
        handle
    }

    /// Removes a joint and wakes both endpoints
    pub fn remove_joint(&mut self, handle: JointHandle) -> Result<Box<dyn Joint>> {
        let joint = self.joints.get_joint(handle)?;
        let endpoints = [joint.body1(), joint.body2()];

        for h in endpoints {
            if let Some(body) = self.bodies.get_mut(h) {
                body.joints.remove(&handle);
                body.set_awake(true);
            }
        }
        Ok(self.joints.remove(handle).unwrap())
    }

    /// Gets a reference to a joint by its handle
    pub fn get_joint(&self, handle: JointHandle) -> Result<&Box<dyn Joint>> {
        self.joints.get_joint(handle)
    }

    /// Gets a mutable reference to a joint by its handle
    pub fn get_joint_mut(&mut self, handle: JointHandle) -> Result<&mut Box<dyn Joint>> {
        self.joints.get_joint_mut(handle)
    }

    /// Iterates joints in id order
    pub fn joints(&self) -> impl Iterator<Item = (JointHandle, &Box<dyn Joint>)> {
        self.joints.iter()
    }

    /// Returns the number of joints in the space
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Iterates the live contact manifolds
    pub fn contact_solvers(&self) -> impl Iterator<Item = &ContactSolver> {
        self.contact_solvers.values()
    }

    /// Clears the space of all bodies, joints, manifolds and events, and
    /// resets the id counters
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.joints.clear();
        self.contact_solvers.clear();
        self.events.clear();
        self.stats = StepStats::default();
        self.step_count = 0;
        self.next_shape_id = 1;
    }

    /// Finds the shape containing a world point
    pub fn find_shape_by_point(&self, p: Vec2) -> Option<(BodyHandle, u32)> {
        for (handle, body) in self.bodies.iter() {
            for shape in body.shapes() {
                if shape.aabb().contains_point(p) && shape.contains_point(p) {
                    return Some((handle, shape.id()));
                }
            }
        }
        None
    }

    /// Finds a shape vertex within `slop` of a world point
    pub fn find_vertex_by_point(&self, p: Vec2, slop: f32) -> Option<(BodyHandle, u32, usize)> {
        for (handle, body) in self.bodies.iter() {
            for shape in body.shapes() {
                if let Some(index) = shape.find_vertex(p, slop) {
                    return Some((handle, shape.id(), index));
                }
            }
        }
        None
    }

    /// Finds a shape edge within `slop` of a world point
    pub fn find_edge_by_point(&self, p: Vec2, slop: f32) -> Option<(BodyHandle, u32, usize)> {
        for (handle, body) in self.bodies.iter() {
            for shape in body.shapes() {
                if let Some(index) = shape.find_edge(p, slop) {
                    return Some((handle, shape.id(), index));
                }
            }
        }
        None
    }

    /// Finds a joint whose world anchor lies within `slop` of a point
    pub fn find_joint_by_point(&self, p: Vec2, slop: f32) -> Option<JointHandle> {
        for (handle, joint) in self.joints.iter() {
            if joint.anchor1(&self.bodies).distance(&p) <= slop
                || joint.anchor2(&self.bodies).distance(&p) <= slop
            {
                return Some(handle);
            }
        }
        None
    }

    /// Serializes the current space into a scene definition
    pub fn to_scene(&self) -> SceneDef {
        crate::scene::to_scene(self)
    }

    /// Serializes the current space to a JSON string
    pub fn to_json(&self) -> Result<String> {
        self.to_scene().to_json()
    }

    /// Clears the space and rebuilds it from a scene definition. On failure
    /// the space is left cleared.
    pub fn load_scene(&mut self, scene: &SceneDef) -> Result<()> {
        self.clear();
        if let Err(err) = crate::scene::populate(self, scene) {
            self.clear();
            return Err(err);
        }
        Ok(())
    }

    /// Clears the space and rebuilds it from scene JSON. On failure the
    /// space is left cleared.
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let scene = match SceneDef::from_json(json) {
            Ok(scene) => scene,
            Err(err) => {
                self.clear();
                return Err(err);
            }
        };
        self.load_scene(&scene)
    }

    /// Advances the simulation by one fixed step.
    ///
    /// The stage order is a contract: collision, solver init, warm start,
    /// force integration, joint wake propagation, velocity solve (joints
    /// before contacts), position integration, joint breakage, position
    /// solve (contacts before joints), transform sync, post-solve hook,
    /// sleep accounting.
    pub fn step(
        &mut self,
        dt: f32,
        vel_iterations: u32,
        pos_iterations: u32,
        warm_starting: bool,
        allow_sleep: bool,
    ) {
        let dt_inv = if dt > EPSILON { 1.0 / dt } else { 0.0 };
        self.step_count += 1;
        self.assign_shape_ids();
        let config = self.config.clone();

        // Broad phase and manifold regeneration
        let timer = Instant::now();
        self.regenerate_contacts();
        let collision_time = timer.elapsed();

        // Solver init and warm starting
        let timer = Instant::now();
        for solver in self.contact_solvers.values_mut() {
            if let Some((b1, b2)) = self.bodies.get_pair_mut(solver.body1, solver.body2) {
                solver.init(b1, b2, &config, warm_starting);
            }
        }
        let joint_handles = self.joints.handles();
        for &jh in &joint_handles {
            if let Some(joint) = self.joints.get_mut(jh) {
                joint.init_solver(&mut self.bodies, &config, dt, warm_starting);
            }
        }
        if warm_starting {
            for solver in self.contact_solvers.values_mut() {
                if let Some((b1, b2)) = self.bodies.get_pair_mut(solver.body1, solver.body2) {
                    solver.warm_start(b1, b2);
                }
            }
        }
        let init_time = timer.elapsed();

        // Integrate external forces into velocities
        let damping = config.damping.powf(dt);
        for (_, body) in self.bodies.iter_mut() {
            body.update_velocity(config.gravity, damping, dt);
        }

        // Joint wake propagation: one active endpoint wakes the other
        for &jh in &joint_handles {
            let Some(joint) = self.joints.get(jh) else {
                continue;
            };
            let (h1, h2) = (joint.body1(), joint.body2());
            let active1 = self
                .bodies
                .get(h1)
                .is_some_and(|b| b.is_awake() && !b.is_static());
            let active2 = self
                .bodies
                .get(h2)
                .is_some_and(|b| b.is_awake() && !b.is_static());
            if active1 != active2 {
                let target = if active1 { h2 } else { h1 };
                if let Some(body) = self.bodies.get_mut(target) {
                    if !body.is_awake() && !body.is_static() {
                        body.set_awake(true);
                        self.events.push(WorldEvent::BodyWoke(target));
                    }
                }
            }
        }

        // Velocity solver: joints first, then contacts
        let timer = Instant::now();
        for _ in 0..vel_iterations {
            for &jh in &joint_handles {
                if let Some(joint) = self.joints.get_mut(jh) {
                    joint.solve_velocity(&mut self.bodies);
                }
            }
            for solver in self.contact_solvers.values_mut() {
                if let Some((b1, b2)) = self.bodies.get_pair_mut(solver.body1, solver.body2) {
                    solver.solve_velocity(b1, b2);
                }
            }
        }
        let velocity_time = timer.elapsed();

        // Integrate velocities into positions
        for (_, body) in self.bodies.iter_mut() {
            body.update_position(dt);
        }

        // Breakable joints
        let mut broken = Vec::new();
        for &jh in &joint_handles {
            if let Some(joint) = self.joints.get(jh) {
                let max_force = joint.max_force();
                if joint.is_breakable()
                    && joint.reaction_force(dt_inv).length_squared() >= max_force * max_force
                {
                    broken.push(jh);
                }
            }
        }
        let joints_broken = broken.len();
        for jh in broken {
            let _ = self.remove_joint(jh);
            self.events.push(WorldEvent::JointBroken(jh));
        }

        // Position solver: contacts first, then joints; early exit once
        // everything reports its error below slop
        let timer = Instant::now();
        let joint_handles = self.joints.handles();
        let mut position_solved = true;
        let mut position_iterations = 0;
        for _ in 0..pos_iterations {
            position_iterations += 1;
            let mut solved = true;
            for solver in self.contact_solvers.values_mut() {
                if let Some((b1, b2)) = self.bodies.get_pair_mut(solver.body1, solver.body2) {
                    solved &= solver.solve_position(b1, b2, &config);
                }
            }
            for &jh in &joint_handles {
                if let Some(joint) = self.joints.get_mut(jh) {
                    solved &= joint.solve_position(&mut self.bodies, &config);
                }
            }
            position_solved = solved;
            if solved {
                break;
            }
        }
        let position_time = timer.elapsed();

        // Sync transforms and recache world geometry for bodies that moved
        for (_, body) in self.bodies.iter_mut() {
            if !body.is_static() && body.is_awake() {
                body.sync_transform();
                body.cache_data();
            }
        }

        // Post-solve hook
        if let Some(hook) = self.post_solve.as_mut() {
            for solver in self.contact_solvers.values() {
                hook(solver);
            }
        }

        // Sleep accounting: the whole dynamic population sleeps together
        // once the slowest body has been quiet long enough
        if allow_sleep {
            let lin_tol_sq = config.sleep_linear_tolerance * config.sleep_linear_tolerance;
            let ang_tol_sq = config.sleep_angular_tolerance * config.sleep_angular_tolerance;
            let mut min_sleep = f32::MAX;
            let mut any_dynamic = false;

            for (_, body) in self.bodies.iter_mut() {
                if !body.is_dynamic() {
                    continue;
                }
                any_dynamic = true;
                let w = body.angular_velocity();
                if !body.can_sleep()
                    || w * w > ang_tol_sq
                    || body.linear_velocity().length_squared() > lin_tol_sq
                {
                    body.sleeping_time = 0.0;
                    min_sleep = 0.0;
                } else {
                    body.sleeping_time += dt;
                    min_sleep = min_sleep.min(body.sleeping_time);
                }
            }

            if any_dynamic && position_solved && min_sleep >= config.time_to_sleep {
                for handle in self.bodies.handles() {
                    if let Some(body) = self.bodies.get_mut(handle) {
                        if body.is_dynamic() && body.is_awake() {
                            body.set_awake(false);
                            self.events.push(WorldEvent::BodySlept(handle));
                        }
                    }
                }
            }
        }

        self.stats = StepStats {
            collision_time,
            init_time,
            velocity_time,
            position_time,
            position_iterations,
            position_solved,
            contacts: self.contact_solvers.values().map(|s| s.contacts().len()).sum(),
            bodies: self.bodies.len(),
            joints: self.joints.len(),
            joints_broken,
        };
    }

    /// Assigns ids to shapes attached after their body entered the space
    fn assign_shape_ids(&mut self) {
        for handle in self.bodies.handles() {
            if let Some(body) = self.bodies.get_mut(handle) {
                for shape in &mut body.shapes {
                    if shape.id == 0 {
                        shape.id = self.next_shape_id;
                        self.next_shape_id += 1;
                    }
                }
            }
        }
    }

    /// O(N^2) broad phase plus narrow phase: rebuilds the manifold table,
    /// reusing solvers (and their accumulators) for pairs that recollided
    fn regenerate_contacts(&mut self) {
        let handles = self.bodies.handles();
        let mut new_solvers = BTreeMap::new();
        let mut fresh_pairs: Vec<(BodyHandle, BodyHandle)> = Vec::new();

        for &h1 in &handles {
            if let Some(body) = self.bodies.get_mut(h1) {
                body.step_mark = self.step_count;
            }

            for &h2 in &handles {
                let (Some(b1), Some(b2)) = (self.bodies.get(h1), self.bodies.get(h2)) else {
                    continue;
                };
                // The watermark visits each unordered pair exactly once
                if b2.step_mark == self.step_count {
                    continue;
                }

                let inactive1 = !b1.is_awake() || b1.is_static();
                let inactive2 = !b2.is_awake() || b2.is_static();
                if inactive1 && inactive2 {
                    continue;
                }
                if !Self::pair_collidable(b1, b2, h2, &self.joints) {
                    continue;
                }
                if !b1.aabb().overlaps(b2.aabb()) {
                    continue;
                }

                for s1 in b1.shapes() {
                    for s2 in b2.shapes() {
                        let (sa, sb, ha, hb) = if s1.kind() <= s2.kind() {
                            (s1, s2, h1, h2)
                        } else {
                            (s2, s1, h2, h1)
                        };
                        if !sa.aabb().overlaps(sb.aabb()) {
                            continue;
                        }

                        let contacts = collide(sa, sb);
                        if contacts.is_empty() {
                            continue;
                        }

                        let key = (sa.id(), sb.id());
                        match self.contact_solvers.remove(&key) {
                            Some(mut solver) => {
                                solver.update(contacts);
                                new_solvers.insert(key, solver);
                            }
                            None => {
                                let restitution = sa
                                    .material
                                    .restitution
                                    .max(sb.material.restitution);
                                let friction =
                                    (sa.material.friction * sb.material.friction).sqrt();
                                new_solvers.insert(
                                    key,
                                    ContactSolver::new(
                                        ha, hb, sa.id(), sb.id(), friction, restitution, contacts,
                                    ),
                                );
                                fresh_pairs.push((ha, hb));
                            }
                        }
                    }
                }
            }
        }

        self.contact_solvers = new_solvers;

        // Emergent contacts wake both bodies
        for (h1, h2) in fresh_pairs {
            for h in [h1, h2] {
                if let Some(body) = self.bodies.get_mut(h) {
                    if !body.is_awake() && !body.is_static() {
                        body.set_awake(true);
                        self.events.push(WorldEvent::BodyWoke(h));
                    }
                }
            }
        }
    }

    /// Two bodies can collide iff at least one is dynamic, their filters
    /// accept each other, and no joint with collide_connected = false links
    /// them
    fn pair_collidable(
        b1: &RigidBody,
        b2: &RigidBody,
        h2: BodyHandle,
        joints: &JointStorage<Box<dyn Joint>>,
    ) -> bool {
        if !b1.is_dynamic() && !b2.is_dynamic() {
            return false;
        }
        if !b1.filter.accepts(&b2.filter) {
            return false;
        }
        for jh in b1.joint_handles() {
            if let Some(joint) = joints.get(jh) {
                if !joint.collide_connected() && joint.involves_body(h2) {
                    return false;
                }
            }
        }
        true
    }
}

impl Default for Space {
    fn default() -> Self {
        Self::new()
    }
}
