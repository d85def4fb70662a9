use crate::config::{Config, SnapshotConfig};
use crate::control::{Airframe, ControllerState, MotorCommand, PidController};
use crate::motor::{Motors, MOTOR_COUNT};
use crate::search::{find_with_field, has_field};
use crate::snapshot;
use crate::types::{Field, ObjectHandle, Parts};
use crate::{Result, Scene};

/// A quadcopter assembled from a tagged scene object tree.
#[derive(Debug, Clone)]
pub struct Quadcopter {
    obj: ObjectHandle,
    unique_id: i32,
    body: ObjectHandle,
    target: ObjectHandle,
    camera_down: ObjectHandle,
    camera_front: ObjectHandle,
    motors: Motors,
    controller: PidController,
    snapshot: SnapshotConfig,
}

impl Quadcopter {
    /// Return true if `obj` is the root of a quadcopter.
    pub fn query(scene: &dyn Scene, obj: ObjectHandle) -> bool {
        match has_field(scene, obj, Field::Quadcopter) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("reading custom data of {:?} failed: {}", obj, e);
                false
            }
        }
    }

    /// Resolve the parts of the quadcopter rooted at `obj`.
    ///
    /// Parts that cannot be found are left as [`ObjectHandle::NONE`]. Only a
    /// failed unique-identifier lookup on `obj` itself is fatal.
    pub fn new(scene: &dyn Scene, obj: ObjectHandle, config: Config) -> Result<Quadcopter> {
        let unique_id = scene.unique_id(obj)?;

        let find = |field: Field| match find_with_field(scene, obj, field) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("searching quadcopter {} for {:?} failed: {}", unique_id, field, e);
                ObjectHandle::NONE
            }
        };

        let body = find(Field::Body);
        let target = find(Field::Target);
        let camera_down = find(Field::CameraDown);
        let camera_front = find(Field::CameraFront);
        let mut motors = Motors::default();
        for (slot, field) in motors.0.iter_mut().zip(Field::MOTORS) {
            *slot = find(field);
        }

        let quad = Quadcopter {
            obj,
            unique_id,
            body,
            target,
            camera_down,
            camera_front,
            motors,
            controller: PidController::new(config.gains),
            snapshot: config.snapshot,
        };
        quad.report(scene);
        Ok(quad)
    }

    fn report(&self, scene: &dyn Scene) {
        log::info!("--- Found Quadcopter {}:", self.unique_id);
        let label = |name: &str, obj: ObjectHandle| {
            let resolved = if obj.is_none() {
                None
            } else {
                scene.object_name(obj)
            };
            match resolved {
                Some(n) => log::info!("{:<12} id {} name '{}'", name, obj.0, n),
                None => log::info!("{:<12} id {}", name, obj.0),
            }
        };
        label("Quadcopter:", self.obj);
        label("Body:", self.body);
        label("Target:", self.target);
        for (i, m) in self.motors.0.iter().enumerate() {
            label(&format!("Motor #{}:", i + 1), *m);
        }
        label("Floor Cam:", self.camera_down);
        label("Front Cam:", self.camera_front);

        let missing = Parts::all().difference(self.resolved());
        if !missing.is_empty() {
            log::warn!("quadcopter {} missing parts: {:?}", self.unique_id, missing);
        }
    }

    pub fn handle(&self) -> ObjectHandle {
        self.obj
    }

    pub fn unique_id(&self) -> i32 {
        self.unique_id
    }

    pub fn body(&self) -> ObjectHandle {
        self.body
    }

    pub fn target(&self) -> ObjectHandle {
        self.target
    }

    pub fn camera_down(&self) -> ObjectHandle {
        self.camera_down
    }

    pub fn camera_front(&self) -> ObjectHandle {
        self.camera_front
    }

    pub fn motor(&self, n: usize) -> ObjectHandle {
        self.motors.handle(n)
    }

    pub fn state(&self) -> &ControllerState {
        self.controller.state()
    }

    /// Which parts were found during assembly.
    pub fn resolved(&self) -> Parts {
        let mut parts = Parts::empty();
        parts.set(Parts::BODY, self.body.is_some());
        parts.set(Parts::TARGET, self.target.is_some());
        parts.set(Parts::CAMERA_DOWN, self.camera_down.is_some());
        parts.set(Parts::CAMERA_FRONT, self.camera_front.is_some());
        for i in 0..MOTOR_COUNT {
            parts.set(Parts::motor(i), self.motors.handle(i).is_some());
        }
        parts
    }

    pub fn simulation_started(&mut self) {
        log::info!("quadcopter {} simulation started", self.unique_id);
        self.controller.reset();
    }

    pub fn simulation_stopped(&mut self) {
        log::info!("quadcopter {} simulation stopped", self.unique_id);
    }

    /// Run one control tick. Failures are logged and the tick is skipped.
    pub fn simulation_stepped(&mut self, scene: &dyn Scene) {
        if let Some(command) = self.pid_control(scene) {
            log::trace!("quadcopter {} motors {:?}", self.unique_id, command);
            for (n, v) in command.iter().enumerate() {
                self.set_motor_particle_velocity(scene, n, *v);
            }
        }

        if self.snapshot.enabled {
            self.save_snapshot(scene);
        }
    }

    fn pid_control(&mut self, scene: &dyn Scene) -> Option<MotorCommand> {
        if !self.resolved().contains(Parts::FLIGHT) {
            log::debug!(
                "quadcopter {} control disabled: body {:?}, target {:?}",
                self.unique_id,
                self.body,
                self.target
            );
            return None;
        }

        let frame = Airframe {
            root: self.obj,
            body: self.body,
            target: self.target,
        };
        match self.controller.step(scene, &frame) {
            Ok(command) => Some(command),
            Err(e) => {
                log::warn!("quadcopter {} tick aborted: {}", self.unique_id, e);
                None
            }
        }
    }

    fn save_snapshot(&mut self, scene: &dyn Scene) {
        if self.camera_down.is_none() {
            return;
        }
        let now = scene.simulation_time();
        let state = self.controller.state_mut();
        if now - state.last_save_time <= self.snapshot.interval_s {
            return;
        }
        state.last_save_time = now;

        let filename = format!("cam{}_{}.ppm", self.obj.0, now as i32);
        let path = self.snapshot.dir.join(filename);
        if let Err(e) = snapshot::write_camera_ppm(scene, self.camera_down, &path) {
            log::warn!("saving image failed: {}", e);
        }
    }

    pub fn set_motor_particle_velocity(&self, scene: &dyn Scene, n: usize, v: f32) {
        self.motors.set_particle_velocity(scene, n, v);
    }

    pub fn motor_particle_velocity(&self, scene: &dyn Scene, n: usize) -> Result<f32> {
        self.motors.particle_velocity(scene, n)
    }
}
