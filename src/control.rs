//! PID control that follows the quadcopter's target object.
//!
//! Each step combines three loops:
//! - vertical: altitude error with velocity damping, giving a common thrust
//! - horizontal: body tilt (from the world-z component of the body's local
//!   X/Y axes) plus the target's offset in the body frame
//! - rotational: yaw of the body relative to the target
//!
//! and mixes them into four motor velocities through a [`MotorLayout`].
//!
//! [`MotorLayout`]: crate::config::MotorLayout

use crate::config::Gains;
use crate::types::{ObjectHandle, Vec3};
use crate::{Result, Scene};

const UNIT_X: Vec3 = [1.0, 0.0, 0.0];
const UNIT_Y: Vec3 = [0.0, 1.0, 0.0];

/// Motor velocity commands, index `k` for motor `k`.
pub type MotorCommand = [f32; 4];

/// Frame-to-frame controller memory.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerState {
    /// Accumulated vertical error.
    pub cumulative_error: f32,
    pub last_error: f32,
    pub prev_alpha_error: f32,
    pub prev_beta_error: f32,
    /// Target offset in the body frame, `[x, y]`.
    pub prev_offset: [f32; 2],
    pub prev_yaw: f32,
    /// Simulation time of the last camera snapshot.
    pub last_save_time: f32,
}

impl ControllerState {
    pub fn reset(&mut self) {
        *self = ControllerState::default();
    }
}

/// Scene objects a control step reads.
#[derive(Debug, Clone, Copy)]
pub struct Airframe {
    /// The quadcopter root; its velocity damps the vertical loop.
    pub root: ObjectHandle,
    pub body: ObjectHandle,
    pub target: ObjectHandle,
}

#[derive(Debug, Clone)]
pub struct PidController {
    gains: Gains,
    state: ControllerState,
}

impl PidController {
    pub fn new(gains: Gains) -> Self {
        Self {
            gains,
            state: ControllerState::default(),
        }
    }

    pub fn gains(&self) -> &Gains {
        &self.gains
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut ControllerState {
        &mut self.state
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Compute one tick of motor commands.
    ///
    /// All scene queries run before any state changes. If one fails the
    /// error is returned and the controller state is left untouched.
    pub fn step(&mut self, scene: &dyn Scene, frame: &Airframe) -> Result<MotorCommand> {
        let g = &self.gains;
        let prev = self.state;
        let mut next = prev;
        let body = frame.body;

        // Vertical control
        let target_pos = scene.object_position(frame.target, ObjectHandle::NONE)?;
        let pos = scene.object_position(body, ObjectHandle::NONE)?;
        let vel = scene.object_velocity(frame.root)?;

        let error = target_pos[2] - pos[2];
        next.cumulative_error = prev.cumulative_error + error;
        let thrust = g.hover_thrust
            + g.p * error
            + g.i * next.cumulative_error
            + g.d * (error - prev.last_error)
            + vel[2] * g.v;
        next.last_error = error;

        // Horizontal control
        let sp = scene.object_position(frame.target, body)?;
        let m = scene.object_matrix(body, ObjectHandle::NONE)?;
        let vx = scene.transform_vector(&m, UNIT_X)?;
        let vy = scene.transform_vector(&m, UNIT_Y)?;

        let alpha_error = vy[2] - m.0[11];
        let beta_error = vx[2] - m.0[11];
        let mut alpha_corr =
            g.tilt_p * alpha_error + g.tilt_d * (alpha_error - prev.prev_alpha_error);
        let mut beta_corr =
            -g.tilt_p * beta_error - g.tilt_d * (beta_error - prev.prev_beta_error);
        next.prev_alpha_error = alpha_error;
        next.prev_beta_error = beta_error;

        alpha_corr += sp[1] * g.offset_p + g.offset_d * (sp[1] - prev.prev_offset[1]);
        beta_corr -= sp[0] * g.offset_p + g.offset_d * (sp[0] - prev.prev_offset[0]);
        next.prev_offset = [sp[0], sp[1]];

        // Rotational control
        let euler = scene.object_orientation(body, frame.target)?;
        let rot_corr = euler[2] * g.yaw_p + g.yaw_d * (euler[2] - prev.prev_yaw);
        next.prev_yaw = euler[2];

        let mut command = [0.0; 4];
        for (k, out) in command.iter_mut().enumerate() {
            let [sa, sb, sr] = g.layout.signs(k);
            *out = thrust * (1.0 + sa * alpha_corr + sb * beta_corr + sr * rot_corr);
        }

        self.state = next;
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryScene;
    use crate::QuadcopterError;

    fn airframe(scene: &mut MemoryScene) -> Airframe {
        let root = scene.add_object("quad", ObjectHandle::NONE);
        let body = scene.add_object("body", root);
        let target = scene.add_object("target", ObjectHandle::NONE);
        Airframe { root, body, target }
    }

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
    }

    #[test]
    fn test_vertical_only() {
        let mut scene = MemoryScene::new();
        let frame = airframe(&mut scene);
        scene.set_position(frame.body, [0.0, 0.0, 0.0]);
        scene.set_position(frame.target, [0.0, 0.0, 1.0]);

        let mut pid = PidController::new(Gains::default());
        let command = pid.step(&scene, &frame).unwrap();
        for v in command {
            assert_close(v, 6.335);
        }
        assert_close(pid.state().last_error, 1.0);
        assert_close(pid.state().cumulative_error, 1.0);
        assert_eq!(pid.state().prev_offset, [0.0, 0.0]);
    }

    #[test]
    fn test_velocity_damping() {
        let mut scene = MemoryScene::new();
        let frame = airframe(&mut scene);
        scene.set_velocity(frame.root, [0.0, 0.0, 0.5]);

        let mut pid = PidController::new(Gains::default());
        let command = pid.step(&scene, &frame).unwrap();
        assert_close(command[0], 5.335 - 1.0);
    }

    #[test]
    fn test_integral_accumulates_across_ticks() {
        let mut scene = MemoryScene::new();
        let frame = airframe(&mut scene);
        scene.set_position(frame.target, [0.0, 0.0, 2.0]);

        let gains = Gains {
            i: 0.5,
            d: 0.25,
            ..Gains::default()
        };
        let mut pid = PidController::new(gains);
        pid.step(&scene, &frame).unwrap();
        scene.set_position(frame.body, [0.0, 0.0, 1.0]);
        let command = pid.step(&scene, &frame).unwrap();

        // error 1, integral 3, derivative -1
        assert_close(pid.state().cumulative_error, 3.0);
        assert_close(command[0], 5.335 + 1.0 + 0.5 * 3.0 + 0.25 * -1.0);
    }

    #[test]
    fn test_lateral_offset_mixes_against_layout() {
        let mut scene = MemoryScene::new();
        let frame = airframe(&mut scene);
        scene.set_position(frame.target, [0.0, 1.0, 0.0]);

        let mut pid = PidController::new(Gains::default());
        let command = pid.step(&scene, &frame).unwrap();

        // alpha_corr = 0.005 + 1.0, beta and yaw zero
        let alpha = 1.005;
        assert_close(command[0], 5.335 * (1.0 - alpha));
        assert_close(command[1], 5.335 * (1.0 - alpha));
        assert_close(command[2], 5.335 * (1.0 + alpha));
        assert_close(command[3], 5.335 * (1.0 + alpha));

        // Holding still, only the proportional part remains.
        let command = pid.step(&scene, &frame).unwrap();
        assert_close(command[2], 5.335 * (1.0 + 0.005));
    }

    #[test]
    fn test_yaw_error() {
        let mut scene = MemoryScene::new();
        let frame = airframe(&mut scene);
        scene.set_pose(frame.target, [0.0, 0.0, 0.0], [0.0, 0.0, -0.2]);

        let mut pid = PidController::new(Gains::default());
        let command = pid.step(&scene, &frame).unwrap();

        // body yaw relative to target is +0.2
        let rot = 0.2 * 0.1 + 2.0 * 0.2;
        assert_close(pid.state().prev_yaw, 0.2);
        assert_close(command[0], 5.335 * (1.0 + rot));
        assert_close(command[1], 5.335 * (1.0 - rot));
    }

    #[test]
    fn test_tilt_uses_axis_z_components() {
        let mut scene = MemoryScene::new();
        let frame = airframe(&mut scene);
        // Roll about the body X axis lifts the local Y axis out of plane.
        let roll = 0.1f32;
        scene.set_pose(frame.body, [0.0, 0.0, 3.0], [roll, 0.0, 0.0]);
        scene.set_position(frame.target, [0.0, 0.0, 3.0]);

        let mut pid = PidController::new(Gains::default());
        pid.step(&scene, &frame).unwrap();

        assert_close(pid.state().prev_alpha_error, roll.sin());
        assert_close(pid.state().prev_beta_error, 0.0);
    }

    #[test]
    fn test_failed_query_leaves_state() {
        let mut scene = MemoryScene::new();
        let frame = airframe(&mut scene);
        scene.set_position(frame.target, [0.5, -0.5, 1.0]);

        let mut pid = PidController::new(Gains::default());
        pid.step(&scene, &frame).unwrap();
        let before = *pid.state();

        for call in ["object_velocity", "object_matrix", "transform_vector", "object_orientation"] {
            scene.fail_call(call);
            scene.set_position(frame.body, [0.0, 0.0, -4.0]);
            let err = pid.step(&scene, &frame).unwrap_err();
            assert!(matches!(err, QuadcopterError::SceneCall(c) if c == call));
            assert_eq!(*pid.state(), before);
            scene.clear_failures();
        }
    }

    #[test]
    fn test_reset_clears_history() {
        let mut scene = MemoryScene::new();
        let frame = airframe(&mut scene);
        scene.set_pose(frame.target, [1.0, 2.0, 3.0], [0.0, 0.0, 0.4]);

        let mut pid = PidController::new(Gains::default());
        for _ in 0..5 {
            pid.step(&scene, &frame).unwrap();
        }
        pid.state_mut().last_save_time = 7.0;
        assert_ne!(*pid.state(), ControllerState::default());

        pid.reset();
        assert_eq!(*pid.state(), ControllerState::default());
    }
}
