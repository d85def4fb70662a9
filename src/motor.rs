use crate::types::ObjectHandle;
use crate::{QuadcopterError, Result, Scene};

/// Script parameter that drives a motor's particle velocity.
pub const PARTICLE_VELOCITY: &str = "particleVelocity";

pub const MOTOR_COUNT: usize = 4;

/// The four motor objects, addressed by position index `0..4`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Motors(pub [ObjectHandle; MOTOR_COUNT]);

impl Motors {
    pub fn handle(&self, n: usize) -> ObjectHandle {
        self.0.get(n).copied().unwrap_or(ObjectHandle::NONE)
    }

    /// Write a velocity command to motor `n`'s script.
    ///
    /// Commands for an invalid index, an unresolved motor, or a motor without
    /// a script are dropped.
    pub fn set_particle_velocity(&self, scene: &dyn Scene, n: usize, v: f32) {
        let obj = self.handle(n);
        if obj.is_none() {
            log::debug!("motor #{} not resolved, dropping velocity {}", n, v);
            return;
        }

        let Some(script) = scene.script_for_object(obj) else {
            log::debug!("motor #{} ({:?}) has no script", n, obj);
            return;
        };

        let text = v.to_string();
        if let Err(e) = scene.set_script_parameter(script, PARTICLE_VELOCITY, text.as_bytes()) {
            log::warn!("setting motor #{} velocity failed: {}", n, e);
        }
    }

    /// Read back motor `n`'s velocity.
    ///
    /// Returns 0.0 when the motor, its script, or the parameter is missing.
    /// Text that does not parse as a number is an error.
    pub fn particle_velocity(&self, scene: &dyn Scene, n: usize) -> Result<f32> {
        let obj = self.handle(n);
        if obj.is_none() {
            log::debug!("motor #{} not resolved", n);
            return Ok(0.0);
        }

        let Some(script) = scene.script_for_object(obj) else {
            log::warn!("getting motor #{} script failed", n);
            return Ok(0.0);
        };

        let Some(text) = scene.script_parameter(script, PARTICLE_VELOCITY) else {
            log::warn!("getting motor #{} velocity failed", n);
            return Ok(0.0);
        };

        text.trim()
            .parse::<f32>()
            .map_err(|source| QuadcopterError::ParameterParse { text, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryScene;

    fn motors_with_scripts(scene: &mut MemoryScene) -> Motors {
        let mut handles = [ObjectHandle::NONE; MOTOR_COUNT];
        for (i, h) in handles.iter_mut().enumerate() {
            *h = scene.add_object(&format!("motor{}", i), ObjectHandle::NONE);
            scene.attach_script(*h);
        }
        Motors(handles)
    }

    #[test]
    fn test_round_trip_through_script() {
        let mut scene = MemoryScene::new();
        let motors = motors_with_scripts(&mut scene);
        motors.set_particle_velocity(&scene, 1, 6.335);
        assert_eq!(motors.particle_velocity(&scene, 1).unwrap(), 6.335);
        assert_eq!(motors.particle_velocity(&scene, 0).unwrap(), 0.0);

        let script = scene.script_for_object(motors.handle(1)).unwrap();
        assert_eq!(
            scene.parameter_text(script, PARTICLE_VELOCITY).as_deref(),
            Some("6.335")
        );
    }

    #[test]
    fn test_unresolved_motor_is_noop() {
        let mut scene = MemoryScene::new();
        let mut motors = motors_with_scripts(&mut scene);
        motors.0[2] = ObjectHandle::NONE;

        motors.set_particle_velocity(&scene, 2, 3.0);
        assert_eq!(scene.parameter_writes(), 0);
        assert_eq!(motors.particle_velocity(&scene, 2).unwrap(), 0.0);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut scene = MemoryScene::new();
        let motors = motors_with_scripts(&mut scene);
        motors.set_particle_velocity(&scene, 4, 1.0);
        assert_eq!(scene.parameter_writes(), 0);
        assert_eq!(motors.particle_velocity(&scene, 9).unwrap(), 0.0);
    }

    #[test]
    fn test_motor_without_script() {
        let mut scene = MemoryScene::new();
        let bare = scene.add_object("bare", ObjectHandle::NONE);
        let motors = Motors([bare; MOTOR_COUNT]);
        motors.set_particle_velocity(&scene, 0, 1.0);
        assert_eq!(scene.parameter_writes(), 0);
        assert_eq!(motors.particle_velocity(&scene, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_failed_write_is_dropped() {
        let mut scene = MemoryScene::new();
        let motors = motors_with_scripts(&mut scene);
        scene.fail_call("set_script_parameter");
        motors.set_particle_velocity(&scene, 0, 1.0);
        assert_eq!(scene.parameter_writes(), 0);
    }

    #[test]
    fn test_non_numeric_parameter() {
        let mut scene = MemoryScene::new();
        let motors = motors_with_scripts(&mut scene);
        let script = scene.script_for_object(motors.handle(3)).unwrap();
        scene
            .set_script_parameter(script, PARTICLE_VELOCITY, b"fast")
            .unwrap();
        assert!(matches!(
            motors.particle_velocity(&scene, 3),
            Err(QuadcopterError::ParameterParse { ref text, .. }) if text == "fast"
        ));
    }
}
