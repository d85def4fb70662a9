use crate::types::{Matrix, ObjectHandle, ScriptHandle, Vec3};
use crate::Result;

/// Capabilities the host scene provides to the quadcopter.
///
/// Every query is synchronous. Fallible queries return
/// [`QuadcopterError::SceneCall`](crate::QuadcopterError::SceneCall) naming
/// the call that failed. Passing [`ObjectHandle::NONE`] as `relative_to`
/// means the world frame.
pub trait Scene {
    /// Length in bytes of the object's custom data block under `header`.
    /// Zero or negative means the object has no such block.
    fn custom_data_len(&self, obj: ObjectHandle, header: u32) -> i32;

    /// Fetch `len` bytes of the object's custom data block under `header`.
    fn custom_data(&self, obj: ObjectHandle, header: u32, len: usize) -> Result<Vec<u8>>;

    /// Child at `index`, or `None` once the children are exhausted.
    fn child(&self, obj: ObjectHandle, index: usize) -> Option<ObjectHandle>;

    /// Identifier that stays unique for the life of the process.
    fn unique_id(&self, obj: ObjectHandle) -> Result<i32>;

    fn object_name(&self, obj: ObjectHandle) -> Option<String>;

    fn object_position(&self, obj: ObjectHandle, relative_to: ObjectHandle) -> Result<Vec3>;

    /// Linear velocity in the world frame.
    fn object_velocity(&self, obj: ObjectHandle) -> Result<Vec3>;

    fn object_matrix(&self, obj: ObjectHandle, relative_to: ObjectHandle) -> Result<Matrix>;

    /// Apply `m` to `v`, translation included.
    fn transform_vector(&self, m: &Matrix, v: Vec3) -> Result<Vec3> {
        Ok(m.transform(v))
    }

    /// Euler angles `[alpha, beta, gamma]` of `obj` relative to `relative_to`.
    fn object_orientation(&self, obj: ObjectHandle, relative_to: ObjectHandle) -> Result<Vec3>;

    fn script_for_object(&self, obj: ObjectHandle) -> Option<ScriptHandle>;

    /// Raw text stored in a script's simulation parameter.
    fn script_parameter(&self, script: ScriptHandle, name: &str) -> Option<String>;

    fn set_script_parameter(&self, script: ScriptHandle, name: &str, value: &[u8]) -> Result<()>;

    /// `[width, height]` of a vision sensor.
    fn vision_sensor_resolution(&self, obj: ObjectHandle) -> Result<[u32; 2]>;

    /// Row-major RGB image, channels in `0.0..=1.0`.
    fn vision_sensor_image(&self, obj: ObjectHandle) -> Result<Vec<f32>>;

    /// Current simulation time in seconds.
    fn simulation_time(&self) -> f32;
}
