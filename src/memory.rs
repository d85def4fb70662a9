//! In-memory [`Scene`] for offline runs and tests.
//!
//! Objects form a tree, each with a world-frame pose, a linear velocity,
//! optional custom data blocks, an optional script with a parameter store,
//! and an optional camera image. Poses are not inherited from parents.

use crate::types::{
    euler_to_rotation, relative_rotation, rotation_to_euler, Matrix, ObjectHandle,
    ScriptHandle, Vec3,
};
use crate::{QuadcopterError, Result, Scene};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
struct Entry {
    name: String,
    unique_id: i32,
    children: Vec<ObjectHandle>,
    custom_data: HashMap<u32, Vec<u8>>,
    position: Vec3,
    euler: Vec3,
    velocity: Vec3,
    script: Option<ScriptHandle>,
    camera: Option<Camera>,
}

#[derive(Debug, Clone)]
struct Camera {
    resolution: [u32; 2],
    pixels: Vec<f32>,
}

/// Owned object table implementing [`Scene`].
#[derive(Debug, Default)]
pub struct MemoryScene {
    objects: HashMap<ObjectHandle, Entry>,
    next_handle: i32,
    next_script: i32,
    parameters: RefCell<HashMap<ScriptHandle, HashMap<String, Vec<u8>>>>,
    failing: HashSet<&'static str>,
    parameter_writes: Cell<usize>,
    time: f32,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self {
            next_handle: 10,
            next_script: 100,
            ..Default::default()
        }
    }

    /// Add an object under `parent` (`NONE` for a scene root).
    pub fn add_object(&mut self, name: &str, parent: ObjectHandle) -> ObjectHandle {
        let handle = ObjectHandle(self.next_handle);
        self.next_handle += 1;
        self.objects.insert(
            handle,
            Entry {
                name: name.to_string(),
                unique_id: 1000 + handle.0,
                ..Default::default()
            },
        );
        if let Some(p) = self.objects.get_mut(&parent) {
            p.children.push(handle);
        }
        handle
    }

    /// Store a raw custom data block under `header`.
    pub fn set_custom_data(&mut self, obj: ObjectHandle, header: u32, data: Vec<u8>) {
        if let Some(e) = self.objects.get_mut(&obj) {
            e.custom_data.insert(header, data);
        }
    }

    pub fn set_pose(&mut self, obj: ObjectHandle, position: Vec3, euler: Vec3) {
        if let Some(e) = self.objects.get_mut(&obj) {
            e.position = position;
            e.euler = euler;
        }
    }

    pub fn set_position(&mut self, obj: ObjectHandle, position: Vec3) {
        if let Some(e) = self.objects.get_mut(&obj) {
            e.position = position;
        }
    }

    pub fn set_velocity(&mut self, obj: ObjectHandle, velocity: Vec3) {
        if let Some(e) = self.objects.get_mut(&obj) {
            e.velocity = velocity;
        }
    }

    /// Attach a fresh script to `obj` and return its handle.
    pub fn attach_script(&mut self, obj: ObjectHandle) -> Option<ScriptHandle> {
        let e = self.objects.get_mut(&obj)?;
        let script = ScriptHandle(self.next_script);
        self.next_script += 1;
        e.script = Some(script);
        self.parameters.get_mut().insert(script, HashMap::new());
        Some(script)
    }

    pub fn set_camera_image(&mut self, obj: ObjectHandle, resolution: [u32; 2], pixels: Vec<f32>) {
        if let Some(e) = self.objects.get_mut(&obj) {
            e.camera = Some(Camera { resolution, pixels });
        }
    }

    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    /// Make every later call to the named scene query fail.
    pub fn fail_call(&mut self, call: &'static str) {
        self.failing.insert(call);
    }

    pub fn clear_failures(&mut self) {
        self.failing.clear();
    }

    /// Number of successful `set_script_parameter` calls so far.
    pub fn parameter_writes(&self) -> usize {
        self.parameter_writes.get()
    }

    /// Text currently stored in a script parameter, if any.
    pub fn parameter_text(&self, script: ScriptHandle, name: &str) -> Option<String> {
        self.script_parameter(script, name)
    }

    fn check(&self, call: &'static str) -> Result<()> {
        if self.failing.contains(call) {
            Err(QuadcopterError::SceneCall(call))
        } else {
            Ok(())
        }
    }

    fn entry(&self, obj: ObjectHandle, call: &'static str) -> Result<&Entry> {
        self.check(call)?;
        self.objects.get(&obj).ok_or(QuadcopterError::SceneCall(call))
    }

    fn world_matrix(&self, obj: ObjectHandle, call: &'static str) -> Result<Matrix> {
        let e = self.entry(obj, call)?;
        Ok(Matrix::from_pose(e.position, e.euler))
    }
}

impl Scene for MemoryScene {
    fn custom_data_len(&self, obj: ObjectHandle, header: u32) -> i32 {
        self.objects
            .get(&obj)
            .and_then(|e| e.custom_data.get(&header))
            .map_or(0, |d| d.len() as i32)
    }

    fn custom_data(&self, obj: ObjectHandle, header: u32, len: usize) -> Result<Vec<u8>> {
        let e = self.entry(obj, "custom_data")?;
        let data = e
            .custom_data
            .get(&header)
            .ok_or(QuadcopterError::SceneCall("custom_data"))?;
        Ok(data[..len.min(data.len())].to_vec())
    }

    fn child(&self, obj: ObjectHandle, index: usize) -> Option<ObjectHandle> {
        self.objects.get(&obj)?.children.get(index).copied()
    }

    fn unique_id(&self, obj: ObjectHandle) -> Result<i32> {
        Ok(self.entry(obj, "unique_id")?.unique_id)
    }

    fn object_name(&self, obj: ObjectHandle) -> Option<String> {
        self.objects.get(&obj).map(|e| e.name.clone())
    }

    fn object_position(&self, obj: ObjectHandle, relative_to: ObjectHandle) -> Result<Vec3> {
        let position = self.entry(obj, "object_position")?.position;
        if relative_to.is_none() {
            return Ok(position);
        }
        let frame = self.world_matrix(relative_to, "object_position")?;
        Ok(frame.inverse_transform(position))
    }

    fn object_velocity(&self, obj: ObjectHandle) -> Result<Vec3> {
        Ok(self.entry(obj, "object_velocity")?.velocity)
    }

    fn object_matrix(&self, obj: ObjectHandle, relative_to: ObjectHandle) -> Result<Matrix> {
        let m = self.world_matrix(obj, "object_matrix")?;
        if relative_to.is_none() {
            return Ok(m);
        }
        let frame = self.world_matrix(relative_to, "object_matrix")?;
        let r = relative_rotation(&frame.rotation(), &m.rotation());
        let t = frame.inverse_transform(m.translation());
        Ok(Matrix([
            r[0][0], r[0][1], r[0][2], t[0],
            r[1][0], r[1][1], r[1][2], t[1],
            r[2][0], r[2][1], r[2][2], t[2],
        ]))
    }

    fn transform_vector(&self, m: &Matrix, v: Vec3) -> Result<Vec3> {
        self.check("transform_vector")?;
        Ok(m.transform(v))
    }

    fn object_orientation(&self, obj: ObjectHandle, relative_to: ObjectHandle) -> Result<Vec3> {
        let euler = self.entry(obj, "object_orientation")?.euler;
        if relative_to.is_none() {
            return Ok(euler);
        }
        let frame = self.entry(relative_to, "object_orientation")?.euler;
        let r = relative_rotation(&euler_to_rotation(frame), &euler_to_rotation(euler));
        Ok(rotation_to_euler(&r))
    }

    fn script_for_object(&self, obj: ObjectHandle) -> Option<ScriptHandle> {
        self.objects.get(&obj)?.script
    }

    fn script_parameter(&self, script: ScriptHandle, name: &str) -> Option<String> {
        if self.failing.contains("script_parameter") {
            return None;
        }
        let params = self.parameters.borrow();
        let raw = params.get(&script)?.get(name)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Some(String::from_utf8_lossy(&raw[..end]).to_string())
    }

    fn set_script_parameter(&self, script: ScriptHandle, name: &str, value: &[u8]) -> Result<()> {
        self.check("set_script_parameter")?;
        let mut params = self.parameters.borrow_mut();
        let slots = params
            .get_mut(&script)
            .ok_or(QuadcopterError::SceneCall("set_script_parameter"))?;
        slots.insert(name.to_string(), value.to_vec());
        self.parameter_writes.set(self.parameter_writes.get() + 1);
        Ok(())
    }

    fn vision_sensor_resolution(&self, obj: ObjectHandle) -> Result<[u32; 2]> {
        let e = self.entry(obj, "vision_sensor_resolution")?;
        e.camera
            .as_ref()
            .map(|c| c.resolution)
            .ok_or(QuadcopterError::SceneCall("vision_sensor_resolution"))
    }

    fn vision_sensor_image(&self, obj: ObjectHandle) -> Result<Vec<f32>> {
        let e = self.entry(obj, "vision_sensor_image")?;
        e.camera
            .as_ref()
            .map(|c| c.pixels.clone())
            .ok_or(QuadcopterError::SceneCall("vision_sensor_image"))
    }

    fn simulation_time(&self) -> f32 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_in_insertion_order() {
        let mut scene = MemoryScene::new();
        let root = scene.add_object("root", ObjectHandle::NONE);
        let a = scene.add_object("a", root);
        let b = scene.add_object("b", root);
        assert_eq!(scene.child(root, 0), Some(a));
        assert_eq!(scene.child(root, 1), Some(b));
        assert_eq!(scene.child(root, 2), None);
    }

    #[test]
    fn test_relative_position_uses_frame_rotation() {
        let mut scene = MemoryScene::new();
        let frame = scene.add_object("frame", ObjectHandle::NONE);
        let point = scene.add_object("point", ObjectHandle::NONE);
        scene.set_pose(frame, [1.0, 0.0, 0.0], [0.0, 0.0, std::f32::consts::FRAC_PI_2]);
        scene.set_position(point, [1.0, 1.0, 0.0]);

        let local = scene.object_position(point, frame).unwrap();
        assert!((local[0] - 1.0).abs() < 1e-5);
        assert!(local[1].abs() < 1e-5);
    }

    #[test]
    fn test_injected_failure() {
        let mut scene = MemoryScene::new();
        let obj = scene.add_object("obj", ObjectHandle::NONE);
        scene.fail_call("object_velocity");
        assert!(matches!(
            scene.object_velocity(obj),
            Err(QuadcopterError::SceneCall("object_velocity"))
        ));
        scene.clear_failures();
        assert!(scene.object_velocity(obj).is_ok());
    }

    #[test]
    fn test_script_parameter_strips_nul() {
        let mut scene = MemoryScene::new();
        let obj = scene.add_object("motor", ObjectHandle::NONE);
        let script = scene.attach_script(obj).unwrap();
        scene.set_script_parameter(script, "p", b"1.5\0").unwrap();
        assert_eq!(scene.script_parameter(script, "p").as_deref(), Some("1.5"));
        assert_eq!(scene.parameter_writes(), 1);
    }
}
