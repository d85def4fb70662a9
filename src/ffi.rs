//! C FFI layer for the quadcopter plugin.
//!
//! The host fills a [`QcSceneApi`] table with callbacks into its scene API,
//! using -1 (or NULL) as the failure sentinel, and drives each quadcopter
//! through opaque handles. The generated C header is written to
//! `include/quadcopter.h` by cbindgen.

use crate::config::Config;
use crate::error::LastError;
use crate::quadcopter::Quadcopter;
use crate::types::{Matrix, ObjectHandle, ScriptHandle, Vec3};
use crate::{QuadcopterError, Result, Scene};
use std::ffi::{c_char, c_int, c_void, CStr, CString};

/// Last error message for C consumers.
static LAST_ERROR: LastError = LastError::new();

/// Host scene callbacks. `user_data` is passed back as the first argument of
/// every callback. A missing callback makes the matching query fail.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct QcSceneApi {
    pub user_data: *mut c_void,
    pub get_custom_data_length:
        Option<unsafe extern "C" fn(*mut c_void, obj: c_int, header: c_int) -> c_int>,
    /// Copies the whole block into `out`, which holds at least the reported length.
    pub get_custom_data:
        Option<unsafe extern "C" fn(*mut c_void, obj: c_int, header: c_int, out: *mut u8) -> c_int>,
    /// Returns -1 once `index` is past the last child.
    pub get_object_child: Option<unsafe extern "C" fn(*mut c_void, obj: c_int, index: c_int) -> c_int>,
    pub get_unique_identifier:
        Option<unsafe extern "C" fn(*mut c_void, obj: c_int, out: *mut c_int) -> c_int>,
    /// Returns a host buffer released with `release_buffer`, or NULL.
    pub get_object_name: Option<unsafe extern "C" fn(*mut c_void, obj: c_int) -> *mut c_char>,
    pub get_object_position: Option<
        unsafe extern "C" fn(*mut c_void, obj: c_int, relative_to: c_int, out: *mut f32) -> c_int,
    >,
    /// `angular` may be NULL.
    pub get_object_velocity: Option<
        unsafe extern "C" fn(*mut c_void, obj: c_int, linear: *mut f32, angular: *mut f32) -> c_int,
    >,
    /// Writes 12 floats.
    pub get_object_matrix: Option<
        unsafe extern "C" fn(*mut c_void, obj: c_int, relative_to: c_int, out: *mut f32) -> c_int,
    >,
    /// Transforms `vector` (3 floats) in place.
    pub transform_vector:
        Option<unsafe extern "C" fn(*mut c_void, matrix: *const f32, vector: *mut f32) -> c_int>,
    pub get_object_orientation: Option<
        unsafe extern "C" fn(*mut c_void, obj: c_int, relative_to: c_int, out: *mut f32) -> c_int,
    >,
    pub get_script_associated_with_object:
        Option<unsafe extern "C" fn(*mut c_void, obj: c_int) -> c_int>,
    /// Returns a host buffer released with `release_buffer`, or NULL.
    pub get_script_simulation_parameter: Option<
        unsafe extern "C" fn(
            *mut c_void,
            script: c_int,
            name: *const c_char,
            size: *mut c_int,
        ) -> *mut c_char,
    >,
    pub set_script_simulation_parameter: Option<
        unsafe extern "C" fn(
            *mut c_void,
            script: c_int,
            name: *const c_char,
            value: *const c_char,
            len: c_int,
        ) -> c_int,
    >,
    /// Writes `[width, height]`.
    pub get_vision_sensor_resolution:
        Option<unsafe extern "C" fn(*mut c_void, obj: c_int, out: *mut c_int) -> c_int>,
    /// Returns `width * height * 3` floats released with `release_buffer`, or NULL.
    pub get_vision_sensor_image: Option<unsafe extern "C" fn(*mut c_void, obj: c_int) -> *mut f32>,
    pub get_simulation_time: Option<unsafe extern "C" fn(*mut c_void) -> f32>,
    pub release_buffer: Option<unsafe extern "C" fn(*mut c_void, buffer: *mut c_void)>,
}

/// [`Scene`] backed by host callbacks.
pub struct FfiScene {
    api: QcSceneApi,
}

impl FfiScene {
    /// # Safety
    /// Every callback in `api` must be safe to call with `api.user_data` for
    /// as long as the scene is used.
    pub unsafe fn new(api: QcSceneApi) -> Self {
        Self { api }
    }

    fn release(&self, buffer: *mut c_void) {
        if let Some(f) = self.api.release_buffer {
            unsafe { f(self.api.user_data, buffer) };
        }
    }

    fn take_string(&self, ptr: *mut c_char) -> Option<String> {
        if ptr.is_null() {
            return None;
        }
        let s = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().to_string();
        self.release(ptr as *mut c_void);
        Some(s)
    }

    fn vec3_query(
        &self,
        call: &'static str,
        f: Option<unsafe extern "C" fn(*mut c_void, c_int, c_int, *mut f32) -> c_int>,
        obj: ObjectHandle,
        relative_to: ObjectHandle,
    ) -> Result<Vec3> {
        let f = f.ok_or(QuadcopterError::SceneCall(call))?;
        let mut out = [0.0f32; 3];
        if unsafe { f(self.api.user_data, obj.0, relative_to.0, out.as_mut_ptr()) } == -1 {
            return Err(QuadcopterError::SceneCall(call));
        }
        Ok(out)
    }
}

impl Scene for FfiScene {
    fn custom_data_len(&self, obj: ObjectHandle, header: u32) -> i32 {
        match self.api.get_custom_data_length {
            Some(f) => unsafe { f(self.api.user_data, obj.0, header as c_int) },
            None => 0,
        }
    }

    fn custom_data(&self, obj: ObjectHandle, header: u32, len: usize) -> Result<Vec<u8>> {
        let f = self
            .api
            .get_custom_data
            .ok_or(QuadcopterError::SceneCall("simGetObjectCustomData"))?;
        let mut buf = vec![0u8; len];
        if unsafe { f(self.api.user_data, obj.0, header as c_int, buf.as_mut_ptr()) } == -1 {
            return Err(QuadcopterError::SceneCall("simGetObjectCustomData"));
        }
        Ok(buf)
    }

    fn child(&self, obj: ObjectHandle, index: usize) -> Option<ObjectHandle> {
        let f = self.api.get_object_child?;
        let child = unsafe { f(self.api.user_data, obj.0, index as c_int) };
        (child != -1).then_some(ObjectHandle(child))
    }

    fn unique_id(&self, obj: ObjectHandle) -> Result<i32> {
        let f = self
            .api
            .get_unique_identifier
            .ok_or(QuadcopterError::SceneCall("simGetObjectUniqueIdentifier"))?;
        let mut id: c_int = 0;
        if unsafe { f(self.api.user_data, obj.0, &mut id) } == -1 {
            return Err(QuadcopterError::SceneCall("simGetObjectUniqueIdentifier"));
        }
        Ok(id)
    }

    fn object_name(&self, obj: ObjectHandle) -> Option<String> {
        let f = self.api.get_object_name?;
        self.take_string(unsafe { f(self.api.user_data, obj.0) })
    }

    fn object_position(&self, obj: ObjectHandle, relative_to: ObjectHandle) -> Result<Vec3> {
        self.vec3_query("simGetObjectPosition", self.api.get_object_position, obj, relative_to)
    }

    fn object_velocity(&self, obj: ObjectHandle) -> Result<Vec3> {
        let f = self
            .api
            .get_object_velocity
            .ok_or(QuadcopterError::SceneCall("simGetObjectVelocity"))?;
        let mut linear = [0.0f32; 3];
        let rc = unsafe {
            f(
                self.api.user_data,
                obj.0,
                linear.as_mut_ptr(),
                std::ptr::null_mut(),
            )
        };
        if rc == -1 {
            return Err(QuadcopterError::SceneCall("simGetObjectVelocity"));
        }
        Ok(linear)
    }

    fn object_matrix(&self, obj: ObjectHandle, relative_to: ObjectHandle) -> Result<Matrix> {
        let f = self
            .api
            .get_object_matrix
            .ok_or(QuadcopterError::SceneCall("simGetObjectMatrix"))?;
        let mut m = Matrix::IDENTITY;
        if unsafe { f(self.api.user_data, obj.0, relative_to.0, m.0.as_mut_ptr()) } == -1 {
            return Err(QuadcopterError::SceneCall("simGetObjectMatrix"));
        }
        Ok(m)
    }

    fn transform_vector(&self, m: &Matrix, v: Vec3) -> Result<Vec3> {
        let Some(f) = self.api.transform_vector else {
            return Ok(m.transform(v));
        };
        let mut out = v;
        if unsafe { f(self.api.user_data, m.0.as_ptr(), out.as_mut_ptr()) } == -1 {
            return Err(QuadcopterError::SceneCall("simTransformVector"));
        }
        Ok(out)
    }

    fn object_orientation(&self, obj: ObjectHandle, relative_to: ObjectHandle) -> Result<Vec3> {
        self.vec3_query(
            "simGetObjectOrientation",
            self.api.get_object_orientation,
            obj,
            relative_to,
        )
    }

    fn script_for_object(&self, obj: ObjectHandle) -> Option<ScriptHandle> {
        if obj.is_none() {
            return None;
        }
        let f = self.api.get_script_associated_with_object?;
        let script = unsafe { f(self.api.user_data, obj.0) };
        (script != -1).then_some(ScriptHandle(script))
    }

    fn script_parameter(&self, script: ScriptHandle, name: &str) -> Option<String> {
        let f = self.api.get_script_simulation_parameter?;
        let name = CString::new(name).ok()?;
        let mut size: c_int = 0;
        let ptr = unsafe { f(self.api.user_data, script.0, name.as_ptr(), &mut size) };
        self.take_string(ptr)
    }

    fn set_script_parameter(&self, script: ScriptHandle, name: &str, value: &[u8]) -> Result<()> {
        let call = "simSetScriptSimulationParameter";
        let f = self
            .api
            .set_script_simulation_parameter
            .ok_or(QuadcopterError::SceneCall(call))?;
        let name = CString::new(name).map_err(|_| QuadcopterError::SceneCall(call))?;
        let rc = unsafe {
            f(
                self.api.user_data,
                script.0,
                name.as_ptr(),
                value.as_ptr() as *const c_char,
                value.len() as c_int,
            )
        };
        if rc == -1 {
            return Err(QuadcopterError::SceneCall(call));
        }
        Ok(())
    }

    fn vision_sensor_resolution(&self, obj: ObjectHandle) -> Result<[u32; 2]> {
        let call = "simGetVisionSensorResolution";
        let f = self
            .api
            .get_vision_sensor_resolution
            .ok_or(QuadcopterError::SceneCall(call))?;
        let mut size: [c_int; 2] = [0; 2];
        if unsafe { f(self.api.user_data, obj.0, size.as_mut_ptr()) } == -1 {
            return Err(QuadcopterError::SceneCall(call));
        }
        if size[0] < 0 || size[1] < 0 {
            return Err(QuadcopterError::SceneCall(call));
        }
        Ok([size[0] as u32, size[1] as u32])
    }

    fn vision_sensor_image(&self, obj: ObjectHandle) -> Result<Vec<f32>> {
        let call = "simGetVisionSensorImage";
        let [width, height] = self.vision_sensor_resolution(obj)?;
        let f = self
            .api
            .get_vision_sensor_image
            .ok_or(QuadcopterError::SceneCall(call))?;
        let ptr = unsafe { f(self.api.user_data, obj.0) };
        if ptr.is_null() {
            return Err(QuadcopterError::SceneCall(call));
        }
        let len = width as usize * height as usize * 3;
        let pixels = unsafe { std::slice::from_raw_parts(ptr, len) }.to_vec();
        self.release(ptr as *mut c_void);
        Ok(pixels)
    }

    fn simulation_time(&self) -> f32 {
        match self.api.get_simulation_time {
            Some(f) => unsafe { f(self.api.user_data) },
            None => 0.0,
        }
    }
}

/// Opaque quadcopter handle for C consumers.
pub struct QcQuadcopter {
    scene: FfiScene,
    quad: Quadcopter,
}

/// Return true if `obj` carries the quadcopter marker.
///
/// # Safety
/// `api` must point to a valid `QcSceneApi`, or be null.
#[no_mangle]
pub unsafe extern "C" fn qc_is_quadcopter(api: *const QcSceneApi, obj: c_int) -> bool {
    if api.is_null() {
        LAST_ERROR.set(&QuadcopterError::NullSceneApi);
        return false;
    }
    let scene = FfiScene::new(*api);
    Quadcopter::query(&scene, ObjectHandle(obj))
}

/// Assemble the quadcopter rooted at `obj`. Configuration is read from the
/// `QUADCOPTER_*` environment variables. Returns NULL on error (check
/// qc_last_error()).
///
/// # Safety
/// `api` must point to a valid `QcSceneApi`, or be null. The table is copied
/// and its callbacks must stay valid until `qc_destroy`.
#[no_mangle]
pub unsafe extern "C" fn qc_create(api: *const QcSceneApi, obj: c_int) -> *mut QcQuadcopter {
    if api.is_null() {
        LAST_ERROR.set(&QuadcopterError::NullSceneApi);
        return std::ptr::null_mut();
    }
    let scene = FfiScene::new(*api);
    match Quadcopter::new(&scene, ObjectHandle(obj), Config::from_env()) {
        Ok(quad) => Box::into_raw(Box::new(QcQuadcopter { scene, quad })),
        Err(e) => {
            log::warn!("creating quadcopter for object {} failed: {}", obj, e);
            LAST_ERROR.set(&e);
            std::ptr::null_mut()
        }
    }
}

/// Free a quadcopter.
///
/// # Safety
/// `q` must be a pointer returned by `qc_create`, or null.
#[no_mangle]
pub unsafe extern "C" fn qc_destroy(q: *mut QcQuadcopter) {
    if !q.is_null() {
        drop(Box::from_raw(q));
    }
}

/// # Safety
/// `q` must be a valid quadcopter pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn qc_simulation_started(q: *mut QcQuadcopter) {
    if let Some(q) = q.as_mut() {
        q.quad.simulation_started();
    }
}

/// # Safety
/// `q` must be a valid quadcopter pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn qc_simulation_stopped(q: *mut QcQuadcopter) {
    if let Some(q) = q.as_mut() {
        q.quad.simulation_stopped();
    }
}

/// Run one control tick.
///
/// # Safety
/// `q` must be a valid quadcopter pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn qc_simulation_stepped(q: *mut QcQuadcopter) {
    if let Some(q) = q.as_mut() {
        q.quad.simulation_stepped(&q.scene);
    }
}

/// Bitmap of resolved parts (see `Parts`).
///
/// # Safety
/// `q` must be a valid quadcopter pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn qc_resolved_parts(q: *const QcQuadcopter) -> u32 {
    match q.as_ref() {
        Some(q) => q.quad.resolved().bits(),
        None => 0,
    }
}

/// The quadcopter's unique identifier, or -1 for a null handle.
///
/// # Safety
/// `q` must be a valid quadcopter pointer, or null.
#[no_mangle]
pub unsafe extern "C" fn qc_unique_id(q: *const QcQuadcopter) -> c_int {
    match q.as_ref() {
        Some(q) => q.quad.unique_id(),
        None => -1,
    }
}

/// Read motor `n`'s current particle velocity into `out`.
/// Returns 0 on success, -1 on error.
///
/// # Safety
/// `q` and `out` must be valid pointers, or null.
#[no_mangle]
pub unsafe extern "C" fn qc_motor_velocity(q: *const QcQuadcopter, n: c_int, out: *mut f32) -> c_int {
    let Some(q) = q.as_ref() else {
        return -1;
    };
    if out.is_null() || n < 0 {
        return -1;
    }
    match q.quad.motor_particle_velocity(&q.scene, n as usize) {
        Ok(v) => {
            out.write(v);
            0
        }
        Err(e) => {
            LAST_ERROR.set(&e);
            -1
        }
    }
}

/// Get the last error message. Returns NULL if no error.
/// The returned pointer is valid until the next failing call.
#[no_mangle]
pub extern "C" fn qc_last_error() -> *const c_char {
    LAST_ERROR.as_ptr()
}

/// Clear the last error message.
#[no_mangle]
pub extern "C" fn qc_clear_error() {
    LAST_ERROR.clear();
}
