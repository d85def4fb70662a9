/// Opaque scene object identifier. `NONE` doubles as "not found" and as the
/// world frame in relative queries.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(pub i32);

impl ObjectHandle {
    pub const NONE: ObjectHandle = ObjectHandle(-1);

    pub fn is_none(self) -> bool {
        self.0 == -1
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

impl Default for ObjectHandle {
    fn default() -> Self {
        Self::NONE
    }
}

/// Handle of a script attached to a scene object.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptHandle(pub i32);

/// A 3-vector as the scene reports it.
pub type Vec3 = [f32; 3];

/// Semantic role of an object within a custom data block.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Quadcopter = 0,
    Motor0 = 1,
    Motor1 = 2,
    Motor2 = 3,
    Motor3 = 4,
    CameraDown = 5,
    CameraFront = 6,
    Body = 7,
    Target = 8,
}

impl Field {
    pub const MOTORS: [Field; 4] = [Field::Motor0, Field::Motor1, Field::Motor2, Field::Motor3];

    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Field> {
        Some(match id {
            0 => Field::Quadcopter,
            1 => Field::Motor0,
            2 => Field::Motor1,
            3 => Field::Motor2,
            4 => Field::Motor3,
            5 => Field::CameraDown,
            6 => Field::CameraFront,
            7 => Field::Body,
            8 => Field::Target,
            _ => return None,
        })
    }
}

bitflags::bitflags! {
    /// Quadcopter roles that were resolved to a scene object during assembly.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(C)]
    pub struct Parts: u32 {
        const BODY         = 1 << 0;
        const TARGET       = 1 << 1;
        const CAMERA_DOWN  = 1 << 2;
        const CAMERA_FRONT = 1 << 3;
        const MOTOR_0      = 1 << 4;
        const MOTOR_1      = 1 << 5;
        const MOTOR_2      = 1 << 6;
        const MOTOR_3      = 1 << 7;

        const MOTORS = Self::MOTOR_0.bits()
            | Self::MOTOR_1.bits()
            | Self::MOTOR_2.bits()
            | Self::MOTOR_3.bits();
        /// The minimum needed to run the controller.
        const FLIGHT = Self::BODY.bits() | Self::TARGET.bits();
    }
}

impl Parts {
    pub fn motor(index: usize) -> Parts {
        Parts::from_bits_truncate(Parts::MOTOR_0.bits() << index.min(3))
    }
}

/// Object pose as a 3x4 row-major matrix: rotation in columns 0..3,
/// translation in column 3. Same layout as the host's 12-float matrices.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix(pub [f32; 12]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0,
    ]);

    /// Build a pose from a position and `[alpha, beta, gamma]` Euler angles
    /// in radians, composed as `Rx(alpha) * Ry(beta) * Rz(gamma)`.
    pub fn from_pose(position: Vec3, euler: Vec3) -> Matrix {
        let r = euler_to_rotation(euler);
        Matrix([
            r[0][0], r[0][1], r[0][2], position[0],
            r[1][0], r[1][1], r[1][2], position[1],
            r[2][0], r[2][1], r[2][2], position[2],
        ])
    }

    pub fn rotation(&self) -> [[f32; 3]; 3] {
        let m = &self.0;
        [[m[0], m[1], m[2]], [m[4], m[5], m[6]], [m[8], m[9], m[10]]]
    }

    pub fn translation(&self) -> Vec3 {
        [self.0[3], self.0[7], self.0[11]]
    }

    /// Apply the full transform, translation included.
    pub fn transform(&self, v: Vec3) -> Vec3 {
        let m = &self.0;
        [
            m[0] * v[0] + m[1] * v[1] + m[2] * v[2] + m[3],
            m[4] * v[0] + m[5] * v[1] + m[6] * v[2] + m[7],
            m[8] * v[0] + m[9] * v[1] + m[10] * v[2] + m[11],
        ]
    }

    /// Express a world-frame point in this pose's local frame.
    pub fn inverse_transform(&self, p: Vec3) -> Vec3 {
        let r = self.rotation();
        let t = self.translation();
        let d = [p[0] - t[0], p[1] - t[1], p[2] - t[2]];
        [
            r[0][0] * d[0] + r[1][0] * d[1] + r[2][0] * d[2],
            r[0][1] * d[0] + r[1][1] * d[1] + r[2][1] * d[2],
            r[0][2] * d[0] + r[1][2] * d[1] + r[2][2] * d[2],
        ]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Rotation matrix for `Rx(a) * Ry(b) * Rz(c)`.
pub fn euler_to_rotation(euler: Vec3) -> [[f32; 3]; 3] {
    let (sa, ca) = euler[0].sin_cos();
    let (sb, cb) = euler[1].sin_cos();
    let (sc, cc) = euler[2].sin_cos();
    [
        [cb * cc, -cb * sc, sb],
        [ca * sc + sa * sb * cc, ca * cc - sa * sb * sc, -sa * cb],
        [sa * sc - ca * sb * cc, sa * cc + ca * sb * sc, ca * cb],
    ]
}

/// Inverse of [`euler_to_rotation`].
pub fn rotation_to_euler(r: &[[f32; 3]; 3]) -> Vec3 {
    let beta = r[0][2].clamp(-1.0, 1.0).asin();
    if beta.cos().abs() > 1e-6 {
        [(-r[1][2]).atan2(r[2][2]), beta, (-r[0][1]).atan2(r[0][0])]
    } else {
        // Gimbal lock: fold gamma into alpha.
        [r[2][1].atan2(r[1][1]), beta, 0.0]
    }
}

/// `a^T * b`, the orientation of `b` seen from `a`.
pub fn relative_rotation(a: &[[f32; 3]; 3], b: &[[f32; 3]; 3]) -> [[f32; 3]; 3] {
    let mut out = [[0.0f32; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[k][i] * b[k][j]).sum();
        }
    }
    out
}
