use std::fmt;

/// Errors raised while discovering or controlling a quadcopter.
#[derive(Debug, thiserror::Error)]
pub enum QuadcopterError {
    #[error("malformed custom data")]
    Format,

    #[error("scene call failed: {0}")]
    SceneCall(&'static str),

    #[error("invalid particle velocity '{text}': {source}")]
    ParameterParse {
        text: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scene API table is null")]
    NullSceneApi,
}

/// Thread-safe last-error storage for the C FFI layer.
pub(crate) struct LastError {
    message: std::sync::Mutex<String>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            message: std::sync::Mutex::new(String::new()),
        }
    }

    pub fn set(&self, err: &QuadcopterError) {
        if let Ok(mut msg) = self.message.lock() {
            *msg = fmt::format(format_args!("{}\0", err));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut msg) = self.message.lock() {
            msg.clear();
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_char {
        match self.message.lock() {
            Ok(msg) if !msg.is_empty() => msg.as_ptr() as *const std::ffi::c_char,
            _ => std::ptr::null(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_error_is_nul_terminated() {
        let last = LastError::new();
        assert!(last.as_ptr().is_null());

        last.set(&QuadcopterError::SceneCall("object_velocity"));
        let msg = unsafe { std::ffi::CStr::from_ptr(last.as_ptr()) };
        assert_eq!(msg.to_str().unwrap(), "scene call failed: object_velocity");

        last.clear();
        assert!(last.as_ptr().is_null());
    }
}
