//! Binary PPM snapshots of a vision sensor, for debugging.

use crate::types::ObjectHandle;
use crate::{QuadcopterError, Result, Scene};
use std::io::Write;
use std::path::Path;

/// Encode an RGB float image (channels in `0.0..=1.0`) as a P6 PPM.
pub fn encode_ppm(width: u32, height: u32, pixels: &[f32]) -> Vec<u8> {
    let header = format!("P6 {} {} 255\n", width, height);
    let mut out = Vec::with_capacity(header.len() + pixels.len());
    out.extend_from_slice(header.as_bytes());
    out.extend(pixels.iter().map(|&c| (c * 255.0) as u8));
    out
}

/// Write a camera's current image to `path`.
pub fn write_camera_ppm(scene: &dyn Scene, camera: ObjectHandle, path: &Path) -> Result<()> {
    log::info!("saving image to file '{}'...", path.display());

    let [width, height] = scene.vision_sensor_resolution(camera)?;
    let pixels = scene.vision_sensor_image(camera)?;
    let expected = width as usize * height as usize * 3;
    if pixels.len() < expected {
        return Err(QuadcopterError::SceneCall("vision_sensor_image"));
    }

    let data = encode_ppm(width, height, &pixels[..expected]);
    let mut file = std::fs::File::create(path)?;
    file.write_all(&data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryScene;

    #[test]
    fn test_encode_ppm_layout() {
        let data = encode_ppm(2, 1, &[1.0, 0.0, 0.5, 0.0, 1.0, 2.0]);
        let header = b"P6 2 1 255\n";
        assert_eq!(&data[..header.len()], header);
        assert_eq!(&data[header.len()..], &[255, 0, 127, 0, 255, 255]);
    }

    #[test]
    fn test_write_camera_ppm() {
        let mut scene = MemoryScene::new();
        let cam = scene.add_object("cam", ObjectHandle::NONE);
        scene.set_camera_image(cam, [1, 1], vec![0.0, 1.0, 0.0]);

        let path = std::env::temp_dir().join(format!("quadcopter_cam_{}.ppm", std::process::id()));
        write_camera_ppm(&scene, cam, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(bytes, b"P6 1 1 255\n\x00\xff\x00".to_vec());
    }

    #[test]
    fn test_short_image_is_rejected() {
        let mut scene = MemoryScene::new();
        let cam = scene.add_object("cam", ObjectHandle::NONE);
        scene.set_camera_image(cam, [2, 2], vec![0.0; 3]);
        let path = std::env::temp_dir().join("quadcopter_short.ppm");
        assert!(write_camera_ppm(&scene, cam, &path).is_err());
    }
}
