//! EXR artifact encoding for the worker's save actions.
//!
//! Both actions write to an underscore-prefixed staging file and rename it
//! onto the destination. The rename is what makes the protocol safe: a
//! reader polling `preview.exr` or `render.exr` sees either the previous
//! complete file or the new complete file, never a partial write.

use std::fs;
use std::path::{Path, PathBuf};

use exr::prelude::*;

use crate::error::{EngineError, EngineResult};
use crate::frame::FrameSnapshot;

/// Destination file name for preview snapshots.
pub const PREVIEW_FILENAME: &str = "preview.exr";

/// Destination file name for the final render result.
pub const RENDER_FILENAME: &str = "render.exr";

/// Writes a preview snapshot to `preview.exr` in `dir`.
///
/// RGB, 32-bit float channels, PXR24 compression (lossy). Previews trade
/// fidelity for size; the final result never goes through this path.
pub fn save_preview(frame: &FrameSnapshot, dir: &Path) -> EngineResult<PathBuf> {
    let staging = dir.join("_preview.exr");
    write_rgb(frame, &staging, Compression::PXR24)?;
    let dest = dir.join(PREVIEW_FILENAME);
    fs::rename(&staging, &dest)?;
    Ok(dest)
}

/// Writes the render result to `render.exr` in `dir`.
///
/// RGBA, 32-bit float channels, ZIP compression (lossless). Safe to call
/// repeatedly; later writes replace the file atomically.
pub fn save_render(frame: &FrameSnapshot, dir: &Path) -> EngineResult<PathBuf> {
    let staging = dir.join("_render.exr");
    write_rgba(frame, &staging, Compression::ZIP16)?;
    let dest = dir.join(RENDER_FILENAME);
    fs::rename(&staging, &dest)?;
    Ok(dest)
}

/// Decodes an EXR file into a frame snapshot.
///
/// Used for the engine's progressive framebuffer dumps; missing alpha
/// decodes as opaque.
pub fn read_frame(path: &Path) -> EngineResult<FrameSnapshot> {
    let image = read_first_rgba_layer_from_file(
        path,
        |resolution: Vec2<usize>, _channels: &RgbaChannels| {
            FrameSnapshot::filled(resolution.width(), resolution.height(), [0.0, 0.0, 0.0, 1.0])
        },
        |frame: &mut FrameSnapshot, position: Vec2<usize>, (r, g, b, a): (f32, f32, f32, f32)| {
            *frame.pixel_mut(position.x(), position.y()) = [r, g, b, a];
        },
    )
    .map_err(|source| EngineError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.layer_data.channel_data.pixels)
}

fn write_rgb(frame: &FrameSnapshot, path: &Path, compression: Compression) -> EngineResult<()> {
    let encoding = Encoding {
        compression,
        ..Encoding::FAST_LOSSLESS
    };
    let channels = SpecificChannels::rgb(|position: Vec2<usize>| {
        let pixel = frame.pixel(position.x(), position.y());
        (pixel[0], pixel[1], pixel[2])
    });
    let layer = Layer::new(
        (frame.width, frame.height),
        LayerAttributes::default(),
        encoding,
        channels,
    );
    Image::from_layer(layer)
        .write()
        .to_file(path)
        .map_err(|source| EngineError::Encode {
            path: path.to_path_buf(),
            source,
        })
}

fn write_rgba(frame: &FrameSnapshot, path: &Path, compression: Compression) -> EngineResult<()> {
    let encoding = Encoding {
        compression,
        ..Encoding::FAST_LOSSLESS
    };
    let channels = SpecificChannels::rgba(|position: Vec2<usize>| {
        let pixel = frame.pixel(position.x(), position.y());
        (pixel[0], pixel[1], pixel[2], pixel[3])
    });
    let layer = Layer::new(
        (frame.width, frame.height),
        LayerAttributes::default(),
        encoding,
        channels,
    );
    Image::from_layer(layer)
        .write()
        .to_file(path)
        .map_err(|source| EngineError::Encode {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn gradient(width: usize, height: usize) -> FrameSnapshot {
        let mut frame = FrameSnapshot::filled(width, height, [0.0, 0.0, 0.0, 1.0]);
        for y in 0..height {
            for x in 0..width {
                *frame.pixel_mut(x, y) = [x as f32, y as f32, 0.5, 1.0];
            }
        }
        frame
    }

    #[test]
    fn save_render_roundtrips_losslessly() {
        let dir = tempdir().unwrap();
        let frame = gradient(4, 3);

        let dest = save_render(&frame, dir.path()).unwrap();
        assert_eq!(dest.file_name().unwrap(), RENDER_FILENAME);

        let back = read_frame(&dest).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn save_preview_writes_the_fixed_name() {
        let dir = tempdir().unwrap();
        let dest = save_preview(&gradient(4, 3), dir.path()).unwrap();
        assert_eq!(dest, dir.path().join(PREVIEW_FILENAME));
        assert!(dest.is_file());
    }

    #[test]
    fn staging_file_does_not_survive_a_save() {
        let dir = tempdir().unwrap();
        save_preview(&gradient(2, 2), dir.path()).unwrap();
        save_render(&gradient(2, 2), dir.path()).unwrap();
        assert!(!dir.path().join("_preview.exr").exists());
        assert!(!dir.path().join("_render.exr").exists());
    }

    #[test]
    fn save_render_overwrites_an_existing_artifact() {
        let dir = tempdir().unwrap();
        save_render(&FrameSnapshot::filled(2, 2, [0.25, 0.25, 0.25, 1.0]), dir.path()).unwrap();
        let replacement = gradient(2, 2);
        save_render(&replacement, dir.path()).unwrap();

        let back = read_frame(&dir.path().join(RENDER_FILENAME)).unwrap();
        assert_eq!(back, replacement);
    }
}
