use std::path::Path;

use thiserror::Error;

use crate::schedule::Scheduler;

/// A decoded, displayable image: tightly packed RGBA8 rows, top row first.
/// Dropping it releases the resource; the player guarantees each one is
/// dropped exactly once and never while still bound to a material.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageResource {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageResource {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Uniform-color image, handy for tests and placeholder materials.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .into_iter()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self::new(width, height, pixels)
    }

    /// Nearest-neighbor sample at normalized (u, v), clamped to edges.
    /// v grows downward, matching row order.
    pub fn sample_nearest(&self, u: f32, v: f32) -> [u8; 4] {
        let x = ((u.clamp(0.0, 1.0) * self.width as f32) as u32).min(self.width - 1);
        let y = ((v.clamp(0.0, 1.0) * self.height as f32) as u32).min(self.height - 1);
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {locator}: {source}")]
    Io {
        locator: String,
        source: std::io::Error,
    },
    #[error("failed to decode {locator}: {source}")]
    Decode {
        locator: String,
        source: image::ImageError,
    },
}

pub type LoadResult = Result<ImageResource, LoadError>;

/// Asynchronous image source. `request` is fire-and-forget: there is no
/// cancellation, the completion callback simply runs whenever the load
/// finishes (the player discards stale results itself).
pub trait ImageLoader {
    fn request(&self, locator: &str, on_done: Box<dyn FnOnce(LoadResult)>);
}

/// Filesystem loader decoding with the `image` crate. Decoding happens
/// eagerly but the completion is still delivered through the cooperative
/// queue, so callers observe the same ordering model as with a genuinely
/// asynchronous source.
pub struct FsLoader {
    scheduler: Scheduler,
}

impl FsLoader {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    pub fn load_sync(locator: &str) -> LoadResult {
        let decoded = image::open(Path::new(locator)).map_err(|e| match e {
            image::ImageError::IoError(source) => LoadError::Io {
                locator: locator.to_string(),
                source,
            },
            source => LoadError::Decode {
                locator: locator.to_string(),
                source,
            },
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(ImageResource::new(width, height, rgba.into_raw()))
    }
}

impl ImageLoader for FsLoader {
    fn request(&self, locator: &str, on_done: Box<dyn FnOnce(LoadResult)>) {
        let result = Self::load_sync(locator);
        if let Err(err) = &result {
            log::debug!("image load failed: {err}");
        }
        self.scheduler.post(Box::new(move || on_done(result)));
    }
}
