//! Image loading for room textures.
//!
//! Textures are flat image files on disk, decoded to RGBA8. The renderer
//! consumes decoded [`TextureImage`]s, never file paths.
//!
//! # Discovery
//! [`find_placeholder`] looks through a list of directories for something it
//! can use as the room texture. Well-known names win over arbitrary images.

use image::imageops::FilterType;
use std::path::{Path, PathBuf};

/// File names tried first, in order, in every search directory.
pub const PLACEHOLDER_NAMES: [&str; 4] = ["placeholder.png", "wall.png", "texture.png", "checker.png"];

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {path} has zero size")]
    Empty { path: PathBuf },
    #[error("no loadable placeholder texture in {searched:?}")]
    NoPlaceholder { searched: Vec<PathBuf> },
}

/// Decoded RGBA8 pixels, row-major, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    pub fn from_rgba8(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    /// Bytes per row of the base level.
    pub fn row_bytes(&self) -> u32 {
        self.width * 4
    }

    /// Number of levels in a full mip chain down to 1x1.
    pub fn mip_level_count(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Base level followed by successively halved levels, ending at 1x1.
    pub fn mip_chain(&self) -> Vec<TextureImage> {
        let mut levels = Vec::with_capacity(self.mip_level_count() as usize);
        levels.push(self.clone());
        let Some(base) = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
        else {
            return levels;
        };
        let (mut w, mut h) = (self.width, self.height);
        while w > 1 || h > 1 {
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            let level = image::imageops::resize(&base, w, h, FilterType::Triangle);
            levels.push(Self::from_rgba8(level));
        }
        levels
    }
}

/// Decode an image file into RGBA8.
pub fn load_rgba8(path: impl AsRef<Path>) -> Result<TextureImage, AssetError> {
    let path = path.as_ref();
    let decoded = image::open(path).map_err(|source| match source {
        image::ImageError::IoError(e) => AssetError::Io(e),
        source => AssetError::Decode {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let texture = TextureImage::from_rgba8(decoded.to_rgba8());
    if texture.width == 0 || texture.height == 0 {
        return Err(AssetError::Empty {
            path: path.to_path_buf(),
        });
    }
    tracing::debug!(
        "loaded {} ({}x{})",
        path.display(),
        texture.width,
        texture.height
    );
    Ok(texture)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Candidate files in one directory, well-known names first, then other
/// images in name order.
fn candidates(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = PLACEHOLDER_NAMES
        .iter()
        .map(|name| dir.join(name))
        .filter(|p| p.is_file())
        .collect();

    let Ok(entries) = std::fs::read_dir(dir) else {
        return out;
    };
    let mut rest: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_image_extension(p) && !out.contains(p))
        .collect();
    rest.sort();
    out.extend(rest);
    out
}

/// Find and decode the first usable texture in `dirs`.
pub fn find_placeholder<P: AsRef<Path>>(dirs: &[P]) -> Result<(PathBuf, TextureImage), AssetError> {
    for dir in dirs {
        for path in candidates(dir.as_ref()) {
            match load_rgba8(&path) {
                Ok(texture) => {
                    tracing::info!("using texture {}", path.display());
                    return Ok((path, texture));
                }
                Err(e) => tracing::warn!("skipping {}: {e}", path.display()),
            }
        }
    }
    Err(AssetError::NoPlaceholder {
        searched: dirs.iter().map(|d| d.as_ref().to_path_buf()).collect(),
    })
}

pub fn crate_info() -> &'static str {
    "boxroom-assets v0.1.0"
}
