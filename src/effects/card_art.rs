use crate::render::{Color, Rgba};
use image::{RgbaImage, imageops::FilterType};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Colors of the diagonal gradient used when a card image can't be loaded.
const PLACEHOLDER_START: Color = Color::new(0x22, 0x33, 0x44);
const PLACEHOLDER_END: Color = Color::new(0x33, 0x44, 0x55);

/// Errors that can occur when loading card images
#[derive(thiserror::Error, Debug)]
pub enum CardArtError {
    #[error("failed to load card image '{0}': {1}")]
    Load(PathBuf, #[source] image::ImageError),

    #[error("card image '{0}' is empty")]
    Empty(PathBuf),
}

/// A card face image, pre-scaled to the canvas resolution it will be sampled at.
#[derive(Debug, Clone, PartialEq)]
pub struct CardArt {
    image: RgbaImage,
}

impl CardArt {
    /// Load an image and scale it down to `width × height` pixels.
    pub fn load(path: &Path, width: u32, height: u32) -> Result<Self, CardArtError> {
        let image = image::open(path).map_err(|e| CardArtError::Load(path.to_path_buf(), e))?.to_rgba8();
        if image.width() == 0 || image.height() == 0 {
            return Err(CardArtError::Empty(path.to_path_buf()));
        }
        let image = image::imageops::resize(&image, width.max(1), height.max(1), FilterType::Triangle);
        Ok(Self { image })
    }

    /// The substitute face used when an image is missing or broken.
    pub fn placeholder(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let span = (width + height).saturating_sub(2).max(1) as f32;
        let image = RgbaImage::from_fn(width, height, |x, y| {
            let color = PLACEHOLDER_START.lerp(PLACEHOLDER_END, (x + y) as f32 / span);
            image::Rgba([color.r, color.g, color.b, 255])
        });
        Self { image }
    }

    /// Sample the image at normalized coordinates in [0, 1].
    pub fn sample(&self, u: f32, v: f32) -> Rgba {
        let x = ((u.clamp(0.0, 1.0) * self.image.width() as f32) as u32).min(self.image.width() - 1);
        let y = ((v.clamp(0.0, 1.0) * self.image.height() as f32) as u32).min(self.image.height() - 1);
        let [r, g, b, a] = self.image.get_pixel(x, y).0;
        Rgba::from_color(Color::new(r, g, b), a as f32 / 255.0)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Load every card image, substituting the placeholder for the ones that fail. An empty
/// list yields a single placeholder so every card has a face.
pub fn load_card_art(paths: &[PathBuf], width: u32, height: u32) -> Vec<Rc<CardArt>> {
    if paths.is_empty() {
        tracing::debug!("no card images configured, using placeholder faces");
        return vec![Rc::new(CardArt::placeholder(width, height))];
    }
    paths
        .iter()
        .map(|path| match CardArt::load(path, width, height) {
            Ok(art) => Rc::new(art),
            Err(e) => {
                tracing::warn!("{e}, using placeholder face");
                Rc::new(CardArt::placeholder(width, height))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_gradient_corners() {
        let art = CardArt::placeholder(34, 21);
        assert_eq!(art.dimensions(), (34, 21));
        assert_eq!(art.sample(0.0, 0.0), Rgba::opaque(PLACEHOLDER_START));
        assert_eq!(art.sample(1.0, 1.0), Rgba::opaque(PLACEHOLDER_END));
    }

    #[test]
    fn test_missing_image_falls_back() {
        let faces = load_card_art(&[PathBuf::from("/definitely/not/here.png")], 8, 4);
        assert_eq!(faces.len(), 1);
        assert_eq!(*faces[0], CardArt::placeholder(8, 4));
    }

    #[test]
    fn test_empty_list_gets_placeholder() {
        assert_eq!(load_card_art(&[], 8, 4).len(), 1);
    }

    #[test]
    fn test_load_and_scale() {
        let dir = tempfile::tempdir().expect("no tempdir");
        let path = dir.path().join("card.png");
        RgbaImage::from_pixel(40, 20, image::Rgba([255, 0, 0, 255])).save(&path).expect("save failed");

        let art = CardArt::load(&path, 4, 2).expect("load failed");
        assert_eq!(art.dimensions(), (4, 2));
        assert_eq!(art.sample(0.5, 0.5), Rgba::opaque(Color::new(255, 0, 0)));
    }
}
