use image::{DynamicImage, GrayImage};

/// Source of segmentation masks
///
/// A session is queried once per [`remove`](crate::remove) call and may be
/// reused across calls. Each returned mask must have the size of the queried
/// image; their order decides the stacking order of the output.
///
/// Model loading and inference live outside this crate. Any closure
/// `Fn(&DynamicImage) -> Vec<GrayImage>` is a session, which makes it easy to
/// plug in an inference backend.
pub trait Session {
    fn predict(&self, image: &DynamicImage) -> Vec<GrayImage>;
}

impl<F> Session for F
where
    F: Fn(&DynamicImage) -> Vec<GrayImage>,
{
    fn predict(&self, image: &DynamicImage) -> Vec<GrayImage> {
        self(image)
    }
}

/// Session returning a fixed list of precomputed masks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticSession {
    masks: Vec<GrayImage>,
}

impl StaticSession {
    pub const fn new(masks: Vec<GrayImage>) -> Self {
        Self { masks }
    }

    pub fn masks(&self) -> &[GrayImage] {
        &self.masks
    }
}

impl From<Vec<GrayImage>> for StaticSession {
    fn from(masks: Vec<GrayImage>) -> Self {
        Self::new(masks)
    }
}

impl Session for StaticSession {
    fn predict(&self, _image: &DynamicImage) -> Vec<GrayImage> {
        self.masks.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn closures_are_sessions() {
        let session = |image: &DynamicImage| {
            vec![GrayImage::from_pixel(image.width(), image.height(), Luma([7]))]
        };
        let image = DynamicImage::new_rgb8(3, 2);

        let masks = session.predict(&image);
        assert_eq!(masks.len(), 1);
        assert_eq!(masks[0].dimensions(), (3, 2));
    }

    #[test]
    fn static_session_is_reusable() {
        let mask = GrayImage::from_pixel(2, 2, Luma([200]));
        let session = StaticSession::from(vec![mask.clone(), mask]);
        let image = DynamicImage::new_rgb8(2, 2);

        assert_eq!(session.predict(&image), session.predict(&image));
        assert_eq!(session.predict(&image).len(), 2);
        assert!(StaticSession::default().predict(&image).is_empty());
    }
}
