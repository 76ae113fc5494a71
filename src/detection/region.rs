use image::DynamicImage;

use crate::models::{BoundingBox, RegionCrop};

/// Crop the sub-image for one bounding box.
///
/// The box is repaired and clipped to the image bounds first; a box
/// whose clipped area is zero yields [`RegionCrop::Empty`] rather than
/// an error.
pub fn extract(image: &DynamicImage, bbox: &BoundingBox) -> RegionCrop {
    let clipped = bbox.normalized().clip(image.width(), image.height());

    let x = clipped.x1.floor() as u32;
    let y = clipped.y1.floor() as u32;
    let width = (clipped.x2.ceil() as u32).min(image.width()).saturating_sub(x);
    let height = (clipped.y2.ceil() as u32).min(image.height()).saturating_sub(y);

    if width == 0 || height == 0 {
        return RegionCrop::Empty;
    }

    RegionCrop::Pixels(image.crop_imm(x, y, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
    }

    #[test]
    fn in_bounds_box_crops_exact_region() {
        let img = test_image(100, 80);
        let crop = extract(&img, &BoundingBox::new(10.0, 20.0, 40.0, 50.0));
        let pixels = crop.pixels().expect("crop should not be empty");
        assert_eq!((pixels.width(), pixels.height()), (30, 30));
    }

    #[test]
    fn partially_outside_box_is_clipped() {
        let img = test_image(50, 50);
        let crop = extract(&img, &BoundingBox::new(-20.0, -20.0, 30.0, 30.0));
        let pixels = crop.pixels().expect("crop should not be empty");
        assert_eq!((pixels.width(), pixels.height()), (30, 30));
    }

    #[test]
    fn fully_outside_box_yields_empty_marker() {
        let img = test_image(50, 50);
        let crop = extract(&img, &BoundingBox::new(100.0, 100.0, 200.0, 200.0));
        assert!(crop.is_empty());
    }

    #[test]
    fn swapped_corners_are_repaired_before_cropping() {
        let img = test_image(50, 50);
        let crop = extract(&img, &BoundingBox::new(30.0, 30.0, 10.0, 10.0));
        let pixels = crop.pixels().expect("crop should not be empty");
        assert_eq!((pixels.width(), pixels.height()), (20, 20));
    }
}
