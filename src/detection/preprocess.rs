use image::{imageops, imageops::FilterType, DynamicImage, RgbImage};
use rten_tensor::prelude::*;
use rten_tensor::NdTensor;

/// Resize to a square model input, ignoring aspect ratio. The decoded
/// boxes are rescaled with the same per-axis factors afterwards, so no
/// letterboxing is needed.
pub fn resize_rgb(image: &DynamicImage, size: u32) -> RgbImage {
    imageops::resize(&image.to_rgb8(), size, size, FilterType::Triangle)
}

/// Pack an RGB image into an NCHW float tensor normalised to [0, 1].
pub fn to_nchw(image: &RgbImage) -> NdTensor<f32, 4> {
    let (width, height) = image.dimensions();
    let plane = (width * height) as usize;
    let raw = image.as_raw();

    let mut data = vec![0f32; 3 * plane];
    for idx in 0..plane {
        data[idx] = raw[idx * 3] as f32 / 255.0;
        data[plane + idx] = raw[idx * 3 + 1] as f32 / 255.0;
        data[2 * plane + idx] = raw[idx * 3 + 2] as f32 / 255.0;
    }

    NdTensor::from_data([1, 3, height as usize, width as usize], data)
}

/// In-place numerically stable softmax.
pub fn softmax(values: &mut [f32]) {
    if values.is_empty() {
        return;
    }
    let max = values.iter().copied().fold(f32::MIN, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn nchw_tensor_has_expected_shape_and_range() {
        let img = RgbImage::from_pixel(4, 2, Rgb([255, 0, 128]));
        let tensor = to_nchw(&img);
        assert_eq!(tensor.shape(), [1, 3, 2, 4]);
        assert_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert_eq!(tensor[[0, 1, 0, 0]], 0.0);
        assert!((tensor[[0, 2, 0, 0]] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn softmax_sums_to_one_and_preserves_argmax() {
        let mut values = [1.0, 3.0, 2.0];
        softmax(&mut values);
        let sum: f32 = values.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(values[1] > values[2] && values[2] > values[0]);
    }

    #[test]
    fn softmax_of_empty_slice_is_a_no_op() {
        let mut values: [f32; 0] = [];
        softmax(&mut values);
    }
}
