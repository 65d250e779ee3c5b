//! Image level building blocks of the plate finder: turning a photo into an
//! edge map, and blurring a region of it.
//!
//! The heavy lifting is imageproc's; this file only fixes the order and the
//! parameters.

use image::{ imageops, DynamicImage, GrayImage, ImageBuffer, Luma, Pixel };
use imageproc::{ edges, filter };
use tracing::debug;

use crate::config::PreprocessConfig;
use crate::contours::PlateRect;

/// Every intermediate image of [`prepare_stages`], in pipeline order.
#[derive(Debug, Clone)]
pub struct PreparedStages {
    pub gray: GrayImage,
    pub bilateral: GrayImage,
    pub blurred: GrayImage,
    pub edges: GrayImage,
}

/// Gray, then bilateral, then a small gaussian, then canny.
/// The returned edge map has the size of `img`, edge pixels are 255.
pub fn prepare(img: &DynamicImage, config: &PreprocessConfig) -> GrayImage {
    prepare_stages(img, config).edges
}

pub fn prepare_stages(img: &DynamicImage, config: &PreprocessConfig) -> PreparedStages {
    let gray = img.to_luma8();
    let (width, height) = gray.dimensions();
    // canny walks 1..height-1 and would underflow on an empty buffer
    if width == 0 || height == 0 {
        return PreparedStages {
            bilateral: gray.clone(),
            blurred: gray.clone(),
            edges: gray.clone(),
            gray,
        };
    }

    let bilateral = filter::bilateral_filter(
        &gray,
        config.bilateral_window,
        config.bilateral_sigma_color,
        config.bilateral_sigma_spatial,
    );
    let blurred = filter::gaussian_blur_f32(&bilateral, config.gaussian_sigma);
    let edges = edges::canny(&blurred, config.canny_low, config.canny_high);
    debug!(
        width,
        height,
        edge_pixels = edges.pixels().filter(|p| p.0[0] > 0).count(),
        "prepared edge map"
    );
    PreparedStages { gray, bilateral, blurred, edges }
}

/// Kernel size used to blur `rect`: its width and height, each made odd by
/// dropping one when even.
pub fn blur_kernel(rect: &PlateRect) -> (u32, u32) {
    (odd_floor(rect.width), odd_floor(rect.height))
}

fn odd_floor(v: u32) -> u32 {
    if v % 2 == 0 {
        v.saturating_sub(1)
    } else {
        v
    }
}

/// Box blurs `rect` of `img` in place with a `kernel` sized (odd) window,
/// every channel (alpha included) on its own.
/// Pixels outside `rect` are neither changed nor sampled.
pub fn box_blur_region<P>(img: &mut ImageBuffer<P, Vec<u8>>, rect: &PlateRect, kernel: (u32, u32))
where
    P: Pixel<Subpixel = u8> + 'static,
{
    if rect.is_placeholder() {
        return;
    }
    let region = imageops::crop_imm(&*img, rect.x, rect.y, rect.width, rect.height).to_image();
    let (width, height) = region.dimensions();
    let (x_radius, y_radius) = (kernel.0 / 2, kernel.1 / 2);

    // box_filter only takes single channel images
    let planes: Vec<GrayImage> = (0..P::CHANNEL_COUNT as usize).map(|c| {
        let plane = GrayImage::from_fn(width, height, |x, y| Luma([region.get_pixel(x, y).channels()[c]]));
        filter::box_filter(&plane, x_radius, y_radius)
    }).collect();
    let mut blurred = region;
    for (x, y, pixel) in blurred.enumerate_pixels_mut() {
        for (c, plane) in planes.iter().enumerate() {
            pixel.channels_mut()[c] = plane.get_pixel(x, y).0[0];
        }
    }
    imageops::replace(img, &blurred, rect.x as i64, rect.y as i64);
}
