#[cfg(feature = "display-window")]
use image::GenericImageView;
use image::{ ColorType, DynamicImage, ImageBuffer, Pixel, Rgb };
use imageproc::drawing;
use imageproc::point::Point;

/// Something done in place to an 8 bit image buffer, whatever its channels.
pub trait PixelOp {
    fn apply<P>(&self, buf: &mut ImageBuffer<P, Vec<u8>>)
    where
        P: Pixel<Subpixel = u8> + 'static;
}

/// Runs `op` on a copy of `img` and hands it back with `img`'s color type.
///
/// 8 bit buffers are worked on as they are. Wider ones go through rgba8 and
/// are converted back, so they keep their type but not their precision.
pub fn apply_keeping_color<O: PixelOp>(img: &DynamicImage, op: &O) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(buf) => {
            let mut out = buf.clone();
            op.apply(&mut out);
            out.into()
        }
        DynamicImage::ImageLumaA8(buf) => {
            let mut out = buf.clone();
            op.apply(&mut out);
            out.into()
        }
        DynamicImage::ImageRgb8(buf) => {
            let mut out = buf.clone();
            op.apply(&mut out);
            out.into()
        }
        DynamicImage::ImageRgba8(buf) => {
            let mut out = buf.clone();
            op.apply(&mut out);
            out.into()
        }
        other => {
            let mut out = other.to_rgba8();
            op.apply(&mut out);
            convert_to(DynamicImage::ImageRgba8(out), other.color())
        }
    }
}

fn convert_to(img: DynamicImage, color: ColorType) -> DynamicImage {
    match color {
        ColorType::L16 => img.to_luma16().into(),
        ColorType::La16 => img.to_luma_alpha16().into(),
        ColorType::Rgb16 => img.to_rgb16().into(),
        ColorType::Rgba16 => img.to_rgba16().into(),
        ColorType::Rgb32F => img.to_rgb32f().into(),
        ColorType::Rgba32F => img.to_rgba32f().into(),
        _ => img,
    }
}

/// `rgb` as a pixel of `P`: gray for luma buffers, opaque where there is alpha.
pub fn pixel_from_rgb<P: Pixel<Subpixel = u8>>(rgb: [u8; 3]) -> P {
    let [r, g, b] = rgb;
    let luma = Rgb(rgb).to_luma().0[0];
    let raw: [u8; 4] = match P::CHANNEL_COUNT {
        1 => [luma, 0, 0, 0],
        2 => [luma, 255, 0, 0],
        3 => [r, g, b, 0],
        _ => [r, g, b, 255],
    };
    *P::from_slice(&raw[..P::CHANNEL_COUNT as usize])
}

/// Shows `image` in an SDL window until it is closed.
#[cfg(feature = "display-window")]
pub fn display_image(image: &DynamicImage, title: &str) {
    let (width, height) = image.dimensions();
    imageproc::window::display_image(title, &image.to_rgba8(), width, height);
}

/// Draws the closed polyline through `points` onto `img`, `thickness` pixels
/// wide. Parts falling outside the image are clipped.
pub fn draw_closed_contour_mut<P>(img: &mut ImageBuffer<P, Vec<u8>>, points: &[Point<i32>], color: P, thickness: u32)
where
    P: Pixel<Subpixel = u8> + 'static,
{
    if points.is_empty() {
        return;
    }
    let thickness = thickness.max(1) as i32;
    // offsets centred on the line, e.g. -1..=0 for a 2px stroke
    let lo = -(thickness / 2);
    let hi = lo + thickness;

    let next_points = points.iter().cycle().skip(1);
    for (a, b) in points.iter().zip(next_points) {
        for dy in lo..hi {
            for dx in lo..hi {
                let start = ((a.x + dx) as f32, (a.y + dy) as f32);
                let end = ((b.x + dx) as f32, (b.y + dy) as f32);
                drawing::draw_line_segment_mut(img, start, end, color);
            }
        }
    }
}
