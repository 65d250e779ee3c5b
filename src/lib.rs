use image::{ DynamicImage, ImageBuffer, Pixel };
use imageproc::point::Point;
use tracing::warn;

use std::fs;
use std::path::Path;

pub mod batch;
pub mod config;
pub mod contours;
pub mod error;
pub mod image_process;
pub mod select;
pub mod utils;

pub use config::FinderConfig;
pub use contours::{ Contour, PlateRect };
pub use error::{ PlateError, Result };
pub use select::Selection;

/// Finds a license plate by its edges: the largest, most rectangular
/// contours are scored by how close their aspect is to a plate's.
///
/// The finder holds nothing but its config, every call runs the whole
/// pipeline on the image it is given.
#[derive(Debug, Clone, Default)]
pub struct PlateFinder {
    config: FinderConfig,
}

/// Everything the detection pipeline produced for one image.
/// `rects[i]` is the bounding rect (or placeholder) of `contours[i]`.
#[derive(Debug, Clone)]
pub struct PlateDetection {
    pub contours: Vec<Contour>,
    pub rects: Vec<PlateRect>,
    pub selection: Selection,
}

impl PlateDetection {

    /// The picked contour and its rect, or `None` when nothing usable was
    /// found (no contours at all, or only a placeholder won).
    pub fn plate(&self) -> Option<(&Contour, PlateRect)> {
        self.selection.plate().map(|(index, rect)| (&self.contours[index], rect))
    }
}

impl PlateFinder {

    pub fn new(config: FinderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Edges -> contours ranked by area -> rectangular ones -> best aspect.
    pub fn detect(&self, img: &DynamicImage) -> PlateDetection {
        let edges = image_process::prepare(img, &self.config.preprocess);
        let contours = contours::rank(&edges);
        let rects = contours::filter_rectangles(&contours, self.config.rect_threshold);
        let selection = select::select(&rects, &self.config.selector);
        if let Selection::Rejected { index } = selection {
            warn!(index, candidates = rects.len(), "only rejected shapes left to pick, treating as no plate");
        }
        PlateDetection { contours, rects, selection }
    }

    /// A copy of `img` with the plate outline drawn on it, or `img` itself
    /// when no plate is found.
    pub fn highlight(&self, img: &DynamicImage) -> DynamicImage {
        let detection = self.detect(img);
        self.highlight_detected(img, &detection)
    }

    /// The plate cut out of `img`, or `img` itself when no plate is found.
    pub fn isolate(&self, img: &DynamicImage) -> DynamicImage {
        let detection = self.detect(img);
        self.isolate_detected(img, &detection)
    }

    /// A copy of `img` with only the plate box blurred, or `img` itself when
    /// no plate is found.
    pub fn blur(&self, img: &DynamicImage) -> DynamicImage {
        let detection = self.detect(img);
        self.blur_detected(img, &detection)
    }

    pub fn highlight_detected(&self, img: &DynamicImage, detection: &PlateDetection) -> DynamicImage {
        let (contour, _) = match detection.plate() {
            Some(plate) => plate,
            None => return img.clone(),
        };
        let style = &self.config.highlight;
        let outline = Outline { points: contour.points(), color: style.color, thickness: style.thickness };
        utils::apply_keeping_color(img, &outline)
    }

    pub fn isolate_detected(&self, img: &DynamicImage, detection: &PlateDetection) -> DynamicImage {
        let rect = match detection.plate() {
            Some((_, rect)) => rect,
            None => return img.clone(),
        };
        img.crop_imm(rect.x, rect.y, rect.width, rect.height)
    }

    pub fn blur_detected(&self, img: &DynamicImage, detection: &PlateDetection) -> DynamicImage {
        let rect = match detection.plate() {
            Some((_, rect)) => rect,
            None => return img.clone(),
        };
        let kernel = image_process::blur_kernel(&rect);
        utils::apply_keeping_color(img, &RegionBlur { rect, kernel })
    }

    /// Writes every intermediate image of the edge detection into `dir`.
    pub fn dump_stages(&self, img: &DynamicImage, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let stages = image_process::prepare_stages(img, &self.config.preprocess);
        stages.gray.save(dir.join("input_gray.png"))?;
        stages.bilateral.save(dir.join("input_gray_bilateral.png"))?;
        stages.blurred.save(dir.join("input_gray_bilateral_blur.png"))?;
        stages.edges.save(dir.join("input_gray_bilateral_blur_edges.png"))?;
        Ok(())
    }
}

struct Outline<'a> {
    points: &'a [Point<i32>],
    color: [u8; 3],
    thickness: u32,
}

impl utils::PixelOp for Outline<'_> {
    fn apply<P>(&self, buf: &mut ImageBuffer<P, Vec<u8>>)
    where
        P: Pixel<Subpixel = u8> + 'static,
    {
        utils::draw_closed_contour_mut(buf, self.points, utils::pixel_from_rgb(self.color), self.thickness);
    }
}

struct RegionBlur {
    rect: PlateRect,
    kernel: (u32, u32),
}

impl utils::PixelOp for RegionBlur {
    fn apply<P>(&self, buf: &mut ImageBuffer<P, Vec<u8>>)
    where
        P: Pixel<Subpixel = u8> + 'static,
    {
        image_process::box_blur_region(buf, &self.rect, self.kernel);
    }
}
