//! Running the three plate operations over files on disk.

use image::DynamicImage;
use tracing::{ debug, info };

use std::fs;
use std::path::{ Path, PathBuf };

use crate::error::{ PlateError, Result };
use crate::PlateFinder;

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// One of the three outputs written per input image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Highlight,
    Isolate,
    Blur,
}

impl Operation {

    pub const ALL: [Operation; 3] = [Operation::Highlight, Operation::Isolate, Operation::Blur];

    pub fn prefix(&self) -> &'static str {
        match self {
            Operation::Highlight => "highlighted_plate_",
            Operation::Isolate => "isolated_plate_",
            Operation::Blur => "blurred_plate_",
        }
    }

    /// `<output_dir>/<prefix><input file name>`
    pub fn output_path(&self, input: &Path, output_dir: &Path) -> PathBuf {
        let name = input.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        output_dir.join(format!("{}{}", self.prefix(), name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedPaths {
    pub highlighted: PathBuf,
    pub isolated: PathBuf,
    pub blurred: PathBuf,
}

/// Reads `input`, runs highlight, isolate and blur on it and writes the three
/// results into `output_dir`, creating the directory if needed.
pub fn process_file(finder: &PlateFinder, input: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Result<ProcessedPaths> {
    let input = input.as_ref();
    let img = image::open(input)?;
    process_image(finder, &img, input, output_dir)
}

/// Same as [`process_file`] for an image that is already decoded. `input`
/// only names the outputs.
pub fn process_image(finder: &PlateFinder, img: &DynamicImage, input: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Result<ProcessedPaths> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let detection = finder.detect(img);
    if detection.plate().is_none() {
        info!(file = %input.display(), "no plate found, writing input unchanged");
    }

    let paths = ProcessedPaths {
        highlighted: Operation::Highlight.output_path(input, output_dir),
        isolated: Operation::Isolate.output_path(input, output_dir),
        blurred: Operation::Blur.output_path(input, output_dir),
    };
    finder.highlight_detected(img, &detection).save(&paths.highlighted)?;
    finder.isolate_detected(img, &detection).save(&paths.isolated)?;
    finder.blur_detected(img, &detection).save(&paths.blurred)?;
    debug!(?paths, "wrote outputs");
    Ok(paths)
}

/// Expands `paths` into the image files to process. Files are taken as given,
/// directories contribute their image files sorted by name.
pub fn collect_inputs<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_image(p))
                .collect();
            files.sort();
            inputs.extend(files);
        } else {
            inputs.push(path.to_path_buf());
        }
    }
    if inputs.is_empty() {
        return Err(PlateError::NoInputs);
    }
    Ok(inputs)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .map_or(false, |ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}
