//! Lazy iteration over the images waiting in the source directory.
//!
//! Candidates are chosen by extension and ordered newest first when the
//! iterator is built; decoding happens one file at a time as the session
//! advances. Files whose content is not an image, or that fail to decode,
//! are skipped without error.

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A decoded, display-ready image and the file it came from.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// The image rescaled to the configured display width.
    pub preview: DynamicImage,
    /// Original location in the source directory.
    pub path: PathBuf,
}

/// Forward-only sequence of [`SourceImage`]s, newest file first.
#[derive(Debug)]
pub struct SourceImages {
    pending: std::vec::IntoIter<PathBuf>,
    width: u32,
}

impl SourceImages {
    /// Lists the image files in `dir` and prepares to decode them at `width`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn open(dir: &Path, width: u32) -> io::Result<Self> {
        Ok(Self::from_paths(list_image_files(dir)?, width))
    }

    /// Builds the sequence from an already ordered list of paths.
    pub fn from_paths(paths: Vec<PathBuf>, width: u32) -> Self {
        Self {
            pending: paths.into_iter(),
            width,
        }
    }

    /// Number of candidates not yet produced. Some may still be skipped.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl Iterator for SourceImages {
    type Item = SourceImage;

    fn next(&mut self) -> Option<Self::Item> {
        for path in self.pending.by_ref() {
            if let Some(preview) = load_preview(&path, self.width) {
                return Some(SourceImage { preview, path });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.pending.len()))
    }
}

/// Returns true if the extension belongs to a format the decoder knows.
pub fn is_image_file(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok()
}

/// Image files directly inside `dir`, newest modification time first.
///
/// Files with equal modification times are ordered by path.
pub fn list_image_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<(PathBuf, SystemTime)> = fs::read_dir(dir)?
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| is_image_file(path))
        .map(|path| {
            let modified = fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (path, modified)
        })
        .collect();

    files.sort_by(|(a_path, a_time), (b_path, b_time)| {
        b_time.cmp(a_time).then_with(|| a_path.cmp(b_path))
    });

    Ok(files.into_iter().map(|(path, _)| path).collect())
}

/// Sniffs, decodes and rescales one file. `None` means "skip it".
///
/// Content that `infer` recognizes as something other than an image is
/// rejected up front. Unrecognized content (TGA, PNM and the like have no
/// magic number it knows) is left to the decoder.
fn load_preview(path: &Path, width: u32) -> Option<DynamicImage> {
    if let Ok(Some(kind)) = infer::get_from_path(path)
        && kind.matcher_type() != infer::MatcherType::Image
    {
        return None;
    }

    let image = ImageReader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .decode()
        .ok()?;

    Some(scale_to_width(&image, width))
}

/// Resizes to exactly `width` pixels wide, keeping the aspect ratio.
pub fn scale_to_width(image: &DynamicImage, width: u32) -> DynamicImage {
    if width == 0 || image.width() == 0 {
        return image.clone();
    }
    let height = (u64::from(image.height()) * u64::from(width) / u64::from(image.width())).max(1);
    let height = u32::try_from(height).unwrap_or(u32::MAX);
    image.resize_exact(width, height, FilterType::CatmullRom)
}
