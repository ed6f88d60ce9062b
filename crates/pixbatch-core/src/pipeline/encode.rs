//! Output encoding with temp-write-then-rename.
//!
//! Every output is first written to a temp file beside its target and only
//! renamed onto the target once encoding has fully succeeded. A staged file
//! that is dropped without being committed is removed.

use image::{ColorType, ImageFormat};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{PipelineError, PipelineResult};
use crate::raster::Raster;

use super::discovery::TEMP_PREFIX;

/// Extension every batch output is normalized to.
pub const OUTPUT_EXTENSION: &str = "png";

/// How a target path is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputKind {
    /// Raster codec from the `image` crate
    Image(ImageFormat),
    /// Whitespace-delimited intensities in [0, 1]
    Numeric,
}

impl OutputKind {
    fn for_path(path: &Path) -> PipelineResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("txt") | Some("dlm") => Ok(Self::Numeric),
            None => Ok(Self::Image(ImageFormat::Png)),
            Some(_) => ImageFormat::from_path(path)
                .map(Self::Image)
                .map_err(|e| PipelineError::Encode {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }),
        }
    }
}

/// An encoded output waiting to be renamed onto its target.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    /// Final destination of this output.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically rename the staged file onto its target.
    pub fn commit(self) -> PipelineResult<PathBuf> {
        let target = self.target;
        self.temp
            .persist(&target)
            .map_err(|e| PipelineError::Encode {
                path: target.clone(),
                message: format!("Cannot move output into place: {}", e.error),
            })?;
        Ok(target)
    }
}

/// Writes rasters to disk without exposing partially written files.
pub struct RasterWriter;

impl RasterWriter {
    /// Encode `raster` into a temp file in the target's directory.
    ///
    /// The codec follows the target extension: `.txt`/`.dlm` produce a numeric
    /// dump, anything else goes through the `image` encoders.
    pub fn stage(raster: &Raster, target: &Path) -> PipelineResult<StagedFile> {
        let kind = OutputKind::for_path(target)?;
        let encode_err = |message: String| PipelineError::Encode {
            path: target.to_path_buf(),
            message,
        };

        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| encode_err(format!("Cannot create temp file: {}", e)))?;

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            match kind {
                OutputKind::Numeric => write_numeric(raster, &mut writer)
                    .map_err(|e| encode_err(e.to_string()))?,
                OutputKind::Image(format) => write_image(raster, format, &mut writer)
                    .map_err(|e| encode_err(e.to_string()))?,
            }
            writer
                .flush()
                .map_err(|e| encode_err(format!("Cannot flush output: {}", e)))?;
        }

        Ok(StagedFile {
            temp,
            target: target.to_path_buf(),
        })
    }

    /// Stage and commit in one step.
    pub fn write(raster: &Raster, target: &Path) -> PipelineResult<PathBuf> {
        Self::stage(raster, target)?.commit()
    }
}

/// `dir/stem.png` for an input `dir/stem.ext`.
pub fn normalized_path(input: &Path) -> PathBuf {
    input.with_extension(OUTPUT_EXTENSION)
}

/// `dir/stem<suffix>.png` for an input `dir/stem.ext`.
pub fn suffixed_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}{suffix}.{OUTPUT_EXTENSION}"))
}

fn write_image<W: Write + std::io::Seek>(
    raster: &Raster,
    format: ImageFormat,
    writer: &mut W,
) -> image::ImageResult<()> {
    // JPEG has no alpha channel.
    if format == ImageFormat::Jpeg {
        if let Raster::Rgba(_) = raster {
            let rgb = raster.to_rgb();
            return image::write_buffer_with_format(
                writer,
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ColorType::Rgb8,
                format,
            );
        }
    }

    let color = match raster {
        Raster::Luma(_) => ColorType::L8,
        Raster::Rgb(_) => ColorType::Rgb8,
        Raster::Rgba(_) => ColorType::Rgba8,
    };
    let (width, height) = raster.dimensions();
    image::write_buffer_with_format(writer, raster.samples(), width, height, color, format)
}

fn write_numeric<W: Write>(raster: &Raster, writer: &mut W) -> std::io::Result<()> {
    let gray = raster.to_luma();
    for row in gray.rows() {
        let line: Vec<String> = row
            .map(|p| format!("{:2.4}", f32::from(p.0[0]) / 255.0))
            .collect();
        writeln!(writer, "{}", line.join(" "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbaImage};

    #[test]
    fn test_normalized_and_suffixed_paths() {
        assert_eq!(
            normalized_path(Path::new("/d/a.jpg")),
            PathBuf::from("/d/a.png")
        );
        assert_eq!(
            suffixed_path(Path::new("/d/a.jpg"), "_red"),
            PathBuf::from("/d/a_red.png")
        );
    }

    #[test]
    fn test_write_png_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.png");
        let raster = Raster::Luma(GrayImage::from_pixel(3, 2, Luma([9])));

        RasterWriter::write(&raster, &target).unwrap();

        let back = image::open(&target).unwrap().into_luma8();
        assert_eq!(back.dimensions(), (3, 2));
        assert_eq!(back.get_pixel(2, 1), &Luma([9]));
    }

    #[test]
    fn test_uncommitted_stage_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.png");
        let raster = Raster::Luma(GrayImage::new(2, 2));

        let staged = RasterWriter::stage(&raster, &target).unwrap();
        assert_eq!(staged.target(), target.as_path());
        drop(staged);

        assert!(!target.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_numeric_dump() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("values.txt");
        let mut img = GrayImage::new(2, 2);
        img.put_pixel(1, 0, Luma([255]));

        RasterWriter::write(&Raster::Luma(img), &target).unwrap();

        let text = std::fs::read_to_string(&target).unwrap();
        assert_eq!(text, "0.0000 1.0000\n0.0000 0.0000\n");
    }

    #[test]
    fn test_jpeg_target_drops_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.jpg");
        let raster = Raster::Rgba(RgbaImage::new(4, 4));

        RasterWriter::write(&raster, &target).unwrap();
        assert!(image::open(&target).is_ok());
    }

    #[test]
    fn test_unknown_extension_is_encode_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.notaformat");
        let raster = Raster::Luma(GrayImage::new(1, 1));

        let err = RasterWriter::write(&raster, &target).unwrap_err();
        assert!(matches!(err, PipelineError::Encode { .. }));
    }
}
