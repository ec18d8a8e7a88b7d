//! Single-file multi-page TIFF volumes
//!
//! Page `z` holds depth plane `z`, laid out like the per-plane files written by
//! [`crate::stack_io::to_tiffs`]: `x` rows and `y` columns.

use crate::errors::{BrainIoError, Result};
use crate::resources::{check_memory_feasibility, MemoryProbe, SystemMemory};
use crate::stack_io::plane_byte_size;
use ndarray::{Array2, Array3, Axis};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::ColorType;
use tracing::info;

/// Suffixes that name a single-file TIFF volume
pub const TIFF_SUFFIXES: [&str; 2] = [".tif", ".tiff"];

/// True when `path` ends with a TIFF suffix
#[must_use]
pub fn is_tiff_path(path: &str) -> bool {
    TIFF_SUFFIXES.iter().any(|suffix| path.ends_with(suffix))
}

/// Load a multi-page TIFF against live system memory.
///
/// # Errors
///
/// See [`load_img_stack_with`].
pub fn load_img_stack(path: impl AsRef<Path>) -> Result<Array3<u16>> {
    load_img_stack_with(path, &SystemMemory)
}

/// Load a multi-page TIFF as an `[x, y, z]` volume.
///
/// Page directories are walked once to count planes so the memory check runs
/// before any pixel data is decoded.
///
/// # Errors
///
/// Fails if the file cannot be decoded, pages differ in size, a page is not
/// 8 or 16-bit greyscale, or the volume would not fit in memory.
pub fn load_img_stack_with(
    path: impl AsRef<Path>,
    memory: &dyn MemoryProbe,
) -> Result<Array3<u16>> {
    let path = path.as_ref();
    let (width, height) = {
        let mut decoder = open_decoder(path)?;
        let dims = decoder.dimensions()?;
        let mut pages = 1u64;
        while decoder.more_images() {
            decoder.next_image()?;
            pages += 1;
        }
        check_memory_feasibility(
            memory,
            plane_byte_size(dims.1 as usize, dims.0 as usize),
            pages,
        )?;
        dims
    };
    let expected = (height as usize, width as usize);

    let mut decoder = open_decoder(path)?;
    let mut planes = Vec::new();
    loop {
        let (w, h) = decoder.dimensions()?;
        let got = (h as usize, w as usize);
        if got != expected {
            return Err(BrainIoError::PlaneMismatch {
                path: format!("{} (page {})", path.display(), planes.len()),
                expected,
                got,
            });
        }

        let color = decoder.colortype()?;
        let raw = match (color, decoder.read_image()?) {
            (ColorType::Gray(16), DecodingResult::U16(samples)) => samples,
            (ColorType::Gray(8), DecodingResult::U8(samples)) => {
                samples.into_iter().map(u16::from).collect()
            }
            _ => {
                return Err(BrainIoError::UnsupportedPixelType {
                    path: path.display().to_string(),
                    color: format!("{color:?}"),
                })
            }
        };
        planes.push(Array2::from_shape_vec(got, raw)?);

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    let mut volume = Array3::<u16>::zeros((expected.0, expected.1, planes.len()));
    for (z, plane) in planes.iter().enumerate() {
        volume.index_axis_mut(Axis(2), z).assign(plane);
    }

    info!(shape = ?volume.shape(), path = %path.display(), "Loaded TIFF stack");
    Ok(volume)
}

/// Write `volume` as one 16-bit greyscale TIFF with a page per depth plane.
///
/// # Errors
///
/// Fails if the file cannot be created or a page cannot be encoded.
pub fn to_tiff(volume: &Array3<u16>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let (rows, cols, depth) = volume.dim();
    let too_large = || BrainIoError::TiffError(tiff::TiffError::LimitsExceeded);
    let width = u32::try_from(cols).map_err(|_| too_large())?;
    let height = u32::try_from(rows).map_err(|_| too_large())?;

    let mut encoder = TiffEncoder::new(BufWriter::new(File::create(path)?))?;
    for z in 0..depth {
        let page: Vec<u16> = volume.index_axis(Axis(2), z).iter().copied().collect();
        encoder.write_image::<colortype::Gray16>(width, height, &page)?;
    }

    info!(pages = depth, path = %path.display(), "Saved TIFF stack");
    Ok(())
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>> {
    Ok(Decoder::new(BufReader::new(File::open(path)?))?)
}
