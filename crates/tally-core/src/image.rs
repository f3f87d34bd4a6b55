//! Three-dimensional image payload
//!
//! Voxel data with spacing and origin metadata, stored x-fastest. Images are
//! written in MetaImage format: a `.mhd` path produces a header plus a
//! sibling `.raw` file, any other path a single file with the voxel data
//! appended to the header (`ElementDataFile = LOCAL`).

use crate::error::{Error, Result};
use crate::kind::PayloadKind;
use crate::ops;
use crate::payload::Payload;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Relative tolerance when comparing spacing and origin of two images
const PHYSICAL_SPACE_TOLERANCE: f64 = 1e-6;

/// Value written where the denominator of a division is zero
pub const DIVISION_FILL_VALUE: f64 = 0.0;

const ELEMENT_SIZE: usize = std::mem::size_of::<f64>();

/// A 3D scalar image
#[derive(Debug, Clone, PartialEq)]
pub struct Image3D {
    size: [usize; 3],
    spacing: [f64; 3],
    origin: [f64; 3],
    voxels: Vec<f64>,
}

impl Image3D {
    /// Create an image from voxel values (x fastest)
    pub fn new(size: [usize; 3], spacing: [f64; 3], voxels: Vec<f64>) -> Result<Self> {
        let expected = ops::element_count(&size)?;
        if voxels.len() != expected {
            return Err(Error::size_mismatch(expected, voxels.len(), "image voxels"));
        }
        if spacing.iter().any(|s| s.is_nan() || *s <= 0.0) {
            return Err(Error::InvalidInput(format!(
                "image spacing must be positive, got {spacing:?}"
            )));
        }
        Ok(Self {
            size,
            spacing,
            origin: [0.0; 3],
            voxels,
        })
    }

    /// Allocate an image filled with a constant value
    pub fn create_empty(size: [usize; 3], spacing: [f64; 3], fill_value: f64) -> Result<Self> {
        let len = ops::element_count(&size)?;
        Self::new(size, spacing, vec![fill_value; len])
    }

    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    pub fn set_spacing(&mut self, spacing: [f64; 3]) {
        self.spacing = spacing;
    }

    pub fn set_origin(&mut self, origin: [f64; 3]) {
        self.origin = origin;
    }

    /// Builder-style origin setter
    pub fn with_origin(mut self, origin: [f64; 3]) -> Self {
        self.origin = origin;
        self
    }

    pub fn voxels(&self) -> &[f64] {
        &self.voxels
    }

    pub fn voxels_mut(&mut self) -> &mut [f64] {
        &mut self.voxels
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Value at voxel index `(x, y, z)`
    pub fn voxel(&self, x: usize, y: usize, z: usize) -> Option<f64> {
        let [nx, ny, nz] = self.size;
        if x >= nx || y >= ny || z >= nz {
            return None;
        }
        self.voxels.get(x + nx * (y + ny * z)).copied()
    }

    /// Read an image written by [`Payload::write`]
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let (header, body_start) = parse_header(&bytes)?;

        let field = |key: &str| {
            header
                .get(key)
                .ok_or_else(|| Error::Parse(format!("missing MetaImage field '{key}'")))
        };

        if field("NDims")?.trim() != "3" {
            return Err(Error::Parse("only 3D images are supported".to_string()));
        }
        if field("ElementType")?.trim() != "MET_DOUBLE" {
            return Err(Error::Parse("only MET_DOUBLE images are supported".to_string()));
        }
        if header
            .get("BinaryDataByteOrderMSB")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
        {
            return Err(Error::Parse("big-endian voxel data is not supported".to_string()));
        }

        let size = parse_triplet::<usize>(field("DimSize")?, "DimSize")?;
        let spacing = parse_triplet::<f64>(field("ElementSpacing")?, "ElementSpacing")?;
        let origin = match header.get("Offset") {
            Some(v) => parse_triplet::<f64>(v, "Offset")?,
            None => [0.0; 3],
        };

        let data_file = field("ElementDataFile")?.trim().to_string();
        let raw = if data_file == "LOCAL" {
            bytes[body_start..].to_vec()
        } else {
            let sibling = path
                .parent()
                .map_or_else(|| PathBuf::from(&data_file), |dir| dir.join(&data_file));
            fs::read(sibling)?
        };

        let voxels = decode_voxels(&raw)?;
        Ok(Self::new(size, spacing, voxels)?.with_origin(origin))
    }

    fn check_physical_space(&self, other: &Self, context: &str) -> Result<()> {
        if self.size != other.size {
            return Err(Error::shape_mismatch(&self.size, &other.size, context));
        }
        let close = |a: &[f64; 3], b: &[f64; 3]| {
            a.iter().zip(b).all(|(x, y)| {
                (x - y).abs() <= PHYSICAL_SPACE_TOLERANCE * x.abs().max(y.abs()).max(1.0)
            })
        };
        if !close(&self.spacing, &other.spacing) || !close(&self.origin, &other.origin) {
            return Err(Error::InvalidInput(format!(
                "{context}: images do not occupy the same physical space \
                 (spacing {:?} vs {:?}, origin {:?} vs {:?})",
                self.spacing, other.spacing, self.origin, other.origin
            )));
        }
        Ok(())
    }

    fn header(&self, data_file: &str) -> String {
        let [ox, oy, oz] = self.origin;
        let [sx, sy, sz] = self.spacing;
        let [nx, ny, nz] = self.size;
        format!(
            "ObjectType = Image\n\
             NDims = 3\n\
             BinaryData = True\n\
             BinaryDataByteOrderMSB = False\n\
             CompressedData = False\n\
             TransformMatrix = 1 0 0 0 1 0 0 0 1\n\
             Offset = {ox} {oy} {oz}\n\
             CenterOfRotation = 0 0 0\n\
             AnatomicalOrientation = RAI\n\
             ElementSpacing = {sx} {sy} {sz}\n\
             DimSize = {nx} {ny} {nz}\n\
             ElementType = MET_DOUBLE\n\
             ElementDataFile = {data_file}\n"
        )
    }

    fn write_voxels(&self, out: &mut impl Write) -> Result<()> {
        for v in &self.voxels {
            out.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    }
}

impl Payload for Image3D {
    const KIND: PayloadKind = PayloadKind::Image;

    fn check_compatible(&self, other: &Self) -> Result<()> {
        self.check_physical_space(other, "image operands")
    }

    fn add_assign(&mut self, other: &Self) -> Result<()> {
        self.check_physical_space(other, "image add")?;
        ops::add_assign(&mut self.voxels, &other.voxels);
        Ok(())
    }

    fn divide_assign(&mut self, other: &Self) -> Result<()> {
        self.check_physical_space(other, "image divide")?;
        ops::div_assign_filtered(&mut self.voxels, &other.voxels, DIVISION_FILL_VALUE);
        Ok(())
    }

    fn write(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), size = ?self.size, "writing image");
        let detached = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mhd"));

        if detached {
            let raw_path = path.with_extension("raw");
            let raw_name = raw_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    Error::InvalidInput(format!("invalid image path {}", path.display()))
                })?;

            let mut header = BufWriter::new(File::create(path)?);
            header.write_all(self.header(&raw_name).as_bytes())?;
            header.flush()?;

            let mut raw = BufWriter::new(File::create(&raw_path)?);
            self.write_voxels(&mut raw)?;
            raw.flush()?;
        } else {
            let mut out = BufWriter::new(File::create(path)?);
            out.write_all(self.header("LOCAL").as_bytes())?;
            self.write_voxels(&mut out)?;
            out.flush()?;
        }
        Ok(())
    }

    fn shape(&self) -> Vec<usize> {
        self.size.to_vec()
    }
}

/// Split a MetaImage file into header fields and the offset of the voxel data
fn parse_header(bytes: &[u8]) -> Result<(HashMap<String, String>, usize)> {
    let mut fields = HashMap::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let end = bytes[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(bytes.len(), |i| pos + i);
        let line = std::str::from_utf8(&bytes[pos..end])
            .map_err(|e| Error::Parse(format!("non-text MetaImage header: {e}")))?;
        pos = (end + 1).min(bytes.len());

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_string();
        let last = key == "ElementDataFile";
        fields.insert(key, value.trim().to_string());
        if last {
            return Ok((fields, pos));
        }
    }
    Err(Error::Parse("missing MetaImage field 'ElementDataFile'".to_string()))
}

fn parse_triplet<T: std::str::FromStr>(value: &str, key: &str) -> Result<[T; 3]>
where
    T::Err: std::fmt::Display,
{
    let parsed = value
        .split_whitespace()
        .map(|tok| {
            tok.parse::<T>()
                .map_err(|e| Error::Parse(format!("{key}: invalid value '{tok}': {e}")))
        })
        .collect::<Result<Vec<T>>>()?;
    let len = parsed.len();
    <[T; 3]>::try_from(parsed)
        .map_err(|_| Error::Parse(format!("{key}: expected 3 values, got {len}")))
}

fn decode_voxels(raw: &[u8]) -> Result<Vec<f64>> {
    if raw.len() % ELEMENT_SIZE != 0 {
        return Err(Error::Parse(format!(
            "voxel data length {} is not a multiple of {ELEMENT_SIZE}",
            raw.len()
        )));
    }
    raw.chunks_exact(ELEMENT_SIZE)
        .map(|chunk| {
            <[u8; ELEMENT_SIZE]>::try_from(chunk)
                .map(f64::from_le_bytes)
                .map_err(|e| Error::Parse(e.to_string()))
        })
        .collect()
}
