/// Binary STL loading and writing
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use nom::{
    bytes::complete::take,
    combinator::map,
    multi::count,
    number::complete::{le_f32, le_u16, le_u32},
    sequence::{terminated, tuple},
    IResult,
};
use thiserror::Error;

use crate::geometry::{MeshBatch, Triangle, Vertex};

/// Size of the free-form header preceding the triangle count
pub const HEADER_LEN: usize = 80;
/// Size of one facet record: normal, three vertices, attribute word
pub const RECORD_LEN: usize = 50;

const PREAMBLE_LEN: usize = HEADER_LEN + 4;
const ASCII_KEYWORD: &[u8] = b"solid";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("file is {len} bytes, too small for the 84-byte STL preamble")]
    MissingHeader { len: usize },
    #[error("header declares {declared} triangles but only {available} complete records follow")]
    Truncated { declared: u32, available: usize },
    #[error("ASCII STL files are not supported")]
    AsciiUnsupported,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Read and parse a binary STL file.
///
/// Only reads the file; the caller decides what to do with the batch.
pub fn load_stl(path: impl AsRef<Path>) -> Result<MeshBatch, LoadError> {
    let path = path.as_ref();
    let started = Instant::now();

    let data = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let batch = parse_binary_stl(&data)?;

    log::info!(
        "loaded {} triangles from {} in {:.1?}",
        batch.len(),
        path.display(),
        started.elapsed()
    );
    Ok(batch)
}

/// Parse a binary STL image held in memory
pub fn parse_binary_stl(data: &[u8]) -> Result<MeshBatch, FormatError> {
    if data.len() < PREAMBLE_LEN {
        if data.starts_with(ASCII_KEYWORD) {
            return Err(FormatError::AsciiUnsupported);
        }
        return Err(FormatError::MissingHeader { len: data.len() });
    }

    let (body, declared) =
        preamble(data).map_err(|_| FormatError::MissingHeader { len: data.len() })?;

    // Some exporters write binary files whose header starts with "solid";
    // an exact size match is the tell for those.
    let exact = (declared as u64) * (RECORD_LEN as u64) == body.len() as u64;
    if data.starts_with(ASCII_KEYWORD) && !exact {
        return Err(FormatError::AsciiUnsupported);
    }

    let available = body.len() / RECORD_LEN;
    if (declared as u64) > available as u64 {
        return Err(FormatError::Truncated {
            declared,
            available,
        });
    }

    log::debug!(
        "binary STL: {} triangles declared, {} trailing bytes",
        declared,
        body.len() - declared as usize * RECORD_LEN
    );

    let (_, triangles) = count(facet, declared as usize)(body).map_err(|_| {
        FormatError::Truncated {
            declared,
            available,
        }
    })?;
    Ok(MeshBatch::new(triangles))
}

fn preamble(input: &[u8]) -> IResult<&[u8], u32> {
    let (input, _header) = take(HEADER_LEN)(input)?;
    le_u32(input)
}

fn vector3(input: &[u8]) -> IResult<&[u8], [f32; 3]> {
    map(tuple((le_f32, le_f32, le_f32)), |(x, y, z)| [x, y, z])(input)
}

fn facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, _normal) = vector3(input)?;
    let (input, (a, b, c)) = terminated(tuple((vector3, vector3, vector3)), le_u16)(input)?;
    Ok((input, Triangle::new(a.into(), b.into(), c.into())))
}

/// Serialize a batch as binary STL.
///
/// The header is blank, face normals are recomputed from the vertices and
/// the attribute word is zero.
pub fn write_binary_stl<W: Write>(batch: &MeshBatch, mut writer: W) -> io::Result<()> {
    let count = u32::try_from(batch.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "too many triangles for binary STL",
        )
    })?;

    writer.write_all(&[0u8; HEADER_LEN])?;
    writer.write_all(&count.to_le_bytes())?;

    let mut record = [0u8; RECORD_LEN];
    for triangle in batch {
        let normal = triangle.normal();
        let coords = [normal.x, normal.y, normal.z]
            .into_iter()
            .chain(triangle.vertices.iter().flat_map(Vertex::coords));
        for (chunk, value) in record.chunks_exact_mut(4).zip(coords) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        record[48..].copy_from_slice(&0u16.to_le_bytes());
        writer.write_all(&record)?;
    }
    writer.flush()
}
