//! `.npy` array files.
//!
//! Reference and decoded pixels are stored as NumPy arrays of shape
//! `(frames, rows, columns, channels)`, or `(rows, columns, channels)` for a
//! single frame. Only C-ordered arrays of little-endian (or byte-order-free)
//! numeric dtypes are read; every sample is widened to `f64`. Writing always
//! produces a version 1.0 `<f8` file with the buffer's own rank.
//!
//! Layout: 6-byte magic, 2-byte version, header length (u16 for 1.0, u32 for
//! 2.0/3.0), an ASCII dictionary padded to a 64-byte boundary, then raw data.

use crate::{IoError, IoResult};
use conform_core::{PixelBuffer, Shape};
use half::f16;
use std::path::Path;
use tracing::{debug, trace};

/// Magic bytes every `.npy` file starts with.
pub const NPY_MAGIC: [u8; 6] = [0x93, b'N', b'U', b'M', b'P', b'Y'];

const HEADER_ALIGN: usize = 64;
const MAX_HEADER_BYTES: usize = 1 << 20;

/// Sample types accepted by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    /// IEEE half precision.
    F16,
    /// IEEE single precision.
    F32,
    /// IEEE double precision.
    F64,
    /// Unsigned byte.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 32-bit integer.
    I32,
}

impl Dtype {
    /// Parses a NumPy `descr` string such as `<f4` or `|u1`.
    pub fn parse(descr: &str) -> IoResult<Self> {
        let unsupported = || IoError::UnsupportedDtype(descr.to_string());
        let (order, kind) = descr.split_at_checked(1).ok_or_else(unsupported)?;
        let single_byte = matches!(kind, "u1" | "i1" | "b1");
        match order {
            "<" => {}
            "|" if single_byte => {}
            _ => return Err(unsupported()),
        }
        match kind {
            "f2" => Ok(Self::F16),
            "f4" => Ok(Self::F32),
            "f8" => Ok(Self::F64),
            "u1" => Ok(Self::U8),
            "u2" => Ok(Self::U16),
            "i4" => Ok(Self::I32),
            _ => Err(unsupported()),
        }
    }

    /// Bytes per sample.
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::F16 | Self::U16 => 2,
            Self::F32 | Self::I32 => 4,
            Self::F64 => 8,
        }
    }

    fn decode(self, bytes: &[u8]) -> f64 {
        match self {
            Self::U8 => f64::from(bytes[0]),
            Self::F16 => f16::from_le_bytes([bytes[0], bytes[1]]).to_f64(),
            Self::U16 => f64::from(u16::from_le_bytes([bytes[0], bytes[1]])),
            Self::F32 => f64::from(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            Self::I32 => f64::from(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            Self::F64 => f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        }
    }
}

/// Parsed `.npy` header dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpyHeader {
    /// Sample type.
    pub dtype: Dtype,
    /// Whether data is stored column-major.
    pub fortran_order: bool,
    /// Array dimensions, outermost first.
    pub shape: Vec<usize>,
}

/// Reads a `.npy` file into a pixel buffer.
pub fn read_npy(path: &Path) -> IoResult<PixelBuffer> {
    trace!(path = %path.display(), "npy::read");
    let payload = crate::read_bytes(path)?;
    let buffer = parse_npy(&payload)?;
    debug!(path = %path.display(), shape = %buffer.shape(), "Loaded array");
    Ok(buffer)
}

/// Decodes an in-memory `.npy` payload.
pub fn parse_npy(payload: &[u8]) -> IoResult<PixelBuffer> {
    let (header, data_offset) = parse_header(payload)?;
    if header.fortran_order {
        return Err(IoError::NpyHeader("fortran_order arrays are not supported".into()));
    }

    let shape = Shape::from_dims(&header.shape)?;
    let size = header.dtype.size();
    let expected = shape
        .len()
        .checked_mul(size)
        .ok_or_else(|| IoError::NpyHeader("shape overflows addressable size".into()))?;
    let body = &payload[data_offset..];
    if body.len() < expected {
        return Err(IoError::NpyHeader(format!(
            "data truncated: shape {shape} needs {expected} bytes, found {}",
            body.len()
        )));
    }

    let samples = body[..expected]
        .chunks_exact(size)
        .map(|chunk| header.dtype.decode(chunk))
        .collect();
    Ok(PixelBuffer::new(shape, samples)?)
}

/// Parses magic, version and header dictionary; returns the header and data offset.
pub fn parse_header(payload: &[u8]) -> IoResult<(NpyHeader, usize)> {
    if payload.len() < 10 || payload[..6] != NPY_MAGIC {
        return Err(IoError::NpyMagic("missing \\x93NUMPY prefix".into()));
    }

    let (header_len, header_offset) = match (payload[6], payload[7]) {
        (1, 0) => (usize::from(u16::from_le_bytes([payload[8], payload[9]])), 10),
        (2, 0) | (3, 0) => {
            if payload.len() < 12 {
                return Err(IoError::NpyMagic("truncated before header length".into()));
            }
            let raw = u32::from_le_bytes([payload[8], payload[9], payload[10], payload[11]]);
            (raw as usize, 12)
        }
        (major, minor) => {
            return Err(IoError::NpyMagic(format!("unknown version {major}.{minor}")));
        }
    };

    if header_len == 0 || header_len > MAX_HEADER_BYTES {
        return Err(IoError::NpyHeader(format!("header length {header_len} out of range")));
    }
    let end = header_offset + header_len;
    if payload.len() < end {
        return Err(IoError::NpyHeader("payload truncated inside header".into()));
    }

    let text = std::str::from_utf8(&payload[header_offset..end])
        .map_err(|_| IoError::NpyHeader("header is not ASCII".into()))?;
    Ok((parse_dictionary(text)?, end))
}

fn parse_dictionary(text: &str) -> IoResult<NpyHeader> {
    let dict = text.trim();
    if !(dict.starts_with('{') && dict.ends_with('}')) {
        return Err(IoError::NpyHeader("dictionary must be wrapped in braces".into()));
    }

    let descr = quoted_value(value_after_key(dict, "descr")?)?;
    let fortran_order = match value_after_key(dict, "fortran_order")? {
        v if v.starts_with("True") => true,
        v if v.starts_with("False") => false,
        _ => return Err(IoError::NpyHeader("fortran_order must be True or False".into())),
    };
    let shape = shape_tuple(value_after_key(dict, "shape")?)?;

    Ok(NpyHeader {
        dtype: Dtype::parse(descr)?,
        fortran_order,
        shape,
    })
}

fn value_after_key<'a>(dict: &'a str, key: &str) -> IoResult<&'a str> {
    let single = format!("'{key}'");
    let double = format!("\"{key}\"");
    let start = dict
        .find(&single)
        .or_else(|| dict.find(&double))
        .ok_or_else(|| IoError::NpyHeader(format!("missing '{key}'")))?;
    let tail = dict[start + single.len()..].trim_start();
    let tail = tail
        .strip_prefix(':')
        .ok_or_else(|| IoError::NpyHeader(format!("'{key}' lacks ':'")))?;
    Ok(tail.trim_start())
}

fn quoted_value(value: &str) -> IoResult<&str> {
    let quote = value
        .chars()
        .next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| IoError::NpyHeader("expected quoted string".into()))?;
    let tail = &value[1..];
    let end = tail
        .find(quote)
        .ok_or_else(|| IoError::NpyHeader("unterminated string".into()))?;
    Ok(&tail[..end])
}

fn shape_tuple(value: &str) -> IoResult<Vec<usize>> {
    let inner = value
        .strip_prefix('(')
        .and_then(|v| v.split_once(')'))
        .map(|(inner, _)| inner)
        .ok_or_else(|| IoError::NpyHeader("shape must be a tuple".into()))?;

    inner
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<usize>()
                .map_err(|_| IoError::NpyHeader(format!("bad shape entry '{t}'")))
        })
        .collect()
}

/// Encodes a buffer as a version 1.0 `<f8` `.npy` payload.
pub fn encode_npy(buffer: &PixelBuffer) -> Vec<u8> {
    let dims: Vec<String> = buffer.shape().dims().iter().map(usize::to_string).collect();
    let mut dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}), }}",
        dims.join(", ")
    );
    // magic + version + u16 length + dict + trailing newline
    let unpadded = NPY_MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    dict.extend(std::iter::repeat_n(' ', padding));
    dict.push('\n');

    let mut out = Vec::with_capacity(NPY_MAGIC.len() + 4 + dict.len() + buffer.data().len() * 8);
    out.extend_from_slice(&NPY_MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    for sample in buffer.data() {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

/// Writes a buffer as a `.npy` file.
pub fn write_npy(path: &Path, buffer: &PixelBuffer) -> IoResult<()> {
    std::fs::write(path, encode_npy(buffer)).map_err(|e| IoError::file(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn raw_npy(descr: &str, shape: &str, body: &[u8]) -> Vec<u8> {
        let dict = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}\n");
        let mut out = NPY_MAGIC.to_vec();
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(dict.len() as u16).to_le_bytes());
        out.extend_from_slice(dict.as_bytes());
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_encoded_header_is_aligned() {
        let buf = PixelBuffer::zeros(Shape::new(1, 3, 5, 3));
        let bytes = encode_npy(&buf);
        let (_, offset) = parse_header(&bytes).unwrap();
        assert_eq!(offset % HEADER_ALIGN, 0);
        assert_eq!(bytes.len(), offset + 45 * 8);
    }

    #[test]
    fn test_written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.npy");
        let buf = PixelBuffer::from_fn(Shape::new(2, 4, 3, 4), |f, r, c, ch| {
            (f * 1000 + r * 100 + c * 10 + ch) as f64 * 0.25
        });

        write_npy(&path, &buf).unwrap();
        assert_eq!(read_npy(&path).unwrap(), buf);
    }

    #[test]
    fn test_u8_samples_widen() {
        let bytes = raw_npy("|u1", "(1, 1, 2, 1)", &[0, 255]);
        let buf = parse_npy(&bytes).unwrap();
        assert_eq!(buf.data(), &[0.0, 255.0]);
    }

    #[test]
    fn test_f64_and_f16_samples() {
        let mut body = Vec::new();
        body.extend_from_slice(&0.125f64.to_le_bytes());
        body.extend_from_slice(&(-2.5f64).to_le_bytes());
        let buf = parse_npy(&raw_npy("<f8", "(1, 1, 1, 2)", &body)).unwrap();
        assert_eq!(buf.data(), &[0.125, -2.5]);

        let body: Vec<u8> = [f16::from_f32(0.5), f16::from_f32(0.333)]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let buf = parse_npy(&raw_npy("<f2", "(1, 1, 1, 2)", &body)).unwrap();
        assert_abs_diff_eq!(buf.data()[1], 0.333, epsilon = 1e-3);
    }

    #[test]
    fn test_rank3_does_not_match_rank4() {
        let body: Vec<u8> = [1.0f32, 2.0, 3.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        let flat = parse_npy(&raw_npy("<f4", "(1, 1, 3)", &body)).unwrap();
        let framed = parse_npy(&raw_npy("<f4", "(1, 1, 1, 3)", &body)).unwrap();

        assert_eq!(flat.shape(), Shape::single_frame(1, 1, 3));
        assert_eq!(flat.frame(0).unwrap(), framed.frame(0).unwrap());
        assert_ne!(flat.shape(), framed.shape());
        assert_ne!(flat, framed);
    }

    #[test]
    fn test_rank3_written_as_rank3() {
        let buf = PixelBuffer::new(Shape::single_frame(1, 2, 3), vec![0.5; 6]).unwrap();
        let bytes = encode_npy(&buf);
        let (header, _) = parse_header(&bytes).unwrap();
        assert_eq!(header.shape, [1, 2, 3]);
        assert_eq!(header.dtype, Dtype::F64);
        assert_eq!(parse_npy(&bytes).unwrap(), buf);
    }

    #[test]
    fn test_f64_keeps_full_precision() {
        let sample: f64 = 0.5 + 1e-9;
        let buf = parse_npy(&raw_npy("<f8", "(1, 1, 1, 1)", &sample.to_le_bytes())).unwrap();
        assert_eq!(buf.data(), &[sample]);

        let large = 16_777_217i32;
        let buf = parse_npy(&raw_npy("<i4", "(1, 1, 1, 1)", &large.to_le_bytes())).unwrap();
        assert_eq!(buf.data(), &[16_777_217.0]);
    }

    #[test]
    fn test_rejects_big_endian_and_fortran() {
        assert!(matches!(
            parse_npy(&raw_npy(">f4", "(1, 1, 1, 1)", &[0; 4])),
            Err(IoError::UnsupportedDtype(_))
        ));

        let dict = "{'descr': '<f4', 'fortran_order': True, 'shape': (1, 1, 1, 1), }\n";
        let mut bytes = NPY_MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(dict.len() as u16).to_le_bytes());
        bytes.extend_from_slice(dict.as_bytes());
        bytes.extend_from_slice(&[0; 4]);
        assert!(matches!(parse_npy(&bytes), Err(IoError::NpyHeader(_))));
    }

    #[test]
    fn test_rejects_truncated_data_and_bad_magic() {
        assert!(matches!(
            parse_npy(&raw_npy("<f4", "(1, 2, 2, 1)", &[0; 8])),
            Err(IoError::NpyHeader(_))
        ));
        assert!(matches!(parse_npy(b"PK\x03\x04 not npy"), Err(IoError::NpyMagic(_))));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = read_npy(Path::new("/nonexistent/decoded_image.npy")).unwrap_err();
        assert!(err.is_not_found());
    }
}
