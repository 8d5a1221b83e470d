//! Model Loaders
//!
//! Parses the persisted model layouts into a [`VectorStore`]:
//!
//! - The two-file layout the model artifacts ship in: a vocabulary index
//!   file (one token per line, line i maps to matrix row i) next to a
//!   NumPy `.npy` file holding the row-major vector matrix.
//! - The single-file GloVe text layout (`token v1 .. vD` per line).
//!
//! Both are existing external formats; they are parsed, not redesigned.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tracing::debug;

use super::store::VectorStore;
use crate::error::LoadError;

/// `.npy` format: magic, one-byte major/minor version, then an ASCII
/// header dict (`descr`, `fortran_order`, `shape`) whose length is a
/// little-endian u16 (v1) or u32 (v2+), then the raw array body.
const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// Load a store from a vocabulary index file plus a `.npy` vector matrix.
///
/// The matrix must be a little-endian C-order 2-d array of `f4` or `f8`
/// with one row per vocabulary line; anything else is a [`LoadError`].
pub fn load_npy<P, Q>(vocab_path: P, vectors_path: Q) -> Result<VectorStore, LoadError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let tokens = read_vocab(vocab_path.as_ref())?;
    let (data, rows, cols) = read_npy_matrix(vectors_path.as_ref())?;

    if tokens.is_empty() {
        return Err(LoadError::EmptyVocabulary);
    }
    if tokens.len() != rows {
        return Err(LoadError::ShapeMismatch {
            vocab: tokens.len(),
            rows,
        });
    }

    debug!(rows, cols, "parsed vector matrix");
    VectorStore::from_rows(tokens, data, cols)
}

/// Load a store from GloVe text format: one `token v1 .. vD` line per
/// entry, dimensionality fixed by the first line.
pub fn load_text<P: AsRef<Path>>(path: P) -> Result<VectorStore, LoadError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut tokens = Vec::new();
    let mut data = Vec::new();
    let mut dimension = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let mut parts = line.split_whitespace();
        let Some(token) = parts.next() else {
            continue; // blank line
        };

        let mut count = 0usize;
        for part in parts {
            let value: f32 = part.parse().map_err(|_| {
                LoadError::Malformed(format!("line {}: invalid number '{}'", line_no, part))
            })?;
            data.push(value);
            count += 1;
        }

        if dimension == 0 {
            if count == 0 {
                return Err(LoadError::Malformed(format!(
                    "line {}: entry has no vector components",
                    line_no
                )));
            }
            dimension = count;
        } else if count != dimension {
            return Err(LoadError::DimensionMismatch {
                line: line_no,
                expected: dimension,
                got: count,
            });
        }

        tokens.push(token.to_string());
    }

    if tokens.is_empty() {
        return Err(LoadError::EmptyVocabulary);
    }

    VectorStore::from_rows(tokens, data, dimension)
}

/// Read the vocabulary index: one token per line, blank lines skipped.
fn read_vocab(path: &Path) -> Result<Vec<String>, LoadError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut tokens = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            tokens.push(line);
        }
    }
    Ok(tokens)
}

/// Parse a `.npy` file into (values, rows, cols). `f8` bodies are
/// narrowed to `f32` storage.
fn read_npy_matrix(path: &Path) -> Result<(Vec<f32>, usize, usize), LoadError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic)?;
    if magic != NPY_MAGIC {
        return Err(LoadError::Malformed("bad npy magic".to_string()));
    }

    let mut version = [0u8; 2];
    reader.read_exact(&mut version)?;
    let header_len = match version[0] {
        1 => {
            let mut buf = [0u8; 2];
            reader.read_exact(&mut buf)?;
            u16::from_le_bytes(buf) as usize
        }
        2 | 3 => {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf)?;
            u32::from_le_bytes(buf) as usize
        }
        v => {
            return Err(LoadError::Malformed(format!(
                "unsupported npy version {}.{}",
                v, version[1]
            )))
        }
    };

    let mut header_buf = vec![0u8; header_len];
    reader.read_exact(&mut header_buf)?;
    let header = String::from_utf8(header_buf)
        .map_err(|_| LoadError::Malformed("npy header is not valid utf-8".to_string()))?;

    let descr = header_str_field(&header, "descr")?;
    let itemsize = match descr {
        "<f4" => 4,
        "<f8" => 8,
        other => return Err(LoadError::UnsupportedDtype(other.to_string())),
    };

    if header_field(&header, "fortran_order")?.starts_with("True") {
        return Err(LoadError::Malformed(
            "fortran-order arrays are not supported".to_string(),
        ));
    }

    let shape = header_shape(&header)?;
    let &[rows, cols] = shape.as_slice() else {
        return Err(LoadError::Malformed(format!(
            "expected a 2-d vector matrix, got {}-d shape",
            shape.len()
        )));
    };

    let byte_len = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(itemsize))
        .ok_or_else(|| LoadError::Malformed("npy shape overflows".to_string()))?;

    let mut body = vec![0u8; byte_len];
    reader.read_exact(&mut body)?;

    let data = match itemsize {
        4 => body
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
        _ => body
            .chunks_exact(8)
            .map(|c| {
                f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32
            })
            .collect(),
    };

    Ok((data, rows, cols))
}

/// Slice the header after `'key':`.
fn header_field<'a>(header: &'a str, key: &str) -> Result<&'a str, LoadError> {
    let pattern = format!("'{}':", key);
    let start = header
        .find(&pattern)
        .ok_or_else(|| LoadError::Malformed(format!("npy header missing '{}'", key)))?;
    Ok(header[start + pattern.len()..].trim_start())
}

/// Extract a quoted string header value.
fn header_str_field<'a>(header: &'a str, key: &str) -> Result<&'a str, LoadError> {
    let rest = header_field(header, key)?;
    let rest = rest
        .strip_prefix('\'')
        .ok_or_else(|| LoadError::Malformed(format!("npy header '{}' is not a string", key)))?;
    let end = rest
        .find('\'')
        .ok_or_else(|| LoadError::Malformed(format!("npy header '{}' is unterminated", key)))?;
    Ok(&rest[..end])
}

/// Extract the shape tuple.
fn header_shape(header: &str) -> Result<Vec<usize>, LoadError> {
    let rest = header_field(header, "shape")?;
    let rest = rest
        .strip_prefix('(')
        .ok_or_else(|| LoadError::Malformed("npy header shape is not a tuple".to_string()))?;
    let end = rest
        .find(')')
        .ok_or_else(|| LoadError::Malformed("npy header shape is unterminated".to_string()))?;

    let mut dims = Vec::new();
    for part in rest[..end].split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let dim: usize = part
            .parse()
            .map_err(|_| LoadError::Malformed(format!("invalid shape dimension '{}'", part)))?;
        dims.push(dim);
    }
    Ok(dims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_vocab(path: &Path, tokens: &[&str]) {
        let mut file = File::create(path).unwrap();
        for token in tokens {
            writeln!(file, "{}", token).unwrap();
        }
    }

    fn npy_header(descr: &str, rows: usize, cols: usize) -> Vec<u8> {
        let dict = format!(
            "{{'descr': '{}', 'fortran_order': False, 'shape': ({}, {}), }}",
            descr, rows, cols
        );
        // Pad so magic + version + length prefix + header is 64-aligned,
        // newline-terminated, as numpy writes it.
        let mut header = dict.into_bytes();
        while (10 + header.len() + 1) % 64 != 0 {
            header.push(b' ');
        }
        header.push(b'\n');

        let mut out = Vec::new();
        out.extend_from_slice(NPY_MAGIC);
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(&header);
        out
    }

    fn write_npy_f4(path: &Path, rows: usize, cols: usize, values: &[f32]) {
        let mut out = npy_header("<f4", rows, cols);
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
        std::fs::write(path, out).unwrap();
    }

    fn write_npy_f8(path: &Path, rows: usize, cols: usize, values: &[f64]) {
        let mut out = npy_header("<f8", rows, cols);
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
        std::fs::write(path, out).unwrap();
    }

    #[test]
    fn test_load_npy_f4() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("model.vocab");
        let vectors = dir.path().join("model.npy");

        write_vocab(&vocab, &["cat", "dog", "car"]);
        write_npy_f4(&vectors, 3, 2, &[1.0, 0.0, 0.9, 0.1, 0.0, 1.0]);

        let store = load_npy(&vocab, &vectors).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.dimension(), 2);
        assert_eq!(store.lookup("dog").unwrap(), &[0.9, 0.1]);
    }

    #[test]
    fn test_load_npy_f8() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("model.vocab");
        let vectors = dir.path().join("model.npy");

        write_vocab(&vocab, &["up", "down"]);
        write_npy_f8(&vectors, 2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let store = load_npy(&vocab, &vectors).unwrap();
        assert_eq!(store.dimension(), 3);
        assert_eq!(store.lookup("down").unwrap(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_load_npy_bad_magic() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("model.vocab");
        let vectors = dir.path().join("model.npy");

        write_vocab(&vocab, &["cat"]);
        std::fs::write(&vectors, b"not an npy file").unwrap();

        let result = load_npy(&vocab, &vectors);
        assert!(matches!(result, Err(LoadError::Malformed(_))));
    }

    #[test]
    fn test_load_npy_truncated_body() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("model.vocab");
        let vectors = dir.path().join("model.npy");

        write_vocab(&vocab, &["cat", "dog"]);
        let mut out = npy_header("<f4", 2, 2);
        out.extend_from_slice(&1.0f32.to_le_bytes()); // 1 of 4 values
        std::fs::write(&vectors, out).unwrap();

        let result = load_npy(&vocab, &vectors);
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_load_npy_vocab_count_mismatch() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("model.vocab");
        let vectors = dir.path().join("model.npy");

        write_vocab(&vocab, &["cat", "dog", "car"]);
        write_npy_f4(&vectors, 2, 2, &[1.0, 0.0, 0.0, 1.0]);

        let result = load_npy(&vocab, &vectors);
        assert!(matches!(
            result,
            Err(LoadError::ShapeMismatch { vocab: 3, rows: 2 })
        ));
    }

    #[test]
    fn test_load_npy_rejects_fortran_order() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("model.vocab");
        let vectors = dir.path().join("model.npy");

        write_vocab(&vocab, &["cat"]);
        let dict = "{'descr': '<f4', 'fortran_order': True, 'shape': (1, 2), }";
        let mut header = dict.as_bytes().to_vec();
        header.push(b'\n');
        let mut out = Vec::new();
        out.extend_from_slice(NPY_MAGIC);
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(&header);
        out.extend_from_slice(&[0u8; 8]);
        std::fs::write(&vectors, out).unwrap();

        assert!(load_npy(&vocab, &vectors).is_err());
    }

    #[test]
    fn test_load_npy_rejects_1d_shape() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("model.vocab");
        let vectors = dir.path().join("model.npy");

        write_vocab(&vocab, &["cat"]);
        let dict = "{'descr': '<f4', 'fortran_order': False, 'shape': (4,), }";
        let mut header = dict.as_bytes().to_vec();
        header.push(b'\n');
        let mut out = Vec::new();
        out.extend_from_slice(NPY_MAGIC);
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(&header);
        out.extend_from_slice(&[0u8; 16]);
        std::fs::write(&vectors, out).unwrap();

        assert!(load_npy(&vocab, &vectors).is_err());
    }

    #[test]
    fn test_load_npy_unsupported_dtype() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("model.vocab");
        let vectors = dir.path().join("model.npy");

        write_vocab(&vocab, &["cat"]);
        let mut out = npy_header("<i4", 1, 2);
        out.extend_from_slice(&[0u8; 8]);
        std::fs::write(&vectors, out).unwrap();

        let result = load_npy(&vocab, &vectors);
        assert!(matches!(result, Err(LoadError::UnsupportedDtype(d)) if d == "<i4"));
    }

    #[test]
    fn test_load_npy_empty_vocab() {
        let dir = tempdir().unwrap();
        let vocab = dir.path().join("model.vocab");
        let vectors = dir.path().join("model.npy");

        std::fs::write(&vocab, "").unwrap();
        write_npy_f4(&vectors, 1, 2, &[1.0, 0.0]);

        let result = load_npy(&vocab, &vectors);
        assert!(matches!(result, Err(LoadError::EmptyVocabulary)));
    }

    #[test]
    fn test_load_npy_missing_file() {
        let dir = tempdir().unwrap();
        let result = load_npy(dir.path().join("nope.vocab"), dir.path().join("nope.npy"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_load_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.txt");
        std::fs::write(&path, "cat 1.0 0.0\ndog 0.9 0.1\ncar 0.0 1.0\n").unwrap();

        let store = load_text(&path).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.dimension(), 2);
        assert_eq!(store.lookup("car").unwrap(), &[0.0, 1.0]);
    }

    #[test]
    fn test_load_text_ragged_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.txt");
        std::fs::write(&path, "cat 1.0 0.0\ndog 0.9\n").unwrap();

        let result = load_text(&path);
        assert!(matches!(
            result,
            Err(LoadError::DimensionMismatch {
                line: 2,
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn test_load_text_bad_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.txt");
        std::fs::write(&path, "cat 1.0 zero\n").unwrap();

        let result = load_text(&path);
        assert!(matches!(result, Err(LoadError::Malformed(msg)) if msg.contains("line 1")));
    }

    #[test]
    fn test_load_text_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.txt");
        std::fs::write(&path, "").unwrap();

        assert!(matches!(load_text(&path), Err(LoadError::EmptyVocabulary)));
    }
}
