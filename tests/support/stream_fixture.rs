//! Test fixture utilities: load NDJSON stream bodies and cut them into chunks

#![allow(dead_code)]

use std::io;

pub type Chunk = Result<Vec<u8>, io::Error>;

/// Load an `.ndjson` fixture file as raw bytes
pub fn load_ndjson_fixture(path: &str) -> io::Result<Vec<u8>> {
    let raw = std::fs::read_to_string(path)?;
    // Normalize line endings
    Ok(raw.replace("\r\n", "\n").into_bytes())
}

/// One chunk per line, newline included (the well-behaved producer case)
pub fn chunk_per_line(body: &[u8]) -> Vec<Chunk> {
    body.split_inclusive(|b| *b == b'\n')
        .map(|line| Ok(line.to_vec()))
        .collect()
}

/// Fixed-size chunks that ignore line and UTF-8 boundaries
pub fn chunk_every(body: &[u8], size: usize) -> Vec<Chunk> {
    body.chunks(size.max(1)).map(|c| Ok(c.to_vec())).collect()
}

/// Split at the given byte offsets
pub fn chunk_at(body: &[u8], cuts: &[usize]) -> Vec<Chunk> {
    let mut out = Vec::new();
    let mut start = 0;
    for &cut in cuts {
        let cut = cut.clamp(start, body.len());
        out.push(Ok(body[start..cut].to_vec()));
        start = cut;
    }
    out.push(Ok(body[start..].to_vec()));
    out
}

/// Byte source over prepared chunks
pub fn source(chunks: Vec<Chunk>) -> futures_util::stream::Iter<std::vec::IntoIter<Chunk>> {
    futures_util::stream::iter(chunks)
}
