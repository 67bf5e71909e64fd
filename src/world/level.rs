//! Level loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable level files.
//! Supports both compressed (brotli) and uncompressed RON files.
//! - Reading: Auto-detects format by checking for valid RON start
//! - Writing: Always uses brotli compression
//!
//! Side classification is not stored; it is recomputed after every load.

use std::collections::HashSet;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use thiserror::Error;
use tracing::{error, info};

use super::{validate_segments, ClassifyStats, World, SIDE_COUNT};

/// Validation limits to prevent resource exhaustion from malicious files
pub mod limits {
    /// Maximum number of segments in a level
    pub const MAX_SEGMENTS: usize = 9000;
    /// Maximum number of vertices in a level
    pub const MAX_VERTICES: usize = MAX_SEGMENTS * 4;
    /// Maximum number of wall records
    pub const MAX_WALLS: usize = MAX_SEGMENTS;
    /// Maximum coordinate value (prevents overflow issues)
    pub const MAX_COORD: f32 = 1_000_000.0;
    /// Largest plane tolerance a level may request
    pub const MAX_TOLERANCE: f32 = 1.0;
}

/// Error type for level loading
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("brotli error: {0}")]
    Compression(std::io::Error),
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Check if a float is valid (not NaN or Inf)
fn is_valid_float(f: f32) -> bool {
    f.is_finite() && f.abs() <= limits::MAX_COORD
}

/// Validate one segment's indices and links
fn validate_segment(world: &World, segnum: usize) -> Result<(), String> {
    let context = format!("segment[{}]", segnum);
    let seg = &world.segments[segnum];

    let mut seen = HashSet::new();
    for (i, &v) in seg.verts.iter().enumerate() {
        if v >= world.vertices.len() {
            return Err(format!("{} vertex[{}]: index {} out of range (only {} vertices)",
                context, i, v, world.vertices.len()));
        }
        if !seen.insert(v) {
            return Err(format!("{} vertex[{}]: index {} used twice", context, i, v));
        }
    }

    for side in 0..SIDE_COUNT {
        let context = format!("{} side[{}]", context, side);

        if let Some(wall) = seg.sides[side].wall {
            if wall >= world.walls.len() {
                return Err(format!("{}: wall {} out of range (only {} walls)",
                    context, wall, world.walls.len()));
            }
            if seg.neighbors[side].is_none() {
                return Err(format!("{}: wall {} on a side with no neighbor", context, wall));
            }
        }

        let Some(other) = seg.neighbors[side] else {
            continue;
        };
        if other >= world.segments.len() {
            return Err(format!("{}: neighbor {} out of range (only {} segments)",
                context, other, world.segments.len()));
        }
        if other == segnum {
            return Err(format!("{}: links to itself", context));
        }

        // Adjacency must be symmetric and the shared face must be the same quad
        let Some(back) = world.find_connect_side(segnum, other) else {
            return Err(format!("{}: neighbor {} has no side linking back", context, other));
        };
        let mut ours = seg.side_verts(side);
        let mut theirs = world.segments[other].side_verts(back);
        ours.sort_unstable();
        theirs.sort_unstable();
        if ours != theirs {
            return Err(format!("{}: face vertices {:?} differ from segment[{}] side[{}] {:?}",
                context, ours, other, back, theirs));
        }
    }

    Ok(())
}

/// Validate an entire level's structure (indices, limits, adjacency)
pub fn validate_world(world: &World) -> Result<(), LevelError> {
    if world.segments.len() > limits::MAX_SEGMENTS {
        return Err(LevelError::Validation(format!(
            "too many segments ({} > {})", world.segments.len(), limits::MAX_SEGMENTS
        )));
    }
    if world.vertices.len() > limits::MAX_VERTICES {
        return Err(LevelError::Validation(format!(
            "too many vertices ({} > {})", world.vertices.len(), limits::MAX_VERTICES
        )));
    }
    if world.walls.len() > limits::MAX_WALLS {
        return Err(LevelError::Validation(format!(
            "too many walls ({} > {})", world.walls.len(), limits::MAX_WALLS
        )));
    }
    if !(0.0..=limits::MAX_TOLERANCE).contains(&world.tolerance) {
        return Err(LevelError::Validation(format!("invalid tolerance {}", world.tolerance)));
    }

    for (i, v) in world.vertices.iter().enumerate() {
        if !is_valid_float(v.x) || !is_valid_float(v.y) || !is_valid_float(v.z) {
            return Err(LevelError::Validation(format!(
                "vertex[{}]: invalid coordinates ({}, {}, {})", i, v.x, v.y, v.z
            )));
        }
    }

    for segnum in 0..world.segments.len() {
        validate_segment(world, segnum).map_err(LevelError::Validation)?;
    }

    Ok(())
}

/// Plain RON starts with '(' or whitespace; anything else is brotli
fn is_plain_ron(bytes: &[u8]) -> bool {
    bytes
        .first()
        .map(|&b| b == b'(' || b == b' ' || b == b'\n' || b == b'\r' || b == b'\t')
        .unwrap_or(false)
}

fn decode_level_text(bytes: &[u8]) -> Result<String, LevelError> {
    if is_plain_ron(bytes) {
        return Ok(String::from_utf8(bytes.to_vec())?);
    }
    let mut decompressed = Vec::new();
    brotli::BrotliDecompress(&mut Cursor::new(bytes), &mut decompressed)
        .map_err(LevelError::Compression)?;
    Ok(String::from_utf8(decompressed)?)
}

/// Log where in the text a RON parse failed
fn report_parse_error(source: &str, contents: &str, e: &ron::error::SpannedError) {
    let pos = e.position;
    let line = contents.lines().nth(pos.line.saturating_sub(1)).unwrap_or("");
    let start = pos.col.saturating_sub(20).min(line.len());
    let end = (pos.col + 30).min(line.len());
    let excerpt = line.get(start..end).unwrap_or(line);
    error!(%source, line = pos.line, col = pos.col, context = excerpt, "RON parse error: {}", e.code);
}

/// Validate, classify and log a freshly parsed level
fn finish_loading(world: &mut World, source: &str) -> Result<ClassifyStats, LevelError> {
    validate_world(world)?;
    let stats = validate_segments(world);
    info!(
        %source,
        segments = world.segments.len(),
        vertices = world.vertices.len(),
        walls = world.walls.len(),
        quads = stats.quads,
        triangulated = stats.triangulated,
        "level loaded"
    );
    Ok(stats)
}

/// Parse level data from bytes (plain or brotli-compressed RON)
pub fn parse_world_data(bytes: &[u8]) -> Result<World, LevelError> {
    let contents = decode_level_text(bytes)?;
    load_world_from_str(&contents)
}

/// Load a level from a RON string (for embedded levels or testing)
pub fn load_world_from_str(s: &str) -> Result<World, LevelError> {
    let mut world: World = match ron::from_str(s) {
        Ok(w) => w,
        Err(e) => {
            report_parse_error("<memory>", s, &e);
            return Err(e.into());
        }
    };
    finish_loading(&mut world, "<memory>")?;
    Ok(world)
}

/// Load a level from a RON file (supports both compressed and uncompressed)
pub fn load_world<P: AsRef<Path>>(path: P) -> Result<World, LevelError> {
    load_world_classified(path, None).map(|(world, _)| world)
}

/// Load a level file and return the classification summary with it.
///
/// `tolerance` replaces the value stored in the file before the sides are
/// classified, so the level is classified exactly once.
pub fn load_world_classified<P: AsRef<Path>>(
    path: P,
    tolerance: Option<f32>,
) -> Result<(World, ClassifyStats), LevelError> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let bytes = fs::read(path)?;
    let contents = decode_level_text(&bytes)?;

    let mut world: World = match ron::from_str(&contents) {
        Ok(w) => w,
        Err(e) => {
            report_parse_error(&source, &contents, &e);
            return Err(e.into());
        }
    };
    if let Some(tolerance) = tolerance {
        world.tolerance = tolerance;
    }
    let stats = finish_loading(&mut world, &source)?;
    Ok((world, stats))
}

/// Serialize a level to compressed bytes
pub fn serialize_world(world: &World) -> Result<Vec<u8>, LevelError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let ron_string = ron::ser::to_string_pretty(world, config)?;

    // Compress with brotli (quality 6, window 22 - good balance of speed/ratio)
    let mut compressed = Vec::new();
    brotli::BrotliCompress(&mut Cursor::new(ron_string.as_bytes()), &mut compressed, &brotli::enc::BrotliEncoderParams {
        quality: 6,
        lgwin: 22,
        ..Default::default()
    }).map_err(LevelError::Compression)?;

    Ok(compressed)
}

/// Save a level to a compressed RON file (brotli)
pub fn save_world<P: AsRef<Path>>(world: &World, path: P) -> Result<(), LevelError> {
    let path = path.as_ref();
    let data = serialize_world(world)?;
    fs::write(path, &data)?;
    info!(path = %path.display(), bytes = data.len(), segments = world.segments.len(), "level saved");
    Ok(())
}
