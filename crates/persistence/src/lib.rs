#![deny(warnings)]

//! Persistence layer: versioned save games.
//!
//! The primary encoding is pretty-printed JSON. Gzip-compressed JSON and a
//! compact binary encoding (magic bytes followed by bincode) are also
//! available. Loading detects the encoding from the first bytes of the
//! buffered source.

pub mod snapshot;

pub use snapshot::{SaveGame, SaveHeader};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sim_core::{Content, Player, SimError};
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Identifies a save file inside the JSON header.
pub const SAVE_MAGIC: &str = "cpu-economy-save";

/// Prefix of the binary encoding.
pub const BINARY_MAGIC: &[u8; 4] = b"CPUE";

const GZIP_MAGIC: &[u8; 2] = &[0x1f, 0x8b];

/// Current save format version. Increment when breaking the format.
pub const FORMAT_VERSION: u32 = 1;

/// Errors raised while writing or reading a save.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("binary codec error: {0}")]
    Binary(#[from] bincode::Error),
    #[error("not a save file")]
    InvalidMagic,
    #[error("unsupported save version {found} (this build reads {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("unknown difficulty in save: {0}")]
    UnknownDifficulty(String),
    #[error("unknown technology in save: {0}")]
    UnknownTech(String),
    #[error("invalid save data: {0}")]
    Invalid(#[from] SimError),
}

impl From<SaveError> for SimError {
    fn from(e: SaveError) -> Self {
        SimError::Serialization(e.to_string())
    }
}

/// On-disk encoding of a save.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SaveEncoding {
    /// Human-diffable JSON.
    #[default]
    Json,
    /// JSON compressed with gzip.
    JsonGz,
    /// Compact binary.
    Binary,
}

/// Write `player` to `sink`.
pub fn write_game<W: Write>(player: &Player, mut sink: W, encoding: SaveEncoding) -> Result<(), SaveError> {
    let save = SaveGame::capture(player);
    match encoding {
        SaveEncoding::Json => {
            serde_json::to_writer_pretty(&mut sink, &save)?;
            sink.write_all(b"\n")?;
        }
        SaveEncoding::JsonGz => {
            let mut gz = GzEncoder::new(&mut sink, Compression::default());
            serde_json::to_writer(&mut gz, &save)?;
            gz.finish()?;
        }
        SaveEncoding::Binary => {
            sink.write_all(BINARY_MAGIC)?;
            bincode::serialize_into(&mut sink, &save)?;
        }
    }
    sink.flush()?;
    info!(raw_sec = player.raw_sec, ?encoding, "game saved");
    Ok(())
}

fn detect_encoding<R: BufRead>(source: &mut R) -> Result<SaveEncoding, SaveError> {
    let head = source.fill_buf()?;
    if head.starts_with(BINARY_MAGIC) {
        return Ok(SaveEncoding::Binary);
    }
    if head.starts_with(GZIP_MAGIC) {
        return Ok(SaveEncoding::JsonGz);
    }
    match head.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Ok(SaveEncoding::Json),
        _ => Err(SaveError::InvalidMagic),
    }
}

/// Decode a save without relinking it to content.
pub fn read_save<R: BufRead>(mut source: R) -> Result<SaveGame, SaveError> {
    let save: SaveGame = match detect_encoding(&mut source)? {
        SaveEncoding::Json => serde_json::from_reader(source)?,
        SaveEncoding::JsonGz => serde_json::from_reader(GzDecoder::new(source))?,
        SaveEncoding::Binary => {
            source.consume(BINARY_MAGIC.len());
            bincode::deserialize_from(source)?
        }
    };
    save.header.validate()?;
    Ok(save)
}

/// Read only the header of a save.
///
/// The whole save is decoded; no encoding supports partial reads.
pub fn read_header<R: BufRead>(source: R) -> Result<SaveHeader, SaveError> {
    Ok(read_save(source)?.header)
}

/// Load a player from `source`, relinking technologies to `content`.
pub fn load_game<R: BufRead>(source: R, content: &Content) -> Result<Player, SaveError> {
    let player = read_save(source)?.restore(content)?;
    info!(raw_sec = player.raw_sec, "game loaded");
    Ok(player)
}

/// Save to a file, creating parent directories as needed.
pub fn save_to_path(player: &Player, path: &Path, encoding: SaveEncoding) -> Result<(), SaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    write_game(player, BufWriter::new(file), encoding)
}

/// Load from a file written by [`save_to_path`].
pub fn load_from_path(path: &Path, content: &Content) -> Result<Player, SaveError> {
    let file = fs::File::open(path)?;
    load_game(BufReader::new(file), content)
}

/// Returns the default location used for quick saves.
pub fn default_save_path() -> &'static str {
    "./saves/quicksave.json"
}
