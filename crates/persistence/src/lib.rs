#![deny(warnings)]

//! Persistence layer: portable save tokens and the key-value save medium.
//!
//! A save token is the canonical JSON form of a [`GameState`] wrapped in
//! standard base64, giving a single copy-pasteable string usable both for
//! storage records and for user-facing export/import codes. Decoding never
//! clamps: callers must route a decoded state through the engine, which
//! normalizes it before it becomes authoritative.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use idle_core::GameState;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Record key for the single save slot.
pub const SAVE_KEY: &str = "energy_clicker_save";

/// A state that could not be serialized. Only pathological states (e.g.
/// hand-built with non-finite numbers) can hit this.
#[derive(Debug, Error)]
#[error("state could not be serialized: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// A token that is not a readable save. Every layer of corruption folds
/// into this one recoverable category: the caller keeps its current state
/// and may prompt for re-entry.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not valid base64.
    #[error("save token is not valid base64: {0}")]
    Transport(#[from] base64::DecodeError),
    /// Decoded bytes are not UTF-8 text.
    #[error("save token does not contain text: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    /// JSON missing required fields or carrying ill-typed ones.
    #[error("save payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Serialize a state into a transport-safe token. Exact inverse of
/// [`decode_token`] for any normalized state.
pub fn encode_token(state: &GameState) -> Result<String, EncodeError> {
    let json = serde_json::to_string(state)?;
    Ok(STANDARD.encode(json))
}

/// Parse a token back into a candidate state. Unknown fields are tolerated
/// so newer saves load into older schemas; missing fields are not. The
/// result is untrusted until normalized by the engine.
pub fn decode_token(token: &str) -> Result<GameState, DecodeError> {
    let bytes = STANDARD.decode(token.trim())?;
    let json = String::from_utf8(bytes)?;
    let state: GameState = serde_json::from_str(&json)?;
    Ok(state)
}

/// Key-value storage collaborator. Writes may be skipped (quota, missing
/// volume, private mode equivalents); that is reported, never raised.
pub trait SaveMedium {
    /// Fetch the record stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`. Returns false when the write was skipped.
    fn set(&mut self, key: &str, value: &str) -> bool;
}

/// In-memory medium for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl SaveMedium for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.records.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        self.records.insert(key.to_string(), value.to_string());
        true
    }
}

/// File-backed medium: one file per key under a root directory.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.save"))
    }
}

impl SaveMedium for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> bool {
        if let Err(e) = fs::create_dir_all(&self.root) {
            warn!(error = %e, root = %self.root.display(), "save skipped");
            return false;
        }
        match fs::write(self.path_for(key), value) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, key, "save skipped");
                false
            }
        }
    }
}

/// Encode `state` and store it under `key`. A failed write degrades to
/// "save skipped" and returns false.
pub fn save_game<M: SaveMedium + ?Sized>(medium: &mut M, key: &str, state: &GameState) -> bool {
    match encode_token(state) {
        Ok(token) => medium.set(key, &token),
        Err(e) => {
            warn!(error = %e, "save skipped");
            false
        }
    }
}

/// Load the state stored under `key`. A missing or unreadable record is not
/// an error: both yield `None`, meaning "no prior save".
pub fn load_game<M: SaveMedium + ?Sized>(medium: &M, key: &str) -> Option<GameState> {
    let token = medium.get(key)?;
    match decode_token(&token) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(error = %e, key, "ignoring unreadable save");
            None
        }
    }
}
