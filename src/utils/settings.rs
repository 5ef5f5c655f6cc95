use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::constants::*;
use crate::error::Result;

const MAGIC_HEADER: &[u8; 4] = b"MRCS";
const VERSION: u32 = 1;

pub const DEFAULT_SETTINGS_FILE: &str = "render_settings.bin";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RenderSettings {
    /// Effective view distance in blocks.
    pub view_distance: i32,
    /// View distance chosen by the user; also drives unloading.
    pub user_view_distance: i32,
    pub max_chunk_updates: i32,
    pub smooth_lighting: bool,
    pub tiles_per_row: u32,
    pub atlas_rows: u32,
    pub max_atlas_tiles_per_strip: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            view_distance: 512,
            user_view_distance: 512,
            max_chunk_updates: MAX_BUILD_BUDGET,
            smooth_lighting: false,
            tiles_per_row: ATLAS_TILES_PER_ROW,
            atlas_rows: ATLAS_ROWS,
            max_atlas_tiles_per_strip: MAX_TILES_PER_STRIP,
        }
    }
}

impl RenderSettings {
    /// Keeps values inside the ranges the renderer supports.
    pub fn sanitized(mut self) -> Self {
        self.max_chunk_updates = self.max_chunk_updates.clamp(MIN_BUILD_BUDGET, MAX_BUILD_BUDGET);
        self.view_distance = self.view_distance.clamp(CHUNK_SIZE, MAX_VIEW_DISTANCE);
        self.user_view_distance = self.user_view_distance.clamp(CHUNK_SIZE, MAX_VIEW_DISTANCE);
        self.tiles_per_row = self.tiles_per_row.max(1);
        self.atlas_rows = self.atlas_rows.max(1);
        self.max_atlas_tiles_per_strip = self.max_atlas_tiles_per_strip.max(1);
        self
    }
}

pub fn save_settings<P: AsRef<Path>>(path: P, settings: &RenderSettings) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(MAGIC_HEADER)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    bincode::serialize_into(&mut writer, settings)?;
    writer.flush()?;
    Ok(())
}

pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<RenderSettings> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    let mut version_bytes = [0u8; 4];
    reader.read_exact(&mut version_bytes)?;
    if &magic != MAGIC_HEADER || u32::from_le_bytes(version_bytes) != VERSION {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "not a render settings file",
        )
        .into());
    }

    let settings: RenderSettings = bincode::deserialize_from(&mut reader)?;
    Ok(settings.sanitized())
}

/// Loads settings from `path`, falling back to defaults when the file is
/// missing or unreadable.
pub fn load_or_default<P: AsRef<Path>>(path: P) -> RenderSettings {
    let path = path.as_ref();
    match load_settings(path) {
        Ok(settings) => {
            tracing::debug!("Loaded render settings from {}", path.display());
            settings
        }
        Err(e) => {
            tracing::warn!("Using default render settings ({}): {}", path.display(), e);
            RenderSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("minerust-chunks-{}-{}", std::process::id(), name))
    }

    #[test]
    fn settings_survive_a_save_load_cycle() {
        let path = temp_path("roundtrip.bin");
        let settings = RenderSettings {
            view_distance: 128,
            smooth_lighting: true,
            ..RenderSettings::default()
        };
        save_settings(&path, &settings).expect("save");
        let loaded = load_settings(&path).expect("load");
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let path = temp_path("garbage.bin");
        std::fs::write(&path, b"definitely not settings").expect("write");
        assert!(load_settings(&path).is_err());
        assert_eq!(load_or_default(&path), RenderSettings::default());
        std::fs::remove_file(&path).ok();

        assert_eq!(load_or_default(temp_path("missing.bin")), RenderSettings::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let settings = RenderSettings {
            max_chunk_updates: 100,
            view_distance: 0,
            ..RenderSettings::default()
        }
        .sanitized();
        assert_eq!(settings.max_chunk_updates, MAX_BUILD_BUDGET);
        assert_eq!(settings.view_distance, CHUNK_SIZE);

        let far = RenderSettings {
            view_distance: 50_000,
            user_view_distance: i32::MAX,
            ..RenderSettings::default()
        }
        .sanitized();
        assert_eq!(far.view_distance, MAX_VIEW_DISTANCE);
        assert_eq!(far.user_view_distance, MAX_VIEW_DISTANCE);
    }
}
