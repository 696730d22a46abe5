use crate::clock::Millis;
use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct DecayRates {
    pub(crate) hunger: f32,
    pub(crate) happiness: f32,
    pub(crate) energy: f32,
    pub(crate) hygiene: f32,
}

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            hunger: 1.5,
            happiness: 1.0,
            energy: 0.5,
            hygiene: 0.8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct SleepRates {
    pub(crate) energy_recovery: f32,
    pub(crate) hunger: f32,
}

impl Default for SleepRates {
    fn default() -> Self {
        Self {
            energy_recovery: 5.0,
            hunger: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct FoodItem {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) icon: char,
    pub(crate) cost: u32,
    pub(crate) restore: f32,
}

impl FoodItem {
    fn new(id: &str, name: &str, icon: char, cost: u32, restore: f32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon,
            cost,
            restore,
        }
    }
}

/// Externally configured tables. The simulation only ever reads these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Rules {
    pub(crate) tick_ms: Millis,
    pub(crate) soil_check_ms: Millis,
    pub(crate) decay: DecayRates,
    pub(crate) sleep: SleepRates,
    pub(crate) food: Vec<FoodItem>,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            tick_ms: 2000,
            soil_check_ms: 10_000,
            decay: DecayRates::default(),
            sleep: SleepRates::default(),
            food: vec![
                FoodItem::new("burger", "Borgir", '≡', 10, 20.0),
                FoodItem::new("pizza", "Pizza", '▲', 15, 30.0),
                FoodItem::new("broccoli", "Veggie", '♣', 5, 10.0),
                FoodItem::new("sushi", "Sushi", '◉', 25, 40.0),
            ],
        }
    }
}

impl Rules {
    pub(crate) fn validate(&self) -> Result<()> {
        ensure!(self.tick_ms > 0, "tick_ms must be positive");
        ensure!(self.soil_check_ms > 0, "soil_check_ms must be positive");

        let d = &self.decay;
        ensure!(
            [d.hunger, d.happiness, d.energy, d.hygiene]
                .iter()
                .all(|r| r.is_finite() && *r >= 0.0),
            "decay rates must be finite and non-negative"
        );
        let s = &self.sleep;
        ensure!(
            [s.energy_recovery, s.hunger]
                .iter()
                .all(|r| r.is_finite() && *r >= 0.0),
            "sleep rates must be finite and non-negative"
        );

        let mut seen = HashSet::new();
        for item in &self.food {
            ensure!(seen.insert(item.id.as_str()), "duplicate food id {:?}", item.id);
            ensure!(
                item.restore.is_finite() && item.restore >= 0.0,
                "food {:?} has invalid restore {}",
                item.id,
                item.restore
            );
        }
        Ok(())
    }

    pub(crate) fn food_index(&self, id: &str) -> Option<usize> {
        self.food.iter().position(|f| f.id == id)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) enable_color: bool,
    /// `None` seeds soiling from entropy.
    pub(crate) seed: Option<u64>,
    /// Pixel size of one terminal cell; maps the grid onto the pixel stage.
    pub(crate) cell_px_w: f32,
    pub(crate) cell_px_h: f32,
    pub(crate) rules: Rules,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            enable_color: true,
            seed: None,
            cell_px_w: 8.0,
            cell_px_h: 16.0,
            rules: Rules::default(),
        }
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "blobgotchi", "Blobgotchi")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating data directory {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("blobgotchi.log"),
    })
}

/// Missing or malformed settings fall back to defaults; invalid rules fall
/// back to the default tables.
pub(crate) fn load_settings(path: &Path) -> Settings {
    let mut settings = match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Settings>(&s) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("ignoring malformed {}: {e}", path.display());
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    };

    if let Err(e) = settings.rules.validate() {
        log::warn!("invalid rules in {}: {e:#}; using defaults", path.display());
        settings.rules = Rules::default();
    }
    if !(settings.cell_px_w > 0.0 && settings.cell_px_h > 0.0) {
        let d = Settings::default();
        settings.cell_px_w = d.cell_px_w;
        settings.cell_px_h = d.cell_px_h;
    }
    settings
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    if path.exists() {
        let _ = fs::remove_file(path);
    }
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
