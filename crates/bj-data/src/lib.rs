use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Card color. Doubles as the offset into the suit table: black suits occupy
/// indices 0-1, red suits 2-3, so red identifications shift by two columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    Black,
    Red,
}

impl CardColor {
    pub fn suit_offset(self) -> u8 {
        match self {
            CardColor::Black => 0,
            CardColor::Red => 2,
        }
    }
}

/// One entry of the suit table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuitInfo {
    pub name: String,
    pub color: CardColor,
}

/// Raw suits.json file format
#[derive(Debug, Deserialize)]
struct SuitsFile {
    suits: Vec<SuitInfo>,
}

/// Reference data for one counting session: the suit table and the location
/// of the two template sheets (one per color).
#[derive(Debug, Clone)]
pub struct TableData {
    pub suits: Vec<SuitInfo>,
    pub black_sheet: PathBuf,
    pub red_sheet: PathBuf,
}

impl TableData {
    /// Load reference data from the data directory.
    /// Expects:
    ///   - data_dir/suits.json (optional, falls back to the standard table)
    ///   - data_dir/templates/black_cards.png
    ///   - data_dir/templates/red_cards.png
    pub fn load(data_dir: &Path) -> Result<Self> {
        let suits_path = data_dir.join("suits.json");
        let suits = if suits_path.exists() {
            let content = std::fs::read_to_string(&suits_path)
                .context("Failed to read suits.json")?;
            let file: SuitsFile =
                serde_json::from_str(&content).context("Failed to parse suits.json")?;
            validate_suits(&file.suits)?;
            tracing::info!("Loaded suit table from {}", suits_path.display());
            file.suits
        } else {
            default_suits()
        };

        let templates_dir = data_dir.join("templates");
        Ok(Self {
            suits,
            black_sheet: templates_dir.join("black_cards.png"),
            red_sheet: templates_dir.join("red_cards.png"),
        })
    }

    pub fn suit_name(&self, index: u8) -> Option<&str> {
        self.suits.get(index as usize).map(|s| s.name.as_str())
    }

    pub fn suit_names(&self) -> Vec<String> {
        self.suits.iter().map(|s| s.name.clone()).collect()
    }
}

/// The standard table: black suits first, red suits at indices 2-3.
pub fn default_suits() -> Vec<SuitInfo> {
    [
        ("spades", CardColor::Black),
        ("clubs", CardColor::Black),
        ("diamond", CardColor::Red),
        ("hearts", CardColor::Red),
    ]
    .into_iter()
    .map(|(name, color)| SuitInfo {
        name: name.to_string(),
        color,
    })
    .collect()
}

fn validate_suits(suits: &[SuitInfo]) -> Result<()> {
    if suits.len() != 4 {
        bail!("suit table must have exactly 4 entries, got {}", suits.len());
    }
    for (i, suit) in suits.iter().enumerate() {
        let expected = if i < 2 { CardColor::Black } else { CardColor::Red };
        if suit.color != expected {
            bail!(
                "suit '{}' at index {} must be {:?}: black suits occupy 0-1, red suits 2-3",
                suit.name,
                i,
                expected
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_without_suits_file_uses_defaults() {
        let data = TableData::load(Path::new("/nonexistent")).unwrap();
        assert_eq!(data.suits.len(), 4);
        assert_eq!(data.suit_name(0), Some("spades"));
        assert_eq!(data.suit_name(2), Some("diamond"));
        assert_eq!(data.suits[3].color, CardColor::Red);
    }

    #[test]
    fn test_red_offset() {
        assert_eq!(CardColor::Black.suit_offset(), 0);
        assert_eq!(CardColor::Red.suit_offset(), 2);
    }

    #[test]
    fn test_misordered_suit_table_rejected() {
        let mut suits = default_suits();
        suits.swap(0, 2);
        assert!(validate_suits(&suits).is_err());
    }

    #[test]
    fn test_wrong_length_rejected() {
        let suits = default_suits()[..3].to_vec();
        assert!(validate_suits(&suits).is_err());
    }
}
