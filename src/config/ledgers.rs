use crate::detector::DetectorParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of the `ledger_demo` tool.
#[derive(Debug, Deserialize)]
pub struct LedgerToolConfig {
    /// Staff-free sheet image.
    pub input: PathBuf,
    /// Sheet model (scale, systems, staves, beams) as JSON.
    pub sheet: PathBuf,
    #[serde(default)]
    pub params: DetectorParams,
    pub output: LedgerOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct LedgerOutputConfig {
    pub report_json: PathBuf,
    /// Optional copy of the input with accepted ledgers shaded.
    #[serde(default)]
    pub overlay_image: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<LedgerToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_default_params() {
        let config: LedgerToolConfig = serde_json::from_str(
            r#"{
                "input": "page.png",
                "sheet": "sheet.json",
                "output": { "report_json": "out/report.json" }
            }"#,
        )
        .expect("valid config");
        assert_eq!(config.params, DetectorParams::default());
        assert!(config.output.overlay_image.is_none());
    }
}
