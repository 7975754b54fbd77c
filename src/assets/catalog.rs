use serde::{Deserialize, Serialize};

/// Kind of required model asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Quantized language-model weights.
    Llm,
    /// Vision projector weights mapping image patches into the LLM
    /// embedding space.
    Projector,
}

impl AssetKind {
    pub const ALL: [AssetKind; 2] = [AssetKind::Llm, AssetKind::Projector];
}

/// Static information about a required asset.
/// This is hardcoded and never changes at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCatalogEntry {
    pub kind: AssetKind,
    /// Human-readable name.
    pub display_name: String,
    /// Filename on disk under the model directory.
    pub filename: String,
    /// Download URL.
    pub url: String,
    /// Approximate transfer size in bytes, used as the progress denominator
    /// when the server omits Content-Length.
    pub size_bytes: u64,
}

/// Hugging Face repository the assets are published under.
pub const MODEL_REPO_BASE: &str =
    "https://huggingface.co/openbmb/MiniCPM-V-2_6-gguf/resolve/main";

/// The two assets multimodal inference requires.
pub fn asset_catalog() -> Vec<AssetCatalogEntry> {
    asset_catalog_from(MODEL_REPO_BASE)
}

/// Catalog against an alternate repository base. Tests point this at a local
/// fixture server; everything else uses [`asset_catalog`].
pub fn asset_catalog_from(base: &str) -> Vec<AssetCatalogEntry> {
    AssetKind::ALL.iter().map(|kind| entry_for(*kind, base)).collect()
}

/// Catalog entry for a single asset kind.
pub fn catalog_entry(kind: AssetKind) -> AssetCatalogEntry {
    entry_for(kind, MODEL_REPO_BASE)
}

fn entry_for(kind: AssetKind, base: &str) -> AssetCatalogEntry {
    match kind {
        AssetKind::Llm => AssetCatalogEntry {
            kind,
            display_name: "MiniCPM-V 2.6 LLM (Q4_0)".into(),
            filename: "ggml-model-Q4_0.gguf".into(),
            url: format!("{}/ggml-model-Q4_0.gguf?download=true", base),
            size_bytes: 4_740_000_000, // ~4.4 GiB
        },
        AssetKind::Projector => AssetCatalogEntry {
            kind,
            display_name: "MiniCPM-V 2.6 vision projector (f16)".into(),
            filename: "mmproj-model-f16.gguf".into(),
            url: format!("{}/mmproj-model-f16.gguf?download=true", base),
            size_bytes: 1_040_000_000, // ~0.97 GiB
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_declares_both_assets() {
        let catalog = asset_catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].kind, AssetKind::Llm);
        assert_eq!(catalog[1].kind, AssetKind::Projector);
        for entry in &catalog {
            assert!(entry.url.starts_with(MODEL_REPO_BASE));
            assert!(entry.url.ends_with("?download=true"));
            assert!(entry.url.contains(&entry.filename));
        }
    }

    #[test]
    fn alternate_base_rewrites_urls() {
        let catalog = asset_catalog_from("http://127.0.0.1:9999");
        assert_eq!(
            catalog[0].url,
            "http://127.0.0.1:9999/ggml-model-Q4_0.gguf?download=true"
        );
    }
}
