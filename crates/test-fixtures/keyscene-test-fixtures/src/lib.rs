use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<std::result::Result<Manifest, String>> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).map_err(|e| e.to_string())
});

#[derive(Debug, Deserialize)]
struct Manifest {
    sources: HashMap<String, String>,
    scenes: HashMap<String, String>,
}

fn manifest() -> Result<&'static Manifest> {
    MANIFEST
        .as_ref()
        .map_err(|e| anyhow!("fixtures manifest failed to parse: {e}"))
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a>(map: &'a HashMap<String, String>, kind: &str, name: &str) -> Result<&'a str> {
    map.get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Raw animation sets in the `{ "animations": [...] }` source shape.
pub mod sources {
    use super::*;

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&manifest()?.sources, "source", name)?)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        load_json(lookup(&manifest()?.sources, "source", name)?)
    }
}

/// Scene descriptions (objects, phases, config).
pub mod scenes {
    use super::*;

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&manifest()?.scenes, "scene", name)?)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        load_json(lookup(&manifest()?.scenes, "scene", name)?)
    }
}
