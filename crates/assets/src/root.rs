use crate::{AssetError, ImageData};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tessel_common::Color;

/// Prefix of texture keys generated in memory instead of read from disk.
pub const BUILTIN_PREFIX: &str = "builtin:";

/// Named texture aliases, persisted as JSON next to the assets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureManifest {
    pub textures: BTreeMap<String, PathBuf>,
}

impl TextureManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.textures.insert(name.into(), path.into());
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

/// Directory that texture keys resolve against.
///
/// A key is either a manifest alias, a `builtin:` name, or a path relative
/// to the root. Keys never escape the root.
#[derive(Debug, Clone)]
pub struct AssetRoot {
    root: PathBuf,
    manifest: TextureManifest,
}

impl AssetRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest: TextureManifest::default(),
        }
    }

    pub fn with_manifest(mut self, manifest: TextureManifest) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &TextureManifest {
        &self.manifest
    }

    /// File a key refers to. Builtins have no file.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, AssetError> {
        let relative = match self.manifest.textures.get(key) {
            Some(path) => path.as_path(),
            None => Path::new(key),
        };
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(AssetError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(relative))
    }

    pub fn load_image(&self, key: &str) -> Result<ImageData, AssetError> {
        if let Some(name) = key.strip_prefix(BUILTIN_PREFIX) {
            return builtin(name).ok_or_else(|| AssetError::NotFound(key.to_owned()));
        }
        let path = self.resolve(key)?;
        let bytes = std::fs::read(&path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound(key.to_owned()),
            _ => AssetError::Io(err),
        })?;
        let image = ImageData::decode(&bytes)?;
        tracing::debug!(key, width = image.width, height = image.height, "image decoded");
        Ok(image)
    }
}

/// Procedural textures: `white`, `checker`, `missing`.
pub fn builtin(name: &str) -> Option<ImageData> {
    match name {
        "white" => Some(ImageData::solid(1, 1, Color::WHITE)),
        "checker" => Some(ImageData::checkerboard(
            64,
            8,
            Color::rgb(200, 200, 200),
            Color::rgb(90, 90, 90),
        )),
        "missing" => Some(ImageData::checkerboard(
            16,
            8,
            Color::rgb(255, 0, 255),
            Color::BLACK,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_resolve_without_disk() {
        let root = AssetRoot::new("/nonexistent");
        assert_eq!(root.load_image("builtin:white").unwrap().width, 1);
        assert_eq!(root.load_image("builtin:checker").unwrap().width, 64);
        assert!(matches!(
            root.load_image("builtin:nope"),
            Err(AssetError::NotFound(_))
        ));
    }

    #[test]
    fn loads_png_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sprites")).unwrap();
        ImageData::solid(2, 3, Color::GREEN)
            .save_png(dir.path().join("sprites/slime.png"))
            .unwrap();

        let root = AssetRoot::new(dir.path());
        let img = root.load_image("sprites/slime.png").unwrap();
        assert_eq!((img.width, img.height), (2, 3));
        assert_eq!(img.pixel(1, 2), Some(Color::GREEN));
    }

    #[test]
    fn manifest_aliases_paths() {
        let dir = tempfile::tempdir().unwrap();
        ImageData::solid(1, 1, Color::RED)
            .save_png(dir.path().join("hero_v2.png"))
            .unwrap();
        let mut manifest = TextureManifest::new();
        manifest.insert("hero", "hero_v2.png");
        let manifest_path = dir.path().join("textures.json");
        manifest.save(&manifest_path).unwrap();

        let root = AssetRoot::new(dir.path()).with_manifest(TextureManifest::load(&manifest_path).unwrap());
        assert_eq!(root.load_image("hero").unwrap().pixel(0, 0), Some(Color::RED));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let root = AssetRoot::new(dir.path());
        assert!(matches!(
            root.load_image("ghost.png"),
            Err(AssetError::NotFound(key)) if key == "ghost.png"
        ));
    }

    #[test]
    fn keys_cannot_escape_root() {
        let root = AssetRoot::new("/assets");
        assert!(matches!(
            root.resolve("../secret.png"),
            Err(AssetError::InvalidKey(_))
        ));
        assert!(root.resolve("/etc/passwd").is_err());
        assert_eq!(root.resolve("./a.png").unwrap(), Path::new("/assets/./a.png"));
    }
}
