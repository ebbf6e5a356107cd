use crate::error::RenderError;
use rustc_hash::FxHashMap;

/// GPU capabilities the batch flusher drives.
///
/// Implementations own the vertex and index buffers. The flusher guarantees
/// that `upload_vertices` is always followed by the `draw_indexed` that
/// consumes it, and that a bound texture stays bound until the next
/// `bind_texture`.
pub trait GpuBackend {
    /// Bindable texture handle.
    type Texture;

    /// Upload the static index pattern once, sized for a full batch.
    fn upload_indices(&mut self, indices: &[u32]);

    fn bind_texture(&mut self, texture: &Self::Texture);

    /// Overwrite the vertex buffer starting at byte `offset`.
    fn upload_vertices(&mut self, offset: usize, bytes: &[u8]);

    /// Draw `index_count` indices from the start of the index buffer.
    fn draw_indexed(&mut self, index_count: u32);
}

/// Resolves a texture key into a backend handle.
///
/// Failure is recoverable: the renderer skips the group and reports it.
pub trait TextureSource {
    type Handle;

    fn resolve(&mut self, key: &str) -> Result<Self::Handle, RenderError>;
}

/// Loads a texture that is not cached yet.
pub trait TextureLoader {
    type Handle: Clone;

    fn load(&mut self, key: &str) -> Result<Self::Handle, RenderError>;
}

/// Keyed texture cache in front of a [`TextureLoader`].
///
/// Only successful loads are cached, so a texture that appears later is
/// picked up on the next frame.
#[derive(Debug)]
pub struct TextureCache<L: TextureLoader> {
    loader: L,
    loaded: FxHashMap<String, L::Handle>,
}

impl<L: TextureLoader> TextureCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            loaded: FxHashMap::default(),
        }
    }

    /// Register an already-created handle under `key`, replacing any cached one.
    pub fn insert(&mut self, key: impl Into<String>, handle: L::Handle) {
        self.loaded.insert(key.into(), handle);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.loaded.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Drop a cached handle so the next resolve reloads it.
    pub fn evict(&mut self, key: &str) -> Option<L::Handle> {
        self.loaded.remove(key)
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }
}

impl<L: TextureLoader> TextureSource for TextureCache<L> {
    type Handle = L::Handle;

    fn resolve(&mut self, key: &str) -> Result<L::Handle, RenderError> {
        if let Some(handle) = self.loaded.get(key) {
            return Ok(handle.clone());
        }
        let handle = self.loader.load(key)?;
        tracing::debug!(key, "texture loaded");
        self.loaded.insert(key.to_owned(), handle.clone());
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingLoader {
        loads: usize,
        fail: bool,
    }

    impl TextureLoader for CountingLoader {
        type Handle = u32;

        fn load(&mut self, key: &str) -> Result<u32, RenderError> {
            self.loads += 1;
            if self.fail {
                return Err(RenderError::resource_missing(key, "file not found"));
            }
            Ok(self.loads as u32)
        }
    }

    #[test]
    fn loads_each_key_once() {
        let mut cache = TextureCache::new(CountingLoader::default());
        assert_eq!(cache.resolve("a.png").unwrap(), 1);
        assert_eq!(cache.resolve("a.png").unwrap(), 1);
        assert_eq!(cache.resolve("b.png").unwrap(), 2);
        assert_eq!(cache.loader().loads, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let mut cache = TextureCache::new(CountingLoader {
            fail: true,
            ..Default::default()
        });
        assert!(matches!(
            cache.resolve("missing.png"),
            Err(RenderError::ResourceMissing { .. })
        ));
        assert!(cache.is_empty());

        cache.loader_mut().fail = false;
        assert!(cache.resolve("missing.png").is_ok());
        assert!(cache.contains("missing.png"));
    }

    #[test]
    fn inserted_handles_skip_the_loader() {
        let mut cache = TextureCache::new(CountingLoader::default());
        cache.insert("atlas", 99);
        assert_eq!(cache.resolve("atlas").unwrap(), 99);
        assert_eq!(cache.loader().loads, 0);
        assert_eq!(cache.evict("atlas"), Some(99));
        assert_eq!(cache.resolve("atlas").unwrap(), 1);
    }
}
