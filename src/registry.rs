//! Entity registries owned by an explicit context instead of process-wide state.

use crate::error::Result;
use crate::{SlotArray, SlotArrayConfig, SlotIndex, SmallKeyHashMap};

/// A [`SlotArray`] of named payloads with a name-to-handle cache.
///
/// Names are a lookup convenience, handles are the identity. Registering a name that is already cached points the cache
/// at the new entry; the older entry stays reachable by its handle.
#[derive(Clone, Debug)]
pub struct NamedRegistry<T> {
    entries: SlotArray<(String, T)>,
    handles: SmallKeyHashMap<String, SlotIndex>,
}

impl<T> Default for NamedRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NamedRegistry<T> {
    pub fn new() -> Self {
        Self::with_config(SlotArrayConfig::default())
    }

    pub fn with_config(config: SlotArrayConfig) -> Self {
        Self {
            entries: SlotArray::with_config(config),
            handles: Default::default(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stores `payload` under `name` and returns its handle.
    pub fn insert(&mut self, name: impl Into<String>, payload: T) -> SlotIndex {
        let name = name.into();
        let index = self.entries.add((name.clone(), payload));
        tracing::trace!(%name, index, "registered entity");
        self.handles.insert(name, index);
        index
    }

    #[inline]
    pub fn get(&self, index: SlotIndex) -> Result<&T> {
        self.entries.get(index).map(|(_, payload)| payload)
    }

    #[inline]
    pub fn get_mut(&mut self, index: SlotIndex) -> Result<&mut T> {
        self.entries.get_mut(index).map(|(_, payload)| payload)
    }

    /// The name `index` was registered under.
    #[inline]
    pub fn name_of(&self, index: SlotIndex) -> Result<&str> {
        self.entries.get(index).map(|(name, _)| name.as_str())
    }

    /// The handle most recently registered under `name`.
    #[inline]
    pub fn handle_of(&self, name: &str) -> Option<SlotIndex> {
        self.handles.get(name).copied()
    }

    #[inline]
    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.handle_of(name).and_then(|index| self.get(index).ok())
    }

    /// Unregisters `index` and transfers its payload to the caller.
    pub fn remove(&mut self, index: SlotIndex) -> Result<T> {
        let (name, payload) = self.entries.pop(index)?;
        if self.handles.get(&name) == Some(&index) {
            self.handles.remove(&name);
        }
        tracing::trace!(%name, index, "unregistered entity");
        Ok(payload)
    }

    /// Unregisters the entry cached under `name`.
    pub fn remove_by_name(&mut self, name: &str) -> Option<T> {
        let index = self.handle_of(name)?;
        self.remove(index).ok()
    }

    /// Returns the handle and payload of the lowest-index entry matching `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<(SlotIndex, &T)> {
        self.iter()
            .find(|&(_, _, payload)| predicate(payload))
            .map(|(index, _, payload)| (index, payload))
    }

    /// Iterate over `(handle, name, payload)` in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &str, &T)> + '_ {
        self.entries
            .iter()
            .map(|(index, (name, payload))| (index, name.as_str(), payload))
    }

    /// Consumes the registry, handing every payload to `destructor` in handle order.
    pub fn destroy_all(self, mut destructor: impl FnMut(T)) {
        self.entries.destroy_all(|(_, payload)| destructor(payload));
    }
}

/// Payload types for each kind of entity the engine keeps a registry of.
pub trait EntityKinds {
    type Texture;
    type Object;
    type Template;
    type Font;
    type Audio;
    type Animation;
}

/// One [`NamedRegistry`] per entity kind, passed explicitly to whatever needs them.
pub struct Registries<E: EntityKinds> {
    pub textures: NamedRegistry<E::Texture>,
    pub objects: NamedRegistry<E::Object>,
    pub templates: NamedRegistry<E::Template>,
    pub fonts: NamedRegistry<E::Font>,
    pub audio: NamedRegistry<E::Audio>,
    pub animations: NamedRegistry<E::Animation>,
}

impl<E: EntityKinds> Default for Registries<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityKinds> Registries<E> {
    pub fn new() -> Self {
        Self::with_config(SlotArrayConfig::default())
    }

    /// Every registry gets the same sizing.
    pub fn with_config(config: SlotArrayConfig) -> Self {
        Self {
            textures: NamedRegistry::with_config(config),
            objects: NamedRegistry::with_config(config),
            templates: NamedRegistry::with_config(config),
            fonts: NamedRegistry::with_config(config),
            audio: NamedRegistry::with_config(config),
            animations: NamedRegistry::with_config(config),
        }
    }

    /// Total number of registered entities across all kinds.
    pub fn len(&self) -> usize {
        self.textures.len()
            + self.objects.len()
            + self.templates.len()
            + self.fonts.len()
            + self.audio.len()
            + self.animations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
