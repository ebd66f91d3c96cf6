use super::Bus;
use crate::rate::{BlockSize, SampleRate};
use crate::{Error, Result};
use hashbrown::HashMap;
use std::cell::RefCell;
use std::fmt;

/// Name of a registered bus. Integer keys are stored in their decimal form,
/// so `BusKey::from(3)` and `BusKey::from("3")` name the same bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BusKey(String);

impl BusKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BusKey {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for BusKey {
    fn from(name: String) -> Self {
        Self(name)
    }
}

macro_rules! bus_key_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for BusKey {
                fn from(index: $ty) -> Self {
                    Self(index.to_string())
                }
            }
        )*
    };
}

bus_key_from_int!(i32, i64, u32, u64, usize);

thread_local! {
    static DEFAULT: RefCell<BusRegistry> = RefCell::new(BusRegistry::new());
}

/// Named busses.
///
/// Each render thread has a default registry behind [`Bus::named`]. Engines
/// and tests that want isolation create their own.
pub struct BusRegistry {
    busses: HashMap<String, Bus>,
    buffer_size: BlockSize,
    sample_rate: SampleRate,
    write_block: BlockSize,
}

impl BusRegistry {
    /// Registry whose busses use the process-wide default size, rate and
    /// write block.
    pub fn new() -> Self {
        Self::with_settings(
            Bus::default_buffer_size(),
            SampleRate::default_rate(),
            BlockSize::default_size(),
        )
    }

    /// Registry whose lazily created busses share `buffer_size`,
    /// `sample_rate` and `write_block`.
    pub fn with_settings(
        buffer_size: BlockSize,
        sample_rate: SampleRate,
        write_block: BlockSize,
    ) -> Self {
        Self {
            busses: HashMap::new(),
            buffer_size,
            sample_rate,
            write_block,
        }
    }

    /// Runs `f` against this thread's default registry.
    pub fn with_default<R>(f: impl FnOnce(&mut BusRegistry) -> R) -> R {
        DEFAULT.with(|registry| f(&mut registry.borrow_mut()))
    }

    /// Bus `key`, created on first use.
    pub fn get_or_create(&mut self, key: impl Into<BusKey>) -> Bus {
        let BusKey(name) = key.into();
        if let Some(bus) = self.busses.get(&name) {
            return bus.clone();
        }

        let bus = Bus::with_settings(
            self.buffer_size.clone(),
            self.sample_rate.clone(),
            self.write_block.clone(),
        );
        tracing::debug!("Created bus '{}' ({} samples)", name, self.buffer_size.get());
        self.busses.insert(name, bus.clone());
        bus
    }

    pub fn get(&self, key: impl Into<BusKey>) -> Option<Bus> {
        self.busses.get(key.into().as_str()).cloned()
    }

    /// Registers an existing bus under `key`.
    pub fn add(&mut self, key: impl Into<BusKey>, bus: Bus) -> Result<()> {
        let BusKey(name) = key.into();
        if self.busses.contains_key(&name) {
            return Err(Error::BusExists(name));
        }

        tracing::debug!("Registered bus '{}'", name);
        self.busses.insert(name, bus);
        Ok(())
    }

    /// Unregisters `key`. Nodes already holding the bus keep using it.
    pub fn remove(&mut self, key: impl Into<BusKey>) -> Option<Bus> {
        let key = key.into();
        let removed = self.busses.remove(key.as_str());
        if removed.is_some() {
            tracing::debug!("Removed bus '{}'", key);
        }
        removed
    }

    pub fn contains(&self, key: impl Into<BusKey>) -> bool {
        self.busses.contains_key(key.into().as_str())
    }

    /// Key `bus` is registered under.
    pub fn name_of(&self, bus: &Bus) -> Option<BusKey> {
        self.busses
            .iter()
            .find(|(_, candidate)| candidate.ptr_eq(bus))
            .map(|(name, _)| BusKey(name.clone()))
    }

    pub fn len(&self) -> usize {
        self.busses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.busses.is_empty()
    }
}

impl Default for BusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BusRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusRegistry")
            .field("busses", &self.busses.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BusRegistry {
        BusRegistry::with_settings(
            BlockSize::new(256),
            SampleRate::new(48000.0),
            BlockSize::new(64),
        )
    }

    #[test]
    fn test_get_or_create_is_lazy_and_stable() {
        let mut registry = registry();
        assert!(!registry.contains("fx"));

        let a = registry.get_or_create("fx");
        let b = registry.get_or_create(String::from("fx"));
        assert!(a.ptr_eq(&b));
        assert_eq!(a.len(), 256);
        assert_eq!(a.write_block().get(), 64);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_integer_keys() {
        let mut registry = registry();
        let bus = registry.get_or_create(3usize);
        assert!(registry.contains("3"));
        assert!(registry.get(3).is_some_and(|b| b.ptr_eq(&bus)));
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut registry = registry();
        registry.get_or_create("main");

        let result = registry.add("main", Bus::new());
        assert_eq!(result, Err(Error::BusExists("main".into())));
        assert!(registry.add("aux", Bus::new()).is_ok());
    }

    #[test]
    fn test_remove_and_name_of() {
        let mut registry = registry();
        let bus = registry.get_or_create("send");
        assert_eq!(registry.name_of(&bus), Some(BusKey::from("send")));

        assert!(registry.remove("send").is_some());
        assert!(registry.remove("send").is_none());
        assert_eq!(registry.name_of(&bus), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_default_registry_is_shared_per_thread() {
        let a = Bus::named("registry-test");
        let b = Bus::named("registry-test");
        assert!(a.ptr_eq(&b));
        assert!(BusRegistry::with_default(|r| r.contains("registry-test")));
    }
}
