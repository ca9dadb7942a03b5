use super::{DirectoryFontProvider, Font, FontError, FontHandle, FontProvider, StandardFont};
use crate::config::FontCacheConfig;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Font names a specification may request. Anything else resolves to the
/// default font.
pub const RECOGNIZED_FONTS: &[&str] = &[
    "alegreya-sans",
    "alegreya-sans-bd",
    "anaheim",
    "anaheim-bd",
    "exo2",
    "exo2-bd",
    "kurinto-mono",
    "kurinto-mono-bd",
    "kurinto-sans",
    "kurinto-sans-bd",
    "lato2",
    "lato2-bd",
    "markazi",
    "markazi-bd",
    "noto-sans-hk",
    "noto-sans-hk-bd",
    "noto-sans-sc",
    "noto-sans-sc-bd",
    "noto-sans-tc",
    "noto-sans-tc-bd",
    "open-sans",
    "open-sans-bd",
    "roboto",
    "roboto-bd",
    "source-sans3",
    "source-sans3-bd",
    "source-sans-pro",
    "source-sans-pro-bd",
];

/// Fonts loaded by [FontCache::preload_common]
pub const COMMON_FONTS: &[&str] = &["noto-sans-sc", "noto-sans-sc-bd"];

#[derive(Debug, Default)]
struct Entries {
    fonts: HashMap<String, FontHandle>,
    bytes: usize,
    evictions: usize,
}

impl Entries {
    fn clear(&mut self) {
        self.fonts.clear();
        self.bytes = 0;
        self.evictions += 1;
    }
}

/// Snapshot of the cache's occupancy
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FontCacheStats {
    pub entries: usize,
    pub bytes: usize,
    pub evictions: usize,
}

/// Process-wide font cache shared by every generation request.
///
/// Lookups take a read lock; loads happen outside any lock and are inserted
/// with an insert-if-absent under the write lock, so concurrent requests for
/// the same font settle on a single handle. When the cache is full it is
/// cleared as a whole, under the same write lock as the insert that follows,
/// so readers never observe a half-evicted set.
#[derive(Debug)]
pub struct FontCache {
    config: FontCacheConfig,
    provider: Option<Arc<dyn FontProvider>>,
    entries: RwLock<Entries>,
    default_font: OnceCell<FontHandle>,
}

impl FontCache {
    pub fn new(config: FontCacheConfig, provider: Option<Arc<dyn FontProvider>>) -> FontCache {
        FontCache {
            config,
            provider,
            entries: RwLock::new(Entries::default()),
            default_font: OnceCell::new(),
        }
    }

    /// Build a cache that reads fonts from the configured font directory, if any
    pub fn from_config(config: FontCacheConfig) -> FontCache {
        let provider = config
            .font_dir
            .clone()
            .map(|dir| Arc::new(DirectoryFontProvider::new(dir)) as Arc<dyn FontProvider>);
        FontCache::new(config, provider)
    }

    pub fn is_recognized(name: &str) -> bool {
        RECOGNIZED_FONTS.contains(&name)
    }

    /// The font used whenever no usable font is named. Created once, on first use.
    pub fn default_font(&self) -> FontHandle {
        self.default_font
            .get_or_init(|| {
                let name = self.config.default_font.as_str();
                match self.load(name) {
                    Ok(font) => {
                        log::debug!("default font `{name}` loaded");
                        Arc::new(font)
                    }
                    Err(err) => {
                        log::info!("default font unavailable ({err}), using built-in Helvetica");
                        Arc::new(Font::standard(StandardFont::Helvetica))
                    }
                }
            })
            .clone()
    }

    /// Resolve a font by name. Blank and unrecognised names, as well as fonts
    /// that fail to load, resolve to [FontCache::default_font].
    pub fn get_font(&self, name: Option<&str>) -> FontHandle {
        let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
            return self.default_font();
        };
        if !FontCache::is_recognized(name) {
            log::warn!("font `{name}` is not recognised, using the default font");
            return self.default_font();
        }

        if !self.config.cache_enabled {
            return match self.load(name) {
                Ok(font) if font.data_len() <= self.config.memory_threshold_bytes => {
                    Arc::new(font)
                }
                Ok(_) => {
                    log::warn!("font `{name}` exceeds the font memory threshold");
                    self.default_font()
                }
                Err(err) => self.fall_back(name, err),
            };
        }

        if let Some(font) = self
            .read_entries(|entries| entries.fonts.get(name).cloned())
            .flatten()
        {
            return font;
        }

        let font = match self.load(name) {
            Ok(font) => font,
            Err(err) => return self.fall_back(name, err),
        };

        let Ok(mut entries) = self.entries.write() else {
            return Arc::new(font);
        };
        if let Some(existing) = entries.fonts.get(name) {
            return existing.clone();
        }

        let needed = font.data_len();
        if entries.bytes + needed > self.config.memory_threshold_bytes {
            drop(entries);
            return self.fall_back(
                name,
                FontError::MemoryExhausted {
                    name: name.to_string(),
                    needed,
                },
            );
        }
        if entries.fonts.len() >= self.config.cache_size {
            log::debug!("font cache full ({} entries), clearing", entries.fonts.len());
            entries.clear();
        }

        let font = Arc::new(font);
        entries.bytes += needed;
        entries.fonts.insert(name.to_string(), font.clone());
        font
    }

    /// Drop every cached font except the default
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Best-effort load of the frequently used fonts. Returns how many loaded.
    pub fn preload_common(&self) -> usize {
        let default = self.default_font();
        COMMON_FONTS
            .iter()
            .filter(|name| !Arc::ptr_eq(&self.get_font(Some(**name)), &default))
            .count()
    }

    pub fn stats(&self) -> FontCacheStats {
        self.read_entries(|entries| FontCacheStats {
            entries: entries.fonts.len(),
            bytes: entries.bytes,
            evictions: entries.evictions,
        })
        .unwrap_or_default()
    }

    fn read_entries<T>(&self, f: impl FnOnce(&Entries) -> T) -> Option<T> {
        self.entries.read().ok().map(|entries| f(&entries))
    }

    fn load(&self, name: &str) -> Result<Font, FontError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| FontError::Unknown(name.to_string()))?;
        let data = provider.load(name)?;
        Font::load(name, data).map_err(|_| FontError::Parse(name.to_string()))
    }

    fn fall_back(&self, name: &str, err: FontError) -> FontHandle {
        match err {
            FontError::Unknown(_) => {
                log::warn!("font `{name}` is not available, using the default font");
            }
            err => {
                log::warn!("{err}; clearing the font cache and using the default font");
                self.clear();
            }
        }
        self.default_font()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::InMemoryFontProvider;

    const DEJAVU: &[u8] = include_bytes!("../../tests/fonts/DejaVuSansMono.ttf");

    fn cache_without_fonts() -> FontCache {
        FontCache::new(FontCacheConfig::default(), None)
    }

    fn cache_with_fonts(config: FontCacheConfig) -> FontCache {
        let provider = InMemoryFontProvider::new();
        for name in ["roboto", "lato2", "exo2"] {
            provider.add(name, DEJAVU.to_vec());
        }
        FontCache::new(config, Some(Arc::new(provider)))
    }

    #[test]
    fn default_font_is_created_once() {
        let cache = cache_without_fonts();
        let a = cache.default_font();
        let b = cache.get_font(None);
        let c = cache.get_font(Some("  "));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(a.name(), "helvetica");
    }

    #[test]
    fn unrecognised_fonts_resolve_to_the_default() {
        let cache = cache_without_fonts();
        let default = cache.get_font(None);
        let unknown = cache.get_font(Some("comic-sans"));
        assert!(Arc::ptr_eq(&default, &unknown));
    }

    #[test]
    fn unavailable_recognised_fonts_resolve_to_the_default() {
        let cache = cache_without_fonts();
        let default = cache.get_font(None);
        assert!(Arc::ptr_eq(&default, &cache.get_font(Some("roboto"))));
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn unparseable_fonts_clear_the_cache() {
        let provider = InMemoryFontProvider::new();
        provider.add("roboto", vec![0; 16]);
        let cache = FontCache::new(FontCacheConfig::default(), Some(Arc::new(provider)));
        let default = cache.default_font();

        assert!(Arc::ptr_eq(&default, &cache.get_font(Some("roboto"))));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn repeated_lookups_share_one_handle() {
        let cache = cache_with_fonts(FontCacheConfig::default());
        let first = cache.get_font(Some("roboto"));
        let second = cache.get_font(Some("roboto"));
        assert!(first.is_embedded());
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &cache.default_font()));
        assert_eq!(
            cache.stats(),
            FontCacheStats {
                entries: 1,
                bytes: DEJAVU.len(),
                evictions: 0,
            }
        );
    }

    #[test]
    fn full_cache_is_cleared_before_the_next_insert() {
        let cache = cache_with_fonts(FontCacheConfig {
            cache_size: 2,
            ..FontCacheConfig::default()
        });
        cache.get_font(Some("roboto"));
        cache.get_font(Some("lato2"));
        assert_eq!(cache.stats().entries, 2);

        let exo = cache.get_font(Some("exo2"));
        assert!(exo.is_embedded());
        let stats = cache.stats();
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.bytes, DEJAVU.len());
    }

    #[test]
    fn disabled_cache_loads_every_time() {
        let cache = cache_with_fonts(FontCacheConfig {
            cache_enabled: false,
            ..FontCacheConfig::default()
        });
        let first = cache.get_font(Some("roboto"));
        let second = cache.get_font(Some("roboto"));
        assert!(first.is_embedded());
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn loads_past_the_memory_threshold_fall_back() {
        let cache = cache_with_fonts(FontCacheConfig {
            memory_threshold_bytes: DEJAVU.len() + DEJAVU.len() / 2,
            ..FontCacheConfig::default()
        });
        let roboto = cache.get_font(Some("roboto"));
        assert!(roboto.is_embedded());

        let lato = cache.get_font(Some("lato2"));
        assert!(Arc::ptr_eq(&lato, &cache.default_font()));
        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn preload_is_best_effort() {
        let cache = cache_without_fonts();
        assert_eq!(cache.preload_common(), 0);
        assert_eq!(cache.stats(), FontCacheStats::default());
    }

    #[test]
    fn concurrent_lookups_agree_on_the_default() {
        let cache = Arc::new(cache_without_fonts());
        let handles: Vec<FontHandle> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|i| {
                    let cache = cache.clone();
                    scope.spawn(move || {
                        if i % 2 == 0 {
                            cache.get_font(Some("open-sans"))
                        } else {
                            cache.get_font(None)
                        }
                    })
                })
                .collect();
            workers
                .into_iter()
                .map(|w| w.join().expect("worker finished"))
                .collect()
        });
        for handle in &handles {
            assert!(Arc::ptr_eq(handle, &handles[0]));
        }
    }
}
