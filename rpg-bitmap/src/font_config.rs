//! Font configuration and the shared font library used for text drawing.

use cosmic_text::{FontSystem, SwashCache};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

/// Font configuration for the bitmaps of a game.
///
/// Describes where fonts come from and how generic CSS families map to concrete
/// families. Resolve it into a [`FontLibrary`] once and share that library
/// between bitmaps.
#[derive(Clone, Debug)]
pub struct FontConfig {
    /// Font files bundled with the game (e.g. the main and number fonts).
    pub custom_fonts: Vec<CustomFont>,
    /// Mappings from generic CSS family names to concrete font family names.
    pub generic_families: GenericFamilyMap,
    /// Whether to load system fonts (default: true).
    pub load_system_fonts: bool,
    /// Additional directories to scan for font files.
    pub font_dirs: Vec<PathBuf>,
    /// Whether glyph outlines are hinted (default: false).
    pub hinting_enabled: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            custom_fonts: Vec::new(),
            generic_families: GenericFamilyMap::defaults(),
            load_system_fonts: true,
            font_dirs: Vec::new(),
            hinting_enabled: false,
        }
    }
}

impl FontConfig {
    /// A configuration that loads no fonts at all. Text measures as zero width.
    pub fn empty() -> Self {
        Self {
            load_system_fonts: false,
            ..Self::default()
        }
    }

    /// Resolve this configuration into a font library, scanning fonts once.
    pub fn resolve(&self) -> FontLibrary {
        FontLibrary::new(self)
    }
}

/// A font to register, consisting of raw font file data and an optional family name override.
#[derive(Clone, Debug)]
pub struct CustomFont {
    /// Raw font file data (TTF/OTF). Arc-wrapped for cheap cloning.
    pub data: Arc<Vec<u8>>,
    /// Optional family name the font is referred to by in `font_face`.
    /// If None, the family name is read from the font's name table.
    pub family_name: Option<String>,
}

/// Mappings from generic CSS family names to concrete font family names, in priority order.
#[derive(Clone, Debug, Default)]
pub struct GenericFamilyMap {
    /// Concrete fonts for CSS "serif" (priority order).
    pub serif: Vec<String>,
    /// Concrete fonts for CSS "sans-serif" (priority order).
    pub sans_serif: Vec<String>,
    /// Concrete fonts for CSS "monospace" (priority order).
    pub monospace: Vec<String>,
}

impl GenericFamilyMap {
    /// Returns the default generic family mappings matching browser behavior.
    pub fn defaults() -> Self {
        Self {
            sans_serif: vec![
                "Arial".into(),
                "Helvetica".into(),
                "Liberation Sans".into(),
                "DejaVu Sans".into(),
            ],
            monospace: vec![
                "Courier New".into(),
                "Courier".into(),
                "Liberation Mono".into(),
                "DejaVu Sans Mono".into(),
            ],
            serif: vec![
                "Times New Roman".into(),
                "Times".into(),
                "Liberation Serif".into(),
                "DejaVu Serif".into(),
            ],
        }
    }
}

/// Shared handle to a font library. Bitmaps live on one thread, so sharing is
/// `Rc<RefCell<_>>`.
pub type SharedFonts = Rc<RefCell<FontLibrary>>;

thread_local! {
    static DEFAULT_FONTS: SharedFonts = Rc::new(RefCell::new(FontConfig::default().resolve()));
}

/// Font database plus the shaping and glyph outline caches built on it.
pub struct FontLibrary {
    pub(crate) font_system: FontSystem,
    pub(crate) swash_cache: SwashCache,
    /// Lowercased family names available in the database.
    families: HashSet<String>,
    /// `family_name` overrides of custom fonts, lowercased, mapped to the real family name.
    aliases: Vec<(String, String)>,
    pub(crate) hinting_enabled: bool,
}

impl FontLibrary {
    /// Build a library from a configuration. Scans system fonts if requested.
    pub fn new(config: &FontConfig) -> Self {
        let db = font_config_to_fontdb(config);
        let families = family_names(&db)
            .into_iter()
            .map(|name| name.to_lowercase())
            .collect();
        let aliases = custom_font_aliases(config);
        let font_system = FontSystem::new_with_locale_and_db("en".to_string(), db);
        log::debug!(target: "bitmap", "font library ready ({} faces)", font_system.db().len());
        Self {
            font_system,
            swash_cache: SwashCache::new(),
            families,
            aliases,
            hinting_enabled: config.hinting_enabled,
        }
    }

    /// Wrap this library for sharing between bitmaps.
    pub fn into_shared(self) -> SharedFonts {
        Rc::new(RefCell::new(self))
    }

    /// The library built from `FontConfig::default()` for the current thread.
    pub fn thread_default() -> SharedFonts {
        DEFAULT_FONTS.with(Rc::clone)
    }

    /// Number of font faces available.
    pub fn face_count(&self) -> usize {
        self.font_system.db().len()
    }

    /// Resolve a `font_face` family name to the name registered in the database.
    ///
    /// Returns `None` for names that are neither generic families nor installed.
    pub(crate) fn resolve_family(&self, name: &str) -> Option<ResolvedFamily> {
        let lower = name.to_lowercase();
        match lower.as_str() {
            "sans-serif" | "system-ui" => return Some(ResolvedFamily::SansSerif),
            "serif" => return Some(ResolvedFamily::Serif),
            "monospace" => return Some(ResolvedFamily::Monospace),
            _ => {}
        }
        if let Some((_, real)) = self.aliases.iter().find(|(alias, _)| *alias == lower) {
            return Some(ResolvedFamily::Named(real.clone()));
        }
        if self.families.contains(&lower) {
            return Some(ResolvedFamily::Named(name.to_string()));
        }
        None
    }
}

/// A family from `font_face` that the library can render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ResolvedFamily {
    SansSerif,
    Serif,
    Monospace,
    Named(String),
}

/// Convert a [`FontConfig`] into a [`fontdb::Database`].
pub fn font_config_to_fontdb(config: &FontConfig) -> fontdb::Database {
    let mut db = fontdb::Database::new();

    if config.load_system_fonts {
        db.load_system_fonts();
    }

    for dir in &config.font_dirs {
        db.load_fonts_dir(dir);
    }

    for font in &config.custom_fonts {
        db.load_font_data(Vec::from(font.data.as_slice()));
    }

    apply_generic_families(&mut db, &config.generic_families);

    db
}

fn family_names(db: &fontdb::Database) -> HashSet<String> {
    db.faces()
        .flat_map(|face| {
            face.families
                .iter()
                .map(|(fam, _lang)| fam.clone())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Map each custom font's `family_name` override to the family found in its name table.
fn custom_font_aliases(config: &FontConfig) -> Vec<(String, String)> {
    config
        .custom_fonts
        .iter()
        .filter_map(|font| {
            let alias = font.family_name.as_ref()?;
            let mut single = fontdb::Database::new();
            single.load_font_data(Vec::from(font.data.as_slice()));
            let real = single
                .faces()
                .next()
                .and_then(|face| face.families.first().map(|(name, _)| name.clone()))?;
            Some((alias.to_lowercase(), real))
        })
        .collect()
}

/// Apply generic family mappings to a fontdb database, choosing the first available
/// family from each priority list.
fn apply_generic_families(db: &mut fontdb::Database, families: &GenericFamilyMap) {
    let available = family_names(db);

    if let Some(family) = families.sans_serif.iter().find(|f| available.contains(*f)) {
        db.set_sans_serif_family(family);
    }
    if let Some(family) = families.monospace.iter().find(|f| available.contains(*f)) {
        db.set_monospace_family(family);
    }
    if let Some(family) = families.serif.iter().find(|f| available.contains(*f)) {
        db.set_serif_family(family);
    }
}
