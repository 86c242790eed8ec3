use crate::cmap::{AnyCMap, IdentityCMap};
use crate::resource::{read_cmap, read_unicode_maps};
use crate::unicode_map::UnicodeMap;
use crate::{Error, Result};
use log::info;
use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

/// Directory searched first when `CMAP_PATH` is not set.
pub const DEFAULT_CMAP_PATH: &str = "/usr/share/cmapdb/";

static IDENTITY_H: LazyLock<Arc<AnyCMap>> = LazyLock::new(|| Arc::new(AnyCMap::Identity(IdentityCMap::new(false))));
static IDENTITY_V: LazyLock<Arc<AnyCMap>> = LazyLock::new(|| Arc::new(AnyCMap::Identity(IdentityCMap::new(true))));

static GLOBAL: LazyLock<CMapDb> = LazyLock::new(CMapDb::from_env);

/// Cache of named CMap resources.
///
/// Maps are loaded on first request and kept for the life of the cache. Loading
/// happens outside the lock; when two threads race on the same name both build
/// the map and the first one stored is returned to both.
#[derive(Debug)]
pub struct CMapDb {
    dirs: Vec<PathBuf>,
    cmaps: Mutex<HashMap<String, Arc<AnyCMap>>>,
    umaps: Mutex<HashMap<String, [Arc<UnicodeMap>; 2]>>,
}

impl CMapDb {
    /// Cache reading resources from `dirs`, searched in order.
    pub fn new<I, P>(dirs: I) -> CMapDb
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        CMapDb {
            dirs: dirs.into_iter().map(Into::into).collect(),
            cmaps: Mutex::new(HashMap::new()),
            umaps: Mutex::new(HashMap::new()),
        }
    }

    /// `$CMAP_PATH` (or [`DEFAULT_CMAP_PATH`]), then the `cmap` directory shipped with the crate.
    pub fn from_env() -> CMapDb {
        let override_dir = env::var_os("CMAP_PATH").map_or_else(|| PathBuf::from(DEFAULT_CMAP_PATH), PathBuf::from);
        let bundled = Path::new(env!("CARGO_MANIFEST_DIR")).join("cmap");
        CMapDb::new([override_dir, bundled])
    }

    /// Process wide cache, configured by [`CMapDb::from_env`] on first use.
    pub fn global() -> &'static CMapDb {
        &GLOBAL
    }

    /// Code to CID map `name`. `Identity-H` and `Identity-V` never touch the disk.
    pub fn get_cmap(&self, name: &str) -> Result<Arc<AnyCMap>> {
        match name {
            "Identity-H" => return Ok(Arc::clone(&IDENTITY_H)),
            "Identity-V" => return Ok(Arc::clone(&IDENTITY_V)),
            _ => {}
        }
        if let Some(cmap) = self.cmaps.lock().unwrap_or_else(PoisonError::into_inner).get(name) {
            return Ok(Arc::clone(cmap));
        }

        let file = self.open(name, &format!("{}.json.gz", name))?;
        let cmap = Arc::new(AnyCMap::Table(read_cmap(name, file)?));

        let mut cmaps = self.cmaps.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cmaps.entry(name.to_string()).or_insert(cmap)))
    }

    /// CID to Unicode map for the character collection `name`.
    ///
    /// Both writing modes are loaded and cached together. Cached maps are shared
    /// and read only: use [`UnicodeMap::get`], since resource tables carry no
    /// bfranges for [`UnicodeMap::get_unichr`] to extend.
    pub fn get_unicode_map(&self, name: &str, vertical: bool) -> Result<Arc<UnicodeMap>> {
        let pick = |maps: &[Arc<UnicodeMap>; 2]| Arc::clone(&maps[usize::from(vertical)]);
        if let Some(maps) = self.umaps.lock().unwrap_or_else(PoisonError::into_inner).get(name) {
            return Ok(pick(maps));
        }

        let file = self.open(name, &format!("to-unicode-{}.json.gz", name))?;
        let [horizontal, vertical_map] = read_unicode_maps(name, file)?;
        let maps = [Arc::new(horizontal), Arc::new(vertical_map)];

        let mut umaps = self.umaps.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(pick(umaps.entry(name.to_string()).or_insert(maps)))
    }

    fn open(&self, name: &str, filename: &str) -> Result<BufReader<File>> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(Error::ResourceNotFound(name.to_string()));
        }
        info!("loading: {}", name);
        for dir in &self.dirs {
            let path = dir.join(filename);
            if path.is_file() {
                return Ok(BufReader::new(File::open(path)?));
            }
        }
        Err(Error::ResourceNotFound(name.to_string()))
    }
}
