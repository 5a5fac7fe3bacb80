//! Loading stylesheets by URL.
//!
//! The evaluator sees one operation: resolve a textual URL against a base
//! and get back a canonical URL plus a parsed [`Stylesheet`].  Parsing is
//! the host's concern — the importers here either hold pre-parsed sheets
//! ([`MemoryImporter`]) or delegate the text they read to a parse callback
//! ([`FilesystemImporter`]).
//!
//! [`ImportCache`] fans a load out over a list of importers and caches the
//! result per canonical URL, so each stylesheet is parsed once per
//! compilation no matter how many times it is imported.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use thiserror::Error;
use url::Url;

use crate::ast::Stylesheet;
use crate::error::SassError;

/// Errors surfaced while resolving or reading a stylesheet.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Can't find stylesheet to import.")]
    NotFound,

    #[error("\"package:\" URLs aren't supported.")]
    PackageUrl,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Parse(String),
}

impl From<Box<SassError>> for ImportError {
    fn from(e: Box<SassError>) -> ImportError {
        ImportError::Parse(e.message().to_owned())
    }
}

/// A successfully loaded stylesheet.
#[derive(Clone)]
pub struct Loaded {
    pub canonical_url: Url,
    pub stylesheet: Rc<Stylesheet>,
}

/// Resolves URLs to parsed stylesheets.
pub trait Importer {
    /// Resolves `url` against `base` and loads it.  Returns `Ok(None)` when
    /// this importer does not recognize the URL, letting the next importer
    /// try.  `for_import` is true for legacy `@import` loads, which accept
    /// partial-only resolution differences.
    fn load(
        &self,
        url: &str,
        base: Option<&Url>,
        for_import: bool,
    ) -> Result<Option<Loaded>, ImportError>;

    /// A short display form of a canonical URL for stack frames.
    fn humanize(&self, canonical: &Url) -> String {
        canonical
            .path_segments()
            .and_then(|segments| segments.last().map(str::to_owned))
            .unwrap_or_else(|| canonical.to_string())
    }
}

/// An importer over a fixed set of pre-parsed stylesheets, keyed by URL
/// path.  Used by tests and REPL-style hosts.
#[derive(Default)]
pub struct MemoryImporter {
    sheets: HashMap<String, Rc<Stylesheet>>,
}

impl MemoryImporter {
    pub fn new() -> MemoryImporter {
        MemoryImporter::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, sheet: Stylesheet) {
        self.sheets.insert(url.into(), Rc::new(sheet));
    }

    fn candidates(url: &str) -> Vec<String> {
        let (dir, file) = match url.rfind('/') {
            Some(pos) => (&url[..pos + 1], &url[pos + 1..]),
            None => ("", url),
        };

        let mut list = vec![url.to_owned(), format!("{}_{}", dir, file)];
        if !file.ends_with(".scss") {
            list.push(format!("{}{}.scss", dir, file));
            list.push(format!("{}_{}.scss", dir, file));
        }
        list
    }
}

impl Importer for MemoryImporter {
    fn load(
        &self,
        url: &str,
        base: Option<&Url>,
        _for_import: bool,
    ) -> Result<Option<Loaded>, ImportError> {
        // resolve relative references against the base's path
        let resolved = match base {
            Some(base) if base.scheme() == "memory" => base
                .join(url)
                .map(|joined| joined.path().trim_start_matches('/').to_owned())
                .unwrap_or_else(|_| url.to_owned()),
            _ => url.to_owned(),
        };

        for candidate in Self::candidates(&resolved) {
            if let Some(sheet) = self.sheets.get(&candidate) {
                let canonical = Url::parse(&format!("memory:/{}", candidate))?;
                return Ok(Some(Loaded {
                    canonical_url: canonical,
                    stylesheet: Rc::clone(sheet),
                }));
            }
        }
        Ok(None)
    }
}

/// Parses stylesheet text on behalf of [`FilesystemImporter`].
pub type ParseFn = Rc<dyn Fn(&str, &Url) -> Result<Stylesheet, Box<SassError>>>;

/// Loads stylesheets from disk, resolving relative URLs against the base
/// file the way the URL standard does.
pub struct FilesystemImporter {
    load_path: PathBuf,
    parse: ParseFn,
}

impl FilesystemImporter {
    pub fn new(load_path: impl Into<PathBuf>, parse: ParseFn) -> FilesystemImporter {
        FilesystemImporter {
            load_path: load_path.into(),
            parse,
        }
    }

    fn resolve(&self, url: &str, base: Option<&Url>) -> Result<Option<PathBuf>, ImportError> {
        let resolved: PathBuf = match base.filter(|b| b.scheme() == "file") {
            Some(base) => base
                .join(url)?
                .to_file_path()
                .map_err(|_| ImportError::NotFound)?,
            None => self.load_path.join(url),
        };

        let file_name = resolved
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_owned();
        let dir = resolved.parent().map(PathBuf::from).unwrap_or_default();

        let mut candidates = vec![resolved.clone()];
        if !file_name.ends_with(".scss") {
            candidates.push(dir.join(format!("{}.scss", file_name)));
            candidates.push(dir.join(format!("_{}.scss", file_name)));
        } else {
            candidates.push(dir.join(format!("_{}", file_name)));
        }

        Ok(candidates.into_iter().find(|c| c.is_file()))
    }
}

impl Importer for FilesystemImporter {
    fn load(
        &self,
        url: &str,
        base: Option<&Url>,
        _for_import: bool,
    ) -> Result<Option<Loaded>, ImportError> {
        let path = match self.resolve(url, base)? {
            Some(path) => path,
            None => return Ok(None),
        };

        let text = std::fs::read_to_string(&path).map_err(|source| ImportError::Io {
            path: path.clone(),
            source,
        })?;

        let canonical = Url::from_file_path(
            path.canonicalize().unwrap_or(path),
        )
        .map_err(|_| ImportError::NotFound)?;

        let stylesheet = (self.parse)(&text, &canonical)?;
        Ok(Some(Loaded {
            canonical_url: canonical,
            stylesheet: Rc::new(stylesheet),
        }))
    }
}

/// Resolves through an ordered importer list, caching by canonical URL.
pub struct ImportCache {
    importers: Vec<Rc<dyn Importer>>,
    cache: RefCell<HashMap<Url, Loaded>>,
}

impl ImportCache {
    pub fn new(importers: Vec<Rc<dyn Importer>>) -> ImportCache {
        ImportCache {
            importers,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Loads `url`, consulting the cache first.
    pub fn import(
        &self,
        url: &str,
        base: Option<&Url>,
        for_import: bool,
    ) -> Result<Option<Loaded>, ImportError> {
        if url.starts_with("package:") {
            return Err(ImportError::PackageUrl);
        }

        for importer in &self.importers {
            if let Some(loaded) = importer.load(url, base, for_import)? {
                let mut cache = self.cache.borrow_mut();
                if let Some(cached) = cache.get(&loaded.canonical_url) {
                    return Ok(Some(cached.clone()));
                }
                cache.insert(loaded.canonical_url.clone(), loaded.clone());
                return Ok(Some(loaded));
            }
        }
        Ok(None)
    }

    /// The display name of a canonical URL, per the first importer.
    pub fn humanize(&self, canonical: &Url) -> String {
        self.importers
            .first()
            .map(|i| i.humanize(canonical))
            .unwrap_or_else(|| canonical.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codemap::CodeMap;

    fn sheet() -> Stylesheet {
        let mut map = CodeMap::new();
        let span = map.add_file("t.scss".into(), "".into()).span;
        Stylesheet::new(vec![], span)
    }

    #[test]
    fn memory_importer_resolves_partials_and_extensions() {
        let mut importer = MemoryImporter::new();
        importer.insert("_lib.scss", sheet());
        importer.insert("app.scss", sheet());

        assert!(importer.load("lib", None, false).unwrap().is_some());
        assert!(importer.load("app", None, false).unwrap().is_some());
        assert!(importer.load("app.scss", None, false).unwrap().is_some());
        assert!(importer.load("missing", None, false).unwrap().is_none());
    }

    #[test]
    fn memory_importer_resolves_relative_to_base() {
        let mut importer = MemoryImporter::new();
        importer.insert("nested/lib.scss", sheet());

        let base = Url::parse("memory:/nested/app.scss").unwrap();
        let loaded = importer.load("lib", Some(&base), false).unwrap().unwrap();
        assert_eq!(loaded.canonical_url.as_str(), "memory:/nested/lib.scss");
    }

    #[test]
    fn package_urls_are_rejected() {
        let cache = ImportCache::new(vec![Rc::new(MemoryImporter::new()) as Rc<dyn Importer>]);
        assert!(matches!(
            cache.import("package:foo/bar", None, false),
            Err(ImportError::PackageUrl)
        ));
    }

    #[test]
    fn cache_returns_same_stylesheet() {
        let mut importer = MemoryImporter::new();
        importer.insert("a.scss", sheet());
        let cache = ImportCache::new(vec![Rc::new(importer) as Rc<dyn Importer>]);

        let first = cache.import("a", None, false).unwrap().unwrap();
        let second = cache.import("a", None, false).unwrap().unwrap();
        assert!(Rc::ptr_eq(&first.stylesheet, &second.stylesheet));
    }
}
