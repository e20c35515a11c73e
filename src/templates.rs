//! Template directory loading.
//!
//! A template directory is both the static scaffold of the ebook and the home
//! of the three templates rendered per conversion:
//!
//! ```text
//! epub_template/
//! ├── mimetype                  # copied, written first and stored
//! ├── META-INF/container.xml    # copied
//! └── EPUB/
//!     ├── content.opf           # template: package manifest
//!     ├── toc.ncx               # template: navigation document
//!     ├── Styles/style.css      # copied
//!     └── Text/page_001.html    # template: one page per move
//! ```
//!
//! Templates use [MiniJinja](https://docs.rs/minijinja) syntax, which is
//! compatible with Jinja2 for everything the stock templates need
//! (`{{ var }}`, `{% if %}`, `{% for %}`, `range`, `loop.index`). Every
//! template is rendered with HTML auto-escaping since all three produce XML.

use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Page template, relative to the template directory.
pub const PAGE_TEMPLATE: &str = "EPUB/Text/page_001.html";
/// Package manifest template, relative to the template directory.
pub const PACKAGE_TEMPLATE: &str = "EPUB/content.opf";
/// Navigation document template, relative to the template directory.
pub const NAVIGATION_TEMPLATE: &str = "EPUB/toc.ncx";

/// All template sources. These are rendered, never copied verbatim.
pub const TEMPLATE_FILES: [&str; 3] = [PAGE_TEMPLATE, PACKAGE_TEMPLATE, NAVIGATION_TEMPLATE];

/// Install location of the stock template in the Debian package.
pub const SYSTEM_TEMPLATE_DIR: &str = "/usr/share/sgf2ebook/epub_template";

/// Locate a configured template directory.
///
/// Absolute paths are used as-is. A relative path is tried against the
/// config root first, then the working directory, then the system install
/// location when it is the stock name. The first existing directory wins;
/// when none exists the config-root candidate is returned so loading reports
/// a meaningful path.
pub fn resolve_template_dir(config_root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        return configured.to_path_buf();
    }
    let mut candidates = vec![config_root.join(configured), configured.to_path_buf()];
    if configured == Path::new("epub_template") {
        candidates.push(PathBuf::from(SYSTEM_TEMPLATE_DIR));
    }
    candidates
        .iter()
        .find(|dir| dir.is_dir())
        .cloned()
        .unwrap_or_else(|| config_root.join(configured))
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("missing template {0}")]
    Missing(PathBuf),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("template error: {0}")]
    Render(#[from] minijinja::Error),
}

/// The three compiled templates of a template directory.
pub struct Templates {
    root: PathBuf,
    env: Environment<'static>,
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates").field("root", &self.root).finish()
    }
}

impl Templates {
    /// Load and compile the templates of `dir`.
    ///
    /// Syntax errors surface here rather than halfway through a conversion.
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        if !dir.is_dir() {
            return Err(TemplateError::DirectoryNotFound(dir.to_path_buf()));
        }
        let mut sources = Vec::with_capacity(TEMPLATE_FILES.len());
        for name in TEMPLATE_FILES {
            let path = dir.join(name);
            if !path.is_file() {
                return Err(TemplateError::Missing(path));
            }
            let source = fs::read_to_string(&path)
                .map_err(|source| TemplateError::Io { path, source })?;
            sources.push((name, source));
        }
        Self::compile(dir.to_path_buf(), sources)
    }

    /// Compile templates from in-memory sources; `root` is informational.
    pub fn from_sources(
        root: impl Into<PathBuf>,
        page: &str,
        package: &str,
        navigation: &str,
    ) -> Result<Self, TemplateError> {
        Self::compile(
            root.into(),
            vec![
                (PAGE_TEMPLATE, page.to_string()),
                (PACKAGE_TEMPLATE, package.to_string()),
                (NAVIGATION_TEMPLATE, navigation.to_string()),
            ],
        )
    }

    fn compile(root: PathBuf, sources: Vec<(&'static str, String)>) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_name| AutoEscape::Html);
        for (name, source) in sources {
            env.add_template_owned(name, source)?;
        }
        Ok(Self { root, env })
    }

    /// Directory the templates were loaded from; also the scaffold root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Render one of [`TEMPLATE_FILES`] with a serializable context.
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, TemplateError> {
        let template = self.env.get_template(name)?;
        Ok(template.render(context)?)
    }
}
