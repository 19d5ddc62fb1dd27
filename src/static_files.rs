//! Static file serving on top of the route table.
//!
//! [`Router::serve_static`](crate::router::Router::serve_static) mounts a
//! [`StaticFiles`] handler as `GET <mount>/*`. The part of the request path
//! after the mount point, prefixed with [`StaticConfig::prefix`], is looked up
//! under [`StaticConfig::root`]. Paths that would leave the root (`..`,
//! absolute components) are answered with 404.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::dispatcher::{Handler, HandlerRequest, HandlerResponse};
use crate::error::RouteError;
use crate::runtime_config::DEFAULT_NOT_FOUND_BODY;

/// Predicate deciding whether a request should be skipped.
pub type SkipFn = Arc<dyn Fn(&HandlerRequest) -> bool + Send + Sync>;

/// Options for one static mount.
#[derive(Clone)]
pub struct StaticConfig {
    /// Directory files are served from
    pub root: PathBuf,
    /// Prepended to the request path before looking it up under `root`
    pub prefix: String,
    /// File served for directory requests (default `index.html`)
    pub index: String,
    /// `Cache-Control: public, max-age=N` is sent when non-zero
    pub max_age: u32,
    /// File under `root` served (with status 404) for missing paths; the
    /// prefix is not applied to it
    pub not_found_file: Option<String>,
    /// When this returns true the request is answered with 204 No Content
    pub next: Option<SkipFn>,
}

impl fmt::Debug for StaticConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticConfig")
            .field("root", &self.root)
            .field("prefix", &self.prefix)
            .field("index", &self.index)
            .field("max_age", &self.max_age)
            .field("not_found_file", &self.not_found_file)
            .field("next", &self.next.is_some())
            .finish()
    }
}

impl StaticConfig {
    /// Serve files from `root` with default options.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            prefix: String::new(),
            index: "index.html".to_string(),
            max_age: 0,
            not_found_file: None,
            next: None,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    #[must_use]
    pub fn with_max_age(mut self, seconds: u32) -> Self {
        self.max_age = seconds;
        self
    }

    #[must_use]
    pub fn with_not_found_file(mut self, file: impl Into<String>) -> Self {
        self.not_found_file = Some(file.into());
        self
    }

    #[must_use]
    pub fn with_next<F>(mut self, next: F) -> Self
    where
        F: Fn(&HandlerRequest) -> bool + Send + Sync + 'static,
    {
        self.next = Some(Arc::new(next));
        self
    }
}

/// Handler state for one static mount.
#[derive(Debug)]
pub struct StaticFiles {
    mount: String,
    config: StaticConfig,
    cache_control: Option<String>,
}

impl StaticFiles {
    /// Files under `config.root`, answering requests below `mount`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::StaticRoot`] when the root is not a directory.
    pub fn new(mount: &str, mut config: StaticConfig) -> Result<Self, RouteError> {
        if !config.root.is_dir() {
            return Err(RouteError::StaticRoot {
                path: config.root.display().to_string(),
            });
        }
        if config.index.is_empty() {
            config.index = "index.html".to_string();
        }
        let cache_control = (config.max_age > 0)
            .then(|| format!("public, max-age={}", config.max_age));
        Ok(Self {
            mount: mount.trim_end_matches('/').to_string(),
            config,
            cache_control,
        })
    }

    /// Map a URL path to a file below the root, refusing anything that would
    /// escape it.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let joined = format!(
            "{}/{}",
            self.config.prefix.trim_matches('/'),
            url_path.trim_start_matches('/')
        );
        self.under_root(&joined)
    }

    /// Resolve `relative` directly below the root, ignoring the prefix.
    fn under_root(&self, relative: &str) -> Option<PathBuf> {
        let mut pb = self.config.root.clone();
        for comp in Path::new(relative.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    fn content_type(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "html" | "htm" => "text/html; charset=utf-8",
            "css" => "text/css",
            "js" | "mjs" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain; charset=utf-8",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "ico" => "image/x-icon",
            "wasm" => "application/wasm",
            "woff2" => "font/woff2",
            _ => "application/octet-stream",
        }
    }

    fn file_response(&self, status: u16, path: &Path, bytes: Vec<u8>) -> HandlerResponse {
        let mut resp = HandlerResponse::new(status, Default::default(), bytes);
        resp.set_header("content-type", Self::content_type(path).to_string());
        if let Some(cache_control) = &self.cache_control {
            resp.set_header("cache-control", cache_control.clone());
        }
        resp
    }

    fn not_found(&self, path: &str) -> HandlerResponse {
        debug!(path, "Static file not found");
        if let Some(file) = &self.config.not_found_file {
            if let Some(fallback) = self.under_root(file) {
                match fs::read(&fallback) {
                    Ok(bytes) => return self.file_response(404, &fallback, bytes),
                    Err(e) => warn!(
                        file = %fallback.display(),
                        error = %e,
                        "Not-found file could not be read"
                    ),
                }
            }
        }
        HandlerResponse::text(404, DEFAULT_NOT_FOUND_BODY)
    }

    /// Answer one request.
    #[must_use]
    pub fn respond(&self, req: &HandlerRequest) -> HandlerResponse {
        if self.config.next.as_ref().is_some_and(|next| next(req)) {
            return HandlerResponse::no_content();
        }

        let relative = req.path.strip_prefix(&self.mount).unwrap_or(&req.path);
        let Some(mut path) = self.map_path(relative) else {
            warn!(path = %req.path, "Rejected static path outside root");
            return self.not_found(&req.path);
        };
        if path.is_dir() {
            path.push(&self.config.index);
        }

        match fs::read(&path) {
            Ok(bytes) => self.file_response(200, &path, bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.not_found(&req.path),
            Err(e) => {
                error!(file = %path.display(), error = %e, "Static file could not be read");
                HandlerResponse::text(500, "500 Internal Server Error")
            }
        }
    }

    /// Wrap into a route handler.
    #[must_use]
    pub fn into_handler(self) -> Handler {
        let files = Arc::new(self);
        Arc::new(move |req: HandlerRequest| files.respond(&req))
    }
}
