//! Entry points of a generation request: parse, measure, compose, render.

use crate::backend::{PdfBackend, RenderBackend};
use crate::compositor::PageCompositor;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::font::FontCache;
use crate::info::Info;
use crate::model::GenerationRequest;
use crate::tree::ComposedDocument;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Generates documents. One engine serves any number of concurrent requests;
/// the font cache is the only state they share.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    fonts: Arc<FontCache>,
    fetcher: Arc<dyn Fetcher>,
}

impl Engine {
    /// An engine fetching remote data over HTTP with the configured timeouts
    pub fn new(config: EngineConfig) -> Result<Engine> {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        Ok(Engine::with_fetcher(config, Arc::new(fetcher)))
    }

    pub fn with_fetcher(config: EngineConfig, fetcher: Arc<dyn Fetcher>) -> Engine {
        let fonts = Arc::new(FontCache::from_config(config.fonts.clone()));
        Engine::with_parts(config, fonts, fetcher)
    }

    /// An engine sharing an existing font cache
    pub fn with_parts(config: EngineConfig, fonts: Arc<FontCache>, fetcher: Arc<dyn Fetcher>) -> Engine {
        if config.fonts.preload_common_fonts {
            let loaded = fonts.preload_common();
            log::info!("preloaded {loaded} common font(s)");
        }
        Engine {
            config,
            fonts,
            fetcher,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fonts(&self) -> &Arc<FontCache> {
        &self.fonts
    }

    /// Run both layout passes over every page of the request
    pub fn compose(&self, request: &GenerationRequest) -> Result<ComposedDocument> {
        PageCompositor::new(&self.config, &self.fonts, self.fetcher.as_ref()).compose_request(request)
    }

    /// Compose the request and render it as PDF into `out`
    pub fn render_to(&self, request: &GenerationRequest, out: &mut dyn Write) -> Result<()> {
        self.render_with(request, &PdfBackend::new(), out)
    }

    pub fn render_with(
        &self,
        request: &GenerationRequest,
        backend: &dyn RenderBackend,
        out: &mut dyn Write,
    ) -> Result<()> {
        let document = self.compose(request)?;
        backend.render(&document, out)
    }

    /// Render the request to `<output_dir>/<name>.pdf`. The document is
    /// written to a temporary file first and only moved into place once
    /// complete, so a failed generation leaves nothing behind.
    pub fn generate(&self, request: &GenerationRequest, name: &str) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(Error::Output(format!("invalid output name `{name}`")));
        }

        let dir = &self.config.output_dir;
        std::fs::create_dir_all(dir)?;
        let target = dir.join(format!("{name}.pdf"));

        let mut info = Info::new();
        info.title(name);
        let backend = PdfBackend::with_info(info);

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut out = BufWriter::new(file.as_file_mut());
            self.render_with(request, &backend, &mut out)?;
            out.flush()?;
        }
        file.persist(&target)
            .map_err(|err| Error::Output(format!("{}: {}", target.display(), err.error)))?;

        log::info!("generated {}", target.display());
        Ok(target)
    }
}
