use crate::config::PaperConfig;
use crate::events::{DocumentListener, Notifier};
use crate::ocr::resolver::OrientationResolver;
use crate::ocr::scoring::{ScoreChain, SpellChecker, WordListSpellChecker};
use crate::ocr::tesseract::TesseractRegistry;
use crate::ocr::{EngineRegistry, StaticRegistry};
use crate::store::{ArtifactStore, FsBackend, StorageBackend};
use std::sync::Arc;

/// Everything an operation needs: configuration, the artifact store, the recognition
/// collaborators and the listeners to notify.
///
/// Built once at startup and handed to the resolver, the index engine and the commands.
pub struct PaperContext<B: StorageBackend> {
    pub config: PaperConfig,
    pub store: Arc<ArtifactStore<B>>,
    pub notifier: Notifier,
    pub engines: Arc<dyn EngineRegistry>,
    pub spell_checker: Option<Arc<dyn SpellChecker>>,
}

impl<B: StorageBackend> PaperContext<B> {
    /// A context without recognition engines or spell checker.
    pub fn new(config: PaperConfig, backend: B) -> Self {
        let store = Arc::new(ArtifactStore::new(backend, config.workdir()));
        Self {
            config,
            store,
            notifier: Notifier::new(),
            engines: Arc::new(StaticRegistry::empty()),
            spell_checker: None,
        }
    }

    pub fn with_ocr(mut self, engines: Arc<dyn EngineRegistry>) -> Self {
        self.engines = engines;
        self
    }

    pub fn with_spell_checker(mut self, checker: Arc<dyn SpellChecker>) -> Self {
        self.spell_checker = Some(checker);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn DocumentListener>) -> Self {
        self.notifier.subscribe(listener);
        self
    }

    pub fn store(&self) -> &ArtifactStore<B> {
        &self.store
    }

    pub fn resolver(&self) -> OrientationResolver {
        OrientationResolver::new(
            Arc::clone(&self.engines),
            ScoreChain::standard(self.spell_checker.clone()),
            self.config.workers(),
        )
    }
}

impl PaperContext<FsBackend> {
    /// Production wiring: filesystem store, tesseract, and word-list spell checking when a
    /// dictionary directory is configured.
    pub fn from_config(config: PaperConfig) -> Self {
        let engines = Arc::new(TesseractRegistry::new(config.tesseract_path()));
        let checker = config
            .dictionary_dir
            .clone()
            .map(|dir| Arc::new(WordListSpellChecker::new(dir)) as Arc<dyn SpellChecker>);

        let mut context = Self::new(config, FsBackend::new()).with_ocr(engines);
        context.spell_checker = checker;
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemBackend;
    use std::path::PathBuf;

    #[test]
    fn test_store_lives_in_configured_workdir() {
        let config = PaperConfig {
            workdir: Some(PathBuf::from("/papers")),
            ocr_workers: Some(2),
            ..Default::default()
        };
        let context = PaperContext::new(config, MemBackend::new());
        assert_eq!(context.store().workdir(), PathBuf::from("/papers"));
        assert_eq!(context.resolver().workers(), 2);
        assert!(context.engines.available().is_empty());
    }

    #[test]
    fn test_from_config_wires_spell_checker_from_dictionary_dir() {
        let config = PaperConfig {
            workdir: Some(PathBuf::from("/papers")),
            dictionary_dir: Some(PathBuf::from("/usr/share/hunspell")),
            ..Default::default()
        };
        assert!(PaperContext::from_config(config).spell_checker.is_some());
        assert!(PaperContext::from_config(PaperConfig::default())
            .spell_checker
            .is_none());
    }
}
