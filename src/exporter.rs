use crate::collector::{CollectorSet, Registry};
use crate::exposition::StaticLabels;

type LabelSource = Box<dyn Fn() -> StaticLabels + Send + Sync>;

/// Produces one metrics document per request.
///
/// Holds only read-only state, so a single instance is shared by all
/// concurrently served requests.
pub struct Exporter {
    registry: Registry,
    enabled: CollectorSet,
    labels: LabelSource,
}

impl Exporter {
    pub fn new(
        registry: Registry,
        enabled: CollectorSet,
        labels: impl Fn() -> StaticLabels + Send + Sync + 'static,
    ) -> Self {
        Self {
            registry,
            enabled,
            labels: Box::new(labels),
        }
    }

    /// Runs the enabled collectors. Blocks until all of them finish.
    pub fn scrape(&self) -> String {
        let static_labels = (self.labels)();
        self.registry.render(&self.enabled, &static_labels)
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("registry", &self.registry)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
