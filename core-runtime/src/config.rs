//! # Core Configuration Module
//!
//! Capability wiring for the playback core.
//!
//! ## Overview
//!
//! [`CoreConfig`] holds the host bridges the player needs and is built through
//! [`CoreConfigBuilder`]. The builder fails fast with
//! [`Error::CapabilityMissing`] when a required bridge is absent, telling the
//! integrator which trait to implement.
//!
//! ## Required Dependencies
//!
//! - `MediaEngineFactory` - Builds the platform media engine
//! - `PreferenceSource` - Connect timeout, tunneling and reconnect mode
//!
//! With the `desktop-shims` feature an `InMemoryPreferences` source is
//! injected when none is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .engine_factory(Arc::new(MyEngineFactory))
//!     .preference_source(Arc::new(MyPreferences))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::EventBus;
use bridge_traits::{LoggerSink, MediaEngineFactory, PreferenceSource};
use std::sync::Arc;

/// Host bridges and switches for the playback core.
#[derive(Clone)]
pub struct CoreConfig {
    /// Engine factory (required)
    pub engine_factory: Arc<dyn MediaEngineFactory>,

    /// Preference source (required, desktop default available)
    pub preference_source: Arc<dyn PreferenceSource>,

    /// Host log sink, mirrored by `init_logging` (optional)
    pub logger_sink: Option<Arc<dyn LoggerSink>>,

    /// Lifecycle event bus (optional, required by `emit_events`)
    pub event_bus: Option<EventBus>,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("engine_factory", &"MediaEngineFactory { ... }")
            .field("preference_source", &self.preference_source.current())
            .field(
                "logger_sink",
                &self.logger_sink.as_ref().map(|_| "LoggerSink { ... }"),
            )
            .field("event_bus", &self.event_bus)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    /// Publish `CoreEvent::Playback` events (requires an `EventBus`)
    pub emit_events: bool,
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Checks feature flags against the provided bridges.
    pub fn validate(&self) -> Result<()> {
        if self.features.emit_events && self.event_bus.is_none() {
            return Err(Error::Config(
                "Event emission enabled but no EventBus provided. \
                 Disable the feature or pass an EventBus to the builder."
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// The event bus, if events are enabled.
    pub fn active_event_bus(&self) -> Option<&EventBus> {
        if self.features.emit_events {
            self.event_bus.as_ref()
        } else {
            None
        }
    }
}

fn engine_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaEngineFactory".to_string(),
        message: "A MediaEngineFactory is required to create players. \
                 Android: wrap ExoPlayer/Media3. iOS: wrap AVPlayer. \
                 Desktop: wrap libmpv, GStreamer or another native engine."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn preference_source_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "PreferenceSource".to_string(),
        message: "A PreferenceSource is required for connect timeout, tunneling and \
                 reconnect settings. Desktop: enable the 'desktop-shims' feature to use \
                 the default InMemoryPreferences. Mobile: expose DataStore/UserDefaults \
                 through the trait."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_preference_source() -> Result<Arc<dyn PreferenceSource>> {
    use bridge_desktop::InMemoryPreferences;

    let source: Arc<dyn PreferenceSource> = Arc::new(InMemoryPreferences::default());
    Ok(source)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_preference_source() -> Result<Arc<dyn PreferenceSource>> {
    Err(preference_source_missing_error())
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    engine_factory: Option<Arc<dyn MediaEngineFactory>>,
    preference_source: Option<Arc<dyn PreferenceSource>>,
    logger_sink: Option<Arc<dyn LoggerSink>>,
    event_bus: Option<EventBus>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the engine factory (required).
    pub fn engine_factory(mut self, factory: Arc<dyn MediaEngineFactory>) -> Self {
        self.engine_factory = Some(factory);
        self
    }

    /// Sets the preference source (required unless `desktop-shims` is on).
    pub fn preference_source(mut self, source: Arc<dyn PreferenceSource>) -> Self {
        self.preference_source = Some(source);
        self
    }

    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    /// Sets the event bus. Does not enable emission on its own.
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Enables or disables lifecycle event emission.
    ///
    /// Requires an `EventBus`.
    ///
    /// Default: false
    pub fn emit_events(mut self, enabled: bool) -> Self {
        self.features.emit_events = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge is missing
    /// - [`Error::Config`] when feature flags need a bridge that was not provided
    pub fn build(self) -> Result<CoreConfig> {
        let engine_factory = self
            .engine_factory
            .ok_or_else(engine_factory_missing_error)?;

        let preference_source = match self.preference_source {
            Some(source) => source,
            None => provide_default_preference_source()?,
        };

        let config = CoreConfig {
            engine_factory,
            preference_source,
            logger_sink: self.logger_sink,
            event_bus: self.event_bus,
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{
        BridgeError, EngineOptions, MediaEngine, PlaybackPreferences, PlayerListener,
    };
    use mockall::mock;
    use tokio::sync::watch;

    mock! {
        Factory {}
        impl MediaEngineFactory for Factory {
            fn create(
                &self,
                options: EngineOptions,
                listener: Arc<dyn PlayerListener>,
            ) -> std::result::Result<Box<dyn MediaEngine>, BridgeError>;
        }
    }

    struct FixedPreferences(watch::Sender<PlaybackPreferences>);

    impl FixedPreferences {
        fn new() -> Self {
            Self(watch::channel(PlaybackPreferences::default()).0)
        }
    }

    impl PreferenceSource for FixedPreferences {
        fn current(&self) -> PlaybackPreferences {
            *self.0.borrow()
        }

        fn subscribe(&self) -> watch::Receiver<PlaybackPreferences> {
            self.0.subscribe()
        }
    }

    #[test]
    fn test_missing_engine_factory() {
        let result = CoreConfig::builder()
            .preference_source(Arc::new(FixedPreferences::new()))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "MediaEngineFactory");
            }
            other => panic!("expected CapabilityMissing, got {:?}", other),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_preference_source() {
        let result = CoreConfig::builder()
            .engine_factory(Arc::new(MockFactory::new()))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, message }) => {
                assert_eq!(capability, "PreferenceSource");
                assert!(message.contains("desktop-shims"));
            }
            other => panic!("expected CapabilityMissing, got {:?}", other),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_default_preference_source() {
        let config = CoreConfig::builder()
            .engine_factory(Arc::new(MockFactory::new()))
            .build()
            .unwrap();

        assert_eq!(
            config.preference_source.current(),
            PlaybackPreferences::default()
        );
    }

    #[test]
    fn test_emit_events_requires_bus() {
        let result = CoreConfig::builder()
            .engine_factory(Arc::new(MockFactory::new()))
            .preference_source(Arc::new(FixedPreferences::new()))
            .emit_events(true)
            .build();

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_active_event_bus() {
        let bus = EventBus::new(8);

        let silent = CoreConfig::builder()
            .engine_factory(Arc::new(MockFactory::new()))
            .preference_source(Arc::new(FixedPreferences::new()))
            .event_bus(bus.clone())
            .build()
            .unwrap();
        assert!(silent.active_event_bus().is_none());

        let loud = CoreConfig::builder()
            .engine_factory(Arc::new(MockFactory::new()))
            .preference_source(Arc::new(FixedPreferences::new()))
            .event_bus(bus)
            .emit_events(true)
            .build()
            .unwrap();
        assert!(loud.active_event_bus().is_some());
        assert!(format!("{:?}", loud).contains("emit_events: true"));
    }
}
