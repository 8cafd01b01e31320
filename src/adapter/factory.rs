// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Adapter selection and per-platform instance cache

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use super::browser::BrowserAdapter;
use super::harmony::{HarmonyAdapter, OhosHttpModule};
use super::mini_program::{MiniProgramAdapter, MiniProgramBridge};
use super::react_native::ReactNativeAdapter;
use super::HttpAdapter;
use crate::platform::{detect_platform, PlatformInfo, PlatformType};

/// Platform detection hook
pub type PlatformDetector = Arc<dyn Fn() -> PlatformInfo + Send + Sync>;

/// Owns the adapter cache and the host bindings adapters are built from
///
/// Create one per application and share it with every client.
pub struct AdapterContext {
    adapters: DashMap<PlatformType, Arc<dyn HttpAdapter>>,
    detector: PlatformDetector,
    mini_program_bridge: Option<Arc<dyn MiniProgramBridge>>,
    harmony_module: Option<Arc<dyn OhosHttpModule>>,
    reqwest_client: Option<reqwest::Client>,
}

impl AdapterContext {
    pub fn new() -> Self {
        Self {
            adapters: DashMap::new(),
            detector: Arc::new(detect_platform),
            mini_program_bridge: None,
            harmony_module: None,
            reqwest_client: None,
        }
    }

    /// Replace platform detection
    pub fn with_detector(mut self, detector: impl Fn() -> PlatformInfo + Send + Sync + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    /// Pin the platform instead of detecting it
    pub fn with_platform(self, platform: PlatformType) -> Self {
        self.with_detector(move || PlatformInfo::new(platform))
    }

    /// Host API used by mini-program adapters
    pub fn with_mini_program_bridge(mut self, bridge: Arc<dyn MiniProgramBridge>) -> Self {
        self.mini_program_bridge = Some(bridge);
        self
    }

    /// Native module used by the HarmonyOS adapter
    pub fn with_harmony_module(mut self, module: Arc<dyn OhosHttpModule>) -> Self {
        self.harmony_module = Some(module);
        self
    }

    /// reqwest client for the browser and React-Native adapters
    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.reqwest_client = Some(client);
        self
    }

    pub fn current_platform(&self) -> PlatformInfo {
        (self.detector)()
    }

    /// Build a fresh adapter for `platform`
    pub fn create_adapter_for_platform(&self, platform: PlatformType) -> Arc<dyn HttpAdapter> {
        let client = || self.reqwest_client.clone().unwrap_or_default();

        let adapter: Arc<dyn HttpAdapter> = match platform {
            PlatformType::Weapp
            | PlatformType::Alipay
            | PlatformType::Swan
            | PlatformType::Tt
            | PlatformType::Qq
            | PlatformType::Jd => Arc::new(MiniProgramAdapter::new(self.mini_program_bridge.clone())),
            PlatformType::Rn => Arc::new(ReactNativeAdapter::with_client(client())),
            PlatformType::Harmony => Arc::new(HarmonyAdapter::new(self.harmony_module.clone())),
            PlatformType::H5 | PlatformType::Unknown => Arc::new(BrowserAdapter::with_client(client())),
        };

        debug!(%platform, adapter = adapter.name(), "Created adapter");
        adapter
    }

    /// Adapter for the detected platform
    ///
    /// With `use_cache` the same instance is returned until
    /// [`clear_adapter_cache`](Self::clear_adapter_cache).
    pub fn create_adapter(&self, use_cache: bool) -> Arc<dyn HttpAdapter> {
        let platform = self.current_platform().platform_type;
        if !use_cache {
            return self.create_adapter_for_platform(platform);
        }

        self.adapters
            .entry(platform)
            .or_insert_with(|| {
                info!(%platform, "Caching adapter");
                self.create_adapter_for_platform(platform)
            })
            .clone()
    }

    /// Drop every cached adapter
    pub fn clear_adapter_cache(&self) {
        self.adapters.clear();
    }

    pub fn cached_adapters(&self) -> usize {
        self.adapters.len()
    }

    /// Name of the adapter serving the detected platform
    pub fn adapter_type_name(&self) -> &'static str {
        adapter_name_for(self.current_platform().platform_type)
    }
}

fn adapter_name_for(platform: PlatformType) -> &'static str {
    match platform {
        PlatformType::Weapp
        | PlatformType::Alipay
        | PlatformType::Swan
        | PlatformType::Tt
        | PlatformType::Qq
        | PlatformType::Jd => "mini-program",
        PlatformType::Rn => "react-native",
        PlatformType::Harmony => "harmony",
        PlatformType::H5 | PlatformType::Unknown => "browser",
    }
}

impl Default for AdapterContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AdapterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterContext")
            .field("cached", &self.adapters.len())
            .field("mini_program_bridge", &self.mini_program_bridge.is_some())
            .field("harmony_module", &self.harmony_module.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_selection_per_platform() {
        let ctx = AdapterContext::new();
        for platform in PlatformType::ALL {
            let adapter = ctx.create_adapter_for_platform(platform);
            assert_eq!(adapter.name(), adapter_name_for(platform), "{}", platform);
        }
    }

    #[test]
    fn test_cached_instance_is_shared() {
        let ctx = AdapterContext::new().with_platform(PlatformType::Weapp);

        let first = ctx.create_adapter(true);
        let second = ctx.create_adapter(true);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(ctx.cached_adapters(), 1);

        let uncached = ctx.create_adapter(false);
        assert!(!Arc::ptr_eq(&first, &uncached));

        ctx.clear_adapter_cache();
        assert_eq!(ctx.cached_adapters(), 0);
        let third = ctx.create_adapter(true);
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_detector_consulted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let ctx = AdapterContext::new().with_detector(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            PlatformInfo::new(PlatformType::Harmony)
        });

        assert_eq!(ctx.adapter_type_name(), "harmony");
        assert_eq!(ctx.create_adapter(true).name(), "harmony");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_falls_back_to_browser() {
        let ctx = AdapterContext::new().with_platform(PlatformType::Unknown);
        let adapter = ctx.create_adapter(true);
        assert_eq!(adapter.name(), "browser");
        assert!(crate::adapter::supports_upload(adapter.as_ref()));
    }
}
