// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Runtime platform detection
//!
//! The host build tool exports the target platform in `TARO_ENV`. Without it
//! a wasm build is assumed to run in a browser and anything else is unknown.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HttpError;

/// Environment variable naming the target platform
pub const PLATFORM_ENV_VAR: &str = "TARO_ENV";

/// Runtime platform tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformType {
    /// WeChat mini-program
    Weapp,
    /// Alipay mini-program
    Alipay,
    /// Baidu smart program
    Swan,
    /// ByteDance mini-program
    Tt,
    /// QQ mini-program
    Qq,
    /// JD mini-program
    Jd,
    /// Browser
    H5,
    /// React-Native
    Rn,
    /// HarmonyOS
    Harmony,
    Unknown,
}

impl PlatformType {
    pub const ALL: [PlatformType; 10] = [
        PlatformType::Weapp,
        PlatformType::Alipay,
        PlatformType::Swan,
        PlatformType::Tt,
        PlatformType::Qq,
        PlatformType::Jd,
        PlatformType::H5,
        PlatformType::Rn,
        PlatformType::Harmony,
        PlatformType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformType::Weapp => "weapp",
            PlatformType::Alipay => "alipay",
            PlatformType::Swan => "swan",
            PlatformType::Tt => "tt",
            PlatformType::Qq => "qq",
            PlatformType::Jd => "jd",
            PlatformType::H5 => "h5",
            PlatformType::Rn => "rn",
            PlatformType::Harmony => "harmony",
            PlatformType::Unknown => "unknown",
        }
    }

    pub fn is_mini_program(&self) -> bool {
        matches!(
            self,
            PlatformType::Weapp
                | PlatformType::Alipay
                | PlatformType::Swan
                | PlatformType::Tt
                | PlatformType::Qq
                | PlatformType::Jd
        )
    }
}

impl fmt::Display for PlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformType {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let platform = match s.trim().to_ascii_lowercase().as_str() {
            "weapp" => PlatformType::Weapp,
            "alipay" => PlatformType::Alipay,
            "swan" => PlatformType::Swan,
            "tt" => PlatformType::Tt,
            "qq" => PlatformType::Qq,
            "jd" => PlatformType::Jd,
            "h5" | "web" => PlatformType::H5,
            "rn" => PlatformType::Rn,
            "harmony" | "harmony-hybrid" => PlatformType::Harmony,
            "unknown" => PlatformType::Unknown,
            other => {
                return Err(HttpError::unknown(format!("Unknown platform: {}", other)));
            }
        };
        Ok(platform)
    }
}

/// Detected platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub platform_type: PlatformType,
    pub is_mini_program: bool,
    pub is_h5: bool,
    pub is_rn: bool,
    pub is_harmony: bool,
}

impl PlatformInfo {
    pub fn new(platform_type: PlatformType) -> Self {
        Self {
            platform_type,
            is_mini_program: platform_type.is_mini_program(),
            is_h5: platform_type == PlatformType::H5,
            is_rn: platform_type == PlatformType::Rn,
            is_harmony: platform_type == PlatformType::Harmony,
        }
    }
}

/// Detect the platform from the process environment
pub fn detect_platform() -> PlatformInfo {
    PlatformInfo::new(platform_from_env(std::env::var(PLATFORM_ENV_VAR).ok().as_deref()))
}

fn platform_from_env(value: Option<&str>) -> PlatformType {
    match value.map(str::parse::<PlatformType>) {
        Some(Ok(platform)) => platform,
        Some(Err(_)) => PlatformType::Unknown,
        None if cfg!(target_arch = "wasm32") => PlatformType::H5,
        None => PlatformType::Unknown,
    }
}
