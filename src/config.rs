use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CAMERA_URL: &str = "stub://entrance";
const DEFAULT_CAMERA_ID: &str = "cam_entrance_01";
const DEFAULT_TARGET_FPS: u32 = 10;
const DEFAULT_OCR_INTERVAL: u64 = 5;
const DEFAULT_OCR_MIN_CONFIDENCE: f32 = 0.4;
const DEFAULT_PLATE_MIN_LENGTH: usize = 5;
const DEFAULT_DEDUP_TTL_SECS: f64 = 30.0;
const DEFAULT_PUBLISH_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 200;
const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BROKER_ADDR: &str = "127.0.0.1:1883";
const DEFAULT_TOPIC: &str = "anpr/plates";
const DEFAULT_CLIENT_ID: &str = "anprd";

#[derive(Debug, Deserialize, Default)]
struct PipelineConfigFile {
    camera: Option<CameraConfigFile>,
    ocr: Option<OcrConfigFile>,
    plate: Option<PlateConfigFile>,
    dedup: Option<DedupConfigFile>,
    publish: Option<PublishConfigFile>,
    debug_show: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    url: Option<String>,
    camera_id: Option<String>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct OcrConfigFile {
    interval: Option<u64>,
    min_confidence: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct PlateConfigFile {
    min_length: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct DedupConfigFile {
    ttl_seconds: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct PublishConfigFile {
    attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    delivery_timeout_seconds: Option<u64>,
    broker_addr: Option<String>,
    topic: Option<String>,
    client_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub camera: CameraSettings,
    pub ocr: OcrSettings,
    pub plate_min_length: usize,
    pub dedup_ttl: Duration,
    pub publish: PublishSettings,
    pub debug_show: bool,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub url: String,
    pub camera_id: String,
    /// 0 disables pacing.
    pub target_fps: u32,
}

#[derive(Debug, Clone)]
pub struct OcrSettings {
    /// OCR runs on every Nth frame.
    pub interval: u64,
    pub min_confidence: f32,
}

#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub attempts: u32,
    pub base_delay: Duration,
    pub delivery_timeout: Duration,
    pub broker_addr: String,
    pub topic: String,
    pub client_id: String,
}

impl PipelineConfig {
    /// Loads configuration from the file named by `ANPR_CONFIG` (if set),
    /// applies environment overrides, and validates.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ANPR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads from an explicit path, then env overrides and validation.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(read_config_file(path)?)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PipelineConfigFile) -> Result<Self> {
        let camera = CameraSettings {
            url: file
                .camera
                .as_ref()
                .and_then(|c| c.url.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_URL.to_string()),
            camera_id: file
                .camera
                .as_ref()
                .and_then(|c| c.camera_id.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_ID.to_string()),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|c| c.target_fps)
                .unwrap_or(DEFAULT_TARGET_FPS),
        };
        let ocr = OcrSettings {
            interval: file
                .ocr
                .as_ref()
                .and_then(|o| o.interval)
                .unwrap_or(DEFAULT_OCR_INTERVAL),
            min_confidence: file
                .ocr
                .as_ref()
                .and_then(|o| o.min_confidence)
                .unwrap_or(DEFAULT_OCR_MIN_CONFIDENCE),
        };
        let plate_min_length = file
            .plate
            .and_then(|p| p.min_length)
            .unwrap_or(DEFAULT_PLATE_MIN_LENGTH);
        let dedup_ttl = ttl_duration(
            file.dedup
                .and_then(|d| d.ttl_seconds)
                .unwrap_or(DEFAULT_DEDUP_TTL_SECS),
        )?;
        let publish = PublishSettings {
            attempts: file
                .publish
                .as_ref()
                .and_then(|p| p.attempts)
                .unwrap_or(DEFAULT_PUBLISH_ATTEMPTS),
            base_delay: Duration::from_millis(
                file.publish
                    .as_ref()
                    .and_then(|p| p.base_delay_ms)
                    .unwrap_or(DEFAULT_BASE_DELAY_MS),
            ),
            delivery_timeout: Duration::from_secs(
                file.publish
                    .as_ref()
                    .and_then(|p| p.delivery_timeout_seconds)
                    .unwrap_or(DEFAULT_DELIVERY_TIMEOUT_SECS),
            ),
            broker_addr: file
                .publish
                .as_ref()
                .and_then(|p| p.broker_addr.clone())
                .unwrap_or_else(|| DEFAULT_BROKER_ADDR.to_string()),
            topic: file
                .publish
                .as_ref()
                .and_then(|p| p.topic.clone())
                .unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            client_id: file
                .publish
                .and_then(|p| p.client_id)
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
        };

        Ok(Self {
            camera,
            ocr,
            plate_min_length,
            dedup_ttl,
            publish,
            debug_show: file.debug_show.unwrap_or(false),
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("ANPR_CAMERA_URL") {
            if !url.trim().is_empty() {
                self.camera.url = url;
            }
        }
        if let Ok(camera_id) = std::env::var("ANPR_CAMERA_ID") {
            if !camera_id.trim().is_empty() {
                self.camera.camera_id = camera_id;
            }
        }
        if let Ok(addr) = std::env::var("ANPR_BROKER_ADDR") {
            if !addr.trim().is_empty() {
                self.publish.broker_addr = addr;
            }
        }
        if let Ok(topic) = std::env::var("ANPR_TOPIC") {
            if !topic.trim().is_empty() {
                self.publish.topic = topic;
            }
        }
        if let Ok(interval) = std::env::var("ANPR_OCR_INTERVAL") {
            let interval: u64 = interval
                .parse()
                .map_err(|_| anyhow!("ANPR_OCR_INTERVAL must be an integer frame count"))?;
            self.ocr.interval = interval;
        }
        if let Ok(ttl) = std::env::var("ANPR_DEDUP_TTL_SECS") {
            let seconds: f64 = ttl
                .parse()
                .map_err(|_| anyhow!("ANPR_DEDUP_TTL_SECS must be a number of seconds"))?;
            self.dedup_ttl = ttl_duration(seconds)?;
        }
        if let Ok(debug) = std::env::var("ANPR_DEBUG_SHOW") {
            self.debug_show = matches!(debug.trim(), "1" | "true" | "TRUE" | "yes");
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.camera.camera_id.trim().is_empty() {
            return Err(anyhow!("camera_id must not be empty"));
        }
        if self.ocr.interval == 0 {
            return Err(anyhow!("ocr interval must be at least 1"));
        }
        if self.dedup_ttl.is_zero() {
            return Err(anyhow!("dedup ttl must be greater than zero"));
        }
        if self.publish.attempts == 0 {
            return Err(anyhow!("publish attempts must be at least 1"));
        }
        if self.plate_min_length == 0 {
            return Err(anyhow!("plate min_length must be at least 1"));
        }
        Ok(())
    }

    /// Target time budget per frame cycle; `None` disables pacing.
    pub fn target_frame_interval(&self) -> Option<Duration> {
        if self.camera.target_fps == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / self.camera.target_fps as f64))
        }
    }
}

/// Guards the float-to-`Duration` conversion: `Duration::from_secs_f64`
/// panics on negative or non-finite input, so bad values must be rejected
/// here, before conversion.
fn ttl_duration(seconds: f64) -> Result<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(anyhow!(
            "dedup ttl must be a positive number of seconds (got {})",
            seconds
        ));
    }
    Ok(Duration::from_secs_f64(seconds))
}

fn read_config_file(path: &Path) -> Result<PipelineConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = PipelineConfig::from_file(PipelineConfigFile::default()).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.camera.camera_id, "cam_entrance_01");
        assert_eq!(cfg.ocr.interval, 5);
        assert_eq!(cfg.publish.attempts, 3);
        assert_eq!(cfg.publish.base_delay, Duration::from_millis(200));
        assert_eq!(cfg.publish.delivery_timeout, Duration::from_secs(10));
        assert!(!cfg.debug_show);
        assert_eq!(
            cfg.target_frame_interval(),
            Some(Duration::from_millis(100))
        );
    }

    #[test]
    fn zero_fps_disables_pacing() {
        let mut cfg = PipelineConfig::from_file(PipelineConfigFile::default()).unwrap();
        cfg.camera.target_fps = 0;
        assert_eq!(cfg.target_frame_interval(), None);
    }

    #[test]
    fn non_positive_ttl_is_an_error_not_a_panic() {
        for bad in [-1.0, 0.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let file = PipelineConfigFile {
                dedup: Some(DedupConfigFile {
                    ttl_seconds: Some(bad),
                }),
                ..PipelineConfigFile::default()
            };
            assert!(
                PipelineConfig::from_file(file).is_err(),
                "ttl {} must be rejected",
                bad
            );
        }
    }

    #[test]
    fn validation_rejects_degenerate_values() {
        let base = PipelineConfig::from_file(PipelineConfigFile::default()).unwrap();

        let mut cfg = base.clone();
        cfg.ocr.interval = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.dedup_ttl = Duration::ZERO;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.publish.attempts = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base;
        cfg.camera.camera_id = "  ".into();
        assert!(cfg.validate().is_err());
    }
}
