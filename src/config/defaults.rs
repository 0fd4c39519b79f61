//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Server
// ============================================================================

/// Default HTTP bind address.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:5000";

/// Maximum accepted CSV upload size (bytes). 16 MiB.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Per-request timeout for the HTTP layer (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Store
// ============================================================================

/// Default record store location (on-disk sled database).
pub const DEFAULT_STORE_URI: &str = "./data/recore.db";

/// URI that selects the in-process store.
pub const MEMORY_STORE_URI: &str = "memory://";

/// Upper bound on a single store call from an async handler (ms).
pub const STORE_TIMEOUT_MS: u64 = 2_000;

// ============================================================================
// Model
// ============================================================================

/// Directory holding `scaler.json`, `kmeans_model.json` and `label_mapping.json`.
pub const DEFAULT_MODEL_DIR: &str = "backend/models";

// ============================================================================
// Maintenance Rules
// ============================================================================

/// Thermal score above which cooling maintenance is recommended.
pub const HOT_THERMAL_SCORE: f64 = 18.0;

/// Average board power (W) above which a power cap is recommended.
pub const HIGH_AVG_POWER_WATTS: f64 = 180.0;

/// SM utilization (%) above which an overclocked unit should be reined in.
pub const HIGH_SM_PCT: f64 = 70.0;

// ============================================================================
// Life Score Bands
// ============================================================================

/// Life score strictly above which a device stays in service.
pub const CONTINUE_USE_LIFE_SCORE: f64 = 70.0;

/// Life score strictly above which partial recycling is suggested.
pub const PARTIAL_RECYCLE_LIFE_SCORE: f64 = 40.0;

/// Life score strictly below which a unit counts as high risk.
pub const HIGH_RISK_LIFE_SCORE: f64 = 30.0;

// ============================================================================
// Anomaly Detection
// ============================================================================

/// Expected outlier fraction of a cohort.
pub const ANOMALY_CONTAMINATION: f64 = 0.1;

pub const ANOMALY_SEED: u64 = 42;

pub const ANOMALY_N_TREES: usize = 100;

/// Per-tree subsample cap. `min(256, N)` points per tree.
pub const ANOMALY_MAX_SAMPLES: usize = 256;

/// Smallest cohort the forest is fit on; smaller cohorts are all Normal.
pub const ANOMALY_MIN_COHORT: usize = 8;

// ============================================================================
// Report Layout
// ============================================================================

/// US letter page size in points.
pub const PAGE_WIDTH_PT: f64 = 612.0;
pub const PAGE_HEIGHT_PT: f64 = 792.0;

/// Distance from the page top to the first line (points).
pub const PAGE_TOP_MARGIN_PT: f64 = 50.0;

/// A new page starts once the cursor drops below this y (points).
pub const PAGE_BOTTOM_MARGIN_PT: f64 = 100.0;

/// Left text column x (points).
pub const REPORT_LEFT_X: f64 = 50.0;

/// Right column x on comparison reports (points).
pub const REPORT_RIGHT_X: f64 = 300.0;

/// Line step for list sections (points).
pub const REPORT_LINE_STEP_PT: f64 = 14.0;

/// Row step for comparison tables (points).
pub const REPORT_ROW_STEP_PT: f64 = 20.0;
