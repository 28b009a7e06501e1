//! realgold-patch - RealGold financial model patcher
//!
//! Loads the RealGold model workbook, applies a fixed sequence of patch
//! phases and saves the result as a new file. After patching, every
//! time-based sheet follows the month timeline on `XAUconfig` and each mine's
//! onboard month is picked from a dropdown, so changing one date moves all of
//! that mine's figures to the new month column.
//!
//! # Features
//!
//! - Unitization fee fix and configurable mine onboard dates
//! - 60-month timeline with a compounding gold price row
//! - Dropdown date selection with MATCH-derived month offsets
//! - COUNTIF/SUMIF/SUMPRODUCT redistribution, dollar, cumulative and annual rows
//! - Model Health dashboard with live checks
//! - Retime, reschedule, `#REF!` audit and verification suites
//!
//! # Example
//!
//! ```no_run
//! use realgold_patch::{PatchConfig, Patcher};
//!
//! let mut config = PatchConfig::default();
//! config.input = "model.xlsx".into();
//! config.output = "model_dynamic.xlsx".into();
//!
//! let outcome = Patcher::new(config).run()?;
//! println!("Phases: {}", outcome.reports.len());
//! # Ok::<(), realgold_patch::PatchError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod excel;
pub mod formulas;
pub mod patcher;
pub mod phases;
pub mod timeline;
pub mod types;
pub mod verify;

// Re-export commonly used types
pub use config::PatchConfig;
pub use error::{PatchError, PatchResult};
pub use patcher::{PatchOutcome, Patcher};
pub use timeline::Timeline;
pub use types::{CellValue, Sheet, Workbook};
