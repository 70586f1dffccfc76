//! Output generation for the report artifact.
//!
//! - [`pdf`]: renders the one-page report PDF, the artifact that gets published
//! - [`markdown`]: the same page as Markdown, for reading in a terminal or diff
//! - [`json`]: writes the structured report content next to them
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── Daily_Investment_Report_2025-08-19.pdf
//! ├── Daily_Investment_Report_2025-08-19.md
//! └── Daily_Investment_Report_2025-08-19.json
//! ```

pub mod json;
pub mod markdown;
pub mod pdf;
