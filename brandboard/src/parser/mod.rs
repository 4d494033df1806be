//! Extraction of structured data from raw model text.
//!
//! Two strategies, selected by what the generation step requested:
//! fenced-JSON blocks ([`fenced`]) and line-oriented `Label: value` text
//! ([`company_info`]). Upstream format drift is the dominant failure mode,
//! so both degrade to typed errors instead of panicking.

pub mod company_info;
pub mod fenced;

pub use company_info::{parse_company_info, CompanyInfo};
pub use fenced::{extract_json, parse_fenced, strip_thinking_lines, THINKING_MARKER};
