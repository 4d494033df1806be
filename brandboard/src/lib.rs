//! Guided generation of a brand marketingboard.
//!
//! The crate is organized around a synchronous wizard state machine
//! ([`wizard::WizardController`]) driven by an async session
//! ([`wizard::WizardSession`]) that performs generation calls, parses the
//! model's answers and attaches image adjuncts along the way.

pub mod config; // Environment configuration
pub mod error; // Error taxonomy and Result alias
pub mod generation; // Generation client boundary, prompts, HTTP client
pub mod images; // Image adjuncts
pub mod parser; // Fenced-JSON and labeled-line response parsing
pub mod storage; // Identity and project persistence
pub mod wizard; // State machine, approval protocol, session
