#![allow(clippy::collapsible_if)]

pub mod compiler;
pub mod diagnostics;
pub mod language;
pub mod options;
