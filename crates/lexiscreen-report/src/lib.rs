//! lexiscreen-report: printable renderings of an assessment report.

pub mod html;
