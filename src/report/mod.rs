pub mod dataset;
pub mod generator;

pub use dataset::{Dataset, Sheet, Workbook};
pub use generator::{findings_dataset, relation_dataset, ReportGenerator};
