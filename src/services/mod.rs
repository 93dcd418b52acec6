pub mod conversion;

pub use conversion::{ConversionMode, ConversionReport, ConversionResult, ConversionService};
