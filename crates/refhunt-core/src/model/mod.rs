/// Data model: asset records, the reverse-dependency index and the
/// analysis snapshot built from them.
pub mod asset;
pub mod result;
pub mod reverse_index;
pub mod size;

pub use asset::{infer_type_from_path, AssetRecord, AssetType};
pub use result::{AnalysisMode, AnalysisResult};
pub use reverse_index::{DanglingEdge, DependencyDepth, ReverseIndex};
