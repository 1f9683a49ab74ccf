pub mod config;
pub mod epi2ana;
pub mod epi2epi;
pub mod map2ana;
pub mod mask;
pub mod tools;

pub use config::{Epi2AnaConfig, Epi2EpiConfig, Map2AnaConfig, SynParameters};
pub use epi2ana::epi2ana;
pub use epi2epi::epi2epi_flirt;
pub use map2ana::map2ana;
