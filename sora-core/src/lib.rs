pub mod clock;
pub mod config;
pub mod error;
pub mod gallery;
pub mod kv;
pub mod models;
pub mod payload;
pub mod random;
pub mod simulator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{GenerationConfig, SoraConfig};
pub use error::{Rejection, SoraError};
pub use gallery::GalleryStore;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use models::VideoRecord;
pub use payload::{DataUrl, GradientDescriptor};
pub use random::{RandomSource, RngSource, ScriptedRandom};
pub use simulator::{GenerationSimulator, JobPhase};
