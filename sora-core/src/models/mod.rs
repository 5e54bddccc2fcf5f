pub mod video;

pub use video::VideoRecord;
