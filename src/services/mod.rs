pub mod pipeline;
pub mod staging;
pub mod storage;
pub mod tiler;
