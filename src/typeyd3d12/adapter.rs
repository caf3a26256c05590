use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EFeatureLevel {
    Level11_0,
    Level11_1,
    Level12_0,
    Level12_1,
    Level12_2,
}

impl Default for EFeatureLevel {
    fn default() -> Self {
        EFeatureLevel::Level12_0
    }
}

#[derive(Clone, Debug)]
pub struct SAdapterDesc {
    pub description: String,
    pub dedicated_video_memory: usize,
    pub software: bool,
}
