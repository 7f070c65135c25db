use molframe::engine::sampler::client::DEFAULT_ENDPOINT;

pub struct DefaultsConfig {
    pub frames: u64,
    pub endpoint: String,
    pub sampling_enabled: bool,
    pub real_time: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            sampling_enabled: true,
            real_time: false,
        }
    }
}
