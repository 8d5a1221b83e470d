//! Server Configuration

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub bind: String,

    /// Port number
    pub port: u16,

    /// Model name reported by the info endpoint
    pub model_name: String,

    /// Default neighbor count for the similar endpoint
    pub default_similar_count: usize,

    /// Finish loading before accepting traffic instead of serving
    /// unavailable responses while loading in the background
    pub preload: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            model_name: "glove-wiki-gigaword-300".to_string(),
            default_similar_count: 10,
            preload: false,
        }
    }
}

impl Config {
    /// Create a new config with custom port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Create a new config with custom bind address
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    /// Set the reported model name
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    /// Load synchronously before serving
    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }
}
