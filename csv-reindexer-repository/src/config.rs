//! Per-profile search engine target configuration.

/// Default engine URL when a profile does not configure one.
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:9200";

/// Connection and index-shape defaults for one environment profile
/// (`devel`, `prod`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetProfile {
    /// Profile name as it appears in the object key.
    pub name: String,
    /// Engine endpoint URL.
    pub url: String,
    /// Basic auth username, if the cluster requires it.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Primary shards for newly created indices.
    pub number_of_shards: u32,
    /// Replicas for newly created indices.
    pub number_of_replicas: u32,
}

impl TargetProfile {
    /// Create a profile pointing at `url` with single-shard, zero-replica
    /// index defaults.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            username: None,
            password: None,
            number_of_shards: 1,
            number_of_replicas: 0,
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_shards(mut self, number_of_shards: u32, number_of_replicas: u32) -> Self {
        self.number_of_shards = number_of_shards;
        self.number_of_replicas = number_of_replicas;
        self
    }
}

impl Default for TargetProfile {
    fn default() -> Self {
        Self::new("devel", DEFAULT_ENGINE_URL)
    }
}
