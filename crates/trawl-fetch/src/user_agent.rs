use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicUsize, Ordering};
use trawl_core::{FetchConfig, UaRotation};

/// Built-in browser user agents.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.6533.88 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.6478.127 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.6478.127 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8 Pro) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.6478.122 Mobile Safari/537.36",
];

/// Pool of user agents, one picked per request.
#[derive(Debug)]
pub struct UserAgentPool {
    agents: Vec<String>,
    rotation: UaRotation,
    cursor: AtomicUsize,
}

impl UserAgentPool {
    /// Create a pool. Blank entries are dropped and an empty list falls back
    /// to [`DEFAULT_USER_AGENTS`].
    #[must_use]
    pub fn new(agents: Vec<String>, rotation: UaRotation) -> Self {
        let mut agents: Vec<String> = agents
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if agents.is_empty() {
            agents = DEFAULT_USER_AGENTS.iter().map(|a| (*a).to_string()).collect();
        }
        Self {
            agents,
            rotation,
            cursor: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.user_agents.clone(), config.ua_rotation)
    }

    /// Pick the user agent for the next request.
    #[must_use]
    pub fn next(&self) -> &str {
        match self.rotation {
            UaRotation::Random => {
                let mut rng = rand::thread_rng();
                self.agents
                    .choose(&mut rng)
                    .map_or(DEFAULT_USER_AGENTS[0], String::as_str)
            }
            UaRotation::RoundRobin => {
                let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.agents.len();
                &self.agents[idx]
            }
        }
    }

    #[must_use]
    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self::new(Vec::new(), UaRotation::Random)
    }
}
