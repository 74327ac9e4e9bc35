//! Avatar URL generation.

use std::future::Future;

use rand::{distributions::Uniform, Rng};
use roster_config::AvatarConfig;

use crate::types::AvatarResult;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Produces an opaque avatar URL for a user record.
pub trait AvatarGenerator: Send + Sync {
    fn generate(&self) -> impl Future<Output = AvatarResult<String>> + Send;
}

/// Appends a random run of ASCII letters to a base URL.
#[derive(Debug, Clone)]
pub struct RandomAvatarGenerator {
    base_url: String,
    segment_length: usize,
}

impl RandomAvatarGenerator {
    pub fn new(base_url: impl Into<String>, segment_length: usize) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            segment_length,
        }
    }

    pub fn from_config(config: &AvatarConfig) -> Self {
        Self::new(config.base_url.clone(), config.segment_length)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn random_segment(&self) -> String {
        let letters = Uniform::from(0..LETTERS.len());
        rand::thread_rng()
            .sample_iter(letters)
            .take(self.segment_length)
            .map(|idx| LETTERS[idx] as char)
            .collect()
    }
}

impl AvatarGenerator for RandomAvatarGenerator {
    async fn generate(&self) -> AvatarResult<String> {
        Ok(format!("{}/{}", self.base_url, self.random_segment()))
    }
}
