use crate::infra::app_config::AppConfig;
use crate::infra::vcs::github::{GitHubClient, GitHubProvider};
use crate::infra::vcs::local::LocalPatchProvider;
use crate::infra::vcs::traits::DiffProvider;

pub struct ProviderRegistry {
    providers: Vec<Box<dyn DiffProvider>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

impl ProviderRegistry {
    /// GitHub URLs are tried first; anything else is read as a local patch.
    pub fn new(config: &AppConfig) -> Self {
        let client = GitHubClient::new(config.api_base_url.clone(), config.github_token.clone());
        Self {
            providers: vec![
                Box::new(GitHubProvider::new(client)),
                Box::new(LocalPatchProvider::new()),
            ],
        }
    }

    pub fn detect_provider(&self, reference: &str) -> Option<&dyn DiffProvider> {
        self.providers
            .iter()
            .map(|provider| provider.as_ref())
            .find(|provider| provider.matches_ref(reference))
    }

    pub fn get_provider(&self, id: &str) -> Option<&dyn DiffProvider> {
        self.providers
            .iter()
            .map(|provider| provider.as_ref())
            .find(|provider| provider.id() == id)
    }
}
