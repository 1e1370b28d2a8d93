//! Named client instances.
//!
//! The registry is an ordinary value owned by the application, shared by
//! handing out `Arc<ClientRegistry>` or a reference. Creation is idempotent
//! per name: a second create for an existing name returns the cached client
//! without fetching the route map again.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::client::{RestApiClient, RestApiClientBuilder};
use crate::config::{ClientOptions, DEFAULT_CLIENT_NAME};
use crate::errors::RestClientResult;

/// Map of client name to client.
#[derive(Default)]
pub struct ClientRegistry {
    instances: RwLock<HashMap<String, Arc<RestApiClient>>>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the client registered under `options.name`, creating it with
    /// the default transport if absent.
    pub async fn create_instance(
        &self,
        options: ClientOptions,
    ) -> RestClientResult<Arc<RestApiClient>> {
        self.create_instance_with(RestApiClientBuilder::from_options(options))
            .await
    }

    /// Returns the client registered under the builder's name, building it
    /// if absent.
    ///
    /// Two concurrent creates for the same name may both build; the first to
    /// register wins and both callers receive that instance.
    pub async fn create_instance_with(
        &self,
        builder: RestApiClientBuilder,
    ) -> RestClientResult<Arc<RestApiClient>> {
        let name = builder.options().name().to_string();
        if let Some(existing) = self.get_instance(&name) {
            tracing::debug!(name = %name, "Reusing registered client");
            return Ok(existing);
        }

        let client = Arc::new(builder.build().await?);
        Ok(self.register_if_absent(client, name))
    }

    /// Registers `client` under `name`, or under its own name, replacing any
    /// existing registration.
    ///
    /// If no client is registered under [`DEFAULT_CLIENT_NAME`] yet, `client`
    /// is registered there as well.
    pub fn set_instance(&self, client: Arc<RestApiClient>, name: Option<&str>) -> Arc<RestApiClient> {
        let name = name.map(str::to_string).unwrap_or_else(|| client.name());

        let mut instances = self.instances.write();
        instances.insert(name, Arc::clone(&client));
        Self::register_default(&mut instances, &client);

        client
    }

    fn register_if_absent(&self, client: Arc<RestApiClient>, name: String) -> Arc<RestApiClient> {
        let mut instances = self.instances.write();
        let registered = Arc::clone(instances.entry(name).or_insert(client));
        Self::register_default(&mut instances, &registered);

        registered
    }

    fn register_default(
        instances: &mut HashMap<String, Arc<RestApiClient>>,
        client: &Arc<RestApiClient>,
    ) {
        if !instances.contains_key(DEFAULT_CLIENT_NAME) {
            tracing::debug!(name = %client.name(), "Default client registered");
            instances.insert(DEFAULT_CLIENT_NAME.to_string(), Arc::clone(client));
        }
    }

    /// Returns the client registered under `name`.
    pub fn get_instance(&self, name: &str) -> Option<Arc<RestApiClient>> {
        self.instances.read().get(name).cloned()
    }

    /// Returns the client registered under [`DEFAULT_CLIENT_NAME`].
    pub fn default_instance(&self) -> Option<Arc<RestApiClient>> {
        self.get_instance(DEFAULT_CLIENT_NAME)
    }

    /// Returns true if a client is registered under `name`.
    pub fn is_initialized(&self, name: &str) -> bool {
        self.instances.read().contains_key(name)
    }

    /// Removes and returns the client registered under `name`.
    ///
    /// Other names the same client is registered under are kept.
    pub fn remove_instance(&self, name: &str) -> Option<Arc<RestApiClient>> {
        self.instances.write().remove(name)
    }

    /// Removes every client.
    pub fn clear(&self) {
        self.instances.write().clear();
    }

    /// Number of registered names, including the default entry.
    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    /// Returns true if no client is registered.
    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.instances.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("ClientRegistry")
            .field("instances", &names)
            .finish()
    }
}
