//! Typed endpoint methods, grouped the way the backend groups its paths.
//!
//! Every family object wraps an `ApiClient` plus an optional per-instance
//! `Scope`. Methods are one-line forwards to `ApiClient::execute_scoped`;
//! all behavior lives in the request type's `ApiRequest` binding.

pub mod authentication;
pub mod client;
pub mod cloudscript;
pub mod data;
pub mod multiplayer;
pub mod server;

pub use authentication::AuthenticationApi;
pub use client::ClientApi;
pub use cloudscript::CloudScriptApi;
pub use data::DataApi;
pub use multiplayer::MultiplayerApi;
pub use server::ServerApi;

/// Declare a family object and its shared constructor/override methods.
macro_rules! family {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            client: $crate::client::ApiClient,
            scope: $crate::client::Scope,
        }

        impl $name {
            /// Use the client's process-level settings and credentials.
            pub fn new(client: &$crate::client::ApiClient) -> Self {
                Self {
                    client: client.clone(),
                    scope: $crate::client::Scope::default(),
                }
            }

            /// Replace the process settings for every call made through this
            /// instance.
            pub fn with_settings(mut self, settings: $crate::settings::Settings) -> Self {
                self.scope.settings = Some(settings);
                self
            }

            /// Give this instance its own credential store seeded with
            /// `context`. Logins and token exchanges made through it update
            /// that store, not the process one.
            pub fn with_auth_context(mut self, context: $crate::auth::AuthContext) -> Self {
                self.scope.credentials = Some(::std::sync::Arc::new(
                    $crate::auth::CredentialStore::with_context(context),
                ));
                self
            }

            /// The store calls through this instance read from and fill.
            pub fn credentials(&self) -> &::std::sync::Arc<$crate::auth::CredentialStore> {
                self.scope
                    .credentials
                    .as_ref()
                    .unwrap_or_else(|| self.client.credentials())
            }

            pub fn forget_all_credentials(&self) {
                self.credentials().forget_all_credentials();
            }

            /// Dispatch any request through this instance's scope, optionally
            /// cancellable at the transport boundary.
            pub async fn call<R: $crate::request::ApiRequest>(
                &self,
                request: R,
                cancel: Option<&::tokio_util::sync::CancellationToken>,
            ) -> Result<$crate::result::ApiResult<R::Response>, $crate::error::ConfigError> {
                self.client.execute_scoped(request, &self.scope, cancel).await
            }
        }
    };
}

pub(crate) use family;
