//! Session and token lifecycle for the Folio storefront client.
//!
//! - [`ApiClient`]: authenticated transport with envelope unwrapping and
//!   credential purge on 401
//! - [`SessionStore`]: signed-in user, credential pair, restoration on startup
//! - [`DownloadTokenCache`]: persisted per-book download tokens
//! - [`Router`] and [`AccessGuard`]: route table and navigation policy
//! - [`CatalogStore`]: catalog listing state

mod api;
mod catalog;
mod download_tokens;
mod error;
mod guard;
mod loading;
mod routes;
mod session;
mod session_fsm;
mod transport;
mod types;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use api::{AuthApi, DownloadApi, EbooksApi, OrdersApi, ReaderApi, TagsApi, UsersApi};
pub use catalog::{CatalogStore, EbookFilters, FilterOverrides};
pub use download_tokens::{is_still_valid, DownloadTokenCache, EXPIRY_BUFFER_SECS};
pub use error::{ApiError, ApiResult, SessionError, SessionResult};
pub use guard::{evaluate, AccessGuard, GuardDecision, Redirect};
pub use loading::{LoadingFlag, LoadingGuard};
pub use routes::{
    path_for, redirect_href, resolve, Navigation, NavigationTarget, Query, RouteDef, RouteMeta,
    RouteName, Router, ROUTES,
};
pub use session::{SessionSnapshot, SessionStore};
pub use session_fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionPhase};
pub use transport::{
    unwrap_envelope, ApiClient, CredentialProvider, HttpRequest, HttpResponse, HttpTransport,
    RequestConfig, ReqwestTransport,
};
pub use types::*;
