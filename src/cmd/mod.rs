//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module          | Commands handled                                   |
//! |-----------------|-----------------------------------------------------|
//! | `auth`          | `Login`, `Logout`, `Register`, `Whoami`            |
//! | `board`         | `Board`                                            |
//! | `category`      | `Category`                                         |
//! | `ticket`        | `Ticket`                                           |
//! | `label`         | `Label`                                            |

pub mod auth;
pub mod board;
pub mod category;
pub mod label;
pub mod ticket;

pub use auth::{cmd_login, cmd_logout, cmd_register, cmd_whoami};
pub use board::cmd_board;
pub use category::cmd_category;
pub use label::cmd_label;
pub use ticket::cmd_ticket;

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use cardwall::auth as session;
use cardwall::client::ApiClient;
use cardwall::config::Config;
use cardwall::kv::{self, FileKv, KvStore};
use cardwall::query::Queries;
use cardwall::store::Store;

/// Shared wiring for every command: config, HTTP client, cache, and the
/// on-disk key-value state.
pub struct CmdContext {
    pub config: Config,
    pub client: Arc<ApiClient>,
    pub store: Store,
    pub queries: Queries,
    pub kv: Arc<dyn KvStore>,
}

impl CmdContext {
    pub fn init(config: Config) -> Result<Self> {
        let kv: Arc<dyn KvStore> = Arc::new(FileKv::open(config.state_file())?);
        let client = Arc::new(ApiClient::new(config.base_url.clone(), config.request_timeout)?);
        if session::restore_session(&client, kv.as_ref()) {
            debug!("restored saved session token");
        }
        // Drop edit drafts left behind by interrupted runs.
        kv::clear_drafts(kv.as_ref())?;

        let store = Store::new();
        let queries = Queries::new(store.clone(), Arc::clone(&client));
        Ok(Self {
            config,
            client,
            store,
            queries,
            kv,
        })
    }

    pub fn require_session(&self) -> Result<()> {
        if self.client.token().is_none() {
            anyhow::bail!("Not logged in. Run 'cardwall login' first.");
        }
        Ok(())
    }
}

/// Width to render into, with a fallback for non-tty output.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(width, _)| width.0 as usize)
        .unwrap_or(100)
}
