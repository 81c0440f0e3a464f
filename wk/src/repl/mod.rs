//! Interactive REPL for WikiChat
//!
//! Line editing and slash commands over a chat [`Session`].

mod session;

pub use session::ReplSession;
use session::print_reply;

use eyre::{Context, Result};
use tracing::info;
use vectorstore::IndexStore;

use crate::config::Config;
use crate::index::WikiIndex;
use crate::session::Session;

/// Run the interactive REPL
///
/// This is the main entry point for `wikichat chat`. A saved index is loaded
/// before `index_request` is applied, so a request replaces a loaded index.
pub async fn run_interactive(
    config: &Config,
    model: Option<String>,
    index_request: Option<String>,
    load_id: Option<String>,
) -> Result<()> {
    config.validate()?;

    let mut session = Session::from_config(config).context("Failed to create chat session")?;
    if let Some(model) = model {
        let reply = session.select_model(&model).await;
        if reply.is_error {
            return Err(eyre::eyre!("{}", reply.content));
        }
    }

    if let Some(id) = load_id {
        info!(%id, "Loading saved index for chat");
        let store = IndexStore::open(&config.index.store_dir)
            .with_context(|| format!("Failed to open index store at {}", config.index.store_dir.display()))?;
        let (_, index) = WikiIndex::load(&store, &id).with_context(|| format!("Failed to load index '{}'", id))?;
        print_reply(&session.load_index(index).await);
    }

    let mut repl = ReplSession::new(session);
    if let Some(request) = index_request {
        repl.index(&request).await;
    }
    repl.run().await
}
