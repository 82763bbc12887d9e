//! Serve command - run the HTTP API

use std::sync::Arc;

use anyhow::Result;

use purse_core::services::EntryPoint;

use super::{get_context, get_logger};
use crate::output;

pub async fn run(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut ctx = get_context()?;
    if let Some(host) = host {
        ctx.config.host = host;
    }
    if let Some(port) = port {
        ctx.config.port = port;
    }
    let addr = ctx.config.bind_address();

    let events = get_logger(EntryPoint::Server).map(Arc::new);
    if let Some(events) = &events {
        ctx = ctx.with_event_log(Arc::clone(events));
    }

    output::info(&format!("Starting Purse API on http://{}", addr));
    purse_server::server::serve(Arc::new(ctx), events, &addr).await
}
