//! Invoiced - the illustrative invoicing service
//!
//! The service the repository's container recipes build and run: a fixed
//! welcome text on a fixed port, for every path and method. There is nothing
//! more to it - the interesting part is the packaging around it.

use anyhow::{Context, Result};
use tiny_http::{Response, Server};

const BIND_ADDR: &str = "0.0.0.0:8080";
const WELCOME: &str = "Welcome to the invoicing service.\n";

fn main() -> Result<()> {
    let server = Server::http(BIND_ADDR)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("failed to bind {}", BIND_ADDR))?;

    println!("invoiced listening on {}", BIND_ADDR);

    for request in server.incoming_requests() {
        // Path and method are deliberately ignored.
        let response = Response::from_string(WELCOME);
        if let Err(e) = request.respond(response) {
            eprintln!("failed to respond: {}", e);
        }
    }

    Ok(())
}
