use anyhow::Result;

use crate::backend::BackendClient;

use super::helpers::print_json;

pub(crate) async fn cmd_chat(backend: &BackendClient, query: &str, json: bool) -> Result<()> {
    let reply = backend.chat(query).await?;

    if json {
        return print_json(&reply);
    }

    println!("{}", reply.response);
    if !reply.sources.is_empty() {
        println!("\nSources: {}", reply.sources.join(", "));
    }
    Ok(())
}

pub(crate) async fn cmd_health(backend: &BackendClient, json: bool) -> Result<()> {
    let health = backend.health().await?;

    if json {
        return print_json(&health);
    }

    println!(
        "Backend at {} is {} (version {})",
        backend.base_url(),
        health.status,
        health.version
    );
    match health.chatbot_available {
        Some(true) => println!("  Chatbot: available"),
        Some(false) => println!("  Chatbot: not initialized"),
        None => {}
    }
    Ok(())
}
