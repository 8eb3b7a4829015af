// Set a breakpoint and wait for it to be hit
//
// Usage: breakpoint [class-signature] [method] [line]
// Defaults to HelloController.hello() line 64 of the probe demo.

use anyhow::Context;
use jdwp_rpc::commands::event_kinds;
use jdwp_rpc::{record, JdwpConnection, SuspendPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("jdwp_rpc=debug")
        .init();

    let mut args = std::env::args().skip(1);
    let signature = args
        .next()
        .unwrap_or_else(|| "Lcom/example/probedemo/HelloController;".to_string());
    let method_name = args.next().unwrap_or_else(|| "hello".to_string());
    let line: i64 = args.next().map(|l| l.parse()).transpose()?.unwrap_or(64);

    let conn = JdwpConnection::connect("localhost", 5005).await?;
    println!("✓ Connected to JVM\n");

    let classes = conn
        .virtual_machine()?
        .classes_by_signature(&record! { "signature" => signature.as_str() })
        .await?
        .into_result()?;
    let class = classes
        .list("classes")
        .and_then(|c| c.first())
        .and_then(|c| c.as_record())
        .context("class not loaded")?;
    let type_id = class.id("typeID").context("class without typeID")?;
    println!("✓ Found {} (type_id: {:x})", signature, type_id);

    let methods = conn
        .reference_type()?
        .methods(&record! { "refType" => type_id })
        .await?
        .into_result()?;
    let method_id = methods
        .list("declared")
        .unwrap_or_default()
        .iter()
        .filter_map(|m| m.as_record())
        .find(|m| m.string("name") == Some(method_name.as_str()))
        .and_then(|m| m.id("methodID"))
        .context("method not found")?;
    println!("✓ Found {}() (method_id: {:x})", method_name, method_id);

    let line_table = conn
        .method()?
        .line_table(&record! { "refType" => type_id, "methodID" => method_id })
        .await?
        .into_result()?;
    let index = line_table
        .list("lines")
        .unwrap_or_default()
        .iter()
        .filter_map(|e| e.as_record())
        .find(|e| e.int("lineNumber") == Some(line))
        .and_then(|e| e.int("lineCodeIndex"))
        .context("line not in method")?;
    println!("✓ Line {} → bytecode index: {}", line, index);

    let events = conn.event_request()?;
    let request_id = events
        .set_breakpoint(type_id, method_id, index as u64, SuspendPolicy::All)
        .await?;
    println!("✅ Breakpoint set! Request ID: {}", request_id);
    println!("\n   Waiting for a hit (Ctrl+C to stop)...");

    tokio::select! {
        hit = conn.await_event(
            |e| e.event_kind == event_kinds::BREAKPOINT && e.request_id == request_id,
            None,
        ) => {
            let hit = hit?;
            println!("\n📍 Hit: {}", serde_json::to_string_pretty(&hit.fields)?);
            conn.virtual_machine()?.resume(&record! {}).await?.into_result()?;
        }
        _ = tokio::signal::ctrl_c() => {}
    }

    println!("\n🧹 Cleaning up...");
    events.clear_breakpoint(request_id).await?;
    println!("✓ Breakpoint cleared");

    conn.disconnect().await;
    Ok(())
}
