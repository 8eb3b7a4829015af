// Query VirtualMachine.Version and IDSizes on a live JVM
//
// Start the target with
//   -agentlib:jdwp=transport=dt_socket,server=y,suspend=n,address=5005

use jdwp_rpc::{JdwpConnection, Record};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("jdwp_rpc=debug")
        .init();

    println!("Connecting to JDWP at localhost:5005...");
    let conn = JdwpConnection::connect("localhost", 5005).await?;
    println!("✓ Connected\n");

    let vm = conn.virtual_machine()?;

    println!("Fetching VM version...");
    let version = vm.version(&Record::new()).await?.into_result()?;
    println!("✓ Version received:");
    println!("  Description: {}", version.string("description").unwrap_or_default());
    println!(
        "  JDWP: {}.{}",
        version.int("jdwpMajor").unwrap_or_default(),
        version.int("jdwpMinor").unwrap_or_default()
    );
    println!("  VM Version: {}", version.string("vmVersion").unwrap_or_default());
    println!("  VM Name: {}", version.string("vmName").unwrap_or_default());
    println!();

    println!("Fetching ID sizes...");
    let id_sizes = vm.id_sizes(&Record::new()).await?.into_result()?;
    println!("✓ ID sizes received:");
    for (name, size) in id_sizes.iter() {
        println!("  {}: {} bytes", name, serde_json::to_string(size)?);
    }

    conn.disconnect().await;
    Ok(())
}
