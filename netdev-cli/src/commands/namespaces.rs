//! Namespaces command implementation

use anyhow::{Context, Result};

use netdev_namespace::{NetnsConfig, SystemNamespaceProvider};

pub fn execute(config: NetnsConfig) -> Result<()> {
    let provider = SystemNamespaceProvider::new(config);

    let names = provider
        .list_namespaces()
        .context("Failed to list network namespaces")?;

    println!(
        "\n🔒 Network namespaces in {}",
        provider.config().run_dir.display()
    );
    println!("{:-<60}", "");

    if names.is_empty() {
        println!("No network namespaces found");
    } else {
        for name in &names {
            println!("  {name}");
        }
    }

    Ok(())
}
