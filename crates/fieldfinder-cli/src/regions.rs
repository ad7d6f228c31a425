//! Saved-region command handlers.

use clap::Subcommand;
use fieldfinder_api::ApiClient;
use fieldfinder_core::AppConfig;
use fieldfinder_engine::{FileStore, RegionStore};

use crate::search::{
    contact_results, new_session, print_notices, print_outcome, ContactArgs, FilterArgs,
};

/// Sub-commands available under `regions`.
#[derive(Debug, Subcommand)]
pub enum RegionsCommands {
    /// List saved regions
    List,
    /// Print the vertices of a saved region
    Show {
        /// Region id
        id: String,
    },
    /// Search inside a saved region
    Search {
        /// Region id
        id: String,
        #[command(flatten)]
        filters: FilterArgs,
        #[command(flatten)]
        contact: ContactArgs,
    },
    /// Show or hide a region on the map
    Visibility {
        /// Region id
        id: String,
        #[arg(long, action = clap::ArgAction::Set)]
        visible: bool,
    },
    /// Delete a saved region
    Delete {
        /// Region id
        id: String,
    },
}

pub(crate) fn region_store(config: &AppConfig) -> RegionStore<FileStore> {
    RegionStore::new(FileStore::new(config.data_dir.clone()))
}

/// # Errors
///
/// Returns an error for an unknown region id or when the store cannot be
/// written.
pub(crate) async fn run(config: &AppConfig, command: RegionsCommands) -> anyhow::Result<()> {
    let mut store = region_store(config);
    match command {
        RegionsCommands::List => {
            list(&store);
            Ok(())
        }
        RegionsCommands::Show { id } => {
            let polygon = store.load(&id)?;
            for (index, vertex) in polygon.vertices().iter().enumerate() {
                println!("{:>3}  {vertex}", index + 1);
            }
            Ok(())
        }
        RegionsCommands::Search {
            id,
            filters,
            contact,
        } => {
            let polygon = store.load(&id)?;
            let client = ApiClient::from_config(config)?;
            let centre = polygon.vertices()[0];
            let mut session = new_session(
                config,
                client.clone(),
                centre,
                config.default_radius_km,
                filters.to_filters(),
            )?;
            let outcome = session.load_region(&store, &id).await?;
            print_outcome(&outcome);
            print_notices(&mut session);
            contact_results(&mut session, &client, &contact).await;
            Ok(())
        }
        RegionsCommands::Visibility { id, visible } => {
            if !store.set_visible(&id, visible)? {
                anyhow::bail!("no saved region with id {id}");
            }
            println!("region {id} is now {}", if visible { "visible" } else { "hidden" });
            Ok(())
        }
        RegionsCommands::Delete { id } => {
            if !store.delete(&id)? {
                anyhow::bail!("no saved region with id {id}");
            }
            println!("deleted region {id}");
            Ok(())
        }
    }
}

fn list(store: &RegionStore<FileStore>) {
    let listing = store.list_checked();
    if let Some(damage) = listing.damage {
        eprintln!("{}", damage.notice());
    }
    let regions = listing.regions;
    if regions.is_empty() {
        println!("no saved regions; save one with `search-area --save NAME`");
        return;
    }

    let header = format!("{:<38}{:<10}{:<9}{:<12}NAME", "ID", "VERTICES", "VISIBLE", "CREATED");
    println!("{header}");
    for region in &regions {
        println!(
            "{:<38}{:<10}{:<9}{:<12}{}",
            region.id,
            region.coordinates.len(),
            if region.is_visible { "yes" } else { "no" },
            region.created_at.format("%Y-%m-%d"),
            region.name
        );
    }
}
