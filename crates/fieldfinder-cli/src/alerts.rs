//! Alert subscription command handlers.

use clap::Subcommand;
use fieldfinder_api::ApiClient;
use fieldfinder_core::{AlertSubscription, AlertTarget, AppConfig, Credentials};
use fieldfinder_engine::AlertManager;

/// Sub-commands available under `alerts`.
#[derive(Debug, Subcommand)]
pub enum AlertsCommands {
    /// List your alerts
    List,
    /// Activate or pause an alert
    Toggle {
        /// Alert id
        id: String,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Delete an alert
    Delete {
        /// Alert id
        id: String,
    },
}

/// Alert manager acting as the caller identified by `FIELDFINDER_API_TOKEN`,
/// or anonymously when it is unset.
pub(crate) fn alert_manager(config: &AppConfig, client: ApiClient) -> AlertManager<ApiClient> {
    AlertManager::new(client, config.api_token.as_deref().map(Credentials::bearer))
}

/// # Errors
///
/// Returns an error when no API token is configured or the backend call
/// fails.
pub(crate) async fn run(config: &AppConfig, command: AlertsCommands) -> anyhow::Result<()> {
    let manager = alert_manager(config, ApiClient::from_config(config)?);
    match command {
        AlertsCommands::List => {
            let alerts = manager.list().await?;
            print_alerts(&alerts);
        }
        AlertsCommands::Toggle { id, active } => {
            let alert = manager.toggle(&id, active).await?;
            println!(
                "alert {} is now {}",
                alert.id,
                if alert.is_active { "active" } else { "paused" }
            );
        }
        AlertsCommands::Delete { id } => {
            manager.delete(&id).await?;
            println!("deleted alert {id}");
        }
    }
    Ok(())
}

fn print_alerts(alerts: &[AlertSubscription]) {
    if alerts.is_empty() {
        println!("no alerts; create one with `search --alert` or `search-area --alert`");
        return;
    }

    let header = format!("{:<38}{:<11}{:<8}{:<12}WATCHING", "ID", "TYPE", "ACTIVE", "CREATED");
    println!("{header}");
    for alert in alerts {
        // `list` only returns alerts whose target resolves.
        let watching = match alert.target() {
            Ok(AlertTarget::Proximity(spec)) => {
                format!("{} km around {}", spec.radius_km, spec.center)
            }
            Ok(AlertTarget::Region { name, polygon }) => {
                format!("\"{name}\" ({} vertices)", polygon.len())
            }
            Err(_) => "-".to_string(),
        };
        println!(
            "{:<38}{:<11}{:<8}{:<12}{}",
            alert.id,
            alert.alert_type,
            if alert.is_active { "yes" } else { "no" },
            alert.created_at.format("%Y-%m-%d"),
            watching
        );
    }
}
