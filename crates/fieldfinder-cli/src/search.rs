//! `search` and `search-area` command handlers, plus the result printing
//! shared with `regions search`.

use std::time::Duration;

use clap::Args;
use fieldfinder_api::ApiClient;
use fieldfinder_core::{AppConfig, Coordinate, ProximitySpec, SearchFilters, SearchType};
use fieldfinder_engine::{MemorySurface, SearchOutcome, SearchResults, SearchSession};

use crate::alerts::alert_manager;
use crate::regions::region_store;

pub(crate) type CliSession = SearchSession<MemorySurface, ApiClient>;

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Listings to search: vacancies, availability or both
    #[arg(long = "type", default_value = "both")]
    pub search_type: SearchType,
    /// Only listings in this league
    #[arg(long, default_value = "")]
    pub league: String,
    /// Only listings for this age group (e.g. U12)
    #[arg(long, default_value = "")]
    pub age_group: String,
}

impl FilterArgs {
    pub fn to_filters(&self) -> SearchFilters {
        SearchFilters {
            search_type: self.search_type,
            league: self.league.trim().to_string(),
            age_group: self.age_group.trim().to_string(),
        }
    }
}

#[derive(Debug, Args)]
pub struct ContactArgs {
    /// Message the owner of every result with this subject
    #[arg(long, requires = "body")]
    pub subject: Option<String>,
    /// Message body sent with --subject
    #[arg(long, requires = "subject")]
    pub body: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProximityArgs {
    /// Centre point as "lat,lng"
    #[arg(long, allow_hyphen_values = true)]
    pub center: Coordinate,
    /// Radius in kilometres [default: FIELDFINDER_DEFAULT_RADIUS_KM]
    #[arg(long)]
    pub radius_km: Option<f64>,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Create an alert for this centre, radius and filters
    #[arg(long)]
    pub alert: bool,
    #[command(flatten)]
    pub contact: ContactArgs,
}

#[derive(Debug, Args)]
pub struct AreaArgs {
    /// Area vertex as "lat,lng"; repeat once per vertex, in order
    #[arg(long = "vertex", required = true, allow_hyphen_values = true)]
    pub vertices: Vec<Coordinate>,
    /// Save the area as a region with this name
    #[arg(long)]
    pub save: Option<String>,
    /// Create a region alert for the area, named after --save if given
    #[arg(long)]
    pub alert: bool,
    #[command(flatten)]
    pub filters: FilterArgs,
    #[command(flatten)]
    pub contact: ContactArgs,
}

/// Build a headless session around `center`.
pub(crate) fn new_session(
    config: &AppConfig,
    client: ApiClient,
    center: Coordinate,
    radius_km: f64,
    filters: SearchFilters,
) -> anyhow::Result<CliSession> {
    let start = ProximitySpec::new(center, radius_km)?;
    Ok(SearchSession::new(MemorySurface::new(), client, start)
        .with_filters(filters)
        .with_contact_concurrency(config.bulk_contact_concurrency)
        .with_geolocation_timeout(Duration::from_secs(config.geolocation_timeout_secs)))
}

/// Proximity search around `--center`.
///
/// # Errors
///
/// Returns an error for an invalid radius, an unusable API base URL, or a
/// failed alert creation. Feed failures are reported as notices instead.
pub(crate) async fn run_search(config: &AppConfig, args: &ProximityArgs) -> anyhow::Result<()> {
    let client = ApiClient::from_config(config)?;
    let radius_km = args.radius_km.unwrap_or(config.default_radius_km);
    let mut session = new_session(
        config,
        client.clone(),
        args.center,
        radius_km,
        args.filters.to_filters(),
    )?;

    println!(
        "searching within {radius_km} km of {}",
        session.proximity().center
    );
    let outcome = session.refresh().await;
    print_outcome(&outcome);
    print_notices(&mut session);

    if args.alert {
        let manager = alert_manager(config, client.clone());
        let alert = session.alert_for_proximity(&manager).await?;
        println!("created proximity alert {}", alert.id);
    }

    contact_results(&mut session, &client, &args.contact).await;
    Ok(())
}

/// Containment search inside the polygon traced by `--vertex` points. The
/// vertices are replayed as map clicks, exactly as if drawn by hand.
///
/// # Errors
///
/// Returns an error if fewer than three distinct vertices were given, or if
/// saving the region or creating the alert fails.
pub(crate) async fn run_search_area(config: &AppConfig, args: &AreaArgs) -> anyhow::Result<()> {
    let Some(&first) = args.vertices.first() else {
        anyhow::bail!("at least one --vertex is required");
    };
    let client = ApiClient::from_config(config)?;
    let mut session = new_session(
        config,
        client.clone(),
        first,
        config.default_radius_km,
        args.filters.to_filters(),
    )?;

    session.start_drawing().await;
    for &vertex in &args.vertices {
        session.surface().click(vertex);
    }
    let Some(outcome) = session.commit_drawing().await else {
        anyhow::bail!(
            "an area needs at least 3 distinct vertices, got {}",
            args.vertices.len()
        );
    };
    print_outcome(&outcome);
    print_notices(&mut session);

    if let Some(name) = args.save.as_deref() {
        let mut store = region_store(config);
        let region = session.save_region(&mut store, name)?;
        println!("saved region \"{}\" ({})", region.name, region.id);
        print_notices(&mut session);
    }

    if args.alert {
        let manager = alert_manager(config, client.clone());
        let name = args.save.as_deref().unwrap_or("Drawn area");
        let alert = session.alert_for_region(&manager, name).await?;
        println!("created region alert {}", alert.id);
    }

    contact_results(&mut session, &client, &args.contact).await;
    Ok(())
}

/// Select every result and message its owner when `--subject` and `--body`
/// were given.
pub(crate) async fn contact_results(
    session: &mut CliSession,
    client: &ApiClient,
    contact: &ContactArgs,
) {
    let (Some(subject), Some(body)) = (contact.subject.as_deref(), contact.body.as_deref()) else {
        return;
    };
    session.select_all();
    if session.selection().is_empty() {
        println!("no results to contact");
        return;
    }
    let report = session.contact_selected(client, subject, body).await;
    for failure in &report.failures {
        println!("  not sent to {}: {}", failure.key, failure.reason);
    }
    print_notices(session);
}

pub(crate) fn print_outcome(outcome: &SearchOutcome) {
    match outcome {
        SearchOutcome::Applied(results) => print_results(results),
        SearchOutcome::Superseded { ticket } => {
            tracing::debug!(ticket, "search superseded before it completed");
        }
    }
}

fn print_results(results: &SearchResults) {
    if results.items.is_empty() {
        println!("no matching listings");
        return;
    }

    let header = format!(
        "{:<14}{:<14}{:>8}  {:<18}{:<10}TITLE",
        "ID", "TYPE", "KM", "LEAGUE", "AGE"
    );
    println!("{header}");
    for item in &results.items {
        let km = item
            .distance_km
            .map_or_else(|| "-".to_string(), |d| format!("{d:.2}"));
        let candidate = &item.candidate;
        println!(
            "{:<14}{:<14}{:>8}  {:<18}{:<10}{}",
            truncate(&candidate.id, 13),
            item.source_type,
            km,
            truncate(candidate.league.as_deref().unwrap_or("-"), 17),
            truncate(candidate.age_group.as_deref().unwrap_or("-"), 9),
            truncate(&candidate.title, 50)
        );
    }
    println!("{} result(s)", results.items.len());
}

pub(crate) fn print_notices(session: &mut CliSession) {
    for notice in session.take_notices() {
        eprintln!("{notice}");
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max.saturating_sub(3)).collect::<String>())
    } else {
        text.to_string()
    }
}
