use crate::cli::commands::EventsArgs;
use crate::cli::load_config;
use crate::errors::GeoError;
use crate::store::build_store;

pub async fn handle_events(args: EventsArgs) -> Result<(), GeoError> {
    let config = load_config(args.config.as_deref(), args.db.as_deref()).await?;
    let store = build_store(&config.store)?;

    if store.get(&args.job_id).await?.is_none() {
        return Err(GeoError::NotFound(format!("job {}", args.job_id)));
    }
    let events = store.events(&args.job_id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    for event in &events {
        let detail = event
            .detail
            .as_ref()
            .map(|d| format!("  {}", d))
            .unwrap_or_default();
        println!(
            "{}  {:<12} {:<9}{}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.step,
            event.status.as_str(),
            detail
        );
    }
    Ok(())
}
