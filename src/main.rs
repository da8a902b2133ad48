use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use csv_batch_translator::{
    HttpTranslationBackend, PipelineRunner, PipelineSettings, RetryPolicy, RunConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("csv_batch_translator=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 6 {
        eprintln!(
            "usage: {} <input.tsv> <output.tsv> <checkpoint_dir> <target_lang> \
             <translate_cols,comma,separated> [keep_cols,comma,separated]",
            args[0]
        );
        std::process::exit(2);
    }

    let input = Path::new(&args[1]);
    let output = Path::new(&args[2]);
    let checkpoint_dir = &args[3];
    let target_lang = &args[4];
    let translate_columns = split_columns(&args[5]);
    let keep_columns = args.get(6).map(|s| split_columns(s)).unwrap_or_default();

    let settings = PipelineSettings::load_or_default(Some("config.toml"));
    tracing::info!(endpoint = %settings.api.endpoint, "loaded pipeline settings");

    let proposed = RunConfig::new(
        target_lang,
        settings.pipeline.max_workers,
        settings.pipeline.per_request,
        translate_columns,
        keep_columns,
    );

    let backend = Arc::new(HttpTranslationBackend::new(
        settings.api.endpoint.clone(),
        settings.api.api_key.clone(),
        Duration::from_secs(settings.api.timeout_seconds),
    )?);

    let base_delay = Duration::from_millis(settings.pipeline.retry_base_delay_ms);
    let retry = match settings.pipeline.retry_max_attempts {
        Some(max) => RetryPolicy::bounded(max, base_delay),
        None => RetryPolicy::unbounded(base_delay),
    };

    let mut runner = PipelineRunner::new(
        checkpoint_dir,
        proposed,
        backend,
        retry,
        Duration::from_secs(settings.pipeline.batch_pause_seconds),
    )?;

    let plan = runner.generate_batches(
        input,
        None,
        b'\t',
        settings.pipeline.batch_size,
        0,
        None,
    )?;
    tracing::info!(
        batches = plan.batch_count(),
        rows = plan.total_rows(),
        ready = runner.ready_batch_count()?,
        "planned run"
    );

    runner.run(&plan, output, None).await?;

    tracing::info!("done");
    Ok(())
}

fn split_columns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
