use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use tracing::info;
use tracing_subscriber::EnvFilter;

use voxcache::{
    FsArtifactSink, ProviderCredentials, PurgeScope, SpeechSynthesizer, SynthConfig,
    SynthesisOutput, SynthesisRequest, create_store, purge, size, utils::client_from_config,
};

const USAGE: &str = "\
Usage:
  voxcache synth <provider> <language> <voice> <text...> [--credentials <file.json>] [--tenant <id>] [--render] [--no-cache]
  voxcache voices <provider> --credentials <file.json>
  voxcache size [pattern]
  voxcache purge [--tenant <id>]

Options:
  --config <file.yaml>   Load settings from a YAML file (merged with the environment)";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let config_path = take_option(&mut args, "--config")?;
    let config = match config_path {
        Some(path) => SynthConfig::from_file(&PathBuf::from(path)),
        None => SynthConfig::from_env(),
    }
    .map_err(|e| anyhow!(e.to_string()))?;

    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        println!("{USAGE}");
        return Ok(());
    };
    let rest: Vec<String> = args.collect();

    let store = create_store(&config.cache_config())
        .await
        .context("failed to connect to the cache service")?;
    info!(backend = store.backend_type(), "Cache service ready");

    match command.as_str() {
        "synth" => {
            let http = client_from_config(&config)?;
            let synthesizer = SpeechSynthesizer::new(
                config.synth_settings(),
                store,
                Arc::new(FsArtifactSink::new(config.artifact_dir.clone())),
            )
            .with_http_client(http);
            run_synth(&synthesizer, rest).await
        }
        "voices" => {
            let mut rest = rest;
            let credentials = load_credentials(take_option(&mut rest, "--credentials")?)?;
            let provider = rest
                .first()
                .ok_or_else(|| anyhow!("voices requires a provider\n\n{USAGE}"))?;
            let http = client_from_config(&config)?;
            let synthesizer = SpeechSynthesizer::new(
                config.synth_settings(),
                store,
                Arc::new(FsArtifactSink::new(config.artifact_dir.clone())),
            )
            .with_http_client(http);
            let voices = synthesizer.list_voices(provider, &credentials).await?;
            println!("{}", serde_json::to_string_pretty(&voices)?);
            Ok(())
        }
        "size" => {
            if rest.len() > 1 {
                anyhow::bail!("Unexpected argument '{}' after 'size'", rest[1]);
            }
            let count = size(store.as_ref(), rest.first().map(String::as_str)).await?;
            println!("{count}");
            Ok(())
        }
        "purge" => {
            let mut rest = rest;
            let scope = match take_option(&mut rest, "--tenant")? {
                Some(tenant) => PurgeScope::Tenant(tenant),
                None => PurgeScope::All,
            };
            if let Some(extra) = rest.first() {
                anyhow::bail!("Unexpected argument '{extra}' after 'purge'");
            }
            let outcome = purge(store.as_ref(), &scope).await;
            println!("{}", serde_json::to_string(&outcome)?);
            Ok(())
        }
        other => anyhow::bail!("Unknown command '{other}'.\n\n{USAGE}"),
    }
}

async fn run_synth(synthesizer: &SpeechSynthesizer, mut args: Vec<String>) -> anyhow::Result<()> {
    let credentials = load_credentials(take_option(&mut args, "--credentials")?)?;
    let tenant = take_option(&mut args, "--tenant")?;
    let render = take_flag(&mut args, "--render");
    let no_cache = take_flag(&mut args, "--no-cache");

    let mut args = args.into_iter();
    let (Some(provider), Some(language), Some(voice)) = (args.next(), args.next(), args.next())
    else {
        anyhow::bail!("synth requires a provider, language, voice and text\n\n{USAGE}");
    };
    let text = args.collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        anyhow::bail!("synth requires text\n\n{USAGE}");
    }

    let mut request = SynthesisRequest::new(provider, text)
        .with_language(language)
        .with_voice(voice)
        .with_credentials(credentials);
    if let Some(tenant) = tenant {
        request = request.with_tenant(tenant);
    }
    request.render_for_caching = render;
    request.disable_cache = no_cache;

    let result = synthesizer.get_or_synthesize(request).await?;
    match &result.output {
        SynthesisOutput::Audio {
            artifact_path,
            format,
        } => {
            println!(
                "{} ({} Hz, {})",
                artifact_path.display(),
                format.sample_rate,
                if result.served_from_cache { "cached" } else { "rendered" }
            );
        }
        SynthesisOutput::Streaming(directive) => println!("{}", directive.encode()),
    }
    Ok(())
}

fn load_credentials(path: Option<String>) -> anyhow::Result<ProviderCredentials> {
    let Some(path) = path else {
        return Ok(ProviderCredentials::None);
    };
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read credentials from {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid credentials in {path}"))
}

/// Removes `name <value>` from `args`.
fn take_option(args: &mut Vec<String>, name: &str) -> anyhow::Result<Option<String>> {
    let Some(index) = args.iter().position(|a| a == name) else {
        return Ok(None);
    };
    if index + 1 >= args.len() {
        anyhow::bail!("{name} requires a value");
    }
    let value = args.remove(index + 1);
    args.remove(index);
    Ok(Some(value))
}

fn take_flag(args: &mut Vec<String>, name: &str) -> bool {
    match args.iter().position(|a| a == name) {
        Some(index) => {
            args.remove(index);
            true
        }
        None => false,
    }
}
