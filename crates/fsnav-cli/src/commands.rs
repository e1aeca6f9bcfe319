//! Command handlers for the CLI.
//!
//! Each handler builds the upstream clients it needs from [`AppConfig`] and
//! prints its result as JSON on stdout. Diagnostics go to stderr through
//! `tracing`.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use fsnav_caas::FrontendApiClient;
use fsnav_core::{AppConfig, CatalogKind, LinkReference, Locale};
use fsnav_resolver::{HandleSource, PollConfig, ProxyHandleClient, Storefront, TokioSleeper};
use fsnav_shopify::StorefrontClient;

#[derive(Debug, Serialize)]
pub(crate) struct ResolvedLink {
    pub route: Option<String>,
    pub external: bool,
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Accepts both the CMS (`de_DE`) and commerce (`de-de`) encodings.
pub(crate) fn parse_locale(tag: &str) -> Locale {
    let tag = tag.trim();
    if tag.contains('_') {
        Locale::from_cms(tag)
    } else {
        Locale::from_commerce(tag)
    }
}

fn locale_or_default(config: &AppConfig, tag: Option<&str>) -> Locale {
    tag.filter(|t| !t.trim().is_empty())
        .map_or_else(|| Locale::from_cms(&config.ecom_api_locale), parse_locale)
}

/// Decodes a CMS link from its JSON text.
///
/// # Errors
///
/// Returns an error when the text is not JSON or not a JSON object.
pub(crate) fn parse_link(raw: &str) -> anyhow::Result<LinkReference> {
    let value: serde_json::Value = serde_json::from_str(raw).context("link is not valid JSON")?;
    LinkReference::from_json(&value).context("link must be a JSON object")
}

fn read_link(file: &Path) -> anyhow::Result<LinkReference> {
    let raw = if file.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        raw
    } else {
        std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?
    };
    parse_link(&raw)
}

fn caas_client(config: &AppConfig) -> anyhow::Result<FrontendApiClient> {
    Ok(FrontendApiClient::with_user_agent(
        &config.ecom_api_url,
        config.request_timeout_secs,
        &config.user_agent,
    )?)
}

fn storefront<H: HandleSource>(
    config: &AppConfig,
    handles: H,
) -> anyhow::Result<Storefront<FrontendApiClient, FrontendApiClient, H>> {
    let caas = Arc::new(caas_client(config)?);
    Ok(Storefront::new(
        Arc::clone(&caas),
        caas,
        Arc::new(handles),
        TokioSleeper,
        PollConfig::from_config(config),
        Locale::from_cms(&config.ecom_api_locale),
    ))
}

/// Resolves `link` with the given handle source.
///
/// # Errors
///
/// Returns an error when the navigation for `locale` cannot be fetched.
pub(crate) async fn resolve_with<H: HandleSource>(
    storefront: &Storefront<FrontendApiClient, FrontendApiClient, H>,
    link: &LinkReference,
    locale: &Locale,
) -> anyhow::Result<ResolvedLink> {
    let route = storefront.resolve_reference(link, locale).await?;
    Ok(ResolvedLink {
        route,
        external: link.is_external(),
    })
}

/// Prints the handle of a commerce resource. Goes through the configured
/// handle proxy when there is one, the Storefront API otherwise.
///
/// # Errors
///
/// Returns an error when the resource has no handle or the lookup fails.
pub(crate) async fn run_handle(
    config: &AppConfig,
    id: &str,
    kind: CatalogKind,
) -> anyhow::Result<()> {
    let handle = if let Some(proxy_url) = &config.handle_proxy_url {
        ProxyHandleClient::new(proxy_url, config.request_timeout_secs)?
            .get_handle(id, kind)
            .await
    } else {
        StorefrontClient::from_config(config)?
            .get_handle(id, kind)
            .await
            .with_context(|| format!("Failed to fetch {kind} handle"))?
    };
    let Some(handle) = handle else {
        anyhow::bail!("{kind} not found");
    };
    print_json(&serde_json::json!({ "handle": handle }))
}

/// # Errors
///
/// Returns an error when the link cannot be read or the navigation fetch fails.
pub(crate) async fn run_resolve(
    config: &AppConfig,
    file: &Path,
    locale: Option<&str>,
) -> anyhow::Result<()> {
    let link = read_link(file)?;
    let locale = locale_or_default(config, locale);
    tracing::debug!(?link, %locale, "resolving link");

    let resolved = if let Some(proxy_url) = &config.handle_proxy_url {
        let handles = ProxyHandleClient::new(proxy_url, config.request_timeout_secs)?;
        resolve_with(&storefront(config, handles)?, &link, &locale).await?
    } else {
        let handles = StorefrontClient::from_config(config)?;
        resolve_with(&storefront(config, handles)?, &link, &locale).await?
    };
    print_json(&resolved)
}

/// # Errors
///
/// Returns an error when the navigation fetch fails.
pub(crate) async fn run_navigation(config: &AppConfig, locale: Option<&str>) -> anyhow::Result<()> {
    let locale = locale_or_default(config, locale);
    let tree = caas_client(config)?
        .fetch_navigation("/", locale.cms())
        .await
        .with_context(|| format!("fetching navigation for {locale}"))?;
    print_json(&tree)
}

/// # Errors
///
/// Returns an error when the navigation fetch fails.
pub(crate) async fn run_route(
    config: &AppConfig,
    path: &str,
    locale: Option<&str>,
) -> anyhow::Result<()> {
    let fallback = locale
        .filter(|t| !t.trim().is_empty())
        .map(parse_locale);
    let storefront = storefront(config, StorefrontClient::from_config(config)?)?;
    let decision = storefront.decide_route(path, fallback.as_ref()).await?;
    print_json(&decision)
}
