//! One complete remediation run.
//!
//! ## Pipeline
//!
//! 1. **Rules**: load the replacement CSV (fatal if missing or malformed)
//! 2. **Audit log**: open the change log for appending (fatal if unwritable)
//! 3. **Blog**: resolve the store's blog (fatal if unresolvable)
//! 4. **Articles**: fetch every page (a failed page truncates the list)
//! 5. **Per article**: rewrite, audit, update (or simulate), pace
//!
//! Articles are handled strictly one after the other. Audit rows are written
//! as soon as the substitutions are known, before the update is sent, so the
//! log covers every change even if the process dies mid-request. A failed
//! update is logged and the run moves on.

use crate::api::{SendRequest, client_from_config};
use crate::audit::AuditLog;
use crate::config::Config;
use crate::error::FixError;
use crate::models::AuditRecord;
use crate::rewriter::rewrite;
use crate::rules::{ReplacementRules, load_rules};
use crate::shopify::ShopifyApi;
use crate::shopify::articles::UpdateOutcome;
use crate::utils::truncate_for_log;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Articles fetched from the blog.
    pub articles: usize,
    /// Articles containing at least one broken link.
    pub changed: usize,
    /// Articles the API accepted an update for.
    pub updated: usize,
    /// Articles whose update failed.
    pub failed: usize,
    /// Rows appended to the audit log.
    pub audited: usize,
}

/// Run against the live Admin API described by `config`.
pub async fn run(config: &Config) -> Result<RunSummary, FixError> {
    let rules = load_rules(&config.input)?;
    if rules.is_empty() {
        warn!(path = %config.input.display(), "No usable replacement rules; articles will be scanned but not changed");
    }
    let mut audit = AuditLog::open(&config.log_file)?;
    let api = ShopifyApi::new(client_from_config(config)?, config);
    run_with(config, &api, &rules, &mut audit).await
}

/// Run the article pipeline with an already built client, rule set and log.
#[instrument(level = "info", skip_all, fields(dry_run = config.dry_run))]
pub async fn run_with<S>(
    config: &Config,
    api: &ShopifyApi<S>,
    rules: &ReplacementRules,
    audit: &mut AuditLog,
) -> Result<RunSummary, FixError>
where
    S: SendRequest,
{
    let blog = api.resolve_blog().await?;
    let articles = api.fetch_all_articles(blog.id).await;
    info!(count = articles.len(), "Articles to scan");

    let mut summary = RunSummary {
        articles: articles.len(),
        ..RunSummary::default()
    };

    for article in &articles {
        let result = rewrite(&article.body_html, rules);
        if !result.changed {
            info!(title = %article.title, "No broken links to replace in article");
            continue;
        }
        summary.changed += 1;

        let article_url = config.article_url(&blog.handle, &article.handle);
        for substitution in &result.substitutions {
            info!(
                old_link = %substitution.old_link,
                new_link = %substitution.new_link,
                title = %article.title,
                "Replacing link"
            );
            audit.append(&AuditRecord::now(
                &article_url,
                &substitution.old_link,
                &substitution.new_link,
                &substitution.anchor_text,
            ))?;
            summary.audited += 1;
        }

        let outcome = api
            .update_article(blog.id, article.id, &result.markup)
            .await;
        match &outcome {
            UpdateOutcome::Updated => summary.updated += 1,
            UpdateOutcome::DryRun => {}
            UpdateOutcome::Failed { status, body } => {
                summary.failed += 1;
                warn!(
                    article_id = article.id,
                    title = %article.title,
                    status = ?status,
                    body = %truncate_for_log(body, 200),
                    audited = result.substitutions.len(),
                    "Update failed; audit rows name links that were not changed"
                );
            }
        }

        // stay under the API's leaky-bucket limit between writes
        if !config.dry_run && !config.pace.is_zero() {
            sleep(config.pace).await;
        }
    }

    info!(
        articles = summary.articles,
        changed = summary.changed,
        updated = summary.updated,
        failed = summary.failed,
        audited = summary.audited,
        audit_log = %audit.path().display(),
        "Run finished"
    );
    Ok(summary)
}
