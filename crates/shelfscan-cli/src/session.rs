//! Authentication: reuse a persisted browser session when it is still
//! valid, otherwise log in, then persist the merged session state.

use std::path::Path;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use serde_json::{Map, Value};
use shelfscan_core::{CookieEntry, Credentials, OriginEntry, StorageStateSnapshot};
use shelfscan_scraper::{trigger_first, ActionCandidate, PageSurface};

use crate::browser::ChromePage;

const USERNAME_SELECTORS: &[&str] = &[
    r#"input[name="username"]"#,
    r#"input[name="email"]"#,
    r#"input[type="email"]"#,
    "input[id*=user]",
    "input[placeholder*=User]",
    "input[placeholder*=Email]",
];

const PASSWORD_SELECTORS: &[&str] = &[
    r#"input[name="password"]"#,
    r#"input[type="password"]"#,
    "input[id*=pass]",
    "input[placeholder*=Password]",
];

const SUBMIT_LABELS: &[ActionCandidate] = &[
    ActionCandidate::new("Sign in", Duration::from_secs(3)),
    ActionCandidate::new("Log in", Duration::from_secs(3)),
    ActionCandidate::new("Login", Duration::from_secs(3)),
    ActionCandidate::new("Submit", Duration::from_secs(3)),
];

const QUIESCENCE_TIMEOUT: Duration = Duration::from_secs(10);
const POST_LOGIN_PAUSE: Duration = Duration::from_secs(2);

/// True when the page shows a sign-in form or prompt.
const SIGN_IN_JS: &str = r"(() => {
  if (document.querySelector('input[type=password]')) return true;
  if (document.querySelector('form[action*=login]')) return true;
  return Array.from(document.querySelectorAll('body *'))
    .some((el) => el.children.length === 0 && /^sign in$/i.test((el.innerText || '').trim()));
})()";

const CAPTURE_STORAGE_JS: &str = r"(() => ({
  origin: location.origin,
  localStorage: Object.keys(localStorage).map((name) => ({ name, value: localStorage.getItem(name) }))
}))()";

/// How the run got its authenticated page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    Reused,
    FreshLogin,
}

/// Restores `snapshot` into the page, opens `target_url` and reports
/// whether the restored session is still signed in.
pub async fn try_reuse(page: &ChromePage, snapshot: &StorageStateSnapshot, target_url: &str) -> bool {
    let cookies = cookie_params(&snapshot.cookies);
    if !cookies.is_empty() {
        if let Err(e) = page.inner().set_cookies(cookies).await {
            tracing::warn!(error = %e, "could not restore cookies");
            return false;
        }
    }

    if let Err(e) = page.goto(target_url).await {
        tracing::warn!(error = %e, "target unreachable with restored session");
        return false;
    }
    if restore_local_storage(page, &snapshot.origins).await {
        // Storage written after load only takes effect on the next load.
        if let Err(e) = page.goto(target_url).await {
            tracing::warn!(error = %e, "reload after storage restore failed");
            return false;
        }
    }
    if let Err(e) = page.wait_for_quiescence(QUIESCENCE_TIMEOUT).await {
        tracing::debug!(error = %e, "page still busy after session restore");
    }

    match page.eval::<bool>(SIGN_IN_JS).await {
        Ok(true) => {
            tracing::info!("stored session expired; sign-in form present");
            false
        }
        Ok(false) => true,
        Err(e) => {
            tracing::warn!(error = %e, "could not check sign-in state");
            false
        }
    }
}

/// Fills and submits the login form at `target_url`.
///
/// Every step is best effort; a form that cannot be found is logged and the
/// run continues with whatever the page shows.
pub async fn login(page: &ChromePage, target_url: &str, credentials: &Credentials) {
    if let Err(e) = page.goto(target_url).await {
        tracing::warn!(error = %e, "login page navigation failed");
    }

    let filled_user = fill_first(page, USERNAME_SELECTORS, &credentials.username).await;
    let filled_pass = fill_first(page, PASSWORD_SELECTORS, &credentials.password).await;
    if !(filled_user && filled_pass) {
        tracing::debug!(filled_user, filled_pass, "falling back to first two inputs");
        let inputs = page.all("input").await;
        if let [user, pass, ..] = inputs.as_slice() {
            let typed_user = type_into(user, &credentials.username).await;
            let typed_pass = type_into(pass, &credentials.password).await;
            if !(typed_user && typed_pass) {
                tracing::warn!("could not fill credential inputs");
            }
        } else {
            tracing::warn!(inputs = inputs.len(), "no credential inputs found");
        }
    }

    if !submit_with_enter(page).await {
        match trigger_first(page, SUBMIT_LABELS).await {
            Some(hit) => tracing::debug!(label = hit.label, "submitted login via button"),
            None => tracing::warn!("no way to submit the login form was found"),
        }
    }

    tokio::time::sleep(POST_LOGIN_PAUSE).await;
    if let Err(e) = page.wait_for_quiescence(QUIESCENCE_TIMEOUT).await {
        tracing::debug!(error = %e, "page still busy after login");
    }
    tracing::info!(username = %credentials.username, "login submitted");
}

/// Captures the page's cookies and current-origin storage, merges them into
/// the snapshot at `path` and writes the result. Failures are logged only.
pub async fn persist(page: &ChromePage, path: &Path) {
    let fresh = match capture(page).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(error = %e, "could not capture session state");
            return;
        }
    };
    match shelfscan_core::merge_and_persist(path, fresh) {
        Ok(merged) => tracing::info!(
            path = %path.display(),
            cookies = merged.cookies.len(),
            origins = merged.origins.len(),
            "session state saved"
        ),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not persist session state"),
    }
}

async fn capture(page: &ChromePage) -> anyhow::Result<StorageStateSnapshot> {
    let raw_cookies = page.inner().get_cookies().await?;
    let mut cookies = Vec::with_capacity(raw_cookies.len());
    for cookie in raw_cookies {
        cookies.push(serde_json::from_value::<CookieEntry>(serde_json::to_value(cookie)?)?);
    }

    let mut origins = Vec::new();
    match page.eval::<Value>(CAPTURE_STORAGE_JS).await {
        Ok(value) => {
            let entry: OriginEntry = serde_json::from_value(value)?;
            if entry.origin.starts_with("http") {
                origins.push(entry);
            }
        }
        Err(e) => tracing::debug!(error = %e, "no origin storage captured"),
    }

    Ok(StorageStateSnapshot { cookies, origins })
}

/// Converts stored cookies back into CDP cookie parameters. Entries without
/// a `value` are skipped.
fn cookie_params(entries: &[CookieEntry]) -> Vec<CookieParam> {
    entries
        .iter()
        .filter_map(|entry| {
            let value = entry.extra.get("value")?.as_str()?;
            let mut cookie = CookieParam::new(entry.name.clone(), value.to_owned());
            if !entry.domain.is_empty() {
                cookie.domain = Some(entry.domain.clone());
            }
            if !entry.path.is_empty() {
                cookie.path = Some(entry.path.clone());
            }
            cookie.secure = flag(&entry.extra, "secure");
            cookie.http_only = flag(&entry.extra, "httpOnly");
            Some(cookie)
        })
        .collect()
}

fn flag(extra: &Map<String, Value>, key: &str) -> Option<bool> {
    extra.get(key).and_then(Value::as_bool)
}

/// Writes stored `localStorage` items for the page's current origin.
/// Returns whether anything was written.
async fn restore_local_storage(page: &ChromePage, origins: &[OriginEntry]) -> bool {
    let Ok(current) = page.eval::<String>("location.origin").await else {
        return false;
    };
    let Some(items) = origins
        .iter()
        .find(|entry| entry.origin == current)
        .and_then(|entry| entry.extra.get("localStorage"))
        .filter(|items| items.as_array().is_some_and(|a| !a.is_empty()))
    else {
        return false;
    };

    let script = format!(
        "(() => {{ const items = {items}; for (const it of items) {{ try {{ localStorage.setItem(it.name, it.value); }} catch (_) {{}} }} return items.length; }})()"
    );
    match page.eval::<u64>(&script).await {
        Ok(count) => {
            tracing::debug!(origin = %current, count, "restored local storage");
            count > 0
        }
        Err(e) => {
            tracing::debug!(error = %e, "local storage restore failed");
            false
        }
    }
}

async fn fill_first(page: &ChromePage, selectors: &[&str], value: &str) -> bool {
    for selector in selectors {
        if let Some(input) = page.first(selector).await {
            if type_into(&input, value).await {
                tracing::debug!(selector, "filled input");
                return true;
            }
        }
    }
    false
}

async fn type_into(input: &chromiumoxide::element::Element, value: &str) -> bool {
    let cleared = input
        .call_js_fn("function() { this.focus(); this.value = ''; }", false)
        .await
        .is_ok();
    cleared && input.type_str(value).await.is_ok()
}

async fn submit_with_enter(page: &ChromePage) -> bool {
    for selector in PASSWORD_SELECTORS {
        if let Some(input) = page.first(selector).await {
            if input.press_key("Enter").await.is_ok() {
                tracing::debug!(selector, "submitted login with Enter");
                return true;
            }
        }
    }
    false
}
