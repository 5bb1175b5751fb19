// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Access to the daemon's `config.xml`.
//!
//! Only the `<gui>` element matters to the supervisor: it holds the admin
//! API address and key. The rest of the document is preserved byte for
//! byte when the file is migrated.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

const CONFIG_FILE_NAME: &str = "config.xml";
/// Address the admin API is bound to when the config names none.
pub const DEFAULT_GUI_ADDRESS: &str = "127.0.0.1:8384";

/// Admin API settings from the `<gui>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuiConfig {
    pub address: String,
    pub tls: bool,
    pub api_key: String,
    pub user: String,
}

impl GuiConfig {
    /// Base URL of the admin API.
    pub fn url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        let address = self
            .address
            .replace("0.0.0.0", "127.0.0.1")
            .replace("[::]", "[::1]");
        format!("{scheme}://{address}")
    }
}

/// The daemon's configuration file.
#[derive(Debug, Clone)]
pub struct ConfigXml {
    home: PathBuf,
}

static GUI_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"(?s)<gui\b([^>]*?)(?:\s*/>|>(.*?)</gui>)") {
        Ok(re) => re,
        Err(_) => unreachable!("static regex pattern"),
    });

fn element(body: &str, name: &str) -> Option<String> {
    let re = Regex::new(&format!(r"(?s)<{name}>(.*?)</{name}>")).ok()?;
    re.captures(body).map(|c| unescape(c[1].trim()))
}

fn attribute(attrs: &str, name: &str) -> Option<String> {
    let re = Regex::new(&format!(r#"\b{name}\s*=\s*"([^"]*)""#)).ok()?;
    re.captures(attrs).map(|c| unescape(&c[1]))
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Generate a fresh API key.
pub fn generate_api_key(seed: &Path) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(seed.to_string_lossy().as_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(nanos.to_le_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..32].to_string()
}

impl ConfigXml {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn path(&self) -> PathBuf {
        self.home.join(CONFIG_FILE_NAME)
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    fn load(&self) -> Result<String> {
        let path = self.path();
        fs::read_to_string(&path)
            .map_err(|e| Error::ConfigUnreadable(format!("{}: {}", path.display(), e)))
    }

    /// Parse the `<gui>` element.
    pub fn read(&self) -> Result<GuiConfig> {
        parse_gui(&self.load()?)
    }

    /// Ensure the admin address and API key are present; returns true if
    /// the file was rewritten.
    pub fn migrate_if_needed(&self) -> Result<bool> {
        let content = self.load()?;
        let Some(migrated) = migrate(&content, || generate_api_key(&self.home))? else {
            return Ok(false);
        };
        let path = self.path();
        let tmp = path.with_extension("xml.tmp");
        fs::write(&tmp, migrated)?;
        fs::rename(&tmp, &path)?;
        tracing::info!("migrated {}", path.display());
        Ok(true)
    }
}

/// Parse the `<gui>` element of a config document.
pub fn parse_gui(content: &str) -> Result<GuiConfig> {
    if !content.contains("<configuration") {
        return Err(Error::ConfigUnreadable(
            "missing <configuration> root element".to_string(),
        ));
    }
    let caps = GUI_RE
        .captures(content)
        .ok_or_else(|| Error::ConfigUnreadable("missing <gui> element".to_string()))?;
    let attrs = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());

    let address = element(body, "address").unwrap_or_default();
    let api_key = element(body, "apikey").unwrap_or_default();
    if address.is_empty() {
        return Err(Error::ConfigUnreadable("missing gui address".to_string()));
    }
    if api_key.is_empty() {
        return Err(Error::ConfigUnreadable("missing gui apikey".to_string()));
    }
    Ok(GuiConfig {
        address,
        tls: attribute(attrs, "tls").as_deref() == Some("true"),
        api_key,
        user: element(body, "user").unwrap_or_default(),
    })
}

/// Returns the migrated document, or `None` when nothing had to change.
pub fn migrate(content: &str, new_key: impl FnOnce() -> String) -> Result<Option<String>> {
    if !content.contains("<configuration") {
        return Err(Error::ConfigUnreadable(
            "missing <configuration> root element".to_string(),
        ));
    }
    let Some(caps) = GUI_RE.captures(content) else {
        let close = content.rfind("</configuration>").ok_or_else(|| {
            Error::ConfigUnreadable("missing </configuration> end tag".to_string())
        })?;
        let gui = format!(
            "    <gui enabled=\"true\" tls=\"false\">\n        <address>{}</address>\n        <apikey>{}</apikey>\n    </gui>\n",
            DEFAULT_GUI_ADDRESS,
            new_key()
        );
        let mut out = String::with_capacity(content.len() + gui.len());
        out.push_str(&content[..close]);
        out.push_str(&gui);
        out.push_str(&content[close..]);
        return Ok(Some(out));
    };

    let Some(body_match) = caps.get(2) else {
        // Self-closing `<gui .../>`: expand it in place.
        let (Some(whole), Some(attrs)) = (caps.get(0), caps.get(1)) else {
            return Ok(None);
        };
        let gui = format!(
            "<gui{}>\n        <address>{}</address>\n        <apikey>{}</apikey>\n    </gui>",
            attrs.as_str(),
            DEFAULT_GUI_ADDRESS,
            new_key()
        );
        let mut out = String::with_capacity(content.len() + gui.len());
        out.push_str(&content[..whole.start()]);
        out.push_str(&gui);
        out.push_str(&content[whole.end()..]);
        return Ok(Some(out));
    };
    let body = body_match.as_str();
    let mut new_body = body.to_string();
    let mut changed = false;

    if element(body, "address").unwrap_or_default().is_empty() {
        new_body = set_element(&new_body, "address", DEFAULT_GUI_ADDRESS);
        changed = true;
    }
    if element(body, "apikey").unwrap_or_default().is_empty() {
        new_body = set_element(&new_body, "apikey", &new_key());
        changed = true;
    }
    if !changed {
        return Ok(None);
    }
    let mut out = String::with_capacity(content.len() + 64);
    out.push_str(&content[..body_match.start()]);
    out.push_str(&new_body);
    out.push_str(&content[body_match.end()..]);
    Ok(Some(out))
}

/// Replace an empty element or append it to the end of `body`.
fn set_element(body: &str, name: &str, value: &str) -> String {
    let replacement = format!("<{name}>{value}</{name}>");
    let patterns = [
        format!(r"(?s)<{name}>\s*</{name}>"),
        format!(r"<{name}\s*/>"),
    ];
    for pattern in &patterns {
        if let Ok(re) = Regex::new(pattern) {
            if re.is_match(body) {
                return re.replace(body, regex::NoExpand(&replacement)).into_owned();
            }
        }
    }
    let trimmed = body.trim_end();
    let trailing = &body[trimmed.len()..];
    format!("{trimmed}\n        {replacement}{trailing}")
}

#[cfg(test)]
#[path = "config_xml_tests.rs"]
mod tests;
