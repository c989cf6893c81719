//! Template rendering and artifact emission for generated clients.
//!
//! Each client is rendered fully in memory, digested with SHA-256, and only
//! then written out. [`ClientArtifact::write_if_changed`] compares digests
//! before touching the file, so repeated generation passes leave identical
//! files untouched.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use tera::{Context, Tera};
use tracing::debug;

use crate::client::{ClientSpec, build_client_spec};
use crate::descriptor::TypeGraph;
use crate::error::GenerateError;
use crate::overrides::TypeOverride;
use crate::registry::Lang;
use crate::route::Route;

/// Target language for a rendered client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientLang {
    Js,
    Ts,
    Py,
}

impl ClientLang {
    /// The registry language backing this client's type strings. TypeScript
    /// shares the JavaScript renderer.
    pub(crate) fn registry_lang(self) -> Lang {
        match self {
            ClientLang::Js | ClientLang::Ts => Lang::Js,
            ClientLang::Py => Lang::Py,
        }
    }

    fn template_name(self) -> &'static str {
        match self {
            ClientLang::Js => "client.js",
            ClientLang::Ts => "client.ts",
            ClientLang::Py => "client.py",
        }
    }
}

fn templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("client.js", include_str!("templates/client.js.tera")),
        ("client.ts", include_str!("templates/client.ts.tera")),
        ("client.py", include_str!("templates/client.py.tera")),
    ])?;
    Ok(tera)
}

/// A rendered client source file.
#[derive(Debug, Clone)]
pub struct ClientArtifact {
    bytes: Vec<u8>,
    digest: String,
}

impl ClientArtifact {
    fn new(bytes: Vec<u8>) -> Self {
        let digest = hash_bytes(&bytes);
        Self { bytes, digest }
    }

    /// The rendered source.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// SHA-256 hex digest of the rendered source.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Write the artifact unless the file already holds identical content.
    /// Returns whether bytes were written.
    pub fn write_if_changed(&self, path: &Path) -> Result<bool, GenerateError> {
        if let Ok(existing) = fs::read(path)
            && hash_bytes(&existing) == self.digest
        {
            debug!(path = %path.display(), "client artifact unchanged, skipping write");
            return Ok(false);
        }
        fs::write(path, &self.bytes)?;
        Ok(true)
    }
}

fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Render a client for the target language.
pub fn render_client(
    graph: &TypeGraph,
    routes: &[Route],
    overrides: &BTreeMap<String, TypeOverride>,
    lang: ClientLang,
) -> Result<ClientArtifact, GenerateError> {
    let spec = build_client_spec(graph, routes, overrides, lang.registry_lang())?;
    render_spec(&spec, lang)
}

fn render_spec(spec: &ClientSpec, lang: ClientLang) -> Result<ClientArtifact, GenerateError> {
    let tera = templates()?;
    let context = Context::from_serialize(spec)?;
    let rendered = tera.render(lang.template_name(), &context)?;
    Ok(ClientArtifact::new(rendered.into_bytes()))
}
