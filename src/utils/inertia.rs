//! Server side of the Inertia page protocol.
//!
//! A first visit gets a full HTML document with the page object embedded in
//! the root element; subsequent client-side visits send `X-Inertia: true` and
//! receive the bare page object as JSON.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderName, Method, StatusCode, Uri},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::{convert::Infallible, sync::Arc};

use crate::types::{Context, InertiaConfig};

pub const X_INERTIA: HeaderName = HeaderName::from_static("x-inertia");
pub const X_INERTIA_VERSION: HeaderName = HeaderName::from_static("x-inertia-version");
pub const X_INERTIA_LOCATION: HeaderName = HeaderName::from_static("x-inertia-location");
pub const X_INERTIA_PARTIAL_COMPONENT: HeaderName =
    HeaderName::from_static("x-inertia-partial-component");
pub const X_INERTIA_PARTIAL_DATA: HeaderName = HeaderName::from_static("x-inertia-partial-data");
pub const X_INERTIA_PARTIAL_EXCEPT: HeaderName =
    HeaderName::from_static("x-inertia-partial-except");
pub const X_INERTIA_RESET: HeaderName = HeaderName::from_static("x-inertia-reset");

/// What the client told us about the visit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inertia {
    pub is_inertia: bool,
    pub version: Option<String>,
    pub partial_component: Option<String>,
    pub partial_data: Vec<String>,
    pub partial_except: Vec<String>,
    pub reset: Vec<String>,
    pub url: String,
}

fn header_str(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn header_list(headers: &HeaderMap, name: &HeaderName) -> Vec<String> {
    header_str(headers, name)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

impl Inertia {
    pub fn from_request(headers: &HeaderMap, uri: &Uri) -> Self {
        Self {
            is_inertia: header_str(headers, &X_INERTIA)
                .map(|value| value.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            version: header_str(headers, &X_INERTIA_VERSION),
            partial_component: header_str(headers, &X_INERTIA_PARTIAL_COMPONENT),
            partial_data: header_list(headers, &X_INERTIA_PARTIAL_DATA),
            partial_except: header_list(headers, &X_INERTIA_PARTIAL_EXCEPT),
            reset: header_list(headers, &X_INERTIA_RESET),
            url: uri
                .path_and_query()
                .map(|path_and_query| path_and_query.as_str().to_string())
                .unwrap_or_else(|| String::from("/")),
        }
    }

    fn is_partial_reload_of(&self, component: &str) -> bool {
        self.partial_component.as_deref() == Some(component)
    }

    pub fn page(&self, config: &InertiaConfig, component: &str, props: Props) -> Page {
        let Props {
            mut values,
            merge,
            deep_merge,
        } = props;

        if self.is_partial_reload_of(component) {
            if !self.partial_data.is_empty() {
                values.retain(|key, _| self.partial_data.contains(key));
            }
            values.retain(|key, _| !self.partial_except.contains(key));
        }

        let merge_keys = |keys: Vec<String>| -> Vec<String> {
            keys.into_iter()
                .filter(|key| values.contains_key(key) && !self.reset.contains(key))
                .collect()
        };
        let merge_props = merge_keys(merge);
        let deep_merge_props = merge_keys(deep_merge);

        Page {
            component: component.to_string(),
            props: values,
            url: self.url.clone(),
            version: config.version.clone(),
            merge_props,
            deep_merge_props,
        }
    }

    pub fn render(&self, config: &InertiaConfig, component: &str, props: Props) -> InertiaResponse {
        InertiaResponse {
            page: self.page(config, component, props),
            is_inertia: self.is_inertia,
            title: config.title.clone(),
            asset_url: config.asset_url.clone(),
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Inertia {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_request(&parts.headers, &parts.uri))
    }
}

/// Props handed to a page component, plus which of them the client should
/// merge into what it already holds instead of replacing.
#[derive(Clone, Debug, Default)]
pub struct Props {
    values: Map<String, Value>,
    merge: Vec<String>,
    deep_merge: Vec<String>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Serialize) -> Result<Self, serde_json::Error> {
        self.values
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn with_merge(self, key: &str, value: impl Serialize) -> Result<Self, serde_json::Error> {
        let mut props = self.with(key, value)?;
        props.merge.push(key.to_string());
        Ok(props)
    }

    pub fn with_deep_merge(
        self,
        key: &str,
        value: impl Serialize,
    ) -> Result<Self, serde_json::Error> {
        let mut props = self.with(key, value)?;
        props.deep_merge.push(key.to_string());
        Ok(props)
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub component: String,
    pub props: Map<String, Value>,
    pub url: String,
    pub version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub merge_props: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deep_merge_props: Vec<String>,
}

#[derive(Debug)]
pub struct InertiaResponse {
    pub page: Page,
    pub is_inertia: bool,
    title: String,
    asset_url: String,
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl InertiaResponse {
    pub fn root_document(&self) -> Result<String, serde_json::Error> {
        let page = serde_json::to_string(&self.page)?;

        Ok(format!(
            "<!DOCTYPE html>\n\
             <html lang=\"en\">\n\
             <head>\n\
             <meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>{}</title>\n\
             <script type=\"module\" src=\"{}\" defer></script>\n\
             </head>\n\
             <body>\n\
             <div id=\"app\" data-page=\"{}\"></div>\n\
             </body>\n\
             </html>\n",
            escape_html(&self.title),
            escape_html(&self.asset_url),
            escape_html(&page),
        ))
    }
}

impl IntoResponse for InertiaResponse {
    fn into_response(self) -> Response {
        let vary = [(header::VARY, "X-Inertia")];

        if self.is_inertia {
            return (StatusCode::OK, [(X_INERTIA, "true")], vary, Json(self.page)).into_response();
        }

        match self.root_document() {
            Ok(document) => (StatusCode::OK, vary, Html(document)).into_response(),
            Err(err) => {
                tracing::error!("Failed to render the root document: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Forces a full reload when a client built against a stale asset version
/// makes an Inertia visit.
pub async fn version_guard(
    State(ctx): State<Arc<Context>>,
    request: Request,
    next: Next,
) -> Response {
    let inertia = Inertia::from_request(request.headers(), request.uri());
    let client_version = inertia.version.as_deref().unwrap_or_default();

    if request.method() == Method::GET
        && inertia.is_inertia
        && client_version != ctx.inertia.version
    {
        tracing::debug!(
            "Asset version mismatch for {} (client {:?}, server {:?})",
            inertia.url,
            client_version,
            ctx.inertia.version
        );
        return (StatusCode::CONFLICT, [(X_INERTIA_LOCATION, inertia.url)]).into_response();
    }

    next.run(request).await
}
