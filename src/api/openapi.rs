use super::handlers::{
    ErrorBody, MessageBody, TokenResponse, health, user_login, user_register, user_session,
};
use utoipa::{
    Modify, OpenApi,
    openapi::{
        Contact, License, Tag,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        user_register::register,
        user_login::login,
        user_session::session,
    ),
    components(schemas(
        health::Health,
        user_register::UserRegister,
        user_login::UserLogin,
        user_session::Session,
        MessageBody,
        ErrorBody,
        TokenResponse,
    )),
    modifiers(&CargoInfo, &BearerAuth)
)]
struct ApiDoc;

/// `OpenAPI` document for every served route except `/` and `OPTIONS /health`.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

struct CargoInfo;

impl Modify for CargoInfo {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        // Use Cargo.toml metadata instead of the derive defaults.
        openapi.info.title = env!("CARGO_PKG_NAME").to_string();
        openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
        openapi.info.description = optional_str(env!("CARGO_PKG_DESCRIPTION")).map(str::to_string);
        openapi.info.contact = cargo_contact();
        openapi.info.license = cargo_license();

        let mut user_tag = Tag::new("user");
        user_tag.description = Some("Registration, login and session checks".to_string());
        let mut health_tag = Tag::new("health");
        health_tag.description = Some("Build and dependency status".to_string());
        openapi.tags = Some(vec![user_tag, health_tag]);
    }
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    let Some(start) = author.find('<') else {
        let name = author.trim();
        return ((!name.is_empty()).then_some(name), None);
    };
    let name = author[..start].trim();
    let email = author[start + 1..].trim_end_matches('>').trim();
    (
        (!name.is_empty()).then_some(name),
        (!email.is_empty()).then_some(email),
    )
}
