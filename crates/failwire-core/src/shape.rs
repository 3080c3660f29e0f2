//! Response shape resolution.
//!
//! A request type `CreateUser` conventionally answers with `CreateUserResponse`.
//! Hosts register their response DTOs by name; when a failure happens the
//! resolver instantiates the conventional DTO for the request and puts the
//! status into its slot, or falls back to the generic
//! [`ErrorResponse`](failwire_model::ErrorResponse).
//!
//! A DTO without a status slot still wins over the generic container. The
//! status is then silently absent from the body; that is expected.

use std::collections::HashMap;
use std::fmt;

use failwire_model::{ErrorBody, ResponseDto, ResponseStatus};
use tracing::debug;

/// Suffix used when none is configured.
pub const DEFAULT_TYPE_SUFFIX: &str = "Response";

type DtoFactory = Box<dyn Fn() -> Box<dyn ResponseDto> + Send + Sync>;

/// Registered response DTO types, keyed by type name.
pub struct ResponseTypes {
    suffix: String,
    factories: HashMap<String, DtoFactory>,
}

impl Default for ResponseTypes {
    fn default() -> Self {
        Self::new(DEFAULT_TYPE_SUFFIX)
    }
}

impl fmt::Debug for ResponseTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("ResponseTypes")
            .field("suffix", &self.suffix)
            .field("types", &names)
            .finish()
    }
}

impl ResponseTypes {
    /// Creates an empty registry using `suffix` for the naming convention.
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            factories: HashMap::new(),
        }
    }

    /// Changes the naming suffix.
    pub fn set_suffix(&mut self, suffix: impl Into<String>) {
        self.suffix = suffix.into();
    }

    /// Registers `T` under `type_name`, built with `T::default()`.
    pub fn register<T>(&mut self, type_name: impl Into<String>)
    where
        T: ResponseDto + Default + 'static,
    {
        self.register_with(type_name, || Box::new(T::default()));
    }

    /// Registers a factory under `type_name`.
    pub fn register_with<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ResponseDto> + Send + Sync + 'static,
    {
        self.factories.insert(type_name.into(), Box::new(factory));
    }

    /// Conventional response type name for `request_type`.
    pub fn conventional_name(&self, request_type: &str) -> String {
        format!("{}{}", request_type, self.suffix)
    }

    /// Whether a DTO is registered under `type_name`.
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    fn instantiate(&self, type_name: &str) -> Option<Box<dyn ResponseDto>> {
        self.factories.get(type_name).map(|factory| factory())
    }
}

/// The container chosen for a failure.
#[derive(Debug, Clone)]
pub struct ResolvedShape {
    /// The populated container.
    pub body: ErrorBody,
    /// Whether the container had a slot for the status.
    pub status_slot_present: bool,
}

/// Chooses and populates the response container.
#[derive(Debug, Default)]
pub struct ShapeResolver {
    types: ResponseTypes,
}

impl ShapeResolver {
    /// Creates a resolver over registered response types.
    pub fn new(types: ResponseTypes) -> Self {
        Self { types }
    }

    /// The registered response types.
    pub fn types(&self) -> &ResponseTypes {
        &self.types
    }

    /// Picks the container for `request_type` and puts `status` in it.
    ///
    /// `partial` is whatever response the handler had started building; it
    /// is always discarded in favour of a fresh container.
    pub fn resolve(
        &self,
        request_type: &str,
        status: ResponseStatus,
        partial: Option<Box<dyn ResponseDto>>,
    ) -> ResolvedShape {
        if partial.is_some() {
            debug!("Discarding partial response built for '{}'", request_type);
        }

        let type_name = self.types.conventional_name(request_type);
        let Some(mut dto) = self.types.instantiate(&type_name) else {
            debug!("No '{}' registered, using ErrorResponse", type_name);
            return ResolvedShape {
                body: ErrorBody::generic(status),
                status_slot_present: true,
            };
        };

        let status_slot_present = match dto.status_slot() {
            Some(slot) => {
                *slot = Some(status);
                true
            }
            None => {
                debug!("'{}' has no status slot, dropping status", type_name);
                false
            }
        };

        ResolvedShape {
            body: ErrorBody::typed(type_name, dto),
            status_slot_present,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use failwire_model::HasResponseStatus;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, Clone, Default, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct CreateUserResponse {
        id: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        response_status: Option<ResponseStatus>,
    }

    impl HasResponseStatus for CreateUserResponse {
        fn response_status(&self) -> Option<&ResponseStatus> {
            self.response_status.as_ref()
        }

        fn response_status_mut(&mut self) -> Option<&mut Option<ResponseStatus>> {
            Some(&mut self.response_status)
        }
    }

    #[derive(Debug, Clone, Default, Serialize)]
    struct HealthCheckResponse {
        healthy: bool,
    }

    impl HasResponseStatus for HealthCheckResponse {}

    fn resolver() -> ShapeResolver {
        let mut types = ResponseTypes::default();
        types.register::<CreateUserResponse>("CreateUserResponse");
        types.register::<HealthCheckResponse>("HealthCheckResponse");
        ShapeResolver::new(types)
    }

    fn status() -> ResponseStatus {
        ResponseStatus::new("ArgumentNull", "Name is required")
    }

    #[test]
    fn test_conventional_type_with_slot() {
        let shape = resolver().resolve("CreateUser", status(), None);
        assert!(shape.status_slot_present);
        assert_eq!(shape.body.type_name(), "CreateUserResponse");
        assert_eq!(shape.body.response_status(), Some(&status()));
    }

    #[test]
    fn test_conventional_type_without_slot_drops_status() {
        let shape = resolver().resolve("HealthCheck", status(), None);
        assert!(!shape.status_slot_present);
        assert!(shape.body.response_status().is_none());
        assert_eq!(serde_json::to_value(&shape.body).unwrap(), json!({ "healthy": false }));
    }

    #[test]
    fn test_fallback_to_generic() {
        let shape = resolver().resolve("DeleteUser", status(), None);
        assert!(shape.status_slot_present);
        assert!(shape.body.is_generic());
    }

    #[test]
    fn test_partial_response_discarded() {
        let partial = CreateUserResponse {
            id: Some(7),
            response_status: None,
        };
        let partial: Box<dyn ResponseDto> = Box::new(partial);
        let shape = resolver().resolve("CreateUser", status(), Some(partial));
        let wire = serde_json::to_value(&shape.body).unwrap();
        assert_eq!(wire["id"], json!(null));
        assert_eq!(wire["responseStatus"]["errorCode"], "ArgumentNull");
    }

    #[test]
    fn test_status_wire_identical_across_containers() {
        let typed = resolver().resolve("CreateUser", status(), None);
        let generic = resolver().resolve("Unknown", status(), None);
        let typed = serde_json::to_value(&typed.body).unwrap();
        let generic = serde_json::to_value(&generic.body).unwrap();
        assert_eq!(typed["responseStatus"], generic["responseStatus"]);
    }

    #[test]
    fn test_custom_suffix() {
        let mut types = ResponseTypes::new("Result");
        types.register::<CreateUserResponse>("CreateUserResult");
        let shape = ShapeResolver::new(types).resolve("CreateUser", status(), None);
        assert_eq!(shape.body.type_name(), "CreateUserResult");
    }
}
