//! Response containers that can carry a [`ResponseStatus`].

use std::fmt;

use serde::{Serialize, Serializer};

use crate::status::{ErrorResponse, ResponseStatus};

/// Access to the status slot of a typed response DTO.
///
/// Both methods default to "no slot", so a DTO without a status field only
/// needs an empty `impl`.
///
/// ```rust
/// use failwire_model::{HasResponseStatus, ResponseStatus};
/// use serde::Serialize;
///
/// #[derive(Debug, Clone, Default, Serialize)]
/// #[serde(rename_all = "camelCase")]
/// struct CreateUserResponse {
///     id: Option<u64>,
///     #[serde(skip_serializing_if = "Option::is_none")]
///     response_status: Option<ResponseStatus>,
/// }
///
/// impl HasResponseStatus for CreateUserResponse {
///     fn response_status(&self) -> Option<&ResponseStatus> {
///         self.response_status.as_ref()
///     }
///
///     fn response_status_mut(&mut self) -> Option<&mut Option<ResponseStatus>> {
///         Some(&mut self.response_status)
///     }
/// }
/// ```
pub trait HasResponseStatus {
    /// The populated status, if the type has a slot and it is filled.
    fn response_status(&self) -> Option<&ResponseStatus> {
        None
    }

    /// The status slot itself, or `None` if the type has no slot.
    fn response_status_mut(&mut self) -> Option<&mut Option<ResponseStatus>> {
        None
    }
}

/// Object-safe view of a typed response DTO.
///
/// Implemented for every `HasResponseStatus + Serialize + Clone` type.
pub trait ResponseDto: fmt::Debug + Send + Sync {
    /// See [`HasResponseStatus::response_status`].
    fn status(&self) -> Option<&ResponseStatus>;

    /// See [`HasResponseStatus::response_status_mut`].
    fn status_slot(&mut self) -> Option<&mut Option<ResponseStatus>>;

    /// Serialized form handed to codecs.
    fn to_wire(&self) -> serde_json::Result<serde_json::Value>;

    /// Clones into a new box.
    fn clone_boxed(&self) -> Box<dyn ResponseDto>;
}

impl<T> ResponseDto for T
where
    T: HasResponseStatus + Serialize + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn status(&self) -> Option<&ResponseStatus> {
        self.response_status()
    }

    fn status_slot(&mut self) -> Option<&mut Option<ResponseStatus>> {
        self.response_status_mut()
    }

    fn to_wire(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    fn clone_boxed(&self) -> Box<dyn ResponseDto> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn ResponseDto> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// The container an error reply serializes.
#[derive(Debug, Clone)]
pub enum ErrorBody {
    /// The generic [`ErrorResponse`].
    Generic(ErrorResponse),

    /// A request-specific response DTO.
    Typed {
        /// Registered name of the DTO type.
        type_name: String,
        /// The instance.
        dto: Box<dyn ResponseDto>,
    },
}

impl ErrorBody {
    /// Generic container around `status`.
    pub fn generic(status: ResponseStatus) -> Self {
        Self::Generic(ErrorResponse::new(status))
    }

    /// Typed container.
    pub fn typed(type_name: impl Into<String>, dto: Box<dyn ResponseDto>) -> Self {
        Self::Typed {
            type_name: type_name.into(),
            dto,
        }
    }

    /// The status carried by the container, if any.
    pub fn response_status(&self) -> Option<&ResponseStatus> {
        match self {
            Self::Generic(response) => Some(&response.response_status),
            Self::Typed { dto, .. } => dto.status(),
        }
    }

    /// Name of the container type.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Generic(_) => "ErrorResponse",
            Self::Typed { type_name, .. } => type_name,
        }
    }

    /// Whether this is the generic container.
    pub fn is_generic(&self) -> bool {
        matches!(self, Self::Generic(_))
    }
}

impl Serialize for ErrorBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Generic(response) => response.serialize(serializer),
            Self::Typed { dto, .. } => dto
                .to_wire()
                .map_err(serde::ser::Error::custom)?
                .serialize(serializer),
        }
    }
}
