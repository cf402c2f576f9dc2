//! Unified intermediate representation consumed by code generators.
//!
//! ## Module Structure
//!
//! - `types`: named type definitions ([`IrType`]) and type uses ([`IrTypeRef`])
//! - `api`: the root [`IrSchema`] with endpoints, operations and metadata
//! - `naming`: deterministic identifier derivation shared by both parsers
//!
//! The IR is built once per parse and never mutated afterwards. Types live
//! in an arena (`IrSchema::types`) addressed by name.

mod api;
pub mod naming;
mod types;

pub use api::{
    HttpMethod, IrEndpoint, IrMediaType, IrMetadata, IrOperation, IrParameter, IrRequestBody,
    IrResponse, IrSchema, IrSecurityScheme, IrVariable, OperationKind, ParamLocation,
    SourceFormat,
};
pub use types::{
    AdditionalProperties, Constraints, Discriminator, EnumMember, IrProperty, IrType, IrTypeRef,
    PrimitiveKind, TypeKind,
};
